use crate::ir::{Grammar, NodeId};
use crate::layout::Layout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub root: NodeId,
    pub nodes: Vec<NodeDump>,
}

/// One box, in its parent's frame.
#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: NodeId,
    pub kind: &'static str,
    pub label: Option<String>,
    pub parent: Option<NodeId>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub left_anchor: [f32; 2],
    pub right_anchor: [f32; 2],
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout, grammar: &Grammar) -> Self {
        let mut parents = vec![None; grammar.len()];
        for (id, node) in grammar.iter() {
            for child in node.children() {
                if let Some(slot) = parents.get_mut(child.index()) {
                    *slot = Some(id);
                }
            }
        }

        let nodes = layout
            .boxes
            .iter()
            .filter_map(|(id, placed)| {
                let node = grammar.node(id)?;
                let tl = placed.top_left();
                let left = placed.left_anchor();
                let right = placed.right_anchor();
                Some(NodeDump {
                    id,
                    kind: node.kind_name(),
                    label: node.label().map(str::to_string),
                    parent: parents.get(id.index()).copied().flatten(),
                    x: tl.x,
                    y: tl.y,
                    width: placed.width(),
                    height: placed.height(),
                    left_anchor: [left.x, left.y],
                    right_anchor: [right.x, right.y],
                })
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            root: layout.root,
            nodes,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout, grammar: &Grammar) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, grammar);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::compute_layout;
    use crate::parser::parse_grammar;

    #[test]
    fn dump_lists_every_box_with_its_parent() {
        let grammar = parse_grammar("list = < item / \",\" > .").unwrap();
        let layout = compute_layout(&grammar, &LayoutConfig::default()).unwrap();
        let dump = LayoutDump::from_layout(&layout, &grammar);
        assert_eq!(dump.nodes.len(), layout.boxes.len());
        let sep = dump
            .nodes
            .iter()
            .find(|n| n.label.as_deref() == Some(","))
            .unwrap();
        let parent = dump.nodes.iter().find(|n| Some(n.id) == sep.parent).unwrap();
        assert_eq!(parent.kind, "one-or-more");
        let root = dump.nodes.iter().find(|n| n.id == dump.root).unwrap();
        assert_eq!(root.parent, None);

        let json = serde_json::to_value(&dump).unwrap();
        assert!(json["nodes"][0]["kind"].is_string());
    }
}
