mod context;
mod error;
mod geometry;
mod size;

pub use context::{Direction, LayoutContext, RailState};
pub use error::LayoutError;
pub use geometry::{OrientedBox, Point};

use crate::config::LayoutConfig;
use crate::ir::{Grammar, Node, NodeId};

pub const TEXT_SIZE: f32 = 24.0;
pub const TEXT_PAD: f32 = 8.0;
pub const LINE_HEIGHT: f32 = TEXT_SIZE + TEXT_PAD;
pub const CIRCLE: f32 = 4.0;
pub const PADV: f32 = 8.0;
pub const PADH: f32 = 10.0;
pub const RADIUS: f32 = 10.0;
pub const ARROW_SIZE: f32 = 10.0;
pub const TEXT_RATIO: f32 = 0.35;
/// Extra width given to a production heading: the lead-in a flow leaf
/// reserves for its arrow and padding.
pub const HEADING_LEAD: f32 = 2.0 * LINE_HEIGHT * TEXT_RATIO + ARROW_SIZE + 2.0 * PADH;

/// Node id → oriented box, each box expressed in its parent's frame.
#[derive(Debug, Clone, Default)]
pub struct BoxTable {
    boxes: Vec<Option<OrientedBox>>,
}

impl BoxTable {
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            boxes: vec![None; nodes],
        }
    }

    /// Stores the final box of `id`; every node is written exactly once.
    pub fn insert(&mut self, id: NodeId, placed: OrientedBox) -> Result<(), LayoutError> {
        let slot = self
            .boxes
            .get_mut(id.index())
            .ok_or(LayoutError::UnknownNode(id))?;
        if slot.is_some() {
            return Err(LayoutError::SharedNode(id));
        }
        *slot = Some(placed);
        Ok(())
    }

    pub fn get(&self, id: NodeId) -> Result<&OrientedBox, LayoutError> {
        self.boxes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(LayoutError::MissingBox(id))
    }

    pub fn len(&self) -> usize {
        self.boxes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &OrientedBox)> {
        self.boxes
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|b| (NodeId(idx as u32), b)))
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub root: NodeId,
    pub boxes: BoxTable,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    pub fn root_box(&self) -> Result<&OrientedBox, LayoutError> {
        self.boxes.get(self.root)
    }
}

/// Checks the input contract: the root must be a `Grammar` node.
pub fn grammar_root(grammar: &Grammar) -> Result<NodeId, LayoutError> {
    let root = grammar.root().ok_or(LayoutError::MissingRoot)?;
    match grammar.node(root) {
        Some(Node::Grammar { .. }) => Ok(root),
        Some(other) => Err(LayoutError::InvalidRoot(other.kind_name())),
        None => Err(LayoutError::UnknownNode(root)),
    }
}

pub fn compute_layout(grammar: &Grammar, config: &LayoutConfig) -> Result<Layout, LayoutError> {
    let root = grammar_root(grammar)?;
    let boxes = size::Sizer::new(grammar, config.max_depth).run(root)?;
    let top = boxes.get(root)?;
    let (width, height) = (top.width(), top.height());
    tracing::debug!(nodes = boxes.len(), width, height, "computed railroad layout");
    Ok(Layout {
        root,
        boxes,
        width,
        height,
    })
}
