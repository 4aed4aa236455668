use serde::Serialize;
use std::fmt;

/// Index of a node inside its [`Grammar`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiteralKind {
    Quoted,
    Special,
    Title,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Grammar {
        title: Option<NodeId>,
        productions: NodeId,
        comment: Option<NodeId>,
    },
    ProductionList(Vec<NodeId>),
    Production {
        identifier: NodeId,
        expression: NodeId,
    },
    Alternation(Vec<NodeId>),
    Sequence(Vec<NodeId>),
    Repetition(NodeId),
    OneOrMore {
        body: NodeId,
        separator: Option<NodeId>,
    },
    Optional(NodeId),
    Literal {
        text: String,
        kind: LiteralKind,
    },
    Identifier(String),
    Other(String),
}

impl Node {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Grammar { .. } => "grammar",
            Node::ProductionList(_) => "production-list",
            Node::Production { .. } => "production",
            Node::Alternation(_) => "alternation",
            Node::Sequence(_) => "sequence",
            Node::Repetition(_) => "repetition",
            Node::OneOrMore { .. } => "one-or-more",
            Node::Optional(_) => "optional",
            Node::Literal { .. } => "literal",
            Node::Identifier(_) => "identifier",
            Node::Other(_) => "other",
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Node::Literal { text, .. } | Node::Identifier(text) | Node::Other(text) => Some(text),
            _ => None,
        }
    }

    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Node::Grammar {
                title,
                productions,
                comment,
            } => title
                .iter()
                .copied()
                .chain(Some(*productions))
                .chain(comment.iter().copied())
                .collect(),
            Node::ProductionList(items) | Node::Alternation(items) | Node::Sequence(items) => {
                items.clone()
            }
            Node::Production {
                identifier,
                expression,
            } => vec![*identifier, *expression],
            Node::Repetition(body) | Node::Optional(body) => vec![*body],
            Node::OneOrMore { body, separator } => {
                std::iter::once(*body).chain(separator.iter().copied()).collect()
            }
            Node::Literal { .. } | Node::Identifier(_) | Node::Other(_) => Vec::new(),
        }
    }
}

/// Arena holding every node of one parsed grammar.
///
/// The typed builders hand out ids in creation order, so a parent built
/// through them always has a larger id than its children. [`Grammar::push`]
/// accepts arbitrary ids; a cycle built that way is reported by layout as
/// nesting too deep.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeId(idx as u32), node))
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn literal(&mut self, text: &str) -> NodeId {
        self.push(Node::Literal {
            text: text.to_string(),
            kind: LiteralKind::Quoted,
        })
    }

    pub fn special(&mut self, text: &str) -> NodeId {
        self.push(Node::Literal {
            text: text.to_string(),
            kind: LiteralKind::Special,
        })
    }

    pub fn title(&mut self, text: &str) -> NodeId {
        self.push(Node::Literal {
            text: text.to_string(),
            kind: LiteralKind::Title,
        })
    }

    pub fn identifier(&mut self, name: &str) -> NodeId {
        self.push(Node::Identifier(name.to_string()))
    }

    pub fn other(&mut self, text: &str) -> NodeId {
        self.push(Node::Other(text.to_string()))
    }

    pub fn sequence(&mut self, items: Vec<NodeId>) -> NodeId {
        self.push(Node::Sequence(items))
    }

    pub fn alternation(&mut self, items: Vec<NodeId>) -> NodeId {
        self.push(Node::Alternation(items))
    }

    pub fn repetition(&mut self, body: NodeId) -> NodeId {
        self.push(Node::Repetition(body))
    }

    pub fn one_or_more(&mut self, body: NodeId, separator: Option<NodeId>) -> NodeId {
        self.push(Node::OneOrMore { body, separator })
    }

    pub fn optional(&mut self, body: NodeId) -> NodeId {
        self.push(Node::Optional(body))
    }

    pub fn production(&mut self, name: &str, expression: NodeId) -> NodeId {
        let identifier = self.identifier(name);
        self.push(Node::Production {
            identifier,
            expression,
        })
    }

    pub fn production_list(&mut self, items: Vec<NodeId>) -> NodeId {
        self.push(Node::ProductionList(items))
    }

    /// Adds the grammar node and makes it the root.
    pub fn grammar(
        &mut self,
        title: Option<NodeId>,
        productions: NodeId,
        comment: Option<NodeId>,
    ) -> NodeId {
        let id = self.push(Node::Grammar {
            title,
            productions,
            comment,
        });
        self.root = Some(id);
        id
    }

    /// Compact (stacked) alternations: more than two alternatives, each a
    /// literal of at most three characters.
    pub fn is_short(&self, alternatives: &[NodeId]) -> bool {
        alternatives.len() > 2
            && alternatives.iter().all(|id| {
                matches!(
                    self.node(*id),
                    Some(Node::Literal { text, .. }) if text.chars().count() <= 3
                )
            })
    }

    /// Names of all productions, in declaration order.
    pub fn production_names(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                Node::Production { identifier, .. } => match self.node(*identifier) {
                    Some(Node::Identifier(name)) => Some(name.as_str()),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_alternation_needs_three_tiny_literals() {
        let mut g = Grammar::new();
        let a = g.literal("+");
        let b = g.literal("-");
        let c = g.literal("**");
        let long = g.literal("four");
        let ident = g.identifier("x");
        assert!(!g.is_short(&[a, b]));
        assert!(g.is_short(&[a, b, c]));
        assert!(!g.is_short(&[a, b, long]));
        assert!(!g.is_short(&[a, b, ident]));
    }

    #[test]
    fn production_names_follow_declaration_order() {
        let mut g = Grammar::new();
        let x = g.literal("x");
        let first = g.production("first", x);
        let y = g.identifier("first");
        let second = g.production("second", y);
        let list = g.production_list(vec![first, second]);
        let root = g.grammar(None, list, None);
        assert_eq!(g.root(), Some(root));
        assert_eq!(g.production_names(), vec!["first", "second"]);
        assert_eq!(g.node(root).map(Node::children), Some(vec![list]));
    }
}
