use thiserror::Error;

use super::context::Direction;
use crate::ir::NodeId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("grammar has no root node")]
    MissingRoot,
    #[error("diagram root must be a grammar node, found {0}")]
    InvalidRoot(&'static str),
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} is reachable from more than one parent")]
    SharedNode(NodeId),
    #[error("no layout was computed for node {0}")]
    MissingBox(NodeId),
    #[error("connector from {entry:?} to {exit:?} is not implemented")]
    UnsupportedConnector { entry: Direction, exit: Direction },
    #[error("grammar nesting exceeds the maximum depth of {0}")]
    NestingTooDeep(usize),
    #[error("coordinate frame stack underflow")]
    FrameUnderflow,
}
