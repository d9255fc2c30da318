use crate::NodeId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),
    #[error("text nodes cannot have children")]
    NotAnElement,
    #[error("cannot insert a node into itself or one of its descendants")]
    HierarchyRequest,
    #[error("reference node is not a child of the target parent")]
    NotAChild,
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector {
        selector: String,
        reason: &'static str,
    },
    #[error("malformed markup at byte {position}: {message}")]
    Markup { position: u64, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
