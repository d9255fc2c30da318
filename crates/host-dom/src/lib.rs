//! In-memory model of the host page.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by copyable
//! [`NodeId`] handles. A handle never dangles: removing a node only detaches
//! it, so code holding a stale handle keeps working and can ask
//! [`Document::is_connected`] whether the node is still part of the page.

mod document;
mod error;
mod node;
mod observer;
mod parse;
pub mod selector;
mod style;

pub use document::{Document, DomEvent};
pub use error::*;
pub use node::NodeId;
pub use observer::{MutationKind, MutationRecord, ObserveOptions, ObserverId};
pub use parse::parse_fragment;
pub use selector::Selector;
