//! Ordered skip-list indexes.
//!
//! Each index covers one document field. Keys are the field's values
//! normalized with the index's [`IndexOptions`]; every node also carries the
//! [`DataBlock`](crate::DataBlock) of the document it came from.
//!
//! # Components
//!
//! - [`CollectionIndex`]: the node arena and its mutation primitives
//! - [`IndexNode`]: one linked node
//! - [`IndexWalk`]: lazy level-0 traversal produced by `find_all` and the
//!   query operators

mod navigate;
mod node;
mod options;
mod skiplist;

pub use navigate::{IndexWalk, KeyBound};
pub use node::IndexNode;
pub use options::IndexOptions;
pub use skiplist::{CollectionIndex, MAX_LEVEL};
