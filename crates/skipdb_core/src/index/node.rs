//! Index node.

use crate::types::{DataBlock, Direction, NodeId};
use skipdb_codec::Value;

/// One node of an ordered index.
///
/// A node takes part in levels `0..level()`. Level 0 links every node,
/// duplicates included, in key order; higher levels skip over runs of nodes.
/// `prev` mirrors `next` so the base chain can be walked both ways.
#[derive(Debug, Clone)]
pub struct IndexNode {
    pub(crate) id: NodeId,
    pub(crate) key: Value,
    pub(crate) data_block: DataBlock,
    pub(crate) next: Vec<NodeId>,
    pub(crate) prev: Vec<NodeId>,
}

impl IndexNode {
    pub(crate) fn new(id: NodeId, key: Value, data_block: DataBlock, level: usize) -> Self {
        Self {
            id,
            key,
            data_block,
            next: vec![NodeId::TAIL; level],
            prev: vec![NodeId::HEAD; level],
        }
    }

    /// Handle of this node in its index.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The normalized key.
    #[must_use]
    pub fn key(&self) -> &Value {
        &self.key
    }

    /// The document this node indexes.
    #[must_use]
    pub fn data_block(&self) -> DataBlock {
        self.data_block
    }

    /// Number of levels this node is linked into.
    #[must_use]
    pub fn level(&self) -> usize {
        self.next.len()
    }

    /// Forward link at `level`, if the node reaches that level.
    #[must_use]
    pub fn next(&self, level: usize) -> Option<NodeId> {
        self.next.get(level).copied()
    }

    /// Backward link at `level`, if the node reaches that level.
    #[must_use]
    pub fn prev(&self, level: usize) -> Option<NodeId> {
        self.prev.get(level).copied()
    }

    /// The level-0 neighbour in `direction`.
    ///
    /// Every node reaches level 0, so this always exists.
    #[must_use]
    pub fn step(&self, direction: Direction) -> NodeId {
        match direction {
            Direction::Ascending => self.next[0],
            Direction::Descending => self.prev[0],
        }
    }

    /// Returns true for the head or tail sentinel.
    #[must_use]
    pub fn is_head_tail(&self) -> bool {
        self.id.is_sentinel()
    }
}
