//! Core type definitions for skipdb.

use skipdb_storage::BlockAddress;
use std::fmt;

/// Handle of a node inside an index arena.
///
/// Slots `0` and `1` are reserved for the head and tail sentinels of every
/// index. Slots of removed nodes are recycled, so a handle is only meaningful
/// while its node is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The head sentinel.
    pub const HEAD: NodeId = NodeId(0);
    /// The tail sentinel.
    pub const TAIL: NodeId = NodeId(1);

    /// Creates a node handle from a raw slot.
    #[must_use]
    pub const fn new(slot: u32) -> Self {
        Self(slot)
    }

    /// Returns the raw slot.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns true for the head or tail sentinel.
    #[must_use]
    pub const fn is_sentinel(self) -> bool {
        self.0 <= 1
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// Reference to the stored document an index node points at.
///
/// Two nodes are the same result exactly when their data blocks are equal,
/// whatever index they come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataBlock(BlockAddress);

impl DataBlock {
    /// Data block carried by the sentinels. Never handed out by a block store.
    pub const NONE: DataBlock = DataBlock(BlockAddress::new(u64::MAX));

    /// Wraps a block store address.
    #[must_use]
    pub const fn new(address: BlockAddress) -> Self {
        Self(address)
    }

    /// Returns the block store address.
    #[must_use]
    pub const fn address(self) -> BlockAddress {
        self.0
    }
}

impl fmt::Display for DataBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Direction of an index traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Head to tail, ascending keys.
    #[default]
    Ascending,
    /// Tail to head, descending keys.
    Descending,
}

impl Direction {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

/// How a query is (or must be) executed.
///
/// A mode only ever moves from `IndexSeek` to `FullScan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecuteMode {
    /// The index alone yields the exact result.
    #[default]
    IndexSeek,
    /// Candidates must be checked against the documents themselves.
    FullScan,
}

impl ExecuteMode {
    /// Combines two modes: full scan wins.
    #[must_use]
    pub const fn combine(self, other: Self) -> Self {
        match (self, other) {
            (ExecuteMode::IndexSeek, ExecuteMode::IndexSeek) => ExecuteMode::IndexSeek,
            _ => ExecuteMode::FullScan,
        }
    }

    /// Returns true for [`ExecuteMode::FullScan`].
    #[must_use]
    pub const fn is_full_scan(self) -> bool {
        matches!(self, ExecuteMode::FullScan)
    }
}

impl fmt::Display for ExecuteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecuteMode::IndexSeek => f.write_str("index seek"),
            ExecuteMode::FullScan => f.write_str("full scan"),
        }
    }
}
