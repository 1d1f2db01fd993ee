//! Ordered skip-list index over one document field.

use crate::error::{CoreError, CoreResult};
use crate::index::node::IndexNode;
use crate::index::options::IndexOptions;
use crate::types::{DataBlock, NodeId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skipdb_codec::Value;
use tracing::trace;

/// Highest level a node can reach.
pub const MAX_LEVEL: usize = 32;

/// A multi-level ordered index over the values of one field.
///
/// Nodes live in an arena addressed by [`NodeId`]. Slot 0 is the head
/// sentinel (key [`Value::MinValue`]) and slot 1 the tail sentinel (key
/// [`Value::MaxValue`]); both span every level. The head's backward links
/// and the tail's forward links point at the sentinel itself.
///
/// # Invariants
///
/// - For consecutive nodes `a -> b` at level 0, `a.key <= b.key`
/// - Equal keys sit next to each other at level 0, in insertion order
/// - Every level above 0 is a sub-sequence of the level below it
///
/// # Example
///
/// ```rust
/// use skipdb_core::{CollectionIndex, DataBlock, Direction, IndexOptions};
/// use skipdb_codec::Value;
/// use skipdb_storage::BlockAddress;
///
/// let mut index = CollectionIndex::new("age", IndexOptions::binary(), 8, Some(1));
/// for (i, age) in [30, 10, 20].into_iter().enumerate() {
///     index.insert(&Value::Integer(age), DataBlock::new(BlockAddress::new(i as u64))).unwrap();
/// }
///
/// let keys: Vec<_> = index
///     .find_all(Direction::Ascending)
///     .map(|node| node.unwrap().key().clone())
///     .collect();
/// assert_eq!(keys, vec![Value::Integer(10), Value::Integer(20), Value::Integer(30)]);
/// ```
#[derive(Debug)]
pub struct CollectionIndex {
    field: String,
    options: IndexOptions,
    nodes: Vec<Option<IndexNode>>,
    free: Vec<NodeId>,
    len: usize,
    max_level: usize,
    rng: StdRng,
}

impl CollectionIndex {
    /// Creates an empty index on `field`.
    ///
    /// `max_level` is clamped to `1..=MAX_LEVEL`. A `seed` makes the level
    /// layout reproducible.
    pub fn new(
        field: impl Into<String>,
        options: IndexOptions,
        max_level: usize,
        seed: Option<u64>,
    ) -> Self {
        let max_level = max_level.clamp(1, MAX_LEVEL);

        let mut head = IndexNode::new(NodeId::HEAD, Value::MinValue, DataBlock::NONE, max_level);
        head.prev = vec![NodeId::HEAD; max_level];
        let mut tail = IndexNode::new(NodeId::TAIL, Value::MaxValue, DataBlock::NONE, max_level);
        tail.next = vec![NodeId::TAIL; max_level];

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            field: field.into(),
            options,
            nodes: vec![Some(head), Some(tail)],
            free: Vec::new(),
            len: 0,
            max_level,
            rng,
        }
    }

    /// Field path this index covers.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Options keys are normalized with.
    #[must_use]
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Number of non-sentinel nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the index holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Highest level any node may reach in this index.
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Handle of the head sentinel.
    #[must_use]
    pub fn head(&self) -> NodeId {
        NodeId::HEAD
    }

    /// Handle of the tail sentinel.
    #[must_use]
    pub fn tail(&self) -> NodeId {
        NodeId::TAIL
    }

    /// Resolves a node handle.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NodeNotFound`] if the slot is out of range or its
    /// node has been removed.
    pub fn get_node(&self, id: NodeId) -> CoreResult<&IndexNode> {
        self.nodes
            .get(id.as_u32() as usize)
            .and_then(Option::as_ref)
            .ok_or(CoreError::NodeNotFound { node: id.as_u32() })
    }

    /// Returns true if `node` is one of this index's sentinels.
    #[must_use]
    pub fn is_head_tail(&self, node: &IndexNode) -> bool {
        node.is_head_tail()
    }

    fn node_mut(&mut self, id: NodeId) -> CoreResult<&mut IndexNode> {
        self.nodes
            .get_mut(id.as_u32() as usize)
            .and_then(Option::as_mut)
            .ok_or(CoreError::NodeNotFound { node: id.as_u32() })
    }

    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < self.max_level && self.rng.gen_bool(0.5) {
            level += 1;
        }
        level
    }

    /// Finds, for every level, the last node whose key sorts before `key`.
    ///
    /// With `after_equal` the predecessors are taken past any run of keys
    /// equal to `key`, which is where a new duplicate is linked.
    fn predecessors(&self, key: &Value, after_equal: bool) -> CoreResult<Vec<NodeId>> {
        let mut update = vec![NodeId::HEAD; self.max_level];
        let mut current = NodeId::HEAD;

        for level in (0..self.max_level).rev() {
            loop {
                let next = self.get_node(current)?.next[level];
                if next == NodeId::TAIL {
                    break;
                }
                let next_key = self.get_node(next)?.key();
                let advance = if after_equal {
                    next_key <= key
                } else {
                    next_key < key
                };
                if !advance {
                    break;
                }
                current = next;
            }
            update[level] = current;
        }

        Ok(update)
    }

    /// Fails with [`CoreError::UniqueViolation`] if this is a unique index
    /// that already holds `key` (normalized first).
    ///
    /// # Errors
    ///
    /// Also propagates [`CoreError::NodeNotFound`] from a damaged chain.
    pub fn check_unique(&self, key: &Value) -> CoreResult<()> {
        if !self.options.unique {
            return Ok(());
        }
        let key = self.options.normalize(key);
        let update = self.predecessors(&key, true)?;
        let last = self.get_node(update[0])?;
        if !last.is_head_tail() && last.key() == key.as_ref() {
            return Err(CoreError::unique_violation(&self.field, key));
        }
        Ok(())
    }

    /// Links a new node for `key` pointing at `data_block`.
    ///
    /// The key is normalized with this index's options. A duplicate key is
    /// linked after every existing node with the same key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UniqueViolation`] if the index is unique and the
    /// key is already present.
    pub fn insert(&mut self, key: &Value, data_block: DataBlock) -> CoreResult<NodeId> {
        let key = self.options.normalize(key).into_owned();
        let update = self.predecessors(&key, true)?;

        if self.options.unique {
            let last = self.get_node(update[0])?;
            if !last.is_head_tail() && last.key() == &key {
                return Err(CoreError::unique_violation(&self.field, &key));
            }
        }

        let level = self.random_level();
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                let slot = u32::try_from(self.nodes.len())
                    .map_err(|_| CoreError::invalid_operation("index node arena is full"))?;
                self.nodes.push(None);
                NodeId::new(slot)
            }
        };

        let mut node = IndexNode::new(id, key, data_block, level);
        for (lvl, &prev) in update.iter().enumerate().take(level) {
            node.prev[lvl] = prev;
            node.next[lvl] = self.get_node(prev)?.next[lvl];
        }

        for lvl in 0..level {
            let (prev, next) = (node.prev[lvl], node.next[lvl]);
            self.node_mut(prev)?.next[lvl] = id;
            self.node_mut(next)?.prev[lvl] = id;
        }

        trace!(field = %self.field, node = %id, level, "linked index node");
        self.nodes[id.as_u32() as usize] = Some(node);
        self.len += 1;
        Ok(id)
    }

    /// Unlinks the node for `key` that points at `data_block`.
    ///
    /// Returns `false` if no such node exists.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::NodeNotFound`] from a damaged chain.
    pub fn remove(&mut self, key: &Value, data_block: DataBlock) -> CoreResult<bool> {
        let key = self.options.normalize(key).into_owned();
        let update = self.predecessors(&key, false)?;

        let mut target = self.get_node(update[0])?.next[0];
        loop {
            let node = self.get_node(target)?;
            if node.is_head_tail() || node.key() != &key {
                return Ok(false);
            }
            if node.data_block() == data_block {
                break;
            }
            target = node.next[0];
        }

        let node = self.nodes[target.as_u32() as usize]
            .take()
            .ok_or(CoreError::NodeNotFound {
                node: target.as_u32(),
            })?;

        for lvl in 0..node.level() {
            let (prev, next) = (node.prev[lvl], node.next[lvl]);
            self.node_mut(prev)?.next[lvl] = next;
            self.node_mut(next)?.prev[lvl] = prev;
        }

        trace!(field = %self.field, node = %target, "unlinked index node");
        self.free.push(target);
        self.len -= 1;
        Ok(true)
    }

    /// Verifies the ordering and linkage invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] describing the first violation.
    pub fn check_order(&self) -> CoreResult<()> {
        for level in 0..self.max_level {
            let mut previous = self.get_node(NodeId::HEAD)?;
            let mut count = 0usize;
            loop {
                let id = previous.next[level];
                let node = self.get_node(id)?;
                if node.prev(level) != Some(previous.id) {
                    return Err(CoreError::invalid_operation(format!(
                        "level {level}: {} does not link back to {}",
                        node.id, previous.id
                    )));
                }
                if node.id == NodeId::TAIL {
                    break;
                }
                if previous.key() > node.key() {
                    return Err(CoreError::invalid_operation(format!(
                        "level {level}: key {} sorts after {}",
                        previous.key(),
                        node.key()
                    )));
                }
                count += 1;
                if count > self.len {
                    return Err(CoreError::invalid_operation(format!(
                        "level {level} holds more nodes than the index"
                    )));
                }
                previous = node;
            }
            if level == 0 && count != self.len {
                return Err(CoreError::invalid_operation(format!(
                    "level 0 links {count} nodes, index holds {}",
                    self.len
                )));
            }
        }
        Ok(())
    }
}
