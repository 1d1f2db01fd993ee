//! Traversal primitives over a [`CollectionIndex`].
//!
//! These never mutate the index. "Nothing matches" is an empty walk or
//! `None`, never an error; errors only come from unresolvable node handles.

use crate::error::CoreResult;
use crate::index::node::IndexNode;
use crate::index::skiplist::CollectionIndex;
use crate::types::{Direction, NodeId};
use skipdb_codec::Value;
use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use tracing::trace;

/// Condition a walk checks on every key before yielding it.
pub type KeyBound<'a> = Box<dyn Fn(&Value) -> bool + 'a>;

/// A lazy walk along level 0 of an index.
///
/// The walk yields nodes one at a time as it is pulled and stops at the first
/// sentinel or at the first key that fails its bound. Dropping it early does
/// no further work.
pub struct IndexWalk<'a> {
    index: &'a CollectionIndex,
    cursor: Option<NodeId>,
    direction: Direction,
    bound: Option<KeyBound<'a>>,
}

impl<'a> IndexWalk<'a> {
    /// A walk that yields nothing.
    #[must_use]
    pub fn empty(index: &'a CollectionIndex) -> Self {
        Self {
            index,
            cursor: None,
            direction: Direction::Ascending,
            bound: None,
        }
    }

    /// Starts a walk at `start` (inclusive).
    #[must_use]
    pub fn from_node(
        index: &'a CollectionIndex,
        start: Option<&IndexNode>,
        direction: Direction,
    ) -> Self {
        Self {
            index,
            cursor: start.map(IndexNode::id),
            direction,
            bound: None,
        }
    }

    /// Stops the walk at the first key for which `bound` is false.
    #[must_use]
    pub fn while_key<F>(mut self, bound: F) -> Self
    where
        F: Fn(&Value) -> bool + 'a,
    {
        self.bound = Some(Box::new(bound));
        self
    }
}

impl<'a> Iterator for IndexWalk<'a> {
    type Item = CoreResult<&'a IndexNode>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor.take()?;
        let node = match self.index.get_node(id) {
            Ok(node) => node,
            Err(e) => return Some(Err(e)),
        };

        if self.index.is_head_tail(node) {
            return None;
        }
        if let Some(bound) = &self.bound {
            if !bound(node.key()) {
                return None;
            }
        }

        self.cursor = Some(node.step(self.direction));
        Some(Ok(node))
    }
}

impl FusedIterator for IndexWalk<'_> {}

impl fmt::Debug for IndexWalk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexWalk")
            .field("field", &self.index.field())
            .field("cursor", &self.cursor)
            .field("direction", &self.direction)
            .field("bounded", &self.bound.is_some())
            .finish()
    }
}

impl CollectionIndex {
    /// Seeks the boundary node for `value` (already normalized).
    ///
    /// - `Ascending`: the first node with key `>= value`, or `> value` when
    ///   `include_equal` is false.
    /// - `Descending`: the last node with key `<= value`, or `< value` when
    ///   `include_equal` is false.
    ///
    /// Returns `None` when no node qualifies. The seek descends from the top
    /// level, moving along each level while the next key does not yet satisfy
    /// the condition, then drops a level.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::CoreError::NodeNotFound`] from a damaged chain.
    pub fn find(
        &self,
        value: &Value,
        include_equal: bool,
        direction: Direction,
    ) -> CoreResult<Option<&IndexNode>> {
        // `stop` is the ordering of a key against `value` at which the
        // descent has reached the boundary.
        let (start, stop) = match direction {
            Direction::Ascending => (NodeId::HEAD, Ordering::Greater),
            Direction::Descending => (NodeId::TAIL, Ordering::Less),
        };
        let end = match direction {
            Direction::Ascending => NodeId::TAIL,
            Direction::Descending => NodeId::HEAD,
        };

        let mut current = self.get_node(start)?;
        for level in (0..self.max_level()).rev() {
            loop {
                let neighbour = match direction {
                    Direction::Ascending => current.next[level],
                    Direction::Descending => current.prev[level],
                };
                if neighbour == end {
                    break;
                }
                let node = self.get_node(neighbour)?;
                let ord = node.key().cmp(value);
                let reached = ord == stop || (include_equal && ord == Ordering::Equal);
                if reached {
                    break;
                }
                current = node;
            }
        }

        let candidate = self.get_node(current.step(direction))?;
        trace!(
            field = %self.field(),
            %value,
            include_equal,
            ?direction,
            found = !candidate.is_head_tail(),
            "index seek"
        );

        if self.is_head_tail(candidate) {
            Ok(None)
        } else {
            Ok(Some(candidate))
        }
    }

    /// Walks every node of the index in `direction`.
    ///
    /// Each call starts a fresh walk from the matching sentinel.
    #[must_use]
    pub fn find_all(&self, direction: Direction) -> IndexWalk<'_> {
        let sentinel = match direction {
            Direction::Ascending => NodeId::HEAD,
            Direction::Descending => NodeId::TAIL,
        };
        let first = self
            .get_node(sentinel)
            .map(|node| node.step(direction))
            .ok();
        IndexWalk {
            index: self,
            cursor: first,
            direction,
            bound: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexOptions;
    use crate::types::DataBlock;
    use skipdb_storage::BlockAddress;

    fn index_of(keys: &[i64]) -> CollectionIndex {
        let mut index = CollectionIndex::new("n", IndexOptions::binary(), 6, Some(11));
        for (i, &k) in keys.iter().enumerate() {
            index
                .insert(&Value::Integer(k), DataBlock::new(BlockAddress::new(i as u64)))
                .unwrap();
        }
        index
    }

    fn found(index: &CollectionIndex, v: i64, eq: bool, dir: Direction) -> Option<i64> {
        index
            .find(&Value::Integer(v), eq, dir)
            .unwrap()
            .map(|n| n.key().as_integer().unwrap())
    }

    fn keys(walk: IndexWalk<'_>) -> Vec<i64> {
        walk.map(|n| n.unwrap().key().as_integer().unwrap()).collect()
    }

    #[test]
    fn find_ascending_boundaries() {
        let index = index_of(&[1, 3, 3, 5, 7]);
        assert_eq!(found(&index, 3, true, Direction::Ascending), Some(3));
        assert_eq!(found(&index, 3, false, Direction::Ascending), Some(5));
        assert_eq!(found(&index, 4, true, Direction::Ascending), Some(5));
        assert_eq!(found(&index, 0, true, Direction::Ascending), Some(1));
        assert_eq!(found(&index, 7, false, Direction::Ascending), None);
        assert_eq!(found(&index, 8, true, Direction::Ascending), None);
    }

    #[test]
    fn find_ascending_lands_on_first_duplicate() {
        let index = index_of(&[3, 1, 3, 3]);
        let node = index
            .find(&Value::Integer(3), true, Direction::Ascending)
            .unwrap()
            .unwrap();
        assert_eq!(node.data_block(), DataBlock::new(BlockAddress::new(0)));
    }

    #[test]
    fn find_descending_boundaries() {
        let index = index_of(&[1, 3, 3, 5, 7]);
        assert_eq!(found(&index, 3, true, Direction::Descending), Some(3));
        assert_eq!(found(&index, 3, false, Direction::Descending), Some(1));
        assert_eq!(found(&index, 6, true, Direction::Descending), Some(5));
        assert_eq!(found(&index, 1, false, Direction::Descending), None);
        assert_eq!(found(&index, 100, false, Direction::Descending), Some(7));
    }

    #[test]
    fn find_descending_lands_on_last_duplicate() {
        let index = index_of(&[3, 1, 3, 3]);
        let node = index
            .find(&Value::Integer(3), true, Direction::Descending)
            .unwrap()
            .unwrap();
        assert_eq!(node.data_block(), DataBlock::new(BlockAddress::new(3)));
    }

    #[test]
    fn find_in_empty_index() {
        let index = index_of(&[]);
        assert_eq!(found(&index, 0, true, Direction::Ascending), None);
        assert_eq!(found(&index, 0, true, Direction::Descending), None);
        assert_eq!(index.find_all(Direction::Ascending).count(), 0);
    }

    #[test]
    fn find_all_both_directions() {
        let index = index_of(&[4, 2, 9, 2]);
        assert_eq!(keys(index.find_all(Direction::Ascending)), vec![2, 2, 4, 9]);
        assert_eq!(keys(index.find_all(Direction::Descending)), vec![9, 4, 2, 2]);
    }

    #[test]
    fn find_all_is_restartable() {
        let index = index_of(&[1, 2, 3]);
        let mut first = index.find_all(Direction::Ascending);
        first.next();
        assert_eq!(keys(index.find_all(Direction::Ascending)), vec![1, 2, 3]);
        assert_eq!(keys(first), vec![2, 3]);
    }

    #[test]
    fn bounded_walk_stops_at_first_failing_key() {
        let index = index_of(&[1, 2, 3, 10, 4]);
        let start = index.find(&Value::Integer(2), true, Direction::Ascending).unwrap();
        let walk = IndexWalk::from_node(&index, start, Direction::Ascending)
            .while_key(|k| k <= &Value::Integer(4));
        assert_eq!(keys(walk), vec![2, 3, 4]);
    }

    #[test]
    fn walk_is_fused() {
        let index = index_of(&[1]);
        let mut walk = index.find_all(Direction::Ascending);
        assert!(walk.next().is_some());
        assert!(walk.next().is_none());
        assert!(walk.next().is_none());
        assert!(IndexWalk::empty(&index).next().is_none());
    }
}
