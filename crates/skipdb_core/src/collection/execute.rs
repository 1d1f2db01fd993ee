//! Execution mode selection: running a query tree against a collection.

use super::Collection;
use crate::error::{CoreError, CoreResult};
use crate::index::IndexNode;
use crate::query::{Query, QueryPlan, ID_FIELD};
use crate::types::{DataBlock, Direction, ExecuteMode};
use skipdb_codec::Value;
use skipdb_storage::BlockStore;
use std::collections::HashSet;
use tracing::{debug, warn};

impl Query {
    /// Executes this query against `collection`.
    ///
    /// The returned plan yields exactly the matching nodes; candidates of
    /// full-scan steps are already filtered. Its mode is
    /// [`ExecuteMode::FullScan`] if any part of the tree had to fall back to
    /// a scan.
    ///
    /// - A leaf with an index on its field normalizes its literals with that
    ///   index's options and seeks it.
    /// - A leaf without an index walks the `_id` index and tests every
    ///   document.
    /// - `And` runs the first child that has an index on its field and
    ///   filters the results by the other child.
    /// - `Or` runs both children and yields their union, without repeating a
    ///   document that both sides produce.
    ///
    /// Seeks happen here; documents are only read as the plan is pulled.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FullScanForbidden`] when a whole-collection scan
    /// is needed and the config forbids it. Errors hit while pulling come
    /// out of the plan as `Err` items.
    pub fn run<'a, S: BlockStore>(&self, collection: &'a Collection<S>) -> CoreResult<QueryPlan<'a>> {
        match self {
            Query::And(left, right) => {
                let (driver, other) = and_driver(left, right, collection);
                let plan = driver.run(collection)?;
                let mode = plan.mode().combine(other.resolve_mode(collection));
                debug!(
                    collection = collection.name(),
                    driver = %driver,
                    filter = %other,
                    %mode,
                    "and plan"
                );
                Ok(filtered(mode, plan, other.clone(), collection))
            }

            Query::Or(left, right) => {
                let left = left.run(collection)?;
                let right = right.run(collection)?;
                let mode = left.mode().combine(right.mode());
                debug!(collection = collection.name(), query = %self, %mode, "or plan");

                let mut seen: HashSet<DataBlock> = HashSet::new();
                let union = left.chain(right).filter(move |node| match node {
                    Ok(node) => seen.insert(node.data_block()),
                    Err(_) => true,
                });
                Ok(QueryPlan::new(mode, union))
            }

            leaf => match leaf.field().and_then(|field| collection.index(field)) {
                Some(index) => {
                    let normalized = leaf.normalize_values(index.options())?;
                    let plan = normalized.exec_index(index)?;
                    debug!(
                        collection = collection.name(),
                        query = %leaf,
                        index = index.field(),
                        mode = %plan.mode(),
                        "index plan"
                    );
                    if plan.mode().is_full_scan() {
                        Ok(filtered(plan.mode(), plan, normalized, collection))
                    } else {
                        Ok(plan)
                    }
                }
                None => scan(leaf, collection),
            },
        }
    }

    /// The mode [`Query::run`] would resolve to, without executing anything.
    ///
    /// Leaves with an index on their field take their operator's mode; leaves
    /// without one need a full scan. Composite modes combine, so one scanning
    /// child makes the whole tree a scan.
    #[must_use]
    pub fn resolve_mode<S: BlockStore>(&self, collection: &Collection<S>) -> ExecuteMode {
        match self {
            Query::And(left, right) | Query::Or(left, right) => left
                .resolve_mode(collection)
                .combine(right.resolve_mode(collection)),
            leaf => match leaf.field().and_then(|field| collection.index(field)) {
                Some(_) => leaf.index_mode(),
                None => ExecuteMode::FullScan,
            },
        }
    }
}

impl<S: BlockStore> Collection<S> {
    /// Decides `query` on `doc` without any index.
    ///
    /// Each leaf is evaluated with the options of its own field, so the
    /// answer agrees with what the indexes on those fields would return.
    #[must_use]
    pub fn matches(&self, query: &Query, doc: &Value) -> bool {
        match query {
            Query::Not(inner) => !self.matches(inner, doc),
            Query::And(left, right) => self.matches(left, doc) && self.matches(right, doc),
            Query::Or(left, right) => self.matches(left, doc) || self.matches(right, doc),
            leaf => {
                let field = leaf.field().unwrap_or(ID_FIELD);
                leaf.exec_full_scan(doc, self.index_options_for(field))
            }
        }
    }
}

/// Picks the child of an `And` that drives execution: the left one, unless
/// only the right one has an index on its field.
pub(crate) fn and_driver<'q, S: BlockStore>(
    left: &'q Query,
    right: &'q Query,
    collection: &Collection<S>,
) -> (&'q Query, &'q Query) {
    let indexed = |query: &Query| {
        query
            .field()
            .is_some_and(|field| collection.index(field).is_some())
    };
    if !indexed(left) && indexed(right) {
        (right, left)
    } else {
        (left, right)
    }
}

/// Keeps only the nodes whose document matches `query`.
fn filtered<'a, S, I>(
    mode: ExecuteMode,
    nodes: I,
    query: Query,
    collection: &'a Collection<S>,
) -> QueryPlan<'a>
where
    S: BlockStore,
    I: Iterator<Item = CoreResult<&'a IndexNode>> + 'a,
{
    let nodes = nodes.filter_map(move |node| {
        let node = match node {
            Ok(node) => node,
            Err(e) => return Some(Err(e)),
        };
        match collection.load(node.data_block()) {
            Ok(doc) => collection.matches(&query, &doc).then_some(Ok(node)),
            Err(e) => Some(Err(e)),
        }
    });
    QueryPlan::new(mode, nodes)
}

/// Tests every document in `_id` order.
fn scan<'a, S: BlockStore>(query: &Query, collection: &'a Collection<S>) -> CoreResult<QueryPlan<'a>> {
    if collection.config().forbid_full_scans {
        return Err(CoreError::full_scan_forbidden(query));
    }
    debug!(collection = collection.name(), %query, "no usable index, scanning collection");

    let name = collection.name();
    let threshold = collection.config().scan_warning_threshold;
    let mut visited = 0usize;
    let walk = collection
        .primary()?
        .find_all(Direction::Ascending)
        .inspect(move |_| {
            visited += 1;
            if visited == threshold.saturating_add(1) {
                warn!(collection = name, threshold, "full scan passed the warning threshold");
            }
        });

    Ok(filtered(ExecuteMode::FullScan, walk, query.clone(), collection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::index::IndexOptions;
    use skipdb_storage::InMemoryBlockStore;

    fn numbers(values: &[i64]) -> Collection {
        let mut c = Collection::with_store("n", InMemoryBlockStore::new(), Config::new().seed(3));
        for &f in values {
            c.insert(Value::document([("f", Value::Integer(f)), ("g", Value::Integer(f % 2))]))
                .unwrap();
        }
        c
    }

    fn ids(collection: &Collection, query: &Query) -> Vec<i64> {
        query
            .run(collection)
            .unwrap()
            .map(|node| {
                let doc = collection.load_node(node.unwrap()).unwrap();
                doc.get("_id").unwrap().as_integer().unwrap()
            })
            .collect()
    }

    fn sorted(mut v: Vec<i64>) -> Vec<i64> {
        v.sort_unstable();
        v
    }

    #[test]
    fn or_deduplicates_the_same_document() {
        for indexed in [false, true] {
            let mut c = numbers(&[1]);
            if indexed {
                c.ensure_index("f", IndexOptions::default()).unwrap();
            }
            let q = Query::or(Query::eq("f", 1), Query::eq("f", 1));
            assert_eq!(ids(&c, &q), vec![1]);
        }
    }

    #[test]
    fn or_is_a_union() {
        let mut c = numbers(&[1, 2, 3]);
        let q = Query::or(Query::eq("f", 1), Query::eq("f", 2));
        assert_eq!(sorted(ids(&c, &q)), vec![1, 2]);
        assert_eq!(q.run(&c).unwrap().mode(), ExecuteMode::FullScan);

        c.ensure_index("f", IndexOptions::default()).unwrap();
        assert_eq!(sorted(ids(&c, &q)), vec![1, 2]);
        assert_eq!(q.run(&c).unwrap().mode(), ExecuteMode::IndexSeek);
    }

    #[test]
    fn or_across_different_indexes() {
        let mut c = numbers(&[1, 2, 3, 4]);
        c.ensure_index("f", IndexOptions::default()).unwrap();
        c.ensure_index("g", IndexOptions::default()).unwrap();
        let q = Query::or(Query::gte("f", 3), Query::eq("g", 1));
        assert_eq!(sorted(ids(&c, &q)), vec![1, 3, 4]);
        assert_eq!(q.run(&c).unwrap().mode(), ExecuteMode::IndexSeek);
    }

    #[test]
    fn and_mode_propagates_full_scan() {
        let mut c = Collection::in_memory("c");
        c.ensure_index("f", IndexOptions::default()).unwrap();
        c.ensure_index("g", IndexOptions::default()).unwrap();
        c.insert(Value::document([("f", Value::from("xyz")), ("g", Value::Integer(1))])).unwrap();
        c.insert(Value::document([("f", Value::from("abc")), ("g", Value::Integer(1))])).unwrap();

        let q = Query::and(Query::contains("f", "x"), Query::eq("g", 1));
        assert_eq!(q.resolve_mode(&c), ExecuteMode::FullScan);
        let plan = q.run(&c).unwrap();
        assert_eq!(plan.mode(), ExecuteMode::FullScan);
        assert_eq!(plan.count(), 1);

        assert_eq!(Query::eq("g", 1).resolve_mode(&c), ExecuteMode::IndexSeek);
    }

    #[test]
    fn and_drives_from_the_indexed_child() {
        let mut c = numbers(&[1, 2, 3, 4, 5, 6]);
        c.ensure_index("f", IndexOptions::default()).unwrap();
        let q = Query::and(Query::eq("g", 0), Query::lt("f", 5));

        let (driver, _) = match &q {
            Query::And(l, r) => and_driver(l, r, &c),
            _ => unreachable!(),
        };
        assert_eq!(driver, &Query::lt("f", 5));
        // Less walks backward, so the driver's order shows through
        assert_eq!(ids(&c, &q), vec![4, 2]);
    }

    #[test]
    fn leaf_without_index_scans() {
        let c = numbers(&[5, 1, 4]);
        let q = Query::gt("f", 1);
        let plan = q.run(&c).unwrap();
        assert_eq!(plan.mode(), ExecuteMode::FullScan);
        assert_eq!(ids(&c, &q), vec![1, 3]);
    }

    #[test]
    fn strict_mode_refuses_scans() {
        let mut c = Collection::with_store(
            "c",
            InMemoryBlockStore::new(),
            Config::new().forbid_full_scans(true),
        );
        c.insert(Value::document([("f", 1)])).unwrap();

        let err = Query::eq("f", 1).run(&c).unwrap_err();
        assert!(matches!(err, CoreError::FullScanForbidden { .. }));

        c.ensure_index("f", IndexOptions::default()).unwrap();
        assert_eq!(Query::eq("f", 1).run(&c).unwrap().count(), 1);
    }

    #[test]
    fn not_over_composite_is_scanned() {
        let c = numbers(&[1, 2, 3, 4]);
        let q = Query::not(Query::or(Query::eq("f", 1), Query::eq("f", 4)));
        assert_eq!(q.resolve_mode(&c), ExecuteMode::FullScan);
        assert_eq!(ids(&c, &q), vec![2, 3]);
    }

    #[test]
    fn matches_uses_each_fields_options() {
        let mut c = Collection::with_store(
            "c",
            InMemoryBlockStore::new(),
            Config::new().default_index_options(IndexOptions::binary()),
        );
        c.ensure_index("a", IndexOptions::default()).unwrap();
        let doc = Value::document([("a", "Hello"), ("b", "Hello")]);

        assert!(c.matches(&Query::eq("a", "HELLO"), &doc));
        assert!(!c.matches(&Query::eq("b", "HELLO"), &doc));
        assert!(c.matches(&Query::not_eq("b", "HELLO"), &doc));
    }

    #[test]
    fn plans_are_lazy() {
        let c = numbers(&[1, 2, 3, 4, 5]);
        let mut plan = Query::all().run(&c).unwrap();
        assert!(plan.next().is_some());
        drop(plan);
        assert_eq!(Query::all().run(&c).unwrap().count(), 5);
    }
}
