//! Cross-crate integration test helpers.
//!
//! [`QueryHarness`] keeps a plain copy of every document it inserts and
//! checks indexed query results against a brute-force evaluation of the same
//! query over that copy.

use crate::fixtures::TestCollection;
use skipdb_codec::Value;
use skipdb_core::{Collection, IndexOptions, Query, ID_FIELD};
use skipdb_storage::BlockStore;

/// A test harness for query integration testing.
pub struct QueryHarness {
    /// The collection under test.
    pub test: TestCollection,
    /// Live documents, `_id` included, for verification.
    shadow: Vec<Value>,
}

impl QueryHarness {
    /// Creates a harness over an empty test collection.
    pub fn new(test: TestCollection) -> Self {
        Self {
            test,
            shadow: Vec::new(),
        }
    }

    /// The collection under test.
    pub fn collection(&self) -> &Collection<Box<dyn BlockStore>> {
        &self.test
    }

    /// Inserts a document and tracks it. Returns its `_id`.
    pub fn insert(&mut self, mut doc: Value) -> Value {
        let id = self.test.insert(doc.clone()).expect("Failed to insert document");
        doc.set(ID_FIELD, id.clone());
        self.shadow.push(doc);
        id
    }

    /// Inserts and tracks every document.
    pub fn insert_all(&mut self, docs: impl IntoIterator<Item = Value>) -> Vec<Value> {
        docs.into_iter().map(|doc| self.insert(doc)).collect()
    }

    /// Deletes a document and updates tracking.
    pub fn delete(&mut self, id: &Value) -> bool {
        let deleted = self
            .test
            .delete(id.clone())
            .expect("Failed to delete document");
        let tracked = self.shadow.len();
        self.shadow.retain(|doc| doc.get(ID_FIELD) != Some(id));
        assert_eq!(
            deleted,
            tracked != self.shadow.len(),
            "Delete of {id} disagrees with tracking"
        );
        deleted
    }

    /// Creates an index on `field`.
    pub fn ensure_index(&mut self, field: &str, options: IndexOptions) {
        self.test
            .ensure_index(field, options)
            .expect("Failed to create index");
    }

    /// `_id`s of the tracked documents matching `query`, sorted.
    pub fn expected(&self, query: &Query) -> Vec<Value> {
        let mut ids: Vec<Value> = self
            .shadow
            .iter()
            .filter(|doc| self.test.matches(query, doc))
            .filter_map(|doc| doc.get(ID_FIELD).cloned())
            .collect();
        ids.sort();
        ids
    }

    /// `_id`s the collection returns for `query`, in result order.
    pub fn actual(&self, query: &Query) -> Vec<Value> {
        self.test
            .find(query)
            .expect("Failed to run query")
            .map(|doc| {
                doc.expect("Failed to read result")
                    .get(ID_FIELD)
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect()
    }

    /// Runs `query` and verifies it against brute force.
    ///
    /// Checks that no document is returned twice, that the result set equals
    /// the brute-force set, that `explain` predicts the mode the run resolved
    /// to, and that every index is still ordered. Returns the result count.
    pub fn check(&self, query: &Query) -> usize {
        let mut actual = self.actual(query);
        let returned = actual.len();
        actual.sort();
        actual.dedup();
        assert_eq!(returned, actual.len(), "Duplicate results for `{query}`");
        assert_eq!(actual, self.expected(query), "Wrong results for `{query}`");

        let plan = query.run(self.collection()).expect("Failed to run query");
        assert_eq!(
            self.test.explain(query).mode,
            plan.mode(),
            "Explain disagrees with run for `{query}`"
        );

        self.test.check_indexes().expect("Index order violated");
        returned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{init_tracing, sample_people};
    use crate::generators::{
        documents_strategy, index_plan_strategy, query_strategy, PropTestConfig,
    };
    use proptest::prelude::*;
    use skipdb_core::{Config, CoreError, Direction, ExecuteMode};

    fn harness_with(docs: Vec<Value>, plan: &[(&str, IndexOptions)]) -> QueryHarness {
        let mut harness = QueryHarness::new(TestCollection::memory());
        harness.insert_all(docs);
        for (field, options) in plan {
            harness.ensure_index(field, *options);
        }
        harness
    }

    fn f_docs(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&f| Value::document([("f", f)])).collect()
    }

    #[test]
    fn or_with_identical_branches_returns_one_result() {
        for plan in [vec![], vec![("f", IndexOptions::default())]] {
            let harness = harness_with(f_docs(&[1]), &plan);
            let q = Query::or(Query::eq("f", 1), Query::eq("f", 1));
            assert_eq!(harness.check(&q), 1);
        }
    }

    #[test]
    fn or_of_two_values_returns_both_documents() {
        for plan in [vec![], vec![("f", IndexOptions::binary())]] {
            let harness = harness_with(f_docs(&[1, 2, 3]), &plan);
            let q = Query::or(Query::eq("f", 1), Query::eq("f", 2));
            let mut ids = harness.actual(&q);
            ids.sort();
            assert_eq!(ids, vec![Value::Integer(1), Value::Integer(2)]);
            harness.check(&q);
        }
    }

    #[test]
    fn contains_downgrades_a_conjunction() {
        let mut harness = QueryHarness::new(TestCollection::memory());
        harness.ensure_index("f", IndexOptions::default());
        harness.ensure_index("g", IndexOptions::default());
        harness.insert_all([
            Value::document([("f", Value::from("xy")), ("g", Value::Integer(1))]),
            Value::document([("f", Value::from("y")), ("g", Value::Integer(1))]),
            Value::document([("f", Value::from("x")), ("g", Value::Integer(2))]),
        ]);

        let q = Query::and(Query::contains("f", "x"), Query::eq("g", 1));
        assert_eq!(harness.collection().explain(&q).mode, ExecuteMode::FullScan);
        assert_eq!(
            harness.collection().explain(&Query::eq("g", 1)).mode,
            ExecuteMode::IndexSeek
        );
        assert_eq!(harness.check(&q), 1);
    }

    #[test]
    fn all_returns_every_document_once() {
        let harness = harness_with(f_docs(&[3, 1, 2, 1]), &[("f", IndexOptions::binary())]);
        let asc = Query::all_by("f", Direction::Ascending);
        let fs: Vec<i64> = harness
            .collection()
            .find(&asc)
            .unwrap()
            .map(|doc| doc.unwrap().get("f").unwrap().as_integer().unwrap())
            .collect();
        assert_eq!(fs, vec![1, 1, 2, 3]);
        assert_eq!(harness.check(&asc), 4);
        assert_eq!(harness.check(&Query::all()), 4);
    }

    #[test]
    fn less_returns_descending_order() {
        let harness = harness_with(f_docs(&[5, 1, 4, 2]), &[("f", IndexOptions::binary())]);
        assert_eq!(
            harness.actual(&Query::lte("f", 4)),
            vec![Value::Integer(3), Value::Integer(4), Value::Integer(2)]
        );
    }

    #[test]
    fn people_queries() {
        init_tracing();
        let mut harness = QueryHarness::new(TestCollection::file());
        harness.insert_all(sample_people());
        harness.ensure_index("age", IndexOptions::default());
        harness.ensure_index("city", IndexOptions::default());

        assert_eq!(harness.check(&Query::gte("age", 30)), 3);
        assert_eq!(harness.check(&Query::between("age", 20, 31)), 3);
        assert_eq!(harness.check(&Query::in_values("city", ["LISBON", "faro"])), 3);
        assert_eq!(harness.check(&Query::starts_with("name", "jo")), 1);
        assert_eq!(
            harness.check(&Query::and(
                Query::eq("city", "porto"),
                Query::not(Query::eq("age", Value::Null))
            )),
            1
        );
    }

    #[test]
    fn strict_collection_refuses_unindexed_queries() {
        let mut harness = QueryHarness::new(TestCollection::memory_with(
            Config::new().forbid_full_scans(true),
        ));
        harness.insert_all(sample_people());

        let err = Query::eq("city", "Porto")
            .run(harness.collection())
            .unwrap_err();
        assert!(matches!(err, CoreError::FullScanForbidden { .. }));

        harness.ensure_index("city", IndexOptions::default());
        assert_eq!(harness.check(&Query::eq("city", "Porto")), 2);
    }

    proptest! {
        #![proptest_config(PropTestConfig::default().to_proptest_config())]

        #[test]
        fn indexed_and_brute_force_results_agree(
            docs in documents_strategy(30),
            plan in index_plan_strategy(),
            query in query_strategy(),
        ) {
            let harness = harness_with(docs, &plan);
            harness.check(&query);
        }

        #[test]
        fn agreement_survives_deletes(
            docs in documents_strategy(30),
            plan in index_plan_strategy(),
            query in query_strategy(),
            deletes in prop::collection::vec(1i64..31, 0..10),
        ) {
            let mut harness = harness_with(docs, &plan);
            for id in deletes {
                harness.delete(&Value::Integer(id));
            }
            harness.check(&query);
        }
    }
}
