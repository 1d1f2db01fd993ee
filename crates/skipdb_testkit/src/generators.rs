//! Property-based test generators using proptest.
//!
//! Values are drawn from small domains so generated queries actually hit
//! generated documents: a handful of integers, short texts mixing case and
//! spaces, booleans and null.

use proptest::prelude::*;
use skipdb_codec::Value;
use skipdb_core::{Direction, IndexOptions, Query};

/// Field paths generated documents may carry.
pub const FIELDS: [&str; 3] = ["a", "b", "c.d"];

/// Strategy for generating one of [`FIELDS`].
pub fn field_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(FIELDS.to_vec())
}

/// Strategy for generating scalar field values.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        1 => Just(Value::Null),
        4 => (-4i64..4).prop_map(Value::Integer),
        4 => prop::string::string_regex("[ aAbB]{0,3}")
            .expect("Invalid regex")
            .prop_map(Value::Text),
        1 => any::<bool>().prop_map(Value::Bool),
    ]
}

/// Strategy for generating documents over [`FIELDS`]. Any field may be
/// missing; `c.d` lives in a nested document.
pub fn document_strategy() -> impl Strategy<Value = Value> {
    (
        prop::option::of(scalar_strategy()),
        prop::option::of(scalar_strategy()),
        prop::option::of(scalar_strategy()),
    )
        .prop_map(|(a, b, d)| {
            let mut members = Vec::new();
            if let Some(a) = a {
                members.push(("a".to_string(), a));
            }
            if let Some(b) = b {
                members.push(("b".to_string(), b));
            }
            if let Some(d) = d {
                members.push(("c".to_string(), Value::document([("d", d)])));
            }
            Value::Document(members)
        })
}

/// Strategy for generating a batch of documents.
pub fn documents_strategy(max: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(document_strategy(), 0..max)
}

/// Strategy for generating non-unique index options.
pub fn index_options_strategy() -> impl Strategy<Value = IndexOptions> {
    prop_oneof![
        Just(IndexOptions::default()),
        Just(IndexOptions::binary()),
        Just(IndexOptions::binary().ignore_case(true)),
        Just(IndexOptions::binary().trim_whitespace(true)),
    ]
}

/// Strategy for generating which fields get an index, and with what options.
pub fn index_plan_strategy() -> impl Strategy<Value = Vec<(&'static str, IndexOptions)>> {
    prop::collection::vec(
        (any::<bool>(), index_options_strategy()),
        FIELDS.len(),
    )
    .prop_map(|choices| {
        FIELDS
            .into_iter()
            .zip(choices)
            .filter_map(|(field, (indexed, options))| indexed.then_some((field, options)))
            .collect()
    })
}

/// Strategy for generating single-field queries.
pub fn leaf_query_strategy() -> impl Strategy<Value = Query> {
    let fv = || (field_strategy(), scalar_strategy());
    prop_oneof![
        (field_strategy(), any::<bool>()).prop_map(|(f, desc)| Query::all_by(
            f,
            if desc {
                Direction::Descending
            } else {
                Direction::Ascending
            }
        )),
        fv().prop_map(|(f, v)| Query::eq(f, v)),
        (fv(), any::<bool>()).prop_map(|((f, v), equals)| if equals {
            Query::gte(f, v)
        } else {
            Query::gt(f, v)
        }),
        (fv(), any::<bool>()).prop_map(|((f, v), equals)| if equals {
            Query::lte(f, v)
        } else {
            Query::lt(f, v)
        }),
        (field_strategy(), scalar_strategy(), scalar_strategy())
            .prop_map(|(f, lo, hi)| Query::between(f, lo, hi)),
        (field_strategy(), prop::collection::vec(scalar_strategy(), 0..4))
            .prop_map(|(f, vs)| Query::in_values(f, vs)),
        fv().prop_map(|(f, v)| Query::contains(f, v)),
        fv().prop_map(|(f, v)| Query::starts_with(f, v)),
        fv().prop_map(|(f, v)| Query::not_eq(f, v)),
    ]
}

/// Strategy for generating query trees of nested `Not`, `And` and `Or`.
pub fn query_strategy() -> impl Strategy<Value = Query> {
    leaf_query_strategy().prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            1 => inner.clone().prop_map(Query::not),
            2 => (inner.clone(), inner.clone()).prop_map(|(l, r)| Query::and(l, r)),
            2 => (inner.clone(), inner).prop_map(|(l, r)| Query::or(l, r)),
        ]
    })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
