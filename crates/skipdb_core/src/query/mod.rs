//! Query operators.
//!
//! A [`Query`] is a predicate tree over document fields. Every operator can
//! be evaluated two ways, and the two must always agree:
//!
//! - [`Query::exec_index`] drives a traversal of an index on the operator's
//!   field and returns a [`QueryPlan`]
//! - [`Query::exec_full_scan`] decides the predicate directly on a document
//!
//! Composite operators (`And`, `Or`) usually span several fields and are
//! executed against a whole collection with [`Query::run`].
//!
//! # Example
//!
//! ```rust
//! use skipdb_core::Query;
//!
//! let q = Query::and(
//!     Query::gte("age", 18),
//!     Query::or(Query::eq("city", "Lisbon"), Query::starts_with("city", "Porto")),
//! );
//! assert_eq!(q.to_string(), r#"(age >= 18 and (city = "Lisbon" or city startsWith "Porto"))"#);
//! ```

mod operators;
mod plan;

pub(crate) use operators::field_key;
pub use plan::{NodeStream, QueryPlan};

use crate::types::{Direction, ExecuteMode};
use skipdb_codec::Value;
use std::fmt;

/// Field every collection indexes.
pub const ID_FIELD: &str = "_id";

/// One node of a predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Every document, in index order.
    All {
        /// Field whose index gives the order.
        field: String,
        /// Traversal direction.
        order: Direction,
    },
    /// `field == value`.
    Equals {
        /// Field path.
        field: String,
        /// Literal compared against.
        value: Value,
    },
    /// `field > value`, or `field >= value` when `equals` is set.
    Greater {
        /// Field path.
        field: String,
        /// Lower bound.
        value: Value,
        /// Whether the bound itself matches.
        equals: bool,
    },
    /// `field < value`, or `field <= value` when `equals` is set.
    Less {
        /// Field path.
        field: String,
        /// Upper bound.
        value: Value,
        /// Whether the bound itself matches.
        equals: bool,
    },
    /// `start <= field <= end`.
    Between {
        /// Field path.
        field: String,
        /// Inclusive lower bound.
        start: Value,
        /// Inclusive upper bound.
        end: Value,
    },
    /// `field` equals one of `values`.
    In {
        /// Field path.
        field: String,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// Text `field` contains the text `value`.
    Contains {
        /// Field path.
        field: String,
        /// Substring looked for.
        value: Value,
    },
    /// Text `field` starts with the text `value`.
    StartsWith {
        /// Field path.
        field: String,
        /// Prefix looked for.
        value: Value,
    },
    /// Negation of the inner query.
    Not(Box<Query>),
    /// Both queries match.
    And(Box<Query>, Box<Query>),
    /// Either query matches.
    Or(Box<Query>, Box<Query>),
}

impl Query {
    /// Every document in ascending `_id` order.
    #[must_use]
    pub fn all() -> Self {
        Self::all_by(ID_FIELD, Direction::Ascending)
    }

    /// Every document in the order of the index on `field`.
    pub fn all_by(field: impl Into<String>, order: Direction) -> Self {
        Query::All {
            field: field.into(),
            order,
        }
    }

    /// `field == value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `field > value`.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Greater {
            field: field.into(),
            value: value.into(),
            equals: false,
        }
    }

    /// `field >= value`.
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Greater {
            field: field.into(),
            value: value.into(),
            equals: true,
        }
    }

    /// `field < value`.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Less {
            field: field.into(),
            value: value.into(),
            equals: false,
        }
    }

    /// `field <= value`.
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Less {
            field: field.into(),
            value: value.into(),
            equals: true,
        }
    }

    /// `start <= field <= end`.
    pub fn between(
        field: impl Into<String>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Self {
        Query::Between {
            field: field.into(),
            start: start.into(),
            end: end.into(),
        }
    }

    /// `field` is one of `values`.
    pub fn in_values<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Query::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Text `field` contains `value`.
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Text `field` starts with `value`.
    pub fn starts_with(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::StartsWith {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `field != value`.
    pub fn not_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::not(Self::eq(field, value))
    }

    /// Negates `query`.
    #[must_use]
    pub fn not(query: Query) -> Self {
        Query::Not(Box::new(query))
    }

    /// Both `left` and `right`.
    #[must_use]
    pub fn and(left: Query, right: Query) -> Self {
        Query::And(Box::new(left), Box::new(right))
    }

    /// Either `left` or `right`.
    #[must_use]
    pub fn or(left: Query, right: Query) -> Self {
        Query::Or(Box::new(left), Box::new(right))
    }

    /// The field this operator tests.
    ///
    /// `Not` reports its inner query's field; `And` and `Or` have none.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Query::All { field, .. }
            | Query::Equals { field, .. }
            | Query::Greater { field, .. }
            | Query::Less { field, .. }
            | Query::Between { field, .. }
            | Query::In { field, .. }
            | Query::Contains { field, .. }
            | Query::StartsWith { field, .. } => Some(field),
            Query::Not(inner) => inner.field(),
            Query::And(..) | Query::Or(..) => None,
        }
    }

    /// Mode this operator executes in when an index on its field exists.
    ///
    /// `Contains` and `Not` can never be answered by an ordered seek.
    #[must_use]
    pub fn index_mode(&self) -> ExecuteMode {
        match self {
            Query::Contains { .. } | Query::Not(_) => ExecuteMode::FullScan,
            Query::And(left, right) | Query::Or(left, right) => {
                left.index_mode().combine(right.index_mode())
            }
            _ => ExecuteMode::IndexSeek,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::All { field, order } => {
                let order = match order {
                    Direction::Ascending => "asc",
                    Direction::Descending => "desc",
                };
                write!(f, "all({field} {order})")
            }
            Query::Equals { field, value } => write!(f, "{field} = {value}"),
            Query::Greater {
                field,
                value,
                equals,
            } => write!(f, "{field} {} {value}", if *equals { ">=" } else { ">" }),
            Query::Less {
                field,
                value,
                equals,
            } => write!(f, "{field} {} {value}", if *equals { "<=" } else { "<" }),
            Query::Between { field, start, end } => {
                write!(f, "{field} between [{start}, {end}]")
            }
            Query::In { field, values } => {
                write!(f, "{field} in {}", Value::Array(values.clone()))
            }
            Query::Contains { field, value } => write!(f, "{field} contains {value}"),
            Query::StartsWith { field, value } => write!(f, "{field} startsWith {value}"),
            Query::Not(inner) => write!(f, "not({inner})"),
            Query::And(left, right) => write!(f, "({left} and {right})"),
            Query::Or(left, right) => write!(f, "({left} or {right})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_build_expected_variants() {
        assert_eq!(
            Query::gte("age", 18),
            Query::Greater {
                field: "age".into(),
                value: Value::Integer(18),
                equals: true
            }
        );
        assert_eq!(
            Query::not_eq("a", 1),
            Query::Not(Box::new(Query::eq("a", 1)))
        );
        assert_eq!(
            Query::all(),
            Query::All {
                field: ID_FIELD.into(),
                order: Direction::Ascending
            }
        );
    }

    #[test]
    fn field_of_each_operator() {
        assert_eq!(Query::eq("a.b", 1).field(), Some("a.b"));
        assert_eq!(Query::not(Query::lt("x", 1)).field(), Some("x"));
        assert_eq!(Query::and(Query::eq("a", 1), Query::eq("a", 2)).field(), None);
        assert_eq!(Query::all().field(), Some("_id"));
    }

    #[test]
    fn index_mode_by_operator() {
        assert_eq!(Query::eq("a", 1).index_mode(), ExecuteMode::IndexSeek);
        assert_eq!(Query::contains("a", "x").index_mode(), ExecuteMode::FullScan);
        assert_eq!(Query::not_eq("a", 1).index_mode(), ExecuteMode::FullScan);
        assert_eq!(
            Query::and(Query::contains("f", "x"), Query::eq("g", 1)).index_mode(),
            ExecuteMode::FullScan
        );
    }

    #[test]
    fn display_reads_like_a_predicate() {
        assert_eq!(Query::lt("n", 3).to_string(), "n < 3");
        assert_eq!(
            Query::in_values("n", [1, 2]).to_string(),
            "n in [1, 2]"
        );
        assert_eq!(
            Query::not(Query::between("n", 1, 5)).to_string(),
            "not(n between [1, 5])"
        );
        assert_eq!(
            Query::all_by("name", Direction::Descending).to_string(),
            "all(name desc)"
        );
    }
}
