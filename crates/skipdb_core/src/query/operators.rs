//! The three operations every query operator implements.

use super::{Query, QueryPlan};
use crate::error::{CoreError, CoreResult};
use crate::index::{CollectionIndex, IndexOptions, IndexWalk};
use crate::types::{Direction, ExecuteMode};
use skipdb_codec::Value;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeSet;

static NULL: Value = Value::Null;

/// The raw key `doc` has for `field`. Missing members read as null.
pub(crate) fn field_key<'d>(doc: &'d Value, field: &str) -> &'d Value {
    doc.get_path(field).unwrap_or(&NULL)
}

fn field_value<'d>(doc: &'d Value, field: &str, options: &IndexOptions) -> Cow<'d, Value> {
    options.normalize(field_key(doc, field))
}

/// Walks the run of nodes whose key equals `value`, from the first one.
fn equal_walk(index: &CollectionIndex, value: Value) -> CoreResult<IndexWalk<'_>> {
    let start = index.find(&value, true, Direction::Ascending)?;
    Ok(IndexWalk::from_node(index, start, Direction::Ascending).while_key(move |key| *key == value))
}

impl Query {
    /// Produces index-driven candidates from `index`, which must be the index
    /// on this operator's field.
    ///
    /// Literal values must already be normalized with the index's options
    /// (see [`Query::normalize_values`]). The returned plan is lazy: seeks run
    /// now, but nodes are only visited as the plan is pulled.
    ///
    /// Operators that cannot be answered by an ordered seek return mode
    /// [`ExecuteMode::FullScan`] and a superset of the matching nodes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Unsupported`] for `Or`, which must go through
    /// [`Query::run`], and propagates node resolution errors from the seek.
    pub fn exec_index<'a>(&self, index: &'a CollectionIndex) -> CoreResult<QueryPlan<'a>> {
        match self {
            Query::All { order, .. } => Ok(QueryPlan::new(
                ExecuteMode::IndexSeek,
                index.find_all(*order),
            )),

            Query::Equals { value, .. } => Ok(QueryPlan::new(
                ExecuteMode::IndexSeek,
                equal_walk(index, value.clone())?,
            )),

            Query::Greater { value, equals, .. } => {
                let start = index.find(value, *equals, Direction::Ascending)?;
                let (bound, equals) = (value.clone(), *equals);
                let walk = IndexWalk::from_node(index, start, Direction::Ascending).while_key(
                    move |key| match key.cmp(&bound) {
                        Ordering::Greater => true,
                        Ordering::Equal => equals,
                        Ordering::Less => false,
                    },
                );
                Ok(QueryPlan::new(ExecuteMode::IndexSeek, walk))
            }

            Query::Less { value, equals, .. } => {
                let start = index.find(value, *equals, Direction::Descending)?;
                let (bound, equals) = (value.clone(), *equals);
                let walk = IndexWalk::from_node(index, start, Direction::Descending).while_key(
                    move |key| match key.cmp(&bound) {
                        Ordering::Less => true,
                        Ordering::Equal => equals,
                        Ordering::Greater => false,
                    },
                );
                Ok(QueryPlan::new(ExecuteMode::IndexSeek, walk))
            }

            Query::Between { start, end, .. } => {
                let first = index.find(start, true, Direction::Ascending)?;
                let (low, high) = (start.clone(), end.clone());
                let walk = IndexWalk::from_node(index, first, Direction::Ascending)
                    .while_key(move |key| *key >= low && *key <= high);
                Ok(QueryPlan::new(ExecuteMode::IndexSeek, walk))
            }

            Query::In { values, .. } => {
                let distinct: BTreeSet<Value> = values.iter().cloned().collect();
                let walks = distinct
                    .into_iter()
                    .map(|value| equal_walk(index, value))
                    .collect::<CoreResult<Vec<_>>>()?;
                Ok(QueryPlan::new(
                    ExecuteMode::IndexSeek,
                    walks.into_iter().flatten(),
                ))
            }

            Query::StartsWith { value, .. } => {
                let Value::Text(prefix) = value else {
                    return Ok(QueryPlan::empty(ExecuteMode::IndexSeek));
                };
                let start = index.find(value, true, Direction::Ascending)?;
                let prefix = prefix.clone();
                let walk = IndexWalk::from_node(index, start, Direction::Ascending).while_key(
                    move |key| key.as_text().is_some_and(|text| text.starts_with(&prefix)),
                );
                Ok(QueryPlan::new(ExecuteMode::IndexSeek, walk))
            }

            Query::Contains { .. } | Query::Not(_) => Ok(QueryPlan::new(
                ExecuteMode::FullScan,
                index.find_all(Direction::Ascending),
            )),

            Query::And(left, right) => {
                let driver = [left, right]
                    .into_iter()
                    .find(|child| child.field() == Some(index.field()));
                match driver {
                    Some(child) => Ok(child.exec_index(index)?.into_full_scan()),
                    None => Ok(QueryPlan::new(
                        ExecuteMode::FullScan,
                        index.find_all(Direction::Ascending),
                    )),
                }
            }

            Query::Or(..) => Err(CoreError::unsupported("exec_index", self)),
        }
    }

    /// Returns a copy of this query with every literal normalized under
    /// `options`.
    ///
    /// Normalizing twice gives the same query as normalizing once.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Unsupported`] for `Or`, whose branches may target
    /// indexes with different options.
    pub fn normalize_values(&self, options: &IndexOptions) -> CoreResult<Query> {
        let norm = |value: &Value| options.normalize(value).into_owned();

        let normalized = match self {
            Query::All { .. } => self.clone(),
            Query::Equals { field, value } => Query::Equals {
                field: field.clone(),
                value: norm(value),
            },
            Query::Greater {
                field,
                value,
                equals,
            } => Query::Greater {
                field: field.clone(),
                value: norm(value),
                equals: *equals,
            },
            Query::Less {
                field,
                value,
                equals,
            } => Query::Less {
                field: field.clone(),
                value: norm(value),
                equals: *equals,
            },
            Query::Between { field, start, end } => Query::Between {
                field: field.clone(),
                start: norm(start),
                end: norm(end),
            },
            Query::In { field, values } => Query::In {
                field: field.clone(),
                values: values.iter().map(norm).collect(),
            },
            Query::Contains { field, value } => Query::Contains {
                field: field.clone(),
                value: norm(value),
            },
            Query::StartsWith { field, value } => Query::StartsWith {
                field: field.clone(),
                value: norm(value),
            },
            Query::Not(inner) => Query::Not(Box::new(inner.normalize_values(options)?)),
            Query::And(left, right) => Query::And(
                Box::new(left.normalize_values(options)?),
                Box::new(right.normalize_values(options)?),
            ),
            Query::Or(..) => return Err(CoreError::unsupported("normalize_values", self)),
        };
        Ok(normalized)
    }

    /// Decides the predicate directly on `doc`, without any index.
    ///
    /// The field value and the literals are normalized with `options` before
    /// comparing. Composite operators pass the same `options` to their
    /// children. Text operators on non-text values are simply false.
    #[must_use]
    pub fn exec_full_scan(&self, doc: &Value, options: &IndexOptions) -> bool {
        match self {
            Query::All { .. } => true,

            Query::Equals { field, value } => {
                *field_value(doc, field, options) == *options.normalize(value)
            }

            Query::Greater {
                field,
                value,
                equals,
            } => match field_value(doc, field, options).cmp(&options.normalize(value)) {
                Ordering::Greater => true,
                Ordering::Equal => *equals,
                Ordering::Less => false,
            },

            Query::Less {
                field,
                value,
                equals,
            } => match field_value(doc, field, options).cmp(&options.normalize(value)) {
                Ordering::Less => true,
                Ordering::Equal => *equals,
                Ordering::Greater => false,
            },

            Query::Between { field, start, end } => {
                let v = field_value(doc, field, options);
                *v >= *options.normalize(start) && *v <= *options.normalize(end)
            }

            Query::In { field, values } => {
                let v = field_value(doc, field, options);
                values.iter().any(|candidate| *options.normalize(candidate) == *v)
            }

            Query::Contains { field, value } => {
                let v = field_value(doc, field, options);
                let needle = options.normalize(value);
                match (v.as_text(), needle.as_text()) {
                    (Some(text), Some(needle)) => text.contains(needle),
                    _ => false,
                }
            }

            Query::StartsWith { field, value } => {
                let v = field_value(doc, field, options);
                let prefix = options.normalize(value);
                match (v.as_text(), prefix.as_text()) {
                    (Some(text), Some(prefix)) => text.starts_with(prefix),
                    _ => false,
                }
            }

            Query::Not(inner) => !inner.exec_full_scan(doc, options),
            Query::And(left, right) => {
                left.exec_full_scan(doc, options) && right.exec_full_scan(doc, options)
            }
            Query::Or(left, right) => {
                left.exec_full_scan(doc, options) || right.exec_full_scan(doc, options)
            }
        }
    }
}
