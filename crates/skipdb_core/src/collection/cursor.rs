//! Reading query results as documents.

use super::execute::and_driver;
use super::Collection;
use crate::error::CoreResult;
use crate::query::{Query, QueryPlan, ID_FIELD};
use crate::types::ExecuteMode;
use skipdb_codec::Value;
use skipdb_storage::BlockStore;
use std::fmt;

/// A lazy iterator over the documents a query matched.
///
/// Each document is read from the block store only when the cursor is
/// pulled. Skipped results are never loaded.
pub struct Cursor<'a, S: BlockStore> {
    collection: &'a Collection<S>,
    plan: QueryPlan<'a>,
    skip: usize,
    remaining: Option<usize>,
}

impl<S: BlockStore> Cursor<'_, S> {
    /// Mode the query resolved to.
    #[must_use]
    pub fn mode(&self) -> ExecuteMode {
        self.plan.mode()
    }
}

impl<S: BlockStore> Iterator for Cursor<'_, S> {
    type Item = CoreResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }
        loop {
            let node = match self.plan.next()? {
                Ok(node) => node,
                Err(e) => return Some(Err(e)),
            };
            if self.skip > 0 {
                self.skip -= 1;
                continue;
            }
            if let Some(remaining) = &mut self.remaining {
                *remaining -= 1;
            }
            return Some(self.collection.load_node(node));
        }
    }
}

impl<S: BlockStore> fmt::Debug for Cursor<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("collection", &self.collection.name())
            .field("mode", &self.plan.mode())
            .field("skip", &self.skip)
            .field("remaining", &self.remaining)
            .finish()
    }
}

/// How a query would be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explain {
    /// The resolved execution mode.
    pub mode: ExecuteMode,
    /// Fields of the indexes the plan walks, in execution order. A plan that
    /// scans the collection walks `_id`.
    pub indexes: Vec<String>,
}

impl fmt::Display for Explain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} via [{}]", self.mode, self.indexes.join(", "))
    }
}

impl<S: BlockStore> Collection<S> {
    /// Runs `query` and returns a cursor over the matching documents.
    ///
    /// # Errors
    ///
    /// See [`Query::run`].
    pub fn find(&self, query: &Query) -> CoreResult<Cursor<'_, S>> {
        self.find_with(query, 0, None)
    }

    /// Like [`Collection::find`], skipping the first `skip` results and
    /// stopping after `limit` documents.
    ///
    /// # Errors
    ///
    /// See [`Query::run`].
    pub fn find_with(
        &self,
        query: &Query,
        skip: usize,
        limit: Option<usize>,
    ) -> CoreResult<Cursor<'_, S>> {
        Ok(Cursor {
            collection: self,
            plan: query.run(self)?,
            skip,
            remaining: limit,
        })
    }

    /// Number of documents matching `query`.
    ///
    /// # Errors
    ///
    /// See [`Query::run`]; errors hit during the traversal are returned too.
    pub fn count(&self, query: &Query) -> CoreResult<usize> {
        query
            .run(self)?
            .try_fold(0, |count, node| node.map(|_| count + 1))
    }

    /// Whether any document matches `query`. Stops at the first match.
    ///
    /// # Errors
    ///
    /// See [`Collection::count`].
    pub fn exists(&self, query: &Query) -> CoreResult<bool> {
        Ok(query.run(self)?.next().transpose()?.is_some())
    }

    /// Describes how `query` would execute, without running it.
    #[must_use]
    pub fn explain(&self, query: &Query) -> Explain {
        let mut indexes = Vec::new();
        self.plan_indexes(query, &mut indexes);
        Explain {
            mode: query.resolve_mode(self),
            indexes,
        }
    }

    fn plan_indexes(&self, query: &Query, out: &mut Vec<String>) {
        match query {
            Query::And(left, right) => {
                let (driver, _) = and_driver(left, right, self);
                self.plan_indexes(driver, out);
            }
            Query::Or(left, right) => {
                self.plan_indexes(left, out);
                self.plan_indexes(right, out);
            }
            leaf => {
                let field = leaf
                    .field()
                    .filter(|field| self.index(field).is_some())
                    .unwrap_or(ID_FIELD);
                if !out.iter().any(|f| f == field) {
                    out.push(field.to_string());
                }
            }
        }
    }
}
