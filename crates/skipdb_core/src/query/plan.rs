//! Query plans: an execution mode plus a lazy node source.

use crate::error::CoreResult;
use crate::index::IndexNode;
use crate::types::ExecuteMode;
use std::fmt;

/// Lazy stream of index nodes produced by a plan.
pub type NodeStream<'a> = Box<dyn Iterator<Item = CoreResult<&'a IndexNode>> + 'a>;

/// The outcome of executing a query: the mode it resolved to and the nodes
/// it produces.
///
/// With [`ExecuteMode::IndexSeek`] the nodes are the exact result. With
/// [`ExecuteMode::FullScan`] straight out of
/// [`Query::exec_index`](crate::Query::exec_index) they are a superset that
/// still has to be filtered with
/// [`Query::exec_full_scan`](crate::Query::exec_full_scan); plans returned by
/// [`Query::run`](crate::Query::run) are already filtered.
///
/// The plan itself iterates its nodes.
pub struct QueryPlan<'a> {
    mode: ExecuteMode,
    nodes: NodeStream<'a>,
}

impl<'a> QueryPlan<'a> {
    /// Creates a plan from a mode and a node source.
    pub fn new<I>(mode: ExecuteMode, nodes: I) -> Self
    where
        I: Iterator<Item = CoreResult<&'a IndexNode>> + 'a,
    {
        Self {
            mode,
            nodes: Box::new(nodes),
        }
    }

    /// A plan that yields nothing.
    #[must_use]
    pub fn empty(mode: ExecuteMode) -> Self {
        Self::new(mode, std::iter::empty())
    }

    /// The resolved execution mode.
    #[must_use]
    pub fn mode(&self) -> ExecuteMode {
        self.mode
    }

    /// Downgrades the mode to full scan.
    #[must_use]
    pub fn into_full_scan(mut self) -> Self {
        self.mode = ExecuteMode::FullScan;
        self
    }
}

impl<'a> Iterator for QueryPlan<'a> {
    type Item = CoreResult<&'a IndexNode>;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.next()
    }
}

impl fmt::Debug for QueryPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryPlan")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
