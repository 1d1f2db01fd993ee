//! # skipdb Core
//!
//! Indexes and query execution for skipdb.
//!
//! This crate provides:
//! - [`CollectionIndex`], an ordered skip-list index over one document field
//! - Index navigation: boundary seeks and lazy walks in either direction
//! - [`Query`], the predicate tree, with an index path and a full-scan path
//!   for every operator
//! - [`Collection`], which owns documents and indexes and picks, per query,
//!   between an index seek and a full scan
//!
//! ## Usage
//!
//! ```
//! use skipdb_core::{Collection, ExecuteMode, IndexOptions, Query};
//! use skipdb_codec::Value;
//!
//! let mut books = Collection::in_memory("books");
//! books.ensure_index("year", IndexOptions::default()).unwrap();
//! for (title, year) in [("Dune", 1965), ("Neuromancer", 1984), ("Hyperion", 1989)] {
//!     books
//!         .insert(Value::document([("title", Value::from(title)), ("year", Value::Integer(year))]))
//!         .unwrap();
//! }
//!
//! let recent = Query::gte("year", 1980);
//! assert_eq!(books.explain(&recent).mode, ExecuteMode::IndexSeek);
//! assert_eq!(books.count(&recent).unwrap(), 2);
//!
//! let fuzzy = Query::contains("title", "ion");
//! assert_eq!(books.explain(&fuzzy).mode, ExecuteMode::FullScan);
//! assert_eq!(books.count(&fuzzy).unwrap(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
mod error;
mod index;
mod query;
mod types;

pub use collection::{Collection, Cursor, Explain};
pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use index::{CollectionIndex, IndexNode, IndexOptions, IndexWalk, KeyBound, MAX_LEVEL};
pub use query::{NodeStream, Query, QueryPlan, ID_FIELD};
pub use types::{DataBlock, Direction, ExecuteMode, NodeId};
