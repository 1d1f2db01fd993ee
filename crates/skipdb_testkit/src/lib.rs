//! # skipdb Testkit
//!
//! Test utilities for skipdb.
//!
//! This crate provides:
//! - Collection fixtures backed by memory or a temporary file
//! - Property-based generators for documents, index options and queries
//! - A harness that checks indexed query results against brute force
//! - Tracing setup for tests
//!
//! ## Usage
//!
//! ```rust
//! use skipdb_testkit::prelude::*;
//! use skipdb_core::{IndexOptions, Query};
//!
//! let mut harness = QueryHarness::new(TestCollection::memory());
//! harness.insert_all(sample_people());
//! harness.ensure_index("age", IndexOptions::default());
//! assert_eq!(harness.check(&Query::gte("age", 30)), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
