//! # skipdb Codec
//!
//! Document value model for skipdb.
//!
//! This crate provides:
//! - [`Value`], the dynamic document type, with a single total order across
//!   all value types
//! - [`Collation`], the normalization applied to values before they are
//!   compared by an index
//! - CBOR encoding used to store documents
//!
//! ## Usage
//!
//! ```
//! use skipdb_codec::{from_cbor, to_cbor, Collation, Value};
//!
//! let doc = Value::document([("name", "Ada")]);
//! let bytes = to_cbor(&doc).unwrap();
//! assert_eq!(from_cbor(&bytes).unwrap(), doc);
//!
//! let upper = Value::from("ADA");
//! let folded = upper.normalize(&Collation::binary().ignore_case(true));
//! assert_eq!(folded.as_ref(), &Value::from("ada"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collation;
mod encoding;
mod error;
mod value;

pub use collation::Collation;
pub use encoding::{document_from_cbor, from_cbor, to_cbor};
pub use error::{CodecError, CodecResult};
pub use value::Value;
