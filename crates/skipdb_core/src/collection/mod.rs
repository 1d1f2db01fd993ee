//! Document collections.
//!
//! A [`Collection`] owns a block store holding encoded documents and the
//! skip-list indexes over their fields. It is the layer queries run against:
//! it decides, per query, whether an index can drive the traversal or the
//! whole collection has to be scanned.
//!
//! Every collection has a unique index on `_id`. Further indexes are added
//! with [`Collection::ensure_index`].

mod cursor;
mod execute;

pub use cursor::{Cursor, Explain};

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::index::{CollectionIndex, IndexNode, IndexOptions};
use crate::query::{field_key, ID_FIELD};
use crate::types::{DataBlock, Direction};
use skipdb_codec::{document_from_cbor, to_cbor, Value};
use skipdb_storage::{BlockStore, InMemoryBlockStore};
use std::collections::HashMap;
use tracing::debug;

/// A collection of documents plus the indexes over them.
///
/// # Example
///
/// ```rust
/// use skipdb_core::{Collection, IndexOptions, Query};
/// use skipdb_codec::Value;
///
/// let mut people = Collection::in_memory("people");
/// people.insert(Value::document([("name", "Ana"), ("city", "Lisbon")])).unwrap();
/// people.insert(Value::document([("name", "Rui"), ("city", "Porto")])).unwrap();
/// people.ensure_index("city", IndexOptions::default()).unwrap();
///
/// let found: Vec<Value> = people
///     .find(&Query::eq("city", "PORTO"))
///     .unwrap()
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].get("name"), Some(&Value::from("Rui")));
/// ```
#[derive(Debug)]
pub struct Collection<S: BlockStore = InMemoryBlockStore> {
    name: String,
    config: Config,
    store: S,
    indexes: HashMap<String, CollectionIndex>,
    next_id: i64,
}

impl Collection<InMemoryBlockStore> {
    /// Creates an empty collection backed by memory, with default config.
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self::with_store(name, InMemoryBlockStore::new(), Config::default())
    }
}

impl<S: BlockStore> Collection<S> {
    /// Creates an empty collection writing documents to `store`.
    pub fn with_store(name: impl Into<String>, store: S, config: Config) -> Self {
        let primary = CollectionIndex::new(
            ID_FIELD,
            IndexOptions::binary().unique(true),
            config.max_level,
            config.seed,
        );
        let mut indexes = HashMap::new();
        indexes.insert(ID_FIELD.to_string(), primary);

        Self {
            name: name.into(),
            config,
            store,
            indexes,
            next_id: 1,
        }
    }

    /// Collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying block store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of live documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indexes.get(ID_FIELD).map_or(0, CollectionIndex::len)
    }

    /// Returns true if the collection holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The index on `field`, if one exists.
    #[must_use]
    pub fn index(&self, field: &str) -> Option<&CollectionIndex> {
        self.indexes.get(field)
    }

    /// Fields that currently have an index, sorted.
    #[must_use]
    pub fn index_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.indexes.keys().map(String::as_str).collect();
        fields.sort_unstable();
        fields
    }

    /// Options values of `field` are normalized with: those of its index, or
    /// the collection default when the field has none.
    #[must_use]
    pub fn index_options_for(&self, field: &str) -> &IndexOptions {
        self.indexes
            .get(field)
            .map_or(&self.config.default_index_options, CollectionIndex::options)
    }

    pub(crate) fn primary(&self) -> CoreResult<&CollectionIndex> {
        self.indexes
            .get(ID_FIELD)
            .ok_or_else(|| CoreError::IndexNotFound {
                field: ID_FIELD.to_string(),
            })
    }

    /// Inserts a document and returns its `_id`.
    ///
    /// A missing or null `_id` is replaced by the next auto-increment
    /// integer. Every unique index is checked before anything is written, so
    /// a rejected document leaves the collection untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if `doc` is not a document,
    /// [`CoreError::UniqueViolation`] on a duplicate unique key, and storage
    /// or codec errors from writing the document.
    pub fn insert(&mut self, mut doc: Value) -> CoreResult<Value> {
        if !matches!(doc, Value::Document(_)) {
            return Err(CoreError::invalid_operation(format!(
                "only documents can be inserted, got {}",
                doc.type_name()
            )));
        }

        let id = match doc.get(ID_FIELD) {
            Some(id) if !id.is_null() => id.clone(),
            _ => {
                let id = Value::Integer(self.next_id);
                doc.set(ID_FIELD, id.clone());
                id
            }
        };

        for (field, index) in &self.indexes {
            index.check_unique(field_key(&doc, field))?;
        }

        let bytes = to_cbor(&doc)?;
        let block = DataBlock::new(self.store.write_block(&bytes)?);

        for (field, index) in &mut self.indexes {
            index.insert(field_key(&doc, field), block)?;
        }

        if let Value::Integer(n) = id {
            self.next_id = self.next_id.max(n.saturating_add(1));
        }

        debug!(collection = %self.name, %id, %block, "inserted document");
        Ok(id)
    }

    /// Inserts several documents, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// See [`Collection::insert`]. Documents before the failing one stay
    /// inserted.
    pub fn insert_many<I>(&mut self, docs: I) -> CoreResult<Vec<Value>>
    where
        I: IntoIterator<Item = Value>,
    {
        docs.into_iter().map(|doc| self.insert(doc)).collect()
    }

    /// Fetches the document with the given `_id`.
    ///
    /// # Errors
    ///
    /// Returns storage or codec errors from reading the document.
    pub fn get(&self, id: impl Into<Value>) -> CoreResult<Option<Value>> {
        match self.locate(&id.into())? {
            Some(block) => self.load(block).map(Some),
            None => Ok(None),
        }
    }

    /// Removes the document with the given `_id` from every index.
    ///
    /// Returns `false` if there is no such document. The encoded bytes stay
    /// in the block store; nothing references them afterwards.
    ///
    /// # Errors
    ///
    /// Returns storage or codec errors from reading the document, and
    /// [`CoreError::InvalidOperation`] if an index did not hold an entry for
    /// it. The document is gone from every other index either way.
    pub fn delete(&mut self, id: impl Into<Value>) -> CoreResult<bool> {
        let id = id.into();
        let Some(block) = self.locate(&id)? else {
            return Ok(false);
        };
        let doc = self.load(block)?;

        let mut missing = Vec::new();
        for (field, index) in &mut self.indexes {
            if !index.remove(field_key(&doc, field), block)? {
                missing.push(field.as_str());
            }
        }
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(CoreError::invalid_operation(format!(
                "document {id} was missing from indexes [{}]",
                missing.join(", ")
            )));
        }

        debug!(collection = %self.name, %id, %block, "deleted document");
        Ok(true)
    }

    /// Creates an index on `field` over the existing documents.
    ///
    /// Returns `false` if the field is already indexed; the existing index
    /// and its options are kept.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UniqueViolation`] if `options` asks for a unique
    /// index and two documents share a key. The index is not created then.
    pub fn ensure_index(&mut self, field: impl Into<String>, options: IndexOptions) -> CoreResult<bool> {
        let field = field.into();
        if self.indexes.contains_key(&field) {
            return Ok(false);
        }

        let seed = self
            .config
            .seed
            .map(|seed| seed.wrapping_add(self.indexes.len() as u64));
        let mut index = CollectionIndex::new(field.as_str(), options, self.config.max_level, seed);

        for node in self.primary()?.find_all(Direction::Ascending) {
            let block = node?.data_block();
            let doc = self.load(block)?;
            index.insert(field_key(&doc, &field), block)?;
        }

        debug!(
            collection = %self.name,
            %field,
            entries = index.len(),
            unique = index.options().unique,
            "created index"
        );
        self.indexes.insert(field, index);
        Ok(true)
    }

    /// Drops the index on `field`. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] for the `_id` index.
    pub fn drop_index(&mut self, field: &str) -> CoreResult<bool> {
        if field == ID_FIELD {
            return Err(CoreError::invalid_operation("the _id index cannot be dropped"));
        }
        let dropped = self.indexes.remove(field).is_some();
        if dropped {
            debug!(collection = %self.name, field, "dropped index");
        }
        Ok(dropped)
    }

    /// Reads and decodes the document stored at `block`.
    ///
    /// # Errors
    ///
    /// Returns storage errors for a bad address and codec errors for bytes
    /// that are not an encoded document.
    pub fn load(&self, block: DataBlock) -> CoreResult<Value> {
        let bytes = self.store.read_block(block.address())?;
        Ok(document_from_cbor(&bytes)?)
    }

    /// Loads the document an index node points at.
    ///
    /// # Errors
    ///
    /// See [`Collection::load`].
    pub fn load_node(&self, node: &IndexNode) -> CoreResult<Value> {
        self.load(node.data_block())
    }

    /// Flushes the block store.
    ///
    /// # Errors
    ///
    /// Returns storage errors from the flush.
    pub fn flush(&mut self) -> CoreResult<()> {
        Ok(self.store.flush()?)
    }

    /// Verifies the ordering invariant of every index.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_indexes(&self) -> CoreResult<()> {
        self.indexes.values().try_for_each(CollectionIndex::check_order)
    }

    fn locate(&self, id: &Value) -> CoreResult<Option<DataBlock>> {
        let primary = self.primary()?;
        let id = primary.options().normalize(id);
        let node = primary.find(&id, true, Direction::Ascending)?;
        Ok(node
            .filter(|node| node.key() == id.as_ref())
            .map(IndexNode::data_block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skipdb_storage::FileBlockStore;
    use tempfile::tempdir;

    fn people() -> Collection {
        let mut c = Collection::with_store("people", InMemoryBlockStore::new(), Config::new().seed(7));
        for (name, age) in [("Ana", 31), ("rui", 25), ("Eva", 31), ("João", 40)] {
            c.insert(Value::document([
                ("name", Value::from(name)),
                ("age", Value::Integer(age)),
            ]))
            .unwrap();
        }
        c
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let mut c = Collection::in_memory("c");
        assert_eq!(c.insert(Value::document([("a", 1)])).unwrap(), Value::Integer(1));
        assert_eq!(c.insert(Value::document([("a", 2)])).unwrap(), Value::Integer(2));
        assert_eq!(
            c.insert(Value::document([("_id", 10)])).unwrap(),
            Value::Integer(10)
        );
        assert_eq!(c.insert(Value::document([("a", 3)])).unwrap(), Value::Integer(11));
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn insert_rejects_non_documents() {
        let mut c = Collection::in_memory("c");
        let err = c.insert(Value::Integer(3)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation { .. }));
        assert!(c.is_empty());
    }

    #[test]
    fn duplicate_id_is_rejected_without_side_effects() {
        let mut c = Collection::in_memory("c");
        c.ensure_index("a", IndexOptions::default()).unwrap();
        c.insert(Value::document([("_id", 1), ("a", 1)])).unwrap();
        let size = c.store().size().unwrap();

        let err = c.insert(Value::document([("_id", 1), ("a", 2)])).unwrap_err();
        assert!(matches!(err, CoreError::UniqueViolation { ref field, .. } if field == "_id"));
        assert_eq!(c.store().size().unwrap(), size);
        assert_eq!(c.index("a").unwrap().len(), 1);
    }

    #[test]
    fn get_and_delete() {
        let mut c = people();
        let doc = c.get(2).unwrap().unwrap();
        assert_eq!(doc.get("name"), Some(&Value::from("rui")));
        assert!(c.get(99).unwrap().is_none());

        c.ensure_index("age", IndexOptions::default()).unwrap();
        assert!(c.delete(2).unwrap());
        assert!(!c.delete(2).unwrap());
        assert!(c.get(2).unwrap().is_none());
        assert_eq!(c.len(), 3);
        assert_eq!(c.index("age").unwrap().len(), 3);
        c.check_indexes().unwrap();
    }

    #[test]
    fn delete_reports_an_index_missing_the_document() {
        let mut c = people();
        c.ensure_index("age", IndexOptions::default()).unwrap();
        let block = c.locate(&Value::Integer(1)).unwrap().unwrap();
        let age = c.indexes.get_mut("age").unwrap();
        assert!(age.remove(&Value::Integer(31), block).unwrap());

        let err = c.delete(1).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation { ref message } if message.contains("[age]")));
        assert!(c.get(1).unwrap().is_none());
        assert_eq!(c.len(), 3);
        c.check_indexes().unwrap();
    }

    #[test]
    fn ensure_index_covers_existing_documents() {
        let mut c = people();
        assert!(c.ensure_index("age", IndexOptions::binary()).unwrap());
        assert!(!c.ensure_index("age", IndexOptions::default()).unwrap());
        assert_eq!(c.index("age").unwrap().len(), 4);
        assert_eq!(c.index_options_for("age"), &IndexOptions::binary());
        assert_eq!(c.index_options_for("missing"), &IndexOptions::default());
        assert_eq!(c.index_fields(), vec!["_id", "age"]);
    }

    #[test]
    fn unique_index_over_duplicates_fails() {
        let mut c = people();
        let err = c
            .ensure_index("age", IndexOptions::default().unique(true))
            .unwrap_err();
        assert!(matches!(err, CoreError::UniqueViolation { .. }));
        assert!(c.index("age").is_none());
    }

    #[test]
    fn unique_index_normalizes_keys() {
        let mut c = people();
        c.ensure_index("name", IndexOptions::default().unique(true)).unwrap();
        let err = c.insert(Value::document([("name", " ANA ")])).unwrap_err();
        assert!(matches!(err, CoreError::UniqueViolation { .. }));
    }

    #[test]
    fn missing_field_is_indexed_as_null() {
        let mut c = people();
        c.insert(Value::document([("other", 1)])).unwrap();
        c.ensure_index("age", IndexOptions::default()).unwrap();
        let first = c
            .index("age")
            .unwrap()
            .find_all(Direction::Ascending)
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(first.key(), &Value::Null);
    }

    #[test]
    fn drop_index() {
        let mut c = people();
        c.ensure_index("age", IndexOptions::default()).unwrap();
        assert!(c.drop_index("age").unwrap());
        assert!(!c.drop_index("age").unwrap());
        assert!(c.drop_index("_id").is_err());
    }

    #[test]
    fn file_backed_collection() {
        let dir = tempdir().unwrap();
        let store = FileBlockStore::open(&dir.path().join("people.blocks")).unwrap();
        let mut c = Collection::with_store("people", store, Config::default());
        let id = c.insert(Value::document([("name", "Ana")])).unwrap();
        c.flush().unwrap();
        assert_eq!(
            c.get(id).unwrap().unwrap().get("name"),
            Some(&Value::from("Ana"))
        );
    }
}
