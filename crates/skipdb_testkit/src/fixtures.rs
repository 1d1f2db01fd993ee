//! Test fixtures and collection helpers.
//!
//! Provides collections backed by memory or a temporary file, sample
//! documents, and tracing setup for tests.

use skipdb_codec::Value;
use skipdb_core::{Collection, Config};
use skipdb_storage::{BlockStore, FileBlockStore, InMemoryBlockStore};
use std::path::PathBuf;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Seed used by fixture collections so index layouts are reproducible.
pub const FIXTURE_SEED: u64 = 0x5eed;

/// A test collection with automatic cleanup.
pub struct TestCollection {
    /// The collection instance.
    pub collection: Collection<Box<dyn BlockStore>>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestCollection {
    /// Creates a new in-memory test collection.
    pub fn memory() -> Self {
        Self::memory_with(Config::new().seed(FIXTURE_SEED))
    }

    /// Creates a new in-memory test collection with `config`.
    pub fn memory_with(config: Config) -> Self {
        let store: Box<dyn BlockStore> = Box::new(InMemoryBlockStore::new());
        Self {
            collection: Collection::with_store("test", store, config),
            _temp_dir: None,
        }
    }

    /// Creates a new file-backed test collection.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("data").join("test.blocks");
        let store: Box<dyn BlockStore> = Box::new(
            FileBlockStore::open_with_create_dirs(&path)
                .expect("Failed to create file block store"),
        );

        Self {
            collection: Collection::with_store("test", store, Config::new().seed(FIXTURE_SEED)),
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the block file path if file-backed, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self._temp_dir
            .as_ref()
            .map(|d| d.path().join("data").join("test.blocks"))
    }
}

impl std::ops::Deref for TestCollection {
    type Target = Collection<Box<dyn BlockStore>>;

    fn deref(&self) -> &Self::Target {
        &self.collection
    }
}

impl std::ops::DerefMut for TestCollection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.collection
    }
}

/// Six people with a name, an optional age and a city.
///
/// Tiago has no age. Ages 31 appear twice.
pub fn sample_people() -> Vec<Value> {
    [
        ("Ana", Some(31), "Lisbon"),
        ("Rui", Some(25), "Porto"),
        ("Eva", Some(31), "Braga"),
        ("João", Some(40), "Lisbon"),
        ("Marta", Some(19), " faro "),
        ("Tiago", None, "PORTO"),
    ]
    .into_iter()
    .map(|(name, age, city)| {
        let mut doc = Value::document([("name", name), ("city", city)]);
        if let Some(age) = age {
            doc.set("age", Value::Integer(age));
        }
        doc
    })
    .collect()
}

/// Runs a test with an in-memory collection holding [`sample_people`].
pub fn with_people<F, R>(f: F) -> R
where
    F: FnOnce(&mut TestCollection) -> R,
{
    let mut test = TestCollection::memory();
    test.insert_many(sample_people())
        .expect("Failed to insert sample people");
    f(&mut test)
}

/// Installs a `tracing` subscriber for tests.
///
/// Filtering follows `RUST_LOG` and defaults to `warn`. Calling it more than
/// once is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use skipdb_core::{IndexOptions, Query};

    #[test]
    fn memory_collection() {
        let mut test = TestCollection::memory();
        test.insert(Value::document([("a", 1)])).unwrap();
        assert_eq!(test.len(), 1);
        assert!(test.path().is_none());
    }

    #[test]
    fn file_collection() {
        let mut test = TestCollection::file();
        let id = test.insert(Value::document([("a", 1)])).unwrap();
        test.flush().unwrap();
        assert!(test.path().unwrap().exists());
        assert!(test.get(id).unwrap().is_some());
    }

    #[test]
    fn people_fixture() {
        init_tracing();
        with_people(|people| {
            assert_eq!(people.len(), 6);
            people.ensure_index("city", IndexOptions::default()).unwrap();
            assert_eq!(people.count(&Query::eq("city", "porto")).unwrap(), 2);
            assert_eq!(people.count(&Query::eq("city", "Faro")).unwrap(), 1);
            assert_eq!(people.count(&Query::eq("age", Value::Null)).unwrap(), 1);
        });
    }
}
