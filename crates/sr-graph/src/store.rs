//! Key → blob stores backing the graph cache.
//!
//! Every store publishes atomically: a reader sees either no entry, the
//! previous blob, or the complete new blob, never a partial write.
//!
//! | Store               | Publish mechanism                        |
//! |---------------------|------------------------------------------|
//! | `MemoryGraphStore`  | swap of an `Arc<[u8]>` under a lock      |
//! | `FileGraphStore`    | write temp file, then `rename` over      |
//! | `SqliteGraphStore`  | single-statement upsert (`sqlite` only)  |

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use sha2::{Digest, Sha256};

use sr_core::TravelMode;

use crate::source::AreaSpec;
use crate::StoreError;

// ── CacheKey ──────────────────────────────────────────────────────────────────

/// Content-addressed key for one `(area, mode)` pair: SHA-256 hex of
/// `"{place}|{mode}|{bbox}"`, with the unused area component left empty.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive(area: &AreaSpec, mode: TravelMode) -> Self {
        let place = area.place().unwrap_or("");
        let bbox = area.bbox().map(|b| b.to_string()).unwrap_or_default();
        let digest = Sha256::digest(format!("{place}|{mode}|{bbox}").as_bytes());
        Self(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── GraphStore ────────────────────────────────────────────────────────────────

/// Persistent map from [`CacheKey`] to a serialised graph.
pub trait GraphStore: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StoreError>;

    /// Publish `blob` under `key`, replacing any previous entry atomically.
    fn put(&self, key: &CacheKey, blob: &[u8]) -> Result<(), StoreError>;
}

impl<S: GraphStore + ?Sized> GraphStore for Box<S> {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &CacheKey, blob: &[u8]) -> Result<(), StoreError> {
        (**self).put(key, blob)
    }
}

impl<S: GraphStore + ?Sized> GraphStore for Arc<S> {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &CacheKey, blob: &[u8]) -> Result<(), StoreError> {
        (**self).put(key, blob)
    }
}

// ── Memory ────────────────────────────────────────────────────────────────────

/// Process-local store.  Entries do not survive a restart.
#[derive(Default)]
pub struct MemoryGraphStore {
    entries: RwLock<HashMap<CacheKey, Arc<[u8]>>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GraphStore for MemoryGraphStore {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).map(|b| b.to_vec()))
    }

    fn put(&self, key: &CacheKey, blob: &[u8]) -> Result<(), StoreError> {
        let blob: Arc<[u8]> = Arc::from(blob);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.clone(), blob);
        Ok(())
    }
}

// ── File ──────────────────────────────────────────────────────────────────────

/// One `graph_<key>.json` file per entry in a directory.
pub struct FileGraphStore {
    dir: PathBuf,
    seq: AtomicU64,
}

impl FileGraphStore {
    /// Store rooted at `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), seq: AtomicU64::new(0) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final path of `key`'s entry.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("graph_{key}.json"))
    }
}

impl GraphStore for FileGraphStore {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.entry_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &CacheKey, blob: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let final_path = self.entry_path(key);
        // Unique per process and call so concurrent writers never share a temp.
        let tmp_path = self.dir.join(format!(
            ".graph_{key}.{}.{}.tmp",
            std::process::id(),
            self.seq.fetch_add(1, Ordering::Relaxed)
        ));

        let written: std::io::Result<()> = (|| {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(blob)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &final_path)
        })();
        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        Ok(written?)
    }
}

// ── SQLite ────────────────────────────────────────────────────────────────────

#[cfg(feature = "sqlite")]
pub use self::sqlite::SqliteGraphStore;

#[cfg(feature = "sqlite")]
mod sqlite {
    use std::path::Path;
    use std::sync::{Mutex, PoisonError};

    use rusqlite::{Connection, OptionalExtension, params};

    use super::{CacheKey, GraphStore};
    use crate::StoreError;

    /// Entries in a `graph_cache` table of an SQLite database.
    pub struct SqliteGraphStore {
        conn: Mutex<Connection>,
    }

    impl SqliteGraphStore {
        /// Open (or create) the database at `path` and initialise the schema.
        pub fn open(path: &Path) -> Result<Self, StoreError> {
            Self::init(Connection::open(path)?)
        }

        /// Private in-memory database.
        pub fn in_memory() -> Result<Self, StoreError> {
            Self::init(Connection::open_in_memory()?)
        }

        fn init(conn: Connection) -> Result<Self, StoreError> {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous  = NORMAL;
                 CREATE TABLE IF NOT EXISTS graph_cache (
                     key  TEXT PRIMARY KEY,
                     blob BLOB NOT NULL
                 );",
            )?;
            Ok(Self { conn: Mutex::new(conn) })
        }
    }

    impl GraphStore for SqliteGraphStore {
        fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StoreError> {
            let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
            let blob = conn
                .query_row(
                    "SELECT blob FROM graph_cache WHERE key = ?1",
                    params![key.as_str()],
                    |row| row.get::<_, Vec<u8>>(0),
                )
                .optional()?;
            Ok(blob)
        }

        fn put(&self, key: &CacheKey, blob: &[u8]) -> Result<(), StoreError> {
            let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
            conn.execute(
                "INSERT INTO graph_cache (key, blob) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET blob = excluded.blob",
                params![key.as_str(), blob],
            )?;
            Ok(())
        }
    }
}
