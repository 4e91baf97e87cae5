//! Collection store public surface
//!
//! A [`Store`] maps named collections onto namespaces of the underlying
//! engine and exposes filesystem-like operations over slash-delimited paths:
//! intermediate segments are containers, the terminal segment is a leaf
//! holding opaque bytes.
//!
//! Every mutation (put, delete, drop) is applied as one atomic step; reads
//! observe either all of a mutation or none of it. The handle enforces the
//! multi-reader/single-writer discipline across threads sharing it.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::node::{child_key, EntryRecord, NodeKind, ROOT};
use crate::path::PathKey;
use crate::tree;
use parking_lot::RwLock;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Handle to an open store
///
/// Cheap to share behind an `Arc`; all operations take `&self`.
pub struct Store {
    db: sled::Db,
    path: PathBuf,
    latch: RwLock<()>,
}

impl Store {
    /// Open (or create) a store at the given path with default configuration
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_with(StoreConfig::new(path))
    }

    /// Open (or create) a store with the given configuration
    ///
    /// Waits up to the configured lock timeout for the engine's exclusive
    /// file lock, then fails with `LockTimeout`.
    pub fn open_with(config: StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        let timeout = config.lock_timeout();
        let start = Instant::now();

        let db = loop {
            let mut engine = sled::Config::new().path(&config.path);
            if let Some(capacity) = config.cache_capacity {
                engine = engine.cache_capacity(capacity);
            }
            match engine.open() {
                Ok(db) => break db,
                Err(e) if lock_contended(&e) => {
                    if start.elapsed() >= timeout {
                        return Err(StoreError::LockTimeout {
                            path: config.path,
                            timeout,
                        });
                    }
                    warn!(path = %config.path.display(), "Store lock held, retrying");
                    std::thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        };

        debug!(path = %config.path.display(), "Opened store");
        Ok(Self {
            db,
            path: config.path,
            latch: RwLock::new(()),
        })
    }

    /// Write `content` into the leaf addressed by `path`, creating
    /// intermediate containers as needed
    ///
    /// Overwrites an existing leaf at the terminal name; fails with
    /// `NameConflict` if a container occupies it. The whole write commits
    /// atomically or not at all.
    pub fn put(&self, collection: &str, path: &str, content: &[u8]) -> Result<(), StoreError> {
        let key = PathKey::normalize(path);
        if key.is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        debug!(collection, path, bytes = content.len(), "put");

        let _write = self.latch.write();
        let tree = self.db.open_tree(collection)?;
        let mut batch = sled::Batch::default();
        let (parent, name) = tree::resolve_for_write(&self.db, &tree, &mut batch, key.segments())?;

        if let Some(EntryRecord::Container { .. }) = tree::lookup(&tree, parent, name)? {
            return Err(StoreError::NameConflict {
                name: name.to_string(),
                kind: NodeKind::Container,
            });
        }
        let record = EntryRecord::Leaf {
            content: content.to_vec(),
        };
        batch.insert(child_key(parent, name), record.encode()?);
        tree.apply_batch(batch)?;
        Ok(())
    }

    /// Read the node addressed by `keys`
    ///
    /// Each element of `keys` is used verbatim as one name; nothing is
    /// re-split on `/`. A leaf returns its raw content; a container returns
    /// its rendered listing, exactly as if it were the view root. Empty
    /// `keys` is equivalent to [`view`](Store::view).
    pub fn get(&self, collection: &str, keys: &[&str]) -> Result<Vec<u8>, StoreError> {
        debug!(collection, depth = keys.len(), "get");

        let _read = self.latch.read();
        let tree = self.db.open_tree(collection)?;
        match tree::resolve(&tree, keys)? {
            EntryRecord::Leaf { content } => Ok(content),
            EntryRecord::Container { node } => {
                let mut out = Vec::new();
                tree::render(&tree, node, 0, &mut out)?;
                Ok(out)
            }
        }
    }

    /// Render the full recursive listing of a collection
    pub fn view(&self, collection: &str) -> Result<Vec<u8>, StoreError> {
        debug!(collection, "view");

        let _read = self.latch.read();
        let tree = self.db.open_tree(collection)?;
        let mut out = Vec::new();
        tree::render(&tree, ROOT, 0, &mut out)?;
        Ok(out)
    }

    /// Delete the node addressed by `path`, recursively for containers
    ///
    /// The entire subtree is removed as one atomic step.
    pub fn delete(&self, collection: &str, path: &str) -> Result<(), StoreError> {
        let key = PathKey::normalize(path);
        if key.is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        debug!(collection, path, "delete");

        let _write = self.latch.write();
        let tree = self.db.open_tree(collection)?;
        let mut batch = sled::Batch::default();
        tree::collect_subtree(&tree, &mut batch, key.segments())?;
        tree.apply_batch(batch)?;
        Ok(())
    }

    /// Remove an entire collection
    ///
    /// Idempotent: dropping an absent collection is not an error.
    pub fn drop_collection(&self, collection: &str) -> Result<(), StoreError> {
        debug!(collection, "drop collection");

        let _write = self.latch.write();
        self.db.drop_tree(collection)?;
        Ok(())
    }

    /// Names of the collections currently present, in ascending order
    pub fn collections(&self) -> Vec<String> {
        let _read = self.latch.read();
        let mut names: Vec<String> = self
            .db
            .tree_names()
            .into_iter()
            .filter(|name| !name.starts_with(b"__sled__"))
            .map(|name| String::from_utf8_lossy(&name).into_owned())
            .collect();
        names.sort();
        names
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    /// On-disk location of the store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the underlying engine handle (for advanced operations)
    pub fn db(&self) -> &sled::Db {
        &self.db
    }
}

// The engine surfaces lock contention as an opaque I/O error; match both the
// kind and the message sled 0.34.x attaches to it.
fn lock_contended(err: &sled::Error) -> bool {
    match err {
        sled::Error::Io(e) => {
            e.kind() == io::ErrorKind::WouldBlock
                || e.to_string().contains("could not acquire lock")
        }
        _ => false,
    }
}
