//! # Encoded Asset Cache
//!
//! Logos and decorations rarely change between prints, but rasterizing and
//! encoding them is the most expensive step of a job. [`AssetCache`]
//! memoizes encoded bitmaps keyed by `(SHA-256 of source bytes, mode)`:
//!
//! - same bytes, same mode → cached bytes, encode function not called
//! - changed bytes → different hash → cache miss (no explicit invalidation)
//! - same bytes, other mode → separate entry
//!
//! Lookups for one key are serialised, so concurrent callers asking for the
//! same asset wait for the first encode instead of repeating it.
//!
//! Callers whose encoding depends on more than the source bytes (target
//! size, threshold) fold those settings into `source` so a settings change
//! is a cache miss.
//!
//! [`AssetStore`] persists encoded assets as raw binary files, one per named
//! asset and mode, so a restart does not have to encode again. A stored file
//! whose length differs from the expected encoded length is ignored and
//! re-encoded.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{KabalaError, Result};
use crate::render::encoder::EncodingMode;

/// SHA-256 of `data` as lowercase hex.
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// One cached encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub content_hash: String,
    pub mode: EncodingMode,
    pub encoded: Arc<[u8]>,
}

type Key = (String, EncodingMode);
type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// Process-lifetime memo of encoded bitmaps.
#[derive(Debug, Default)]
pub struct AssetCache {
    slots: Mutex<HashMap<Key, Slot>>,
    store: Option<AssetStore>,
}

impl AssetCache {
    /// In-memory cache only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache backed by an on-disk store for named assets.
    pub fn with_store(store: AssetStore) -> Self {
        Self {
            slots: Mutex::default(),
            store: Some(store),
        }
    }

    /// Return the cached encoding of `source` under `mode`, or run `encode`,
    /// cache its output and return it. Errors from `encode` are returned and
    /// nothing is cached.
    pub fn get_or_encode<F>(&self, source: &[u8], mode: EncodingMode, encode: F) -> Result<Arc<[u8]>>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        self.lookup(None, source, mode, encode)
    }

    /// Like [`get_or_encode`](Self::get_or_encode), but also reads and
    /// writes the on-disk store under `name` when one is configured. A
    /// stored file that is not `expected_len` bytes long counts as a miss.
    pub fn get_or_encode_named<F>(
        &self,
        name: &str,
        source: &[u8],
        mode: EncodingMode,
        expected_len: usize,
        encode: F,
    ) -> Result<Arc<[u8]>>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        self.lookup(Some((name, expected_len)), source, mode, encode)
    }

    /// Cached encoding, if present.
    pub fn get(&self, source: &[u8], mode: EncodingMode) -> Option<Arc<[u8]>> {
        let key = (content_hash(source), mode);
        let slot = self.slots().get(&key).cloned()?;
        let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|entry| Arc::clone(&entry.encoded))
    }

    /// Number of cached encodings.
    pub fn len(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<Key, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup<F>(
        &self,
        named: Option<(&str, usize)>,
        source: &[u8],
        mode: EncodingMode,
        encode: F,
    ) -> Result<Arc<[u8]>>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        let hash = content_hash(source);
        let slot = Arc::clone(
            self.slots()
                .entry((hash.clone(), mode))
                .or_default(),
        );

        // The map lock is released; only callers of this key wait here.
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = guard.as_ref() {
            debug!(hash = %&hash[..12], mode = %mode, "asset cache hit");
            return Ok(Arc::clone(&entry.encoded));
        }

        let stored = match (named, &self.store) {
            (Some((name, expected_len)), Some(store)) => store
                .load(name, mode, &hash)?
                .filter(|bytes| {
                    let fits = bytes.len() == expected_len;
                    if !fits {
                        warn!(
                            asset = name,
                            expected = expected_len,
                            actual = bytes.len(),
                            "stored asset has the wrong size, encoding again"
                        );
                    }
                    fits
                }),
            _ => None,
        };
        let encoded: Arc<[u8]> = match stored {
            Some(bytes) => {
                debug!(hash = %&hash[..12], mode = %mode, "asset loaded from store");
                bytes.into()
            }
            None => {
                debug!(hash = %&hash[..12], mode = %mode, "asset cache miss, encoding");
                let bytes = encode()?;
                if let (Some((name, _)), Some(store)) = (named, &self.store)
                    && let Err(e) = store.save(name, mode, &hash, &bytes)
                {
                    warn!(asset = name, error = %e, "failed to persist encoded asset");
                }
                bytes.into()
            }
        };

        *guard = Some(CacheEntry {
            content_hash: hash,
            mode,
            encoded: Arc::clone(&encoded),
        });
        Ok(encoded)
    }
}

// ============================================================================
// ON-DISK STORE
// ============================================================================

/// Directory of encoded assets: `<name>.<mode>.<hash prefix>.bin`.
///
/// Saving a new version of an asset removes the previous file for the same
/// name and mode.
#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
}

const HASH_PREFIX_LEN: usize = 16;

impl AssetStore {
    /// Use `dir`, creating it if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for an asset version.
    pub fn path_for(&self, name: &str, mode: EncodingMode, hash: &str) -> Result<PathBuf> {
        validate_name(name)?;
        let prefix = &hash[..hash.len().min(HASH_PREFIX_LEN)];
        Ok(self.dir.join(format!("{}.{}.{}.bin", name, mode, prefix)))
    }

    /// Read a stored asset version, `None` if absent.
    pub fn load(&self, name: &str, mode: EncodingMode, hash: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(name, mode, hash)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write an asset version and drop older versions of the same name and mode.
    pub fn save(&self, name: &str, mode: EncodingMode, hash: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(name, mode, hash)?;
        let sibling_prefix = format!("{}.{}.", name, mode);
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.starts_with(&sibling_prefix)
                && file_name.ends_with(".bin")
                && entry.path() != path
            {
                fs::remove_file(entry.path())?;
            }
        }

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "stored encoded asset");
        Ok(path)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(KabalaError::Config(format!(
            "Asset name '{}' must be non-empty ASCII letters, digits, '-' or '_'",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    /// SHA-256("hello"), verified against coreutils sha256sum.
    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_content_hash() {
        assert_eq!(content_hash(b"hello"), HELLO_SHA256);
    }

    #[test]
    fn test_encode_called_once() {
        let cache = AssetCache::new();
        let calls = Cell::new(0);
        let encode = || {
            calls.set(calls.get() + 1);
            Ok(vec![1, 2, 3])
        };
        let a = cache.get_or_encode(b"logo", EncodingMode::RowMajorMsb, encode).unwrap();
        let b = cache
            .get_or_encode(b"logo", EncodingMode::RowMajorMsb, || {
                calls.set(calls.get() + 1);
                Ok(vec![9])
            })
            .unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(&*a, &[1, 2, 3]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_mode_is_part_of_key() {
        let cache = AssetCache::new();
        cache
            .get_or_encode(b"logo", EncodingMode::RowMajorMsb, || Ok(vec![1]))
            .unwrap();
        let other = cache
            .get_or_encode(b"logo", EncodingMode::ColumnMajorMsb, || Ok(vec![2]))
            .unwrap();
        assert_eq!(&*other, &[2]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_changed_source_misses() {
        let cache = AssetCache::new();
        cache
            .get_or_encode(b"logo v1", EncodingMode::RowMajorMsb, || Ok(vec![1]))
            .unwrap();
        let v2 = cache
            .get_or_encode(b"logo v2", EncodingMode::RowMajorMsb, || Ok(vec![2]))
            .unwrap();
        assert_eq!(&*v2, &[2]);
        assert!(cache.get(b"logo v1", EncodingMode::RowMajorMsb).is_some());
    }

    #[test]
    fn test_errors_not_cached() {
        let cache = AssetCache::new();
        let err = cache.get_or_encode(b"bad", EncodingMode::RowMajorMsb, || {
            Err(KabalaError::ImageLoad("broken".into()))
        });
        assert!(err.is_err());
        assert!(cache.is_empty());
        let ok = cache
            .get_or_encode(b"bad", EncodingMode::RowMajorMsb, || Ok(vec![7]))
            .unwrap();
        assert_eq!(&*ok, &[7]);
    }

    #[test]
    fn test_concurrent_same_key_encodes_once() {
        let cache = Arc::new(AssetCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    cache
                        .get_or_encode(b"shared", EncodingMode::RowMajorMsb, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(std::time::Duration::from_millis(20));
                            Ok(vec![0xAA; 16])
                        })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().len(), 16);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_store_round_trip_across_caches() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::open(dir.path()).unwrap();

        let first = AssetCache::with_store(store.clone());
        first
            .get_or_encode_named("logo", b"png bytes", EncodingMode::RowMajorMsb, 8, || {
                Ok(vec![5; 8])
            })
            .unwrap();

        // A fresh cache (new process) reads the stored file instead of encoding
        let second = AssetCache::with_store(store);
        let bytes = second
            .get_or_encode_named("logo", b"png bytes", EncodingMode::RowMajorMsb, 8, || {
                panic!("should have been loaded from the store")
            })
            .unwrap();
        assert_eq!(&*bytes, &[5; 8]);
    }

    #[test]
    fn test_stored_file_of_wrong_length_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::open(dir.path()).unwrap();
        store
            .save("logo", EncodingMode::RowMajorMsb, &content_hash(b"png bytes"), &[5; 16])
            .unwrap();

        let cache = AssetCache::with_store(store.clone());
        let calls = Cell::new(0);
        let bytes = cache
            .get_or_encode_named("logo", b"png bytes", EncodingMode::RowMajorMsb, 8, || {
                calls.set(calls.get() + 1);
                Ok(vec![6; 8])
            })
            .unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(&*bytes, &[6; 8]);

        // The re-encoded bytes replace the bad file
        let stored = store
            .load("logo", EncodingMode::RowMajorMsb, &content_hash(b"png bytes"))
            .unwrap();
        assert_eq!(stored, Some(vec![6; 8]));
    }

    #[test]
    fn test_store_keeps_one_file_per_asset() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::open(dir.path()).unwrap();
        store
            .save("logo", EncodingMode::RowMajorMsb, &content_hash(b"v1"), &[1])
            .unwrap();
        store
            .save("logo", EncodingMode::RowMajorMsb, &content_hash(b"v2"), &[2])
            .unwrap();
        store
            .save("logo", EncodingMode::ColumnMajorMsb, &content_hash(b"v2"), &[3])
            .unwrap();

        let count = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 2);
        assert_eq!(
            store
                .load("logo", EncodingMode::RowMajorMsb, &content_hash(b"v1"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_store_rejects_path_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::open(dir.path()).unwrap();
        assert!(store.path_for("../etc", EncodingMode::RowMajorMsb, "ab").is_err());
        assert!(store.path_for("", EncodingMode::RowMajorMsb, "ab").is_err());
    }
}
