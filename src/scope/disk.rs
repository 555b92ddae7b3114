//! Disk scope - one serialized instance per derived key under a root dir
//!
//! Request path:
//! - file present and unchanged since the cached copy: cached instance
//! - file present but newer (or never loaded): decode it, failure is a
//!   `DiskLoad` error for this request only
//! - no file yet: produce, cache, write through
//!
//! Writes go to `<file>.tmp` and are renamed over the target. Each entry
//! carries a gate so concurrent syncs of the same entry collapse into one.
//! Save failures are logged and swallowed: durability is best effort.
//!
//! Values are encoded by a [`Codec`] registered for the requested raw type,
//! or else by the only registered codec whose raw type is a subtype of it.

use std::any::{type_name, Any};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::anyhow;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, trace, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{InjectError, Result};
use crate::model::{Dependency, Object};
use crate::types::{RawType, Type};
use crate::util::intern;

use super::{KeyDerivation, Scope};

const FILE_EXTENSION: &str = "bin";
const STAGING_SUFFIX: &str = ".tmp";
const MAX_PREFIX: usize = 48;
const MIN_SYNC_INTERVAL: Duration = Duration::from_millis(1);

/// Encodes type-erased instances to bytes and back
pub trait Codec: Send + Sync {
    fn encode(&self, value: &Object) -> anyhow::Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> anyhow::Result<Object>;
}

/// `bincode` codec for any serde type
pub struct BincodeCodec<T>(PhantomData<fn() -> T>);

impl<T> BincodeCodec<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for BincodeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec for BincodeCodec<T>
where
    T: Serialize + DeserializeOwned + Any + Send + Sync,
{
    fn encode(&self, value: &Object) -> anyhow::Result<Vec<u8>> {
        let typed = value
            .downcast_ref::<T>()
            .ok_or_else(|| anyhow!("value is not a {}", type_name::<T>()))?;
        Ok(bincode::serialize(typed)?)
    }

    fn decode(&self, bytes: &[u8]) -> anyhow::Result<Object> {
        let value: Object = Arc::new(bincode::deserialize::<T>(bytes)?);
        Ok(value)
    }
}

/// Outcome of one [`DiskScope::sync`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries refreshed from a newer file
    pub reloaded: usize,
    /// Entries written because their encoding changed
    pub saved: usize,
    /// Entries that failed to load or save
    pub failed: usize,
}

#[derive(Clone)]
pub struct DiskScope {
    inner: Arc<DiskInner>,
}

struct DiskInner {
    root: PathBuf,
    derivation: KeyDerivation,
    codecs: DashMap<Arc<str>, (RawType, Arc<dyn Codec>)>,
    entries: DashMap<String, Arc<DiskEntry>>,
}

impl DiskScope {
    pub fn new(root: impl Into<PathBuf>, derivation: KeyDerivation) -> Self {
        Self {
            inner: Arc::new(DiskInner {
                root: root.into(),
                derivation,
                codecs: DashMap::new(),
                entries: DashMap::new(),
            }),
        }
    }

    /// Encode `T` with bincode
    pub fn with_codec<T>(self) -> Self
    where
        T: Serialize + DeserializeOwned + Any + Send + Sync,
    {
        self.register_codec(RawType::of::<T>(), BincodeCodec::<T>::new());
        self
    }

    /// Register `codec` for values of the raw type `raw`
    ///
    /// Requests for `raw` use it directly. Requests for a supertype of `raw`
    /// (upper bounds included) use it when no other registered codec is
    /// also a subtype candidate.
    pub fn register_codec(&self, raw: RawType, codec: impl Codec + 'static) {
        self.inner
            .codecs
            .insert(intern(raw.name()), (raw, Arc::new(codec)));
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Number of entries loaded or produced so far
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// File backing `key`: sanitized key prefix plus its xxh3 digest
    pub fn path_for(&self, key: &str) -> PathBuf {
        let prefix: String = key
            .chars()
            .take(MAX_PREFIX)
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.inner.root.join(format!(
            "{}-{:016x}.{}",
            prefix,
            xxh3_64(key.as_bytes()),
            FILE_EXTENSION
        ))
    }

    /// Reload entries whose file changed and write entries whose encoding changed
    pub fn sync(&self) -> SyncReport {
        let entries: Vec<Arc<DiskEntry>> = self
            .inner
            .entries
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut report = SyncReport::default();
        for entry in entries {
            match entry.sync() {
                Ok(Synced::Reloaded) => report.reloaded += 1,
                Ok(Synced::Saved) => report.saved += 1,
                Ok(Synced::Unchanged) => {}
                Err(err) => {
                    warn!(path = %entry.path.display(), error = %err, "disk sync failed");
                    report.failed += 1;
                }
            }
        }
        if report == SyncReport::default() {
            trace!(root = %self.inner.root.display(), "disk sync: nothing to do");
        } else {
            info!(
                root = %self.inner.root.display(),
                reloaded = report.reloaded,
                saved = report.saved,
                failed = report.failed,
                "disk sync"
            );
        }
        report
    }

    /// Write every loaded entry
    pub fn flush(&self) {
        for entry in self.inner.entries.iter() {
            entry.value().save_logged();
        }
        debug!(root = %self.inner.root.display(), entries = self.len(), "disk scope flushed");
    }

    /// Run [`DiskScope::sync`] every `interval` on `runtime`
    ///
    /// Each tick is fire-and-forget; abort the returned handle to stop.
    /// Intervals shorter than a millisecond are raised to one.
    pub fn spawn_sync(
        &self,
        runtime: &tokio::runtime::Handle,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let scope = self.clone();
        runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(MIN_SYNC_INTERVAL));
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let scope = scope.clone();
                if let Err(err) = tokio::task::spawn_blocking(move || scope.sync()).await {
                    warn!(error = %err, "disk sync task failed");
                }
            }
        })
    }

    fn entry(&self, key: String, dependency: &Dependency) -> Result<Arc<DiskEntry>> {
        if let Some(entry) = self.inner.entries.get(&key) {
            return Ok(Arc::clone(entry.value()));
        }
        let codec = self.codec_for(dependency.ty().raw_type())?;
        let path = self.path_for(&key);
        let entry = self
            .inner
            .entries
            .entry(key)
            .or_insert_with(|| Arc::new(DiskEntry::new(path, codec)));
        Ok(Arc::clone(entry.value()))
    }

    fn codec_for(&self, raw: &RawType) -> Result<Arc<dyn Codec>> {
        if let Some(codec) = self.inner.codecs.get(raw.name()) {
            return Ok(Arc::clone(&codec.value().1));
        }
        let mut subtypes = self.inner.codecs.iter().filter(|codec| {
            Type::new(codec.value().0.clone())
                .as_supertype(raw)
                .is_some()
        });
        match (subtypes.next(), subtypes.next()) {
            (Some(codec), None) => {
                trace!(requested = raw.name(), codec = %codec.value().0, "subtype codec");
                Ok(Arc::clone(&codec.value().1))
            }
            _ => Err(InjectError::MissingCodec {
                ty: raw.name().to_string(),
            }),
        }
    }
}

impl Scope for DiskScope {
    fn provide(
        &self,
        slot: usize,
        _slots: usize,
        dependency: &Dependency,
        producer: &dyn Fn() -> Result<Object>,
    ) -> Result<Object> {
        let key = self.inner.derivation.slot_key(slot, dependency);
        let entry = self.entry(key, dependency)?;
        entry.provide(producer)
    }

    fn shutdown(&self) {
        self.flush();
    }
}

enum Synced {
    Reloaded,
    Saved,
    Unchanged,
}

#[derive(Default)]
struct EntryState {
    value: Option<Object>,
    /// Modification time of the file the value was loaded from or saved to
    modified: Option<SystemTime>,
    /// Digest of the last encoding written or read
    digest: Option<u64>,
}

struct DiskEntry {
    path: PathBuf,
    codec: Arc<dyn Codec>,
    state: RwLock<EntryState>,
    syncing: AtomicBool,
}

impl DiskEntry {
    fn new(path: PathBuf, codec: Arc<dyn Codec>) -> Self {
        Self {
            path,
            codec,
            state: RwLock::new(EntryState::default()),
            syncing: AtomicBool::new(false),
        }
    }

    fn provide(&self, producer: &dyn Fn() -> Result<Object>) -> Result<Object> {
        let on_disk = modified(&self.path);
        {
            let state = self.state.read();
            if let Some(value) = &state.value {
                if on_disk.is_none() || state.modified == on_disk {
                    let value = Arc::clone(value);
                    drop(state);
                    if on_disk.is_none() {
                        // cached but never persisted (or deleted): try again
                        self.save_logged();
                    }
                    return Ok(value);
                }
            }
        }
        if on_disk.is_some() {
            return self.load();
        }

        let produced = producer()?;
        let value = {
            let mut state = self.state.write();
            match &state.value {
                Some(existing) => Arc::clone(existing),
                None => {
                    state.value = Some(Arc::clone(&produced));
                    produced
                }
            }
        };
        self.save_logged();
        Ok(value)
    }

    fn load(&self) -> Result<Object> {
        let bytes = fs::read(&self.path).map_err(|err| self.load_error(err))?;
        let value = self
            .codec
            .decode(&bytes)
            .map_err(|err| self.load_error(err))?;
        let mut state = self.state.write();
        state.value = Some(Arc::clone(&value));
        state.modified = modified(&self.path);
        state.digest = Some(xxh3_64(&bytes));
        trace!(path = %self.path.display(), "disk entry loaded");
        Ok(value)
    }

    fn sync(&self) -> Result<Synced> {
        let on_disk = modified(&self.path);
        let stale = {
            let state = self.state.read();
            on_disk.is_some() && state.modified != on_disk
        };
        if stale {
            self.load()?;
            return Ok(Synced::Reloaded);
        }
        match self.save()? {
            true => Ok(Synced::Saved),
            false => Ok(Synced::Unchanged),
        }
    }

    /// Write the cached value if its encoding changed; `false` when skipped
    fn save(&self) -> Result<bool> {
        if self.syncing.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        let result = self.write_through();
        self.syncing.store(false, Ordering::Release);
        result
    }

    fn save_logged(&self) {
        if let Err(err) = self.save() {
            warn!(path = %self.path.display(), error = %err, "disk save failed, keeping value in memory");
        }
    }

    fn write_through(&self) -> Result<bool> {
        let (bytes, unchanged) = {
            let state = self.state.read();
            let Some(value) = &state.value else {
                return Ok(false);
            };
            let bytes = self.codec.encode(value).map_err(|err| self.save_error(err))?;
            let unchanged = state.digest == Some(xxh3_64(&bytes)) && state.modified.is_some();
            (bytes, unchanged)
        };
        if unchanged && self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| self.save_error(err))?;
        }
        let mut staging = self.path.clone().into_os_string();
        staging.push(STAGING_SUFFIX);
        let staging = PathBuf::from(staging);
        fs::write(&staging, &bytes).map_err(|err| self.save_error(err))?;
        fs::rename(&staging, &self.path).map_err(|err| self.save_error(err))?;

        let mut state = self.state.write();
        state.modified = modified(&self.path);
        state.digest = Some(xxh3_64(&bytes));
        trace!(path = %self.path.display(), bytes = bytes.len(), "disk entry saved");
        Ok(true)
    }

    fn load_error(&self, err: impl std::fmt::Display) -> InjectError {
        InjectError::DiskLoad {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        }
    }

    fn save_error(&self, err: impl std::fmt::Display) -> InjectError {
        InjectError::DiskSave {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}
