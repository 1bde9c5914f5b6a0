//! Filesystem cache store.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::SystemTime;

use async_trait::async_trait;
use gcmd_core::defaults::DIGEST_BUFFER_BYTES;
use gcmd_core::digest::DigestWriter;
use gcmd_core::{compute_digest, CacheStore, Error, Result, WriteOutcome};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Directory under the root holding one version pointer file per scheme.
const POINTER_DIR: &str = ".latest";

/// Disk-backed [`CacheStore`].
///
/// Path format: `{root}/{version}/{scheme}`. The last recorded version of a
/// scheme lives in `{root}/.latest/{scheme}`. Writers to the same path are
/// serialized through a per-path lock.
pub struct DiskCacheStore {
    root: PathBuf,
    path_locks: StdMutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl DiskCacheStore {
    /// Create a store rooted at `root`. Nothing is touched on disk until the
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            path_locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic path of the entry for `(version, scheme)`.
    pub fn entry_path(&self, version: &str, scheme: &str) -> Result<PathBuf> {
        validate_segment("version", version)?;
        validate_segment("scheme", scheme)?;
        Ok(self.root.join(version).join(scheme))
    }

    fn pointer_path(&self, scheme: &str) -> Result<PathBuf> {
        validate_segment("scheme", scheme)?;
        Ok(self.root.join(POINTER_DIR).join(scheme))
    }

    /// Version directory holding the most recently modified entry for `scheme`.
    async fn newest_entry_version(&self, scheme: &str) -> Result<Option<String>> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::storage(&self.root, e)),
        };

        let mut newest: Option<(SystemTime, String)> = None;
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| Error::storage(&self.root, e))?
        {
            let Some(version) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if validate_segment("version", &version).is_err() {
                continue;
            }
            let modified = match fs::metadata(entry.path().join(scheme)).await {
                Ok(meta) if meta.is_file() => meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                _ => continue,
            };
            if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
                newest = Some((modified, version));
            }
        }
        Ok(newest.map(|(_, version)| version))
    }

    /// Validate that the cache root can be created, written, read and cleaned.
    pub async fn validate(&self) -> Result<()> {
        let test_dir = self.root.join(".health-check");
        let test_file = test_dir.join("write-check");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| Error::storage(&test_dir, e))?;
        let data = b"gcmd-cache-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| Error::storage(&test_file, e))?;
        let read_back = fs::read(&test_file)
            .await
            .map_err(|e| Error::storage(&test_file, e))?;
        if read_back != data {
            return Err(Error::storage(
                &test_file,
                std::io::Error::new(ErrorKind::InvalidData, "read-back mismatch"),
            ));
        }
        fs::remove_file(&test_file)
            .await
            .map_err(|e| Error::storage(&test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;
        Ok(())
    }

    fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.path_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn file_digest(path: &Path) -> Result<Option<String>> {
        let mut file = match fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::storage(path, e)),
        };

        let mut hasher = DigestWriter::new();
        let mut buf = vec![0u8; DIGEST_BUFFER_BYTES];
        loop {
            let n = file
                .read(&mut buf)
                .await
                .map_err(|e| Error::storage(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Some(hasher.finish()))
    }

    async fn write_atomic(path: &Path, scheme: &str, data: &[u8]) -> Result<()> {
        let parent = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent).await.map_err(|e| {
            warn!(parent = %parent.display(), error = %e, "disk_store: create_dir_all failed");
            Error::storage(parent, e)
        })?;

        // Leading dot keeps temp files out of the scheme namespace.
        let temp_path = parent.join(format!(
            ".{}.{}-{}.tmp",
            scheme,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = write_temp_then_rename(&temp_path, path, data).await {
            warn!(temp_path = %temp_path.display(), error = %e, "disk_store: atomic write failed");
            let _ = fs::remove_file(&temp_path).await;
            return Err(Error::storage(path, e));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for DiskCacheStore {
    async fn read(&self, version: &str, scheme: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(version, scheme)?;
        match fs::read(&path).await {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "disk_store: hit");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "disk_store: miss");
                Ok(None)
            }
            Err(e) => Err(Error::storage(path, e)),
        }
    }

    #[instrument(
        skip(self, data),
        fields(subsystem = "cache", component = "disk_store", op = "write", bytes = data.len())
    )]
    async fn write(&self, version: &str, scheme: &str, data: &[u8]) -> Result<WriteOutcome> {
        let path = self.entry_path(version, scheme)?;
        let lock = self.path_lock(&path);
        let _guard = lock.lock().await;

        let digest = compute_digest(data);
        if Self::file_digest(&path).await?.as_deref() == Some(digest.as_str()) {
            debug!(
                path = %path.display(),
                digest = %digest,
                "disk_store: unchanged, skipping write"
            );
            return Ok(WriteOutcome::Unchanged);
        }

        Self::write_atomic(&path, scheme, data).await?;
        info!(path = %path.display(), digest = %digest, "disk_store: written");
        Ok(WriteOutcome::Written)
    }

    async fn digest_of(&self, version: &str, scheme: &str) -> Result<Option<String>> {
        let path = self.entry_path(version, scheme)?;
        Self::file_digest(&path).await
    }

    /// The recorded pointer when present, otherwise the version directory
    /// holding the newest entry for `scheme`.
    async fn latest_version(&self, scheme: &str) -> Result<Option<String>> {
        let path = self.pointer_path(scheme)?;
        match fs::read_to_string(&path).await {
            Ok(text) => {
                let version = text.trim();
                if validate_segment("version", version).is_ok() {
                    return Ok(Some(version.to_string()));
                }
                warn!(path = %path.display(), "disk_store: ignoring malformed version pointer");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Error::storage(path, e)),
        }
        self.newest_entry_version(scheme).await
    }

    async fn set_latest_version(&self, scheme: &str, version: &str) -> Result<()> {
        validate_segment("version", version)?;
        let path = self.pointer_path(scheme)?;
        let lock = self.path_lock(&path);
        let _guard = lock.lock().await;

        Self::write_atomic(&path, scheme, version.as_bytes()).await?;
        debug!(scheme = %scheme, version = %version, "disk_store: version pointer updated");
        Ok(())
    }
}

async fn write_temp_then_rename(
    temp_path: &Path,
    path: &Path,
    data: &[u8],
) -> std::io::Result<()> {
    let mut file = fs::File::create(temp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(temp_path, path).await
}

/// Reject names that would escape the cache root or collide with temp files.
fn validate_segment(kind: &str, value: &str) -> Result<()> {
    let bad = value.is_empty()
        || value.starts_with('.')
        || value.contains(['/', '\\', '\0']);
    if bad {
        return Err(Error::InvalidInput(format!(
            "invalid {} for cache path: {:?}",
            kind, value
        )));
    }
    Ok(())
}
