//! Artifact store: place an assembled PDF under the storage root.
//!
//! The final location is `<root>/<stem>.pdf`, where the stem comes from the
//! document title through the configured [`TitlePolicy`]. Existing files are
//! never replaced unless the [`CollisionPolicy`] says so.
//!
//! Storage is reached through the [`DurableStorage`] trait; [`FsStorage`] is
//! the local-filesystem implementation and writes atomically (temp file +
//! rename) so a failed write never leaves a truncated PDF behind. When
//! collisions are rejected the final step is a no-clobber link, so two
//! writers racing for the same name cannot replace each other's document.

use crate::config::{CollisionPolicy, TitlePolicy};
use crate::error::StoreError;
use crate::output::{ArtifactEntry, DocumentArtifact};
use crate::pipeline::assemble::AssembledDocument;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use url::Url;

/// File extension of every stored document.
pub const ARTIFACT_EXTENSION: &str = "pdf";

/// A file found under the storage root.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Durable storage as seen by the pipeline.
#[async_trait]
pub trait DurableStorage: Send + Sync {
    /// Application-private root directory.
    fn root(&self) -> &Path;

    async fn exists(&self, path: &Path) -> std::io::Result<bool>;

    /// Write `bytes` to `path`, replacing any existing file.
    async fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()>;

    /// Write `bytes` to `path` only if nothing is there yet.
    ///
    /// Must fail with [`ErrorKind::AlreadyExists`] when `path` is taken,
    /// including when another writer claims it during the call.
    async fn write_new(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()>;

    /// Files directly under the root.
    async fn list(&self) -> std::io::Result<Vec<StoredFile>>;
}

/// [`DurableStorage`] on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DurableStorage for FsStorage {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn exists(&self, path: &Path) -> std::io::Result<bool> {
        tokio::fs::try_exists(path).await
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }
        Ok(())
    }

    async fn write_new(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let path = path.to_path_buf();
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || {
            let parent = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            std::fs::create_dir_all(parent)?;

            // Dropped (and deleted) on every error path.
            let mut tmp = tempfile::Builder::new()
                .prefix(".docscan-")
                .suffix(".tmp")
                .tempfile_in(parent)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist_noclobber(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(std::io::Error::other)?
    }

    async fn list(&self) -> std::io::Result<Vec<StoredFile>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if meta.is_file() {
                files.push(StoredFile {
                    path: entry.path(),
                    modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                });
            }
        }
        Ok(files)
    }
}

// ── Title → file name ────────────────────────────────────────────────────

static RE_UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1F\x7F]+"#).unwrap());

/// Derive the file name stem for `title` under `policy`.
///
/// The title is trimmed first. `Reject` returns it unchanged if it is safe;
/// `Slugify` replaces each run of unsafe characters with `_`.
pub fn file_stem_for_title(title: &str, policy: TitlePolicy) -> Result<String, StoreError> {
    let trimmed = title.trim();
    let invalid = |reason: &str| StoreError::InvalidTitle {
        title: title.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("title is empty"));
    }

    let stem = match policy {
        TitlePolicy::Reject => {
            if RE_UNSAFE_CHARS.is_match(trimmed) {
                return Err(invalid(
                    r#"contains one of / \ : * ? " < > | or a control character"#,
                ));
            }
            trimmed.to_string()
        }
        TitlePolicy::Slugify => RE_UNSAFE_CHARS.replace_all(trimmed, "_").into_owned(),
    };

    if stem == "." || stem == ".." {
        return Err(invalid("reserved name"));
    }
    Ok(stem)
}

/// Full storage path for `title` under `root`.
pub fn artifact_path(root: &Path, title: &str, policy: TitlePolicy) -> Result<PathBuf, StoreError> {
    let stem = file_stem_for_title(title, policy)?;
    Ok(root.join(format!("{stem}.{ARTIFACT_EXTENSION}")))
}

/// `file:` URI for `path`, percent-encoded.
fn file_uri(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    Url::from_file_path(&absolute)
        .map(String::from)
        .unwrap_or_else(|()| format!("file://{}", absolute.display()))
}

// ── Commit ───────────────────────────────────────────────────────────────

/// Options for [`commit`].
#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    pub title_policy: TitlePolicy,
    pub collision_policy: CollisionPolicy,
    /// Also copy the document here (`cache_local_copy`).
    pub cache_dir: Option<PathBuf>,
}

/// Durably place `handle` under the storage root.
///
/// # Errors
/// * [`StoreError::InvalidTitle`] if the title cannot become a file name
/// * [`StoreError::NameCollision`] if the path is taken and collisions are rejected
/// * [`StoreError::Io`] on any read/write failure
pub async fn commit(
    storage: &dyn DurableStorage,
    handle: &AssembledDocument,
    title: &str,
    options: &CommitOptions,
) -> Result<DocumentArtifact, StoreError> {
    let path = artifact_path(storage.root(), title, options.title_policy)?;
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| StoreError::Io { path, source }
    };

    let exists = storage.exists(&path).await.map_err(io_err(&path))?;
    if exists {
        match options.collision_policy {
            CollisionPolicy::Reject => return Err(StoreError::NameCollision { path }),
            CollisionPolicy::Overwrite => {
                warn!("Overwriting existing document {}", path.display())
            }
        }
    }

    let bytes = handle.read_bytes().await.map_err(io_err(handle.path()))?;
    match options.collision_policy {
        CollisionPolicy::Reject => match storage.write_new(&path, &bytes).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::NameCollision { path })
            }
            Err(e) => return Err(io_err(&path)(e)),
        },
        CollisionPolicy::Overwrite => storage.write(&path, &bytes).await.map_err(io_err(&path))?,
    }

    // The document is durable from here on; a failed cache copy must not
    // turn the commit into an error a retry would then hit as a collision.
    let cached_copy = match &options.cache_dir {
        Some(dir) => match write_cached_copy(dir, &path, &bytes).await {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!("Stored {} but the cache copy failed: {}", path.display(), e);
                None
            }
        },
        None => None,
    };

    info!(
        "Committed '{}' ({} pages, {} bytes) → {}",
        title.trim(),
        handle.page_count(),
        bytes.len(),
        path.display()
    );

    Ok(DocumentArtifact {
        storage_uri: file_uri(&path),
        title: title.trim().to_string(),
        page_count: handle.page_count(),
        byte_len: bytes.len() as u64,
        cached_copy,
        path,
    })
}

async fn write_cached_copy(dir: &Path, stored: &Path, bytes: &[u8]) -> Result<PathBuf, StoreError> {
    let file_name = stored.file_name().unwrap_or_default();
    let cached = dir.join(file_name);
    let result = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&cached, bytes).await
    }
    .await;
    result.map_err(|source| StoreError::Io {
        path: cached.clone(),
        source,
    })?;
    debug!("Cached local copy at {}", cached.display());
    Ok(cached)
}

// ── Library listing ──────────────────────────────────────────────────────

/// Every stored PDF, newest first, optionally filtered by `query`.
///
/// The query matches case-insensitively against the document name and the
/// file name.
pub async fn list_artifacts(
    storage: &dyn DurableStorage,
    query: Option<&str>,
) -> Result<Vec<ArtifactEntry>, StoreError> {
    let files = storage.list().await.map_err(|source| StoreError::Io {
        path: storage.root().to_path_buf(),
        source,
    })?;
    let needle = query.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty());

    let mut entries: Vec<ArtifactEntry> = files
        .into_iter()
        .filter_map(|f| {
            let is_pdf = f
                .path
                .extension()
                .map(|e| e == ARTIFACT_EXTENSION)
                .unwrap_or(false);
            if !is_pdf {
                return None;
            }
            let file_name = f.path.file_name()?.to_string_lossy().into_owned();
            let name = f.path.file_stem()?.to_string_lossy().into_owned();
            Some(ArtifactEntry {
                name,
                file_name,
                path: f.path,
                modified: DateTime::<Utc>::from(f.modified),
            })
        })
        .filter(|e| match &needle {
            Some(q) => e.name.to_lowercase().contains(q) || e.file_name.to_lowercase().contains(q),
            None => true,
        })
        .collect();

    entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}
