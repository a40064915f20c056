//! The scanning session: capture pages, then turn them into one stored PDF.
//!
//! [`Scanner`] owns the [`CaptureController`] and drives the remaining stages
//! in order when [`Scanner::create_document`] is called:
//!
//! ```text
//! capture × N ──▶ normalize (per page, spawn_blocking) ──▶ assemble (spawn_blocking) ──▶ commit
//! ```
//!
//! ## Busy lock
//!
//! The session sits behind a `tokio::sync::Mutex` that is only ever taken
//! with `try_lock`. While a capture or create call holds it, every other
//! capture/create/reset call fails immediately with [`ScanError::Busy`]
//! instead of queueing or racing.
//!
//! ## Failure handling
//!
//! Pages are cleared only after a successful commit. Any error from
//! normalization, assembly or commit leaves them untouched and moves the
//! state to [`PipelineState::Failed`], so the user can fix the cause and
//! trigger creation again without re-scanning.
//!
//! Normalization, assembly and commit each run under `stage_timeout_secs`.
//! A timed-out blocking task keeps running on the blocking pool; its result
//! is discarded. A timed-out commit is dropped before its rename, so no
//! document appears.
//!
//! ## Observing a run
//!
//! [`Scanner::state`] and [`Scanner::page_count`] never wait for the session
//! lock, so [`PipelineState::Assembling`] is visible while a create call is in
//! flight. [`Scanner::watch_state`] streams every transition.

use crate::config::ScanConfig;
use crate::error::{AssemblyError, ScanError};
use crate::output::{
    ArtifactEntry, CapturedPage, DocumentArtifact, DocumentRequest, NormalizedPage, PipelineState,
};
use crate::pipeline::assemble::{assemble, AssembleOptions};
use crate::pipeline::capture::{Camera, CaptureController};
use crate::pipeline::normalize::normalize;
use crate::pipeline::store::{self, CommitOptions, DurableStorage, FsStorage};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// A capture session bound to one camera and one storage backend.
pub struct Scanner<C, S = FsStorage> {
    config: ScanConfig,
    storage: S,
    session: Mutex<CaptureController<C>>,
    state: watch::Sender<PipelineState>,
    /// Mirrors the controller's length for lock-free reads.
    page_count: AtomicUsize,
}

impl<C, S> std::fmt::Debug for Scanner<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C: Camera> Scanner<C, FsStorage> {
    /// Scanner storing documents on the local filesystem under
    /// [`ScanConfig::resolved_storage_root`].
    pub fn new(camera: C, config: ScanConfig) -> Result<Self, ScanError> {
        let root = config.resolved_storage_root().ok_or_else(|| {
            ScanError::InvalidConfig(
                "No storage root: the platform has no data directory, set storage_root".into(),
            )
        })?;
        Ok(Self::with_storage(camera, FsStorage::new(root), config))
    }
}

impl<C: Camera, S: DurableStorage> Scanner<C, S> {
    pub fn with_storage(camera: C, storage: S, config: ScanConfig) -> Self {
        Self {
            config,
            storage,
            session: Mutex::new(CaptureController::new(camera)),
            state: watch::Sender::new(PipelineState::Idle),
            page_count: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Capture one page.
    ///
    /// # Errors
    /// [`ScanError::Busy`] while another call runs, otherwise the
    /// [`crate::error::CaptureError`] from the camera.
    pub async fn capture(&self) -> Result<CapturedPage, ScanError> {
        let mut controller = self.session.try_lock().map_err(|_| ScanError::Busy)?;
        let page = controller.capture().await?;
        self.page_count.store(controller.len(), Ordering::SeqCst);
        self.set_state(PipelineState::Capturing);

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_capture(page.sequence_index);
        }
        Ok(page)
    }

    /// Normalize, assemble and commit every captured page under `title`.
    ///
    /// On success the captured pages are cleared. On failure they are kept.
    pub async fn create_document(&self, title: &str) -> Result<DocumentArtifact, ScanError> {
        let mut controller = self.session.try_lock().map_err(|_| ScanError::Busy)?;
        self.set_state(PipelineState::Assembling);

        let start = Instant::now();
        let pages = controller.pages().to_vec();
        info!("Creating '{}' from {} pages", title.trim(), pages.len());

        match self.run_pipeline(pages, title).await {
            Ok(artifact) => {
                controller.reset();
                self.page_count.store(0, Ordering::SeqCst);
                self.set_state(PipelineState::Committed);
                info!(
                    "Document ready in {}ms: {}",
                    start.elapsed().as_millis(),
                    artifact.storage_uri
                );
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_committed(&artifact);
                }
                Ok(artifact)
            }
            Err(e) => {
                self.set_state(PipelineState::Failed);
                warn!(
                    "Document creation failed, keeping {} pages: {}",
                    controller.len(),
                    e
                );
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_failed(&e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Discard all captured pages and return to [`PipelineState::Idle`].
    pub fn reset(&self) -> Result<(), ScanError> {
        let mut controller = self.session.try_lock().map_err(|_| ScanError::Busy)?;
        controller.reset();
        self.page_count.store(0, Ordering::SeqCst);
        self.set_state(PipelineState::Idle);
        Ok(())
    }

    /// Current state; readable while a create call runs.
    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    /// Receiver notified on every state transition.
    pub fn watch_state(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Number of captured pages; readable while a create call runs.
    pub fn page_count(&self) -> usize {
        self.page_count.load(Ordering::SeqCst)
    }

    /// Snapshot of the captured pages.
    ///
    /// # Errors
    /// [`ScanError::Busy`] while a capture or create call holds the pages.
    pub fn pages(&self) -> Result<Vec<CapturedPage>, ScanError> {
        let controller = self.session.try_lock().map_err(|_| ScanError::Busy)?;
        Ok(controller.pages().to_vec())
    }

    /// Stored documents, newest first, optionally filtered by name.
    pub async fn list_documents(&self, query: Option<&str>) -> Result<Vec<ArtifactEntry>, ScanError> {
        Ok(store::list_artifacts(&self.storage, query).await?)
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn set_state(&self, state: PipelineState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!("State {:?} → {:?}", previous, state);
        }
    }

    async fn run_pipeline(
        &self,
        pages: Vec<CapturedPage>,
        title: &str,
    ) -> Result<DocumentArtifact, ScanError> {
        // Cheap checks first so nothing is normalized or written for a
        // request that cannot succeed.
        if pages.is_empty() {
            return Err(AssemblyError::EmptyPageSet.into());
        }
        if title.trim().is_empty() {
            return Err(AssemblyError::EmptyTitle.into());
        }
        store::artifact_path(self.storage.root(), title, self.config.title_policy)?;

        let expected_pages = pages.len();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_assembly_start(expected_pages);
        }

        let normalized = self.normalize_all(pages).await?;
        let request = DocumentRequest::new(title, normalized);

        let assemble_options = AssembleOptions {
            scratch_dir: self.config.scratch_dir.clone(),
            heading_font: self.config.heading_font.clone(),
        };
        let handle = self
            .run_blocking("assembly", move || assemble(&request, &assemble_options))
            .await??;

        let options = CommitOptions {
            title_policy: self.config.title_policy,
            collision_policy: self.config.collision_policy,
            cache_dir: if self.config.cache_local_copy {
                self.config.resolved_cache_dir()
            } else {
                None
            },
        };
        let artifact = self
            .with_timeout("commit", store::commit(&self.storage, &handle, title, &options))
            .await??;

        if artifact.page_count != expected_pages {
            return Err(ScanError::Internal(format!(
                "document has {} pages, {} were captured",
                artifact.page_count, expected_pages
            )));
        }
        Ok(artifact)
    }

    /// Normalize every page, keeping capture order.
    async fn normalize_all(&self, pages: Vec<CapturedPage>) -> Result<Vec<NormalizedPage>, ScanError> {
        let total = pages.len();
        let width = self.config.target_width;
        let quality = self.config.jpeg_quality;

        stream::iter(pages.into_iter().map(|page| async move {
            let normalized = self
                .run_blocking("normalization", move || normalize(&page, width, quality))
                .await??;
            debug!(
                "Page {}/{} normalized ({} bytes)",
                normalized.source.sequence_index + 1,
                total,
                normalized.encoded_bytes.len()
            );
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_page_normalized(
                    normalized.source.sequence_index,
                    total,
                    normalized.encoded_bytes.len(),
                );
            }
            Ok::<_, ScanError>(normalized)
        }))
        .buffered(self.config.normalize_concurrency.max(1))
        .try_collect()
        .await
    }

    /// Run CPU-bound work on the blocking pool under the stage timeout.
    async fn run_blocking<T, F>(&self, stage: &'static str, f: F) -> Result<T, ScanError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        match self.with_timeout(stage, tokio::task::spawn_blocking(f)).await? {
            Err(e) => Err(ScanError::Internal(format!("{stage} task failed: {e}"))),
            Ok(value) => Ok(value),
        }
    }

    /// Await `fut` for at most `stage_timeout_secs`.
    async fn with_timeout<T>(
        &self,
        stage: &'static str,
        fut: impl Future<Output = T>,
    ) -> Result<T, ScanError> {
        let secs = self.config.stage_timeout_secs;
        tokio::time::timeout(Duration::from_secs(secs), fut)
            .await
            .map_err(|_| {
                warn!("{} exceeded {}s", stage, secs);
                ScanError::Timeout { stage, secs }
            })
    }
}
