//! Configuration types for the scanning pipeline.
//!
//! All pipeline behaviour is controlled through [`ScanConfig`], built via its
//! [`ScanConfigBuilder`]. Platform-dependent choices (such as keeping a local
//! cached copy of each document) are resolved here once at startup so the
//! pipeline itself never branches on the target OS.

use crate::error::ScanError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for a [`crate::scanner::Scanner`].
///
/// # Example
/// ```rust
/// use docscan::{ScanConfig, TitlePolicy};
///
/// let config = ScanConfig::builder()
///     .target_width(1024)
///     .jpeg_quality(0.5)
///     .title_policy(TitlePolicy::Slugify)
///     .build()
///     .unwrap();
/// assert_eq!(config.target_width, 1024);
/// ```
#[derive(Clone)]
pub struct ScanConfig {
    /// Maximum width of a normalized page in pixels. Range: 64–4096. Default: 800.
    ///
    /// Pages narrower than this keep their native width; nothing is upscaled.
    pub target_width: u32,

    /// JPEG quality of normalized pages, 0.0–1.0. Default: 0.3.
    pub jpeg_quality: f32,

    /// Number of pages normalized at the same time. Default: 1 (sequential).
    ///
    /// Output order always follows capture order regardless of this value.
    pub normalize_concurrency: usize,

    /// Upper bound, in seconds, for one normalize call, for the assemble call
    /// and for the commit. Default: 60.
    pub stage_timeout_secs: u64,

    /// Directory documents are committed to. `None` uses
    /// `<platform data dir>/docscan/documents`.
    pub storage_root: Option<PathBuf>,

    /// Directory for the temporary assembled document. `None` uses the
    /// system temp directory.
    pub scratch_dir: Option<PathBuf>,

    /// TrueType font for headings WinAnsi cannot encode (Greek, Devanagari,
    /// CJK…). `None` searches the installed system fonts.
    pub heading_font: Option<PathBuf>,

    /// How titles that are unsafe as file names are handled. Default: [`TitlePolicy::Reject`].
    pub title_policy: TitlePolicy,

    /// What happens when a document with the same name exists. Default: [`CollisionPolicy::Reject`].
    pub collision_policy: CollisionPolicy,

    /// Also keep a copy of each committed document in `cache_dir`.
    ///
    /// Defaults to `true` on Android, where document viewers expect a local
    /// file, and `false` elsewhere.
    pub cache_local_copy: bool,

    /// Directory for cached copies. `None` uses `<platform cache dir>/docscan`.
    pub cache_dir: Option<PathBuf>,

    /// Optional progress events sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target_width: 800,
            jpeg_quality: 0.3,
            normalize_concurrency: 1,
            stage_timeout_secs: 60,
            storage_root: None,
            scratch_dir: None,
            heading_font: None,
            title_policy: TitlePolicy::default(),
            collision_policy: CollisionPolicy::default(),
            cache_local_copy: cfg!(target_os = "android"),
            cache_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfig")
            .field("target_width", &self.target_width)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("normalize_concurrency", &self.normalize_concurrency)
            .field("stage_timeout_secs", &self.stage_timeout_secs)
            .field("storage_root", &self.storage_root)
            .field("scratch_dir", &self.scratch_dir)
            .field("heading_font", &self.heading_font)
            .field("title_policy", &self.title_policy)
            .field("collision_policy", &self.collision_policy)
            .field("cache_local_copy", &self.cache_local_copy)
            .field("cache_dir", &self.cache_dir)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ScanProgressCallback>"),
            )
            .finish()
    }
}

impl ScanConfig {
    /// Create a new builder for `ScanConfig`.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder {
            config: Self::default(),
        }
    }

    /// Storage root, falling back to the platform data directory.
    pub fn resolved_storage_root(&self) -> Option<PathBuf> {
        self.storage_root
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("docscan").join("documents")))
    }

    /// Cache directory, falling back to the platform cache directory.
    pub fn resolved_cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join("docscan")))
    }
}

/// Builder for [`ScanConfig`].
#[derive(Debug)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    pub fn target_width(mut self, px: u32) -> Self {
        self.config.target_width = px.clamp(64, 4096);
        self
    }

    pub fn jpeg_quality(mut self, q: f32) -> Self {
        self.config.jpeg_quality = q;
        self
    }

    pub fn normalize_concurrency(mut self, n: usize) -> Self {
        self.config.normalize_concurrency = n.max(1);
        self
    }

    pub fn stage_timeout_secs(mut self, secs: u64) -> Self {
        self.config.stage_timeout_secs = secs;
        self
    }

    pub fn storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.storage_root = Some(root.into());
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = Some(dir.into());
        self
    }

    pub fn heading_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.heading_font = Some(path.into());
        self
    }

    pub fn title_policy(mut self, policy: TitlePolicy) -> Self {
        self.config.title_policy = policy;
        self
    }

    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.config.collision_policy = policy;
        self
    }

    pub fn cache_local_copy(mut self, v: bool) -> Self {
        self.config.cache_local_copy = v;
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScanConfig, ScanError> {
        let c = &self.config;
        if !(0.0..=1.0).contains(&c.jpeg_quality) {
            return Err(ScanError::InvalidConfig(format!(
                "JPEG quality must be 0.0–1.0, got {}",
                c.jpeg_quality
            )));
        }
        if c.stage_timeout_secs == 0 {
            return Err(ScanError::InvalidConfig(
                "Stage timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Handling of titles that contain characters unsafe in file names.
///
/// The title is always used verbatim as the PDF heading; the policy only
/// affects the file name stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TitlePolicy {
    /// Fail the commit with [`crate::error::StoreError::InvalidTitle`]. (default)
    #[default]
    Reject,
    /// Replace each run of unsafe characters with `_`.
    Slugify,
}

/// Behaviour when the resolved storage path is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Fail the commit with [`crate::error::StoreError::NameCollision`]. (default)
    #[default]
    Reject,
    /// Replace the existing document.
    Overwrite,
}
