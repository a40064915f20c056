//! # docscan
//!
//! Scan paper documents with a camera and keep them as titled PDFs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! camera
//!  │
//!  ├─ 1. Capture    one photo per user action, kept in capture order
//!  ├─ 2. Normalize  downscale to ≤ 800 px wide, re-encode as JPEG (q = 0.3)
//!  ├─ 3. Assemble   title heading + one image per A4 page → PDF (temp file)
//!  └─ 4. Commit     <storage root>/<title>.pdf, then clear the captured pages
//! ```
//!
//! Any failure after capture keeps the captured pages, so a full disk or a
//! taken file name never costs the user a re-scan.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docscan::{FolderCamera, ScanConfig, Scanner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScanConfig::builder().storage_root("./documents").build()?;
//!     let scanner = Scanner::new(FolderCamera::from_dir("./photos"), config)?;
//!
//!     scanner.capture().await?;
//!     scanner.capture().await?;
//!
//!     let artifact = scanner.create_document("Receipts").await?;
//!     println!("{} pages → {}", artifact.page_count, artifact.storage_uri);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docscan` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod scanner;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CollisionPolicy, ScanConfig, ScanConfigBuilder, TitlePolicy};
pub use error::{AssemblyError, CaptureError, NormalizationError, ScanError, StoreError};
pub use output::{
    ArtifactEntry, CapturedPage, DocumentArtifact, DocumentRequest, NormalizedPage,
    PipelineState, RawImage, JPEG_MIME,
};
pub use pipeline::assemble::{assemble, AssembleOptions, AssembledDocument};
pub use pipeline::heading::find_heading_font;
pub use pipeline::capture::{Camera, CaptureController, FolderCamera, Permission};
pub use pipeline::normalize::normalize;
pub use pipeline::store::{commit, list_artifacts, CommitOptions, DurableStorage, FsStorage, StoredFile};
pub use progress::{NoopProgressCallback, ProgressCallback, ScanProgressCallback};
pub use scanner::Scanner;
