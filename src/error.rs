//! Error types for the docscan library.
//!
//! Each pipeline stage owns a small error enum so callers can match on the
//! exact failure without string inspection:
//!
//! * [`CaptureError`] — the camera could not produce a page.
//! * [`NormalizationError`] — a captured page could not be decoded or the
//!   resize parameters were invalid.
//! * [`AssemblyError`] — the PDF could not be composed.
//! * [`StoreError`] — the finished PDF could not be placed in storage.
//!
//! [`ScanError`] is what the [`crate::scanner::Scanner`] façade returns. It
//! wraps every stage error and adds the failures that only exist at the
//! orchestration level (busy lock, stage timeout, bad configuration).
//!
//! None of these errors discard captured pages: a failed assembly or commit
//! leaves the capture sequence exactly as it was.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the capture stage.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The camera is not active or not in the foreground.
    #[error("Camera is not available.\nMake sure the camera is active and in the foreground, then try again.")]
    DeviceUnavailable,

    /// The user denied camera access. Never re-requested automatically.
    #[error("Camera permission was denied.\nGrant camera access in the system settings to scan pages.")]
    PermissionDenied,

    /// The camera accepted the request but failed to deliver a photo.
    #[error("Camera failed to take a photo: {0}")]
    Hardware(String),
}

/// Failures of the normalization stage.
#[derive(Debug, Error)]
pub enum NormalizationError {
    /// The raw capture is not a decodable image.
    #[error("Page {index} is not a supported image: {detail}")]
    UnsupportedFormat { index: usize, detail: String },

    /// Target width or quality is outside the accepted range.
    #[error("Invalid normalization parameters: {0}")]
    InvalidParameters(String),
}

/// Failures of the assembly stage.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// No pages were captured before assembly was triggered.
    #[error("Cannot create a document without pages.\nCapture at least one page first.")]
    EmptyPageSet,

    /// The document title is empty or whitespace only.
    #[error("Document title must not be empty")]
    EmptyTitle,

    /// The PDF writer rejected the document.
    #[error("Failed to render PDF: {0}")]
    Render(String),

    /// The configured heading font could not be loaded.
    #[error("Cannot use heading font '{path}': {detail}\nPoint heading_font at a TrueType (.ttf) file.")]
    Font { path: PathBuf, detail: String },

    /// The temporary file backing the assembled document could not be used.
    #[error("Failed to write temporary document: {0}")]
    Scratch(#[source] std::io::Error),
}

/// Failures of the commit stage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A document already exists at the resolved location.
    #[error("A document already exists at '{path}'\nChoose another title or enable overwrite.")]
    NameCollision { path: PathBuf },

    /// The title cannot be used as a file name under the active policy.
    #[error("Title '{title}' cannot be used as a file name: {reason}")]
    InvalidTitle { title: String, reason: String },

    /// The underlying write failed (disk full, permission denied, …).
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors returned by the [`crate::scanner::Scanner`] façade.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Another capture or assembly is still running on this scanner.
    #[error("Scanner is busy with another operation; wait for it to finish")]
    Busy,

    /// A stage did not finish within the configured timeout.
    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScanError {
    /// `true` when the same call may succeed if simply tried again later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ScanError::Busy
                | ScanError::Timeout { .. }
                | ScanError::Capture(CaptureError::DeviceUnavailable)
                | ScanError::Capture(CaptureError::Hardware(_))
                | ScanError::Store(StoreError::Io { .. })
        )
    }
}
