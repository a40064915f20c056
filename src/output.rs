//! Data model shared by the pipeline stages.
//!
//! ```text
//! CapturedPage ──normalize──▶ NormalizedPage ──┐
//!                                              ├─▶ DocumentRequest ──assemble──▶ AssembledDocument ──commit──▶ DocumentArtifact
//!                                   title ─────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// MIME type of every [`NormalizedPage`].
pub const JPEG_MIME: &str = "image/jpeg";

/// Opaque handle to the bytes of one camera capture.
///
/// Cloning is cheap; all clones share the same buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct RawImage(Arc<[u8]>);

impl RawImage {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RawImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawImage({} bytes)", self.0.len())
    }
}

/// One page as delivered by the camera, in capture order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPage {
    /// Zero-based position in the capture sequence.
    pub sequence_index: usize,
    pub raw: RawImage,
}

/// A captured page after downscaling and JPEG re-encoding.
#[derive(Clone)]
pub struct NormalizedPage {
    pub source: CapturedPage,
    pub encoded_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub mime_type: &'static str,
}

impl fmt::Debug for NormalizedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedPage")
            .field("sequence_index", &self.source.sequence_index)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mime_type", &self.mime_type)
            .field("encoded_len", &self.encoded_bytes.len())
            .finish()
    }
}

/// Input of the assembler: a title and the pages in final order.
#[derive(Debug, Clone)]
pub struct DocumentRequest {
    pub title: String,
    pub pages: Vec<NormalizedPage>,
}

impl DocumentRequest {
    /// Build a request; the title is trimmed of surrounding whitespace.
    pub fn new(title: impl AsRef<str>, pages: Vec<NormalizedPage>) -> Self {
        Self {
            title: title.as_ref().trim().to_string(),
            pages,
        }
    }
}

/// The durable result of one successful assembly + commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentArtifact {
    /// `file://` URI of the stored document.
    pub storage_uri: String,
    pub path: PathBuf,
    pub title: String,
    pub page_count: usize,
    pub byte_len: u64,
    /// Present when `cache_local_copy` is enabled.
    pub cached_copy: Option<PathBuf>,
}

/// A stored document as seen by the library listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    /// File name without the `.pdf` extension.
    pub name: String,
    pub file_name: String,
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

/// Where the capture → commit cycle currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipelineState {
    /// No pages captured since the last reset.
    #[default]
    Idle,
    /// At least one page captured, waiting for the create trigger.
    Capturing,
    /// Normalize → assemble → commit in progress.
    Assembling,
    /// The last create call stored a document and cleared the pages.
    Committed,
    /// The last create call failed; captured pages were kept.
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::Capturing => "capturing",
            PipelineState::Assembling => "assembling",
            PipelineState::Committed => "committed",
            PipelineState::Failed => "failed",
        };
        f.write_str(s)
    }
}
