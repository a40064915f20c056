//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn ScanProgressCallback>`] via
//! [`crate::config::ScanConfigBuilder::progress_callback`] to receive events
//! as pages are captured, normalized and committed.
//!
//! # Example
//!
//! ```rust
//! use docscan::{ScanConfig, ScanProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     normalized: AtomicUsize,
//! }
//!
//! impl ScanProgressCallback for CountingCallback {
//!     fn on_page_normalized(&self, index: usize, total: usize, bytes: usize) {
//!         self.normalized.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {}/{} ready ({} bytes)", index + 1, total, bytes);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { normalized: AtomicUsize::new(0) });
//! let config = ScanConfig::builder()
//!     .progress_callback(cb as Arc<dyn ScanProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::DocumentArtifact;
use std::sync::Arc;

/// Called by the [`crate::scanner::Scanner`] as the pipeline advances.
///
/// All methods have default no-op implementations. Events are delivered on
/// the task driving the scanner, and `on_page_normalized` arrives in capture
/// order even when several pages are normalized at once.
pub trait ScanProgressCallback: Send + Sync {
    /// A page was appended to the capture sequence.
    ///
    /// # Arguments
    /// * `index` — zero-based sequence index of the new page
    fn on_capture(&self, index: usize) {
        let _ = index;
    }

    /// Assembly was triggered for `total_pages` captured pages.
    fn on_assembly_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// One page finished normalization.
    ///
    /// # Arguments
    /// * `index` — zero-based sequence index
    /// * `total` — pages in this assembly run
    /// * `encoded_len` — JPEG size in bytes
    fn on_page_normalized(&self, index: usize, total: usize, encoded_len: usize) {
        let _ = (index, total, encoded_len);
    }

    /// The document was stored.
    fn on_committed(&self, artifact: &DocumentArtifact) {
        let _ = artifact;
    }

    /// The create call failed; captured pages are still available.
    fn on_failed(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
#[derive(Debug)]
pub struct NoopProgressCallback;

impl ScanProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ScanConfig`].
pub type ProgressCallback = Arc<dyn ScanProgressCallback>;
