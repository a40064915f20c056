//! Capture stage: the camera seam and the ordered page sequence.
//!
//! [`CaptureController`] is the only writer of the page sequence. Pages are
//! appended at the next index and never edited; [`CaptureController::reset`]
//! drops all of them at once.
//!
//! Camera permission is requested once, before the first capture. A denial
//! is remembered for the lifetime of the controller and reported on every
//! later capture without asking the camera again.

use crate::error::CaptureError;
use crate::output::{CapturedPage, RawImage};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Answer to a camera permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// The camera as seen by the pipeline.
#[async_trait]
pub trait Camera: Send {
    /// Ask the user (or platform) for access to the camera.
    async fn request_permission(&mut self) -> Permission;

    /// `true` while the camera is running and in the foreground.
    fn is_active(&self) -> bool;

    /// Take one photo and return its encoded bytes.
    async fn capture_photo(&mut self) -> Result<Vec<u8>, CaptureError>;
}

/// Owns the camera and the ordered sequence of captured pages.
#[derive(Debug)]
pub struct CaptureController<C> {
    camera: C,
    pages: Vec<CapturedPage>,
    permission: Option<Permission>,
}

impl<C: Camera> CaptureController<C> {
    pub fn new(camera: C) -> Self {
        Self {
            camera,
            pages: Vec::new(),
            permission: None,
        }
    }

    /// Take one photo and append it to the sequence.
    ///
    /// Nothing is retried; on error the sequence is unchanged.
    pub async fn capture(&mut self) -> Result<CapturedPage, CaptureError> {
        let permission = match self.permission {
            Some(p) => p,
            None => {
                let p = self.camera.request_permission().await;
                info!("Camera permission: {:?}", p);
                self.permission = Some(p);
                p
            }
        };

        if permission == Permission::Denied {
            return Err(CaptureError::PermissionDenied);
        }
        if !self.camera.is_active() {
            return Err(CaptureError::DeviceUnavailable);
        }

        let bytes = self.camera.capture_photo().await?;
        if bytes.is_empty() {
            return Err(CaptureError::Hardware("camera returned an empty photo".into()));
        }

        let page = CapturedPage {
            sequence_index: self.pages.len(),
            raw: RawImage::new(bytes),
        };
        debug!(
            "Captured page {} ({} bytes)",
            page.sequence_index,
            page.raw.len()
        );
        self.pages.push(page.clone());
        Ok(page)
    }

    /// Drop every captured page.
    pub fn reset(&mut self) {
        if !self.pages.is_empty() {
            debug!("Discarding {} captured pages", self.pages.len());
        }
        self.pages.clear();
    }

    pub fn pages(&self) -> &[CapturedPage] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// The remembered permission answer, if one was requested yet.
    pub fn permission(&self) -> Option<Permission> {
        self.permission
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }
}

// ── Folder-backed camera ─────────────────────────────────────────────────

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// A [`Camera`] that "photographs" image files, one per capture.
///
/// Built either from a directory (JPEG/PNG files taken in file-name order)
/// or from an explicit list of files. The camera is inactive once every
/// file has been captured.
#[derive(Debug)]
pub struct FolderCamera {
    source: FolderSource,
    shots: Vec<PathBuf>,
    next: usize,
    granted: bool,
}

#[derive(Debug)]
enum FolderSource {
    Directory(PathBuf),
    Files(Vec<PathBuf>),
}

impl FolderCamera {
    /// Camera over the JPEG/PNG files of `dir`.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: FolderSource::Directory(dir.into()),
            shots: Vec::new(),
            next: 0,
            granted: false,
        }
    }

    /// Camera over an explicit list of files, captured in the given order.
    pub fn from_files(files: Vec<PathBuf>) -> Self {
        Self {
            source: FolderSource::Files(files),
            shots: Vec::new(),
            next: 0,
            granted: false,
        }
    }

    /// Number of files not yet captured.
    pub fn remaining(&self) -> usize {
        self.shots.len().saturating_sub(self.next)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[async_trait]
impl Camera for FolderCamera {
    async fn request_permission(&mut self) -> Permission {
        let shots = match &self.source {
            FolderSource::Files(files) => files.clone(),
            FolderSource::Directory(dir) => {
                let mut entries = match tokio::fs::read_dir(dir).await {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!("Cannot read capture folder {}: {}", dir.display(), e);
                        return Permission::Denied;
                    }
                };
                let mut shots = Vec::new();
                loop {
                    match entries.next_entry().await {
                        Ok(Some(entry)) => {
                            let path = entry.path();
                            let is_file = entry
                                .file_type()
                                .await
                                .map(|t| t.is_file())
                                .unwrap_or(false);
                            if is_file && has_image_extension(&path) {
                                shots.push(path);
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            warn!("Cannot list capture folder {}: {}", dir.display(), e);
                            return Permission::Denied;
                        }
                    }
                }
                shots.sort();
                shots
            }
        };

        debug!("Folder camera has {} shots", shots.len());
        self.shots = shots;
        self.next = 0;
        self.granted = true;
        Permission::Granted
    }

    fn is_active(&self) -> bool {
        self.granted && self.next < self.shots.len()
    }

    async fn capture_photo(&mut self) -> Result<Vec<u8>, CaptureError> {
        let path = self
            .shots
            .get(self.next)
            .cloned()
            .ok_or(CaptureError::DeviceUnavailable)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| CaptureError::Hardware(format!("{}: {}", path.display(), e)))?;
        self.next += 1;
        Ok(bytes)
    }
}
