//! Integration tests for the full capture → normalize → assemble → commit
//! pipeline.
//!
//! A scripted camera stands in for the device and storage goes to a
//! temporary directory, so these run anywhere without hardware:
//!
//!   cargo test --test pipeline -- --nocapture

use async_trait::async_trait;
use docscan::{
    AssemblyError, Camera, CaptureError, CollisionPolicy, DurableStorage, FsStorage, Permission,
    PipelineState, ScanConfig, ScanConfigBuilder, ScanError, ScanProgressCallback, Scanner,
    StoreError, StoredFile, TitlePolicy,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::Document;
use std::collections::VecDeque;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route pipeline logs to the test output (`RUST_LOG=docscan=debug`).
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// PNG of `width` × `width / 2` pixels.
fn png(width: u32) -> Vec<u8> {
    let height = (width / 2).max(1);
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Camera that replays a fixed script of shots, then goes inactive.
struct MockCamera {
    permission: Permission,
    shots: VecDeque<Result<Vec<u8>, CaptureError>>,
    permission_requests: Arc<AtomicUsize>,
}

impl MockCamera {
    fn with_widths(widths: &[u32]) -> Self {
        Self::scripted(widths.iter().map(|&w| Ok(png(w))).collect())
    }

    fn scripted(shots: Vec<Result<Vec<u8>, CaptureError>>) -> Self {
        Self {
            permission: Permission::Granted,
            shots: shots.into(),
            permission_requests: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Camera for MockCamera {
    async fn request_permission(&mut self) -> Permission {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        self.permission
    }

    fn is_active(&self) -> bool {
        !self.shots.is_empty()
    }

    async fn capture_photo(&mut self) -> Result<Vec<u8>, CaptureError> {
        self.shots
            .pop_front()
            .unwrap_or(Err(CaptureError::DeviceUnavailable))
    }
}

/// Filesystem storage that counts writes and can fail or hold them.
struct TestStorage {
    inner: FsStorage,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
    gate: Option<Arc<Notify>>,
}

impl TestStorage {
    fn new(root: &Path) -> Self {
        Self {
            inner: FsStorage::new(root),
            writes: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
            gate: None,
        }
    }

    fn failing(root: &Path) -> Self {
        let s = Self::new(root);
        s.fail_writes.store(true, Ordering::SeqCst);
        s
    }

    /// Writes wait until `gate` is notified.
    fn gated(root: &Path, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(root)
        }
    }

    fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Count the write, wait for the gate, then apply the failure switch.
    async fn admit(&self) -> io::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(ref gate) = self.gate {
            gate.notified().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "no space left on device"));
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStorage for TestStorage {
    fn root(&self) -> &Path {
        self.inner.root()
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        self.inner.exists(path).await
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.admit().await?;
        self.inner.write(path, bytes).await
    }

    async fn write_new(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.admit().await?;
        self.inner.write_new(path, bytes).await
    }

    async fn list(&self) -> io::Result<Vec<StoredFile>> {
        self.inner.list().await
    }
}

fn config_for(root: &Path) -> ScanConfigBuilder {
    init_tracing();
    ScanConfig::builder()
        .storage_root(root)
        .cache_local_copy(false)
}

async fn capture_all<C: Camera, S: DurableStorage>(scanner: &Scanner<C, S>, n: usize) {
    for _ in 0..n {
        assert_ok!(scanner.capture().await);
    }
}

/// Width of the image placed on every page, in page order.
fn page_image_widths(path: &Path) -> Vec<i64> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
            let resources_id = page.get(b"Resources").unwrap().as_reference().unwrap();
            let resources = doc.get_object(resources_id).unwrap().as_dict().unwrap();
            let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
            let image_id = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
            let image = doc.get_object(image_id).unwrap().as_stream().unwrap();
            image.dict.get(b"Width").unwrap().as_i64().unwrap()
        })
        .collect()
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn three_pages_titled_notes() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path()).build().unwrap();
    let scanner = Scanner::new(MockCamera::with_widths(&[400, 400, 400]), config).unwrap();

    capture_all(&scanner, 3).await;
    let artifact = scanner.create_document("Notes").await.unwrap();

    assert!(artifact.storage_uri.ends_with("Notes.pdf"));
    assert_eq!(artifact.path, dir.path().join("Notes.pdf"));
    assert_eq!(artifact.title, "Notes");
    assert_eq!(artifact.page_count, 3);

    let bytes = std::fs::read(&artifact.path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert_eq!(bytes.len() as u64, artifact.byte_len);
    assert_eq!(Document::load_mem(&bytes).unwrap().get_pages().len(), 3);
}

#[tokio::test]
async fn pages_keep_capture_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path()).build().unwrap();
    let widths = [120, 340, 560, 1600];
    let scanner = Scanner::new(MockCamera::with_widths(&widths), config).unwrap();

    capture_all(&scanner, widths.len()).await;
    let indices: Vec<usize> = scanner
        .pages()
        .unwrap()
        .iter()
        .map(|p| p.sequence_index)
        .collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);

    let artifact = scanner.create_document("Ordered").await.unwrap();
    // Narrow pages are never upscaled; the wide one is capped at 800 px.
    assert_eq!(page_image_widths(&artifact.path), vec![120, 340, 560, 800]);
}

#[tokio::test]
async fn parallel_normalization_keeps_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path())
        .normalize_concurrency(4)
        .build()
        .unwrap();
    let widths = [700, 100, 500, 300, 200, 600];
    let scanner = Scanner::new(MockCamera::with_widths(&widths), config).unwrap();

    capture_all(&scanner, widths.len()).await;
    let artifact = scanner.create_document("Parallel").await.unwrap();
    assert_eq!(
        page_image_widths(&artifact.path),
        widths.iter().map(|&w| i64::from(w)).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn commit_resets_pages_and_state() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path()).build().unwrap();
    let scanner = Scanner::new(MockCamera::with_widths(&[300, 300, 300]), config).unwrap();

    assert_eq!(scanner.state(), PipelineState::Idle);
    capture_all(&scanner, 2).await;
    assert_eq!(scanner.state(), PipelineState::Capturing);

    assert_ok!(scanner.create_document("First").await);
    assert_eq!(scanner.state(), PipelineState::Committed);
    assert_eq!(scanner.page_count(), 0);

    // A fresh session starts numbering from zero again.
    let page = scanner.capture().await.unwrap();
    assert_eq!(page.sequence_index, 0);
    assert_eq!(scanner.state(), PipelineState::Capturing);

    scanner.reset().unwrap();
    assert_eq!(scanner.state(), PipelineState::Idle);
    assert_eq!(scanner.page_count(), 0);
}

// ── Failure paths keep the pages ─────────────────────────────────────────────

#[tokio::test]
async fn empty_page_set_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path()).build().unwrap();
    let scanner = Scanner::with_storage(
        MockCamera::with_widths(&[]),
        TestStorage::new(dir.path()),
        config,
    );

    let err = scanner.create_document("Empty").await.unwrap_err();
    assert!(matches!(err, ScanError::Assembly(AssemblyError::EmptyPageSet)));
    assert_eq!(scanner.storage().write_count(), 0);
    assert!(!dir.path().join("Empty.pdf").exists());
    assert_eq!(scanner.state(), PipelineState::Failed);
}

#[tokio::test]
async fn blank_title_rejected_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path()).build().unwrap();
    let scanner = Scanner::with_storage(
        MockCamera::with_widths(&[200]),
        TestStorage::new(dir.path()),
        config,
    );

    capture_all(&scanner, 1).await;
    let err = scanner.create_document("   ").await.unwrap_err();
    assert!(matches!(err, ScanError::Assembly(AssemblyError::EmptyTitle)));
    assert_eq!(scanner.storage().write_count(), 0);
    assert_eq!(scanner.page_count(), 1);
}

#[tokio::test]
async fn io_failure_keeps_pages_for_retry() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path()).build().unwrap();
    let scanner = Scanner::with_storage(
        MockCamera::with_widths(&[300, 300]),
        TestStorage::failing(dir.path()),
        config,
    );

    capture_all(&scanner, 2).await;
    let err = scanner.create_document("Invoices").await.unwrap_err();
    assert!(matches!(err, ScanError::Store(StoreError::Io { .. })));
    assert!(err.is_transient());
    assert_eq!(scanner.page_count(), 2);
    assert_eq!(scanner.state(), PipelineState::Failed);
    assert!(!dir.path().join("Invoices.pdf").exists());

    // Space freed up: the same pages go through on the next attempt.
    scanner.storage().fail_writes.store(false, Ordering::SeqCst);
    let artifact = scanner.create_document("Invoices").await.unwrap();
    assert_eq!(artifact.page_count, 2);
    assert_eq!(scanner.page_count(), 0);
    assert_eq!(scanner.storage().write_count(), 2);
}

#[tokio::test]
async fn name_collision_rejected_then_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Notes.pdf"), b"older document").unwrap();

    let config = config_for(dir.path()).build().unwrap();
    let scanner = Scanner::new(MockCamera::with_widths(&[300, 300, 300]), config).unwrap();
    capture_all(&scanner, 3).await;

    let err = scanner.create_document("Notes").await.unwrap_err();
    match err {
        ScanError::Store(StoreError::NameCollision { ref path }) => {
            assert_eq!(path, &dir.path().join("Notes.pdf"))
        }
        other => panic!("expected NameCollision, got {other:?}"),
    }
    assert_eq!(scanner.page_count(), 3);
    assert_eq!(
        std::fs::read(dir.path().join("Notes.pdf")).unwrap(),
        b"older document"
    );

    let config = config_for(dir.path())
        .collision_policy(CollisionPolicy::Overwrite)
        .build()
        .unwrap();
    let scanner = Scanner::new(MockCamera::with_widths(&[300]), config).unwrap();
    capture_all(&scanner, 1).await;
    let artifact = scanner.create_document("Notes").await.unwrap();
    let bytes = std::fs::read(&artifact.path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn unsafe_title_rejected_or_slugified() {
    let dir = tempfile::tempdir().unwrap();

    let config = config_for(dir.path()).build().unwrap();
    let scanner = Scanner::new(MockCamera::with_widths(&[200]), config).unwrap();
    capture_all(&scanner, 1).await;
    let err = scanner.create_document("2024/05 receipts").await.unwrap_err();
    assert!(matches!(err, ScanError::Store(StoreError::InvalidTitle { .. })));
    assert_eq!(scanner.page_count(), 1);

    let config = config_for(dir.path())
        .title_policy(TitlePolicy::Slugify)
        .build()
        .unwrap();
    let scanner = Scanner::new(MockCamera::with_widths(&[200]), config).unwrap();
    capture_all(&scanner, 1).await;
    let artifact = scanner.create_document("2024/05 receipts").await.unwrap();
    assert_eq!(artifact.path, dir.path().join("2024_05 receipts.pdf"));
    assert_eq!(artifact.title, "2024/05 receipts");
}

// ── Capture errors ───────────────────────────────────────────────────────────

#[tokio::test]
async fn denied_permission_is_asked_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut camera = MockCamera::with_widths(&[200]);
    camera.permission = Permission::Denied;
    let requests = camera.permission_requests.clone();

    let config = config_for(dir.path()).build().unwrap();
    let scanner = Scanner::new(camera, config).unwrap();

    for _ in 0..3 {
        let err = assert_err!(scanner.capture().await);
        assert!(matches!(err, ScanError::Capture(CaptureError::PermissionDenied)));
    }
    assert_eq!(requests.load(Ordering::SeqCst), 1);
    assert_eq!(scanner.page_count(), 0);
}

#[tokio::test]
async fn hardware_fault_leaves_sequence_intact() {
    let dir = tempfile::tempdir().unwrap();
    let camera = MockCamera::scripted(vec![
        Ok(png(200)),
        Err(CaptureError::Hardware("sensor timeout".into())),
        Ok(png(300)),
    ]);
    let config = config_for(dir.path()).build().unwrap();
    let scanner = Scanner::new(camera, config).unwrap();

    assert_ok!(scanner.capture().await);
    let err = assert_err!(scanner.capture().await);
    assert!(matches!(err, ScanError::Capture(CaptureError::Hardware(_))));
    let page = scanner.capture().await.unwrap();
    assert_eq!(page.sequence_index, 1);

    // Script exhausted: the camera reports itself unavailable.
    let err = assert_err!(scanner.capture().await);
    assert!(matches!(err, ScanError::Capture(CaptureError::DeviceUnavailable)));
    assert_eq!(scanner.page_count(), 2);
}

#[tokio::test]
async fn undecodable_capture_fails_normalization() {
    let dir = tempfile::tempdir().unwrap();
    let camera = MockCamera::scripted(vec![Ok(png(200)), Ok(b"not an image".to_vec())]);
    let config = config_for(dir.path()).build().unwrap();
    let scanner = Scanner::new(camera, config).unwrap();

    capture_all(&scanner, 2).await;
    let err = scanner.create_document("Broken").await.unwrap_err();
    assert!(matches!(err, ScanError::Normalization(_)));
    assert_eq!(scanner.page_count(), 2);
    assert!(!dir.path().join("Broken.pdf").exists());
}

// ── Concurrency ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_trigger_while_busy_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let gate = Arc::new(Notify::new());
    let config = config_for(dir.path()).build().unwrap();
    let scanner = Scanner::with_storage(
        MockCamera::with_widths(&[300, 300]),
        TestStorage::gated(dir.path(), gate.clone()),
        config,
    );
    capture_all(&scanner, 2).await;

    let (first, second) = tokio::join!(scanner.create_document("First"), async {
        let second = scanner.create_document("Second").await;
        let capture = scanner.capture().await;
        let reset = scanner.reset();
        gate.notify_one();
        (second, capture, reset)
    });

    let (second, capture, reset) = second;
    assert!(matches!(second, Err(ScanError::Busy)));
    assert!(matches!(capture, Err(ScanError::Busy)));
    assert!(matches!(reset, Err(ScanError::Busy)));

    let artifact = first.unwrap();
    assert_eq!(artifact.page_count, 2);
    assert_eq!(scanner.storage().write_count(), 1);
    assert!(!dir.path().join("Second.pdf").exists());
}

#[tokio::test]
async fn assembling_state_visible_while_running() {
    let dir = tempfile::tempdir().unwrap();
    let gate = Arc::new(Notify::new());
    let config = config_for(dir.path()).build().unwrap();
    let scanner = Scanner::with_storage(
        MockCamera::with_widths(&[300, 300]),
        TestStorage::gated(dir.path(), gate.clone()),
        config,
    );
    capture_all(&scanner, 2).await;
    let mut states = scanner.watch_state();
    assert_eq!(*states.borrow_and_update(), PipelineState::Capturing);

    let (created, observed) = tokio::join!(scanner.create_document("Observed"), async {
        let observed = (scanner.state(), scanner.page_count(), scanner.pages());
        assert_eq!(*states.borrow_and_update(), PipelineState::Assembling);
        gate.notify_one();
        observed
    });

    let (state, count, pages) = observed;
    assert_eq!(state, PipelineState::Assembling);
    assert_eq!(count, 2);
    assert!(matches!(pages, Err(ScanError::Busy)));

    assert_ok!(created);
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow(), PipelineState::Committed);
    assert_eq!(scanner.page_count(), 0);
}

#[tokio::test]
async fn stalled_commit_times_out_and_keeps_pages() {
    let dir = tempfile::tempdir().unwrap();
    let gate = Arc::new(Notify::new());
    let config = config_for(dir.path())
        .stage_timeout_secs(1)
        .build()
        .unwrap();
    let scanner = Scanner::with_storage(
        MockCamera::with_widths(&[300, 300]),
        TestStorage::gated(dir.path(), gate.clone()),
        config,
    );
    capture_all(&scanner, 2).await;

    // Nobody opens the gate: the write hangs until the stage timeout.
    let err = scanner.create_document("Stalled").await.unwrap_err();
    match err {
        ScanError::Timeout { stage, secs } => {
            assert_eq!(stage, "commit");
            assert_eq!(secs, 1);
        }
        ref other => panic!("expected Timeout, got {other:?}"),
    }
    assert!(err.is_transient());
    assert_eq!(scanner.state(), PipelineState::Failed);
    assert_eq!(scanner.page_count(), 2);
    assert!(!dir.path().join("Stalled.pdf").exists());

    // Storage recovers: the kept pages commit on the retry.
    gate.notify_one();
    let artifact = scanner.create_document("Stalled").await.unwrap();
    assert_eq!(artifact.page_count, 2);
    assert_eq!(scanner.storage().write_count(), 2);
}

// ── Extras ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cache_copy_written_next_to_stored_document() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    let cache = dir.path().join("cache");
    let config = ScanConfig::builder()
        .storage_root(&docs)
        .cache_local_copy(true)
        .cache_dir(&cache)
        .build()
        .unwrap();
    let scanner = Scanner::new(MockCamera::with_widths(&[300]), config).unwrap();

    capture_all(&scanner, 1).await;
    let artifact = scanner.create_document("Receipt").await.unwrap();

    let cached: PathBuf = artifact.cached_copy.clone().unwrap();
    assert_eq!(cached, cache.join("Receipt.pdf"));
    assert_eq!(
        std::fs::read(&cached).unwrap(),
        std::fs::read(&artifact.path).unwrap()
    );
}

#[tokio::test]
async fn unwritable_cache_does_not_fail_commit() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    // A plain file where the cache directory should be.
    let cache = dir.path().join("cache");
    std::fs::write(&cache, b"occupied").unwrap();
    let config = ScanConfig::builder()
        .storage_root(&docs)
        .cache_local_copy(true)
        .cache_dir(&cache)
        .build()
        .unwrap();
    let scanner = Scanner::new(MockCamera::with_widths(&[300, 300]), config).unwrap();

    capture_all(&scanner, 2).await;
    let artifact = scanner.create_document("Receipt").await.unwrap();

    assert!(artifact.cached_copy.is_none());
    assert!(docs.join("Receipt.pdf").exists());
    assert_eq!(scanner.state(), PipelineState::Committed);
    assert_eq!(scanner.page_count(), 0);
}

#[tokio::test]
async fn non_latin_title_is_stored_and_headed() {
    let dir = tempfile::tempdir().unwrap();
    let title = "पढ़ो नोट्स";
    let Some(font) = docscan::find_heading_font(title) else {
        println!("SKIP — no installed TrueType font covers {title:?}");
        return;
    };
    let config = config_for(dir.path()).heading_font(font).build().unwrap();
    let scanner = Scanner::new(MockCamera::with_widths(&[300]), config).unwrap();

    capture_all(&scanner, 1).await;
    let artifact = scanner.create_document(title).await.unwrap();
    assert_eq!(artifact.path, dir.path().join(format!("{title}.pdf")));
    assert!(artifact.storage_uri.starts_with("file:///"));
    assert!(!artifact.storage_uri.contains(' '));

    let text = Document::load(&artifact.path).unwrap().extract_text(&[1]).unwrap();
    let words = text.split_whitespace().collect::<Vec<_>>().join(" ");
    assert_eq!(words, title, "got: {text:?}");
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl ScanProgressCallback for RecordingCallback {
    fn on_capture(&self, index: usize) {
        self.events.lock().unwrap().push(format!("capture {index}"));
    }

    fn on_assembly_start(&self, total_pages: usize) {
        self.events.lock().unwrap().push(format!("start {total_pages}"));
    }

    fn on_page_normalized(&self, index: usize, total: usize, _encoded_len: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("page {index}/{total}"));
    }

    fn on_committed(&self, artifact: &docscan::DocumentArtifact) {
        self.events
            .lock()
            .unwrap()
            .push(format!("committed {}", artifact.title));
    }
}

#[tokio::test]
async fn progress_events_follow_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let cb = Arc::new(RecordingCallback::default());
    let config = config_for(dir.path())
        .progress_callback(cb.clone() as Arc<dyn ScanProgressCallback>)
        .build()
        .unwrap();
    let scanner = Scanner::new(MockCamera::with_widths(&[200, 200]), config).unwrap();

    capture_all(&scanner, 2).await;
    scanner.create_document("Events").await.unwrap();

    let events = cb.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "capture 0",
            "capture 1",
            "start 2",
            "page 0/2",
            "page 1/2",
            "committed Events",
        ]
    );
}

#[tokio::test]
async fn listing_shows_committed_documents() {
    let dir = tempfile::tempdir().unwrap();
    for title in ["Tax 2023", "Recipes"] {
        let config = config_for(dir.path()).build().unwrap();
        let scanner = Scanner::new(MockCamera::with_widths(&[200]), config).unwrap();
        capture_all(&scanner, 1).await;
        scanner.create_document(title).await.unwrap();
    }

    let config = config_for(dir.path()).build().unwrap();
    let scanner = Scanner::new(MockCamera::with_widths(&[]), config).unwrap();

    let all = scanner.list_documents(None).await.unwrap();
    let mut names: Vec<_> = all.iter().map(|e| e.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Recipes", "Tax 2023"]);

    let hits = scanner.list_documents(Some("tax")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].file_name, "Tax 2023.pdf");
}
