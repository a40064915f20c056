//! CLI binary for docscan.
//!
//! A thin shim over the library crate: a folder of photos (or a list of
//! image files) stands in for the camera, each file is captured in order and
//! the pages are committed as one titled PDF.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docscan::{
    CaptureError, CollisionPolicy, DocumentArtifact, FolderCamera, ProgressCallback, ScanConfig, ScanError,
    ScanProgressCallback, Scanner, TitlePolicy,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while capturing, then a bar over the
/// normalization of every page.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(spinner_style);
        bar.set_prefix("Capturing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ScanProgressCallback for CliProgressCallback {
    fn on_capture(&self, index: usize) {
        self.bar.set_message(format!("page {}", index + 1));
    }

    fn on_assembly_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        self.bar.set_length(total_pages as u64);
        self.bar.set_position(0);
        self.bar.set_style(style);
        self.bar.set_prefix("Processing");
    }

    fn on_page_normalized(&self, index: usize, total: usize, encoded_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            index + 1,
            total,
            dim(&format!("{:>7} bytes", encoded_len)),
        ));
        self.bar.inc(1);
    }

    fn on_committed(&self, _artifact: &DocumentArtifact) {
        self.bar.finish_and_clear();
    }

    fn on_failed(&self, error: &str) {
        self.bar.abandon_with_message(red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Scan every photo in a folder into one PDF
  docscan create --title "Receipts" --dir ~/Pictures/receipts

  # Explicit pages, in order
  docscan create --title "Contract" p1.jpg p2.jpg p3.jpg

  # Titles with slashes become underscores instead of failing
  docscan create --title "2024/05 invoices" --slugify --dir ./shots

  # List stored documents matching "tax"
  docscan list --search tax

ENVIRONMENT VARIABLES:
  DOCSCAN_ROOT      Storage root for documents (default: <data dir>/docscan/documents)
  DOCSCAN_WIDTH     Normalized page width in pixels (default: 800)
  DOCSCAN_QUALITY   JPEG quality 0.0–1.0 (default: 0.3)
  DOCSCAN_HEADING_FONT  TrueType font for non-Latin titles
  RUST_LOG          Log filter, overrides --verbose/--quiet
"#;

/// Scan photos into titled PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "docscan",
    version,
    about = "Scan photos into titled PDF documents",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory documents are stored in.
    #[arg(long, global = true, env = "DOCSCAN_ROOT")]
    root: Option<PathBuf>,

    /// Output structured JSON instead of text.
    #[arg(long, global = true, env = "DOCSCAN_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCSCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCSCAN_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture images and store them as one PDF.
    Create(CreateArgs),
    /// List stored documents, newest first.
    List {
        /// Only show documents whose name contains this text.
        #[arg(short, long)]
        search: Option<String>,
    },
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// Document title; also the file name.
    #[arg(short, long)]
    title: String,

    /// Capture every JPEG/PNG in this folder, in file-name order.
    #[arg(long, conflicts_with = "images")]
    dir: Option<PathBuf>,

    /// Image files to capture, in order.
    #[arg(required_unless_present = "dir")]
    images: Vec<PathBuf>,

    /// Maximum page width in pixels.
    #[arg(long, env = "DOCSCAN_WIDTH", default_value_t = 800)]
    width: u32,

    /// JPEG quality (0.0–1.0).
    #[arg(long, env = "DOCSCAN_QUALITY", default_value_t = 0.3)]
    quality: f32,

    /// Pages normalized in parallel.
    #[arg(short, long, env = "DOCSCAN_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Per-stage timeout in seconds.
    #[arg(long, env = "DOCSCAN_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Replace unsafe file-name characters in the title with `_`.
    #[arg(long)]
    slugify: bool,

    /// Replace an existing document with the same name.
    #[arg(long)]
    overwrite: bool,

    /// TrueType font for titles outside Latin-1 (default: search installed fonts).
    #[arg(long, env = "DOCSCAN_HEADING_FONT")]
    heading_font: Option<PathBuf>,

    /// Also keep a copy in the local cache directory.
    #[arg(long, env = "DOCSCAN_CACHE_COPY")]
    cache_copy: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCSCAN_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = match &cli.command {
        Command::Create(args) => !cli.quiet && !args.no_progress && !cli.json,
        Command::List { .. } => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Create(args) => run_create(&cli, args, show_progress).await,
        Command::List { search } => run_list(&cli, search.as_deref()).await,
    }
}

async fn run_create(cli: &Cli, args: &CreateArgs, show_progress: bool) -> Result<()> {
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ScanProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, args, progress)?;

    let camera = match &args.dir {
        Some(dir) => FolderCamera::from_dir(dir),
        None => FolderCamera::from_files(args.images.clone()),
    };
    let scanner = Scanner::new(camera, config).context("Failed to open document storage")?;

    // ── Capture until the folder runs dry ────────────────────────────────
    let mut captured = 0usize;
    loop {
        match scanner.capture().await {
            Ok(_) => captured += 1,
            Err(ScanError::Capture(CaptureError::DeviceUnavailable)) if captured > 0 => break,
            Err(e) => return Err(e).context("Capture failed"),
        }
    }

    let artifact = scanner
        .create_document(&args.title)
        .await
        .context("Failed to create document")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&artifact).context("Failed to serialise artifact")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} pages  {}  →  {}",
            green("✔"),
            artifact.page_count,
            dim(&format!("{} bytes", artifact.byte_len)),
            bold(&artifact.path.display().to_string()),
        );
        if let Some(ref cached) = artifact.cached_copy {
            eprintln!("   cached copy: {}", dim(&cached.display().to_string()));
        }
    }
    Ok(())
}

async fn run_list(cli: &Cli, search: Option<&str>) -> Result<()> {
    let mut builder = ScanConfig::builder();
    if let Some(ref root) = cli.root {
        builder = builder.storage_root(root);
    }
    let config = builder.build().context("Invalid configuration")?;
    let root = config
        .resolved_storage_root()
        .context("No storage root; pass --root")?;
    let storage = docscan::FsStorage::new(root);

    let entries = docscan::list_artifacts(&storage, search)
        .await
        .context("Failed to list documents")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("Failed to serialise listing")?
        );
    } else if entries.is_empty() {
        if !cli.quiet {
            eprintln!("No documents found");
        }
    } else {
        for entry in &entries {
            println!(
                "{:<40}  {}  {}",
                entry.name,
                entry.modified.format("%Y-%m-%d"),
                dim(&entry.path.display().to_string())
            );
        }
    }
    Ok(())
}

/// Map CLI args to `ScanConfig`.
fn build_config(
    cli: &Cli,
    args: &CreateArgs,
    progress: Option<ProgressCallback>,
) -> Result<ScanConfig> {
    let mut builder = ScanConfig::builder()
        .target_width(args.width)
        .jpeg_quality(args.quality)
        .normalize_concurrency(args.concurrency)
        .stage_timeout_secs(args.timeout)
        .title_policy(if args.slugify {
            TitlePolicy::Slugify
        } else {
            TitlePolicy::Reject
        })
        .collision_policy(if args.overwrite {
            CollisionPolicy::Overwrite
        } else {
            CollisionPolicy::Reject
        });

    // Only override the platform default when the flag is given.
    if args.cache_copy {
        builder = builder.cache_local_copy(true);
    }
    if let Some(ref root) = cli.root {
        builder = builder.storage_root(root);
    }
    if let Some(ref font) = args.heading_font {
        builder = builder.heading_font(font);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
