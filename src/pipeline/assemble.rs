//! Document assembly: normalized pages + title → one paginated PDF.
//!
//! ## Layout
//!
//! ```text
//! page 1                 page 2..N
//! ┌──────────────┐       ┌──────────────┐
//! │ Title        │       │              │
//! │ ┌──────────┐ │       │ ┌──────────┐ │
//! │ │  image 0 │ │       │ │ image i  │ │
//! │ └──────────┘ │       │ └──────────┘ │
//! └──────────────┘       └──────────────┘
//! ```
//!
//! Every page is A4 with a 36 pt margin. Each JPEG is embedded as-is as a
//! `DCTDecode` image XObject (no re-encoding, no external references) and
//! scaled to fit the free area with its aspect ratio kept. Page order is the
//! request order; the PDF always has exactly one page per request page.
//!
//! The result lives in a temporary file owned by [`AssembledDocument`]; it
//! disappears when the handle is dropped unless it was committed first.

use crate::error::AssemblyError;
use crate::output::{DocumentRequest, NormalizedPage};
use crate::pipeline::heading::{HeadingFont, HeadingLayout};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 36.0;
/// Space between the heading and the image below it.
const HEADING_GAP: f32 = 18.0;
const PRODUCER: &str = concat!("docscan ", env!("CARGO_PKG_VERSION"));

/// Ephemeral handle to an assembled, not yet committed, PDF.
#[derive(Debug)]
pub struct AssembledDocument {
    file: NamedTempFile,
    title: String,
    page_count: usize,
    byte_len: u64,
}

impl AssembledDocument {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    /// Read the rendered PDF back from its temporary file.
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.file.path()).await
    }
}

/// Where the temporary file goes and which font sets the heading.
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    /// Directory for the temporary file (`None` = system temp).
    pub scratch_dir: Option<PathBuf>,
    /// TrueType font for titles WinAnsi cannot encode (`None` = search the
    /// installed fonts).
    pub heading_font: Option<PathBuf>,
}

/// Compose `request` into a PDF written to a temporary file.
///
/// # Arguments
/// * `request` — title and pages, in final order
/// * `options` — scratch directory and heading font
///
/// # Errors
/// * [`AssemblyError::EmptyPageSet`] when `request.pages` is empty; no file
///   is created in that case
/// * [`AssemblyError::EmptyTitle`] for a blank title
/// * [`AssemblyError::Font`] when the configured heading font is unusable
pub fn assemble(
    request: &DocumentRequest,
    options: &AssembleOptions,
) -> Result<AssembledDocument, AssemblyError> {
    if request.pages.is_empty() {
        return Err(AssemblyError::EmptyPageSet);
    }
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AssemblyError::EmptyTitle);
    }

    let font = HeadingFont::for_title(title, options.heading_font.as_deref())?;
    let pdf = render_pdf(title, &font, &request.pages)?;

    let builder = {
        let mut b = tempfile::Builder::new();
        b.prefix("docscan-").suffix(".pdf");
        b
    };
    let mut file = match options.scratch_dir.as_deref() {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(AssemblyError::Scratch)?;
    file.write_all(&pdf).map_err(AssemblyError::Scratch)?;
    file.as_file().sync_all().map_err(AssemblyError::Scratch)?;

    info!(
        "Assembled '{}': {} pages, {} bytes → {}",
        title,
        request.pages.len(),
        pdf.len(),
        file.path().display()
    );

    Ok(AssembledDocument {
        file,
        title: title.to_string(),
        page_count: request.pages.len(),
        byte_len: pdf.len() as u64,
    })
}

/// Heading content of the first page.
struct Heading<'a> {
    font: &'a HeadingFont,
    font_id: ObjectId,
    layout: HeadingLayout,
}

/// Build the PDF bytes in memory.
fn render_pdf(
    title: &str,
    font: &HeadingFont,
    pages: &[NormalizedPage],
) -> Result<Vec<u8>, AssemblyError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let layout = HeadingLayout::fit(title, font, PAGE_WIDTH - 2.0 * MARGIN);
    let font_id = font.add_to(&mut doc, &layout.text())?;
    let mut heading = Some(Heading {
        font,
        font_id,
        layout,
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let page_id = add_page(&mut doc, pages_id, page, heading.take())?;
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(utf16_text_string(title), StringFormat::Hexadecimal),
        "Producer" => Object::string_literal(PRODUCER),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| AssemblyError::Render(e.to_string()))?;
    Ok(buffer)
}

/// Add one A4 page showing `page`'s image, with an optional heading above it.
fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    page: &NormalizedPage,
    heading: Option<Heading<'_>>,
) -> Result<ObjectId, AssemblyError> {
    let image_id = doc.add_object(
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(page.width),
                "Height" => i64::from(page.height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            page.encoded_bytes.clone(),
        )
        .with_compression(false),
    );

    let mut operations = Vec::new();
    let mut area_top = PAGE_HEIGHT - MARGIN;
    let mut fonts = lopdf::Dictionary::new();

    if let Some(h) = heading {
        operations.extend(h.layout.operations(h.font, "F1", MARGIN, area_top));
        area_top -= h.layout.height() + HEADING_GAP;
        fonts.set("F1", h.font_id);
    }

    let placement = fit_image(page.width, page.height, area_top - MARGIN);
    operations.extend([
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                Object::Real(placement.width),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(placement.height),
                Object::Real(placement.x),
                Object::Real(area_top - placement.height),
            ],
        ),
        Operation::new("Do", vec!["Im0".into()]),
        Operation::new("Q", vec![]),
    ]);

    let content = Content { operations };
    let content_bytes = content
        .encode()
        .map_err(|e| AssemblyError::Render(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes));

    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => dictionary! { "Im0" => image_id },
    });

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(PAGE_WIDTH),
            Object::Real(PAGE_HEIGHT),
        ],
        "Resources" => resources_id,
        "Contents" => content_id,
    });

    debug!(
        "Placed page {} ({}x{} px) at {:.0}x{:.0} pt",
        page.source.sequence_index, page.width, page.height, placement.width, placement.height
    );
    Ok(page_id)
}

/// Size and horizontal offset of an image drawn on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    x: f32,
    width: f32,
    height: f32,
}

/// Scale a `w`×`h` image to fit the printable width and `avail_height`.
fn fit_image(w: u32, h: u32, avail_height: f32) -> Placement {
    let avail_width = PAGE_WIDTH - 2.0 * MARGIN;
    let (w, h) = (w.max(1) as f32, h.max(1) as f32);
    let scale = (avail_width / w).min(avail_height / h);
    let width = w * scale;
    let height = h * scale;
    Placement {
        x: MARGIN + (avail_width - width) / 2.0,
        width,
        height,
    }
}

/// PDF text string (UTF-16BE with BOM) for the document information dictionary.
fn utf16_text_string(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}
