//! Title heading of the first page: font choice, line layout and the PDF
//! font objects.
//!
//! Titles that WinAnsi can encode are set in the built-in Helvetica. Any
//! other title needs a real font: a TrueType file is embedded as a `Type0` /
//! `Identity-H` font with a `ToUnicode` map, so viewers draw the glyphs and
//! text extraction returns the title as typed. Glyphs are placed one per
//! character; scripts that rely on shaping show unjoined forms.
//!
//! The font is either configured explicitly or found among the installed
//! system fonts (first TrueType file that covers every character).
//!
//! Long titles wrap at word boundaries. The size steps down from 24 pt to
//! 14 pt until the heading fits in four lines; anything beyond that is cut
//! with `...`.

use crate::error::AssemblyError;
use ab_glyph::{Font, FontVec, GlyphId};
use lopdf::content::Operation;
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub(crate) const MAX_HEADING_SIZE: f32 = 24.0;
const MIN_HEADING_SIZE: f32 = 14.0;
const MAX_HEADING_LINES: usize = 4;
const LINE_SPACING: f32 = 1.2;
const ELLIPSIS: &str = "...";
const MAX_FONT_BYTES: u64 = 32 * 1024 * 1024;

// ── WinAnsi / Helvetica ──────────────────────────────────────────────────

/// WinAnsi code for `c`, if the encoding has one.
pub(crate) fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        ' '..='~' | '\u{A0}'..='\u{FF}' => c as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Helvetica advance widths for `' '..='~'`, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

fn helvetica_width(c: char) -> f32 {
    match c {
        ' '..='~' => f32::from(HELVETICA_WIDTHS[c as usize - 0x20]),
        // Drawn as '?'.
        _ if win_ansi_byte(c).is_none() => 556.0,
        // Widest WinAnsi glyphs; overestimating only wraps a little early.
        _ => 1000.0,
    }
}

// ── Embedded TrueType ────────────────────────────────────────────────────

/// A TrueType font file embedded for the heading.
pub(crate) struct EmbeddedFont {
    path: PathBuf,
    name: String,
    data: Vec<u8>,
    font: FontVec,
    units_per_em: f32,
}

impl std::fmt::Debug for EmbeddedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedFont")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl EmbeddedFont {
    pub(crate) fn load(path: &Path) -> Result<Self, String> {
        let len = std::fs::metadata(path).map_err(|e| e.to_string())?.len();
        if len > MAX_FONT_BYTES {
            return Err(format!(
                "font file is {} MiB, the limit is {} MiB",
                len >> 20,
                MAX_FONT_BYTES >> 20
            ));
        }
        let data = std::fs::read(path).map_err(|e| e.to_string())?;
        // FontFile2 only carries glyf outlines; CFF and collections are out.
        if !(data.starts_with(&[0, 1, 0, 0]) || data.starts_with(b"true")) {
            return Err("not a TrueType font (glyf outlines required)".into());
        }
        let font = FontVec::try_from_vec(data.clone()).map_err(|e| e.to_string())?;
        let units_per_em = font.units_per_em().unwrap_or(1000.0);

        Ok(Self {
            path: path.to_path_buf(),
            name: postscript_name(path),
            data,
            font,
            units_per_em,
        })
    }

    /// `true` when every non-blank character of `text` has a glyph.
    fn covers(&self, text: &str) -> bool {
        text.chars()
            .filter(|c| !c.is_whitespace())
            .all(|c| self.font.glyph_id(c).0 != 0)
    }

    fn glyph_width(&self, id: GlyphId) -> f32 {
        self.font.h_advance_unscaled(id) * 1000.0 / self.units_per_em
    }

    fn to_pdf_units(&self, v: f32) -> i64 {
        (v * 1000.0 / self.units_per_em).round() as i64
    }
}

/// PDF name for the font, derived from its file name.
fn postscript_name(path: &Path) -> String {
    let name: String = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if name.is_empty() {
        "DocscanHeading".into()
    } else {
        name
    }
}

// ── Font choice ──────────────────────────────────────────────────────────

/// Font the heading is set in.
#[derive(Debug)]
pub(crate) enum HeadingFont {
    Helvetica,
    Embedded(EmbeddedFont),
}

impl HeadingFont {
    /// Pick the font for `title`.
    ///
    /// # Errors
    /// [`AssemblyError::Font`] when `configured` is set but unusable.
    pub(crate) fn for_title(title: &str, configured: Option<&Path>) -> Result<Self, AssemblyError> {
        if title.chars().all(|c| win_ansi_byte(c).is_some()) {
            return Ok(HeadingFont::Helvetica);
        }

        if let Some(path) = configured {
            let font = EmbeddedFont::load(path).map_err(|detail| AssemblyError::Font {
                path: path.to_path_buf(),
                detail,
            })?;
            if !font.covers(title) {
                warn!(
                    "Heading font {} lacks glyphs for part of '{}'",
                    path.display(),
                    title
                );
            }
            return Ok(HeadingFont::Embedded(font));
        }

        match discover_font(title) {
            Some(font) => {
                debug!("Heading font for '{}': {}", title, font.path.display());
                Ok(HeadingFont::Embedded(font))
            }
            None => {
                warn!(
                    "No installed font covers '{}'; characters outside WinAnsi are drawn as '?'",
                    title
                );
                Ok(HeadingFont::Helvetica)
            }
        }
    }

    /// Advance width of `text` at `size` points.
    pub(crate) fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: f32 = match self {
            HeadingFont::Helvetica => text.chars().map(helvetica_width).sum(),
            HeadingFont::Embedded(f) => text
                .chars()
                .map(|c| f.glyph_width(f.font.glyph_id(c)))
                .sum(),
        };
        units * size / 1000.0
    }

    /// Encode `text` as a string operand for `Tj`.
    fn encode(&self, text: &str) -> Object {
        match self {
            HeadingFont::Helvetica => Object::String(
                text.chars()
                    .map(|c| win_ansi_byte(c).unwrap_or(b'?'))
                    .collect(),
                StringFormat::Literal,
            ),
            HeadingFont::Embedded(f) => Object::String(
                text.chars()
                    .flat_map(|c| f.font.glyph_id(c).0.to_be_bytes())
                    .collect(),
                StringFormat::Hexadecimal,
            ),
        }
    }

    /// Add the font objects to `doc` and return the font dictionary id.
    ///
    /// `used_text` must contain every character drawn with the font.
    pub(crate) fn add_to(&self, doc: &mut Document, used_text: &str) -> Result<ObjectId, AssemblyError> {
        let font = match self {
            HeadingFont::Helvetica => {
                return Ok(doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                    "Encoding" => "WinAnsiEncoding",
                }))
            }
            HeadingFont::Embedded(f) => f,
        };

        let mut glyphs: BTreeMap<u16, char> = BTreeMap::new();
        for c in used_text.chars() {
            glyphs.entry(font.font.glyph_id(c).0).or_insert(c);
        }

        let widths: Vec<Object> = glyphs
            .keys()
            .flat_map(|&gid| {
                let w = font.glyph_width(GlyphId(gid)).round() as i64;
                [Object::Integer(i64::from(gid)), Object::Array(vec![w.into()])]
            })
            .collect();

        let mut file = Stream::new(
            dictionary! { "Length1" => font.data.len() as i64 },
            font.data.clone(),
        );
        file.compress()
            .map_err(|e| AssemblyError::Render(e.to_string()))?;
        let file_id = doc.add_object(file);

        let base_font = Object::Name(font.name.clone().into_bytes());
        let ascent = font.to_pdf_units(font.font.ascent_unscaled());
        let descent = font.to_pdf_units(font.font.descent_unscaled());

        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => base_font.clone(),
            "Flags" => 32,
            "FontBBox" => vec![(-1000).into(), descent.into(), 2000.into(), ascent.into()],
            "ItalicAngle" => 0,
            "Ascent" => ascent,
            "Descent" => descent,
            "CapHeight" => ascent,
            "StemV" => 80,
            "FontFile2" => file_id,
        });

        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => base_font.clone(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "CIDToGIDMap" => "Identity",
            "DW" => 1000,
            "W" => widths,
        });

        let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap(&glyphs)));

        Ok(doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => base_font,
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        }))
    }
}

/// `ToUnicode` CMap mapping 2-byte glyph ids back to text.
fn to_unicode_cmap(glyphs: &BTreeMap<u16, char>) -> Vec<u8> {
    let mut out = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );
    let entries: Vec<(&u16, &char)> = glyphs.iter().collect();
    for chunk in entries.chunks(100) {
        out.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, c) in chunk {
            let mut units = [0u16; 2];
            let target: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{u:04X}"))
                .collect();
            out.push_str(&format!("<{:04X}> <{}>\n", gid, target));
        }
        out.push_str("endbfchar\n");
    }
    out.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    out.into_bytes()
}

// ── System font discovery ────────────────────────────────────────────────

/// Families tried before any other installed font.
const PREFERRED_FAMILIES: &[&str] = &[
    "NotoSans-",
    "NotoSans",
    "DejaVuSans.",
    "FreeSans.",
    "Arial Unicode",
    "Roboto-Regular",
    "Arial.",
    "arial.",
];

fn font_dirs() -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = dirs::font_dir().into_iter().collect();
    out.extend(
        [
            "/usr/share/fonts",
            "/usr/local/share/fonts",
            "/Library/Fonts",
            "/System/Library/Fonts",
            "/system/fonts",
            "C:\\Windows\\Fonts",
        ]
        .into_iter()
        .map(PathBuf::from),
    );
    out
}

fn collect_ttf(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        match entry.file_type() {
            Ok(t) if t.is_dir() && depth > 0 => collect_ttf(&path, depth - 1, out),
            Ok(t) if t.is_file() => {
                let is_ttf = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("ttf"));
                if is_ttf {
                    out.push(path);
                }
            }
            _ => {}
        }
    }
}

/// Lower is tried first.
fn family_rank(path: &Path) -> usize {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let styled = ["Bold", "Italic", "Oblique", "Mono", "Condensed", "Light"]
        .iter()
        .any(|s| name.contains(s));
    let preferred = PREFERRED_FAMILIES.iter().any(|p| name.starts_with(p));
    match (preferred, styled) {
        (true, false) => 0,
        (false, false) => 1,
        (true, true) => 2,
        (false, true) => 3,
    }
}

fn discover_font(text: &str) -> Option<EmbeddedFont> {
    let mut candidates = Vec::new();
    for dir in font_dirs() {
        collect_ttf(&dir, 4, &mut candidates);
    }
    candidates.sort_by_cached_key(|p| (family_rank(p), p.clone()));
    candidates.dedup();

    candidates
        .iter()
        .filter_map(|path| EmbeddedFont::load(path).ok())
        .find(|font| font.covers(text))
}

/// Installed TrueType font able to draw every character of `text`, if any.
///
/// Titles that WinAnsi can encode never need one.
pub fn find_heading_font(text: &str) -> Option<PathBuf> {
    discover_font(text).map(|f| f.path)
}

// ── Layout ───────────────────────────────────────────────────────────────

/// Heading lines at a common size.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HeadingLayout {
    pub(crate) size: f32,
    pub(crate) lines: Vec<String>,
}

impl HeadingLayout {
    /// Fit `title` into `max_width` points.
    pub(crate) fn fit(title: &str, font: &HeadingFont, max_width: f32) -> Self {
        let mut size = MAX_HEADING_SIZE;
        loop {
            let lines = wrap(title, font, size, max_width);
            if lines.len() <= MAX_HEADING_LINES || size <= MIN_HEADING_SIZE {
                return Self {
                    size,
                    lines: truncate(lines, font, size, max_width),
                };
            }
            size -= 2.0;
        }
    }

    /// Vertical space taken by the lines.
    pub(crate) fn height(&self) -> f32 {
        self.lines.len() as f32 * self.size * LINE_SPACING
    }

    /// Every drawn character, for the font's glyph tables.
    pub(crate) fn text(&self) -> String {
        self.lines.concat()
    }

    /// Text operations drawing the lines below `top`, left-aligned at `left`.
    pub(crate) fn operations(&self, font: &HeadingFont, resource: &str, left: f32, top: f32) -> Vec<Operation> {
        let mut ops = Vec::with_capacity(self.lines.len() * 5);
        let mut baseline = top - self.size;
        for line in &self.lines {
            ops.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![resource.into(), Object::Real(self.size)]),
                Operation::new("Td", vec![Object::Real(left), Object::Real(baseline)]),
                Operation::new("Tj", vec![font.encode(line)]),
                Operation::new("ET", vec![]),
            ]);
            baseline -= self.size * LINE_SPACING;
        }
        ops
    }
}

/// Greedy word wrap; words wider than a line are split between characters.
fn wrap(text: &str, font: &HeadingFont, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };
        if font.text_width(&candidate, size) <= max_width {
            line = candidate;
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        for c in word.chars() {
            line.push(c);
            if line.chars().count() > 1 && font.text_width(&line, size) > max_width {
                line.pop();
                lines.push(std::mem::replace(&mut line, c.to_string()));
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn truncate(mut lines: Vec<String>, font: &HeadingFont, size: f32, max_width: f32) -> Vec<String> {
    if lines.len() <= MAX_HEADING_LINES {
        return lines;
    }
    lines.truncate(MAX_HEADING_LINES);
    if let Some(last) = lines.last_mut() {
        while !last.is_empty() && font.text_width(&format!("{last}{ELLIPSIS}"), size) > max_width {
            last.pop();
        }
        let kept = last.trim_end().len();
        last.truncate(kept);
        last.push_str(ELLIPSIS);
    }
    lines
}
