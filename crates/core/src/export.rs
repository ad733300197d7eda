//! Memory book PDF rendering.
//!
//! One A4 page per memory: a double border, the two-line title, the guest's
//! photo (if any), their name, the recap question, and the message in a
//! rounded box. Uses the standard Type1 Helvetica faces so no font files are
//! embedded.

use std::io::Cursor;

use image::ImageFormat;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::media::decode_data_url;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

const INCH: f32 = 72.0;
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;

const OUTER_MARGIN: f32 = 0.5 * INCH;
const INNER_MARGIN: f32 = 0.7 * INCH;

const TITLE: &str = "This is your page in";
const SUBTITLE: &str = "their book of memories.";
const TITLE_SIZE: f32 = 24.0;

const PHOTO_BOX: f32 = 2.5 * INCH;
const PHOTO_BOTTOM: f32 = PAGE_HEIGHT - 5.0 * INCH;
/// Longest edge, in pixels, of the embedded photo.
const PHOTO_MAX_PIXELS: u32 = 600;

const NAME_SIZE: f32 = 20.0;
const QUESTION_SIZE: f32 = 14.0;

const BOX_WIDTH: f32 = 5.0 * INCH;
const BOX_HEIGHT: f32 = 2.5 * INCH;
const BOX_BOTTOM: f32 = PAGE_HEIGHT - 9.0 * INCH;
const BOX_RADIUS: f32 = 10.0;
const BOX_PADDING: f32 = 20.0;

const MESSAGE_SIZE: f32 = 12.0;
const MESSAGE_LEADING: f32 = 18.0;
/// Lines beyond this are dropped.
pub const MAX_MESSAGE_LINES: usize = 10;

const INK: [f32; 3] = [0.11, 0.1, 0.09];
const BORDER: [f32; 3] = [0.9, 0.89, 0.88];
const BOX_FILL: [f32; 3] = [0.96, 0.96, 0.95];

const EMPTY_BOOK_TEXT: &str = "No memories yet.";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("PDF rendering failed: {0}")]
    Render(String),
}

impl From<lopdf::Error> for ExportError {
    fn from(err: lopdf::Error) -> Self {
        Self::Render(err.to_string())
    }
}

/// Everything printed on one memory's page.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    pub guest_name: String,
    /// `data:image/...` URL. Remote links are not fetched.
    pub photo: Option<String>,
    pub question: String,
    pub message: String,
}

#[derive(Clone, Copy)]
enum Face {
    Regular,
    Bold,
    Oblique,
}

impl Face {
    fn resource_name(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
            Self::Oblique => "F3",
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Download filename for a couple's memory book.
///
/// Only ASCII letters, digits, `.`, `-` and `_` survive; anything else
/// becomes `_` so the name is always safe inside a quoted
/// `Content-Disposition` header.
pub fn export_filename(couple_names: &str) -> String {
    let stem: String = couple_names
        .replace('&', "and")
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    format!("memora_{stem}.pdf")
}

/// Render the memory book. An empty list yields a single placeholder page.
pub fn render_memory_book(pages: &[MemoryPage]) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let fonts = font_resources(&mut doc);

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len().max(1));
    if pages.is_empty() {
        let content = empty_page_content();
        kids.push(add_page(&mut doc, pages_id, &fonts, None, content)?.into());
    }
    for page in pages {
        let photo = page.photo.as_deref().and_then(|p| embed_photo(&mut doc, p));
        let content = memory_page_content(page, photo.as_ref().map(|p| p.placement));
        let xobject = photo.map(|p| p.id);
        kids.push(add_page(&mut doc, pages_id, &fonts, xobject, content)?.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ExportError::Render(e.to_string()))?;
    Ok(out)
}

/// Greedy word wrap by measured width. Words wider than the line stay whole.
pub fn wrap_message(message: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in message.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, Face::Regular, size) < max_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ---------------------------------------------------------------------------
// Page assembly
// ---------------------------------------------------------------------------

fn font_resources(doc: &mut Document) -> Dictionary {
    let mut fonts = Dictionary::new();
    for (face, base) in [
        (Face::Regular, "Helvetica"),
        (Face::Bold, "Helvetica-Bold"),
        (Face::Oblique, "Helvetica-Oblique"),
    ] {
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base,
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), id);
    }
    fonts
}

fn add_page(
    doc: &mut Document,
    parent: ObjectId,
    fonts: &Dictionary,
    photo: Option<ObjectId>,
    content: Content,
) -> Result<ObjectId, ExportError> {
    let mut resources = dictionary! { "Font" => fonts.clone() };
    if let Some(id) = photo {
        resources.set("XObject", dictionary! { "Im1" => id });
    }
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "Contents" => content_id,
        "Resources" => resources,
    }))
}

fn empty_page_content() -> Content {
    let mut ops = borders();
    centered_text(&mut ops, TITLE, Face::Bold, TITLE_SIZE, PAGE_HEIGHT - 1.5 * INCH);
    centered_text(&mut ops, SUBTITLE, Face::Bold, TITLE_SIZE, PAGE_HEIGHT - 2.0 * INCH);
    centered_text(&mut ops, EMPTY_BOOK_TEXT, Face::Oblique, QUESTION_SIZE, PAGE_HEIGHT / 2.0);
    Content { operations: ops }
}

fn memory_page_content(page: &MemoryPage, photo: Option<Placement>) -> Content {
    let mut ops = borders();

    centered_text(&mut ops, TITLE, Face::Bold, TITLE_SIZE, PAGE_HEIGHT - 1.5 * INCH);
    centered_text(&mut ops, SUBTITLE, Face::Bold, TITLE_SIZE, PAGE_HEIGHT - 2.0 * INCH);

    if let Some(p) = photo {
        ops.push(op("q", vec![]));
        ops.push(op(
            "cm",
            vec![real(p.width), real(0.0), real(0.0), real(p.height), real(p.x), real(p.y)],
        ));
        ops.push(op("Do", vec![Object::Name(b"Im1".to_vec())]));
        ops.push(op("Q", vec![]));
    }

    let name = if page.guest_name.trim().is_empty() { "Guest" } else { page.guest_name.as_str() };
    centered_text(&mut ops, name, Face::Bold, NAME_SIZE, PAGE_HEIGHT - 5.5 * INCH);
    centered_text(&mut ops, &page.question, Face::Oblique, QUESTION_SIZE, PAGE_HEIGHT - 6.2 * INCH);

    let box_x = (PAGE_WIDTH - BOX_WIDTH) / 2.0;
    ops.push(fill_color(BOX_FILL));
    rounded_rect(&mut ops, box_x, BOX_BOTTOM, BOX_WIDTH, BOX_HEIGHT, BOX_RADIUS);
    ops.push(op("f", vec![]));

    let lines = wrap_message(&page.message, MESSAGE_SIZE, BOX_WIDTH - 2.0 * BOX_PADDING);
    let mut y = BOX_BOTTOM + BOX_HEIGHT - 30.0;
    for line in lines.iter().take(MAX_MESSAGE_LINES) {
        text_at(&mut ops, line, Face::Regular, MESSAGE_SIZE, box_x + BOX_PADDING, y);
        y -= MESSAGE_LEADING;
    }

    Content { operations: ops }
}

fn borders() -> Vec<Operation> {
    let mut ops = vec![
        op("RG", BORDER.iter().map(|c| real(*c)).collect()),
        op("w", vec![real(2.0)]),
    ];
    ops.push(rect(OUTER_MARGIN));
    ops.push(op("S", vec![]));
    ops.push(op("w", vec![real(0.5)]));
    ops.push(rect(INNER_MARGIN));
    ops.push(op("S", vec![]));
    ops
}

fn rect(margin: f32) -> Operation {
    op(
        "re",
        vec![
            real(margin),
            real(margin),
            real(PAGE_WIDTH - 2.0 * margin),
            real(PAGE_HEIGHT - 2.0 * margin),
        ],
    )
}

fn rounded_rect(ops: &mut Vec<Operation>, x: f32, y: f32, w: f32, h: f32, r: f32) {
    // Bezier control offset for a quarter circle.
    let k = r * 0.552_284_8;
    let (x1, y1) = (x + w, y + h);
    ops.push(op("m", vec![real(x + r), real(y)]));
    ops.push(op("l", vec![real(x1 - r), real(y)]));
    ops.push(curve(x1 - r + k, y, x1, y + r - k, x1, y + r));
    ops.push(op("l", vec![real(x1), real(y1 - r)]));
    ops.push(curve(x1, y1 - r + k, x1 - r + k, y1, x1 - r, y1));
    ops.push(op("l", vec![real(x + r), real(y1)]));
    ops.push(curve(x + r - k, y1, x, y1 - r + k, x, y1 - r));
    ops.push(op("l", vec![real(x), real(y + r)]));
    ops.push(curve(x, y + r - k, x + r - k, y, x + r, y));
    ops.push(op("h", vec![]));
}

fn curve(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Operation {
    op("c", vec![real(a), real(b), real(c), real(d), real(e), real(f)])
}

fn centered_text(ops: &mut Vec<Operation>, text: &str, face: Face, size: f32, y: f32) {
    let x = (PAGE_WIDTH - text_width(text, face, size)) / 2.0;
    text_at(ops, text, face, size, x, y);
}

fn text_at(ops: &mut Vec<Operation>, text: &str, face: Face, size: f32, x: f32, y: f32) {
    ops.push(fill_color(INK));
    ops.push(op("BT", vec![]));
    ops.push(op(
        "Tf",
        vec![Object::Name(face.resource_name().as_bytes().to_vec()), real(size)],
    ));
    ops.push(op("Td", vec![real(x), real(y)]));
    ops.push(op(
        "Tj",
        vec![Object::String(win_ansi(text), StringFormat::Literal)],
    ));
    ops.push(op("ET", vec![]));
}

fn fill_color(rgb: [f32; 3]) -> Operation {
    op("rg", rgb.iter().map(|c| real(*c)).collect())
}

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

// ---------------------------------------------------------------------------
// Photos
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
struct Placement {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

struct EmbeddedPhoto {
    id: ObjectId,
    placement: Placement,
}

/// Decode, downscale, and embed a photo as a JPEG XObject.
///
/// Failures are logged and the page is rendered without the photo.
fn embed_photo(doc: &mut Document, photo: &str) -> Option<EmbeddedPhoto> {
    if !photo.starts_with("data:") {
        tracing::warn!("Skipping non-embedded photo in export");
        return None;
    }
    let decoded = match decode_data_url(photo) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping undecodable photo in export");
            return None;
        }
    };
    let img = match image::load_from_memory(&decoded.bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping unreadable photo in export");
            return None;
        }
    };

    let rgb = image::DynamicImage::ImageRgb8(
        img.thumbnail(PHOTO_MAX_PIXELS, PHOTO_MAX_PIXELS).to_rgb8(),
    );
    let (w, h) = (rgb.width(), rgb.height());
    if w == 0 || h == 0 {
        return None;
    }
    let mut jpeg = Cursor::new(Vec::new());
    if let Err(e) = rgb.write_to(&mut jpeg, ImageFormat::Jpeg) {
        tracing::warn!(error = %e, "Skipping photo that failed to re-encode");
        return None;
    }

    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => w as i64,
            "Height" => h as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
            "Filter" => "DCTDecode",
        },
        jpeg.into_inner(),
    )
    .with_compression(false);
    let id = doc.add_object(stream);

    // Fit inside the square photo box, keeping the aspect ratio.
    let scale = (PHOTO_BOX / w as f32).min(PHOTO_BOX / h as f32);
    let (width, height) = (w as f32 * scale, h as f32 * scale);
    Some(EmbeddedPhoto {
        id,
        placement: Placement {
            x: (PAGE_WIDTH - width) / 2.0,
            y: PHOTO_BOTTOM + (PHOTO_BOX - height) / 2.0,
            width,
            height,
        },
    })
}

// ---------------------------------------------------------------------------
// Text metrics
// ---------------------------------------------------------------------------

/// Helvetica advance widths (1/1000 em) for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

const DEFAULT_GLYPH_WIDTH: u16 = 556;

fn text_width(text: &str, face: Face, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' '..='~' => HELVETICA_WIDTHS[(c as usize) - 32] as u32,
            _ => DEFAULT_GLYPH_WIDTH as u32,
        })
        .sum();
    let bold = match face {
        Face::Bold => 1.06,
        _ => 1.0,
    };
    units as f32 * size * bold / 1000.0
}

/// Encode for the standard fonts' WinAnsi (cp1252) encoding. Anything the
/// encoding cannot represent becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match u32::from(c) {
        0x00..=0x7F | 0xA0..=0xFF => u32::from(c) as u8,
        _ => WIN_ANSI_EXTRAS
            .iter()
            .find(|(ch, _)| *ch == c)
            .map_or(b'?', |(_, byte)| *byte),
    }
}

/// cp1252 bytes 0x80..=0x9F, which differ from Latin-1.
const WIN_ANSI_EXTRAS: [(char, u8); 27] = [
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];
