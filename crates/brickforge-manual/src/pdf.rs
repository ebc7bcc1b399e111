//! PDF manual writer
//!
//! A4 portrait pages built directly with `lopdf`: a cover page, then one page
//! per step with a heading, a parts caption and the render embedded as JPEG.
//!
//! Page text uses the base-14 Helvetica font with `WinAnsiEncoding`, so text
//! is written as Windows-1252 bytes; characters outside that set print as `?`.

use crate::document::{ManualDocument, NumberedPage};
use crate::error::ManualResult;
use image::{DynamicImage, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A4 in points
const PAGE_WIDTH: f64 = 595.0;
const PAGE_HEIGHT: f64 = 842.0;
const MARGIN: f64 = 50.0;
/// Space reserved above the image for heading and caption
const HEADER_HEIGHT: f64 = 90.0;

/// Write `<dir>/<title>.pdf` and return its path
pub fn write_pdf(document: &ManualDocument, dir: &Path) -> ManualResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.pdf", document.title()));
    let mut pdf = build_pdf(document)?;
    pdf.save(&path)?;
    Ok(path)
}

/// Build the PDF in memory
pub fn build_pdf(document: &ManualDocument) -> ManualResult<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids: Vec<Object> = Vec::with_capacity(document.step_count() + 1);
    kids.push(cover_page(&mut doc, document, pages_id, font_id)?.into());
    for page in document.pages() {
        kids.push(step_page(&mut doc, &page, pages_id, font_id)?.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![int(0.0), int(0.0), int(PAGE_WIDTH), int(PAGE_HEIGHT)],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => text_string(document.title()),
        "Producer" => Object::string_literal(concat!("BrickForge ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Info", info_id);

    Ok(doc)
}

fn cover_page(
    doc: &mut Document,
    document: &ManualDocument,
    pages_id: ObjectId,
    font_id: ObjectId,
) -> ManualResult<ObjectId> {
    let lines = document.cover_lines();
    let mut operations = Vec::new();
    let mut y = PAGE_HEIGHT * 0.62;
    for (i, line) in lines.iter().enumerate() {
        let size = if i == 0 { 32.0 } else { 16.0 };
        operations.extend(text(line, MARGIN, y, size));
        y -= if i == 0 { 48.0 } else { 26.0 };
    }

    let content = Content { operations }.encode()?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    }))
}

fn step_page(
    doc: &mut Document,
    page: &NumberedPage<'_>,
    pages_id: ObjectId,
    font_id: ObjectId,
) -> ManualResult<ObjectId> {
    let mut operations = Vec::new();
    operations.extend(text(
        &page.heading(),
        MARGIN,
        PAGE_HEIGHT - MARGIN - 20.0,
        22.0,
    ));
    operations.extend(text(
        &page.caption(),
        MARGIN,
        PAGE_HEIGHT - MARGIN - 46.0,
        13.0,
    ));

    let mut resources = dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    };

    match embed_image(doc, &page.page.image_path) {
        Ok((image_id, width, height)) => {
            let (x, y, w, h) = fit_image(width, height);
            operations.extend([
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![int(w), int(0.0), int(0.0), int(h), int(x), int(y)],
                ),
                Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
                Operation::new("Q", vec![]),
            ]);
            resources.set("XObject", dictionary! { "Im1" => image_id });
        }
        Err(e) => warn!(
            "Step image {} not embedded: {}",
            page.page.image_path.display(),
            e
        ),
    }

    let content = Content { operations }.encode()?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources,
    }))
}

/// Re-encode an image as JPEG and add it as an image XObject
fn embed_image(doc: &mut Document, path: &Path) -> ManualResult<(ObjectId, u32, u32)> {
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(rgb).write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)?;

    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
            "Filter" => "DCTDecode",
        },
        jpeg,
    );
    stream.allows_compression = false;
    Ok((doc.add_object(stream), width, height))
}

/// Place a `width` x `height` image in the area below the header, keeping its
/// aspect ratio; returns `(x, y, w, h)` in points
fn fit_image(width: u32, height: u32) -> (f64, f64, f64, f64) {
    let box_w = PAGE_WIDTH - 2.0 * MARGIN;
    let box_h = PAGE_HEIGHT - 2.0 * MARGIN - HEADER_HEIGHT;
    if width == 0 || height == 0 {
        return (MARGIN, MARGIN, 0.0, 0.0);
    }
    let scale = (box_w / width as f64).min(box_h / height as f64);
    let w = width as f64 * scale;
    let h = height as f64 * scale;
    let x = MARGIN + (box_w - w) / 2.0;
    let y = MARGIN + (box_h - h);
    (x, y, w, h)
}

fn text(line: &str, x: f64, y: f64, size: f64) -> [Operation; 5] {
    [
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), int(size)]),
        Operation::new("Td", vec![int(x), int(y)]),
        Operation::new(
            "Tj",
            vec![Object::String(win_ansi(line), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// Encode `text` as Windows-1252 for a `WinAnsiEncoding` font
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
            _ => win_ansi_high(c).unwrap_or(b'?'),
        })
        .collect()
}

/// Characters Windows-1252 places in 0x80-0x9F
fn win_ansi_high(c: char) -> Option<u8> {
    let byte = match c {
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

/// Document information text string: UTF-16BE with a byte order mark
fn text_string(text: &str) -> Object {
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Integer PDF number; whole points are precise enough for layout
fn int(value: f64) -> Object {
    Object::Integer(value.round() as i64)
}
