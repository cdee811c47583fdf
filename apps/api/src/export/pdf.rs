//! Single-page PDF writer: the bitmap as a full-page image XObject with the
//! frame's text runs drawn on top as Helvetica.
//!
//! The snapshot is hybrid. Boxes, badges, avatars, images and the QR code are
//! pixels; text is a vector layer placed at the same coordinates, so no font
//! file is embedded and the text stays selectable. Text positions come from the
//! same metric tables the flow used, so the layers line up.

use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::export::ExportError;
use crate::layout::font_metrics::FontFace;
use crate::layout::{Frame, Paint};

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";
const IMAGE_NAME: &str = "Im1";

/// Builds the PDF. The page measures exactly `bitmap` pixels, one PDF unit
/// per pixel; frame coordinates are multiplied by `scale`.
pub fn write_pdf(frame: &Frame, bitmap: &RgbImage, scale: f32) -> Result<Vec<u8>, ExportError> {
    let (width, height) = bitmap.dimensions();
    let page_w = width as f32;
    let page_h = height as f32;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_dictionary(FontFace::Helvetica));
    let bold_id = doc.add_object(font_dictionary(FontFace::HelveticaBold));

    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        bitmap.as_raw().clone(),
    );
    let image_id = doc.add_object(image);

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR_FONT => regular_id,
            BOLD_FONT => bold_id,
        },
        "XObject" => dictionary! {
            IMAGE_NAME => image_id,
        },
    });

    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                page_w.into(),
                0.into(),
                0.into(),
                page_h.into(),
                0.into(),
                0.into(),
            ],
        ),
        Operation::new("Do", vec![IMAGE_NAME.into()]),
        Operation::new("Q", vec![]),
    ];
    operations.extend(text_operations(frame, scale, page_h));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().map_err(|e| ExportError::Pdf(e.to_string()))?,
    ));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), page_w.into(), page_h.into()],
        "Contents" => content_id,
        "Resources" => resources_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    Ok(bytes)
}

fn font_dictionary(face: FontFace) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => face.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

fn text_operations(frame: &Frame, scale: f32, page_h: f32) -> Vec<Operation> {
    let mut ops = Vec::new();
    for op in &frame.ops {
        let Paint::Text {
            x,
            baseline,
            size,
            bold,
            color,
            text,
        } = op
        else {
            continue;
        };
        let [r, g, b] = color.to_unit_rgb();
        let font = if *bold { BOLD_FONT } else { REGULAR_FONT };
        ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), (size * scale).into()]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new(
                "Tm",
                vec![
                    1.into(),
                    0.into(),
                    0.into(),
                    1.into(),
                    (x * scale).into(),
                    (page_h - baseline * scale).into(),
                ],
            ),
            Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]),
            Operation::new("ET", vec![]),
        ]);
    }
    ops
}

/// Encodes text for the standard fonts' WinAnsiEncoding; unmappable
/// characters become `?`.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{00A0}'..='\u{00FF}' => c as u32 as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            'œ' => 0x9C,
            'Œ' => 0x8C,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Rgba;
    use image::Rgb;

    #[test]
    fn test_win_ansi_maps_latin1_and_quotes() {
        assert_eq!(win_ansi("Créatif"), b"Cr\xe9atif".to_vec());
        assert_eq!(win_ansi("l’outil"), b"l\x92outil".to_vec());
        assert_eq!(win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn test_pdf_page_matches_bitmap_and_contains_text() {
        let frame = Frame {
            width: 50.0,
            height: 20.0,
            ops: vec![Paint::Text {
                x: 2.0,
                baseline: 15.0,
                size: 14.0,
                bold: true,
                color: Rgba::BLACK,
                text: "Jean Dupont".into(),
            }],
        };
        let bitmap = RgbImage::from_pixel(100, 40, Rgb([255, 255, 255]));
        let bytes = write_pdf(&frame, &bitmap, 2.0).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();

        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        assert!(content.operations.iter().any(|op| op.operator == "Tj"
            && op.operands[0].as_str().map(|s| s == b"Jean Dupont").unwrap_or(false)));

        let number = |o: &Object| match o {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r as f32,
            _ => f32::NAN,
        };
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(number(&media_box[2]), 100.0);
        assert_eq!(number(&media_box[3]), 40.0);
    }
}
