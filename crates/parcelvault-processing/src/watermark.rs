//! Per-recipient provenance stamp.
//!
//! Every page gets a large 45° block naming the recipient and the access code
//! across its center, drawn under a low-opacity graphics state, plus small corner
//! annotations and a confidentiality line. The page's own content is wrapped in
//! `q`/`Q` untouched, so text extraction and the original drawing are preserved.
//! The input bytes are never modified; each call produces a fresh copy.

use std::f32::consts::FRAC_1_SQRT_2;

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::ProcessingError;
use crate::format_stamp_time;
use crate::pdf::{
    fill_rgb, inherited_attribute, media_box, name, op, page_contents, real, resolve_dict,
    standard_font, text_at, text_operations, text_width,
};

// Resource names chosen so they cannot plausibly clash with the page's own.
const FONT_BOLD: &str = "PVWmBold";
const FONT_REGULAR: &str = "PVWmReg";
const GRAPHICS_STATE: &str = "PVWmGs";

const DIAGONAL_FONT_SIZE: f32 = 40.0;
const DIAGONAL_SUBLINE_SIZE: f32 = 16.0;
const CORNER_FONT_SIZE: f32 = 8.0;
const MARGIN: f32 = 18.0;

pub const LEGAL_NOTICE: &str = "Ce document est strictement confidentiel - Reproduction interdite";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkConfig {
    /// Fill opacity of the diagonal block, 0 exclusive to 1.
    pub opacity: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self { opacity: 0.15 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Watermarker {
    config: WatermarkConfig,
}

struct StampResources {
    bold: ObjectId,
    regular: ObjectId,
    graphics_state: ObjectId,
}

impl Watermarker {
    pub fn new(config: WatermarkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WatermarkConfig {
        &self.config
    }

    /// Stamp every page of `pdf` for `client_name` / `code`.
    ///
    /// The output has exactly as many pages as the input.
    pub fn stamp(
        &self,
        pdf: &[u8],
        client_name: &str,
        code: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<Vec<u8>, ProcessingError> {
        let mut doc = Document::load_mem(pdf)?;
        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(ProcessingError::NoPages);
        }

        let opacity = self.config.opacity.clamp(0.01, 1.0);
        let resources = StampResources {
            bold: doc.add_object(standard_font("Helvetica-Bold")),
            regular: doc.add_object(standard_font("Helvetica")),
            graphics_state: doc.add_object(dictionary! {
                "Type" => "ExtGState",
                "ca" => real(opacity),
                "CA" => real(opacity),
            }),
        };
        let save_state = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let stamped_at = format_stamp_time(issued_at);

        for (_page_number, page_id) in pages.iter() {
            let page_id = *page_id;
            let bounds = media_box(&doc, page_id);
            let page_resources = stamp_resources(&doc, page_id, &resources);
            let existing = page_contents(&doc, page_id);

            let mut operations = vec![op("Q")];
            operations.extend(self.diagonal_block(bounds, client_name, code, &stamped_at));
            operations.extend(self.annotations(bounds, client_name, code, &stamped_at));
            let stamp = Content { operations }.encode()?;
            let stamp_id = doc.add_object(Stream::new(Dictionary::new(), stamp));

            let mut contents = Vec::with_capacity(existing.len() + 2);
            contents.push(Object::Reference(save_state));
            contents.extend(existing);
            contents.push(Object::Reference(stamp_id));

            let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
            page.set("Resources", page_resources);
            page.set("Contents", contents);
        }

        let mut out = Vec::with_capacity(pdf.len() + 4096);
        doc.save_to(&mut out)?;

        tracing::debug!(
            pages = pages.len(),
            input_bytes = pdf.len(),
            output_bytes = out.len(),
            "Watermark applied"
        );
        Ok(out)
    }

    fn diagonal_block(
        &self,
        [x0, y0, x1, y1]: [f32; 4],
        client_name: &str,
        code: &str,
        stamped_at: &str,
    ) -> Vec<Operation> {
        let headline = format!("Document préparé pour {}", client_name);
        let subline = format!("Code: {} - {}", code, stamped_at);

        // Shrink long names so the block stays on the page diagonal.
        let diagonal = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt() * 0.8;
        let natural = text_width(&headline, DIAGONAL_FONT_SIZE, true);
        let size = if natural > diagonal {
            DIAGONAL_FONT_SIZE * diagonal / natural
        } else {
            DIAGONAL_FONT_SIZE
        };
        let sub_size = DIAGONAL_SUBLINE_SIZE.min(size);

        let (cos, sin) = (FRAC_1_SQRT_2, FRAC_1_SQRT_2);
        let (cx, cy) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
        let headline_w = text_width(&headline, size, true);
        let subline_w = text_width(&subline, sub_size, false);
        let gap = sub_size * 0.6;

        // Origin = center - half width along the baseline, shifted along the normal.
        let origin = |width: f32, normal_offset: f32| {
            (
                cx - width / 2.0 * cos - normal_offset * sin,
                cy - width / 2.0 * sin + normal_offset * cos,
            )
        };
        let (hx, hy) = origin(headline_w, gap);
        let (sx, sy) = origin(subline_w, -(gap + sub_size));

        let mut ops = vec![
            op("q"),
            Operation::new("gs", vec![name(GRAPHICS_STATE)]),
            fill_rgb(0.45, 0.45, 0.45),
        ];
        ops.extend(text_operations(
            FONT_BOLD,
            size,
            [cos, sin, -sin, cos, hx, hy],
            &headline,
        ));
        ops.extend(text_operations(
            FONT_REGULAR,
            sub_size,
            [cos, sin, -sin, cos, sx, sy],
            &subline,
        ));
        ops.push(op("Q"));
        ops
    }

    fn annotations(
        &self,
        [x0, y0, x1, y1]: [f32; 4],
        client_name: &str,
        code: &str,
        stamped_at: &str,
    ) -> Vec<Operation> {
        let top_left = format!("Confidentiel - {}", client_name);
        let bottom_right = format!("Code: {} - {}", code, stamped_at);
        let right_x = x1 - MARGIN - text_width(&bottom_right, CORNER_FONT_SIZE, false);
        let legal_x = (x0 + x1) / 2.0 - text_width(LEGAL_NOTICE, CORNER_FONT_SIZE - 1.0, false) / 2.0;

        let mut ops = vec![op("q"), fill_rgb(0.35, 0.35, 0.35)];
        ops.extend(text_at(
            FONT_REGULAR,
            CORNER_FONT_SIZE,
            x0 + MARGIN,
            y1 - MARGIN - CORNER_FONT_SIZE,
            &top_left,
        ));
        ops.extend(text_at(
            FONT_REGULAR,
            CORNER_FONT_SIZE,
            right_x.max(x0 + MARGIN),
            y0 + MARGIN + CORNER_FONT_SIZE,
            &bottom_right,
        ));
        ops.extend(text_at(
            FONT_REGULAR,
            CORNER_FONT_SIZE - 1.0,
            legal_x.max(x0 + MARGIN),
            y0 + MARGIN / 2.0,
            LEGAL_NOTICE,
        ));
        ops.push(op("Q"));
        ops
    }
}

/// The page's effective resources, copied inline, with the stamp fonts and
/// graphics state added.
fn stamp_resources(doc: &Document, page_id: ObjectId, stamp: &StampResources) -> Dictionary {
    let mut resources = inherited_attribute(doc, page_id, b"Resources")
        .and_then(|obj| obj.as_dict().ok().cloned())
        .unwrap_or_else(Dictionary::new);

    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
        .unwrap_or_else(Dictionary::new);
    fonts.set(FONT_BOLD, Object::Reference(stamp.bold));
    fonts.set(FONT_REGULAR, Object::Reference(stamp.regular));
    resources.set("Font", fonts);

    let mut states = resources
        .get(b"ExtGState")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
        .unwrap_or_else(Dictionary::new);
    states.set(GRAPHICS_STATE, Object::Reference(stamp.graphics_state));
    resources.set("ExtGState", states);

    resources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_count;
    use chrono::TimeZone;

    /// Minimal document with `pages` pages, each drawing one line of text.
    fn sample_pdf(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(standard_font("Courier"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let kids: Vec<Object> = (0..pages)
            .map(|i| {
                let content = Content {
                    operations: text_at("F1", 12.0, 72.0, 700.0, &format!("Original page {}", i + 1)),
                };
                let content_id =
                    doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                })
                .into()
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    fn page_text(pdf: &[u8], page: u32) -> String {
        let doc = Document::load_mem(pdf).unwrap();
        let page_id = doc.get_pages()[&page];
        let bytes = doc.get_page_content(page_id).unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn test_page_count_preserved() {
        let watermarker = Watermarker::default();
        for pages in [1, 3] {
            let input = sample_pdf(pages);
            let output = watermarker
                .stamp(&input, "Jean Dupont", "DJ9MFX7J", issued_at())
                .unwrap();
            assert_eq!(page_count(&output).unwrap(), pages);
        }
    }

    #[test]
    fn test_every_page_carries_recipient_and_code() {
        let output = Watermarker::default()
            .stamp(&sample_pdf(2), "Jean Dupont", "DJ9MFX7J", issued_at())
            .unwrap();
        for page in 1..=2 {
            let text = page_text(&output, page);
            assert!(text.contains("Jean Dupont"));
            assert!(text.contains("Code: DJ9MFX7J - 14/03/2026 09:30"));
            assert!(text.contains("Confidentiel - Jean Dupont"));
            assert!(text.contains(&format!("Original page {}", page)));
            assert!(text.contains("/PVWmGs gs"));
        }
    }

    #[test]
    fn test_original_bytes_untouched_and_stamp_is_repeatable() {
        let input = sample_pdf(1);
        let copy = input.clone();
        let watermarker = Watermarker::default();
        let a = watermarker.stamp(&input, "A", "AAAAAAAA", issued_at()).unwrap();
        let b = watermarker.stamp(&input, "A", "AAAAAAAA", issued_at()).unwrap();
        assert_eq!(input, copy);
        assert_eq!(a, b);
    }

    #[test]
    fn test_opacity_applied() {
        let output = Watermarker::new(WatermarkConfig { opacity: 0.1 })
            .stamp(&sample_pdf(1), "A", "AAAAAAAA", issued_at())
            .unwrap();
        let doc = Document::load_mem(&output).unwrap();
        let found = doc.objects.values().any(|obj| {
            obj.as_dict()
                .ok()
                .and_then(|d| d.get(b"ca").ok())
                .and_then(crate::pdf::as_number)
                .is_some_and(|ca| (ca - 0.1).abs() < 1e-6)
        });
        assert!(found);
    }

    #[test]
    fn test_garbage_input_is_an_error() {
        let result = Watermarker::default().stamp(b"not a pdf", "A", "AAAAAAAA", issued_at());
        assert!(result.is_err());
    }
}
