//! Specimen documents.
//!
//! When a parcel has no uploaded file for a deed or a cadastral plan, the release
//! pipeline serves a generated single-page stand-in instead. Every specimen carries
//! a large `SPECIMEN` mark and a "no legal value" notice so it can never pass for
//! an original.

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use parcelvault_core::models::{DOCUMENT_TYPE_ACD, DOCUMENT_TYPE_PLAN};

use crate::error::ProcessingError;
use crate::pdf::{
    fill_rgb, line, op, real, rect, standard_font, stroke_rgb, text_at, text_operations, text_width,
    DEFAULT_MEDIA_BOX,
};
use crate::format_stamp_time;

pub const SPECIMEN_MARK: &str = "SPECIMEN";
const NO_LEGAL_VALUE: &str = "Document de démonstration - sans valeur juridique";

const FONT_BOLD: &str = "F1";
const FONT_REGULAR: &str = "F2";

const ACD_GREEN: (f32, f32, f32) = (0.06, 0.45, 0.31);

/// What a specimen shows about its parcel and recipient.
#[derive(Debug, Clone)]
pub struct PlaceholderContext {
    pub parcel_name: String,
    pub reference: String,
    pub superficie: f64,
    pub unite_superficie: String,
    pub commune: String,
    /// `[lon, lat]` outline; drawn on the plan when it has at least three points.
    pub coordinates: Vec<[f64; 2]>,
    pub code: Option<String>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderGenerator;

impl PlaceholderGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn supports(&self, document_type: &str) -> bool {
        matches!(document_type, DOCUMENT_TYPE_ACD | DOCUMENT_TYPE_PLAN)
    }

    pub fn generate(
        &self,
        document_type: &str,
        ctx: &PlaceholderContext,
    ) -> Result<Vec<u8>, ProcessingError> {
        let operations = match document_type {
            DOCUMENT_TYPE_ACD => acd_page(ctx),
            DOCUMENT_TYPE_PLAN => plan_page(ctx),
            other => return Err(ProcessingError::UnsupportedDocumentType(other.to_string())),
        };
        let pdf = single_page_pdf(operations)?;
        tracing::debug!(
            document_type,
            parcel = %ctx.parcel_name,
            bytes = pdf.len(),
            "Specimen document generated"
        );
        Ok(pdf)
    }
}

fn single_page_pdf(operations: Vec<Operation>) -> Result<Vec<u8>, ProcessingError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let bold_id = doc.add_object(standard_font("Helvetica-Bold"));
    let regular_id = doc.add_object(standard_font("Helvetica"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_BOLD => bold_id,
            FONT_REGULAR => regular_id,
        },
    });

    let content = Content { operations }.encode()?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });

    let [x0, y0, x1, y1] = DEFAULT_MEDIA_BOX;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![real(x0), real(y0), real(x1), real(y1)],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

fn centered(font: &str, size: f32, y: f32, text: &str, bold: bool) -> Vec<Operation> {
    let [x0, _, x1, _] = DEFAULT_MEDIA_BOX;
    let x = (x0 + x1) / 2.0 - text_width(text, size, bold) / 2.0;
    text_at(font, size, x, y, text)
}

/// Trailing zeros dropped: 2.50 -> "2.5", 3.00 -> "3".
fn format_surface(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn specimen_mark() -> Vec<Operation> {
    let [x0, y0, x1, y1] = DEFAULT_MEDIA_BOX;
    let size = 90.0;
    let (c, s) = (std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2);
    let half = text_width(SPECIMEN_MARK, size, true) / 2.0;
    let (cx, cy) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);

    let mut ops = vec![op("q"), fill_rgb(0.93, 0.78, 0.78)];
    ops.extend(text_operations(
        FONT_BOLD,
        size,
        [c, s, -s, c, cx - half * c, cy - half * s],
        SPECIMEN_MARK,
    ));
    ops.push(op("Q"));
    ops
}

fn footer(ctx: &PlaceholderContext) -> Vec<Operation> {
    let mut text = format!("Généré le {}", format_stamp_time(ctx.generated_at));
    if let Some(code) = &ctx.code {
        text.push_str(&format!(" - Code : {}", code));
    }
    let mut ops = vec![fill_rgb(0.4, 0.4, 0.4)];
    ops.extend(centered(FONT_REGULAR, 8.0, 40.0, &text, false));
    ops.extend(centered(FONT_REGULAR, 8.0, 28.0, NO_LEGAL_VALUE, false));
    ops
}

fn acd_page(ctx: &PlaceholderContext) -> Vec<Operation> {
    let (r, g, b) = ACD_GREEN;
    let mut ops = specimen_mark();

    // Header band
    ops.push(fill_rgb(r, g, b));
    ops.push(rect(0.0, 752.0, 595.0, 90.0));
    ops.push(op("f"));
    ops.push(fill_rgb(1.0, 1.0, 1.0));
    ops.extend(centered(FONT_REGULAR, 10.0, 815.0, "RÉPUBLIQUE DE CÔTE D'IVOIRE", false));
    ops.extend(centered(
        FONT_BOLD,
        20.0,
        775.0,
        "ARRÊTÉ DE CONCESSION DÉFINITIVE",
        true,
    ));

    ops.push(fill_rgb(0.1, 0.1, 0.1));
    let rows = [
        ("Parcelle", ctx.parcel_name.clone()),
        ("Référence", ctx.reference.clone()),
        (
            "Superficie",
            format!("{} {}", format_surface(ctx.superficie), ctx.unite_superficie),
        ),
        ("Commune", ctx.commune.clone()),
    ];
    let mut y = 680.0;
    for (label, value) in rows {
        ops.extend(text_at(FONT_BOLD, 12.0, 72.0, y, &format!("{} :", label)));
        ops.extend(text_at(FONT_REGULAR, 12.0, 180.0, y, &value));
        y -= 28.0;
    }

    ops.push(stroke_rgb(r, g, b));
    ops.extend(line(72.0, y - 10.0, 523.0, y - 10.0));
    ops.extend(text_at(
        FONT_REGULAR,
        10.0,
        72.0,
        y - 36.0,
        "Le présent document tient lieu de spécimen en attendant la numérisation de l'acte original.",
    ));

    ops.extend(footer(ctx));
    ops
}

/// Frame on the page the outline is fitted into.
const PLAN_FRAME: [f32; 4] = [60.0, 170.0, 535.0, 690.0];

fn plan_page(ctx: &PlaceholderContext) -> Vec<Operation> {
    let [fx0, fy0, fx1, fy1] = PLAN_FRAME;
    let mut ops = specimen_mark();

    ops.push(fill_rgb(0.1, 0.1, 0.1));
    ops.extend(centered(FONT_BOLD, 20.0, 780.0, "PLAN CADASTRAL", true));
    ops.extend(centered(
        FONT_REGULAR,
        12.0,
        755.0,
        &format!("Parcelle : {} - Ref: {}", ctx.parcel_name, ctx.reference),
        false,
    ));

    // Grid
    ops.push(op("q"));
    ops.push(stroke_rgb(0.85, 0.85, 0.85));
    ops.push(Operation::new("w", vec![real(0.5)]));
    let mut x = fx0;
    while x <= fx1 {
        ops.extend(line(x, fy0, x, fy1));
        x += 40.0;
    }
    let mut y = fy0;
    while y <= fy1 {
        ops.extend(line(fx0, y, fx1, y));
        y += 40.0;
    }
    ops.push(op("Q"));

    ops.push(stroke_rgb(0.2, 0.2, 0.2));
    ops.push(rect(fx0, fy0, fx1 - fx0, fy1 - fy0));
    ops.push(op("S"));

    // Outline
    ops.push(op("q"));
    ops.push(fill_rgb(0.80, 0.92, 0.85));
    ops.push(stroke_rgb(ACD_GREEN.0, ACD_GREEN.1, ACD_GREEN.2));
    ops.push(Operation::new("w", vec![real(2.0)]));
    let outline = fit_outline(&ctx.coordinates);
    for (i, (px, py)) in outline.iter().enumerate() {
        let operator = if i == 0 { "m" } else { "l" };
        ops.push(Operation::new(operator, vec![real(*px), real(*py)]));
    }
    ops.push(op("h"));
    ops.push(op("B"));
    ops.push(op("Q"));

    // North arrow
    ops.extend(line(fx1 - 25.0, fy1 - 45.0, fx1 - 25.0, fy1 - 15.0));
    ops.extend(text_at(FONT_BOLD, 12.0, fx1 - 29.0, fy1 - 60.0, "N"));

    ops.push(fill_rgb(0.1, 0.1, 0.1));
    ops.extend(text_at(
        FONT_BOLD,
        12.0,
        fx0,
        140.0,
        &format!(
            "Surface: {} {}",
            format_surface(ctx.superficie),
            ctx.unite_superficie
        ),
    ));
    ops.extend(text_at(FONT_REGULAR, 12.0, fx0, 120.0, "Échelle: 1/2000"));
    if !ctx.commune.is_empty() {
        ops.extend(text_at(
            FONT_REGULAR,
            12.0,
            fx0,
            100.0,
            &format!("Commune: {}", ctx.commune),
        ));
    }

    ops.extend(footer(ctx));
    ops
}

/// Scale the outline into the plan frame, keeping its aspect ratio. Degenerate or
/// missing outlines get a generic quadrilateral.
fn fit_outline(coordinates: &[[f64; 2]]) -> Vec<(f32, f32)> {
    let [fx0, fy0, fx1, fy1] = PLAN_FRAME;
    let fallback = vec![
        (fx0 + 110.0, fy0 + 120.0),
        (fx1 - 90.0, fy0 + 150.0),
        (fx1 - 120.0, fy1 - 110.0),
        (fx0 + 140.0, fy1 - 140.0),
    ];
    if coordinates.len() < 3 {
        return fallback;
    }

    let (min_x, max_x, min_y, max_y) = coordinates.iter().fold(
        (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
        |(min_x, max_x, min_y, max_y), &[x, y]| {
            (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
        },
    );
    let (dx, dy) = (max_x - min_x, max_y - min_y);
    if dx <= f64::EPSILON || dy <= f64::EPSILON {
        return fallback;
    }

    let frame_w = f64::from(fx1 - fx0);
    let frame_h = f64::from(fy1 - fy0);
    let scale = (frame_w / dx).min(frame_h / dy) * 0.8;
    let off_x = f64::from(fx0) + (frame_w - dx * scale) / 2.0;
    let off_y = f64::from(fy0) + (frame_h - dy * scale) / 2.0;

    coordinates
        .iter()
        .map(|&[x, y]| {
            (
                (off_x + (x - min_x) * scale) as f32,
                (off_y + (y - min_y) * scale) as f32,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_count;
    use chrono::TimeZone;

    fn ctx() -> PlaceholderContext {
        PlaceholderContext {
            parcel_name: "Parcelle A".to_string(),
            reference: "TF 223737".to_string(),
            superficie: 2.5,
            unite_superficie: "ha".to_string(),
            commune: "Songon".to_string(),
            coordinates: vec![[-4.0, 5.0], [-4.01, 5.0], [-4.01, 5.01], [-4.0, 5.01]],
            code: Some("DJ9MFX7J".to_string()),
            generated_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_acd_specimen() {
        let pdf = PlaceholderGenerator::new().generate("acd", &ctx()).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        assert_eq!(page_count(&pdf).unwrap(), 1);
        assert!(contains(&pdf, SPECIMEN_MARK.as_bytes()));
        assert!(contains(&pdf, b"TF 223737"));
        assert!(contains(&pdf, b"Code : DJ9MFX7J"));
    }

    #[test]
    fn test_plan_specimen_shows_surface() {
        let pdf = PlaceholderGenerator::new().generate("plan", &ctx()).unwrap();
        assert!(contains(&pdf, SPECIMEN_MARK.as_bytes()));
        assert!(contains(&pdf, b"PLAN CADASTRAL"));
        assert!(contains(&pdf, b"Surface: 2.5 ha"));
        assert!(contains(&pdf, b"Parcelle A - Ref: TF 223737"));
    }

    #[test]
    fn test_unsupported_type() {
        let generator = PlaceholderGenerator::new();
        assert!(!generator.supports("titre_foncier"));
        assert!(matches!(
            generator.generate("titre_foncier", &ctx()),
            Err(ProcessingError::UnsupportedDocumentType(_))
        ));
    }

    #[test]
    fn test_outline_fits_frame() {
        let [fx0, fy0, fx1, fy1] = PLAN_FRAME;
        for (x, y) in fit_outline(&ctx().coordinates) {
            assert!(x >= fx0 && x <= fx1);
            assert!(y >= fy0 && y <= fy1);
        }
        assert_eq!(fit_outline(&[]).len(), 4);
        assert_eq!(fit_outline(&[[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]]).len(), 4);
    }

    #[test]
    fn test_format_surface() {
        assert_eq!(format_surface(2.5), "2.5");
        assert_eq!(format_surface(3.0), "3");
        assert_eq!(format_surface(0.126), "0.13");
        assert_eq!(format_surface(0.0), "0");
    }
}
