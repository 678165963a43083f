//! Low-level helpers shared by the watermark and specimen writers.

use lopdf::content::Operation;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

/// A4 portrait, used when a page tree carries no MediaBox at all.
pub(crate) const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 595.0, 842.0];

/// Bound on Parent hops when looking up inherited page attributes.
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// Type1 standard font with the WinAnsi code page.
pub(crate) fn standard_font(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Encode text for a WinAnsi font. Characters outside the code page become `?`.
pub(crate) fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            'Œ' => 0x8c,
            'œ' => 0x9c,
            _ => b'?',
        })
        .collect()
}

/// Approximate Helvetica advance width, good enough for centering.
pub(crate) fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let em: f32 = text
        .chars()
        .map(|c| match c {
            ' ' => 0.278,
            'i' | 'j' | 'l' | 'I' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 0.28,
            'f' | 't' | 'r' | '(' | ')' | '-' | '/' => 0.34,
            'm' | 'w' => 0.85,
            'M' | 'W' => 0.9,
            '0'..='9' => 0.556,
            c if c.is_uppercase() => 0.70,
            _ => 0.556,
        })
        .sum();
    let weight = if bold { 1.06 } else { 1.0 };
    em * size * weight
}

pub(crate) fn real(value: f32) -> Object {
    Object::Real(value)
}

pub(crate) fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

pub(crate) fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Follow one level of indirection.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        direct => Some(direct),
    }
}

/// Owned copy of a dictionary that may be direct or referenced.
pub(crate) fn resolve_dict(doc: &Document, obj: &Object) -> Option<Dictionary> {
    resolve(doc, obj)?.as_dict().ok().cloned()
}

/// Page attribute lookup honoring inheritance through the page tree.
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return resolve(doc, value);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_object(parent).ok()?.as_dict().ok()?;
    }
    None
}

/// `[llx, lly, urx, ury]` of the page, normalized so `ll < ur`.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let parsed = inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|obj| obj.as_array().ok())
        .and_then(|arr| {
            let values: Vec<f32> = arr
                .iter()
                .filter_map(|o| resolve(doc, o).and_then(as_number))
                .collect();
            <[f32; 4]>::try_from(values).ok()
        });
    match parsed {
        Some([a, b, c, d]) if (c - a).abs() > 1.0 && (d - b).abs() > 1.0 => {
            [a.min(c), b.min(d), a.max(c), b.max(d)]
        }
        _ => DEFAULT_MEDIA_BOX,
    }
}

/// Content stream references of a page, flattened into one list.
pub(crate) fn page_contents(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    let Some(contents) = doc
        .get_object(page_id)
        .ok()
        .and_then(|page| page.as_dict().ok())
        .and_then(|page| page.get(b"Contents").ok())
    else {
        return Vec::new();
    };

    match contents {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            Ok(_) => vec![Object::Reference(*id)],
            Err(_) => Vec::new(),
        },
        Object::Array(items) => items.clone(),
        _ => Vec::new(),
    }
}

/// One line of text drawn with an arbitrary text matrix.
pub(crate) fn text_operations(font: &str, size: f32, matrix: [f32; 6], text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![name(font), real(size)]),
        Operation::new("Tm", matrix.iter().copied().map(real).collect()),
        Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]),
        Operation::new("ET", vec![]),
    ]
}

/// Horizontal text at `(x, y)`.
pub(crate) fn text_at(font: &str, size: f32, x: f32, y: f32, text: &str) -> Vec<Operation> {
    text_operations(font, size, [1.0, 0.0, 0.0, 1.0, x, y], text)
}

pub(crate) fn fill_rgb(r: f32, g: f32, b: f32) -> Operation {
    Operation::new("rg", vec![real(r), real(g), real(b)])
}

pub(crate) fn stroke_rgb(r: f32, g: f32, b: f32) -> Operation {
    Operation::new("RG", vec![real(r), real(g), real(b)])
}

pub(crate) fn rect(x: f32, y: f32, w: f32, h: f32) -> Operation {
    Operation::new("re", vec![real(x), real(y), real(w), real(h)])
}

pub(crate) fn line(x1: f32, y1: f32, x2: f32, y2: f32) -> Vec<Operation> {
    vec![
        Operation::new("m", vec![real(x1), real(y1)]),
        Operation::new("l", vec![real(x2), real(y2)]),
        Operation::new("S", vec![]),
    ]
}

pub(crate) fn op(operator: &str) -> Operation {
    Operation::new(operator, vec![])
}
