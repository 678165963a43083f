//! Shared key generation for stored documents.

use uuid::Uuid;

/// Replace anything outside `[A-Za-z0-9_-]` so ids cannot introduce path segments.
fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Generate a fresh key for an uploaded PDF: `documents/{parcel_id}/{document_type}_{id8}.pdf`.
pub fn document_storage_key(parcel_id: &str, document_type: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!(
        "documents/{}/{}_{}.pdf",
        sanitize_segment(parcel_id),
        sanitize_segment(document_type),
        &id[..8]
    )
}
