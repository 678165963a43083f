//! Official document records attached to a parcel.
//!
//! Stored data written by older releases keeps a single record per document type
//! instead of a list. [`OfficialDocuments`] collapses that shape while deserializing,
//! so the rest of the code only ever sees a non-empty ordered list per type.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Deed ("arrêté de concession définitive").
pub const DOCUMENT_TYPE_ACD: &str = "acd";
/// Cadastral plan.
pub const DOCUMENT_TYPE_PLAN: &str = "plan";
pub const DOCUMENT_TYPE_TITRE_FONCIER: &str = "titre_foncier";
pub const DOCUMENT_TYPE_EXTRAIT_CADASTRAL: &str = "extrait_cadastral";

/// Document types a specimen can be generated for when nothing was uploaded.
pub const PLACEHOLDER_DOCUMENT_TYPES: [&str; 2] = [DOCUMENT_TYPE_ACD, DOCUMENT_TYPE_PLAN];

/// Human label shown to clients and written to the audit log.
pub fn document_label(document_type: &str) -> String {
    match document_type {
        DOCUMENT_TYPE_ACD => "Arrêté de Concession Définitive (ACD)".to_string(),
        DOCUMENT_TYPE_PLAN => "Plan cadastral / Bornage".to_string(),
        DOCUMENT_TYPE_TITRE_FONCIER => "Titre Foncier".to_string(),
        DOCUMENT_TYPE_EXTRAIT_CADASTRAL => "Extrait cadastral".to_string(),
        other => other.to_uppercase(),
    }
}

pub fn has_placeholder(document_type: &str) -> bool {
    PLACEHOLDER_DOCUMENT_TYPES.contains(&document_type)
}

/// Document type tags end up in storage keys and file names.
pub fn is_valid_document_type(document_type: &str) -> bool {
    !document_type.is_empty()
        && document_type.len() <= 64
        && document_type
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// One uploaded file for a document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentFile {
    #[serde(default = "new_record_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub document_type: String,
    /// Storage key of the stored PDF.
    #[serde(alias = "filename")]
    pub stored_path: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default, deserialize_with = "deserialize_lenient_timestamp")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339 or a naive ISO timestamp (taken as UTC); anything else becomes `None`.
fn deserialize_lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }))
}

/// Which uploaded file counts as "current" when several exist for one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Position 0 of the list, i.e. the earliest upload still present.
    FirstUploaded,
    /// The entry with the newest `uploaded_at`; ties and missing timestamps fall back to list order.
    MostRecent,
}

/// Policy the document resolver applies.
pub const CURRENT_SELECTION_POLICY: SelectionPolicy = SelectionPolicy::FirstUploaded;

impl SelectionPolicy {
    pub fn select<'a>(&self, files: &'a [DocumentFile]) -> Option<&'a DocumentFile> {
        match self {
            SelectionPolicy::FirstUploaded => files.first(),
            SelectionPolicy::MostRecent => files
                .iter()
                .enumerate()
                .max_by_key(|(idx, f)| (f.uploaded_at, *idx))
                .map(|(_, f)| f),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredDocuments {
    Many(Vec<DocumentFile>),
    One(DocumentFile),
}

/// Document type tag to its uploaded files, newest appended last.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OfficialDocuments(BTreeMap<String, Vec<DocumentFile>>);

impl<'de> Deserialize<'de> for OfficialDocuments {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<BTreeMap<String, StoredDocuments>> = Option::deserialize(deserializer)?;
        let map = raw
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(doc_type, stored)| {
                let files = match stored {
                    StoredDocuments::Many(files) => files,
                    StoredDocuments::One(file) => vec![file],
                };
                (!files.is_empty()).then_some((doc_type, files))
            })
            .collect();
        Ok(OfficialDocuments(map))
    }
}

impl OfficialDocuments {
    pub fn files(&self, document_type: &str) -> &[DocumentFile] {
        self.0
            .get(document_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn current(&self, document_type: &str, policy: SelectionPolicy) -> Option<&DocumentFile> {
        policy.select(self.files(document_type))
    }

    pub fn push(&mut self, file: DocumentFile) {
        self.0
            .entry(file.document_type.clone())
            .or_default()
            .push(file);
    }

    /// Remove one record by id, or every record of the type when `document_id` is `None`.
    /// Returns what was removed; an emptied type key is dropped.
    pub fn remove(&mut self, document_type: &str, document_id: Option<&str>) -> Vec<DocumentFile> {
        let Some(files) = self.0.get_mut(document_type) else {
            return Vec::new();
        };
        let removed = match document_id {
            Some(id) => {
                let (removed, kept): (Vec<_>, Vec<_>) =
                    std::mem::take(files).into_iter().partition(|f| f.id == id);
                *files = kept;
                removed
            }
            None => std::mem::take(files),
        };
        if files.is_empty() {
            self.0.remove(document_type);
        }
        removed
    }

    pub fn document_types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
