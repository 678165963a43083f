use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::document::OfficialDocuments;

/// Sales status of a parcel in the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParcelStatus {
    #[default]
    Disponible,
    Option,
    Vendu,
}

impl fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParcelStatus::Disponible => "disponible",
            ParcelStatus::Option => "option",
            ParcelStatus::Vendu => "vendu",
        };
        f.write_str(s)
    }
}

impl FromStr for ParcelStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disponible" => Ok(ParcelStatus::Disponible),
            "option" => Ok(ParcelStatus::Option),
            "vendu" => Ok(ParcelStatus::Vendu),
            other => Err(format!("Invalid status: {}", other)),
        }
    }
}

/// Defaults applied to parcels created from an imported geometry.
pub mod parcel_defaults {
    pub const TYPE_PROJET: &str = "Résidentiel";
    pub const STATUT_ACD: &str = "ACD en cours";
    pub const PROPRIETAIRE: &str = "0PES HOLDING";
    pub const COMMUNE: &str = "Songon M'Braté";
    pub const REGION: &str = "Abidjan";
    pub const UNITE_SUPERFICIE: &str = "ha";
    pub const CONFIGURATION: &str = "Plat";
    pub const OCCUPATION: &str = "Terrain nu";
    pub const POSITIONNEMENT: &str = "Développement";
}

fn default_unit() -> String {
    parcel_defaults::UNITE_SUPERFICIE.to_string()
}

/// A catalog parcel.
///
/// Only the fields the access core reads are typed; descriptive catalog fields
/// (access roads, selling points, etc.) are carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub id: String,
    pub nom: String,
    #[serde(default)]
    pub reference_tf: String,
    #[serde(default)]
    pub type_projet: String,
    #[serde(default)]
    pub statut_acd: String,
    #[serde(default)]
    pub reference_acd: String,
    #[serde(default)]
    pub proprietaire: String,
    #[serde(default)]
    pub commune: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub superficie: f64,
    #[serde(default = "default_unit")]
    pub unite_superficie: String,
    #[serde(default)]
    pub configuration: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub positionnement: String,
    #[serde(default)]
    pub prix_m2: f64,
    #[serde(default)]
    pub valeur_globale: f64,
    #[serde(default)]
    pub statut: ParcelStatus,
    /// `[lon, lat]` pairs of the outline.
    #[serde(default)]
    pub coordinates: Vec<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<[f64; 2]>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub vues_drone: Vec<String>,
    #[serde(default, skip_serializing_if = "OfficialDocuments::is_empty")]
    pub official_documents: OfficialDocuments,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Parcel {
    /// A fully populated parcel for an outline imported from a geographic file.
    pub fn with_defaults(id: impl Into<String>, nom: impl Into<String>, coordinates: Vec<[f64; 2]>) -> Self {
        let center = centroid(&coordinates);
        Parcel {
            id: id.into(),
            nom: nom.into(),
            reference_tf: String::new(),
            type_projet: parcel_defaults::TYPE_PROJET.to_string(),
            statut_acd: parcel_defaults::STATUT_ACD.to_string(),
            reference_acd: String::new(),
            proprietaire: parcel_defaults::PROPRIETAIRE.to_string(),
            commune: parcel_defaults::COMMUNE.to_string(),
            region: parcel_defaults::REGION.to_string(),
            superficie: 0.0,
            unite_superficie: parcel_defaults::UNITE_SUPERFICIE.to_string(),
            configuration: parcel_defaults::CONFIGURATION.to_string(),
            occupation: parcel_defaults::OCCUPATION.to_string(),
            positionnement: parcel_defaults::POSITIONNEMENT.to_string(),
            prix_m2: 0.0,
            valeur_globale: 0.0,
            statut: ParcelStatus::Disponible,
            coordinates,
            center,
            photos: Vec::new(),
            vues_drone: Vec::new(),
            official_documents: OfficialDocuments::default(),
            extra: serde_json::Map::new(),
        }
    }

    /// Reference printed on documents: the land title if known, else the parcel id.
    pub fn display_reference(&self) -> &str {
        if self.reference_tf.trim().is_empty() {
            &self.id
        } else {
            &self.reference_tf
        }
    }
}

/// Arithmetic mean of the outline points.
pub fn centroid(coordinates: &[[f64; 2]]) -> Option<[f64; 2]> {
    if coordinates.is_empty() {
        return None;
    }
    let n = coordinates.len() as f64;
    let (lon, lat) = coordinates
        .iter()
        .fold((0.0_f64, 0.0_f64), |(lon, lat), &[x, y]| (lon + x, lat + y));
    Some([lon / n, lat / n])
}

/// Aggregate figures for the public catalog page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub disponible: usize,
    pub option: usize,
    pub vendu: usize,
    pub total_superficie: f64,
    pub valeur_totale: f64,
}

impl CatalogStats {
    pub fn from_parcels(parcels: &[Parcel]) -> Self {
        parcels.iter().fold(CatalogStats::default(), |mut stats, p| {
            stats.total += 1;
            match p.statut {
                ParcelStatus::Disponible => stats.disponible += 1,
                ParcelStatus::Option => stats.option += 1,
                ParcelStatus::Vendu => stats.vendu += 1,
            }
            stats.total_superficie += p.superficie;
            stats.valeur_totale += p.valeur_globale;
            stats
        })
    }
}
