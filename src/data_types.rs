/*!
 * Data type definitions for pharmacy records
 *
 * One row of the pharmacy table, plus the small value types derived from it.
 */

use serde::{Deserialize, Serialize};

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// How a selected category is compared against a record's categories cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Selected label appears anywhere in the raw cell text
    #[default]
    Substring,
    /// Selected label equals one of the trimmed comma-separated labels
    ExactToken,
}

/// A pharmacy that accepts medication returns
///
/// `categories` is kept exactly as it appears in the source file; it is only
/// split and trimmed when read through [`PharmacyRecord::category_labels`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PharmacyRecord {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub categories: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl PharmacyRecord {
    /// Both coordinates, or `None` if either is missing
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.coordinates().is_some()
    }

    /// Trimmed, non-empty labels of the categories cell, in cell order
    pub fn category_labels(&self) -> impl Iterator<Item = &str> {
        self.categories
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }

    /// Whether any of `selected` matches this record under `mode`
    pub fn accepts_any<S: AsRef<str>>(&self, selected: &[S], mode: MatchMode) -> bool {
        selected.iter().any(|s| self.accepts(s.as_ref(), mode))
    }

    /// Whether a single category matches this record under `mode`
    pub fn accepts(&self, category: &str, mode: MatchMode) -> bool {
        match mode {
            MatchMode::Substring => self.categories.contains(category),
            MatchMode::ExactToken => self.category_labels().any(|label| label == category),
        }
    }
}
