/*!
 * Schema definitions for the pharmacy table
 *
 * The source file is a CSV with a header row. Columns are located by header
 * name, so column order and extra columns do not matter; only the six
 * required names must be present.
 */

use serde::{Deserialize, Serialize};

/// Header names of the six required columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_phone")]
    pub phone: String,
    #[serde(default = "default_categories")]
    pub categories: String,
    #[serde(default = "default_latitude")]
    pub latitude: String,
    #[serde(default = "default_longitude")]
    pub longitude: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            name: default_name(),
            address: default_address(),
            phone: default_phone(),
            categories: default_categories(),
            latitude: default_latitude(),
            longitude: default_longitude(),
        }
    }
}

// Headers of the Cheonan Seobuk-gu pharmacy table
fn default_name() -> String {
    "병원명".to_string()
}

fn default_address() -> String {
    "주소".to_string()
}

fn default_phone() -> String {
    "전화번호".to_string()
}

fn default_categories() -> String {
    "수거약품목".to_string()
}

fn default_latitude() -> String {
    "위도".to_string()
}

fn default_longitude() -> String {
    "경도".to_string()
}

impl ColumnNames {
    /// Required header names in canonical order
    pub fn required(&self) -> [&str; 6] {
        [
            &self.name,
            &self.address,
            &self.phone,
            &self.categories,
            &self.latitude,
            &self.longitude,
        ]
    }
}

/// Positions of the required columns within a header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub name: usize,
    pub address: usize,
    pub phone: usize,
    pub categories: usize,
    pub latitude: usize,
    pub longitude: usize,
}

/// Pharmacy table schema
pub struct PharmacySchema;

impl PharmacySchema {
    /// Cell values read as "missing", following the pandas CSV defaults
    pub const NA_VALUES: &'static [&'static str] = &[
        "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan",
        "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a",
        "nan", "null",
    ];

    /// Check whether a raw cell holds a missing value
    pub fn is_na(value: &str) -> bool {
        Self::NA_VALUES.contains(&value)
    }

    /// Normalize a header cell: drop a byte-order mark and surrounding whitespace
    pub fn normalize_header(header: &str) -> &str {
        header.trim_start_matches('\u{feff}').trim()
    }

    /// Locate every required column, failing with all missing names at once
    pub fn resolve(headers: &[String], names: &ColumnNames) -> Result<ColumnIndex, crate::PharmacyError> {
        let normalized: Vec<&str> = headers.iter().map(|h| Self::normalize_header(h)).collect();
        let find = |wanted: &str| normalized.iter().position(|h| *h == wanted);

        let missing: Vec<String> = names
            .required()
            .iter()
            .filter(|wanted| find(**wanted).is_none())
            .map(|wanted| wanted.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(crate::PharmacyError::missing_columns(
                missing,
                normalized.iter().map(|h| h.to_string()).collect(),
            ));
        }

        // All present, checked above
        let idx = |wanted: &str| find(wanted).unwrap_or_default();
        Ok(ColumnIndex {
            name: idx(names.name.as_str()),
            address: idx(names.address.as_str()),
            phone: idx(names.phone.as_str()),
            categories: idx(names.categories.as_str()),
            latitude: idx(names.latitude.as_str()),
            longitude: idx(names.longitude.as_str()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PharmacyError;

    fn headers(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_resolve_any_order_with_extra_columns() {
        let h = headers(&["번호", "경도", "위도", "수거약품목", "전화번호", "주소", "병원명"]);
        let idx = PharmacySchema::resolve(&h, &ColumnNames::default()).unwrap();
        assert_eq!(idx.name, 6);
        assert_eq!(idx.address, 5);
        assert_eq!(idx.categories, 3);
        assert_eq!(idx.longitude, 1);
    }

    #[test]
    fn test_resolve_strips_bom() {
        let h = headers(&["\u{feff}병원명", "주소", "전화번호", "수거약품목", "위도", "경도"]);
        let idx = PharmacySchema::resolve(&h, &ColumnNames::default()).unwrap();
        assert_eq!(idx.name, 0);
    }

    #[test]
    fn test_resolve_reports_all_missing() {
        let h = headers(&["병원명", "주소", "전화번호", "수거약품목"]);
        match PharmacySchema::resolve(&h, &ColumnNames::default()) {
            Err(PharmacyError::SchemaMismatch { missing_columns, .. }) => {
                assert_eq!(missing_columns, vec!["위도".to_string(), "경도".to_string()]);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_na_values() {
        assert!(PharmacySchema::is_na(""));
        assert!(PharmacySchema::is_na("NaN"));
        assert!(PharmacySchema::is_na("null"));
        assert!(!PharmacySchema::is_na("36.81"));
        assert!(!PharmacySchema::is_na(" "));
    }
}
