/*!
 * Category filter
 *
 * Narrows the pharmacy table to the rows accepting at least one selected
 * category. An empty selection is its own state rather than "everything".
 */

use serde::Serialize;

use crate::data_types::{MatchMode, PharmacyRecord};
use crate::dataset::PharmacyDataset;

/// Result of filtering the table by a selection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "records", rename_all = "snake_case")]
pub enum FilterOutcome<'a> {
    /// No category selected; no filtering performed
    NothingSelected,
    /// Matching rows in source order (possibly none)
    Matched(Vec<&'a PharmacyRecord>),
}

impl<'a> FilterOutcome<'a> {
    /// Matching rows, or `None` when nothing was selected
    pub fn records(&self) -> Option<&[&'a PharmacyRecord]> {
        match self {
            FilterOutcome::NothingSelected => None,
            FilterOutcome::Matched(records) => Some(records),
        }
    }

    /// Matching rows that have both coordinates
    pub fn located(&self) -> Vec<&'a PharmacyRecord> {
        self.records()
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|r| r.has_coordinates())
            .collect()
    }
}

/// Filter the dataset by the selected categories
pub fn filter_pharmacies<'a, S: AsRef<str>>(
    dataset: &'a PharmacyDataset,
    selected: &'a [S],
    mode: MatchMode,
) -> FilterOutcome<'a> {
    if selected.is_empty() {
        return FilterOutcome::NothingSelected;
    }
    FilterOutcome::Matched(dataset.query().any_category(selected, mode).execute())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, categories: &str, located: bool) -> PharmacyRecord {
        PharmacyRecord {
            name: name.to_string(),
            address: String::new(),
            phone: String::new(),
            categories: categories.to_string(),
            latitude: located.then_some(1.0),
            longitude: located.then_some(1.0),
        }
    }

    fn dataset() -> PharmacyDataset {
        PharmacyDataset::new(vec![
            record("A", "혈압약, 감기약", true),
            record("B", "소화제", false),
            record("C", "항생약", true),
        ])
    }

    #[test]
    fn test_empty_selection_is_nothing_selected() {
        let ds = dataset();
        let none: [&str; 0] = [];
        let outcome = filter_pharmacies(&ds, &none, MatchMode::Substring);
        assert_eq!(outcome, FilterOutcome::NothingSelected);
        assert!(outcome.records().is_none());
        assert!(outcome.located().is_empty());
    }

    #[test]
    fn test_matches_are_exactly_substring_hits() {
        let ds = dataset();
        let selected = ["감기약", "소화제"];
        let outcome = filter_pharmacies(&ds, &selected, MatchMode::Substring);
        let expected: Vec<&PharmacyRecord> = ds.records
            .iter()
            .filter(|r| selected.iter().any(|s| r.categories.contains(s)))
            .collect();
        assert_eq!(outcome.records().unwrap(), expected.as_slice());
        assert_eq!(outcome.located().len(), 1);
    }

    #[test]
    fn test_substring_over_match_versus_exact_token() {
        let ds = dataset();
        let selected = ["약"];
        assert_eq!(filter_pharmacies(&ds, &selected, MatchMode::Substring).records().unwrap().len(), 2);
        assert!(filter_pharmacies(&ds, &selected, MatchMode::ExactToken).records().unwrap().is_empty());
    }

    #[test]
    fn test_no_matches_is_still_matched() {
        let ds = dataset();
        let selected = ["파스"];
        let outcome = filter_pharmacies(&ds, &selected, MatchMode::Substring);
        assert_eq!(outcome, FilterOutcome::Matched(Vec::new()));
    }
}
