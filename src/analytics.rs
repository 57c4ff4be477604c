/*!
 * Category analytics over pharmacy records
 */

use std::collections::BTreeMap;

use crate::data_types::*;

/// Read-only analytics over a slice of pharmacy records
pub struct PharmacyAnalytics<'a> {
    records: &'a [PharmacyRecord],
}

impl<'a> PharmacyAnalytics<'a> {
    pub fn new(records: &'a [PharmacyRecord]) -> Self {
        Self { records }
    }

    /// Number of pharmacies listing each category label
    ///
    /// A pharmacy listing the same label twice is counted once.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in self.records {
            let mut labels: Vec<&str> = record.category_labels().collect();
            labels.sort_unstable();
            labels.dedup();
            for label in labels {
                *counts.entry(label.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Categories ordered by pharmacy count, ties broken alphabetically
    pub fn top_categories(&self, limit: usize) -> Vec<(String, usize)> {
        let mut counts: Vec<_> = self.category_counts().into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(limit);
        counts
    }

    /// Records that can be shown on a map
    pub fn located(&self) -> Vec<&'a PharmacyRecord> {
        self.records.iter().filter(|r| r.has_coordinates()).collect()
    }

    /// Records missing at least one coordinate
    pub fn unlocated(&self) -> Vec<&'a PharmacyRecord> {
        self.records.iter().filter(|r| !r.has_coordinates()).collect()
    }

    /// Pharmacies accepting a category, counted under `mode`
    pub fn count_accepting(&self, category: &str, mode: MatchMode) -> usize {
        self.records.iter().filter(|r| r.accepts(category, mode)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(categories: &str, located: bool) -> PharmacyRecord {
        PharmacyRecord {
            name: String::new(),
            address: String::new(),
            phone: String::new(),
            categories: categories.to_string(),
            latitude: located.then_some(36.8),
            longitude: located.then_some(127.1),
        }
    }

    #[test]
    fn test_category_counts_dedupe_within_record() {
        let records = vec![
            record("감기약, 감기약, 연고", true),
            record("감기약", false),
        ];
        let counts = PharmacyAnalytics::new(&records).category_counts();
        assert_eq!(counts.get("감기약"), Some(&2));
        assert_eq!(counts.get("연고"), Some(&1));
    }

    #[test]
    fn test_top_categories() {
        let records = vec![
            record("연고, 감기약", true),
            record("감기약, 소화제", true),
            record("소화제", true),
        ];
        let top = PharmacyAnalytics::new(&records).top_categories(2);
        assert_eq!(top, vec![("감기약".to_string(), 2), ("소화제".to_string(), 2)]);
    }

    #[test]
    fn test_located_split() {
        let records = vec![record("a", true), record("b", false)];
        let analytics = PharmacyAnalytics::new(&records);
        assert_eq!(analytics.located().len(), 1);
        assert_eq!(analytics.unlocated()[0].categories, "b");
    }

    #[test]
    fn test_count_accepting_modes() {
        let records = vec![record("항생약", true), record("약", true)];
        let analytics = PharmacyAnalytics::new(&records);
        assert_eq!(analytics.count_accepting("약", MatchMode::Substring), 2);
        assert_eq!(analytics.count_accepting("약", MatchMode::ExactToken), 1);
    }
}
