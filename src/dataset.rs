/*!
 * Unified dataset API for the pharmacy table
 *
 * Provides a builder for loading the table, a memoized one-time loader, and a
 * query builder for filtering records by accepted category and location.
 */

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::debug;

use crate::{Result, PharmacyError};
use crate::analytics::PharmacyAnalytics;
use crate::config::FinderConfig;
use crate::data_types::*;
use crate::reader::PharmacyReader;
use crate::schema::ColumnNames;

/// Builder for loading a pharmacy dataset
///
/// # Example
/// ```no_run
/// # use pharmacy_finder::dataset::PharmacyDatasetBuilder;
/// let dataset = PharmacyDatasetBuilder::new()
///     .data_file("cheonan_seobuk_pharmacy_with_items.csv")
///     .skip_invalid_records(true)
///     .build()?;
/// # Ok::<(), pharmacy_finder::PharmacyError>(())
/// ```
pub struct PharmacyDatasetBuilder {
    data_path: Option<PathBuf>,
    columns: ColumnNames,
    skip_invalid_records: bool,
}

impl Default for PharmacyDatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PharmacyDatasetBuilder {
    /// Create a new dataset builder
    pub fn new() -> Self {
        Self {
            data_path: None,
            columns: ColumnNames::default(),
            skip_invalid_records: false,
        }
    }

    /// Start from the data path, header names and parsing options of a config
    pub fn from_config(config: &FinderConfig) -> Self {
        Self::new()
            .data_file(&config.data_path)
            .columns(config.columns.clone())
            .skip_invalid_records(config.skip_invalid_records)
    }

    /// Set the path to the pharmacy CSV file
    pub fn data_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the header names of the required columns
    pub fn columns(mut self, columns: ColumnNames) -> Self {
        self.columns = columns;
        self
    }

    /// Enable or disable skipping invalid records
    pub fn skip_invalid_records(mut self, skip: bool) -> Self {
        self.skip_invalid_records = skip;
        self
    }

    /// Build the dataset, reading the data file
    pub fn build(self) -> Result<PharmacyDataset> {
        let path = self.data_path
            .ok_or_else(|| PharmacyError::Custom {
                message: "Pharmacy data file path not specified".to_string(),
                suggestion: Some("Use .data_file() to specify the pharmacy CSV file".to_string()),
            })?;

        let records = PharmacyReader::new()
            .with_columns(self.columns)
            .with_skip_invalid_records(self.skip_invalid_records)
            .load(&path)?;

        Ok(PharmacyDataset { records })
    }
}

/// The in-memory pharmacy table, read-only after loading
#[derive(Debug, Clone, Default)]
pub struct PharmacyDataset {
    /// Records in source file order
    pub records: Vec<PharmacyRecord>,
}

impl PharmacyDataset {
    /// Wrap already-parsed records
    pub fn new(records: Vec<PharmacyRecord>) -> Self {
        Self { records }
    }

    /// Load a dataset from a CSV file with default settings
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        PharmacyDatasetBuilder::new().data_file(path).build()
    }

    /// Get the total number of pharmacies
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All distinct category labels, sorted
    ///
    /// Each categories cell is split on commas and trimmed; empty pieces are
    /// dropped.
    pub fn categories(&self) -> Vec<String> {
        let labels: BTreeSet<&str> = self.records
            .iter()
            .flat_map(|r| r.category_labels())
            .collect();
        labels.into_iter().map(str::to_string).collect()
    }

    /// Selected labels that are not among [`categories`](Self::categories)
    ///
    /// Under substring matching such a label may still match records.
    pub fn unknown_categories<'s, S: AsRef<str>>(&self, selected: &'s [S]) -> Vec<&'s str> {
        let known = self.categories();
        selected
            .iter()
            .map(|s| s.as_ref())
            .filter(|label| !known.iter().any(|k| k == label))
            .collect()
    }

    /// Create an analytics engine for this dataset
    pub fn analytics(&self) -> PharmacyAnalytics<'_> {
        PharmacyAnalytics::new(&self.records)
    }

    /// Create a query builder for this dataset
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(self)
    }

    /// Get dataset statistics
    pub fn statistics(&self) -> DatasetStatistics {
        DatasetStatistics::from_dataset(self)
    }
}

/// A dataset that is loaded at most once and then shared read-only
///
/// Every render of the page asks the cell for the dataset; only the first
/// call reads the file.
///
/// ```no_run
/// # use pharmacy_finder::dataset::{DatasetCell, PharmacyDatasetBuilder};
/// let cell = DatasetCell::new(PharmacyDatasetBuilder::new().data_file("pharmacies.csv"));
/// let first = cell.get_or_load()?;
/// let again = cell.get_or_load()?;
/// assert!(std::ptr::eq(first, again));
/// # Ok::<(), pharmacy_finder::PharmacyError>(())
/// ```
pub struct DatasetCell {
    source: PathBuf,
    columns: ColumnNames,
    skip_invalid_records: bool,
    cell: OnceLock<PharmacyDataset>,
}

impl DatasetCell {
    /// Prepare a cell that will load with the given builder settings
    pub fn new(builder: PharmacyDatasetBuilder) -> Self {
        Self {
            source: builder.data_path.unwrap_or_default(),
            columns: builder.columns,
            skip_invalid_records: builder.skip_invalid_records,
            cell: OnceLock::new(),
        }
    }

    /// Prepare a cell from a configuration
    pub fn from_config(config: &FinderConfig) -> Self {
        Self::new(PharmacyDatasetBuilder::from_config(config))
    }

    /// A cell that already holds a dataset
    pub fn preloaded(dataset: PharmacyDataset) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(dataset);
        Self {
            source: PathBuf::new(),
            columns: ColumnNames::default(),
            skip_invalid_records: false,
            cell,
        }
    }

    /// Path the dataset is (or would be) loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Whether the dataset has been loaded
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Return the dataset, reading the file on the first call only
    ///
    /// A failed load leaves the cell empty so a later call may retry.
    pub fn get_or_load(&self) -> Result<&PharmacyDataset> {
        if let Some(dataset) = self.cell.get() {
            return Ok(dataset);
        }

        let dataset = PharmacyDatasetBuilder::new()
            .data_file(&self.source)
            .columns(self.columns.clone())
            .skip_invalid_records(self.skip_invalid_records)
            .build()?;

        // A concurrent initializer may have won; its value is kept
        Ok(self.cell.get_or_init(|| dataset))
    }
}

/// Query builder for the pharmacy dataset
pub struct QueryBuilder<'a> {
    dataset: &'a PharmacyDataset,
    filters: Vec<Box<dyn Fn(&PharmacyRecord) -> bool + 'a>>,
}

impl<'a> QueryBuilder<'a> {
    /// Create a new query builder
    pub fn new(dataset: &'a PharmacyDataset) -> Self {
        Self {
            dataset,
            filters: Vec::new(),
        }
    }

    /// Keep records that accept at least one of the given categories
    ///
    /// With [`MatchMode::Substring`] a label matches anywhere inside the raw
    /// categories cell, so "약" also matches "항생약".
    pub fn any_category<S: AsRef<str>>(mut self, categories: &'a [S], mode: MatchMode) -> Self {
        self.filters.push(Box::new(move |p| p.accepts_any(categories, mode)));
        self
    }

    /// Keep records with both latitude and longitude
    pub fn with_coordinates(mut self) -> Self {
        self.filters.push(Box::new(|p| p.has_coordinates()));
        self
    }

    /// Keep records with exactly this name
    pub fn name(mut self, name: &'a str) -> Self {
        self.filters.push(Box::new(move |p| p.name == name));
        self
    }

    /// Execute the query and return matching records in source order
    pub fn execute(self) -> Vec<&'a PharmacyRecord> {
        let results: Vec<&'a PharmacyRecord> = self.dataset.records
            .iter()
            .filter(|record| self.filters.iter().all(|filter| filter(*record)))
            .collect();
        debug!(filters = self.filters.len(), matches = results.len(), "executed pharmacy query");
        results
    }

    /// Execute the query and return count only
    pub fn count(self) -> usize {
        self.execute().len()
    }

    /// Execute the query and return the first match
    pub fn first(self) -> Option<&'a PharmacyRecord> {
        let filters = self.filters;
        self.dataset.records
            .iter()
            .find(|record| filters.iter().all(|filter| filter(*record)))
    }
}

/// Dataset statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetStatistics {
    pub total_pharmacies: usize,
    pub with_coordinates: usize,
    pub without_coordinates: usize,
    pub without_categories: usize,
    pub distinct_categories: usize,
}

impl DatasetStatistics {
    /// Calculate statistics from a dataset
    pub fn from_dataset(dataset: &PharmacyDataset) -> Self {
        let with_coordinates = dataset.query().with_coordinates().count();
        let without_categories = dataset.records
            .iter()
            .filter(|r| r.category_labels().next().is_none())
            .count();

        Self {
            total_pharmacies: dataset.len(),
            with_coordinates,
            without_coordinates: dataset.len() - with_coordinates,
            without_categories,
            distinct_categories: dataset.categories().len(),
        }
    }

    /// Print a formatted summary of the statistics
    pub fn print_summary(&self) {
        let pct = |n: usize| {
            if self.total_pharmacies == 0 {
                0.0
            } else {
                (n as f64 / self.total_pharmacies as f64) * 100.0
            }
        };

        println!("=== Pharmacy Dataset Statistics ===");
        println!("Total Pharmacies: {}", self.total_pharmacies);
        println!("  With Location: {} ({:.1}%)", self.with_coordinates, pct(self.with_coordinates));
        println!("  Without Location: {} ({:.1}%)", self.without_coordinates, pct(self.without_coordinates));
        if self.without_categories > 0 {
            println!("Pharmacies Without Categories: {}", self.without_categories);
        }
        println!("Distinct Categories: {}", self.distinct_categories);
    }
}
