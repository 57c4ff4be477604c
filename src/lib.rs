/*!
 * # Pharmacy Finder
 *
 * Find pharmacies that take back unused medication, by the kinds of
 * medication they collect.
 *
 * ## Features
 *
 * - 📄 **CSV Loading**: Reads the pharmacy table once, BOM-aware, with configurable header names
 * - 🔍 **Category Filtering**: Selection of up to three categories, matched against each pharmacy
 * - 🗺️ **Map Model**: Markers with popups and tooltips, fitted to the matching pharmacies
 * - 🧭 **Directions**: Deep link plus a pluggable route provider
 * - 💾 **Export**: JSON, CSV and standalone Leaflet HTML
 *
 * ## Quick Start
 *
 * ```no_run
 * use pharmacy_finder::prelude::*;
 *
 * # fn main() -> Result<()> {
 * let config = FinderConfig::load()?;
 * let cell = DatasetCell::from_config(&config);
 * let dataset = cell.get_or_load()?;
 *
 * let state = ViewState::with_categories(["감기약"]);
 * let page = render(&state, dataset, &config);
 *
 * for notice in &page.notices {
 *     println!("{:?}: {}", notice.level, notice.message);
 * }
 * # Ok(())
 * # }
 * ```
 *
 * ## Querying Data
 *
 * ```no_run
 * # use pharmacy_finder::prelude::*;
 * # fn main() -> Result<()> {
 * let dataset = PharmacyDataset::load("cheonan_seobuk_pharmacy_with_items.csv")?;
 *
 * // Every category label, sorted and de-duplicated
 * let categories = dataset.categories();
 *
 * // Located pharmacies accepting either category
 * let selected = ["혈압약", "소화제"];
 * let located = dataset
 *     .query()
 *     .any_category(&selected, MatchMode::Substring)
 *     .with_coordinates()
 *     .execute();
 *
 * println!("{} of {} categories, {} on the map", selected.len(), categories.len(), located.len());
 * # Ok(())
 * # }
 * ```
 *
 * ## Configuration
 *
 * ```no_run
 * # use pharmacy_finder::prelude::*;
 * let config = ConfigBuilder::new()
 *     .data_path("pharmacies.csv")
 *     .match_mode(MatchMode::ExactToken)
 *     .skip_invalid_records(true)
 *     .build();
 * pharmacy_finder::config::set_global_config(config);
 * ```
 *
 * Settings are also read from `~/.config/pharmacy-finder/config.toml` and
 * `PHARMACY_FINDER_*` environment variables.
 */

// Re-export error types from root
pub use error::{PharmacyError, Result, ErrorContext, ExportFormat};

// Public modules
pub mod data_types;
pub mod reader;
pub mod schema;
pub mod error;
pub mod analytics;
pub mod dataset;
pub mod filter;
pub mod selection;
pub mod directions;
pub mod view;
pub mod export;
pub mod config;

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```
/// use pharmacy_finder::prelude::*;
/// ```
pub mod prelude {
    pub use crate::data_types::*;
    pub use crate::reader::PharmacyReader;
    pub use crate::schema::{ColumnNames, PharmacySchema};
    pub use crate::error::{PharmacyError, Result};
    pub use crate::analytics::PharmacyAnalytics;
    pub use crate::dataset::{DatasetCell, PharmacyDataset, PharmacyDatasetBuilder, DatasetStatistics};
    pub use crate::filter::{filter_pharmacies, FilterOutcome};
    pub use crate::selection::{apply_selection_limit, toggle, CheckboxGrid, Selection};
    pub use crate::directions::{DirectionsProvider, DirectionsRequest, StubDirections};
    pub use crate::view::{render, render_with, Notice, NoticeLevel, PageView, ViewState};
    pub use crate::export::{ViewExporter, JsonExporter, CsvExporter, MapHtmlExporter};
    pub use crate::config::{ConfigBuilder, FinderConfig};
    pub use crate::ExportFormat;
}

/// Pharmacy table constants
pub mod constants {
    /// Pharmacy table shipped next to the binary
    pub const DEFAULT_DATA_FILE: &str = "cheonan_seobuk_pharmacy_with_items.csv";

    /// Most categories that may be selected at once
    pub const MAX_SELECTED_CATEGORIES: usize = 3;

    /// Columns of the category checkbox grid
    pub const CHECKBOX_GRID_COLUMNS: usize = 3;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_constants_match_default_config() {
        let config = FinderConfig::default();
        assert_eq!(config.max_selected_categories, crate::constants::MAX_SELECTED_CATEGORIES);
        assert_eq!(config.grid_columns, crate::constants::CHECKBOX_GRID_COLUMNS);
        assert_eq!(
            config.data_path,
            std::path::PathBuf::from(crate::constants::DEFAULT_DATA_FILE)
        );
    }

    #[test]
    fn test_prelude_end_to_end() {
        let data = "병원명,주소,전화번호,수거약품목,위도,경도\n\
                    A,주소A,041,\"혈압약, 감기약\",36.8,127.1\n\
                    B,주소B,041,소화제,,\n";
        let dataset = PharmacyDataset::new(PharmacyReader::new().read_from(data.as_bytes()).unwrap());
        let page = render(&ViewState::with_categories(["감기약"]), &dataset, &FinderConfig::default());
        assert_eq!(page.table().map(|t| t.rows.len()), Some(1));
        assert_eq!(page.notices[0].level, NoticeLevel::Success);
    }
}
