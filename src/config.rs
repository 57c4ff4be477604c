/*!
 * Configuration support for the pharmacy finder
 *
 * Provides runtime configuration options for the data source, selection
 * limits, matching and map output.
 */

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::data_types::MatchMode;
use crate::directions::DEFAULT_DIRECTIONS_BASE_URL;
use crate::schema::ColumnNames;

/// Prefix of environment variables read by [`FinderConfig::load`]
pub const ENV_PREFIX: &str = "PHARMACY_FINDER";

/// Global configuration for the pharmacy finder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinderConfig {
    /// Pharmacy CSV file
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Most categories that may be selected at once
    #[serde(default = "default_max_selected_categories")]
    pub max_selected_categories: usize,

    /// Number of checkbox columns
    #[serde(default = "default_grid_columns")]
    pub grid_columns: usize,

    /// How selected categories are matched against records
    #[serde(default)]
    pub match_mode: MatchMode,

    /// Whether to skip invalid records during parsing
    #[serde(default)]
    pub skip_invalid_records: bool,

    /// Deep-link prefix for directions
    #[serde(default = "default_directions_base_url")]
    pub directions_base_url: String,

    /// Map width in pixels
    #[serde(default = "default_map_width")]
    pub map_width: u32,

    /// Map height in pixels
    #[serde(default = "default_map_height")]
    pub map_height: u32,

    /// Default export format
    #[serde(default)]
    pub default_export_format: crate::ExportFormat,

    /// Header names of the required columns
    #[serde(default)]
    pub columns: ColumnNames,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            columns: ColumnNames::default(),
            max_selected_categories: default_max_selected_categories(),
            grid_columns: default_grid_columns(),
            match_mode: MatchMode::Substring,
            skip_invalid_records: false,
            directions_base_url: default_directions_base_url(),
            map_width: default_map_width(),
            map_height: default_map_height(),
            default_export_format: crate::ExportFormat::Json,
        }
    }
}

// Default value functions for serde
fn default_data_path() -> PathBuf {
    PathBuf::from(crate::constants::DEFAULT_DATA_FILE)
}

fn default_max_selected_categories() -> usize {
    crate::constants::MAX_SELECTED_CATEGORIES
}

fn default_grid_columns() -> usize {
    crate::constants::CHECKBOX_GRID_COLUMNS
}

fn default_directions_base_url() -> String {
    DEFAULT_DIRECTIONS_BASE_URL.to_string()
}

fn default_map_width() -> u32 {
    800
}

fn default_map_height() -> u32 {
    500
}

impl FinderConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(crate::PharmacyError::file_not_found_with_suggestion(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| crate::PharmacyError::Configuration {
                message: format!("Failed to parse config file: {}", e),
                suggestion: Some("Check that the file is valid TOML format".to_string()),
            })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::PharmacyError::Configuration {
                message: format!("Failed to serialize config: {}", e),
                suggestion: None,
            })?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/pharmacy-finder/config.toml` on Linux,
    /// the matching Application Support / AppData location elsewhere
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "pharmacy-finder")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration by layering sources
    ///
    /// Priority order, highest first:
    /// 1. `PHARMACY_FINDER_*` environment variables (nested keys use `__`,
    ///    e.g. `PHARMACY_FINDER_COLUMNS__NAME`)
    /// 2. The given config file, or the default config file if it exists
    /// 3. Built-in defaults
    pub fn load_from(file: Option<&Path>) -> crate::Result<Self> {
        let mut builder = ::config::Config::builder();

        match file {
            Some(path) => {
                if !path.exists() {
                    return Err(crate::PharmacyError::file_not_found_with_suggestion(path.to_path_buf()));
                }
                builder = builder.add_source(::config::File::from(path));
            }
            None => {
                if let Some(path) = Self::default_config_path() {
                    builder = builder.add_source(::config::File::from(path).required(false));
                }
            }
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location, environment, or defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(None)
    }

    /// Reject settings the page cannot be rendered with
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_selected_categories == 0 {
            return Err(crate::PharmacyError::Configuration {
                message: "max_selected_categories must be at least 1".to_string(),
                suggestion: Some(format!(
                    "Remove the setting to use the default of {}",
                    crate::constants::MAX_SELECTED_CATEGORIES
                )),
            });
        }
        if self.grid_columns == 0 {
            return Err(crate::PharmacyError::Configuration {
                message: "grid_columns must be at least 1".to_string(),
                suggestion: None,
            });
        }
        Ok(())
    }
}

// Global configuration support
use std::sync::RwLock;

lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: RwLock<Option<FinderConfig>> = RwLock::new(None);
}

/// Set the global configuration
pub fn set_global_config(config: FinderConfig) {
    let mut guard = GLOBAL_CONFIG.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Some(config);
}

/// Get the global configuration (or the layered configuration if not set)
pub fn global_config() -> FinderConfig {
    let guard = GLOBAL_CONFIG.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    match guard.as_ref() {
        Some(config) => config.clone(),
        None => FinderConfig::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            FinderConfig::default()
        }),
    }
}

/// Clear the global configuration
pub fn clear_global_config() {
    let mut guard = GLOBAL_CONFIG.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = None;
}

/// Builder for customizing configuration
pub struct ConfigBuilder {
    config: FinderConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Start building a new configuration
    pub fn new() -> Self {
        Self {
            config: FinderConfig::default(),
        }
    }

    /// Set the pharmacy CSV file
    pub fn data_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.data_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the header names of the required columns
    pub fn columns(mut self, columns: ColumnNames) -> Self {
        self.config.columns = columns;
        self
    }

    /// Set the selection limit
    pub fn max_selected_categories(mut self, max: usize) -> Self {
        self.config.max_selected_categories = max;
        self
    }

    /// Set the number of checkbox columns
    pub fn grid_columns(mut self, columns: usize) -> Self {
        self.config.grid_columns = columns;
        self
    }

    /// Set the category match mode
    pub fn match_mode(mut self, mode: MatchMode) -> Self {
        self.config.match_mode = mode;
        self
    }

    /// Set skip invalid records
    pub fn skip_invalid_records(mut self, skip: bool) -> Self {
        self.config.skip_invalid_records = skip;
        self
    }

    /// Set the directions deep-link prefix
    pub fn directions_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.directions_base_url = url.into();
        self
    }

    /// Set map dimensions in pixels
    pub fn map_size(mut self, width: u32, height: u32) -> Self {
        self.config.map_width = width;
        self.config.map_height = height;
        self
    }

    /// Build the configuration
    pub fn build(self) -> FinderConfig {
        self.config
    }
}
