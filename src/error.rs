/*!
 * Error handling for the pharmacy finder
 *
 * Provides detailed error types with context, suggestions, and recovery guidance.
 */

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use serde::{Serialize, Deserialize};

/// Pharmacy finder result type
pub type Result<T> = std::result::Result<T, PharmacyError>;

/// Error types with context and suggestions
#[derive(Error, Debug)]
pub enum PharmacyError {
    /// File I/O errors with context
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
        context: ErrorContext,
    },

    /// CSV parsing errors with location information
    #[error("CSV parsing error at line {line:?}: {message}")]
    CsvParse {
        message: String,
        line: Option<usize>,
        column: Option<String>,
        context: ErrorContext,
    },

    /// File not found with suggestions
    #[error("File not found: {path}")]
    FileNotFound {
        path: PathBuf,
        suggestion: String,
    },

    /// Required columns absent from the header row
    #[error("Schema mismatch: {message}")]
    SchemaMismatch {
        message: String,
        missing_columns: Vec<String>,
        found_columns: Vec<String>,
    },

    /// Latitude or longitude cell that is present but not a finite number
    #[error("Invalid {column} '{value}' at line {line}")]
    InvalidCoordinate {
        column: String,
        value: String,
        line: usize,
        context: ErrorContext,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        suggestion: Option<String>,
    },

    /// Export errors
    #[error("Export error: {message}")]
    Export {
        message: String,
        format: ExportFormat,
        suggestion: Option<String>,
    },

    /// Failure reported by a directions provider
    #[error("Directions error: {message}")]
    Directions {
        message: String,
    },

    /// Generic errors with custom message
    #[error("{message}")]
    Custom {
        message: String,
        suggestion: Option<String>,
    },
}

/// Error context providing additional information
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    pub file_path: Option<PathBuf>,
    pub line_number: Option<usize>,
    pub column_name: Option<String>,
    pub record_name: Option<String>,
}

/// Output format of an exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Html,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Html => write!(f, "HTML"),
        }
    }
}

impl PharmacyError {
    /// Create a file not found error with helpful suggestion
    pub fn file_not_found_with_suggestion(path: PathBuf) -> Self {
        let suggestion = if path.extension().and_then(|e| e.to_str()) == Some("toml") {
            format!(
                "Check if the config file exists at '{}'. Run `pfcli --help` to see the \
                environment variables that can be used instead.",
                path.display()
            )
        } else {
            format!(
                "Check if the pharmacy table exists at '{}'. Pass another file with --data \
                or set PHARMACY_FINDER_DATA_PATH.",
                path.display()
            )
        };

        Self::FileNotFound { path, suggestion }
    }

    /// Create a schema mismatch error listing every missing column
    pub fn missing_columns(missing: Vec<String>, found: Vec<String>) -> Self {
        let message = format!(
            "Missing required column{}: {}",
            if missing.len() == 1 { "" } else { "s" },
            missing.join(", ")
        );

        Self::SchemaMismatch {
            message,
            missing_columns: missing,
            found_columns: found,
        }
    }

    /// Create an invalid coordinate error for a given cell
    pub fn invalid_coordinate(column: &str, value: &str, line: usize) -> Self {
        Self::InvalidCoordinate {
            column: column.to_string(),
            value: value.to_string(),
            line,
            context: ErrorContext {
                line_number: Some(line),
                column_name: Some(column.to_string()),
                ..Default::default()
            },
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::FileNotFound { suggestion, .. } => {
                format!("{}\n\nSuggestion: {}", self, suggestion)
            }
            Self::SchemaMismatch { found_columns, .. } => {
                format!("{}\n\nColumns found in file: {}", self, found_columns.join(", "))
            }
            Self::InvalidCoordinate { .. } => {
                format!(
                    "{}\n\nSuggestion: leave the cell empty for unknown locations or enable \
                    skip_invalid_records",
                    self
                )
            }
            Self::Configuration { suggestion: Some(sug), .. }
            | Self::Export { suggestion: Some(sug), .. }
            | Self::Custom { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            _ => self.to_string(),
        }
    }
}

// Convenience conversions
impl From<std::io::Error> for PharmacyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            context: ErrorContext::default(),
        }
    }
}

impl From<csv::Error> for PharmacyError {
    fn from(err: csv::Error) -> Self {
        let (line, message) = match err.position() {
            Some(pos) => (Some(pos.line() as usize), err.to_string()),
            None => (None, err.to_string()),
        };

        Self::CsvParse {
            message,
            line,
            column: None,
            context: ErrorContext::default(),
        }
    }
}

impl From<serde_json::Error> for PharmacyError {
    fn from(err: serde_json::Error) -> Self {
        PharmacyError::Export {
            message: err.to_string(),
            format: ExportFormat::Json,
            suggestion: Some("Check if the data is serializable to JSON.".to_string()),
        }
    }
}

impl From<::config::ConfigError> for PharmacyError {
    fn from(err: ::config::ConfigError) -> Self {
        PharmacyError::Configuration {
            message: err.to_string(),
            suggestion: Some(
                "Check the config file and PHARMACY_FINDER_* environment variables".to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err = PharmacyError::missing_columns(
            vec!["위도".to_string(), "경도".to_string()],
            vec!["병원명".to_string()],
        );
        assert_eq!(err.to_string(), "Schema mismatch: Missing required columns: 위도, 경도");
        assert!(err.user_message().contains("Columns found in file: 병원명"));
    }

    #[test]
    fn test_file_not_found_suggestion() {
        let err = PharmacyError::file_not_found_with_suggestion(PathBuf::from("pharmacies.csv"));
        let msg = err.user_message();
        assert!(msg.starts_with("File not found: pharmacies.csv"));
        assert!(msg.contains("--data"));
    }

    #[test]
    fn test_invalid_coordinate_context() {
        match PharmacyError::invalid_coordinate("위도", "north", 7) {
            PharmacyError::InvalidCoordinate { line, context, .. } => {
                assert_eq!(line, 7);
                assert_eq!(context.column_name.as_deref(), Some("위도"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
