/*!
 * CSV reader for the pharmacy table
 *
 * Reads the pharmacy CSV into [`PharmacyRecord`]s. The file is expected to be
 * UTF-8, optionally prefixed with a byte-order mark. Coordinates that are
 * missing become `None`; coordinates that are present but unparseable are an
 * error unless invalid records are skipped.
 */

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use csv::ReaderBuilder;
use tracing::{debug, info, warn};

use crate::{
    Result, PharmacyError, ErrorContext,
    data_types::PharmacyRecord,
    schema::{ColumnIndex, ColumnNames, PharmacySchema},
};

/// How many skipped rows are logged individually before going quiet
const MAX_LOGGED_SKIPS: usize = 10;

/// Pharmacy table reader
pub struct PharmacyReader {
    /// Header names of the required columns
    columns: ColumnNames,
    /// Whether to skip invalid records (true) or fail on first error (false)
    skip_invalid_records: bool,
}

impl Default for PharmacyReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PharmacyReader {
    /// Create a new reader with the default Korean header names
    pub fn new() -> Self {
        Self {
            columns: ColumnNames::default(),
            skip_invalid_records: false,
        }
    }

    /// Use different header names for the required columns
    pub fn with_columns(mut self, columns: ColumnNames) -> Self {
        self.columns = columns;
        self
    }

    /// Enable or disable skipping invalid records
    pub fn with_skip_invalid_records(mut self, skip: bool) -> Self {
        self.skip_invalid_records = skip;
        self
    }

    /// Load pharmacy records from a CSV file
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PharmacyRecord>> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PharmacyError::file_not_found_with_suggestion(path.to_path_buf()));
        }

        let start_time = Instant::now();
        let file = File::open(path)?;
        let records = self.read_from(file).map_err(|e| attach_path(e, path))?;

        info!(
            path = %path.display(),
            records = records.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "loaded pharmacy table"
        );

        Ok(records)
    }

    /// Read pharmacy records from any byte source
    pub fn read_from<R: Read>(&self, source: R) -> Result<Vec<PharmacyRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(source);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        let index = PharmacySchema::resolve(&headers, &self.columns)?;
        debug!(?index, "resolved pharmacy table columns");

        let mut records = Vec::new();
        let mut invalid_count = 0;

        for (idx, result) in reader.records().enumerate() {
            // +2 for header and 0-based index
            let line_number = idx + 2;

            let parsed = result
                .map_err(|e| PharmacyError::CsvParse {
                    message: e.to_string(),
                    line: Some(line_number),
                    column: None,
                    context: ErrorContext {
                        line_number: Some(line_number),
                        ..Default::default()
                    },
                })
                .and_then(|csv_record| self.parse_record(&csv_record, &index, line_number));

            match parsed {
                Ok(record) => records.push(record),
                Err(e) if self.skip_invalid_records => {
                    invalid_count += 1;
                    if invalid_count <= MAX_LOGGED_SKIPS {
                        warn!(line = line_number, error = %e, "skipping invalid pharmacy record");
                    }
                }
                Err(e) => return Err(e),
            }
        }

        if invalid_count > 0 {
            warn!(skipped = invalid_count, "skipped invalid pharmacy records");
        }

        Ok(records)
    }

    fn parse_record(
        &self,
        record: &csv::StringRecord,
        index: &ColumnIndex,
        line_number: usize,
    ) -> Result<PharmacyRecord> {
        let get_field = |i: usize| -> String {
            record.get(i)
                .filter(|s| !PharmacySchema::is_na(s))
                .map(|s| s.to_string())
                .unwrap_or_default()
        };

        let name = get_field(index.name);
        let with_name = |err: PharmacyError| match err {
            PharmacyError::InvalidCoordinate { column, value, line, mut context } => {
                context.record_name = Some(name.clone());
                PharmacyError::InvalidCoordinate { column, value, line, context }
            }
            other => other,
        };

        let latitude = parse_coordinate(record.get(index.latitude), &self.columns.latitude, line_number)
            .map_err(with_name)?;
        let longitude = parse_coordinate(record.get(index.longitude), &self.columns.longitude, line_number)
            .map_err(with_name)?;

        Ok(PharmacyRecord {
            name,
            address: get_field(index.address),
            phone: get_field(index.phone),
            categories: get_field(index.categories),
            latitude,
            longitude,
        })
    }
}

/// Parse a latitude/longitude cell; missing markers become `None`
fn parse_coordinate(raw: Option<&str>, column: &str, line_number: usize) -> Result<Option<f64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value = raw.trim();
    if PharmacySchema::is_na(value) {
        return Ok(None);
    }

    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(PharmacyError::invalid_coordinate(column, raw, line_number)),
    }
}

fn attach_path(err: PharmacyError, path: &Path) -> PharmacyError {
    match err {
        PharmacyError::CsvParse { message, line, column, mut context } => {
            context.file_path = Some(path.to_path_buf());
            PharmacyError::CsvParse { message, line, column, context }
        }
        PharmacyError::InvalidCoordinate { column, value, line, mut context } => {
            context.file_path = Some(path.to_path_buf());
            PharmacyError::InvalidCoordinate { column, value, line, context }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "병원명,주소,전화번호,수거약품목,위도,경도\n";

    fn read(body: &str) -> Result<Vec<PharmacyRecord>> {
        PharmacyReader::new().read_from(format!("{HEADER}{body}").as_bytes())
    }

    #[test]
    fn test_reads_quoted_categories() {
        let records = read("가나약국,천안시 서북구 1,041-111-1111,\"혈압약, 감기약\",36.81,127.11\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].categories, "혈압약, 감기약");
        assert_eq!(records[0].latitude, Some(36.81));
        assert_eq!(records[0].longitude, Some(127.11));
    }

    #[test]
    fn test_bom_prefixed_file() {
        let data = format!("\u{feff}{HEADER}다라약국,주소,전화,소화제,,\n");
        let records = PharmacyReader::new().read_from(data.as_bytes()).unwrap();
        assert_eq!(records[0].name, "다라약국");
    }

    #[test]
    fn test_missing_coordinates_are_none() {
        let records = read("A,a,1,소화제,,\nB,b,2,소화제,NaN,127.0\n").unwrap();
        assert!(records[0].coordinates().is_none());
        assert_eq!(records[1].latitude, None);
        assert_eq!(records[1].longitude, Some(127.0));
    }

    #[test]
    fn test_missing_categories_cell_is_empty() {
        let records = read("A,a,1,,36.8,127.1\n").unwrap();
        assert_eq!(records[0].categories, "");
    }

    #[test]
    fn test_invalid_coordinate_fails_or_skips() {
        let body = "A,a,1,소화제,north,127.1\nB,b,2,감기약,36.8,127.1\n";
        match read(body) {
            Err(PharmacyError::InvalidCoordinate { line, context, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(context.record_name.as_deref(), Some("A"));
            }
            other => panic!("expected invalid coordinate, got {other:?}"),
        }

        let records = PharmacyReader::new()
            .with_skip_invalid_records(true)
            .read_from(format!("{HEADER}{body}").as_bytes())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "B");
    }

    #[test]
    fn test_custom_column_names() {
        let columns = ColumnNames {
            name: "name".to_string(),
            address: "address".to_string(),
            phone: "phone".to_string(),
            categories: "items".to_string(),
            latitude: "lat".to_string(),
            longitude: "lon".to_string(),
        };
        let data = "lon,lat,items,phone,address,name\n127.1,36.8,cold medicine,010,somewhere,Corner Pharmacy\n";
        let records = PharmacyReader::new().with_columns(columns).read_from(data.as_bytes()).unwrap();
        assert_eq!(records[0].name, "Corner Pharmacy");
        assert_eq!(records[0].coordinates().map(|c| c.latitude), Some(36.8));
    }

    #[test]
    fn test_missing_file() {
        let err = PharmacyReader::new().load("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, PharmacyError::FileNotFound { .. }));
    }
}
