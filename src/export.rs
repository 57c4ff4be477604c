/*!
 * Export functionality for rendered pages
 *
 * Writes the result of a render as JSON (whole page model or just the table
 * rows), as CSV (the results table) or as a standalone HTML map page using
 * Leaflet.
 */

use std::path::Path;
use std::fs::File;
use std::io::{Write, BufWriter};

use crate::{Result, PharmacyError, ExportFormat};
use crate::view::{MapView, Marker, PageView, TableRow};

/// Trait for implementing page exporters
pub trait ViewExporter {
    /// Write the page to any byte sink
    fn write(&self, page: &PageView, writer: &mut dyn Write) -> Result<()>;

    /// Get the export format
    fn format(&self) -> ExportFormat;

    /// Export the page to a file
    fn export(&self, page: &PageView, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(page, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// JSON exporter
pub struct JsonExporter {
    /// Whether to pretty-print the JSON
    pub pretty_print: bool,
    /// Whether to write only the table rows instead of the whole page
    pub records_only: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self {
            pretty_print: true,
            records_only: false,
        }
    }
}

impl JsonExporter {
    /// Create a new JSON exporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set pretty printing
    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Write a JSON array of table rows (empty when nothing is selected)
    pub fn records_only(mut self) -> Self {
        self.records_only = true;
        self
    }
}

impl ViewExporter for JsonExporter {
    fn write(&self, page: &PageView, writer: &mut dyn Write) -> Result<()> {
        if self.records_only {
            let rows: &[TableRow] = page.table().map(|t| t.rows.as_slice()).unwrap_or_default();
            if self.pretty_print {
                serde_json::to_writer_pretty(&mut *writer, rows)?;
            } else {
                serde_json::to_writer(&mut *writer, rows)?;
            }
        } else if self.pretty_print {
            serde_json::to_writer_pretty(&mut *writer, page)?;
        } else {
            serde_json::to_writer(&mut *writer, page)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }
}

/// CSV exporter for the results table
pub struct CsvExporter {
    /// Whether to include headers
    pub include_headers: bool,
    /// Field delimiter
    pub delimiter: u8,
    /// Whether to start the file with a UTF-8 byte-order mark
    pub utf8_bom: bool,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            include_headers: true,
            delimiter: b',',
            utf8_bom: true,
        }
    }
}

impl CsvExporter {
    /// Create a new CSV exporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether to write the header row
    pub fn with_headers(mut self, include: bool) -> Self {
        self.include_headers = include;
        self
    }

    /// Set whether to write a byte-order mark
    pub fn with_bom(mut self, bom: bool) -> Self {
        self.utf8_bom = bom;
        self
    }
}

impl ViewExporter for CsvExporter {
    fn write(&self, page: &PageView, writer: &mut dyn Write) -> Result<()> {
        let table = page.table().ok_or_else(|| PharmacyError::Export {
            message: "No categories selected, so there is no table to export".to_string(),
            format: ExportFormat::Csv,
            suggestion: Some("Select at least one category with --category".to_string()),
        })?;

        if self.utf8_bom {
            writer.write_all("\u{feff}".as_bytes())?;
        }

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(writer);

        if self.include_headers {
            csv_writer.write_record(&table.headers)?;
        }
        for row in &table.rows {
            csv_writer.write_record([&row.name, &row.address, &row.phone, &row.categories])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }
}

const LEAFLET_VERSION: &str = "1.9.4";
const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const DEFAULT_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";

/// Standalone HTML map exporter
///
/// The page fits the map to the result bounds and places one marker per
/// located pharmacy with its popup and hover tooltip.
pub struct MapHtmlExporter {
    /// Tile layer URL template
    pub tile_url: String,
    /// Tile layer attribution (HTML)
    pub attribution: String,
}

impl Default for MapHtmlExporter {
    fn default() -> Self {
        Self {
            tile_url: DEFAULT_TILE_URL.to_string(),
            attribution: DEFAULT_ATTRIBUTION.to_string(),
        }
    }
}

impl MapHtmlExporter {
    /// Create a new map exporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different tile server
    pub fn with_tiles(mut self, url: impl Into<String>, attribution: impl Into<String>) -> Self {
        self.tile_url = url.into();
        self.attribution = attribution.into();
        self
    }
}

impl ViewExporter for MapHtmlExporter {
    fn write(&self, page: &PageView, writer: &mut dyn Write) -> Result<()> {
        let (bounds, markers, width, height) = match page.map() {
            Some(MapView::Located { bounds, markers, width, height }) => (bounds, markers, *width, *height),
            Some(MapView::NoLocationData) => return Err(no_map_error("None of the matching pharmacies has location data")),
            None => return Err(no_map_error("No categories selected, so there is nothing to map")),
        };

        let pins: Vec<serde_json::Value> = markers.iter().map(marker_json).collect();
        let pins = script_safe(&serde_json::to_string(&pins)?);
        let fit = script_safe(&serde_json::to_string(&[
            [bounds.south_west.latitude, bounds.south_west.longitude],
            [bounds.north_east.latitude, bounds.north_east.longitude],
        ])?);
        let tile_url = script_safe(&serde_json::to_string(&self.tile_url)?);
        let attribution = script_safe(&serde_json::to_string(&self.attribution)?);

        writeln!(writer, "<!DOCTYPE html>")?;
        writeln!(writer, "<html>")?;
        writeln!(writer, "<head>")?;
        writeln!(writer, "<meta charset=\"utf-8\">")?;
        writeln!(writer, "<title>{}</title>", escape_html(&page.title))?;
        writeln!(
            writer,
            "<link rel=\"stylesheet\" href=\"https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.css\">"
        )?;
        writeln!(
            writer,
            "<script src=\"https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.js\"></script>"
        )?;
        writeln!(writer, "</head>")?;
        writeln!(writer, "<body>")?;
        writeln!(writer, "<div id=\"map\" style=\"width: {width}px; height: {height}px;\"></div>")?;
        writeln!(writer, "<script>")?;
        writeln!(writer, "var map = L.map('map');")?;
        writeln!(writer, "L.tileLayer({tile_url}, {{ attribution: {attribution} }}).addTo(map);")?;
        writeln!(writer, "map.fitBounds({fit});")?;
        writeln!(writer, "var pins = {pins};")?;
        writeln!(writer, "pins.forEach(function (p) {{")?;
        writeln!(writer, "  L.marker([p.lat, p.lng]).addTo(map).bindPopup(p.popup).bindTooltip(p.tooltip);")?;
        writeln!(writer, "}});")?;
        writeln!(writer, "</script>")?;
        writeln!(writer, "</body>")?;
        writeln!(writer, "</html>")?;
        Ok(())
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }
}

fn no_map_error(message: &str) -> PharmacyError {
    PharmacyError::Export {
        message: message.to_string(),
        format: ExportFormat::Html,
        suggestion: Some("Choose categories whose pharmacies have coordinates".to_string()),
    }
}

fn marker_json(marker: &Marker) -> serde_json::Value {
    serde_json::json!({
        "lat": marker.position.latitude,
        "lng": marker.position.longitude,
        "popup": format!(
            "<b>{}</b><br>Address: {}<br>Collects: {}",
            escape_html(&marker.popup.name),
            escape_html(&marker.popup.address),
            escape_html(&marker.popup.categories)
        ),
        "tooltip": escape_html(&marker.tooltip),
    })
}

/// Escape text for use inside HTML
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// JSON embedded in a <script> block must not close it
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

// Export convenience functions for PageView
impl PageView {
    /// Export the whole page model as pretty JSON
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        JsonExporter::default().export(self, path.as_ref())
    }

    /// Export the results table as CSV
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        CsvExporter::default().export(self, path.as_ref())
    }

    /// Export the map as a standalone HTML page
    pub fn export_map<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        MapHtmlExporter::default().export(self, path.as_ref())
    }

    /// Export in the given format
    pub fn export<P: AsRef<Path>>(&self, path: P, format: ExportFormat) -> Result<()> {
        match format {
            ExportFormat::Json => self.export_json(path),
            ExportFormat::Csv => self.export_csv(path),
            ExportFormat::Html => self.export_map(path),
        }
    }
}
