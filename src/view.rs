/*!
 * Page model and rendering
 *
 * [`render`] turns the current [`ViewState`] and the loaded dataset into a
 * [`PageView`]: notices, checkbox grid, results table, map markers and the
 * directions panel. It has no side effects; a shell re-renders the whole page
 * after every user event.
 */

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FinderConfig;
use crate::data_types::{Coordinates, PharmacyRecord};
use crate::dataset::PharmacyDataset;
use crate::directions::{request_directions, DirectionsOutcome, DirectionsProvider, DirectionsRequest, StubDirections};
use crate::filter::{filter_pharmacies, FilterOutcome};
use crate::selection::{apply_selection_limit, CheckboxGrid};

pub const PAGE_TITLE: &str = "💊 Find pharmacies that collect unused medication";
pub const PAGE_INTRO: &str =
    "Pick the kinds of medication you want to return to see the pharmacies that take them in a table and on the map.";

/// Severity of a message shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Error,
    Warning,
    Info,
    Success,
}

/// A message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }
}

/// Everything the user has entered so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    /// Checked categories, in the order they were checked
    pub checked: Vec<String>,
    /// Pharmacy picked in the directions dropdown
    pub pharmacy: Option<String>,
    /// Text typed into the origin field
    pub origin: String,
    /// Whether the directions button was pressed for this render
    pub directions_requested: bool,
}

impl ViewState {
    pub fn with_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            checked: categories.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Press the directions button with the given inputs
    pub fn request_directions(mut self, pharmacy: impl Into<String>, origin: impl Into<String>) -> Self {
        self.pharmacy = Some(pharmacy.into());
        self.origin = origin.into();
        self.directions_requested = true;
        self
    }
}

/// One row of the results table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub categories: String,
}

impl From<&PharmacyRecord> for TableRow {
    fn from(record: &PharmacyRecord) -> Self {
        Self {
            name: record.name.clone(),
            address: record.address.clone(),
            phone: record.phone.clone(),
            categories: record.categories.clone(),
        }
    }
}

/// Results table: name, address, phone and categories of every match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub headers: [String; 4],
    pub rows: Vec<TableRow>,
}

/// Corners of the area covering every marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

impl Bounds {
    /// Smallest box containing all points, `None` for no points
    pub fn enclosing<I: IntoIterator<Item = Coordinates>>(points: I) -> Option<Self> {
        points.into_iter().fold(None, |acc: Option<Bounds>, p| {
            Some(match acc {
                None => Bounds { south_west: p, north_east: p },
                Some(b) => Bounds {
                    south_west: Coordinates::new(
                        b.south_west.latitude.min(p.latitude),
                        b.south_west.longitude.min(p.longitude),
                    ),
                    north_east: Coordinates::new(
                        b.north_east.latitude.max(p.latitude),
                        b.north_east.longitude.max(p.longitude),
                    ),
                },
            })
        })
    }

    pub fn center(&self) -> Coordinates {
        Coordinates::new(
            (self.south_west.latitude + self.north_east.latitude) / 2.0,
            (self.south_west.longitude + self.north_east.longitude) / 2.0,
        )
    }
}

/// Content of a marker popup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerPopup {
    pub name: String,
    pub address: String,
    pub categories: String,
}

/// A map pin for one pharmacy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: Coordinates,
    pub popup: MarkerPopup,
    /// Text shown on hover
    pub tooltip: String,
}

impl Marker {
    /// Marker for a record, `None` when it lacks coordinates
    pub fn for_record(record: &PharmacyRecord) -> Option<Self> {
        Some(Self {
            position: record.coordinates()?,
            popup: MarkerPopup {
                name: record.name.clone(),
                address: record.address.clone(),
                categories: record.categories.clone(),
            },
            tooltip: record.name.clone(),
        })
    }
}

/// Map section of the results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MapView {
    Located {
        bounds: Bounds,
        markers: Vec<Marker>,
        width: u32,
        height: u32,
    },
    NoLocationData,
}

impl MapView {
    pub fn markers(&self) -> &[Marker] {
        match self {
            MapView::Located { markers, .. } => markers,
            MapView::NoLocationData => &[],
        }
    }
}

/// Directions dropdown, origin field and the outcome of the last button press
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionsPanel {
    /// Names of the pharmacies on the map, in table order
    pub options: Vec<String>,
    /// Currently chosen option
    pub selected: Option<String>,
    pub origin: String,
    pub outcome: Option<DirectionsOutcome>,
}

/// Results section of the page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultsView {
    NothingSelected,
    Results {
        selected: Vec<String>,
        table: TableView,
        map: MapView,
        /// Only offered when the map has markers
        directions: Option<DirectionsPanel>,
    },
}

/// Whole page model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub title: String,
    pub intro: String,
    pub selection_heading: String,
    pub grid: CheckboxGrid,
    pub notices: Vec<Notice>,
    pub results: ResultsView,
}

impl PageView {
    pub fn table(&self) -> Option<&TableView> {
        match &self.results {
            ResultsView::Results { table, .. } => Some(table),
            ResultsView::NothingSelected => None,
        }
    }

    pub fn map(&self) -> Option<&MapView> {
        match &self.results {
            ResultsView::Results { map, .. } => Some(map),
            ResultsView::NothingSelected => None,
        }
    }

    pub fn directions(&self) -> Option<&DirectionsPanel> {
        match &self.results {
            ResultsView::Results { directions, .. } => directions.as_ref(),
            ResultsView::NothingSelected => None,
        }
    }
}

/// Render the page with the stub directions provider from the config
pub fn render(state: &ViewState, dataset: &PharmacyDataset, config: &FinderConfig) -> PageView {
    let provider = StubDirections::new(config.directions_base_url.clone());
    render_with(state, dataset, config, &provider)
}

/// Render the page with a given directions provider
pub fn render_with(
    state: &ViewState,
    dataset: &PharmacyDataset,
    config: &FinderConfig,
    provider: &dyn DirectionsProvider,
) -> PageView {
    let max = config.max_selected_categories;
    let categories = dataset.categories();
    let mut notices = Vec::new();

    let selection = apply_selection_limit(&state.checked, max);
    if selection.was_truncated() {
        debug!(dropped = selection.dropped, "selection over the limit");
        notices.push(Notice::error(format!("You can select at most {max} categories.")));
    }

    let grid = CheckboxGrid::new(&categories, &state.checked, config.grid_columns);

    let outcome = filter_pharmacies(dataset, &selection.categories, config.match_mode);
    let results = match &outcome {
        FilterOutcome::NothingSelected => {
            notices.push(Notice::info("Select the medication categories above."));
            ResultsView::NothingSelected
        }
        FilterOutcome::Matched(records) => {
            notices.push(Notice::success(format!(
                "Selected categories: [{}] → {} pharmacies",
                selection.categories.join(", "),
                records.len()
            )));

            let table = TableView {
                headers: [
                    config.columns.name.clone(),
                    config.columns.address.clone(),
                    config.columns.phone.clone(),
                    config.columns.categories.clone(),
                ],
                rows: records.iter().map(|r| TableRow::from(*r)).collect(),
            };

            let located = outcome.located();
            let markers: Vec<Marker> = located.iter().filter_map(|r| Marker::for_record(r)).collect();
            let (map, directions) = match Bounds::enclosing(markers.iter().map(|m| m.position)) {
                Some(bounds) => {
                    let panel = directions_panel(state, &located, provider);
                    let map = MapView::Located {
                        bounds,
                        markers,
                        width: config.map_width,
                        height: config.map_height,
                    };
                    (map, Some(panel))
                }
                None => {
                    notices.push(Notice::info("No location data."));
                    (MapView::NoLocationData, None)
                }
            };

            ResultsView::Results {
                selected: selection.categories.clone(),
                table,
                map,
                directions,
            }
        }
    };

    PageView {
        title: PAGE_TITLE.to_string(),
        intro: PAGE_INTRO.to_string(),
        selection_heading: format!("♻️ Medication categories (up to {max})"),
        grid,
        notices,
        results,
    }
}

fn directions_panel(
    state: &ViewState,
    located: &[&PharmacyRecord],
    provider: &dyn DirectionsProvider,
) -> DirectionsPanel {
    let options: Vec<String> = located.iter().map(|r| r.name.clone()).collect();

    // A dropdown always shows one of its options; fall back to the first
    let selected = state.pharmacy
        .as_ref()
        .filter(|p| options.contains(p))
        .or_else(|| options.first())
        .cloned();

    // The request names what the user picked; the shown default only stands in when nothing was picked
    let outcome = state.directions_requested.then(|| {
        let request = DirectionsRequest {
            pharmacy: state.pharmacy.clone().or_else(|| options.first().cloned()),
            origin: state.origin.clone(),
        };
        request_directions(located, &request, provider)
    });

    DirectionsPanel {
        options,
        selected,
        origin: state.origin.clone(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, categories: &str, coords: Option<(f64, f64)>) -> PharmacyRecord {
        PharmacyRecord {
            name: name.to_string(),
            address: format!("{name}-address"),
            phone: "041".to_string(),
            categories: categories.to_string(),
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
        }
    }

    fn scenario() -> PharmacyDataset {
        PharmacyDataset::new(vec![
            record("A", "혈압약, 감기약", Some((1.0, 1.0))),
            record("B", "소화제", None),
        ])
    }

    #[test]
    fn test_two_row_scenario() {
        let page = render(&ViewState::with_categories(["감기약"]), &scenario(), &FinderConfig::default());
        let table = page.table().unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].name, "A");
        assert_eq!(page.map().unwrap().markers().len(), 1);
        assert_eq!(page.directions().unwrap().options, vec!["A".to_string()]);
        assert_eq!(page.directions().unwrap().selected.as_deref(), Some("A"));
    }

    #[test]
    fn test_nothing_selected() {
        let page = render(&ViewState::default(), &scenario(), &FinderConfig::default());
        assert_eq!(page.results, ResultsView::NothingSelected);
        assert_eq!(page.notices, vec![Notice::info("Select the medication categories above.")]);
        assert_eq!(page.grid.iter().count(), 3);
    }

    #[test]
    fn test_unlocated_rows_stay_in_table_only() {
        let page = render(&ViewState::with_categories(["소화제"]), &scenario(), &FinderConfig::default());
        assert_eq!(page.table().unwrap().rows[0].name, "B");
        assert_eq!(page.map(), Some(&MapView::NoLocationData));
        assert!(page.directions().is_none());
        assert!(page.notices.iter().any(|n| n.message == "No location data."));
    }

    #[test]
    fn test_selection_over_limit_is_truncated() {
        let ds = PharmacyDataset::new(vec![
            record("A", "a1", Some((1.0, 1.0))),
            record("B", "b1", Some((1.0, 1.0))),
            record("C", "c1", Some((1.0, 1.0))),
            record("D", "d1", Some((1.0, 1.0))),
        ]);
        let state = ViewState::with_categories(["d1", "a1", "c1", "b1"]);
        let page = render(&state, &ds, &FinderConfig::default());
        assert_eq!(page.notices[0].level, NoticeLevel::Error);
        match &page.results {
            ResultsView::Results { selected, table, .. } => {
                assert_eq!(selected, &vec!["d1".to_string(), "a1".to_string(), "c1".to_string()]);
                let names: Vec<&str> = table.rows.iter().map(|r| r.name.as_str()).collect();
                assert_eq!(names, vec!["A", "C", "D"]);
            }
            other => panic!("unexpected results: {other:?}"),
        }
        // the grid still shows all four boxes as ticked
        assert_eq!(page.grid.iter().filter(|c| c.checked).count(), 4);
    }

    #[test]
    fn test_bounds_cover_all_markers() {
        let ds = PharmacyDataset::new(vec![
            record("A", "x", Some((36.80, 127.15))),
            record("B", "x", Some((36.83, 127.10))),
            record("C", "x", Some((36.78, 127.12))),
        ]);
        let page = render(&ViewState::with_categories(["x"]), &ds, &FinderConfig::default());
        match page.map().unwrap() {
            MapView::Located { bounds, markers, width, height } => {
                assert_eq!(bounds.south_west, Coordinates::new(36.78, 127.10));
                assert_eq!(bounds.north_east, Coordinates::new(36.83, 127.15));
                assert_eq!(markers[1].tooltip, "B");
                assert_eq!(markers[1].popup.address, "B-address");
                assert_eq!((*width, *height), (800, 500));
            }
            MapView::NoLocationData => panic!("expected markers"),
        }
    }

    #[test]
    fn test_directions_through_render() {
        let state = ViewState::with_categories(["감기약"]).request_directions("A", "서울역");
        let page = render(&state, &scenario(), &FinderConfig::default());
        let outcome = page.directions().unwrap().outcome.as_ref().unwrap();
        assert_eq!(
            outcome.map_url.as_deref(),
            Some("https://www.google.com/maps/dir/?api=1&origin=서울역&destination=A-address")
        );
    }

    #[test]
    fn test_directions_missing_origin_warns() {
        let state = ViewState::with_categories(["감기약"]).request_directions("A", "");
        let page = render(&state, &scenario(), &FinderConfig::default());
        let outcome = page.directions().unwrap().outcome.as_ref().unwrap();
        assert_eq!(outcome.notices[0].level, NoticeLevel::Warning);
        assert!(outcome.map_url.is_none());
    }

    #[test]
    fn test_directions_to_unlisted_pharmacy_warns_without_route() {
        let ds = PharmacyDataset::new(vec![
            record("A", "감기약", Some((1.0, 1.0))),
            record("B", "감기약", Some((2.0, 2.0))),
        ]);
        let state = ViewState::with_categories(["감기약"]).request_directions("Typo Pharmacy", "서울역");
        let page = render(&state, &ds, &FinderConfig::default());
        let panel = page.directions().unwrap();
        // the dropdown still shows its first option
        assert_eq!(panel.selected.as_deref(), Some("A"));

        let outcome = panel.outcome.as_ref().unwrap();
        assert_eq!(outcome.notices.len(), 1);
        assert_eq!(outcome.notices[0].level, NoticeLevel::Warning);
        assert!(outcome.notices[0].message.contains("Typo Pharmacy"));
        assert!(outcome.route.is_none());
        assert!(outcome.map_url.is_none());
    }

    #[test]
    fn test_directions_without_pick_use_first_option() {
        let mut state = ViewState::with_categories(["감기약"]);
        state.origin = "서울역".to_string();
        state.directions_requested = true;
        let page = render(&state, &scenario(), &FinderConfig::default());
        let outcome = page.directions().unwrap().outcome.as_ref().unwrap();
        assert_eq!(
            outcome.map_url.as_deref(),
            Some("https://www.google.com/maps/dir/?api=1&origin=서울역&destination=A-address")
        );
    }

    #[test]
    fn test_bounds_enclosing_empty() {
        assert!(Bounds::enclosing(std::iter::empty()).is_none());
    }
}
