/*!
 * Directions to a selected pharmacy
 *
 * Routing goes through the [`DirectionsProvider`] trait. The bundled
 * [`StubDirections`] provider makes no network call: it builds a maps deep
 * link and reports a canned route.
 */

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data_types::PharmacyRecord;
use crate::view::Notice;
use crate::Result;

/// Default deep-link prefix; origin and destination are appended as query parameters
pub const DEFAULT_DIRECTIONS_BASE_URL: &str = "https://www.google.com/maps/dir/?api=1";

/// Build a directions deep link
///
/// Origin and destination are inserted verbatim, without percent-encoding.
pub fn directions_url(base_url: &str, origin: &str, destination: &str) -> String {
    format!("{base_url}&origin={origin}&destination={destination}")
}

/// A single route returned by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub distance: String,
    pub duration: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_summary: Option<String>,
}

/// Provider answer for one origin/destination pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub map_url: String,
    pub routes: Vec<Route>,
}

/// Source of routes between a free-text origin and a destination address
pub trait DirectionsProvider {
    fn route(&self, origin: &str, destination: &str) -> Result<RouteResponse>;
}

/// Provider that returns a fixed route and a deep link, without any network call
#[derive(Debug, Clone)]
pub struct StubDirections {
    base_url: String,
}

impl Default for StubDirections {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTIONS_BASE_URL)
    }
}

impl StubDirections {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    /// The route reported for every request
    pub fn canned_route() -> Route {
        Route {
            distance: "about 10 km".to_string(),
            duration: "about 20 min".to_string(),
            summary: "optimal route".to_string(),
            traffic_summary: None,
        }
    }
}

impl DirectionsProvider for StubDirections {
    fn route(&self, origin: &str, destination: &str) -> Result<RouteResponse> {
        Ok(RouteResponse {
            map_url: directions_url(&self.base_url, origin, destination),
            routes: vec![Self::canned_route()],
        })
    }
}

/// A user's request for directions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionsRequest {
    /// Pharmacy name chosen from the dropdown
    pub pharmacy: Option<String>,
    /// Free-text starting point
    pub origin: String,
}

impl DirectionsRequest {
    pub fn new(pharmacy: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            pharmacy: Some(pharmacy.into()),
            origin: origin.into(),
        }
    }
}

/// Outcome of a directions action, shown under the dropdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionsOutcome {
    pub notices: Vec<Notice>,
    /// Present only when a route was found
    pub route: Option<Route>,
    /// Deep link, present whenever the provider answered
    pub map_url: Option<String>,
}

impl DirectionsOutcome {
    fn aborted(notice: Notice) -> Self {
        Self { notices: vec![notice], route: None, map_url: None }
    }
}

/// Resolve a directions request against the pharmacies offered in the dropdown
///
/// `candidates` are the filtered pharmacies that have coordinates; the
/// destination is the first one whose name matches exactly.
///
/// An origin made only of whitespace counts as missing and yields the same
/// warning as an empty one. A non-blank origin is passed on untrimmed.
pub fn request_directions(
    candidates: &[&PharmacyRecord],
    request: &DirectionsRequest,
    provider: &dyn DirectionsProvider,
) -> DirectionsOutcome {
    let origin = request.origin.trim();
    let pharmacy = request.pharmacy.as_deref().filter(|name| !name.is_empty());

    let (Some(pharmacy), false) = (pharmacy, origin.is_empty()) else {
        return DirectionsOutcome::aborted(Notice::warning(
            "Please choose a pharmacy and enter a starting address.",
        ));
    };

    let Some(destination) = candidates.iter().find(|r| r.name == pharmacy) else {
        warn!(pharmacy, "directions requested for a pharmacy outside the current results");
        return DirectionsOutcome::aborted(Notice::warning(format!(
            "'{pharmacy}' is not among the pharmacies shown on the map."
        )));
    };

    let mut notices = vec![Notice::info(format!(
        "Finding a route from '{}' to '{}({})'...",
        request.origin, destination.name, destination.address
    ))];

    debug!(origin = %request.origin, destination = %destination.address, "requesting route");

    match provider.route(&request.origin, &destination.address) {
        Ok(response) => match response.routes.into_iter().next() {
            Some(route) => {
                notices.push(Notice::success(format!(
                    "Total distance: {}, estimated time: {}",
                    route.distance, route.duration
                )));
                if let Some(traffic) = route.traffic_summary.as_deref().filter(|t| !t.is_empty()) {
                    notices.push(Notice::warning(format!("Traffic: {traffic}")));
                }
                DirectionsOutcome {
                    notices,
                    route: Some(route),
                    map_url: Some(response.map_url),
                }
            }
            None => {
                notices.push(Notice::warning(
                    "No route found. Check the starting address and the destination address.",
                ));
                DirectionsOutcome { notices, route: None, map_url: Some(response.map_url) }
            }
        },
        Err(e) => {
            warn!(error = %e, "directions provider failed");
            notices.push(Notice::error(format!("An error occurred while finding directions: {e}")));
            DirectionsOutcome { notices, route: None, map_url: None }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::NoticeLevel;
    use crate::PharmacyError;

    fn pharmacy(name: &str, address: &str) -> PharmacyRecord {
        PharmacyRecord {
            name: name.to_string(),
            address: address.to_string(),
            phone: String::new(),
            categories: "감기약".to_string(),
            latitude: Some(36.8),
            longitude: Some(127.1),
        }
    }

    struct FailingProvider;

    impl DirectionsProvider for FailingProvider {
        fn route(&self, _origin: &str, _destination: &str) -> Result<RouteResponse> {
            Err(PharmacyError::Directions { message: "backend unreachable".to_string() })
        }
    }

    struct TrafficProvider;

    impl DirectionsProvider for TrafficProvider {
        fn route(&self, origin: &str, destination: &str) -> Result<RouteResponse> {
            let mut route = StubDirections::canned_route();
            route.traffic_summary = Some("heavy near the station".to_string());
            Ok(RouteResponse {
                map_url: directions_url(DEFAULT_DIRECTIONS_BASE_URL, origin, destination),
                routes: vec![route],
            })
        }
    }

    struct EmptyProvider;

    impl DirectionsProvider for EmptyProvider {
        fn route(&self, _origin: &str, _destination: &str) -> Result<RouteResponse> {
            Ok(RouteResponse { map_url: String::new(), routes: Vec::new() })
        }
    }

    #[test]
    fn test_url_is_verbatim() {
        assert_eq!(
            directions_url(DEFAULT_DIRECTIONS_BASE_URL, "서울역", "천안시 서북구 불당동 1"),
            "https://www.google.com/maps/dir/?api=1&origin=서울역&destination=천안시 서북구 불당동 1"
        );
    }

    #[test]
    fn test_stub_route_uses_first_name_match() {
        let a = pharmacy("A", "first address");
        let a2 = pharmacy("A", "second address");
        let outcome = request_directions(
            &[&a, &a2],
            &DirectionsRequest::new("A", "MY_HOME"),
            &StubDirections::default(),
        );
        assert_eq!(
            outcome.map_url.as_deref(),
            Some("https://www.google.com/maps/dir/?api=1&origin=MY_HOME&destination=first address")
        );
        assert_eq!(outcome.route, Some(StubDirections::canned_route()));
        assert_eq!(outcome.notices[0].level, NoticeLevel::Info);
        assert_eq!(outcome.notices[1].level, NoticeLevel::Success);
    }

    #[test]
    fn test_missing_input_aborts() {
        let a = pharmacy("A", "addr");
        for request in [
            DirectionsRequest::new("A", "  "),
            DirectionsRequest { pharmacy: None, origin: "서울역".to_string() },
            DirectionsRequest::new("", "서울역"),
        ] {
            let outcome = request_directions(&[&a], &request, &StubDirections::default());
            assert_eq!(outcome.notices.len(), 1);
            assert_eq!(outcome.notices[0].level, NoticeLevel::Warning);
            assert!(outcome.map_url.is_none());
        }
    }

    #[test]
    fn test_unknown_pharmacy_aborts() {
        let a = pharmacy("A", "addr");
        let outcome = request_directions(&[&a], &DirectionsRequest::new("B", "서울역"), &StubDirections::default());
        assert_eq!(outcome.notices[0].level, NoticeLevel::Warning);
        assert!(outcome.route.is_none());
    }

    #[test]
    fn test_provider_error_is_reported() {
        let a = pharmacy("A", "addr");
        let outcome = request_directions(&[&a], &DirectionsRequest::new("A", "서울역"), &FailingProvider);
        let last = outcome.notices.last().unwrap();
        assert_eq!(last.level, NoticeLevel::Error);
        assert!(last.message.contains("backend unreachable"));
    }

    #[test]
    fn test_traffic_and_empty_routes() {
        let a = pharmacy("A", "addr");
        let request = DirectionsRequest::new("A", "서울역");

        let outcome = request_directions(&[&a], &request, &TrafficProvider);
        let last = outcome.notices.last().unwrap();
        assert_eq!(last.level, NoticeLevel::Warning);
        assert!(last.message.contains("heavy near the station"));

        let outcome = request_directions(&[&a], &request, &EmptyProvider);
        assert!(outcome.route.is_none());
        assert_eq!(outcome.notices.last().unwrap().level, NoticeLevel::Warning);
    }
}
