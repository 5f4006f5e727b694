//! Client for the external geocoding search endpoint.
//!
//! One HTTP GET per search: free-text query, a result-count limit, and a
//! fixed country-code allow-list. The service determines match ranking; no
//! re-ranking, deduplication, or filtering happens on this side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::GeocoderConfig;

// ─── Wire types ───────────────────────────────────────────────────────────────

/// One geocoding search result, not yet committed as a selection.
///
/// Created fresh on every successful search response and discarded on the
/// next search or on selection. Latitude and longitude stay string-encoded
/// exactly as the endpoint returns them; they are parsed only when the
/// candidate is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Human-readable display label. Free text, not guaranteed unique.
    pub display_name: String,
    /// String-encoded decimal latitude.
    pub lat: String,
    /// String-encoded decimal longitude.
    pub lon: String,
    /// Opaque identifier, used only for list-rendering stability.
    pub place_id: i64,
}

impl SearchCandidate {
    /// First comma-separated segment of the display label — shown as the
    /// bold primary line in suggestion panels. Display only; the label is
    /// never parsed into structured address components.
    pub fn primary_line(&self) -> &str {
        self.display_name
            .split(',')
            .next()
            .unwrap_or(&self.display_name)
            .trim()
    }

    /// Parse this candidate into a committed location.
    ///
    /// Returns `None` when the upstream lat/lon strings do not parse as
    /// decimals. No range validation is performed — out-of-range upstream
    /// coordinates propagate as-is.
    pub fn to_location(&self) -> Option<SelectedLocation> {
        Some(SelectedLocation {
            latitude: self.lat.trim().parse().ok()?,
            longitude: self.lon.trim().parse().ok()?,
            address: self.display_name.clone(),
        })
    }
}

/// The value a committed selection produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Failure modes when contacting the geocoding endpoint.
///
/// Callers collapse both variants to the same user-visible outcome (an empty
/// candidate list); the distinction exists for diagnostics only.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network or HTTP-status failure reaching the endpoint.
    #[error("geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The endpoint answered, but the body was not a candidate list.
    #[error("malformed geocoding response: {0}")]
    MalformedResponse(String),
}

// ─── SearchBackend seam ───────────────────────────────────────────────────────

/// Anything that can turn a free-text query into ranked candidates.
///
/// The autocomplete engine is generic over this trait so tests can substitute
/// a scripted backend for the real HTTP client.
#[async_trait]
pub trait SearchBackend: Send + Sync + 'static {
    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, GeocodeError>;
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// HTTP client for the geocoding search endpoint.
pub struct GeocodeClient {
    http: reqwest::Client,
    base_url: String,
    result_limit: u32,
    country_codes: String,
}

impl GeocodeClient {
    pub fn new(cfg: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("shopregd/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            result_limit: cfg.result_limit,
            country_codes: cfg.country_codes.clone(),
        })
    }

    /// Search with the configured result limit.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, GeocodeError> {
        self.search_with_limit(query, self.result_limit).await
    }

    /// Search with an explicit result limit (hot-reloaded limit overrides).
    pub async fn search_with_limit(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SearchCandidate>, GeocodeError> {
        let url = format!("{}/search", self.base_url);
        debug!(query, limit, "geocode search");
        let body = self
            .http
            .get(&url)
            .query(&self.search_params(query, limit))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let candidates: Vec<SearchCandidate> = serde_json::from_str(&body)
            .map_err(|e| GeocodeError::MalformedResponse(e.to_string()))?;
        Ok(candidates)
    }

    /// Query parameters for one search request.
    fn search_params(&self, query: &str, limit: u32) -> Vec<(&'static str, String)> {
        vec![
            ("format", "json".to_string()),
            ("q", query.to_string()),
            ("limit", limit.to_string()),
            ("countrycodes", self.country_codes.clone()),
        ]
    }
}

#[async_trait]
impl SearchBackend for GeocodeClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, GeocodeError> {
        GeocodeClient::search(self, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeocoderConfig;

    fn client() -> GeocodeClient {
        GeocodeClient::new(&GeocoderConfig::default()).unwrap()
    }

    #[test]
    fn search_params_carry_limit_and_country_scope() {
        let params = client().search_params("Tariq Road Karachi", 5);
        assert!(params.contains(&("format", "json".to_string())));
        assert!(params.contains(&("q", "Tariq Road Karachi".to_string())));
        assert!(params.contains(&("limit", "5".to_string())));
        let codes = &params
            .iter()
            .find(|(k, _)| *k == "countrycodes")
            .unwrap()
            .1;
        assert_eq!(codes.split(',').count(), 20);
        assert!(codes.split(',').any(|c| c == "pk"));
    }

    #[test]
    fn candidate_deserializes_from_endpoint_json() {
        let body = r#"[{
            "place_id": 287781008,
            "licence": "Data © OpenStreetMap contributors",
            "osm_type": "way",
            "lat": "24.8607",
            "lon": "67.0011",
            "display_name": "Tariq Road, Karachi, Pakistan",
            "importance": 0.41
        }]"#;
        let candidates: Vec<SearchCandidate> = serde_json::from_str(body).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].display_name, "Tariq Road, Karachi, Pakistan");
        assert_eq!(candidates[0].lat, "24.8607");
        assert_eq!(candidates[0].place_id, 287781008);
    }

    #[test]
    fn primary_line_is_first_comma_segment() {
        let c = SearchCandidate {
            display_name: "Tariq Road, Karachi, Pakistan".to_string(),
            lat: "24.8607".to_string(),
            lon: "67.0011".to_string(),
            place_id: 1,
        };
        assert_eq!(c.primary_line(), "Tariq Road");

        let no_comma = SearchCandidate {
            display_name: "Karachi".to_string(),
            ..c
        };
        assert_eq!(no_comma.primary_line(), "Karachi");
    }

    #[test]
    fn to_location_round_trips_lat_lon_and_label() {
        let c = SearchCandidate {
            display_name: "Tariq Road, Karachi, Pakistan".to_string(),
            lat: "24.8607".to_string(),
            lon: "67.0011".to_string(),
            place_id: 1,
        };
        let loc = c.to_location().unwrap();
        assert_eq!(loc.latitude, 24.8607);
        assert_eq!(loc.longitude, 67.0011);
        assert_eq!(loc.address, "Tariq Road, Karachi, Pakistan");
    }

    #[test]
    fn to_location_rejects_unparseable_coordinates() {
        let c = SearchCandidate {
            display_name: "Nowhere".to_string(),
            lat: "not-a-number".to_string(),
            lon: "67.0011".to_string(),
            place_id: 1,
        };
        assert!(c.to_location().is_none());
    }

    #[test]
    fn malformed_body_is_its_own_error() {
        let err = serde_json::from_str::<Vec<SearchCandidate>>("{\"oops\":true}")
            .map_err(|e| GeocodeError::MalformedResponse(e.to_string()))
            .unwrap_err();
        assert!(matches!(err, GeocodeError::MalformedResponse(_)));
    }
}
