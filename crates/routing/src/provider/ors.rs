//! OpenRouteService routing provider.
//!
//! Used as the secondary provider when the caller supplies an API key.
//! Speaks the `POST /v2/directions/{profile}/geojson` protocol with the key
//! in the `Authorization` header.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::models::types::{ResolvedRoute, Result, RoutePoint, RoutingError, TransportMode};
use crate::provider::RouteProvider;

pub const PUBLIC_ORS_URL: &str = "https://api.openrouteservice.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

fn profile(mode: TransportMode) -> &'static str {
    match mode {
        TransportMode::Car => "driving-car",
        TransportMode::Bike => "cycling-regular",
        TransportMode::Foot => "foot-walking",
    }
}

pub struct OrsProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OrsProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, PUBLIC_ORS_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    async fn request(&self, points: &[RoutePoint], mode: TransportMode) -> Result<ResolvedRoute> {
        let url = format!("{}/v2/directions/{}/geojson", self.base_url, profile(mode));
        // ORS wants [[lng, lat], ...]
        let coordinates: Vec<[f64; 2]> = points.iter().map(|p| [p.lng, p.lat]).collect();
        debug!(mode = %mode, "requesting ORS route");

        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.api_key)
            .json(&json!({ "coordinates": coordinates }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| RoutingError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::from_status(status.as_u16()));
        }

        let body: OrsResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::Malformed(e.to_string()))?;

        parse_route(body)
    }
}

impl RouteProvider for OrsProvider {
    fn name(&self) -> &'static str {
        "ors"
    }

    fn fetch_route<'a>(
        &'a self,
        points: &'a [RoutePoint],
        mode: TransportMode,
    ) -> Pin<Box<dyn Future<Output = Result<ResolvedRoute>> + Send + 'a>> {
        Box::pin(self.request(points, mode))
    }
}

// ---- Wire format (GeoJSON FeatureCollection) ----

#[derive(Deserialize)]
struct OrsResponse {
    #[serde(default)]
    features: Vec<OrsFeature>,
}

#[derive(Deserialize)]
struct OrsFeature {
    geometry: OrsGeometry,
    #[serde(default)]
    properties: OrsProperties,
}

#[derive(Deserialize)]
struct OrsGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Deserialize, Default)]
struct OrsProperties {
    #[serde(default)]
    summary: OrsSummary,
}

#[derive(Deserialize, Default)]
struct OrsSummary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

fn parse_route(body: OrsResponse) -> Result<ResolvedRoute> {
    let feature = body
        .features
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::Malformed("no features in response".into()))?;

    if feature.geometry.coordinates.len() < 2 {
        return Err(RoutingError::Malformed("empty route geometry".into()));
    }

    Ok(ResolvedRoute {
        coordinates: feature
            .geometry
            .coordinates
            .into_iter()
            .map(|[lng, lat]| RoutePoint::new(lat, lng))
            .collect(),
        distance_meters: feature.properties.summary.distance,
        duration_seconds: feature.properties.summary.duration,
        is_optimal: true,
    })
}
