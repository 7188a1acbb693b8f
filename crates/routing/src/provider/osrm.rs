//! OSRM-compatible routing provider.
//!
//! Speaks the `GET /route/v1/{profile}/{coordinates}` protocol of
//! `router.project-osrm.org` and any self-hosted OSRM instance. No API key.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::models::types::{ResolvedRoute, Result, RoutePoint, RoutingError, TransportMode};
use crate::provider::RouteProvider;

/// The public demo instance. Only the `driving` profile is fully supported
/// there; self-hosted instances also serve `cycling` and `walking`.
pub const PUBLIC_OSRM_URL: &str = "https://router.project-osrm.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

fn profile(mode: TransportMode) -> &'static str {
    match mode {
        TransportMode::Car => "driving",
        TransportMode::Bike => "cycling",
        TransportMode::Foot => "walking",
    }
}

pub struct OsrmProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmProvider {
    pub fn new() -> Self {
        Self::with_base_url(PUBLIC_OSRM_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn request(&self, points: &[RoutePoint], mode: TransportMode) -> Result<ResolvedRoute> {
        // OSRM wants "lng,lat;lng,lat;..."
        let coords = points
            .iter()
            .map(|p| format!("{},{}", p.lng, p.lat))
            .collect::<Vec<_>>()
            .join(";");
        let url = format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson",
            self.base_url,
            profile(mode),
            coords
        );
        debug!(mode = %mode, "requesting OSRM route");

        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| RoutingError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::from_status(status.as_u16()));
        }

        let body: OsrmResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::Malformed(e.to_string()))?;

        parse_route(body)
    }
}

impl Default for OsrmProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteProvider for OsrmProvider {
    fn name(&self) -> &'static str {
        "osrm"
    }

    fn fetch_route<'a>(
        &'a self,
        points: &'a [RoutePoint],
        mode: TransportMode,
    ) -> Pin<Box<dyn Future<Output = Result<ResolvedRoute>> + Send + 'a>> {
        Box::pin(self.request(points, mode))
    }
}

// ---- Wire format ----

#[derive(Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    // GeoJSON order: [lng, lat]
    coordinates: Vec<[f64; 2]>,
}

fn parse_route(body: OsrmResponse) -> Result<ResolvedRoute> {
    let route = body
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::Malformed("no routes in response".into()))?;

    if route.geometry.coordinates.len() < 2 {
        return Err(RoutingError::Malformed("empty route geometry".into()));
    }

    Ok(ResolvedRoute {
        coordinates: route
            .geometry
            .coordinates
            .into_iter()
            .map(|[lng, lat]| RoutePoint::new(lat, lng))
            .collect(),
        distance_meters: route.distance,
        duration_seconds: route.duration,
        is_optimal: true,
    })
}
