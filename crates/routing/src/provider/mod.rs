//! Routing providers.
//!
//! Each provider turns an ordered point list and a transport mode into a
//! routed path with distance and duration. The resolver treats primary and
//! secondary providers as interchangeable implementations of one trait; which
//! service sits behind it is a construction-time detail.

pub mod ors;
pub mod osrm;

use std::future::Future;
use std::pin::Pin;

use crate::models::types::{ResolvedRoute, Result, RoutePoint, TransportMode};

pub use ors::OrsProvider;
pub use osrm::OsrmProvider;

/// Fetch a routed path between ordered points.
pub trait RouteProvider: Send + Sync {
    /// Short name for log lines.
    fn name(&self) -> &'static str;

    fn fetch_route<'a>(
        &'a self,
        points: &'a [RoutePoint],
        mode: TransportMode,
    ) -> Pin<Box<dyn Future<Output = Result<ResolvedRoute>> + Send + 'a>>;
}

/// Pin a provider geometry to the requested endpoints and sane metrics.
///
/// Routing engines snap to the road network, so the raw geometry can start or
/// end slightly off the requested points. The displayed path must begin and
/// end exactly where the user placed markers, and the distance must be a
/// non-negative finite number.
pub(crate) fn normalize_route(requested: &[RoutePoint], mut route: ResolvedRoute) -> ResolvedRoute {
    if let (Some(&start), Some(&end)) = (requested.first(), requested.last()) {
        if let Some(first) = route.coordinates.first_mut() {
            *first = start;
        }
        if let Some(last) = route.coordinates.last_mut() {
            *last = end;
        }
    }
    // NaN and negative distances both collapse to zero here.
    route.distance_meters = route.distance_meters.max(0.0);
    route.duration_seconds = route.duration_seconds.max(0.0);
    route
}
