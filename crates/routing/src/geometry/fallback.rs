//! Straight-line fallback geometry.
//!
//! The last-resort guarantee of the resolver: these functions are pure and
//! total, so the map always has a drawable path and a numeric distance even
//! with zero connectivity. Distances use the Haversine great-circle formula,
//! accurate enough for trip-scale spans.

use geo::HaversineDistance;

use crate::models::types::{ResolvedRoute, RoutePoint};

/// Great-circle distance between two points in meters.
pub fn haversine_meters(a: RoutePoint, b: RoutePoint) -> f64 {
    a.to_geo().haversine_distance(&b.to_geo())
}

/// Two-point straight line between start and end.
pub fn straight_line(start: RoutePoint, end: RoutePoint) -> ResolvedRoute {
    ResolvedRoute {
        coordinates: vec![start, end],
        distance_meters: haversine_meters(start, end),
        duration_seconds: 0.0,
        is_optimal: false,
    }
}

/// Straight-line path through every input point, summing leg distances.
///
/// Keeps intermediate waypoints so the drawn polyline still passes through
/// each of them. Callers guarantee at least two points.
pub fn direct_path(points: &[RoutePoint]) -> ResolvedRoute {
    let distance_meters = points
        .windows(2)
        .map(|leg| haversine_meters(leg[0], leg[1]))
        .sum();

    ResolvedRoute {
        coordinates: points.to_vec(),
        distance_meters,
        duration_seconds: 0.0,
        is_optimal: false,
    }
}
