//! Canonical cache and dedup keys for routing requests.
//!
//! Coordinates are rounded to a fixed precision before serialization so that
//! cosmetically different inputs (re-render jitter from geolocation or search
//! widgets) collapse to the same key and the same cached route.

use std::fmt;
use std::sync::Arc;

use crate::models::types::{RoutePoint, TransportMode};

/// Decimal places kept per coordinate. Five places is roughly a meter at the
/// equator, well below anything a routing engine distinguishes.
pub const COORD_PRECISION: usize = 5;

/// Canonical string key for a `(points, mode)` routing request.
///
/// Cheap to clone and hash; two keys are equal exactly when their rounded
/// coordinate sequences and transport modes agree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GeoKey(Arc<str>);

impl GeoKey {
    /// Derive the key for an ordered list of at least two valid points.
    ///
    /// Pure and infallible; callers filter invalid points first and must not
    /// call this with fewer than two.
    pub fn for_route(points: &[RoutePoint], mode: TransportMode) -> Self {
        debug_assert!(points.len() >= 2, "route keys need at least two points");

        let mut key = String::with_capacity(8 + points.len() * 20);
        key.push_str(mode.as_str());
        key.push(':');
        for (i, point) in points.iter().enumerate() {
            if i > 0 {
                key.push('|');
            }
            key.push_str(&format!(
                "{:.prec$},{:.prec$}",
                point.lat,
                point.lng,
                prec = COORD_PRECISION
            ));
        }
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
