//! Core data types and errors for route resolution.

use chrono::{DateTime, Utc};

// ============================================================================
// Points and Modes
// ============================================================================

/// A geographic point in WGS84 degrees.
///
/// Equality is exact on the raw floats; the cache and dedup layers compare
/// points through [`crate::geokey::GeoKey`], which rounds coordinates first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoutePoint {
    pub lat: f64,
    pub lng: f64,
}

impl RoutePoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and within WGS84 bounds. Points failing this are dropped
    /// before key derivation, never handed to a provider.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat.abs() <= 90.0
            && self.lng.abs() <= 180.0
    }

    pub(crate) fn to_geo(self) -> geo::Point {
        geo::Point::new(self.lng, self.lat)
    }
}

/// Transport mode for a routing request.
///
/// Part of the cache key; each provider maps it to its own profile string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportMode {
    Car,
    Bike,
    Foot,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Bike => "bike",
            Self::Foot => "foot",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Route Results
// ============================================================================

/// A drawable route: an ordered path of at least two points plus metrics.
///
/// Produced by providers (`is_optimal == true`) or by the straight-line
/// fallback (`is_optimal == false`).
#[derive(Clone, Debug)]
pub struct ResolvedRoute {
    /// Ordered path. The first and last elements are always the exact
    /// requested start and end points.
    pub coordinates: Vec<RoutePoint>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// False when the geometry is an approximation (straight line or a
    /// mode-mismatched substitute) rather than a real routed path.
    pub is_optimal: bool,
}

/// A successfully resolved route as stored in the cache.
///
/// Only provider successes become cache entries; fallback routes are handed
/// to the caller but never stored, so a transient outage cannot poison
/// future lookups.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub route: ResolvedRoute,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(route: ResolvedRoute) -> Self {
        Self {
            route,
            cached_at: Utc::now(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Clone, Debug, thiserror::Error)]
pub enum RoutingError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("routing service unreachable: {0}")]
    Unreachable(String),

    /// HTTP 429 from the provider.
    #[error("rate limited by routing service")]
    RateLimited,

    /// HTTP 403 from the provider (missing or invalid API key).
    #[error("routing service rejected credentials")]
    Forbidden,

    /// HTTP 400 from the provider (coordinates it cannot route between).
    #[error("routing service rejected coordinates")]
    BadCoordinates,

    /// Any other non-2xx status.
    #[error("routing service error: HTTP {0}")]
    Status(u16),

    /// 2xx response whose body does not match the expected schema, including
    /// an empty geometry.
    #[error("malformed routing response: {0}")]
    Malformed(String),
}

impl RoutingError {
    /// Map a non-2xx status code to the matching error variant.
    pub(crate) fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            403 => Self::Forbidden,
            400 => Self::BadCoordinates,
            other => Self::Status(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, RoutingError>;
