//! # me-travel-routing
//!
//! Route resolution and caching core for the MeTravel planner.
//!
//! ## Features
//!
//! - **Canonical keys**: coordinate rounding collapses jittery inputs to one
//!   cache key per practical route
//! - **Shared cache**: every resolved route is memoized for the session,
//!   consulted before any network call
//! - **Request dedup**: concurrent surfaces asking for the same route issue
//!   exactly one provider request
//! - **Provider fallback**: OSRM-compatible primary, optional keyed secondary,
//!   straight-line geometry as the last resort
//! - **Cancellation-safe**: superseded requests never overwrite newer state
//!   or the shared cache
//!
//! ## Example
//!
//! ```
//! use me_travel_routing::prelude::*;
//!
//! let start = RoutePoint::new(53.9006, 27.5590);
//! let end = RoutePoint::new(53.9100, 27.5700);
//!
//! // The straight-line fallback is always available, even offline.
//! let line = straight_line(start, end);
//! assert_eq!(line.coordinates.len(), 2);
//! assert!(line.distance_meters > 0.0);
//! assert!(!line.is_optimal);
//!
//! // Inputs that differ below the rounding tolerance share one cache key.
//! let key = GeoKey::for_route(&[start, end], TransportMode::Car);
//! let jittered = GeoKey::for_route(
//!     &[RoutePoint::new(53.900601, 27.558999), end],
//!     TransportMode::Car,
//! );
//! assert_eq!(key, jittered);
//!
//! // The shared cache is consulted before any network call.
//! let cache = RouteCache::new();
//! assert!(cache.get(&key).is_none());
//! ```

pub mod geokey;
pub mod geometry;
pub mod models;
pub mod provider;
pub mod registry;
pub mod resolver;

// Re-exports for convenience
pub mod prelude {
    pub use crate::geokey::GeoKey;
    pub use crate::geometry::fallback::{direct_path, haversine_meters, straight_line};
    pub use crate::models::types::{
        CacheEntry, ResolvedRoute, RoutePoint, RoutingError, TransportMode,
    };
    pub use crate::provider::{OrsProvider, OsrmProvider, RouteProvider};
    pub use crate::registry::{DedupRegistry, RouteCache};
    pub use crate::resolver::{FallbackReason, RouteOutcome, RouteResolver};
}

pub use prelude::*;
