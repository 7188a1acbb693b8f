//! Data model shared by the cache, the providers, and the resolver.

pub mod types;

pub use types::{CacheEntry, ResolvedRoute, RoutePoint, RoutingError, TransportMode};
