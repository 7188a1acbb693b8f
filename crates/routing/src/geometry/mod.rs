//! Locally computed geometry, used when no routing provider succeeds.

pub mod fallback;

pub use fallback::{direct_path, haversine_meters, straight_line};
