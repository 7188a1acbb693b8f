//! Process-wide state shared across resolver instances.
//!
//! Both registries are constructed once at startup, passed by `Arc` to every
//! resolver, and expose only synchronous operations with the lock held for the
//! duration of the call. `clear()` resets them between planning sessions or
//! test runs.

pub mod cache;
pub mod dedup;

pub use cache::RouteCache;
pub use dedup::DedupRegistry;
