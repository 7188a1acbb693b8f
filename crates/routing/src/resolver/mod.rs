//! Per-use-site route resolution.
//!
//! Each map surface that displays a route owns one [`RouteResolver`]. The
//! resolver runs one resolution cycle per `(points, mode)` input change:
//! cache lookup, claim in the shared dedup registry, provider fetch with a
//! single secondary retry, and a straight-line fallback when everything
//! fails. Outcomes are published through a watch channel so the UI sees one
//! consistent snapshot per transition instead of four independent callbacks.
//!
//! Superseding input cancels the previous cycle: its registry claim is
//! released at once and any late provider response is discarded without
//! touching the cache or the published outcome.

use std::sync::{Arc, Mutex};

use tokio::sync::{watch, Notify};
use tracing::{debug, warn};

use crate::geokey::GeoKey;
use crate::geometry::fallback;
use crate::models::types::{
    CacheEntry, ResolvedRoute, Result, RoutePoint, RoutingError, TransportMode,
};
use crate::provider::{normalize_route, RouteProvider};
use crate::registry::{DedupRegistry, RouteCache};

// ============================================================================
// Outcome
// ============================================================================

/// Why a cycle ended on a locally computed route.
#[derive(Clone, Debug)]
pub enum FallbackReason {
    /// Every configured provider failed; carries the last error.
    Provider(RoutingError),
    /// Another resolver is already fetching this key; the straight line is
    /// shown until its result lands in the shared cache.
    AwaitingPeer,
}

/// Externally observable state of one resolver, one value per transition.
#[derive(Clone, Debug)]
pub enum RouteOutcome {
    /// Fewer than two valid points; nothing to draw.
    Idle,
    /// A provider request is in flight.
    Resolving,
    /// A routed path, fresh from a provider or adopted from the cache.
    Resolved(CacheEntry),
    /// Straight-line approximation; never written to the cache.
    FallenBack {
        route: ResolvedRoute,
        reason: FallbackReason,
    },
}

impl RouteOutcome {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Resolving)
    }

    pub fn has_error(&self) -> bool {
        matches!(self, Self::FallenBack { .. })
    }

    /// Distance of the currently displayable route, if any.
    pub fn distance_meters(&self) -> Option<f64> {
        match self {
            Self::Resolved(entry) => Some(entry.route.distance_meters),
            Self::FallenBack { route, .. } => Some(route.distance_meters),
            _ => None,
        }
    }

    /// Path of the currently displayable route; empty while idle or loading.
    pub fn coordinates(&self) -> &[RoutePoint] {
        match self {
            Self::Resolved(entry) => &entry.route.coordinates,
            Self::FallenBack { route, .. } => &route.coordinates,
            _ => &[],
        }
    }
}

// ============================================================================
// Resolver
// ============================================================================

#[derive(Default)]
struct ResolverState {
    /// Key of the current cycle; `None` while idle.
    key: Option<GeoKey>,
    /// Bumped on every input change; in-flight cycles compare their captured
    /// generation against this before any write-back.
    generation: u64,
    /// Registry claim held by the current cycle, tagged with its generation
    /// so a superseded cycle cannot release a successor's claim.
    claimed: Option<(GeoKey, u64)>,
}

pub struct RouteResolver {
    cache: Arc<RouteCache>,
    dedup: Arc<DedupRegistry>,
    primary: Arc<dyn RouteProvider>,
    secondary: Option<Arc<dyn RouteProvider>>,
    state: Mutex<ResolverState>,
    outcome: watch::Sender<RouteOutcome>,
    /// Pinged when a new cycle starts, so a cycle parked on the registry
    /// re-checks whether it has been superseded.
    superseded: Notify,
}

impl RouteResolver {
    pub fn new(
        cache: Arc<RouteCache>,
        dedup: Arc<DedupRegistry>,
        primary: Arc<dyn RouteProvider>,
    ) -> Self {
        let (outcome, _) = watch::channel(RouteOutcome::Idle);
        Self {
            cache,
            dedup,
            primary,
            secondary: None,
            state: Mutex::new(ResolverState::default()),
            outcome,
            superseded: Notify::new(),
        }
    }

    /// Add a secondary provider, tried exactly once per cycle after a
    /// primary failure.
    pub fn with_secondary(mut self, secondary: Arc<dyn RouteProvider>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Synchronous snapshot of the current outcome.
    pub fn outcome(&self) -> RouteOutcome {
        self.outcome.borrow().clone()
    }

    /// Receiver that observes every published outcome transition.
    pub fn subscribe(&self) -> watch::Receiver<RouteOutcome> {
        self.outcome.subscribe()
    }

    /// Feed a new `(points, mode)` input and drive its resolution cycle.
    ///
    /// Invalid points are dropped first; fewer than two valid points clears
    /// the route and settles on [`RouteOutcome::Idle`]. Re-submitting an
    /// input whose derived key is unchanged is a no-op, so re-renders with
    /// identical state never restart a cycle.
    pub async fn submit(&self, points: &[RoutePoint], mode: TransportMode) {
        let valid: Vec<RoutePoint> = points
            .iter()
            .copied()
            .filter(RoutePoint::is_valid)
            .collect();
        if valid.len() < 2 {
            self.begin_idle();
            return;
        }

        let key = GeoKey::for_route(&valid, mode);
        let Some(generation) = self.begin_cycle(&key) else {
            return;
        };

        // Cache first: a hit answers without network or registry traffic.
        if let Some(entry) = self.cache.get(&key) {
            debug!(key = key.as_str(), "route served from cache");
            self.publish_if_current(generation, RouteOutcome::Resolved(entry));
            return;
        }

        if !self.dedup.try_claim(&key) {
            // Another instance is fetching this key: draw the straight line
            // now, adopt the shared result when it lands.
            let route = fallback::direct_path(&valid);
            self.publish_if_current(
                generation,
                RouteOutcome::FallenBack {
                    route,
                    reason: FallbackReason::AwaitingPeer,
                },
            );
            self.await_peer(generation, key).await;
            return;
        }
        self.record_claim(&key, generation);

        self.publish_if_current(generation, RouteOutcome::Resolving);

        match self.fetch_with_retry(&valid, mode).await {
            Ok(route) => {
                let entry = CacheEntry::new(normalize_route(&valid, route));
                self.commit_if_current(generation, &key, entry);
            }
            Err(err) => {
                warn!(
                    key = key.as_str(),
                    error = %err,
                    "all providers failed, using straight line"
                );
                let route = fallback::direct_path(&valid);
                self.publish_if_current(
                    generation,
                    RouteOutcome::FallenBack {
                        route,
                        reason: FallbackReason::Provider(err),
                    },
                );
            }
        }
        self.release_claim(&key, generation);
    }

    /// Cancel any in-flight cycle, release its claim, and go back to `Idle`.
    /// Used on surface teardown and when starting a new planning session.
    pub fn reset(&self) {
        self.begin_idle();
    }

    // ---- Cycle bookkeeping ----

    fn begin_idle(&self) {
        let old = {
            let mut st = self.state.lock().unwrap();
            st.generation += 1;
            st.key = None;
            let old = st.claimed.take();
            self.outcome.send_replace(RouteOutcome::Idle);
            old
        };
        if let Some((key, _)) = old {
            self.dedup.release(&key);
        }
        self.superseded.notify_waiters();
    }

    /// Start a cycle for `key`, cancelling the previous one. Returns the new
    /// generation, or `None` when the key is unchanged.
    fn begin_cycle(&self, key: &GeoKey) -> Option<u64> {
        let (old, generation) = {
            let mut st = self.state.lock().unwrap();
            if st.key.as_ref() == Some(key) {
                return None;
            }
            st.generation += 1;
            st.key = Some(key.clone());
            (st.claimed.take(), st.generation)
        };
        if let Some((old_key, _)) = old {
            self.dedup.release(&old_key);
        }
        self.superseded.notify_waiters();
        Some(generation)
    }

    fn record_claim(&self, key: &GeoKey, generation: u64) {
        let still_current = {
            let mut st = self.state.lock().unwrap();
            if st.generation == generation {
                st.claimed = Some((key.clone(), generation));
                true
            } else {
                false
            }
        };
        if !still_current {
            // Superseded between the claim and this bookkeeping; hand the
            // claim straight back.
            self.dedup.release(key);
        }
    }

    fn release_claim(&self, key: &GeoKey, generation: u64) {
        let held = {
            let mut st = self.state.lock().unwrap();
            match &st.claimed {
                Some((k, g)) if *g == generation && k == key => {
                    st.claimed = None;
                    true
                }
                _ => false,
            }
        };
        if held {
            self.dedup.release(key);
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state.lock().unwrap().generation == generation
    }

    fn publish_if_current(&self, generation: u64, outcome: RouteOutcome) -> bool {
        let st = self.state.lock().unwrap();
        if st.generation == generation {
            self.outcome.send_replace(outcome);
            true
        } else {
            false
        }
    }

    /// Write the entry to the shared cache and publish it, atomically with
    /// respect to supersession: a cancelled cycle does neither.
    fn commit_if_current(&self, generation: u64, key: &GeoKey, entry: CacheEntry) -> bool {
        let st = self.state.lock().unwrap();
        if st.generation != generation {
            return false;
        }
        self.cache.insert(key.clone(), entry.clone());
        self.outcome.send_replace(RouteOutcome::Resolved(entry));
        true
    }

    // ---- Network ----

    async fn fetch_with_retry(
        &self,
        points: &[RoutePoint],
        mode: TransportMode,
    ) -> Result<ResolvedRoute> {
        match self.primary.fetch_route(points, mode).await {
            Ok(route) => Ok(route),
            Err(primary_err) => {
                warn!(
                    provider = self.primary.name(),
                    error = %primary_err,
                    "primary provider failed"
                );
                let Some(secondary) = &self.secondary else {
                    return Err(primary_err);
                };
                // Exactly one secondary attempt per cycle.
                secondary.fetch_route(points, mode).await.map_err(|err| {
                    warn!(
                        provider = secondary.name(),
                        error = %err,
                        "secondary provider failed"
                    );
                    err
                })
            }
        }
    }

    /// Wait for the peer holding our key's claim to finish, then adopt its
    /// cached result. If the peer released without caching anything, the
    /// already-published straight line stands for this cycle.
    async fn await_peer(&self, generation: u64, key: GeoKey) {
        loop {
            let released = self.dedup.released();
            tokio::pin!(released);
            released.as_mut().enable();
            let cancelled = self.superseded.notified();
            tokio::pin!(cancelled);
            cancelled.as_mut().enable();

            if !self.is_current(generation) {
                return;
            }
            if let Some(entry) = self.cache.get(&key) {
                debug!(key = key.as_str(), "adopting route resolved by peer");
                self.publish_if_current(generation, RouteOutcome::Resolved(entry));
                return;
            }
            if !self.dedup.is_claimed(&key) {
                return;
            }

            tokio::select! {
                _ = &mut released => {}
                _ = &mut cancelled => {}
            }
        }
    }
}

impl Drop for RouteResolver {
    fn drop(&mut self) {
        // A claim must not outlive the resolver holding it.
        let claimed = self
            .state
            .get_mut()
            .map(|st| st.claimed.take())
            .unwrap_or(None);
        if let Some((key, _)) = claimed {
            self.dedup.release(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::fallback::haversine_meters;
    use approx::assert_relative_eq;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    const START: RoutePoint = RoutePoint { lat: 53.9006, lng: 27.5590 };
    const END: RoutePoint = RoutePoint { lat: 53.9100, lng: 27.5700 };

    fn provider_route(distance: f64) -> ResolvedRoute {
        ResolvedRoute {
            coordinates: vec![
                RoutePoint::new(53.90062, 27.55903),
                RoutePoint::new(53.9050, 27.5650),
                RoutePoint::new(53.90998, 27.56997),
            ],
            distance_meters: distance,
            duration_seconds: 600.0,
            is_optimal: true,
        }
    }

    /// Scripted provider: pops one (gate, result) per call.
    struct MockProvider {
        calls: AtomicUsize,
        script: Mutex<VecDeque<(Option<Arc<Semaphore>>, Result<ResolvedRoute>)>>,
        last_points: Mutex<Vec<RoutePoint>>,
    }

    impl MockProvider {
        fn with_script(
            script: Vec<(Option<Arc<Semaphore>>, Result<ResolvedRoute>)>,
        ) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: Mutex::new(script.into()),
                last_points: Mutex::new(Vec::new()),
            })
        }

        fn ok(route: ResolvedRoute) -> Arc<Self> {
            Self::with_script(vec![(None, Ok(route))])
        }

        fn failing() -> Arc<Self> {
            Self::with_script(vec![(
                None,
                Err(RoutingError::Unreachable("connection refused".into())),
            )])
        }

        fn gated(result: Result<ResolvedRoute>) -> (Arc<Self>, Arc<Semaphore>) {
            let gate = Arc::new(Semaphore::new(0));
            (
                Self::with_script(vec![(Some(gate.clone()), result)]),
                gate,
            )
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RouteProvider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn fetch_route<'a>(
            &'a self,
            points: &'a [RoutePoint],
            _mode: TransportMode,
        ) -> Pin<Box<dyn Future<Output = Result<ResolvedRoute>> + Send + 'a>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                *self.last_points.lock().unwrap() = points.to_vec();
                let (gate, result) = self
                    .script
                    .lock()
                    .unwrap()
                    .pop_front()
                    .expect("mock provider called more times than scripted");
                if let Some(gate) = gate {
                    gate.acquire().await.unwrap().forget();
                }
                result
            })
        }
    }

    fn shared() -> (Arc<RouteCache>, Arc<DedupRegistry>) {
        (Arc::new(RouteCache::new()), Arc::new(DedupRegistry::new()))
    }

    fn resolver(
        cache: &Arc<RouteCache>,
        dedup: &Arc<DedupRegistry>,
        provider: Arc<MockProvider>,
    ) -> Arc<RouteResolver> {
        Arc::new(RouteResolver::new(
            cache.clone(),
            dedup.clone(),
            provider,
        ))
    }

    #[tokio::test]
    async fn test_resolves_via_provider() {
        let (cache, dedup) = shared();
        let provider = MockProvider::ok(provider_route(8500.0));
        let r = resolver(&cache, &dedup, provider.clone());

        r.submit(&[START, END], TransportMode::Car).await;

        let outcome = r.outcome();
        assert!(!outcome.is_loading());
        assert!(!outcome.has_error());
        assert_eq!(outcome.distance_meters(), Some(8500.0));

        // Provider geometry, bounded by the exact requested endpoints.
        let coords = outcome.coordinates();
        assert_eq!(coords.len(), 3);
        assert_eq!(coords[0], START);
        assert_eq!(coords[2], END);

        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_identical_request_hits_cache() {
        let (cache, dedup) = shared();
        let first = MockProvider::ok(provider_route(8500.0));
        let a = resolver(&cache, &dedup, first.clone());
        a.submit(&[START, END], TransportMode::Car).await;

        // A second surface asks for the same route; its provider stays idle.
        let second = MockProvider::ok(provider_route(9999.0));
        let b = resolver(&cache, &dedup, second.clone());
        // Jittered input within rounding tolerance maps to the same key.
        let jittered = [
            RoutePoint::new(53.900601, 27.558999),
            RoutePoint::new(53.910001, 27.570001),
        ];
        b.submit(&jittered, TransportMode::Car).await;

        assert_eq!(b.outcome().distance_meters(), Some(8500.0));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn test_unchanged_input_is_a_noop() {
        let (cache, dedup) = shared();
        let provider = MockProvider::ok(provider_route(8500.0));
        let r = resolver(&cache, &dedup, provider.clone());

        r.submit(&[START, END], TransportMode::Car).await;
        let mut rx = r.subscribe();
        rx.borrow_and_update();

        r.submit(&[START, END], TransportMode::Car).await;
        assert_eq!(provider.calls(), 1);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_insufficient_points_goes_idle() {
        let (cache, dedup) = shared();
        let provider = MockProvider::ok(provider_route(8500.0));
        let r = resolver(&cache, &dedup, provider.clone());

        r.submit(&[START, END], TransportMode::Car).await;
        assert!(matches!(r.outcome(), RouteOutcome::Resolved(_)));

        // Dropping to one point clears the displayed route.
        r.submit(&[START], TransportMode::Car).await;
        assert!(matches!(r.outcome(), RouteOutcome::Idle));
        assert!(r.outcome().coordinates().is_empty());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_points_are_filtered() {
        let (cache, dedup) = shared();
        let provider = MockProvider::ok(provider_route(8500.0));
        let r = resolver(&cache, &dedup, provider.clone());

        let with_garbage = [START, RoutePoint::new(f64::NAN, 200.0), END];
        r.submit(&with_garbage, TransportMode::Car).await;

        assert!(matches!(r.outcome(), RouteOutcome::Resolved(_)));
        assert_eq!(provider.last_points.lock().unwrap().as_slice(), &[START, END]);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_to_straight_line() {
        let (cache, dedup) = shared();
        let provider = MockProvider::failing();
        let r = resolver(&cache, &dedup, provider);

        let mut rx = r.subscribe();
        rx.borrow_and_update();
        r.submit(&[START, END], TransportMode::Car).await;

        let outcome = r.outcome();
        assert!(outcome.has_error());
        let coords = outcome.coordinates();
        assert_eq!(coords, &[START, END]);
        assert_relative_eq!(
            outcome.distance_meters().unwrap(),
            haversine_meters(START, END),
            max_relative = 1e-12
        );
        assert!(matches!(
            outcome,
            RouteOutcome::FallenBack {
                reason: FallbackReason::Provider(_),
                ..
            }
        ));

        // Fallback data never reaches the cache.
        assert!(cache.is_empty());

        // The error surfaces once: re-rendering the same input publishes
        // nothing new.
        rx.borrow_and_update();
        r.submit(&[START, END], TransportMode::Car).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_secondary_provider_is_tried_once() {
        let (cache, dedup) = shared();
        let primary = MockProvider::failing();
        let secondary = MockProvider::ok(provider_route(9100.0));
        let r = Arc::new(
            RouteResolver::new(cache.clone(), dedup.clone(), primary.clone())
                .with_secondary(secondary.clone()),
        );

        r.submit(&[START, END], TransportMode::Bike).await;

        assert_eq!(r.outcome().distance_meters(), Some(9100.0));
        assert!(!r.outcome().has_error());
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_poison_cache() {
        let (cache, dedup) = shared();

        let broken = resolver(&cache, &dedup, MockProvider::failing());
        broken.submit(&[START, END], TransportMode::Car).await;
        assert!(cache.is_empty());

        // Once the provider recovers, the same key resolves and caches.
        let healthy = resolver(&cache, &dedup, MockProvider::ok(provider_route(8500.0)));
        healthy.submit(&[START, END], TransportMode::Car).await;

        assert_eq!(healthy.outcome().distance_meters(), Some(8500.0));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_resolvers_issue_one_request() {
        let (cache, dedup) = shared();
        let (provider, gate) = MockProvider::gated(Ok(provider_route(8500.0)));

        let a = resolver(&cache, &dedup, provider.clone());
        let b = resolver(&cache, &dedup, provider.clone());

        let a_task = {
            let a = a.clone();
            tokio::spawn(async move { a.submit(&[START, END], TransportMode::Car).await })
        };
        // Let the first resolver claim the key and park on the network call.
        while provider.calls() == 0 {
            tokio::task::yield_now().await;
        }

        let b_task = {
            let b = b.clone();
            tokio::spawn(async move { b.submit(&[START, END], TransportMode::Car).await })
        };
        while !b.outcome().has_error() {
            tokio::task::yield_now().await;
        }
        assert!(matches!(
            b.outcome(),
            RouteOutcome::FallenBack {
                reason: FallbackReason::AwaitingPeer,
                ..
            }
        ));

        gate.add_permits(1);
        a_task.await.unwrap();
        b_task.await.unwrap();

        // One network call total; both surfaces end on the routed path.
        assert_eq!(provider.calls(), 1);
        assert_eq!(a.outcome().distance_meters(), Some(8500.0));
        assert_eq!(b.outcome().distance_meters(), Some(8500.0));
        assert!(matches!(b.outcome(), RouteOutcome::Resolved(_)));
    }

    #[tokio::test]
    async fn test_peer_failure_leaves_fallback_standing() {
        let (cache, dedup) = shared();
        let (provider, gate) =
            MockProvider::gated(Err(RoutingError::Unreachable("connection refused".into())));

        let a = resolver(&cache, &dedup, provider.clone());
        let b = resolver(&cache, &dedup, provider.clone());

        let a_task = {
            let a = a.clone();
            tokio::spawn(async move { a.submit(&[START, END], TransportMode::Car).await })
        };
        while provider.calls() == 0 {
            tokio::task::yield_now().await;
        }

        let b_task = {
            let b = b.clone();
            tokio::spawn(async move { b.submit(&[START, END], TransportMode::Car).await })
        };
        while !b.outcome().has_error() {
            tokio::task::yield_now().await;
        }

        gate.add_permits(1);
        a_task.await.unwrap();
        b_task.await.unwrap();

        // The winner failed without caching; the loser keeps its line.
        assert!(cache.is_empty());
        assert!(matches!(
            b.outcome(),
            RouteOutcome::FallenBack {
                reason: FallbackReason::AwaitingPeer,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_mode_change_discards_stale_response() {
        let (cache, dedup) = shared();
        let gate = Arc::new(Semaphore::new(0));
        // First call (car) parks on the gate; second call (bike) answers
        // immediately with a different route.
        let provider = MockProvider::with_script(vec![
            (Some(gate.clone()), Ok(provider_route(8500.0))),
            (None, Ok(provider_route(4200.0))),
        ]);
        let r = resolver(&cache, &dedup, provider.clone());

        let car_task = {
            let r = r.clone();
            tokio::spawn(async move { r.submit(&[START, END], TransportMode::Car).await })
        };
        while provider.calls() == 0 {
            tokio::task::yield_now().await;
        }

        // The user switches modes before the car request settles.
        r.submit(&[START, END], TransportMode::Bike).await;
        assert_eq!(r.outcome().distance_meters(), Some(4200.0));

        // Late car response arrives and must change nothing.
        gate.add_permits(1);
        car_task.await.unwrap();

        assert_eq!(r.outcome().distance_meters(), Some(4200.0));
        let car_key = GeoKey::for_route(&[START, END], TransportMode::Car);
        let bike_key = GeoKey::for_route(&[START, END], TransportMode::Bike);
        assert!(cache.get(&car_key).is_none());
        assert!(cache.get(&bike_key).is_some());
        assert!(!dedup.is_claimed(&car_key));
    }

    #[tokio::test]
    async fn test_cancellation_releases_claim_immediately() {
        let (cache, dedup) = shared();
        let gate = Arc::new(Semaphore::new(0));
        let provider = MockProvider::with_script(vec![
            (Some(gate.clone()), Ok(provider_route(8500.0))),
            (None, Ok(provider_route(4200.0))),
        ]);
        let r = resolver(&cache, &dedup, provider.clone());

        let car_task = {
            let r = r.clone();
            tokio::spawn(async move { r.submit(&[START, END], TransportMode::Car).await })
        };
        while provider.calls() == 0 {
            tokio::task::yield_now().await;
        }
        let car_key = GeoKey::for_route(&[START, END], TransportMode::Car);
        assert!(dedup.is_claimed(&car_key));

        // Superseding input releases the old claim before the old request
        // settles, so other resolvers are not blocked on a dead cycle.
        r.submit(&[START, END], TransportMode::Bike).await;
        assert!(!dedup.is_claimed(&car_key));

        gate.add_permits(1);
        car_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_clears_state_and_claim() {
        let (cache, dedup) = shared();
        let provider = MockProvider::ok(provider_route(8500.0));
        let r = resolver(&cache, &dedup, provider);

        r.submit(&[START, END], TransportMode::Car).await;
        assert!(matches!(r.outcome(), RouteOutcome::Resolved(_)));

        r.reset();
        assert!(matches!(r.outcome(), RouteOutcome::Idle));

        // The key comparison starts fresh after a reset: the same input
        // resolves again (from cache this time).
        r.submit(&[START, END], TransportMode::Car).await;
        assert!(matches!(r.outcome(), RouteOutcome::Resolved(_)));
    }
}
