//! src/controller/search_orchestrator.rs
//! ============================================================================
//! # SearchOrchestrator: debounce, dispatch and ordered result delivery
//!
//! Raw keystrokes go through [`SearchOrchestrator::submit`]. Each submit
//! clears the displayed results and raises the loading flag immediately,
//! then re-arms a 300 ms trailing debounce. A debounced value is dispatched
//! unless it equals the query of the most recent dispatch.
//!
//! Every dispatch gets an increasing sequence number and its own
//! `CancellationToken`. Issuing a new dispatch cancels the previous one,
//! and a completion only commits when its sequence number is still the
//! latest issued. Stale results are therefore never displayed, whatever
//! order the provider calls finish in.
//!
//! Provider failures never reach the view: they are logged and replaced
//! by the canonical empty result set.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use parking_lot::Mutex;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{
    error::AppError,
    model::{SearchResultSet, SearchSnapshot},
    providers::{AdminSearchProvider, SearchProvider},
    util::debounce::{DebounceConfig, Debouncer},
};

/// Search collaborators. The admin provider is optional.
#[derive(Clone)]
pub struct SearchProviders {
    pub primary: Arc<dyn SearchProvider>,
    pub admin: Option<Arc<dyn AdminSearchProvider>>,
}

impl SearchProviders {
    #[must_use]
    pub fn new(primary: Arc<dyn SearchProvider>) -> Self {
        Self {
            primary,
            admin: None,
        }
    }

    #[must_use]
    pub fn with_admin(mut self, admin: Arc<dyn AdminSearchProvider>) -> Self {
        self.admin = Some(admin);
        self
    }
}

/// Counters for monitoring and tests.
#[derive(Debug, Default)]
pub struct SearchStats {
    dispatched: AtomicU64,
    suppressed: AtomicU64,
    discarded_stale: AtomicU64,
    failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchStatsSnapshot {
    pub dispatched: u64,
    pub suppressed: u64,
    pub discarded_stale: u64,
    pub failures: u64,
}

impl SearchStats {
    pub fn snapshot(&self) -> SearchStatsSnapshot {
        SearchStatsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            discarded_stale: self.discarded_stale.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// A debounced input value tagged with the submission it came from.
#[derive(Debug)]
struct Debounced {
    generation: u64,
    term: String,
}

struct InFlight {
    seq: u64,
    cancel: CancellationToken,
}

impl InFlight {
    // The dispatch task observes the token and aborts its provider fetch.
    fn cancel(self) {
        self.cancel.cancel();
    }
}

#[derive(Default)]
struct SearchState {
    snapshot: SearchSnapshot,

    // Bumped by every submit; a debounced value from an older generation
    // was overtaken by newer input and is dropped.
    input_generation: u64,
    settled_generation: u64,

    // Token of the latest dispatch, and its query.
    dispatch_seq: u64,
    last_query: Option<String>,

    // Result of the latest dispatch once it completed.
    settled: Option<SearchResultSet>,

    in_flight: Option<InFlight>,
}

impl SearchState {
    const fn input_pending(&self) -> bool {
        self.settled_generation != self.input_generation
    }
}

struct Inner {
    providers: SearchProviders,
    admin_access: AtomicBool,
    state: Mutex<SearchState>,
    view: watch::Sender<SearchSnapshot>,
    debouncer: Debouncer<Debounced>,
    shutdown: CancellationToken,
    stats: SearchStats,
}

impl Inner {
    fn publish(&self, state: &mut SearchState, snapshot: SearchSnapshot) {
        state.snapshot = snapshot.clone();
        self.view.send_replace(snapshot);
    }

    fn on_debounced(self: &Arc<Self>, Debounced { generation, term }: Debounced) {
        if self.shutdown.is_cancelled() {
            return;
        }

        let mut state = self.state.lock();

        if generation != state.input_generation {
            trace!(
                generation,
                latest = state.input_generation,
                "Dropping debounced value overtaken by newer input"
            );
            return;
        }
        state.settled_generation = generation;

        if state.last_query.as_deref() == Some(term.as_str()) {
            self.stats.suppressed.fetch_add(1, Ordering::Relaxed);
            debug!(
                marker = "SEARCH_SUPPRESSED",
                operation_type = "search",
                "Query '{}' unchanged, not re-dispatching",
                term
            );

            // Still in flight: its completion will publish.
            if let Some(settled) = state.settled.clone() {
                self.publish(
                    &mut state,
                    SearchSnapshot {
                        results: settled,
                        is_loading: false,
                    },
                );
            }
            return;
        }

        if let Some(previous) = state.in_flight.take() {
            debug!(seq = previous.seq, "Cancelling superseded dispatch");
            previous.cancel();
        }

        state.dispatch_seq += 1;
        let seq = state.dispatch_seq;
        state.last_query = Some(term.clone());

        if term.is_empty() {
            trace!(seq, "Empty query, short-circuiting to empty result set");
            state.settled = Some(SearchResultSet::empty());
            self.publish(&mut state, SearchSnapshot::default());
            return;
        }

        state.settled = None;
        self.publish(
            &mut state,
            SearchSnapshot {
                results: SearchResultSet::empty(),
                is_loading: true,
            },
        );

        self.stats.dispatched.fetch_add(1, Ordering::Relaxed);
        info!(
            marker = "SEARCH_DISPATCH",
            operation_type = "search",
            seq,
            "Dispatching search for '{}'",
            term
        );

        let cancel = self.shutdown.child_token();
        tokio::spawn(Arc::clone(self).run_dispatch(seq, term, cancel.clone()));
        state.in_flight = Some(InFlight { seq, cancel });
    }

    async fn run_dispatch(self: Arc<Self>, seq: u64, term: String, cancel: CancellationToken) {
        let providers = self.providers.clone();
        let admin_access = self.admin_access.load(Ordering::Relaxed);

        // The fetch runs on its own task so that a panicking provider is
        // observed as a JoinError instead of tearing down this dispatch.
        let mut fetch = tokio::spawn(async move {
            fetch_search_results(&providers, admin_access, &term).await
        });

        let joined = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            joined = &mut fetch => Some(joined),
        };

        let Some(joined) = joined else {
            fetch.abort();
            trace!(seq, "Dispatch cancelled before completion");
            return;
        };

        let outcome = joined
            .unwrap_or_else(|e| Err(AppError::Other(format!("search task failed: {e}"))));
        self.commit(seq, &cancel, outcome);
    }

    fn commit(&self, seq: u64, cancel: &CancellationToken, outcome: Result<SearchResultSet, AppError>) {
        let mut state = self.state.lock();

        if cancel.is_cancelled() || seq != state.dispatch_seq {
            self.stats.discarded_stale.fetch_add(1, Ordering::Relaxed);
            debug!(
                marker = "SEARCH_STALE",
                operation_type = "search",
                seq,
                latest = state.dispatch_seq,
                "Discarding results of superseded dispatch"
            );
            return;
        }

        let results = outcome.unwrap_or_else(|e| {
            self.stats.failures.fetch_add(1, Ordering::Relaxed);
            warn!(
                marker = "SEARCH_FAILED",
                operation_type = "search",
                seq,
                error = %e,
                "Search failed, showing empty result set"
            );
            SearchResultSet::empty()
        });

        state.in_flight = None;
        state.settled = Some(results.clone());

        if state.input_pending() {
            trace!(seq, "Newer input pending, holding results back from the view");
            return;
        }

        debug!(seq, rows = results.len(), "Delivering search results");
        self.publish(
            &mut state,
            SearchSnapshot {
                results,
                is_loading: false,
            },
        );
    }
}

/// Queries the auxiliary provider first (when permitted), then the primary.
/// Auxiliary failures are swallowed and its rows are not merged.
async fn fetch_search_results(
    providers: &SearchProviders,
    admin_access: bool,
    term: &str,
) -> Result<SearchResultSet, AppError> {
    if admin_access && let Some(admin) = &providers.admin {
        match admin.fetch_admin_search_results(term).await {
            Ok(items) => debug!(
                rows = items.len(),
                "Admin search completed, primary results take precedence"
            ),
            Err(e) => debug!(error = %e, "Admin search failed, ignoring"),
        }
    }

    Ok(providers.primary.fetch_search_results(term).await?)
}

/// Owns the search pipeline for one activation of the assistant.
pub struct SearchOrchestrator {
    inner: Arc<Inner>,
    pump: JoinHandle<()>,
}

impl SearchOrchestrator {
    /// Start the pipeline. Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(providers: SearchProviders, admin_access: bool, cfg: DebounceConfig) -> Self {
        let (debouncer, mut debounced) = Debouncer::new(cfg);
        let (view, _) = watch::channel(SearchSnapshot::default());
        let shutdown = CancellationToken::new();

        let inner = Arc::new(Inner {
            providers,
            admin_access: AtomicBool::new(admin_access),
            state: Mutex::new(SearchState::default()),
            view,
            debouncer,
            shutdown: shutdown.clone(),
            stats: SearchStats::default(),
        });

        let pump_inner = Arc::clone(&inner);
        let pump = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    next = debounced.recv() => match next {
                        Some(value) => pump_inner.on_debounced(value),
                        None => break,
                    },
                }
            }
            trace!("Search pump stopped");
        });

        Self { inner, pump }
    }

    /// Feed one raw input value. Clears the displayed results and raises
    /// the loading flag synchronously.
    pub fn submit(&self, query: &str) {
        if self.inner.shutdown.is_cancelled() {
            debug!("Ignoring submit after shutdown");
            return;
        }

        let generation = {
            let mut state = self.inner.state.lock();
            state.input_generation += 1;
            self.inner.publish(
                &mut state,
                SearchSnapshot {
                    results: SearchResultSet::empty(),
                    is_loading: true,
                },
            );
            state.input_generation
        };

        self.inner.debouncer.submit(Debounced {
            generation,
            term: query.to_string(),
        });
    }

    /// Current result set and loading flag.
    #[must_use]
    pub fn snapshot(&self) -> SearchSnapshot {
        self.inner.state.lock().snapshot.clone()
    }

    /// Change notifications for the view.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.inner.view.subscribe()
    }

    pub fn set_admin_access(&self, allowed: bool) {
        self.inner.admin_access.store(allowed, Ordering::Relaxed);
    }

    #[must_use]
    pub fn stats(&self) -> SearchStatsSnapshot {
        self.inner.stats.snapshot()
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Cancel the debounce timer, any in-flight dispatch and the pump.
    /// Nothing mutates the displayed state afterwards.
    pub fn shutdown(&self) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }

        info!(marker = "SEARCH_SHUTDOWN", operation_type = "search", "Shutting down search pipeline");
        self.inner.shutdown.cancel();
        self.inner.debouncer.cancel();
        if let Some(in_flight) = self.inner.state.lock().in_flight.take() {
            in_flight.cancel();
        }
        self.pump.abort();
    }
}

impl Drop for SearchOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::atomic::AtomicUsize, time::Duration};

    use async_trait::async_trait;
    use tokio::time::sleep;

    use super::*;
    use crate::{
        error::ProviderError,
        model::{SearchResultItem, SearchResultSet},
    };

    const QUIET: Duration = Duration::from_millis(301);

    /// Scripted provider: per-term latency, failures and call log.
    #[derive(Default)]
    struct ScriptedProvider {
        delays: HashMap<String, Duration>,
        failing: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn with_delay(mut self, term: &str, delay: Duration) -> Self {
            self.delays.insert(term.to_string(), delay);
            self
        }

        fn failing_on(mut self, term: &str) -> Self {
            self.failing.push(term.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    fn result_for(term: &str) -> SearchResultSet {
        SearchResultSet {
            asset_profiles: vec![SearchResultItem::new(&term.to_uppercase(), term)],
            holdings: Vec::new(),
        }
    }

    #[async_trait]
    impl SearchProvider for ScriptedProvider {
        async fn fetch_search_results(&self, term: &str) -> Result<SearchResultSet, ProviderError> {
            self.calls.lock().push(term.to_string());
            if let Some(delay) = self.delays.get(term) {
                sleep(*delay).await;
            }
            if self.failing.iter().any(|t| t == term) {
                return Err(ProviderError::Network("unreachable".into()));
            }
            Ok(result_for(term))
        }
    }

    struct FailingAdmin {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AdminSearchProvider for FailingAdmin {
        async fn fetch_admin_search_results(
            &self,
            _term: &str,
        ) -> Result<Vec<SearchResultItem>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Rejected {
                status: 403,
                message: "forbidden".into(),
            })
        }
    }

    struct AnsweringAdmin;

    #[async_trait]
    impl AdminSearchProvider for AnsweringAdmin {
        async fn fetch_admin_search_results(
            &self,
            _term: &str,
        ) -> Result<Vec<SearchResultItem>, ProviderError> {
            Ok(vec![SearchResultItem::new("ADMIN", "admin only row")])
        }
    }

    fn start(provider: &Arc<ScriptedProvider>) -> SearchOrchestrator {
        let primary: Arc<dyn SearchProvider> = provider.clone();
        SearchOrchestrator::start(
            SearchProviders::new(primary),
            false,
            DebounceConfig::search_input(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn submit_clears_results_and_sets_loading_synchronously() {
        let provider = Arc::new(ScriptedProvider::default());
        let search = start(&provider);

        search.submit("a");
        sleep(QUIET).await;
        assert_eq!(search.snapshot().results, result_for("a"));

        search.submit("ab");
        let snap = search.snapshot();
        assert!(snap.is_loading);
        assert!(snap.results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn end_to_end_query_delivers_primary_results() {
        let provider = Arc::new(ScriptedProvider::default());
        let search = start(&provider);
        let mut view = search.subscribe();

        search.submit("AAP");
        sleep(QUIET).await;

        let snap = search.snapshot();
        assert_eq!(snap.results, result_for("AAP"));
        assert_eq!(snap.results.asset_profiles[0].symbol, "AAP");
        assert!(!snap.is_loading);
        assert_eq!(*view.borrow_and_update(), snap);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_query_never_calls_provider() {
        let provider = Arc::new(ScriptedProvider::default());
        let search = start(&provider);

        search.submit("a");
        sleep(QUIET).await;
        search.submit("");
        sleep(QUIET).await;

        assert_eq!(provider.calls(), ["a"]);
        assert_eq!(search.snapshot(), SearchSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn initial_empty_query_yields_canonical_empty_set() {
        let provider = Arc::new(ScriptedProvider::default());
        let search = start(&provider);

        search.submit("");
        assert!(search.snapshot().is_loading);
        sleep(QUIET).await;

        assert!(provider.calls().is_empty());
        let snap = search.snapshot();
        assert_eq!(snap.results, SearchResultSet::empty());
        assert!(!snap.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_within_window_dispatches_only_last_value() {
        let provider = Arc::new(ScriptedProvider::default());
        let search = start(&provider);

        for q in ["m", "ms", "msf", "msft"] {
            search.submit(q);
            sleep(Duration::from_millis(120)).await;
        }
        sleep(QUIET).await;

        assert_eq!(provider.calls(), ["msft"]);
        assert_eq!(search.snapshot().results, result_for("msft"));
        assert_eq!(search.stats().dispatched, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_identical_value_is_not_redispatched() {
        let provider = Arc::new(ScriptedProvider::default());
        let search = start(&provider);

        search.submit("vt");
        sleep(QUIET).await;
        search.submit("vt");
        assert!(search.snapshot().is_loading);
        sleep(QUIET).await;
        search.submit("vti");
        sleep(QUIET).await;

        assert_eq!(provider.calls(), ["vt", "vti"]);
        assert_eq!(search.stats().suppressed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn suppressed_value_restores_previous_results() {
        let provider = Arc::new(ScriptedProvider::default());
        let search = start(&provider);

        search.submit("vt");
        sleep(QUIET).await;
        search.submit("vti");
        search.submit("vt");
        sleep(QUIET).await;

        assert_eq!(provider.calls(), ["vt"]);
        let snap = search.snapshot();
        assert_eq!(snap.results, result_for("vt"));
        assert!(!snap.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_dispatch_never_overwrites_newer_one() {
        // D1 is submitted first and finishes last.
        let provider = Arc::new(
            ScriptedProvider::default()
                .with_delay("slow", Duration::from_secs(2))
                .with_delay("fast", Duration::from_millis(10)),
        );
        let search = start(&provider);

        search.submit("slow");
        sleep(QUIET).await;
        search.submit("fast");
        sleep(QUIET).await;
        sleep(Duration::from_secs(3)).await;

        assert_eq!(provider.calls(), ["slow", "fast"]);
        let snap = search.snapshot();
        assert_eq!(snap.results, result_for("fast"));
        assert!(!snap.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_during_pending_input_is_held_back() {
        let provider =
            Arc::new(ScriptedProvider::default().with_delay("abc", Duration::from_millis(200)));
        let search = start(&provider);

        search.submit("abc");
        sleep(QUIET).await;
        // Typing resumes while "abc" is still in flight.
        search.submit("abcd");
        sleep(Duration::from_millis(250)).await;

        let snap = search.snapshot();
        assert!(snap.is_loading);
        assert!(snap.results.is_empty());

        sleep(QUIET).await;
        assert_eq!(search.snapshot().results, result_for("abcd"));
    }

    #[tokio::test(start_paused = true)]
    async fn primary_failure_degrades_to_empty_set() {
        let provider = Arc::new(ScriptedProvider::default().failing_on("boom"));
        let search = start(&provider);

        search.submit("boom");
        sleep(QUIET).await;

        let snap = search.snapshot();
        assert_eq!(snap.results, SearchResultSet::empty());
        assert!(!snap.is_loading);
        assert_eq!(search.stats().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn admin_failure_is_swallowed() {
        let provider = Arc::new(ScriptedProvider::default());
        let admin = Arc::new(FailingAdmin {
            calls: AtomicUsize::new(0),
        });
        let primary: Arc<dyn SearchProvider> = provider.clone();
        let search = SearchOrchestrator::start(
            SearchProviders::new(primary).with_admin(admin.clone()),
            true,
            DebounceConfig::search_input(),
        );

        search.submit("eth");
        sleep(QUIET).await;

        assert_eq!(admin.calls.load(Ordering::SeqCst), 1);
        assert_eq!(search.snapshot().results, result_for("eth"));
        assert_eq!(search.stats().failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn admin_rows_are_not_merged_and_access_is_gated() {
        let provider = Arc::new(ScriptedProvider::default());
        let admin = Arc::new(FailingAdmin {
            calls: AtomicUsize::new(0),
        });
        let primary: Arc<dyn SearchProvider> = provider.clone();
        let search = SearchOrchestrator::start(
            SearchProviders::new(primary).with_admin(admin.clone()),
            false,
            DebounceConfig::search_input(),
        );

        search.submit("btc");
        sleep(QUIET).await;
        assert_eq!(admin.calls.load(Ordering::SeqCst), 0);

        let primary: Arc<dyn SearchProvider> = provider.clone();
        let answering = SearchOrchestrator::start(
            SearchProviders::new(primary).with_admin(Arc::new(AnsweringAdmin)),
            true,
            DebounceConfig::search_input(),
        );
        answering.submit("btc");
        sleep(QUIET).await;
        assert_eq!(answering.snapshot().results, result_for("btc"));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_and_in_flight_work() {
        let provider =
            Arc::new(ScriptedProvider::default().with_delay("late", Duration::from_secs(1)));
        let search = start(&provider);

        search.submit("late");
        sleep(QUIET).await;
        search.submit("never");
        search.shutdown();
        let frozen = search.snapshot();

        sleep(Duration::from_secs(2)).await;
        search.submit("ignored");
        sleep(QUIET).await;

        assert_eq!(provider.calls(), ["late"]);
        assert_eq!(search.snapshot(), frozen);
        assert!(search.is_shut_down());
    }
}
