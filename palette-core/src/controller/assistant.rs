//! src/controller/assistant.rs
//! ============================================================================
//! # Assistant: the command palette widget core
//!
//! Wires the search pipeline, the keyboard navigator, the filter state and
//! the holdings cache together, and owns the activation lifecycle:
//!
//! - `activate` starts the search pipeline and the one-shot holdings load.
//! - `deactivate` cancels every pending timer, dispatch and load, and
//!   drops the rendered rows.
//! - `set_user` re-derives the filter state whenever the host's user or
//!   permission flags change.
//!
//! Events toward the host (`Closed`, `DateRangeChanged`, `FiltersChanged`,
//! `Activated`) go through the `EventSink` given at construction.

use std::sync::Arc;

use crossterm::event::KeyEvent;
use tokio::{
    sync::{mpsc::UnboundedSender, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    events::{AssistantEvent, EventSink},
    filter_state::FilterStateManager,
    focus_navigator::{FocusNavigator, FocusableItem, KeyOutcome, ScrollRequest},
    search_orchestrator::{SearchOrchestrator, SearchProviders},
};
use crate::{
    cache::holdings_cache::HoldingsCache,
    config::Config,
    error::AppError,
    model::{
        DateRange, FilterSelection, FilterType, Permissions, SearchResultItem,
        SearchSnapshot, User,
    },
    providers::{AdminSearchProvider, HoldingsProvider, SearchProvider, Translate},
};

/// External collaborators of the assistant.
#[derive(Clone)]
pub struct Collaborators {
    pub search: Arc<dyn SearchProvider>,
    pub admin_search: Option<Arc<dyn AdminSearchProvider>>,
    pub holdings: Arc<dyn HoldingsProvider>,
    pub translator: Arc<dyn Translate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    AssetProfile,
    Holding,
}

/// One rendered result row, valid for the current render cycle only.
#[derive(Debug)]
pub struct ResultRow {
    pub item: SearchResultItem,
    pub kind: RowKind,
    focused: bool,
    scroll: Option<ScrollRequest>,
    events: EventSink,
}

impl ResultRow {
    #[must_use]
    pub const fn is_focused(&self) -> bool {
        self.focused
    }

    /// Pending scroll request for the renderer, cleared on read.
    pub const fn take_scroll(&mut self) -> Option<ScrollRequest> {
        self.scroll.take()
    }
}

impl FocusableItem for ResultRow {
    fn activate(&mut self) {
        info!(symbol = %self.item.symbol, "Result row activated");
        self.events.emit(AssistantEvent::Activated(self.item.clone()));
    }

    fn scroll_into_view(&mut self, request: ScrollRequest) {
        self.scroll = Some(request);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

struct Session {
    search: SearchOrchestrator,
    // Marks every published snapshot seen by the row rebuild.
    view: watch::Receiver<SearchSnapshot>,
    holdings: Arc<HoldingsCache>,
    cancel: CancellationToken,
    holdings_task: JoinHandle<()>,
}

impl Session {
    fn teardown(self) {
        self.cancel.cancel();
        self.search.shutdown();
        self.holdings_task.abort();
    }
}

pub struct Assistant {
    collaborators: Collaborators,
    config: Config,
    user: User,
    permissions: Permissions,
    events: EventSink,
    filters: FilterStateManager,
    navigator: FocusNavigator<ResultRow>,
    holdings_applied: bool,
    session: Option<Session>,
}

impl Assistant {
    #[must_use]
    pub fn new(
        collaborators: Collaborators,
        config: Config,
        events: UnboundedSender<AssistantEvent>,
    ) -> Self {
        let events = EventSink::new(events);
        Self {
            collaborators,
            config,
            user: User::default(),
            permissions: Permissions::default(),
            filters: FilterStateManager::new(events.clone()),
            events,
            navigator: FocusNavigator::new(),
            holdings_applied: false,
            session: None,
        }
    }

    /// Start the search pipeline and the holdings load. Must be called
    /// from within a tokio runtime. Calling it twice is a no-op.
    pub fn activate(&mut self) {
        if self.session.is_some() {
            debug!("Assistant already active");
            return;
        }

        let mut providers = SearchProviders::new(Arc::clone(&self.collaborators.search));
        if self.config.search.admin_search
            && let Some(admin) = &self.collaborators.admin_search
        {
            providers = providers.with_admin(Arc::clone(admin));
        }

        let search = SearchOrchestrator::start(
            providers,
            self.permissions.access_admin_control,
            self.config.search.debounce_config(),
        );

        let cancel = CancellationToken::new();
        let holdings = Arc::new(HoldingsCache::new());
        let holdings_task = tokio::spawn({
            let cache = Arc::clone(&holdings);
            let provider = Arc::clone(&self.collaborators.holdings);
            let cancel = cancel.clone();
            let range = self.config.holdings.range;
            async move {
                if let Err(e) = cache.load(provider.as_ref(), range, &cancel).await {
                    match e {
                        AppError::Cancelled => debug!("Holdings load cancelled"),
                        e => warn!(
                            marker = "HOLDINGS_FAILED",
                            operation_type = "holdings_cache",
                            provider = e.is_provider_failure(),
                            error = %e,
                            "Holdings load failed, holding filter stays empty"
                        ),
                    }
                }
            }
        });

        info!(marker = "ASSISTANT_ACTIVATED", operation_type = "lifecycle", "Assistant activated");
        self.holdings_applied = false;
        self.session = Some(Session {
            view: search.subscribe(),
            search,
            holdings,
            cancel,
            holdings_task,
        });
    }

    /// Cancel all pending work and discard the rendered rows.
    pub fn deactivate(&mut self) {
        if let Some(session) = self.session.take() {
            session.teardown();
            info!(
                marker = "ASSISTANT_DEACTIVATED",
                operation_type = "lifecycle",
                "Assistant deactivated"
            );
        }
        self.navigator.set_open(false);
        self.navigator.clear();
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Host user or permission flags changed.
    pub fn set_user(&mut self, user: User, permissions: Permissions) {
        if let Some(session) = &self.session {
            session.search.set_admin_access(permissions.access_admin_control);
        }
        self.user = user;
        self.permissions = permissions;

        let holdings: &[_] = self
            .session
            .as_ref()
            .map(|s| s.holdings.holdings())
            .unwrap_or_default();
        self.holdings_applied = !holdings.is_empty();
        self.filters.sync_with_user(
            &self.user,
            &self.permissions,
            self.collaborators.translator.as_ref(),
            holdings,
        );
    }

    #[must_use]
    pub const fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    #[must_use]
    pub fn device_type(&self) -> &str {
        &self.permissions.device_type
    }

    #[must_use]
    pub fn placeholder(&self) -> String {
        self.collaborators.translator.translate("Find holding...")
    }

    pub fn open(&mut self) {
        self.navigator.set_open(true);
        self.submit_query("");
    }

    /// Dismiss the widget and tell the host.
    pub fn close(&mut self) {
        self.navigator.set_open(false);
        self.events.emit(AssistantEvent::Closed);
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.navigator.is_open()
    }

    /// Raw search input; see [`SearchOrchestrator::submit`].
    pub fn submit_query(&mut self, query: &str) {
        match &self.session {
            Some(session) => session.search.submit(query),
            None => debug!("Ignoring query while inactive"),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SearchSnapshot {
        self.session
            .as_ref()
            .map(|s| s.search.snapshot())
            .unwrap_or_default()
    }

    /// Change notifications for the host's render loop.
    #[must_use]
    pub fn subscribe(&self) -> Option<watch::Receiver<SearchSnapshot>> {
        self.session.as_ref().map(|s| s.search.subscribe())
    }

    /// Rebuild the rows when a result set was published since the last
    /// rebuild, even one equal to the rendered set. Returns whether a
    /// rebuild happened.
    pub fn sync_results(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.view.has_changed().unwrap_or(false) {
            return false;
        }
        let results = session.view.borrow_and_update().results.clone();

        let rows = results
            .asset_profiles
            .iter()
            .map(|item| (item, RowKind::AssetProfile))
            .chain(results.holdings.iter().map(|item| (item, RowKind::Holding)))
            .map(|(item, kind)| ResultRow {
                item: item.clone(),
                kind,
                focused: false,
                scroll: None,
                events: self.events.clone(),
            })
            .collect();

        self.navigator.replace_items(rows);
        true
    }

    #[must_use]
    pub fn rows(&self) -> &[ResultRow] {
        self.navigator.items()
    }

    /// Rows for the renderer, which drains their scroll requests.
    pub fn rows_mut(&mut self) -> &mut [ResultRow] {
        self.navigator.items_mut()
    }

    #[must_use]
    pub const fn active_row(&self) -> Option<usize> {
        self.navigator.active_index()
    }

    /// Route a key event. `KeyOutcome::consumed()` tells the host to stop
    /// propagating it.
    pub fn handle_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        if !self.navigator.is_open() {
            return KeyOutcome::Ignored;
        }
        self.sync_results();
        self.navigator.handle_key_event(event)
    }

    /// Filter state with the latest holdings applied.
    pub fn filters(&mut self) -> &FilterStateManager {
        self.apply_loaded_holdings();
        &self.filters
    }

    pub fn set_filter(&mut self, filter_type: FilterType, id: Option<&str>) -> Result<(), AppError> {
        self.apply_loaded_holdings();
        self.filters.set_filter(filter_type, id)
    }

    pub fn select_date_range(&mut self, range: DateRange) -> Result<(), AppError> {
        self.filters.select_date_range(range)
    }

    /// Emit the filter selection, then close.
    pub fn apply_filters(&mut self) -> [FilterSelection; 4] {
        let selections = self.filters.apply();
        self.navigator.set_open(false);
        selections
    }

    fn apply_loaded_holdings(&mut self) {
        if self.holdings_applied {
            return;
        }

        if let Some(session) = &self.session
            && session.holdings.is_loaded()
        {
            self.filters.set_holdings(session.holdings.holdings());
            self.holdings_applied = true;
        }
    }
}

impl Drop for Assistant {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.teardown();
        }
    }
}
