//! `src/cache/holdings_cache.rs`
//! ============================================================================
//! # Holdings cache
//!
//! Loads the user's full holding list once per activation and keeps it
//! sorted by case-insensitive name. The list is immutable once stored.
//! A failed or cancelled load stores nothing, so readers keep seeing an
//! empty list.

use std::{sync::Arc, time::Instant};

use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::{
    error::AppError,
    model::{DateRange, Holding},
    providers::HoldingsProvider,
};

#[derive(Debug, Default)]
pub struct HoldingsCache {
    holdings: OnceCell<Arc<[Holding]>>,
}

impl HoldingsCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch and store the holdings. Once a load succeeded, later calls
    /// return the stored list without touching the provider; concurrent
    /// callers share a single fetch.
    #[instrument(level = "debug", skip(self, provider, cancel))]
    pub async fn load(
        &self,
        provider: &dyn HoldingsProvider,
        range: DateRange,
        cancel: &CancellationToken,
    ) -> Result<Arc<[Holding]>, AppError> {
        let holdings = self
            .holdings
            .get_or_try_init(|| async {
                let start = Instant::now();

                let mut holdings = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(AppError::Cancelled),
                    fetched = provider.fetch_holdings(range) => fetched?,
                };
                sort_by_name(&mut holdings);

                info!(
                    marker = "HOLDINGS_LOADED",
                    operation_type = "holdings_cache",
                    count = holdings.len(),
                    elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "Holdings cache loaded"
                );
                Ok::<_, AppError>(Arc::from(holdings))
            })
            .await?;

        Ok(Arc::clone(holdings))
    }

    /// Stored holdings, or an empty slice before a successful load.
    #[must_use]
    pub fn holdings(&self) -> &[Holding] {
        self.holdings.get().map(|h| &h[..]).unwrap_or_default()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.holdings.initialized()
    }
}

/// Case-insensitive ascending by name; ties keep provider order.
pub fn sort_by_name(holdings: &mut [Holding]) {
    holdings.sort_by_cached_key(|h| h.name.to_lowercase());
    debug!(count = holdings.len(), "Sorted holdings by name");
}
