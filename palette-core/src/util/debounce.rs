//!  src/util/debounce.rs
//!  ===================================================================
//!  Trailing-edge debounce for continuous input.
//!
//!  • Every `submit` aborts the previous sleeper and arms a fresh one, so
//!    only the last value of a burst reaches the receiver.
//!  • Uses `tokio::time::sleep` handles: an aborted sleeper is dropped and
//!    never fires.
//!  • `cancel` disarms the pending sleeper; it is called on teardown.

use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{debug, trace};

/* ======================== DebounceConfig ============================ */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceConfig {
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self::search_input()
    }
}

impl DebounceConfig {
    /// Quick config for search input debouncing
    #[must_use]
    pub const fn search_input() -> Self {
        Self {
            delay: Duration::from_millis(300),
        }
    }

    #[must_use]
    pub const fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

/* ============================ Debouncer ============================ */

/// Single-slot trailing debouncer. Debounced values are delivered on the
/// receiver returned by [`Debouncer::new`].
pub struct Debouncer<T> {
    cfg: DebounceConfig,
    sleeper: Mutex<Option<JoinHandle<()>>>,
    tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a new debouncer and its Rx endpoint
    #[must_use]
    pub fn new(cfg: DebounceConfig) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let deb = Self {
            cfg,
            sleeper: Mutex::new(None),
            tx,
        };
        (deb, rx)
    }

    /// Submit a value. Must be called from within a tokio runtime.
    pub fn submit(&self, ev: T) {
        let mut slot = self.sleeper.lock();

        if let Some(handle) = slot.take() {
            trace!("Debouncer superseded pending value");
            handle.abort();
        }

        let delay = self.cfg.delay;
        let tx = self.tx.clone();

        *slot = Some(tokio::spawn(async move {
            sleep(delay).await;
            debug!("Debouncer quiet period elapsed after {:?}", delay);
            let _ = tx.send(ev);
        }));
    }

    /// Disarm the pending sleeper, if any. The pending value is dropped.
    pub fn cancel(&self) {
        if let Some(handle) = self.sleeper.lock().take() {
            debug!("Debouncer cancelled pending value");
            handle.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.sleeper.get_mut().take() {
            handle.abort();
        }
    }
}
