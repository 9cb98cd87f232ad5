//! Events raised toward the host.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::model::{DateRange, FilterSelection, SearchResultItem};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum AssistantEvent {
    /// The widget was dismissed.
    Closed,

    DateRangeChanged(DateRange),

    /// Always one entry per category, in `FilterType::ORDER`.
    FiltersChanged([FilterSelection; 4]),

    /// A result row was activated; the host navigates to it.
    Activated(SearchResultItem),
}

/// Cloneable sending side shared by the assistant components.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: UnboundedSender<AssistantEvent>,
}

impl EventSink {
    #[must_use]
    pub const fn new(tx: UnboundedSender<AssistantEvent>) -> Self {
        Self { tx }
    }

    pub fn emit(&self, event: AssistantEvent) {
        if let Err(e) = self.tx.send(event) {
            warn!("Failed to deliver assistant event, host receiver dropped: {:?}", e.0);
        }
    }
}
