pub mod error;

pub mod config;

pub mod cache {
    pub mod holdings_cache;
    pub use holdings_cache::HoldingsCache;
}

pub mod controller {
    pub mod events;
    pub use events::{AssistantEvent, EventSink};

    pub mod search_orchestrator;
    pub use search_orchestrator::{SearchOrchestrator, SearchProviders};

    pub mod focus_navigator;
    pub use focus_navigator::{FocusNavigator, FocusableItem, KeyOutcome, NavKey, ScrollRequest};

    pub mod filter_state;
    pub use filter_state::{FilterControl, FilterStateManager};

    pub mod assistant;
    pub use assistant::{Assistant, Collaborators, ResultRow, RowKind};
}

pub mod model {
    pub mod date_range;
    pub use date_range::{DateRange, DateRangeOption, date_range_options};

    pub mod filter;
    pub use filter::{AssetClass, FilterOption, FilterSelection, FilterType, asset_class_options};

    pub mod holding;
    pub use holding::Holding;

    pub mod search;
    pub use search::{
        AssetProfileHit, HoldingHit, SearchResultItem, SearchResultSet, SearchSnapshot,
    };

    pub mod user;
    pub use user::{Account, Permissions, Tag, User, UserSettings};
}

pub mod providers;

pub mod util {
    pub mod debounce;
}

pub mod logging;
pub use logging::LoggerBuilder;

pub use config::Config;
pub use controller::Assistant;
pub use error::AppError;
