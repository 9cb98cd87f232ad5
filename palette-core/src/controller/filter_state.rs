//! src/controller/filter_state.rs
//! ============================================================================
//! # FilterStateManager: per-category filter and date-range selection
//!
//! One explicit control per category (account, asset class, tag, holding)
//! plus the date-range control. Controls are re-derived from the host's
//! user object whenever it changes, and the apply action emits the
//! four-entry selection list followed by `Closed`.

use compact_str::CompactString;
use tracing::{debug, info};

use super::events::{AssistantEvent, EventSink};
use crate::{
    error::AppError,
    model::{
        DateRange, DateRangeOption, FilterOption, FilterSelection, FilterType, Holding,
        Permissions, User, asset_class_options, date_range_options,
    },
    providers::Translate,
};

/// A single selectable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterControl {
    value: Option<CompactString>,
    disabled: bool,
}

impl FilterControl {
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn reset(&mut self, value: Option<CompactString>, disabled: bool) {
        self.value = value;
        self.disabled = disabled;
    }
}

#[derive(Debug)]
pub struct FilterStateManager {
    account: FilterControl,
    asset_class: FilterControl,
    tag: FilterControl,
    holding: FilterControl,

    date_range: Option<DateRange>,
    date_range_disabled: bool,

    accounts: Vec<FilterOption>,
    asset_classes: Vec<FilterOption>,
    tags: Vec<FilterOption>,
    holdings: Vec<FilterOption>,
    date_range_options: Vec<DateRangeOption>,

    events: EventSink,
}

impl FilterStateManager {
    /// Starts with every control disabled until the first user sync.
    #[must_use]
    pub fn new(events: EventSink) -> Self {
        let disabled = FilterControl {
            value: None,
            disabled: true,
        };

        Self {
            account: disabled.clone(),
            asset_class: disabled.clone(),
            tag: disabled.clone(),
            holding: disabled,
            date_range: None,
            date_range_disabled: true,
            accounts: Vec::new(),
            asset_classes: Vec::new(),
            tags: Vec::new(),
            holdings: Vec::new(),
            date_range_options: Vec::new(),
            events,
        }
    }

    /// Re-derive options and reset selections from the host's user object.
    pub fn sync_with_user(
        &mut self,
        user: &User,
        permissions: &Permissions,
        t: &dyn Translate,
        holdings: &[Holding],
    ) {
        self.asset_classes = asset_class_options(t);
        self.accounts = user
            .accounts
            .iter()
            .map(|account| FilterOption {
                id: account.id.clone(),
                label: account.name.clone(),
                filter_type: FilterType::Account,
            })
            .collect();
        self.tags = user
            .tags
            .iter()
            .filter(|tag| tag.is_used)
            .map(|tag| FilterOption {
                id: tag.id.clone(),
                label: t.translate(&tag.name),
                filter_type: FilterType::Tag,
            })
            .collect();
        self.set_holdings(holdings);

        self.date_range_options = date_range_options(t);
        self.date_range_disabled = !permissions.change_date_range;
        self.date_range = user.settings.date_range;

        let disabled = !permissions.change_filters;
        let settings = &user.settings;
        self.account
            .reset(settings.filter_accounts.first().cloned(), disabled);
        self.asset_class
            .reset(settings.filter_asset_classes.first().cloned(), disabled);
        self.holding.reset(None, disabled);

        if self.tags.is_empty() {
            self.tag.reset(None, true);
        } else {
            self.tag.reset(settings.filter_tags.first().cloned(), disabled);
        }

        debug!(
            accounts = self.accounts.len(),
            tags = self.tags.len(),
            holdings = self.holdings.len(),
            filters_disabled = disabled,
            date_range_disabled = self.date_range_disabled,
            "Filter state synced with user"
        );
    }

    /// Holding options, already sorted by the holdings cache.
    pub fn set_holdings(&mut self, holdings: &[Holding]) {
        self.holdings = holdings
            .iter()
            .map(|holding| FilterOption {
                id: holding.symbol.clone(),
                label: holding.name.clone(),
                filter_type: FilterType::Symbol,
            })
            .collect();
    }

    #[must_use]
    pub const fn control(&self, filter_type: FilterType) -> &FilterControl {
        match filter_type {
            FilterType::Account => &self.account,
            FilterType::AssetClass => &self.asset_class,
            FilterType::Tag => &self.tag,
            FilterType::Symbol => &self.holding,
        }
    }

    #[must_use]
    pub fn options(&self, filter_type: FilterType) -> &[FilterOption] {
        match filter_type {
            FilterType::Account => &self.accounts,
            FilterType::AssetClass => &self.asset_classes,
            FilterType::Tag => &self.tags,
            FilterType::Symbol => &self.holdings,
        }
    }

    #[must_use]
    pub fn date_range_options(&self) -> &[DateRangeOption] {
        &self.date_range_options
    }

    #[must_use]
    pub const fn date_range(&self) -> Option<DateRange> {
        self.date_range
    }

    #[must_use]
    pub const fn is_date_range_disabled(&self) -> bool {
        self.date_range_disabled
    }

    /// Select (or clear with `None`) the filter of one category.
    pub fn set_filter(&mut self, filter_type: FilterType, id: Option<&str>) -> Result<(), AppError> {
        let field = filter_type.field_name();

        if self.control(filter_type).is_disabled() {
            return Err(AppError::FilterDisabled { field });
        }

        let value = match id {
            None => None,
            Some(id) => {
                let option = self
                    .options(filter_type)
                    .iter()
                    .find(|option| option.id == id)
                    .ok_or_else(|| AppError::unknown_option(field, id))?;
                Some(option.id.clone())
            }
        };

        debug!(field, value = ?value, "Filter selection changed");
        self.control_mut(filter_type).value = value;
        Ok(())
    }

    pub fn set_account(&mut self, id: Option<&str>) -> Result<(), AppError> {
        self.set_filter(FilterType::Account, id)
    }

    pub fn set_asset_class(&mut self, id: Option<&str>) -> Result<(), AppError> {
        self.set_filter(FilterType::AssetClass, id)
    }

    pub fn set_tag(&mut self, id: Option<&str>) -> Result<(), AppError> {
        self.set_filter(FilterType::Tag, id)
    }

    pub fn set_holding(&mut self, symbol: Option<&str>) -> Result<(), AppError> {
        self.set_filter(FilterType::Symbol, symbol)
    }

    pub fn select_date_range(&mut self, range: DateRange) -> Result<(), AppError> {
        if self.date_range_disabled {
            return Err(AppError::DateRangeDisabled);
        }

        info!(range = %range, "Date range changed");
        self.date_range = Some(range);
        self.events.emit(AssistantEvent::DateRangeChanged(range));
        Ok(())
    }

    /// Current selection, one entry per category in emission order.
    #[must_use]
    pub fn selections(&self) -> [FilterSelection; 4] {
        FilterType::ORDER.map(|filter_type| FilterSelection {
            filter_type,
            id: self.control(filter_type).value.clone(),
        })
    }

    /// Emit the selection list, then `Closed`.
    pub fn apply(&self) -> [FilterSelection; 4] {
        let selections = self.selections();
        info!(?selections, "Applying filters");

        self.events
            .emit(AssistantEvent::FiltersChanged(selections.clone()));
        self.events.emit(AssistantEvent::Closed);
        selections
    }

    const fn control_mut(&mut self, filter_type: FilterType) -> &mut FilterControl {
        match filter_type {
            FilterType::Account => &mut self.account,
            FilterType::AssetClass => &mut self.asset_class,
            FilterType::Tag => &mut self.tag,
            FilterType::Symbol => &mut self.holding,
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use super::*;
    use crate::{
        model::{Account, Tag, UserSettings},
        providers::IdentityTranslator,
    };

    fn manager() -> (FilterStateManager, UnboundedReceiver<AssistantEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (FilterStateManager::new(EventSink::new(tx)), rx)
    }

    fn user(tags: Vec<Tag>) -> User {
        User {
            accounts: vec![
                Account {
                    id: "acc-1".into(),
                    name: "Broker".into(),
                },
                Account {
                    id: "acc-2".into(),
                    name: "Bank".into(),
                },
            ],
            tags,
            settings: UserSettings {
                date_range: Some(DateRange::YearToDate),
                filter_accounts: vec!["acc-2".into()],
                filter_asset_classes: vec!["EQUITY".into(), "LIQUIDITY".into()],
                filter_tags: vec!["t-1".into()],
            },
        }
    }

    fn tag(id: &str, is_used: bool) -> Tag {
        Tag {
            id: id.into(),
            name: format!("tag {id}"),
            is_used,
        }
    }

    fn holdings() -> Vec<Holding> {
        vec![Holding::new("AAPL", "Apple"), Holding::new("VT", "Vanguard")]
    }

    fn drain(rx: &mut UnboundedReceiver<AssistantEvent>) -> Vec<AssistantEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn sync_resets_selection_from_persisted_settings() {
        let (mut filters, _rx) = manager();
        filters.sync_with_user(
            &user(vec![tag("t-1", true)]),
            &Permissions::all(),
            &IdentityTranslator,
            &holdings(),
        );

        assert_eq!(filters.control(FilterType::Account).value(), Some("acc-2"));
        assert_eq!(filters.control(FilterType::AssetClass).value(), Some("EQUITY"));
        assert_eq!(filters.control(FilterType::Tag).value(), Some("t-1"));
        assert_eq!(filters.control(FilterType::Symbol).value(), None);
        assert_eq!(filters.date_range(), Some(DateRange::YearToDate));
        assert_eq!(filters.options(FilterType::Symbol).len(), 2);
        assert_eq!(filters.date_range_options().len(), 7);
    }

    #[test]
    fn holding_selection_is_not_persisted_across_syncs() {
        let (mut filters, _rx) = manager();
        let user = user(vec![tag("t-1", true)]);
        filters.sync_with_user(&user, &Permissions::all(), &IdentityTranslator, &holdings());
        filters.set_filter(FilterType::Symbol, Some("VT")).unwrap();
        assert_eq!(filters.control(FilterType::Symbol).value(), Some("VT"));

        filters.sync_with_user(&user, &Permissions::all(), &IdentityTranslator, &holdings());
        assert_eq!(filters.control(FilterType::Symbol).value(), None);
    }

    #[test]
    fn only_used_tags_are_offered() {
        let (mut filters, _rx) = manager();
        filters.sync_with_user(
            &user(vec![tag("t-1", true), tag("t-2", false)]),
            &Permissions::all(),
            &IdentityTranslator,
            &[],
        );

        let ids: Vec<&str> = filters
            .options(FilterType::Tag)
            .iter()
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(ids, ["t-1"]);
    }

    #[test]
    fn apply_without_tags_emits_absent_tag_and_disables_input() {
        let (mut filters, mut rx) = manager();
        filters.sync_with_user(
            &user(vec![tag("t-1", false)]),
            &Permissions::all(),
            &IdentityTranslator,
            &[],
        );

        assert!(filters.control(FilterType::Tag).is_disabled());
        assert!(!filters.control(FilterType::Account).is_disabled());

        let selections = filters.apply();
        let types: Vec<FilterType> = selections.iter().map(|s| s.filter_type).collect();
        assert_eq!(types, FilterType::ORDER);
        assert_eq!(selections[2].id, None);

        assert_eq!(
            drain(&mut rx),
            [AssistantEvent::FiltersChanged(selections), AssistantEvent::Closed]
        );
    }

    #[test]
    fn apply_always_emits_four_entries_even_when_unset() {
        let (mut filters, _rx) = manager();
        filters.sync_with_user(
            &User::default(),
            &Permissions::all(),
            &IdentityTranslator,
            &[],
        );

        let selections = filters.apply();
        assert_eq!(selections.len(), 4);
        assert!(selections.iter().all(|s| s.id.is_none()));
    }

    #[test]
    fn without_filter_permission_every_control_is_disabled() {
        let (mut filters, _rx) = manager();
        let permissions = Permissions {
            change_date_range: true,
            ..Permissions::default()
        };
        filters.sync_with_user(
            &user(vec![tag("t-1", true)]),
            &permissions,
            &IdentityTranslator,
            &holdings(),
        );

        for filter_type in FilterType::ORDER {
            assert!(filters.control(filter_type).is_disabled());
        }
        assert!(!filters.is_date_range_disabled());
        assert!(matches!(
            filters.set_filter(FilterType::Account, Some("acc-1")),
            Err(AppError::FilterDisabled { field: "account" })
        ));
    }

    #[test]
    fn set_filter_validates_against_options() {
        let (mut filters, _rx) = manager();
        filters.sync_with_user(
            &user(vec![tag("t-1", true)]),
            &Permissions::all(),
            &IdentityTranslator,
            &holdings(),
        );

        filters.set_filter(FilterType::AssetClass, Some("COMMODITY")).unwrap();
        assert_eq!(filters.control(FilterType::AssetClass).value(), Some("COMMODITY"));

        let err = filters
            .set_filter(FilterType::Account, Some("acc-404"))
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownFilterOption { field: "account", .. }));

        filters.set_filter(FilterType::Account, None).unwrap();
        assert_eq!(filters.control(FilterType::Account).value(), None);
    }

    #[test]
    fn date_range_selection_is_permission_gated() {
        let (mut filters, mut rx) = manager();
        let permissions = Permissions {
            change_filters: true,
            ..Permissions::default()
        };
        filters.sync_with_user(&user(vec![]), &permissions, &IdentityTranslator, &[]);

        assert!(filters.is_date_range_disabled());
        assert!(matches!(
            filters.select_date_range(DateRange::OneYear),
            Err(AppError::DateRangeDisabled)
        ));
        assert!(drain(&mut rx).is_empty());

        filters.sync_with_user(&user(vec![]), &Permissions::all(), &IdentityTranslator, &[]);
        filters.select_date_range(DateRange::OneYear).unwrap();
        assert_eq!(filters.date_range(), Some(DateRange::OneYear));
        assert_eq!(
            drain(&mut rx),
            [AssistantEvent::DateRangeChanged(DateRange::OneYear)]
        );
    }

    #[test]
    fn category_setters_write_their_own_control() {
        let (mut filters, _rx) = manager();
        filters.sync_with_user(
            &user(vec![tag("t-1", true)]),
            &Permissions::all(),
            &IdentityTranslator,
            &holdings(),
        );

        filters.set_account(Some("acc-1")).unwrap();
        filters.set_asset_class(None).unwrap();
        filters.set_holding(Some("AAPL")).unwrap();
        assert!(filters.set_tag(Some("t-2")).is_err());

        let selections = filters.selections();
        let ids: Vec<Option<&str>> = selections.iter().map(|s| s.id.as_deref()).collect();
        assert_eq!(ids, [Some("acc-1"), None, Some("t-1"), Some("AAPL")]);
    }
}
