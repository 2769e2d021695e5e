/// The tab grouper: filters, classifies and groups tabs against the active rules
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::dedup::{self, DuplicatePolicy, DuplicateTarget, PresetRegistry};
use crate::error::Result;
use crate::filters::{Filters, TabFilterType};
use crate::grouping::{GroupResult, GroupingStrategy};
use crate::host::BrowserHost;
use crate::rules::{Rule, default_rules};
use crate::stats::tally;
use crate::storage::{RuleStore, StorageData, SubscriptionId};
use crate::tab_data::Tab;

// Replaced wholesale, never mutated. A grouping pass clones the snapshot up
// front, so a rule update landing while it awaits the host cannot change it.
type SharedRules = Rc<RefCell<Rc<[Rule]>>>;

pub struct TabGrouper<H, S> {
    /// Window the caller lives in; only the current-window filter reads it.
    pub window_id: i32,
    host: H,
    store: S,
    active_rules: SharedRules,
    presets: PresetRegistry,
}

impl<H: BrowserHost, S: RuleStore> TabGrouper<H, S> {
    /// A grouper running on the built-in rules until [`load_rules`](Self::load_rules) is called.
    pub fn new(host: H, store: S, window_id: i32) -> Self {
        Self::with_rules(host, store, window_id, default_rules())
    }

    pub fn with_rules(host: H, store: S, window_id: i32, rules: Vec<Rule>) -> Self {
        TabGrouper {
            window_id,
            host,
            store,
            active_rules: Rc::new(RefCell::new(Rc::from(rules))),
            presets: PresetRegistry::default(),
        }
    }

    pub fn with_presets(mut self, presets: PresetRegistry) -> Self {
        self.presets = presets;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn presets(&self) -> &PresetRegistry {
        &self.presets
    }

    /// Snapshot of the active rules.
    pub fn active_rules(&self) -> Rc<[Rule]> {
        self.active_rules.borrow().clone()
    }

    fn set_active_rules(&self, rules: Vec<Rule>) {
        self.active_rules.replace(Rc::from(rules));
    }

    /// Refresh the active rules from the store. A store that never saved
    /// anything yields the built-in rules.
    pub async fn load_rules(&self) -> Result<Rc<[Rule]>> {
        let rules = self.store.load_rules().await?.unwrap_or_else(default_rules);
        self.set_active_rules(rules);
        Ok(self.active_rules())
    }

    /// Group `tabs` as `filters` and `strategy` ask.
    ///
    /// Search narrows the tabs first. Stats are computed on the searched
    /// set, then the tab-type filter applies, and whatever is left is handed
    /// to the strategy.
    pub async fn filter(
        &self,
        tabs: &[Tab],
        filters: &Filters,
        strategy: GroupingStrategy,
    ) -> GroupResult {
        if tabs.is_empty() {
            return strategy.empty_result();
        }

        let rules = self.active_rules();
        let searched = filter_by_search(tabs, &filters.query);
        let (stats, duplicates) = tally(&searched, &rules, strategy);
        let visible = self.filter_by_tab_type(searched, filters.tabs.kind, &duplicates);

        let result = strategy
            .build_result(&self.host, &visible, &rules, filters, stats)
            .await;
        log::debug!(
            "grouped {} of {} tabs into {} groups by {:?}",
            visible.len(),
            tabs.len(),
            result.len(),
            strategy
        );
        result
    }

    /// Fetch every open tab and group it with the strategy `filters` names.
    pub async fn filter_all(&self, filters: &Filters) -> Result<GroupResult> {
        let tabs = self.host.all_tabs().await?;
        Ok(self.filter(&tabs, filters, filters.grouping.group_by.into()).await)
    }

    /// `duplicates` holds positions in `tabs`, not tab ids.
    fn filter_by_tab_type(
        &self,
        tabs: Vec<Tab>,
        kind: TabFilterType,
        duplicates: &HashSet<usize>,
    ) -> Vec<Tab> {
        match kind {
            TabFilterType::All => tabs,
            TabFilterType::Audible => tabs.into_iter().filter(|tab| tab.audible).collect(),
            TabFilterType::CurrentWindow => tabs
                .into_iter()
                .filter(|tab| tab.window_id == Some(self.window_id))
                .collect(),
            TabFilterType::Duplicates => tabs
                .into_iter()
                .enumerate()
                .filter(|(position, _)| duplicates.contains(position))
                .map(|(_, tab)| tab)
                .collect(),
        }
    }

    /// Open tabs that are the same resource as `target`.
    pub async fn find_duplicate_tabs<'t>(
        &self,
        target: impl Into<DuplicateTarget<'t>>,
        policy: DuplicatePolicy,
    ) -> Result<Vec<Tab>> {
        dedup::find_duplicate_tabs(&self.host, target.into(), policy, &self.presets).await
    }

    pub fn group_and_filter_duplicate_tabs(
        &self,
        tabs: &[Tab],
        policy: DuplicatePolicy,
    ) -> Vec<Tab> {
        dedup::group_and_filter_duplicate_tabs(tabs, policy, &self.presets)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Replace the active rules and persist them.
    ///
    /// The in-memory snapshot switches immediately; a failed save is logged
    /// and returned but does not roll the snapshot back.
    pub async fn update_rules(&self, rules: Vec<Rule>) -> Result<()> {
        self.set_active_rules(rules);
        let rules = self.active_rules();
        self.store.save_rules(&rules).await.inspect_err(|err| {
            log::warn!("saving {} rules failed: {}", rules.len(), err);
        })
    }

    pub async fn restore_default_rules(&self) -> Result<()> {
        self.update_rules(default_rules()).await
    }

    /// Put `rule` at the head of the list.
    pub async fn add_rule(&self, rule: Rule) -> Result<()> {
        let mut data = self.editable_rules();
        data.add_rule(rule);
        self.update_rules(data.rules).await
    }

    /// Returns whether a rule with that id existed.
    pub async fn remove_rule(&self, rule_id: &str) -> Result<bool> {
        let mut data = self.editable_rules();
        if !data.remove_rule(rule_id) {
            return Ok(false);
        }
        self.update_rules(data.rules).await?;
        Ok(true)
    }

    /// Swap in an edited rule, matched by id. Returns whether it was found.
    pub async fn replace_rule(&self, rule: Rule) -> Result<bool> {
        let mut data = self.editable_rules();
        if !data.replace_rule(rule) {
            return Ok(false);
        }
        self.update_rules(data.rules).await?;
        Ok(true)
    }

    fn editable_rules(&self) -> StorageData {
        StorageData::new(self.active_rules().to_vec())
    }

    /// Call `callback` with the current rules now and with every later
    /// change the store reports. The active snapshot follows those changes.
    pub async fn observe_rules(
        &self,
        callback: impl Fn(&[Rule]) + 'static,
    ) -> Result<SubscriptionId> {
        let current = self.load_rules().await?;
        callback(&current[..]);

        let active_rules = Rc::clone(&self.active_rules);
        Ok(self.store.subscribe(Rc::new(move |rules: &[Rule]| {
            active_rules.replace(Rc::from(rules));
            callback(rules);
        })))
    }

    pub fn unobserve_rules(&self, id: SubscriptionId) {
        self.store.unsubscribe(id);
    }
}

/// Tabs whose title or url contains `query`, ignoring case. A blank query keeps everything.
fn filter_by_search(tabs: &[Tab], query: &str) -> Vec<Tab> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return tabs.to_vec();
    }

    let contains =
        |text: Option<&str>| text.is_some_and(|text| text.to_lowercase().contains(&needle));
    tabs.iter()
        .filter(|tab| contains(tab.title.as_deref()) || contains(tab.url.as_deref()))
        .cloned()
        .collect()
}
