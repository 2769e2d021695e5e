/// Aggregate counts shown alongside a grouping
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::grouping::{GroupingStrategy, bucket_by};
use crate::rules::{Matcher, Rule, duplicate_key};
use crate::tab_data::Tab;
use crate::uri::parse;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabStats {
    pub audible: Vec<Tab>,
    pub muted: Vec<Tab>,
    pub duplicates: Vec<Tab>,
}

impl TabStats {
    pub fn is_empty(&self) -> bool {
        self.audible.is_empty() && self.muted.is_empty() && self.duplicates.is_empty()
    }
}

/// Stats over `tabs`, with duplicates decided by the active rules.
///
/// Each rule that applies to a tab files it under the rule's duplicate key; a
/// tab no rule covers is filed under the strategy's default rule instead. Any
/// key holding more than one tab marks those tabs as duplicates. A tab is
/// listed once even if several keys flag it.
pub fn compute_stats(tabs: &[Tab], rules: &[Rule], strategy: GroupingStrategy) -> TabStats {
    tally(tabs, rules, strategy).0
}

/// Like [`compute_stats`], also returning the positions in `tabs` of the
/// flagged duplicates. Tabs are keyed by position, so tabs sharing an id
/// stay distinct.
pub fn tally(
    tabs: &[Tab],
    rules: &[Rule],
    strategy: GroupingStrategy,
) -> (TabStats, HashSet<usize>) {
    let mut stats = TabStats::default();
    let matchers = Matcher::compile_all(rules);
    let mut keyed: Vec<(String, usize)> = Vec::new();

    for (position, tab) in tabs.iter().enumerate() {
        if tab.audible {
            stats.audible.push(tab.clone());
        }
        if tab.is_muted() {
            stats.muted.push(tab.clone());
        }

        let Some(uri) = parse(tab) else {
            continue;
        };

        let before = keyed.len();
        keyed.extend(
            matchers
                .iter()
                .filter_map(|matcher| duplicate_key(&uri, matcher))
                .map(|key| (key, position)),
        );

        if keyed.len() == before {
            let fallback = strategy.default_rule(&uri);
            if let Some(key) = duplicate_key(&uri, &Matcher::new(&fallback)) {
                keyed.push((key, position));
            }
        }
    }

    let mut seen = HashSet::new();
    stats.duplicates = bucket_by(keyed, |(key, _)| key.clone())
        .into_iter()
        .filter(|(_, bucket)| bucket.len() > 1)
        .flat_map(|(_, bucket)| bucket)
        .filter(|&(_, position)| seen.insert(position))
        .map(|(_, position)| tabs[position].clone())
        .collect();

    log::debug!(
        "stats: {} audible, {} muted, {} duplicates",
        stats.audible.len(),
        stats.muted.len(),
        stats.duplicates.len()
    );
    (stats, seen)
}
