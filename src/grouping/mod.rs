/// Grouping strategies
pub mod expression;
pub mod origin;
pub mod tab_group;
pub mod window;

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::filters::{Filters, GroupTabsBy, NamedGroup};
use crate::host::BrowserHost;
use crate::rules::Rule;
use crate::stats::TabStats;
use crate::tab_data::{BrowserWindow, Tab, TabGroupInfo};
use crate::uri::ParsedUri;

/// Bucket items by key, keeping buckets and their items in first-seen order.
pub(crate) fn bucket_by<K, T>(
    items: impl IntoIterator<Item = T>,
    key: impl Fn(&T) -> K,
) -> Vec<(K, Vec<T>)>
where
    K: Eq + Hash + Clone,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut buckets: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let k = key(&item);
        match index.get(&k) {
            Some(&slot) => buckets[slot].1.push(item),
            None => {
                index.insert(k.clone(), buckets.len());
                buckets.push((k, vec![item]));
            }
        }
    }
    buckets
}

/// How tabs are split into groups
///
/// A strategy buckets tabs by a discriminator, synthesizes a default rule
/// for tabs nothing else covers, and assembles a sorted [`GroupResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    #[default]
    Origin,
    Window,
    TabGroup,
    Expression,
}

impl From<GroupTabsBy> for GroupingStrategy {
    fn from(group_by: GroupTabsBy) -> Self {
        match group_by {
            GroupTabsBy::Domain => GroupingStrategy::Origin,
            GroupTabsBy::Window => GroupingStrategy::Window,
            GroupTabsBy::TabGroups => GroupingStrategy::TabGroup,
            GroupTabsBy::Expression => GroupingStrategy::Expression,
        }
    }
}

/// The value a strategy buckets a tab by
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Discriminator {
    Origin(String),
    Window(i32),
    TabGroup(i32),
    Expression(String),
}

/// Tabs bucketed by discriminator, plus the tabs that could not be bucketed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabBuckets {
    pub grouped: Vec<(Discriminator, Vec<Tab>)>,
    pub failed: Vec<Tab>,
}

/// Tabs attributed to the rule that claimed them
pub type RuleBuckets = Vec<(Rule, Vec<Tab>)>;

impl GroupingStrategy {
    pub fn discriminator(self, tab: &Tab, rule: &Rule) -> Discriminator {
        match self {
            GroupingStrategy::Origin => Discriminator::Origin(origin::discriminator(rule)),
            GroupingStrategy::Window => Discriminator::Window(tab.window()),
            GroupingStrategy::TabGroup => Discriminator::TabGroup(tab.tab_group()),
            GroupingStrategy::Expression => {
                Discriminator::Expression(expression::discriminator(rule))
            }
        }
    }

    /// Fallback rule for a tab no other rule captures.
    pub fn default_rule(self, uri: &ParsedUri<'_>) -> Rule {
        match self {
            GroupingStrategy::Origin => origin::default_rule(uri),
            GroupingStrategy::Window => window::default_rule(uri.source_tab),
            GroupingStrategy::TabGroup => tab_group::default_rule(uri.source_tab),
            GroupingStrategy::Expression => expression::default_rule(uri.source_tab),
        }
    }

    pub fn group_tabs(self, tabs: &[Tab], rules: &[Rule]) -> TabBuckets {
        match self {
            GroupingStrategy::Origin => {
                let (grouped, failed) = origin::group_tabs(tabs);
                TabBuckets {
                    grouped: grouped
                        .into_iter()
                        .map(|(origin, uris)| {
                            let tabs = uris.into_iter().map(|uri| uri.source_tab.clone()).collect();
                            (Discriminator::Origin(origin), tabs)
                        })
                        .collect(),
                    failed: failed.into_iter().cloned().collect(),
                }
            }
            GroupingStrategy::Window => TabBuckets {
                grouped: rekey(window::group_tabs(tabs), Discriminator::Window),
                failed: Vec::new(),
            },
            GroupingStrategy::TabGroup => TabBuckets {
                grouped: rekey(tab_group::group_tabs(tabs), Discriminator::TabGroup),
                failed: Vec::new(),
            },
            GroupingStrategy::Expression => {
                let (grouped, failed) = expression::group_tabs(tabs, rules);
                TabBuckets {
                    grouped: rekey(grouped, Discriminator::Expression),
                    failed,
                }
            }
        }
    }

    /// Rules bucketed by the discriminator they can apply to. Window and tab
    /// group grouping is structural, so no rules apply.
    pub fn group_rules(self, rules: &[Rule]) -> Vec<(Discriminator, Vec<Rule>)> {
        match self {
            GroupingStrategy::Origin => rekey(origin::group_rules(rules), Discriminator::Origin),
            GroupingStrategy::Expression => {
                rekey(expression::group_rules(rules), Discriminator::Expression)
            }
            GroupingStrategy::Window | GroupingStrategy::TabGroup => Vec::new(),
        }
    }

    /// Tabs attributed to rules, and the tabs no rule could take.
    pub fn group_tabs_by_rules(self, tabs: &[Tab], rules: &[Rule]) -> (RuleBuckets, Vec<Tab>) {
        match self {
            GroupingStrategy::Origin => origin::group_tabs_by_rules(tabs, rules),
            GroupingStrategy::Expression => expression::group_tabs_by_rules(tabs, rules),
            GroupingStrategy::Window | GroupingStrategy::TabGroup => (Vec::new(), Vec::new()),
        }
    }

    /// Group, sort and package `tabs`. Window and tab group grouping ask the
    /// host for display metadata; the others are synchronous.
    pub async fn build_result<H: BrowserHost>(
        self,
        host: &H,
        tabs: &[Tab],
        rules: &[Rule],
        filters: &Filters,
        stats: TabStats,
    ) -> GroupResult {
        match self {
            GroupingStrategy::Origin => origin::build_result(tabs, rules, filters, stats),
            GroupingStrategy::Window => window::build_result(host, tabs, filters, stats).await,
            GroupingStrategy::TabGroup => tab_group::build_result(host, tabs, filters, stats).await,
            GroupingStrategy::Expression => expression::build_result(tabs, rules, filters, stats),
        }
    }

    /// Result with no groups and zeroed stats.
    pub fn empty_result(self) -> GroupResult {
        let stats = TabStats::default();
        match self {
            GroupingStrategy::Origin => GroupResult::Domain {
                stats,
                results: Vec::new(),
            },
            GroupingStrategy::Window => GroupResult::Window {
                stats,
                results: Vec::new(),
            },
            GroupingStrategy::TabGroup => GroupResult::TabGroup {
                stats,
                results: Vec::new(),
            },
            GroupingStrategy::Expression => GroupResult::Expression {
                stats,
                results: Vec::new(),
                failed: Vec::new(),
            },
        }
    }
}

fn rekey<K, T>(
    buckets: Vec<(K, Vec<T>)>,
    wrap: impl Fn(K) -> Discriminator,
) -> Vec<(Discriminator, Vec<T>)> {
    buckets.into_iter().map(|(key, items)| (wrap(key), items)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainGroup {
    pub display_name: String,
    pub origin: String,
    /// `None` for the trailing bucket of tabs without a usable url.
    pub rule: Option<Rule>,
    pub tabs: Vec<Tab>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowGroup {
    pub display_name: String,
    pub window: BrowserWindow,
    pub tabs: Vec<Tab>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabGroupEntry {
    pub display_name: String,
    pub tab_group: TabGroupInfo,
    pub tabs: Vec<Tab>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionGroup {
    pub display_name: String,
    pub rule: Rule,
    pub tabs: Vec<Tab>,
}

macro_rules! named_group {
    ($($group:ty),+) => {
        $(
            impl NamedGroup for $group {
                fn display_name(&self) -> &str {
                    &self.display_name
                }

                fn tabs(&self) -> &[Tab] {
                    &self.tabs
                }
            }
        )+
    };
}

named_group!(DomainGroup, WindowGroup, TabGroupEntry, ExpressionGroup);

/// Output of one grouping pass, tagged by the strategy that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupResult {
    Domain {
        stats: TabStats,
        results: Vec<DomainGroup>,
    },
    Window {
        stats: TabStats,
        results: Vec<WindowGroup>,
    },
    TabGroup {
        stats: TabStats,
        results: Vec<TabGroupEntry>,
    },
    Expression {
        stats: TabStats,
        results: Vec<ExpressionGroup>,
        /// Tabs no expression matched.
        failed: Vec<Tab>,
    },
}

impl GroupResult {
    pub fn stats(&self) -> &TabStats {
        match self {
            GroupResult::Domain { stats, .. }
            | GroupResult::Window { stats, .. }
            | GroupResult::TabGroup { stats, .. }
            | GroupResult::Expression { stats, .. } => stats,
        }
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.group_tabs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(display name, tabs)` for every group, in result order.
    pub fn groups(&self) -> Vec<(&str, &[Tab])> {
        fn view<G: NamedGroup>(groups: &[G]) -> Vec<(&str, &[Tab])> {
            groups.iter().map(|group| (group.display_name(), group.tabs())).collect()
        }

        match self {
            GroupResult::Domain { results, .. } => view(results),
            GroupResult::Window { results, .. } => view(results),
            GroupResult::TabGroup { results, .. } => view(results),
            GroupResult::Expression { results, .. } => view(results),
        }
    }

    pub fn group_tabs(&self) -> Vec<&[Tab]> {
        self.groups().into_iter().map(|(_, tabs)| tabs).collect()
    }

    /// Every tab in the result, failed tabs included.
    pub fn all_tabs(&self) -> Vec<&Tab> {
        let mut tabs: Vec<&Tab> = self.group_tabs().into_iter().flatten().collect();
        if let GroupResult::Expression { failed, .. } = self {
            tabs.extend(failed);
        }
        tabs
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::host::mock::MockHost;
    use crate::rules::default_rules;
    use crate::stats::compute_stats;

    fn create_test_tab(id: i32, url: &str, title: &str, window_id: i32, group_id: i32) -> Tab {
        Tab {
            window_id: Some(window_id),
            group_id: Some(group_id),
            ..Tab::new(id, url, title)
        }
    }

    fn mixed_tabs() -> Vec<Tab> {
        let mut no_url = create_test_tab(6, "", "Blank", 2, -1);
        no_url.url = None;
        vec![
            create_test_tab(1, "https://x.com/search?q=cats", "Cats", 1, 10),
            create_test_tab(2, "https://x.com/search?q=dogs", "Dogs", 1, 10),
            create_test_tab(3, "https://y.com/", "Y", 2, -1),
            create_test_tab(4, "https://www.youtube.com/watch?v=abc", "Video", 2, 11),
            create_test_tab(5, "::broken::", "Broken", 3, -1),
            no_url,
        ]
    }

    fn sorted_ids(result: &GroupResult) -> Vec<i32> {
        let mut ids: Vec<i32> = result.all_tabs().iter().map(|tab| tab.id).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_bucket_by_keeps_first_seen_order() {
        let buckets = bucket_by(vec![3, 1, 4, 1, 5, 9, 2, 6], |n| n % 3);

        assert_eq!(buckets, vec![(0, vec![3, 9, 6]), (1, vec![1, 4, 1]), (2, vec![5, 2])]);
    }

    #[test]
    fn test_strategy_from_group_by() {
        assert_eq!(GroupingStrategy::from(GroupTabsBy::Domain), GroupingStrategy::Origin);
        assert_eq!(GroupingStrategy::from(GroupTabsBy::TabGroups), GroupingStrategy::TabGroup);
    }

    #[test]
    fn test_partition_invariant_every_strategy() {
        let tabs = mixed_tabs();
        let host = MockHost {
            windows: vec![BrowserWindow::placeholder(1), BrowserWindow::placeholder(2)],
            groups: vec![TabGroupInfo {
                title: Some("Research".to_string()),
                ..TabGroupInfo::placeholder(10)
            }],
            ..MockHost::default()
        };
        let mut rules = default_rules();
        rules.push(Rule::expression("^[A-Z]").with_id("capitalized"));
        let filters = Filters::default();

        for strategy in [
            GroupingStrategy::Origin,
            GroupingStrategy::Window,
            GroupingStrategy::TabGroup,
            GroupingStrategy::Expression,
        ] {
            let stats = compute_stats(&tabs, &rules, strategy);
            let result = block_on(strategy.build_result(&host, &tabs, &rules, &filters, stats));
            assert_eq!(sorted_ids(&result), vec![1, 2, 3, 4, 5, 6], "{:?}", strategy);
        }
    }

    #[test]
    fn test_group_tabs_reports_failures() {
        let tabs = mixed_tabs();

        let buckets = GroupingStrategy::Origin.group_tabs(&tabs, &[]);
        let failed: Vec<i32> = buckets.failed.iter().map(|tab| tab.id).collect();
        assert_eq!(failed, vec![5, 6]);
        assert_eq!(buckets.grouped[0].0, Discriminator::Origin("https://x.com".to_string()));

        let buckets = GroupingStrategy::Window.group_tabs(&tabs, &[]);
        assert!(buckets.failed.is_empty());
        assert_eq!(buckets.grouped.len(), 3);
    }

    #[test]
    fn test_group_rules_structural_strategies_ignore_rules() {
        let rules = default_rules();

        assert!(GroupingStrategy::Window.group_rules(&rules).is_empty());
        assert!(GroupingStrategy::TabGroup.group_rules(&rules).is_empty());
        assert_eq!(GroupingStrategy::Origin.group_rules(&rules).len(), 4);

        let (buckets, failed) = GroupingStrategy::Window.group_tabs_by_rules(&mixed_tabs(), &rules);
        assert!(buckets.is_empty() && failed.is_empty());
    }

    #[test]
    fn test_discriminators() {
        let tab = create_test_tab(1, "https://a.com", "A", 4, 7);
        let rule = Rule::new("https://a.com").with_path("/x");

        assert_eq!(
            GroupingStrategy::Origin.discriminator(&tab, &rule),
            Discriminator::Origin("https://a.com".to_string())
        );
        assert_eq!(GroupingStrategy::Window.discriminator(&tab, &rule), Discriminator::Window(4));
        assert_eq!(
            GroupingStrategy::TabGroup.discriminator(&tab, &rule),
            Discriminator::TabGroup(7)
        );
        assert_eq!(
            GroupingStrategy::Expression.discriminator(&tab, &Rule::expression("a+")),
            Discriminator::Expression("a+".to_string())
        );
    }

    #[test]
    fn test_result_serializes_with_type_tag() {
        let value = serde_json::to_value(GroupingStrategy::TabGroup.empty_result()).unwrap();

        assert_eq!(value["type"], "tab_group");
        assert_eq!(value["results"].as_array().unwrap().len(), 0);
        assert_eq!(value["stats"]["duplicates"].as_array().unwrap().len(), 0);
    }
}
