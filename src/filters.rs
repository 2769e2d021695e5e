/// Filter options and the shared sorting rules
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::tab_data::Tab;

/// Which tabs a grouping pass shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TabFilterType {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "audible")]
    Audible,
    #[serde(rename = "currentWindow")]
    CurrentWindow,
    #[serde(rename = "dupes")]
    Duplicates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabSortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupSortOrder {
    Count,
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupTabsBy {
    #[default]
    Domain,
    Window,
    TabGroups,
    Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabFilters {
    #[serde(rename = "type")]
    pub kind: TabFilterType,
    pub sort_by: TabSortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupingFilters {
    pub group_by: GroupTabsBy,
    pub sort_by: GroupSortOrder,
}

/// Everything a caller can ask of one grouping pass
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub query: String,
    pub tabs: TabFilters,
    pub grouping: GroupingFilters,
}

/// A group that can be ordered by name or size
pub trait NamedGroup {
    fn display_name(&self) -> &str;

    fn tabs(&self) -> &[Tab];
}

/// Sort groups in place. Stable, so equal keys keep their order.
pub fn sort_groups<G: NamedGroup>(groups: &mut [G], order: GroupSortOrder) {
    groups.sort_by(|a, b| match order {
        GroupSortOrder::Count => b
            .tabs()
            .len()
            .cmp(&a.tabs().len())
            .then_with(|| a.display_name().cmp(b.display_name())),
        GroupSortOrder::Asc => a.display_name().cmp(b.display_name()),
        GroupSortOrder::Desc => b.display_name().cmp(a.display_name()),
    });
}

/// Title, then url, then position. Text keys order before positions.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum TabSortKey<'a> {
    Text(&'a str),
    Position(i32),
}

fn tab_sort_key(tab: &Tab) -> TabSortKey<'_> {
    tab.title
        .as_deref()
        .or(tab.url.as_deref())
        .map(TabSortKey::Text)
        .unwrap_or(TabSortKey::Position(tab.index))
}

/// Sort tabs in place. Stable, so equal keys keep their order.
pub fn sort_tabs(tabs: &mut [Tab], order: TabSortOrder) {
    tabs.sort_by(|a, b| {
        let ordering: Ordering = tab_sort_key(a).cmp(&tab_sort_key(b));
        match order {
            TabSortOrder::Asc => ordering,
            TabSortOrder::Desc => ordering.reverse(),
        }
    });
}
