/// Persisted filter preferences
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::filters::{
    Filters, GroupSortOrder, GroupTabsBy, GroupingFilters, TabFilterType, TabFilters, TabSortOrder,
};

pub const FILTER_TYPE_KEY: &str = "filter_type";
pub const GROUP_ORDER_KEY: &str = "group_order";
pub const TAB_GROUPING_KEY: &str = "tab_grouping";
pub const TAB_ORDER_KEY: &str = "tab_order";

/// Filter choices remembered across popup sessions, stored flat in
/// `chrome.storage.sync`. Missing keys take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    #[serde(rename = "filter_type")]
    pub tab_filter_type: TabFilterType,
    #[serde(rename = "tab_grouping")]
    pub tab_grouping: GroupTabsBy,
    #[serde(rename = "group_order")]
    pub group_sort_by: GroupSortOrder,
    #[serde(rename = "tab_order")]
    pub tab_sort_by: TabSortOrder,
}

impl FilterSettings {
    pub fn to_filters(&self, query: &str) -> Filters {
        Filters {
            query: query.to_string(),
            tabs: TabFilters {
                kind: self.tab_filter_type,
                sort_by: self.tab_sort_by,
            },
            grouping: GroupingFilters {
                group_by: self.tab_grouping,
                sort_by: self.group_sort_by,
            },
        }
    }

    /// Apply a storage change set (`{ key: { oldValue, newValue } }`).
    ///
    /// A removed or unreadable value resets that setting to its default.
    /// Returns whether any setting key was present.
    pub fn apply_changes(&mut self, changes: &Map<String, Value>) -> bool {
        let mut changed = false;
        changed |= apply_change(changes, FILTER_TYPE_KEY, &mut self.tab_filter_type);
        changed |= apply_change(changes, GROUP_ORDER_KEY, &mut self.group_sort_by);
        changed |= apply_change(changes, TAB_GROUPING_KEY, &mut self.tab_grouping);
        changed |= apply_change(changes, TAB_ORDER_KEY, &mut self.tab_sort_by);
        changed
    }
}

fn apply_change<T: DeserializeOwned + Default>(
    changes: &Map<String, Value>,
    key: &str,
    slot: &mut T,
) -> bool {
    let Some(change) = changes.get(key) else {
        return false;
    };

    *slot = match change.get("newValue") {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|err| {
            log::warn!("ignoring unreadable setting {}: {}", key, err);
            T::default()
        }),
    };
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = FilterSettings::default();

        assert_eq!(settings.tab_filter_type, TabFilterType::All);
        assert_eq!(settings.tab_grouping, GroupTabsBy::Domain);
        assert_eq!(settings.group_sort_by, GroupSortOrder::Asc);
        assert_eq!(settings.tab_sort_by, TabSortOrder::Asc);
    }

    #[test]
    fn test_load_partial_storage() {
        let settings: FilterSettings =
            serde_json::from_value(json!({ "filter_type": "audible", "group_order": "count" }))
                .unwrap();

        assert_eq!(settings.tab_filter_type, TabFilterType::Audible);
        assert_eq!(settings.group_sort_by, GroupSortOrder::Count);
        assert_eq!(settings.tab_grouping, GroupTabsBy::Domain);
    }

    #[test]
    fn test_to_filters() {
        let settings = FilterSettings {
            tab_filter_type: TabFilterType::CurrentWindow,
            tab_grouping: GroupTabsBy::Window,
            group_sort_by: GroupSortOrder::Desc,
            tab_sort_by: TabSortOrder::Desc,
        };

        let filters = settings.to_filters("docs");

        assert_eq!(filters.query, "docs");
        assert_eq!(filters.tabs.kind, TabFilterType::CurrentWindow);
        assert_eq!(filters.grouping.group_by, GroupTabsBy::Window);
        assert_eq!(filters.grouping.sort_by, GroupSortOrder::Desc);
    }

    #[test]
    fn test_apply_changes() {
        let mut settings = FilterSettings::default();
        let changes = json!({
            "tab_grouping": { "oldValue": "domain", "newValue": "tab_groups" },
            "tab_order": { "oldValue": "asc", "newValue": "desc" },
            "rules": { "newValue": [] }
        });

        assert!(settings.apply_changes(changes.as_object().unwrap()));
        assert_eq!(settings.tab_grouping, GroupTabsBy::TabGroups);
        assert_eq!(settings.tab_sort_by, TabSortOrder::Desc);
    }

    #[test]
    fn test_apply_changes_resets_removed_and_ignores_unrelated() {
        let mut settings = FilterSettings {
            tab_filter_type: TabFilterType::Duplicates,
            ..FilterSettings::default()
        };

        let unrelated = json!({ "rules": { "newValue": [] } });
        assert!(!settings.apply_changes(unrelated.as_object().unwrap()));
        assert_eq!(settings.tab_filter_type, TabFilterType::Duplicates);

        let removed = json!({ "filter_type": { "oldValue": "dupes" } });
        assert!(settings.apply_changes(removed.as_object().unwrap()));
        assert_eq!(settings.tab_filter_type, TabFilterType::All);
    }
}
