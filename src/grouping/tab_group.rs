/// Grouping by the browser's own tab groups
use futures::future::join_all;

use crate::filters::{Filters, sort_groups, sort_tabs};
use crate::host::BrowserHost;
use crate::rules::Rule;
use crate::stats::TabStats;
use crate::tab_data::{TAB_GROUP_ID_NONE, Tab, TabGroupInfo};

use super::{GroupResult, TabGroupEntry, bucket_by};

pub fn default_rule(tab: &Tab) -> Rule {
    Rule {
        id: format!("default_{}", tab.tab_group()),
        display_name: Some(format!("Tab Group {}", tab.tab_group())),
        origin: "tab_group".to_string(),
        pathname: None,
        query_params: Vec::new(),
        use_exact_path: false,
        match_expression: None,
    }
}

pub fn group_tabs(tabs: &[Tab]) -> Vec<(i32, Vec<Tab>)> {
    bucket_by(tabs.iter().cloned(), Tab::tab_group)
}

async fn lookup<H: BrowserHost>(host: &H, id: i32) -> TabGroupInfo {
    if id == TAB_GROUP_ID_NONE {
        return TabGroupInfo::ungrouped();
    }

    match host.tab_group(id).await {
        Ok(Some(group)) => group,
        Ok(None) => {
            log::warn!("tab group {} no longer exists", id);
            TabGroupInfo::placeholder(id)
        }
        Err(err) => {
            log::warn!("tab group {} lookup failed: {}", id, err);
            TabGroupInfo::placeholder(id)
        }
    }
}

/// One group per distinct tab group, with metadata fetched from the host.
///
/// Ungrouped tabs land in a synthesized "Ungrouped" entry without a host call.
pub async fn build_result<H: BrowserHost>(
    host: &H,
    tabs: &[Tab],
    filters: &Filters,
    stats: TabStats,
) -> GroupResult {
    let grouped = group_tabs(tabs);
    let metadata = join_all(grouped.iter().map(|(id, _)| lookup(host, *id))).await;

    let mut results: Vec<TabGroupEntry> = grouped
        .into_iter()
        .zip(metadata)
        .map(|((_, mut tabs), tab_group)| {
            sort_tabs(&mut tabs, filters.tabs.sort_by);
            TabGroupEntry {
                display_name: tab_group.title.clone().unwrap_or_else(|| "Unknown".to_string()),
                tab_group,
                tabs,
            }
        })
        .collect();
    sort_groups(&mut results, filters.grouping.sort_by);

    GroupResult::TabGroup { stats, results }
}
