/// Grouping by browser window
use crate::filters::{Filters, sort_groups, sort_tabs};
use crate::host::BrowserHost;
use crate::rules::Rule;
use crate::stats::TabStats;
use crate::tab_data::{BrowserWindow, Tab};

use super::{GroupResult, WindowGroup, bucket_by};

pub fn default_rule(tab: &Tab) -> Rule {
    Rule {
        id: format!("default_{}", tab.window()),
        display_name: Some(format!("Window {}", tab.window())),
        origin: "window".to_string(),
        pathname: None,
        query_params: Vec::new(),
        use_exact_path: false,
        match_expression: None,
    }
}

pub fn group_tabs(tabs: &[Tab]) -> Vec<(i32, Vec<Tab>)> {
    bucket_by(tabs.iter().cloned(), Tab::window)
}

/// One group per window that still has tabs.
///
/// Windows come from the host; a window id the host no longer lists still
/// gets a group with placeholder metadata so none of its tabs go missing.
pub async fn build_result<H: BrowserHost>(
    host: &H,
    tabs: &[Tab],
    filters: &Filters,
    stats: TabStats,
) -> GroupResult {
    let mut windows = match host.all_windows().await {
        Ok(windows) => windows,
        Err(err) => {
            log::warn!("window lookup failed, using placeholders: {}", err);
            Vec::new()
        }
    };

    let mut tabs_by_window = group_tabs(tabs);
    for (window_id, _) in &tabs_by_window {
        if !windows.iter().any(|window| window.id == *window_id) {
            windows.push(BrowserWindow::placeholder(*window_id));
        }
    }

    let mut results: Vec<WindowGroup> = windows
        .into_iter()
        .filter_map(|window| {
            let slot = tabs_by_window.iter().position(|(id, _)| *id == window.id)?;
            let (_, mut tabs) = tabs_by_window.swap_remove(slot);
            sort_tabs(&mut tabs, filters.tabs.sort_by);
            Some(WindowGroup {
                display_name: format!("Window {}", window.id),
                window,
                tabs,
            })
        })
        .collect();
    sort_groups(&mut results, filters.grouping.sort_by);

    GroupResult::Window { stats, results }
}
