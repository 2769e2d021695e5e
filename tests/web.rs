//! Browser-side tests, run with `wasm-pack test --headless --chrome`.
#![cfg(target_arch = "wasm32")]

use tab_grouper::badge::{badge_color, badge_text};
use tab_grouper::filters::{Filters, TabFilterType};
use tab_grouper::host::BrowserHost;
use tab_grouper::storage::MemoryRuleStore;
use tab_grouper::tab_data::{BrowserWindow, TabGroupInfo};
use tab_grouper::{Error, GroupResult, GroupingStrategy, Tab, TabGrouper};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

struct FixedHost(Vec<Tab>);

impl BrowserHost for FixedHost {
    async fn all_tabs(&self) -> Result<Vec<Tab>, Error> {
        Ok(self.0.clone())
    }

    async fn all_windows(&self) -> Result<Vec<BrowserWindow>, Error> {
        Ok(vec![BrowserWindow::placeholder(1)])
    }

    async fn tab_group(&self, _id: i32) -> Result<Option<TabGroupInfo>, Error> {
        Ok(None)
    }
}

fn tabs() -> Vec<Tab> {
    vec![
        Tab::new(1, "https://x.com/search?q=cats", "Cats"),
        Tab::new(2, "https://x.com/search?q=cats", "Cats again"),
        Tab::new(3, "https://y.com/", "Y"),
    ]
}

#[wasm_bindgen_test]
async fn groups_by_origin_in_browser() {
    let grouper = TabGrouper::new(FixedHost(tabs()), MemoryRuleStore::new(), 1);

    let result = grouper.filter_all(&Filters::default()).await.unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.stats().duplicates.len(), 2);
}

#[wasm_bindgen_test]
async fn duplicates_filter_in_browser() {
    let grouper = TabGrouper::new(FixedHost(tabs()), MemoryRuleStore::new(), 1);
    let mut filters = Filters::default();
    filters.tabs.kind = TabFilterType::Duplicates;

    let by_origin = grouper.filter(&tabs(), &filters, GroupingStrategy::Origin).await;
    assert!(matches!(by_origin, GroupResult::Domain { .. }));
    assert_eq!(by_origin.all_tabs().len(), 2);

    // the window fallback rule matches no address, so only explicit rules find duplicates
    let by_window = grouper.filter(&tabs(), &filters, GroupingStrategy::Window).await;
    assert!(by_window.is_empty());
}

#[wasm_bindgen_test]
fn result_crosses_the_js_boundary() {
    let value = serde_wasm_bindgen::to_value(&GroupingStrategy::Expression.empty_result()).unwrap();
    let back: GroupResult = serde_wasm_bindgen::from_value(value).unwrap();

    assert!(back.is_empty());
}

#[wasm_bindgen_test]
fn error_converts_to_js() {
    let value: JsValue = Error::MissingUrl(4).into();

    assert!(value.is_object());
}

#[wasm_bindgen_test]
fn badge_helpers() {
    assert_eq!(badge_text(3, 1), "3/1");
    assert_eq!(badge_color(150), "#9b1c1c");
}
