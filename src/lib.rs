/// Tab Grouper - rule-driven tab grouping and duplicate detection
/// Built with Rust + WASM

pub mod badge;
pub mod bridge;
pub mod dedup;
pub mod error;
pub mod filters;
pub mod grouper;
pub mod grouping;
pub mod host;
pub mod organizer;
pub mod rules;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod tab_data;
pub mod uri;

pub use error::Error;
pub use filters::Filters;
pub use grouper::TabGrouper;
pub use grouping::{GroupResult, GroupingStrategy};
pub use rules::Rule;
pub use tab_data::Tab;

use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::bridge::{ChromeHost, ChromeRuleStore};
use crate::dedup::DuplicatePolicy;
use crate::host::BrowserHost;
use crate::tab_data::TabInfo;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// A grouper over the live browser with the saved rules loaded.
async fn chrome_grouper(window_id: i32) -> TabGrouper<ChromeHost, ChromeRuleStore> {
    let grouper = TabGrouper::new(ChromeHost, ChromeRuleStore::new(), window_id);
    if let Err(err) = grouper.load_rules().await {
        log::warn!("using built-in rules, loading saved rules failed: {}", err);
    }
    grouper
}

/// `undefined` and `null` decode to the default value.
fn decode_or_default<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_wasm_bindgen::from_value(value)?)
}

// Group every open tab as the given filters ask
#[wasm_bindgen]
pub async fn group_tabs(filters: JsValue, window_id: i32) -> Result<JsValue, JsValue> {
    let filters: Filters = decode_or_default(filters)?;
    let started = js_sys::Date::now();

    let grouper = chrome_grouper(window_id).await;
    let result = grouper.filter_all(&filters).await?;

    log::info!(
        "Sorted {} tabs into {} groups in {} ms",
        result.all_tabs().len(),
        result.len(),
        js_sys::Date::now() - started
    );
    Ok(serde_wasm_bindgen::to_value(&result)?)
}

// Filters from the saved settings, with a search query
#[wasm_bindgen]
pub async fn saved_filters(query: String) -> Result<JsValue, JsValue> {
    let settings = bridge::load_settings().await?;
    Ok(serde_wasm_bindgen::to_value(&settings.to_filters(&query))?)
}

#[wasm_bindgen]
pub async fn find_duplicates(url: String, policy: JsValue) -> Result<JsValue, JsValue> {
    let policy: DuplicatePolicy = decode_or_default(policy)?;
    let grouper = TabGrouper::new(ChromeHost, ChromeRuleStore::new(), tab_data::WINDOW_ID_NONE);
    let dupes = grouper.find_duplicate_tabs(url.as_str(), policy).await?;
    Ok(serde_wasm_bindgen::to_value(&dupes)?)
}

// Which tabs a dedupe of the whole browser would keep and close
#[wasm_bindgen]
pub async fn plan_dedupe(policy: JsValue) -> Result<JsValue, JsValue> {
    let policy: DuplicatePolicy = decode_or_default(policy)?;
    let tabs = ChromeHost.all_tabs().await?;
    let plan = dedup::dedupe_tabs(&tabs, policy, &dedup::PresetRegistry::default());
    log::info!("dedupe keeps {} tabs and closes {}", plan.keep.len(), plan.close.len());
    Ok(serde_wasm_bindgen::to_value(&plan)?)
}

// Ids to close for a result produced with the duplicates filter
#[wasm_bindgen]
pub fn tabs_to_close(result: JsValue) -> Result<Vec<i32>, JsValue> {
    let result: GroupResult = serde_wasm_bindgen::from_value(result)?;
    Ok(dedup::tabs_to_close(&result))
}

#[wasm_bindgen]
pub async fn badge() -> Result<JsValue, JsValue> {
    let info = TabInfo::from_tabs(ChromeHost.all_tabs().await?);
    Ok(serde_wasm_bindgen::to_value(&badge::Badge::for_tabs(&info))?)
}

// Preview an organizer expression against every open tab
#[wasm_bindgen]
pub async fn evaluate_expression(
    expression: String,
    selected_groups: JsValue,
) -> Result<JsValue, JsValue> {
    let selected: Vec<usize> = decode_or_default(selected_groups)?;
    let tabs = ChromeHost.all_tabs().await?;
    let evaluated = organizer::evaluate_expression(&tabs, &expression, &selected);
    Ok(serde_wasm_bindgen::to_value(&evaluated)?)
}

// Rule editing

#[wasm_bindgen]
pub async fn add_rule(rule: JsValue) -> Result<(), JsValue> {
    let rule: Rule = serde_wasm_bindgen::from_value(rule)?;
    chrome_grouper(tab_data::WINDOW_ID_NONE).await.add_rule(rule).await?;
    Ok(())
}

#[wasm_bindgen]
pub async fn replace_rule(rule: JsValue) -> Result<bool, JsValue> {
    let rule: Rule = serde_wasm_bindgen::from_value(rule)?;
    Ok(chrome_grouper(tab_data::WINDOW_ID_NONE).await.replace_rule(rule).await?)
}

#[wasm_bindgen]
pub async fn remove_rule(rule_id: String) -> Result<bool, JsValue> {
    Ok(chrome_grouper(tab_data::WINDOW_ID_NONE).await.remove_rule(&rule_id).await?)
}

#[wasm_bindgen]
pub async fn restore_default_rules() -> Result<(), JsValue> {
    chrome_grouper(tab_data::WINDOW_ID_NONE).await.restore_default_rules().await?;
    Ok(())
}
