/// `chrome.*` implementations of the host and rule store, via host.js
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::error::{Error, Result};
use crate::host::BrowserHost;
use crate::rules::Rule;
use crate::settings::FilterSettings;
use crate::storage::{RULES_KEY, RuleStore, RulesListener, StorageData, SubscriptionId};
use crate::tab_data::{BrowserWindow, Tab, TabGroupInfo};

// Import JS bridge functions
#[wasm_bindgen(module = "/host.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn queryAllTabs() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getAllWindows() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getTabGroup(id: i32) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn loadRules() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn saveRules(data: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn loadSettings() -> std::result::Result<JsValue, JsValue>;

    fn addRulesListener(callback: &js_sys::Function);

    fn removeRulesListener(callback: &js_sys::Function);
}

fn js_message(value: &JsValue) -> String {
    if let Some(message) = value.as_string() {
        return message;
    }
    match value.dyn_ref::<js_sys::Error>() {
        Some(err) => String::from(err.message()),
        None => format!("{:?}", value),
    }
}

fn host_error(call: &'static str) -> impl FnOnce(JsValue) -> Error {
    move |err| Error::Host {
        call,
        message: js_message(&err),
    }
}

fn decode<T: DeserializeOwned>(value: JsValue) -> Result<T> {
    serde_wasm_bindgen::from_value(value).map_err(|err| Error::Decode(err.to_string()))
}

impl From<Error> for JsValue {
    fn from(err: Error) -> JsValue {
        js_sys::Error::new(&err.to_string()).into()
    }
}

/// The live browser
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeHost;

impl BrowserHost for ChromeHost {
    async fn all_tabs(&self) -> Result<Vec<Tab>> {
        decode(queryAllTabs().await.map_err(host_error("tabs.query"))?)
    }

    async fn all_windows(&self) -> Result<Vec<BrowserWindow>> {
        decode(getAllWindows().await.map_err(host_error("windows.getAll"))?)
    }

    async fn tab_group(&self, id: i32) -> Result<Option<TabGroupInfo>> {
        decode(getTabGroup(id).await.map_err(host_error("tabGroups.get"))?)
    }
}

/// Filter settings as last saved; missing keys take their defaults.
pub async fn load_settings() -> Result<FilterSettings> {
    decode(loadSettings().await.map_err(host_error("storage.sync.get"))?)
}

/// Rules in `chrome.storage.sync`, with change notifications from
/// `chrome.storage.onChanged`.
#[derive(Default)]
pub struct ChromeRuleStore {
    listeners: RefCell<HashMap<SubscriptionId, Closure<dyn Fn(JsValue)>>>,
    next_id: Cell<SubscriptionId>,
}

impl ChromeRuleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RuleStore for ChromeRuleStore {
    async fn load_rules(&self) -> Result<Option<Vec<Rule>>> {
        let raw = loadRules().await.map_err(host_error("storage.sync.get"))?;
        let stored: serde_json::Value = decode(raw)?;
        if stored.get(RULES_KEY).is_none_or(serde_json::Value::is_null) {
            return Ok(None);
        }
        Ok(Some(StorageData::from_stored(stored).rules))
    }

    async fn save_rules(&self, rules: &[Rule]) -> Result<()> {
        let data = serde_wasm_bindgen::to_value(&StorageData::new(rules.to_vec()))
            .map_err(|err| Error::Storage(err.to_string()))?;
        saveRules(data)
            .await
            .map_err(|err| Error::Storage(js_message(&err)))
    }

    fn subscribe(&self, listener: RulesListener) -> SubscriptionId {
        let closure = Closure::<dyn Fn(JsValue)>::new(move |value: JsValue| {
            match serde_wasm_bindgen::from_value::<Vec<Rule>>(value) {
                Ok(rules) => listener(rules.as_slice()),
                Err(err) => log::warn!("ignoring unreadable rule change: {}", err),
            }
        });
        addRulesListener(closure.as_ref().unchecked_ref());

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().insert(id, closure);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if let Some(closure) = self.listeners.borrow_mut().remove(&id) {
            removeRulesListener(closure.as_ref().unchecked_ref());
        }
    }
}

impl Drop for ChromeRuleStore {
    fn drop(&mut self) {
        for (_, closure) in self.listeners.get_mut().drain() {
            removeRulesListener(closure.as_ref().unchecked_ref());
        }
    }
}
