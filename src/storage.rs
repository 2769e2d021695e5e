/// Rule persistence: the stored shape and the store collaborator
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rules::{Rule, default_rules};

/// Key the rule list is stored under in `chrome.storage.sync`
pub const RULES_KEY: &str = "rules";

/// Root storage structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageData {
    pub rules: Vec<Rule>,
}

impl StorageData {
    pub fn new(rules: Vec<Rule>) -> Self {
        StorageData { rules }
    }

    /// Decode whatever the host has stored; anything unusable yields the defaults.
    pub fn from_stored(value: serde_json::Value) -> Self {
        match value.get(RULES_KEY) {
            None | Some(serde_json::Value::Null) => Self::default(),
            Some(rules) => match serde_json::from_value::<Vec<Rule>>(rules.clone()) {
                Ok(rules) => StorageData { rules },
                Err(err) => {
                    log::warn!("stored rules are unreadable, using defaults: {}", err);
                    Self::default()
                }
            },
        }
    }

    /// New rules go to the front of the list.
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.insert(0, rule);
    }

    pub fn remove_rule(&mut self, rule_id: &str) -> bool {
        let original_len = self.rules.len();
        self.rules.retain(|r| r.id != rule_id);
        self.rules.len() < original_len
    }

    pub fn get_rule(&self, rule_id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == rule_id)
    }

    /// Swap in `rule` where the rule with the same id sits.
    pub fn replace_rule(&mut self, rule: Rule) -> bool {
        self.rules
            .iter_mut()
            .find(|r| r.id == rule.id)
            .map(|slot| {
                *slot = rule;
            })
            .is_some()
    }
}

impl Default for StorageData {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

pub type SubscriptionId = u64;

/// Callback for rule changes made anywhere in the extension
pub type RulesListener = Rc<dyn Fn(&[Rule])>;

/// Where rules live between sessions.
#[allow(async_fn_in_trait)]
pub trait RuleStore {
    /// `Ok(None)` when no rules were ever saved.
    async fn load_rules(&self) -> Result<Option<Vec<Rule>>>;

    async fn save_rules(&self, rules: &[Rule]) -> Result<()>;

    fn subscribe(&self, listener: RulesListener) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}

impl<S: RuleStore> RuleStore for &S {
    async fn load_rules(&self) -> Result<Option<Vec<Rule>>> {
        (**self).load_rules().await
    }

    async fn save_rules(&self, rules: &[Rule]) -> Result<()> {
        (**self).save_rules(rules).await
    }

    fn subscribe(&self, listener: RulesListener) -> SubscriptionId {
        (**self).subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        (**self).unsubscribe(id)
    }
}

/// In-memory store; saves notify subscribers synchronously.
#[derive(Default)]
pub struct MemoryRuleStore {
    data: RefCell<Option<StorageData>>,
    listeners: RefCell<Vec<(SubscriptionId, RulesListener)>>,
    next_id: Cell<SubscriptionId>,
    read_only: bool,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        MemoryRuleStore {
            data: RefCell::new(Some(StorageData::new(rules))),
            ..Self::default()
        }
    }

    /// A store that rejects every save.
    pub fn read_only(rules: Vec<Rule>) -> Self {
        MemoryRuleStore {
            read_only: true,
            ..Self::with_rules(rules)
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn stored(&self) -> Option<StorageData> {
        self.data.borrow().clone()
    }
}

impl RuleStore for MemoryRuleStore {
    async fn load_rules(&self) -> Result<Option<Vec<Rule>>> {
        Ok(self.data.borrow().as_ref().map(|data| data.rules.clone()))
    }

    async fn save_rules(&self, rules: &[Rule]) -> Result<()> {
        if self.read_only {
            return Err(Error::Storage("store is read-only".to_string()));
        }
        self.data.replace(Some(StorageData::new(rules.to_vec())));

        // Listeners may subscribe or unsubscribe while being notified
        let listeners: Vec<RulesListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(rules);
        }
        Ok(())
    }

    fn subscribe(&self, listener: RulesListener) -> SubscriptionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.borrow_mut().retain(|(existing, _)| *existing != id);
    }
}
