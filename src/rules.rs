/// Grouping rules and the rule matcher
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tab_data::Tab;
use crate::uri::ParsedUri;

/// A user-authored or built-in grouping rule.
///
/// Rules are values: every edit builds a new `Rule` that replaces the old one
/// in the active list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub origin: String,
    #[serde(default)]
    pub pathname: Option<String>,
    #[serde(default)]
    pub query_params: Vec<String>,
    #[serde(default)]
    pub use_exact_path: bool,
    /// Matched against tab text only; origin, path and query are ignored when set.
    #[serde(default, alias = "titleRegex", skip_serializing_if = "Option::is_none")]
    pub match_expression: Option<String>,
}

impl Rule {
    /// A new domain-wide rule with a fresh id.
    pub fn new(origin: &str) -> Rule {
        Rule {
            id: Uuid::new_v4().to_string(),
            display_name: None,
            origin: origin.to_string(),
            pathname: None,
            query_params: Vec::new(),
            use_exact_path: false,
            match_expression: None,
        }
    }

    /// A new expression rule with a fresh id.
    pub fn expression(expression: &str) -> Rule {
        Rule {
            match_expression: Some(expression.to_string()),
            ..Rule::new("expression")
        }
    }

    pub fn with_id(self, id: &str) -> Rule {
        Rule {
            id: id.to_string(),
            ..self
        }
    }

    pub fn with_display_name(self, display_name: &str) -> Rule {
        Rule {
            display_name: Some(display_name.to_string()),
            ..self
        }
    }

    pub fn with_path(self, pathname: &str) -> Rule {
        Rule {
            pathname: Some(pathname.to_string()),
            ..self
        }
    }

    pub fn with_exact_path(self, use_exact_path: bool) -> Rule {
        Rule {
            use_exact_path,
            ..self
        }
    }

    pub fn with_query_params(self, params: &[&str]) -> Rule {
        Rule {
            query_params: params.iter().map(|param| param.to_string()).collect(),
            ..self
        }
    }

    /// True for rules that cover a whole origin (no path constraint).
    pub fn is_catch_all(&self) -> bool {
        self.pathname.is_none()
    }
}

fn builtin(id: &str, display_name: &str, origin: &str) -> Rule {
    Rule::new(origin).with_id(id).with_display_name(display_name)
}

/// Rules installed on first run and by "restore defaults".
pub fn default_rules() -> Vec<Rule> {
    vec![
        builtin("default_chrome_extension", "Chrome", "chrome://extensions"),
        builtin("default_chrome_newtab", "New Tab", "chrome://newtab"),
        builtin("default_chrome_extensions", "Chrome Extensions", "chrome-extension://"),
        builtin("default_youtube_video", "YouTube Videos", "https://www.youtube.com")
            .with_path("/watch")
            .with_query_params(&["v"]),
        builtin("default_youtube_channel", "YouTube Channels", "https://www.youtube.com")
            .with_path("/c"),
    ]
}

#[derive(Debug)]
enum Expression {
    Compiled { title: Regex, url: Regex },
    Invalid,
}

impl Expression {
    fn compile(pattern: &str) -> Expression {
        let title = Regex::new(pattern);
        let url = RegexBuilder::new(pattern).case_insensitive(true).build();
        match (title, url) {
            (Ok(title), Ok(url)) => Expression::Compiled { title, url },
            (Err(err), _) | (_, Err(err)) => {
                log::warn!("ignoring invalid match expression {:?}: {}", pattern, err);
                Expression::Invalid
            }
        }
    }

    /// Title is matched case-sensitively; the url is the case-insensitive fallback.
    fn matches(&self, tab: &Tab) -> bool {
        let Expression::Compiled { title, url } = self else {
            return false;
        };
        tab.title.as_deref().is_some_and(|text| title.is_match(text))
            || tab.url.as_deref().is_some_and(|text| url.is_match(text))
    }
}

/// A rule with its match expression compiled once for a grouping pass.
#[derive(Debug)]
pub struct Matcher<'r> {
    pub rule: &'r Rule,
    expression: Option<Expression>,
}

impl<'r> Matcher<'r> {
    pub fn new(rule: &'r Rule) -> Matcher<'r> {
        Matcher {
            rule,
            expression: rule.match_expression.as_deref().map(Expression::compile),
        }
    }

    pub fn compile_all(rules: &'r [Rule]) -> Vec<Matcher<'r>> {
        rules.iter().map(Matcher::new).collect()
    }

    pub fn has_expression(&self) -> bool {
        self.expression.is_some()
    }

    /// Whether the rule applies to the tab behind `uri`.
    pub fn matches(&self, uri: &ParsedUri<'_>) -> bool {
        if let Some(expression) = &self.expression {
            return expression.matches(uri.source_tab);
        }

        let rule = self.rule;
        if uri.origin != rule.origin {
            return false;
        }

        // an empty path, as the rule editor can save, constrains nothing
        if let Some(pathname) = rule.pathname.as_deref().filter(|path| !path.is_empty()) {
            let path_ok = if rule.use_exact_path {
                uri.pathname == pathname
            } else {
                uri.pathname.starts_with(pathname)
            };
            if !path_ok {
                return false;
            }
        }

        rule.query_params
            .iter()
            .all(|param| uri.query_params.contains_key(param))
    }

    /// Expression-only test, usable for tabs without a parseable url.
    pub fn matches_text(&self, tab: &Tab) -> bool {
        self.expression
            .as_ref()
            .is_some_and(|expression| expression.matches(tab))
    }
}

/// One-off applicability check; compile a [`Matcher`] when testing many tabs.
pub fn is_rule_applicable(uri: &ParsedUri<'_>, rule: &Rule) -> bool {
    Matcher::new(rule).matches(uri)
}

/// Pick the rule for one tab among the rules of its origin, by index.
///
/// Path-specific rules are tried first in list order; catch-all rules only
/// get a chance when none of them match.
pub fn resolve(uri: &ParsedUri<'_>, matchers: &[Matcher<'_>]) -> Option<usize> {
    let first_match = |catch_all: bool| {
        matchers
            .iter()
            .position(|matcher| matcher.rule.is_catch_all() == catch_all && matcher.matches(uri))
    };
    first_match(false).or_else(|| first_match(true))
}

/// Identity of a tab's logical resource under `matcher`, if the rule applies.
///
/// Two tabs with the same key count as duplicates: same origin and path, and
/// the same values for every query parameter the rule cares about.
pub fn duplicate_key(uri: &ParsedUri<'_>, matcher: &Matcher<'_>) -> Option<String> {
    if !matcher.matches(uri) {
        return None;
    }

    let values: Vec<&str> = matcher
        .rule
        .query_params
        .iter()
        .map(|param| uri.query(param).unwrap_or_default())
        .collect();

    Some(format!("{}_{}_{}", uri.origin, uri.pathname, values.join("-")))
}
