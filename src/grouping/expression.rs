/// Grouping by match expression
use crate::filters::{Filters, sort_groups, sort_tabs};
use crate::rules::{Matcher, Rule};
use crate::stats::TabStats;
use crate::tab_data::Tab;

use super::{ExpressionGroup, GroupResult, RuleBuckets, bucket_by};

/// Expression used for rules that carry none.
const MATCH_ANY: &str = ".+";

pub fn discriminator(rule: &Rule) -> String {
    rule.match_expression.clone().unwrap_or_else(|| MATCH_ANY.to_string())
}

/// A rule matching exactly this tab's title (or url when untitled).
pub fn default_rule(tab: &Tab) -> Rule {
    let text = tab.title.as_deref().or(tab.url.as_deref());
    Rule {
        id: format!("default_{}", tab.id),
        display_name: Some(text.unwrap_or("Unknown Tab").to_string()),
        origin: "expression".to_string(),
        pathname: None,
        query_params: Vec::new(),
        use_exact_path: false,
        match_expression: Some(regex::escape(text.unwrap_or_default())),
    }
}

/// Tabs bucketed by the expression of the first rule that matches them.
///
/// Only rules with an expression take part. Tabs no expression matches are
/// returned as failed.
pub fn group_tabs(tabs: &[Tab], rules: &[Rule]) -> (Vec<(String, Vec<Tab>)>, Vec<Tab>) {
    let matchers: Vec<Matcher<'_>> = Matcher::compile_all(rules)
        .into_iter()
        .filter(Matcher::has_expression)
        .collect();

    let mut matched = Vec::new();
    let mut failed = Vec::new();
    for tab in tabs {
        match matchers.iter().find(|matcher| matcher.matches_text(tab)) {
            Some(matcher) => matched.push((discriminator(matcher.rule), tab.clone())),
            None => failed.push(tab.clone()),
        }
    }

    let grouped = bucket_by(matched, |(expression, _)| expression.clone())
        .into_iter()
        .map(|(expression, pairs)| (expression, pairs.into_iter().map(|(_, tab)| tab).collect()))
        .collect();
    (grouped, failed)
}

pub fn group_rules(rules: &[Rule]) -> Vec<(String, Vec<Rule>)> {
    bucket_by(
        rules.iter().filter(|rule| rule.match_expression.is_some()).cloned(),
        discriminator,
    )
}

/// Each expression bucket attributed to the first rule carrying that expression.
pub fn group_tabs_by_rules(tabs: &[Tab], rules: &[Rule]) -> (RuleBuckets, Vec<Tab>) {
    let (tabs_by_expression, failed) = group_tabs(tabs, rules);

    let buckets = tabs_by_expression
        .into_iter()
        .filter_map(|(expression, tabs)| {
            let rule = rules
                .iter()
                .find(|rule| rule.match_expression.as_deref() == Some(expression.as_str()))?;
            Some((rule.clone(), tabs))
        })
        .collect();

    (buckets, failed)
}

pub fn build_result(
    tabs: &[Tab],
    rules: &[Rule],
    filters: &Filters,
    stats: TabStats,
) -> GroupResult {
    let (tabs_by_rule, failed) = group_tabs_by_rules(tabs, rules);

    let mut results: Vec<ExpressionGroup> = tabs_by_rule
        .into_iter()
        .map(|(rule, mut tabs)| {
            sort_tabs(&mut tabs, filters.tabs.sort_by);
            ExpressionGroup {
                display_name: rule.display_name.clone().unwrap_or_else(|| discriminator(&rule)),
                rule,
                tabs,
            }
        })
        .collect();
    sort_groups(&mut results, filters.grouping.sort_by);

    GroupResult::Expression {
        stats,
        results,
        failed,
    }
}
