/// Tab organizer: turns an expression with capture groups into per-value rules
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::filters::{Filters, GroupSortOrder};
use crate::grouping::{GroupResult, GroupingStrategy};
use crate::rules::Rule;
use crate::stats::compute_stats;
use crate::tab_data::Tab;

/// Where a capture group sits in its expression (byte offsets, end exclusive)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureGroup {
    pub definition: String,
    pub start_index: usize,
    pub end_index: usize,
    pub group_index: usize,
}

/// Locate the capture groups of `expression`.
///
/// `None` when the expression does not compile or would match everything
/// (nothing but parentheses and whitespace). Escaped parentheses are skipped
/// and groups do not nest: each group runs to the first `)` after its `(`.
pub fn capture_groups(expression: &str) -> Option<Vec<CaptureGroup>> {
    if expression.replace(['(', ')'], "").trim().is_empty() {
        return None;
    }

    let compiled = Regex::new(expression).ok()?;
    if compiled.captures_len() == 1 {
        return Some(Vec::new());
    }

    let mut groups = Vec::new();
    let mut cursor = 0;
    while let Some(offset) = expression[cursor..].find('(') {
        let start = cursor + offset;
        if start > 0 && expression.as_bytes()[start - 1] == b'\\' {
            cursor = start + 1;
            continue;
        }
        let Some(length) = expression[start..].find(')') else {
            break;
        };
        let end = start + length + 1;
        groups.push(CaptureGroup {
            definition: expression[start..end].to_string(),
            start_index: start,
            end_index: end,
            group_index: groups.len(),
        });
        cursor = end;
    }
    Some(groups)
}

/// Distinct values each selected group captured, in first-seen order.
///
/// Titles are matched as written; a tab whose title does not match falls
/// back to its lowercased url against the lowercased expression.
pub fn captured_values(tabs: &[Tab], expression: &str, selected: &[usize]) -> Vec<Vec<String>> {
    let mut values: Vec<Vec<String>> = vec![Vec::new(); selected.len()];
    let compiled = (Regex::new(expression), Regex::new(&expression.to_lowercase()));
    let (Ok(title), Ok(url)) = compiled else {
        return values;
    };

    for tab in tabs {
        let lowered_url = tab.url.as_deref().map(str::to_lowercase);
        let captures = tab
            .title
            .as_deref()
            .and_then(|text| title.captures(text))
            .or_else(|| lowered_url.as_deref().and_then(|text| url.captures(text)));
        let Some(captures) = captures else {
            continue;
        };

        for (slot, group) in selected.iter().enumerate() {
            let Some(value) = captures.get(group + 1).map(|m| m.as_str()) else {
                continue;
            };
            if !value.is_empty() && !values[slot].iter().any(|seen| seen == value) {
                values[slot].push(value.to_string());
            }
        }
    }
    values
}

/// Every way of picking one value per group.
fn combinations(values: &[Vec<String>]) -> Vec<Vec<String>> {
    values.iter().fold(vec![Vec::new()], |acc, group| {
        acc.iter()
            .flat_map(|prefix| {
                group.iter().map(move |value| {
                    let mut next = prefix.clone();
                    next.push(value.clone());
                    next
                })
            })
            .collect()
    })
}

/// One rule per combination of captured values, each with the selected
/// groups replaced by their (escaped) values. Rule names list the values in
/// selection order. Repeated or unknown group indices are ignored; with
/// nothing left selected the expression itself becomes the only rule.
pub fn synthesize_rules(
    tabs: &[Tab],
    expression: &str,
    selected: &[usize],
    groups: &[CaptureGroup],
) -> Vec<Rule> {
    let mut picked: Vec<&CaptureGroup> = Vec::new();
    for group in selected.iter().filter_map(|&index| groups.get(index)) {
        if !picked.iter().any(|seen| seen.group_index == group.group_index) {
            picked.push(group);
        }
    }
    if picked.is_empty() {
        return vec![Rule::expression(expression).with_id(expression).with_display_name(expression)];
    }

    let indices: Vec<usize> = picked.iter().map(|group| group.group_index).collect();
    let combos = combinations(&captured_values(tabs, expression, &indices));
    log::debug!("{} combinations for expression {:?}", combos.len(), expression);

    combos
        .into_iter()
        .map(|combo| {
            let mut replacements: Vec<(&CaptureGroup, &String)> =
                picked.iter().copied().zip(&combo).collect();
            // right to left, so earlier offsets stay valid
            replacements.sort_by(|a, b| b.0.start_index.cmp(&a.0.start_index));

            let mut materialized = expression.to_string();
            for (group, value) in replacements {
                let span = group.start_index..group.end_index;
                materialized.replace_range(span, &regex::escape(value));
            }
            Rule::expression(&materialized)
                .with_id(&combo.concat())
                .with_display_name(&combo.join(" - "))
        })
        .collect()
}

/// Preview of an expression against a set of tabs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedExpression {
    pub expression: String,
    pub valid: bool,
    pub capture_groups: Vec<CaptureGroup>,
    pub total_tabs: usize,
    pub matched_tabs: Vec<Tab>,
    pub rules: Vec<Rule>,
    pub matches: GroupResult,
}

pub fn evaluate_expression(
    tabs: &[Tab],
    expression: &str,
    selected: &[usize],
) -> EvaluatedExpression {
    let strategy = GroupingStrategy::Expression;
    let Some(groups) = capture_groups(expression) else {
        return EvaluatedExpression {
            expression: expression.to_string(),
            valid: false,
            capture_groups: Vec::new(),
            total_tabs: tabs.len(),
            matched_tabs: Vec::new(),
            rules: Vec::new(),
            matches: strategy.empty_result(),
        };
    };

    let matched_tabs = match Regex::new(expression) {
        Ok(pattern) => tabs
            .iter()
            .filter(|tab| {
                tab.title.as_deref().is_some_and(|text| pattern.is_match(text))
                    || tab.url.as_deref().is_some_and(|text| pattern.is_match(text))
            })
            .cloned()
            .collect(),
        Err(_) => Vec::new(),
    };

    let rules = synthesize_rules(tabs, expression, selected, &groups);
    let mut filters = Filters::default();
    filters.grouping.sort_by = GroupSortOrder::Count;
    let stats = compute_stats(tabs, &rules, strategy);
    let matches = crate::grouping::expression::build_result(tabs, &rules, &filters, stats);

    EvaluatedExpression {
        expression: expression.to_string(),
        valid: true,
        capture_groups: groups,
        total_tabs: tabs.len(),
        matched_tabs,
        rules,
        matches,
    }
}
