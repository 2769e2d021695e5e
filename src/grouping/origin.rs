/// Grouping by url origin, refined by user rules
use std::collections::HashMap;

use crate::filters::{Filters, sort_groups, sort_tabs};
use crate::rules::{Matcher, Rule, resolve};
use crate::stats::TabStats;
use crate::tab_data::Tab;
use crate::uri::{ParsedUri, display_origin, parse};

use super::{DomainGroup, GroupResult, RuleBuckets, bucket_by};

pub fn discriminator(rule: &Rule) -> String {
    rule.origin.clone()
}

/// Catch-all rule covering every tab of the uri's origin.
pub fn default_rule(uri: &ParsedUri<'_>) -> Rule {
    Rule {
        id: format!("default_{}", uri.origin),
        display_name: Some(display_origin(&uri.origin).to_string()),
        origin: uri.origin.clone(),
        pathname: None,
        query_params: Vec::new(),
        use_exact_path: false,
        match_expression: None,
    }
}

/// Parsed tabs bucketed by origin, and the tabs whose url did not parse.
pub fn group_tabs(tabs: &[Tab]) -> (Vec<(String, Vec<ParsedUri<'_>>)>, Vec<&Tab>) {
    let mut parsed = Vec::new();
    let mut failed = Vec::new();
    for tab in tabs {
        match parse(tab) {
            Some(uri) => parsed.push(uri),
            None => failed.push(tab),
        }
    }

    (bucket_by(parsed, |uri| uri.origin.clone()), failed)
}

pub fn group_rules(rules: &[Rule]) -> Vec<(String, Vec<Rule>)> {
    bucket_by(rules.iter().cloned(), discriminator)
}

/// Attribute every parseable tab to exactly one rule of its origin.
///
/// Each origin gets a synthesized catch-all appended after its user rules, so
/// the two-pass resolution always finds a home for the tab.
pub fn group_tabs_by_rules(tabs: &[Tab], rules: &[Rule]) -> (RuleBuckets, Vec<Tab>) {
    let mut rules_by_origin: HashMap<String, Vec<Rule>> = group_rules(rules).into_iter().collect();
    let (tabs_by_origin, unparsable) = group_tabs(tabs);

    let mut buckets: RuleBuckets = Vec::new();
    for (origin, uris) in tabs_by_origin {
        let mut origin_rules = rules_by_origin.remove(&origin).unwrap_or_default();
        origin_rules.push(default_rule(&uris[0]));

        let matchers = Matcher::compile_all(&origin_rules);
        let mut claimed: Vec<Vec<Tab>> = vec![Vec::new(); matchers.len()];
        for uri in &uris {
            match resolve(uri, &matchers) {
                Some(index) => claimed[index].push(uri.source_tab.clone()),
                // unreachable while the default rule is last in line
                None => log::warn!("no rule matched tab {} in {}", uri.source_tab.id, origin),
            }
        }

        buckets.extend(
            origin_rules
                .iter()
                .cloned()
                .zip(claimed)
                .filter(|(_, tabs)| !tabs.is_empty()),
        );
    }

    (buckets, unparsable.into_iter().cloned().collect())
}

pub fn build_result(
    tabs: &[Tab],
    rules: &[Rule],
    filters: &Filters,
    stats: TabStats,
) -> GroupResult {
    let (tabs_by_rule, unparsable) = group_tabs_by_rules(tabs, rules);

    let mut results: Vec<DomainGroup> = tabs_by_rule
        .into_iter()
        .map(|(rule, mut tabs)| {
            sort_tabs(&mut tabs, filters.tabs.sort_by);
            DomainGroup {
                display_name: rule.display_name.clone().unwrap_or_else(|| rule.origin.clone()),
                origin: rule.origin.clone(),
                rule: Some(rule),
                tabs,
            }
        })
        .collect();
    sort_groups(&mut results, filters.grouping.sort_by);

    if !unparsable.is_empty() {
        results.push(DomainGroup {
            display_name: "Unknown".to_string(),
            origin: "unknown".to_string(),
            rule: None,
            tabs: unparsable,
        });
    }

    GroupResult::Domain { stats, results }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::GroupSortOrder;
    use crate::rules::default_rules;

    fn create_test_tab(id: i32, url: &str, title: &str) -> Tab {
        Tab::new(id, url, title)
    }

    fn summary(result: &GroupResult) -> Vec<(String, Vec<i32>)> {
        result
            .groups()
            .into_iter()
            .map(|(name, tabs)| (name.to_string(), tabs.iter().map(|tab| tab.id).collect()))
            .collect()
    }

    #[test]
    fn test_default_rule() {
        let tab = create_test_tab(1, "https://github.com/rust-lang", "Rust");
        let rule = default_rule(&parse(&tab).unwrap());

        assert_eq!(rule.id, "default_https://github.com");
        assert_eq!(rule.display_name.as_deref(), Some("github.com"));
        assert!(rule.is_catch_all());
        assert!(rule.query_params.is_empty());
    }

    #[test]
    fn test_groups_by_origin_with_defaults() {
        let tabs = vec![
            create_test_tab(1, "https://x.com/search?q=cats", "Cats"),
            create_test_tab(2, "https://x.com/search?q=cats", "Cats again"),
            create_test_tab(3, "https://x.com/search?q=dogs", "Dogs"),
            create_test_tab(4, "https://x.com/search?q=dogs", "Dogs again"),
            create_test_tab(5, "https://y.com/", "Y"),
        ];
        let mut filters = Filters::default();
        filters.grouping.sort_by = GroupSortOrder::Count;

        let result = build_result(&tabs, &default_rules(), &filters, TabStats::default());

        assert_eq!(
            summary(&result),
            vec![
                ("x.com".to_string(), vec![1, 2, 3, 4]),
                ("y.com".to_string(), vec![5]),
            ]
        );
    }

    #[test]
    fn test_specific_rule_beats_catch_all_in_any_order() {
        let specific = Rule::new("https://a.com")
            .with_id("x")
            .with_display_name("A / x")
            .with_path("/x");
        let catch_all = Rule::new("https://a.com").with_id("all").with_display_name("All of A");
        let tabs = vec![
            create_test_tab(1, "https://a.com/x", "X"),
            create_test_tab(2, "https://a.com/y", "Y"),
        ];

        for rules in [
            vec![specific.clone(), catch_all.clone()],
            vec![catch_all.clone(), specific.clone()],
        ] {
            let result = build_result(&tabs, &rules, &Filters::default(), TabStats::default());
            assert_eq!(
                summary(&result),
                vec![("A / x".to_string(), vec![1]), ("All of A".to_string(), vec![2])]
            );
        }
    }

    #[test]
    fn test_unmatched_path_falls_back_to_synthesized_rule() {
        let rules = vec![Rule::new("https://a.com").with_display_name("Docs").with_path("/docs")];
        let tabs = vec![
            create_test_tab(1, "https://a.com/docs/intro", "Intro"),
            create_test_tab(2, "https://a.com/blog", "Blog"),
        ];

        let (buckets, failed) = group_tabs_by_rules(&tabs, &rules);

        assert!(failed.is_empty());
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].0.display_name.as_deref(), Some("Docs"));
        assert_eq!(buckets[1].0.id, "default_https://a.com");
        assert_eq!(buckets[1].1[0].id, 2);
    }

    #[test]
    fn test_youtube_defaults_split_videos_from_rest() {
        let tabs = vec![
            create_test_tab(1, "https://www.youtube.com/watch?v=abc", "Video"),
            create_test_tab(2, "https://www.youtube.com/c/rustlang", "Channel"),
            create_test_tab(3, "https://www.youtube.com/feed/library", "Library"),
            create_test_tab(4, "https://www.youtube.com/watch?list=LL", "Playlist"),
        ];

        let result =
            build_result(&tabs, &default_rules(), &Filters::default(), TabStats::default());

        assert_eq!(
            summary(&result),
            vec![
                ("YouTube Channels".to_string(), vec![2]),
                ("YouTube Videos".to_string(), vec![1]),
                ("www.youtube.com".to_string(), vec![3, 4]),
            ]
        );
    }

    #[test]
    fn test_unknown_bucket_last_and_dropped_when_empty() {
        let mut no_url = create_test_tab(2, "", "Nothing");
        no_url.url = None;
        let tabs = vec![
            create_test_tab(1, "https://b.com/", "B"),
            no_url,
            create_test_tab(3, "https://a.com/", "A"),
        ];

        let result = build_result(&tabs, &[], &Filters::default(), TabStats::default());
        let names: Vec<String> = summary(&result).into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a.com", "b.com", "Unknown"]);

        let result = build_result(&tabs[..1], &[], &Filters::default(), TabStats::default());
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_http_origin_keeps_scheme_in_name() {
        let tabs = vec![create_test_tab(1, "http://localhost:3000/", "Dev")];

        let result = build_result(&tabs, &[], &Filters::default(), TabStats::default());

        assert_eq!(summary(&result)[0].0, "http://localhost:3000");
    }
}
