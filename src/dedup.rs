/// Duplicate tab detection and dedupe planning
use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::grouping::{GroupResult, bucket_by};
use crate::host::BrowserHost;
use crate::tab_data::Tab;
use crate::uri::origin_of;

/// How strictly two addresses must agree to count as the same page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DuplicatePolicy {
    /// Full url equality.
    Exact,
    /// Origin and path equality; the query string is ignored.
    BasePath,
    /// Like `BasePath`, unless a preset knows which query parameters identify the page.
    #[default]
    Presets,
}

/// Site-specific identity: pages under `base` are the same resource when
/// every parameter in `params` has the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePreset {
    pub base: String,
    pub params: Vec<String>,
}

impl DuplicatePreset {
    pub fn new(base: &str, params: &[&str]) -> DuplicatePreset {
        DuplicatePreset {
            base: base.to_string(),
            params: params.iter().map(|param| param.to_string()).collect(),
        }
    }

    pub fn same_resource(&self, a: &Url, b: &Url) -> bool {
        self.params
            .iter()
            .all(|param| query_value(a, param) == query_value(b, param))
    }
}

/// First value of a query parameter, as `URLSearchParams.get` reports it.
fn query_value<'u>(url: &'u Url, name: &str) -> Option<Cow<'u, str>> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

/// Registered presets, looked up by exact origin + path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetRegistry {
    presets: Vec<DuplicatePreset>,
}

impl PresetRegistry {
    pub fn empty() -> PresetRegistry {
        PresetRegistry {
            presets: Vec::new(),
        }
    }

    pub fn builtin() -> PresetRegistry {
        PresetRegistry {
            presets: vec![
                DuplicatePreset::new("https://www.youtube.com/watch", &["v"]),
                DuplicatePreset::new("https://www.google.com/search", &["q"]),
                DuplicatePreset::new("https://news.ycombinator.com/item", &["id"]),
            ],
        }
    }

    /// Adds a preset, replacing any existing one for the same base.
    pub fn register(&mut self, preset: DuplicatePreset) {
        self.presets.retain(|existing| existing.base != preset.base);
        self.presets.push(preset);
    }

    pub fn get(&self, base: &str) -> Option<&DuplicatePreset> {
        self.presets.iter().find(|preset| preset.base == base)
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A tab paired with its parsed address and its position in the tab list
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub position: usize,
    pub tab: &'a Tab,
    pub url: Url,
}

impl<'a> Candidate<'a> {
    /// `None` for tabs without a parseable url.
    pub fn from_tab(position: usize, tab: &'a Tab) -> Option<Candidate<'a>> {
        let url = Url::parse(tab.url.as_deref()?).ok()?;
        Some(Candidate { position, tab, url })
    }

    /// Every tab with a parseable url. Positions index into `tabs`.
    pub fn collect(tabs: &'a [Tab]) -> Vec<Candidate<'a>> {
        tabs.iter()
            .enumerate()
            .filter_map(|(position, tab)| Candidate::from_tab(position, tab))
            .collect()
    }

    pub fn base_path(&self) -> String {
        base_path(&self.url)
    }
}

fn base_path(url: &Url) -> String {
    format!("{}{}", origin_of(url), url.path())
}

fn matching_candidates<'c, 'a>(
    source: &Url,
    candidates: &'c [Candidate<'a>],
    policy: DuplicatePolicy,
    presets: &PresetRegistry,
    claimed: &HashSet<usize>,
) -> Vec<&'c Candidate<'a>> {
    let source_base = base_path(source);
    let preset = match policy {
        DuplicatePolicy::Presets => presets.get(&source_base),
        DuplicatePolicy::Exact | DuplicatePolicy::BasePath => None,
    };

    let dupes: Vec<&'c Candidate<'a>> = candidates
        .iter()
        .filter(|candidate| !claimed.contains(&candidate.position))
        .filter(|candidate| match policy {
            DuplicatePolicy::Exact => candidate.url.as_str() == source.as_str(),
            DuplicatePolicy::BasePath | DuplicatePolicy::Presets => {
                candidate.base_path() == source_base
                    && preset.is_none_or(|preset| preset.same_resource(source, &candidate.url))
            }
        })
        .collect();

    if dupes.len() == 1 {
        return Vec::new();
    }
    dupes
}

/// Tabs among `candidates` that are the same resource as `source`.
///
/// Candidates whose position is in `claimed` are skipped. Tabs are told
/// apart by position, never by id, so tabs sharing an id (`TAB_ID_NONE`)
/// stay distinct. A lone match is the source itself, so a single-member
/// result comes back empty.
pub fn filter_duplicate_tabs<'a>(
    source: &Url,
    candidates: &[Candidate<'a>],
    policy: DuplicatePolicy,
    presets: &PresetRegistry,
    claimed: &HashSet<usize>,
) -> Vec<&'a Tab> {
    matching_candidates(source, candidates, policy, presets, claimed)
        .into_iter()
        .map(|candidate| candidate.tab)
        .collect()
}

/// Positions in `tabs` of every set of two or more tabs that resolve to the same resource.
///
/// Tabs are bucketed by base path first; a bucket can still hold several
/// distinct resources (two different searches), so each bucket is resolved
/// source by source, claiming tabs as they are assigned.
fn duplicate_positions(
    tabs: &[Tab],
    policy: DuplicatePolicy,
    presets: &PresetRegistry,
) -> Vec<Vec<usize>> {
    let buckets = bucket_by(Candidate::collect(tabs), Candidate::base_path);

    let mut sets = Vec::new();
    for (_, bucket) in buckets {
        if bucket.len() == 1 {
            continue;
        }

        let mut claimed = HashSet::new();
        for source in &bucket {
            if claimed.contains(&source.position) {
                continue;
            }
            let dupes: Vec<usize> =
                matching_candidates(&source.url, &bucket, policy, presets, &claimed)
                    .into_iter()
                    .map(|candidate| candidate.position)
                    .collect();
            if dupes.is_empty() {
                continue;
            }
            claimed.extend(dupes.iter().copied());
            sets.push(dupes);
        }
    }
    sets
}

/// Every set of two or more tabs that resolve to the same resource.
pub fn duplicate_sets<'a>(
    tabs: &'a [Tab],
    policy: DuplicatePolicy,
    presets: &PresetRegistry,
) -> Vec<Vec<&'a Tab>> {
    duplicate_positions(tabs, policy, presets)
        .into_iter()
        .map(|set| set.into_iter().map(|position| &tabs[position]).collect())
        .collect()
}

/// All tabs that have at least one duplicate under `policy`.
pub fn group_and_filter_duplicate_tabs<'a>(
    tabs: &'a [Tab],
    policy: DuplicatePolicy,
    presets: &PresetRegistry,
) -> Vec<&'a Tab> {
    duplicate_sets(tabs, policy, presets)
        .into_iter()
        .flatten()
        .collect()
}

/// What to look up duplicates for
#[derive(Debug, Clone, Copy)]
pub enum DuplicateTarget<'a> {
    Tab(&'a Tab),
    Url(&'a str),
}

impl<'a> From<&'a Tab> for DuplicateTarget<'a> {
    fn from(tab: &'a Tab) -> Self {
        DuplicateTarget::Tab(tab)
    }
}

impl<'a> From<&'a str> for DuplicateTarget<'a> {
    fn from(url: &'a str) -> Self {
        DuplicateTarget::Url(url)
    }
}

/// Duplicates of one tab or url across every open tab.
pub async fn find_duplicate_tabs<H: BrowserHost>(
    host: &H,
    target: DuplicateTarget<'_>,
    policy: DuplicatePolicy,
    presets: &PresetRegistry,
) -> Result<Vec<Tab>> {
    let raw = match target {
        DuplicateTarget::Tab(tab) => tab.url.as_deref().ok_or(Error::MissingUrl(tab.id))?,
        DuplicateTarget::Url(url) => url,
    };
    let source = Url::parse(raw).map_err(|source| Error::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;

    let tabs = host.all_tabs().await?;
    let candidates = Candidate::collect(&tabs);

    let dupes = filter_duplicate_tabs(&source, &candidates, policy, presets, &HashSet::new());
    log::debug!("found {} duplicates of {}", dupes.len(), source);
    Ok(dupes.into_iter().cloned().collect())
}

/// Outcome of a dedupe: the tabs that stay and the ids to close
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupePlan {
    pub keep: Vec<Tab>,
    pub close: Vec<i32>,
}

/// Keep the first tab of every duplicate set and close the rest.
pub fn dedupe_tabs(tabs: &[Tab], policy: DuplicatePolicy, presets: &PresetRegistry) -> DedupePlan {
    let close: HashSet<usize> = duplicate_positions(tabs, policy, presets)
        .into_iter()
        .flat_map(|set| set.into_iter().skip(1))
        .collect();

    let mut plan = DedupePlan::default();
    for (position, tab) in tabs.iter().enumerate() {
        if close.contains(&position) {
            plan.close.push(tab.id);
        } else {
            plan.keep.push(tab.clone());
        }
    }
    plan
}

/// Ids to close for a duplicates-filtered grouping: all but the first tab of each group.
pub fn tabs_to_close(result: &GroupResult) -> Vec<i32> {
    result
        .group_tabs()
        .into_iter()
        .flat_map(|tabs| tabs.iter().skip(1).map(|tab| tab.id))
        .collect()
}
