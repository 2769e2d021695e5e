/// Tab address normalization
use std::collections::HashMap;

use url::{Origin, Url};

use crate::tab_data::Tab;

/// Structured view of a tab's address, borrowed from the tab it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedUri<'a> {
    pub origin: String,
    pub hostname: String,
    pub protocol: String,
    pub pathname: String,
    pub query_params: HashMap<String, String>,
    pub original_uri: &'a str,
    pub source_tab: &'a Tab,
}

impl<'a> ParsedUri<'a> {
    /// Origin and path without the query string.
    pub fn base_path(&self) -> String {
        format!("{}{}", self.origin, self.pathname)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }
}

/// Parse a tab's url into a [`ParsedUri`].
///
/// Returns `None` when the tab has no url or the url does not parse; callers
/// route such tabs to their fallback bucket.
pub fn parse(tab: &Tab) -> Option<ParsedUri<'_>> {
    let original_uri = tab.url.as_deref()?;
    let url = match Url::parse(original_uri) {
        Ok(url) => url,
        Err(err) => {
            log::warn!("tab {} has an unparsable url {:?}: {}", tab.id, original_uri, err);
            return None;
        }
    };

    // Duplicate keys keep the last value, like URLSearchParams entries folded into a map
    let query_params = url
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    Some(ParsedUri {
        origin: origin_of(&url),
        hostname: url.host_str().unwrap_or_default().to_string(),
        protocol: format!("{}:", url.scheme()),
        pathname: url.path().to_string(),
        query_params,
        original_uri,
        source_tab: tab,
    })
}

/// Serialized origin of a url.
///
/// Special schemes use the standard `scheme://host[:port]` tuple. Browser
/// schemes such as `chrome://` or `chrome-extension://` have opaque origins in
/// the URL standard, but the browser still reports them as `scheme://host`,
/// and that is what rules are written against.
pub fn origin_of(url: &Url) -> String {
    match url.origin() {
        origin @ Origin::Tuple(..) => origin.ascii_serialization(),
        Origin::Opaque(_) => match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}://{}:{}", url.scheme(), host, port),
            (Some(host), None) => format!("{}://{}", url.scheme(), host),
            (None, _) => "null".to_string(),
        },
    }
}

/// Human-friendly origin: `https://` is implied and dropped.
pub fn display_origin(origin: &str) -> &str {
    origin.strip_prefix("https://").unwrap_or(origin)
}
