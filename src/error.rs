/// Error types for the host-facing parts of the grouping engine
use thiserror::Error;

/// Errors surfaced by operations that touch the browser host or rule storage.
///
/// Grouping itself never fails: unparsable urls, bad expressions and missing
/// host metadata are recovered locally. Only lookups that need a live host
/// read or a storage write report these.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("tab {0} has no url")]
    MissingUrl(i32),

    #[error("host call `{call}` failed: {message}")]
    Host { call: &'static str, message: String },

    #[error("failed to decode host data: {0}")]
    Decode(String),

    #[error("rule storage failed: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
