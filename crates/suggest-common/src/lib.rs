//! Common types and protocol constants shared by the suggestion server and its clients.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Protocol constants
// ──────────────────────────────────────────────

/// The only route the server answers on.
pub const SUGGEST_ROUTE: &str = "/v1/api/suggest";

/// Plain-text body sent instead of JSON when a query has no matches.
pub const NO_SUGGESTIONS: &str = "No suggestions";

/// Content type of successful replies (including the `No suggestions` one).
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Content type of diagnostic replies.
pub const CONTENT_TYPE_TEXT: &str = "text/html";

/// Default delay between two refresh cycles (15 minutes).
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 15 * 60;

/// Default location of the suggestions file.
pub const DEFAULT_SOURCE_PATH: &str = "suggestions.json";

// ──────────────────────────────────────────────
// Data types
// ──────────────────────────────────────────────

/// A suggestion record as stored in the data source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawRecord {
    pub id: String,
    pub name: String,
    pub cost: f64,
}

/// Request body of `POST /v1/api/suggest`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestQuery {
    pub input: String,
}

/// One entry of a reply: the record name and its rank among the matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub position: usize,
}

/// JSON body of a successful lookup with at least one match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestResponse {
    pub suggestions: Vec<Suggestion>,
}

/// Outcome of a lookup.
///
/// `Empty` is rendered on the wire as the plain text [`NO_SUGGESTIONS`],
/// not as an empty JSON list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestResult {
    Empty,
    Found(SuggestResponse),
}

impl SuggestResult {
    pub fn is_empty(&self) -> bool {
        matches!(self, SuggestResult::Empty)
    }

    /// Matched suggestions in rank order; empty slice for [`SuggestResult::Empty`].
    pub fn suggestions(&self) -> &[Suggestion] {
        match self {
            SuggestResult::Empty => &[],
            SuggestResult::Found(response) => &response.suggestions,
        }
    }
}

impl From<Vec<Suggestion>> for SuggestResult {
    fn from(suggestions: Vec<Suggestion>) -> Self {
        if suggestions.is_empty() {
            SuggestResult::Empty
        } else {
            SuggestResult::Found(SuggestResponse { suggestions })
        }
    }
}

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Rejections of a single HTTP request. Reported to the client, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Unknown HTTP-method")]
    UnknownMethod,

    #[error("The resource '{0}' was not found.")]
    NotFound(String),

    #[error("{0}")]
    MalformedJson(String),

    #[error("JSON format: {{\"input\": \"<user_input>\"}}!")]
    InvalidFormat,
}

impl RequestError {
    /// HTTP status code the error is reported with.
    pub fn status(&self) -> u16 {
        match self {
            RequestError::NotFound(_) => 404,
            RequestError::UnknownMethod
            | RequestError::MalformedJson(_)
            | RequestError::InvalidFormat => 400,
        }
    }
}

/// Failures while fetching records from a data source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed suggestions in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("data source unavailable: {0}")]
    Unavailable(String),
}
