//! Buffer Search State
//!
//! Search state follows copy-on-write semantics: every transition takes
//! a state value and returns a new one. UI code and the background scan
//! therefore never race on shared mutable fields.

use serde::{Deserialize, Serialize};

/// Per-search flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Match case exactly
    pub case_sensitive: bool,
    /// Treat the query as a regular expression
    pub use_regex: bool,
    /// Scan scrollback in addition to the visible screen
    pub include_scrollback: bool,
    /// Wrap to the opposite end when navigating past the last result
    pub wrap_around: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            use_regex: false,
            include_scrollback: true,
            wrap_around: true,
        }
    }
}

/// Direction for line-targeted navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    /// Toward higher line indices
    Forward,
    /// Toward lower line indices
    Backward,
}

/// One match in the rendered buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalSearchResult {
    /// Buffer line the match starts on
    pub line: usize,
    /// Byte column of the match start within the line
    pub column: usize,
    /// Match length in bytes
    pub length: usize,
    /// The matched text
    pub text: String,
    /// Full text of the matched line
    pub line_text: String,
}

/// Snapshot of a search: query, flags, ordered results, and position
#[derive(Debug, Clone, Default)]
pub struct TerminalSearchState {
    /// Query text the results belong to
    pub query: String,
    /// Flags the search ran with
    pub options: SearchOptions,
    /// Matches ordered by (line, column)
    pub results: Vec<TerminalSearchResult>,
    /// Index of the active result; `None` when there are no results
    pub current_index: Option<usize>,
    /// A background scan for this query is still running
    pub in_progress: bool,
    /// User-facing error, e.g. an invalid regex pattern
    pub error: Option<String>,
}

impl TerminalSearchState {
    /// Empty state for a query, used before results arrive
    pub fn pending(query: &str, options: SearchOptions) -> Self {
        Self {
            query: query.to_string(),
            options,
            results: Vec::new(),
            current_index: None,
            in_progress: true,
            error: None,
        }
    }

    /// Finished state carrying results
    pub fn with_results(
        query: &str,
        options: SearchOptions,
        results: Vec<TerminalSearchResult>,
        current_index: Option<usize>,
    ) -> Self {
        let current_index = match current_index {
            Some(i) if i < results.len() => Some(i),
            _ if results.is_empty() => None,
            _ => Some(0),
        };
        Self {
            query: query.to_string(),
            options,
            results,
            current_index,
            in_progress: false,
            error: None,
        }
    }

    /// Finished state carrying a user-facing error
    pub fn with_error(query: &str, options: SearchOptions, message: impl Into<String>) -> Self {
        Self {
            query: query.to_string(),
            options,
            results: Vec::new(),
            current_index: None,
            in_progress: false,
            error: Some(message.into()),
        }
    }

    /// Copy of this state positioned at `index` (clamped to the result range)
    pub fn at_index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.current_index = if self.results.is_empty() {
            None
        } else {
            Some(index.min(self.results.len() - 1))
        };
        next
    }

    /// The active result, when one exists
    pub fn current_result(&self) -> Option<&TerminalSearchResult> {
        self.current_index.and_then(|i| self.results.get(i))
    }

    /// Number of results
    pub fn result_count(&self) -> usize {
        self.results.len()
    }
}
