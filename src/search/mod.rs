//! Buffer Search Engine
//!
//! Scans a session's rendered buffer for plain-text or regex matches on
//! the blocking pool, so the calling context is never blocked, with
//! cooperative cancellation checked at a coarse granularity. Navigation
//! over results is a set of pure state transforms.
//!
//! Both search modes compile down to a `regex` pattern (plain queries
//! are escaped first), which keeps column arithmetic in one place. The
//! engine is linear-time, so a pathological pattern cannot stall a
//! scan; pattern problems are caught up front by validation and
//! surfaced as a user-facing message in the state.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::config::SearchSettings;
use crate::models::{SearchDirection, SearchOptions, TerminalSearchResult, TerminalSearchState};
use crate::session::TerminalBuffer;

/// Upper bound for compiled pattern size; oversized patterns are
/// rejected at validation instead of degrading the scan
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Search service over rendered terminal buffers
pub struct BufferSearch {
    settings: SearchSettings,
}

impl BufferSearch {
    /// Create a search engine with the given settings
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    /// Check a regex pattern without running a search.
    ///
    /// Returns a human-readable message for invalid patterns, `None`
    /// when the pattern is usable.
    pub fn validate_pattern(&self, pattern: &str) -> Option<String> {
        match compile_pattern(pattern, true, false) {
            Ok(_) => None,
            Err(e) => Some(format!("Invalid search pattern: {}", e)),
        }
    }

    /// Run a search over a session's buffer.
    ///
    /// Returns a new state value; `prior` is only consulted to keep the
    /// active result position stable when re-running the same query,
    /// and is returned unchanged when the scan is cancelled.
    pub async fn search(
        &self,
        buffer: &dyn TerminalBuffer,
        query: &str,
        prior: &TerminalSearchState,
        options: SearchOptions,
        cancel: CancelToken,
    ) -> TerminalSearchState {
        if query.chars().count() < self.settings.min_query_length {
            return TerminalSearchState::with_results(query, options, Vec::new(), None);
        }

        let regex = match compile_pattern(query, options.use_regex, options.case_sensitive) {
            Ok(regex) => regex,
            Err(e) => {
                return TerminalSearchState::with_error(
                    query,
                    options,
                    format!("Invalid search pattern: {}", e),
                )
            }
        };

        let lines = snapshot(buffer, options.include_scrollback);
        self.scan_in_background(lines, regex, query, prior, options, cancel)
            .await
    }

    /// Search while the user is typing.
    ///
    /// When the new query extends the previous one, only lines that
    /// already matched are re-scanned; otherwise this is a full search.
    pub async fn incremental_search(
        &self,
        buffer: &dyn TerminalBuffer,
        query: &str,
        prior: &TerminalSearchState,
        options: SearchOptions,
        cancel: CancelToken,
    ) -> TerminalSearchState {
        let narrows_prior = options == prior.options
            && prior.error.is_none()
            && !prior.results.is_empty()
            && prior.query.chars().count() >= self.settings.min_query_length
            && query.starts_with(prior.query.as_str())
            && query != prior.query;

        if !narrows_prior {
            return self.search(buffer, query, prior, options, cancel).await;
        }

        if query.chars().count() < self.settings.min_query_length {
            return TerminalSearchState::with_results(query, options, Vec::new(), None);
        }

        let regex = match compile_pattern(query, options.use_regex, options.case_sensitive) {
            Ok(regex) => regex,
            Err(e) => {
                return TerminalSearchState::with_error(
                    query,
                    options,
                    format!("Invalid search pattern: {}", e),
                )
            }
        };

        // Matched line texts were recorded with the results, so the
        // narrowed scan does not have to touch the buffer again.
        let mut lines: Vec<(usize, String)> = Vec::new();
        for result in &prior.results {
            if lines.last().map(|(idx, _)| *idx) != Some(result.line) {
                lines.push((result.line, result.line_text.clone()));
            }
        }

        debug!(
            narrowed_to = lines.len(),
            query = %query,
            "incremental search over prior match lines"
        );
        self.scan_in_background(lines, regex, query, prior, options, cancel)
            .await
    }

    /// Empty search state
    pub fn clear_search() -> TerminalSearchState {
        TerminalSearchState::default()
    }

    /// Advance to the next result, wrapping or clamping per the state
    pub fn navigate_next(state: &TerminalSearchState) -> TerminalSearchState {
        let count = state.results.len();
        if count == 0 {
            return state.clone();
        }
        let current = state.current_index.unwrap_or(0);
        let next = if current + 1 < count {
            current + 1
        } else if state.options.wrap_around {
            0
        } else {
            count - 1
        };
        state.at_index(next)
    }

    /// Step back to the previous result, wrapping or clamping per the state
    pub fn navigate_previous(state: &TerminalSearchState) -> TerminalSearchState {
        let count = state.results.len();
        if count == 0 {
            return state.clone();
        }
        let current = state.current_index.unwrap_or(0);
        let previous = if current > 0 {
            current - 1
        } else if state.options.wrap_around {
            count - 1
        } else {
            0
        };
        state.at_index(previous)
    }

    /// Jump to a specific result index (clamped)
    pub fn navigate_to_index(state: &TerminalSearchState, index: usize) -> TerminalSearchState {
        state.at_index(index)
    }

    /// Jump to the result nearest to `line` in the given direction
    pub fn navigate_to_line(
        state: &TerminalSearchState,
        line: usize,
        direction: SearchDirection,
    ) -> TerminalSearchState {
        if state.results.is_empty() {
            return state.clone();
        }

        let found = match direction {
            SearchDirection::Forward => state.results.iter().position(|r| r.line >= line),
            SearchDirection::Backward => state
                .results
                .iter()
                .rposition(|r| r.line <= line),
        };

        let index = match found {
            Some(index) => index,
            None if state.options.wrap_around => match direction {
                SearchDirection::Forward => 0,
                SearchDirection::Backward => state.results.len() - 1,
            },
            None => match direction {
                SearchDirection::Forward => state.results.len() - 1,
                SearchDirection::Backward => 0,
            },
        };
        state.at_index(index)
    }

    /// Results intersecting the half-open line range
    /// `[first_visible_line, first_visible_line + visible_line_count)`
    pub fn visible_results(
        state: &TerminalSearchState,
        first_visible_line: usize,
        visible_line_count: usize,
    ) -> Vec<TerminalSearchResult> {
        let end = first_visible_line.saturating_add(visible_line_count);
        state
            .results
            .iter()
            .filter(|r| r.line >= first_visible_line && r.line < end)
            .cloned()
            .collect()
    }

    async fn scan_in_background(
        &self,
        lines: Vec<(usize, String)>,
        regex: Regex,
        query: &str,
        prior: &TerminalSearchState,
        options: SearchOptions,
        cancel: CancelToken,
    ) -> TerminalSearchState {
        let max_results = self.settings.max_results;
        let check_interval = self.settings.cancel_check_interval.max(1);

        let scan = tokio::task::spawn_blocking(move || {
            scan_lines(&lines, &regex, max_results, check_interval, &cancel)
        })
        .await;

        match scan {
            Ok(Some(results)) => {
                let keep_index = if prior.query == query {
                    prior.current_index
                } else {
                    None
                };
                TerminalSearchState::with_results(query, options, results, keep_index)
            }
            // Cancelled mid-scan; a newer search owns the state now
            Ok(None) => prior.clone(),
            Err(e) => {
                TerminalSearchState::with_error(query, options, format!("Search failed: {}", e))
            }
        }
    }
}

/// Compile a query into the scanning regex; plain queries are escaped
fn compile_pattern(
    query: &str,
    use_regex: bool,
    case_sensitive: bool,
) -> std::result::Result<Regex, regex::Error> {
    let pattern = if use_regex {
        query.to_string()
    } else {
        regex::escape(query)
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(!case_sensitive)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
}

/// Materialize buffer lines as (absolute line index, text) pairs
fn snapshot(buffer: &dyn TerminalBuffer, include_scrollback: bool) -> Vec<(usize, String)> {
    let total = buffer.total_line_count();
    let start = if include_scrollback {
        0
    } else {
        buffer.first_visible_line().min(total)
    };
    (start..total)
        .map(|i| (i, buffer.line_text(i).unwrap_or_default()))
        .collect()
}

/// Scan lines top to bottom, left to right; `None` when cancelled
fn scan_lines(
    lines: &[(usize, String)],
    regex: &Regex,
    max_results: usize,
    check_interval: usize,
    cancel: &CancelToken,
) -> Option<Vec<TerminalSearchResult>> {
    let mut results = Vec::new();

    for (scanned, (line_index, line)) in lines.iter().enumerate() {
        if scanned % check_interval == 0 && cancel.is_cancelled() {
            debug!(scanned, "buffer search cancelled");
            return None;
        }

        for m in regex.find_iter(line) {
            if m.is_empty() {
                // Zero-width matches (e.g. `a*`) would loop on one column
                continue;
            }
            results.push(TerminalSearchResult {
                line: *line_index,
                column: m.start(),
                length: m.end() - m.start(),
                text: m.as_str().to_string(),
                line_text: line.clone(),
            });
            if results.len() >= max_results {
                debug!(max_results, "result cap reached, stopping scan");
                return Some(results);
            }
        }
    }

    Some(results)
}
