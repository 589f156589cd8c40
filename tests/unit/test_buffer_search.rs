//! Unit tests for buffer search over scripted buffers

use termbridge::cancel::CancelToken;
use termbridge::config::SearchSettings;
use termbridge::models::{SearchDirection, SearchOptions, TerminalSearchState};
use termbridge::search::BufferSearch;

#[path = "../test_utils/mock_session.rs"]
mod test_utils;
use test_utils::MockBuffer;

fn engine() -> BufferSearch {
    BufferSearch::new(SearchSettings::default())
}

async fn run_search(lines: &[&str], query: &str, options: SearchOptions) -> TerminalSearchState {
    let buffer = MockBuffer::new(lines);
    engine()
        .search(
            &buffer,
            query,
            &TerminalSearchState::default(),
            options,
            CancelToken::new(),
        )
        .await
}

#[tokio::test]
async fn test_case_insensitive_scenario() {
    // "foo" over ["foo bar", "FOO baz", "qux"] yields (0,0) and (1,0)
    let state = run_search(&["foo bar", "FOO baz", "qux"], "foo", SearchOptions::default()).await;
    assert_eq!(state.result_count(), 2);
    assert_eq!((state.results[0].line, state.results[0].column), (0, 0));
    assert_eq!((state.results[1].line, state.results[1].column), (1, 0));
}

#[tokio::test]
async fn test_results_ordered_by_line_then_column() {
    let state = run_search(&["x foo foo", "foo"], "foo", SearchOptions::default()).await;
    let positions: Vec<(usize, usize)> =
        state.results.iter().map(|r| (r.line, r.column)).collect();
    assert_eq!(positions, vec![(0, 2), (0, 6), (1, 0)]);
}

#[tokio::test]
async fn test_regex_mode() {
    let options = SearchOptions {
        use_regex: true,
        ..SearchOptions::default()
    };
    let state = run_search(&["port 8080 open", "port abc closed"], r"port \d+", options).await;
    assert_eq!(state.result_count(), 1);
    assert_eq!(state.results[0].text, "port 8080");
}

#[tokio::test]
async fn test_invalid_regex_is_reported_not_thrown() {
    let options = SearchOptions {
        use_regex: true,
        ..SearchOptions::default()
    };
    let state = run_search(&["text"], "[unclosed", options).await;
    assert!(state.error.is_some());
    assert!(!state.in_progress);
    assert_eq!(state.result_count(), 0);
}

#[tokio::test]
async fn test_wrap_around_navigation_returns_to_start() {
    let state = run_search(
        &["foo", "foo", "foo"],
        "foo",
        SearchOptions {
            wrap_around: true,
            ..SearchOptions::default()
        },
    )
    .await;
    assert_eq!(state.result_count(), 3);
    assert_eq!(state.current_index, Some(0));

    // N navigations with wrap return to the original index
    let mut current = state.clone();
    for _ in 0..3 {
        current = BufferSearch::navigate_next(&current);
    }
    assert_eq!(current.current_index, Some(0));
}

#[tokio::test]
async fn test_no_wrap_clamps_at_last() {
    let state = run_search(
        &["foo", "foo", "foo"],
        "foo",
        SearchOptions {
            wrap_around: false,
            ..SearchOptions::default()
        },
    )
    .await;

    let mut current = state;
    for _ in 0..10 {
        current = BufferSearch::navigate_next(&current);
    }
    assert_eq!(current.current_index, Some(2));
}

#[tokio::test]
async fn test_navigate_to_line_directional() {
    let state = run_search(
        &["foo", "bar", "foo", "bar", "foo"],
        "foo",
        SearchOptions::default(),
    )
    .await;
    // Results at lines 0, 2, 4
    let forward = BufferSearch::navigate_to_line(&state, 3, SearchDirection::Forward);
    assert_eq!(forward.current_result().unwrap().line, 4);

    let backward = BufferSearch::navigate_to_line(&state, 3, SearchDirection::Backward);
    assert_eq!(backward.current_result().unwrap().line, 2);
}

#[tokio::test]
async fn test_viewport_filter() {
    let state = run_search(
        &["foo", "foo", "foo", "foo", "foo"],
        "foo",
        SearchOptions::default(),
    )
    .await;
    let visible = BufferSearch::visible_results(&state, 1, 2);
    let lines: Vec<usize> = visible.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![1, 2]);
}

#[tokio::test]
async fn test_min_query_length_short_circuits() {
    let state = run_search(&["aaaa"], "a", SearchOptions::default()).await;
    assert_eq!(state.result_count(), 0);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_pre_cancelled_search_keeps_prior_state() {
    let buffer = MockBuffer::new(&["foo bar"]);
    let cancel = CancelToken::new();
    cancel.cancel();

    let prior = TerminalSearchState::with_results(
        "previous",
        SearchOptions::default(),
        Vec::new(),
        None,
    );
    let state = engine()
        .search(&buffer, "foo", &prior, SearchOptions::default(), cancel)
        .await;
    assert_eq!(state.query, "previous");
}

#[tokio::test]
async fn test_incremental_search_narrows() {
    let buffer = MockBuffer::new(&["warn: disk", "warning: cpu", "ok"]);
    let engine = engine();

    let first = engine
        .search(
            &buffer,
            "warn",
            &TerminalSearchState::default(),
            SearchOptions::default(),
            CancelToken::new(),
        )
        .await;
    assert_eq!(first.result_count(), 2);

    let second = engine
        .incremental_search(
            &buffer,
            "warning",
            &first,
            SearchOptions::default(),
            CancelToken::new(),
        )
        .await;
    assert_eq!(second.result_count(), 1);
    assert_eq!(second.results[0].line, 1);
}

#[test]
fn test_validate_pattern_messages() {
    let engine = engine();
    assert!(engine.validate_pattern(r"\bfoo\b").is_none());
    let message = engine.validate_pattern("(a").unwrap();
    assert!(message.contains("Invalid search pattern"));
}
