//! Unit tests for the output processing pipeline

use termbridge::capture::processor::{
    normalize_line_endings, strip_ansi, OutputProcessor, TRUNCATION_MARKER,
};
use termbridge::config::{CaptureSettings, TruncationMode};

fn settings(max_chars: usize, max_lines: usize, mode: TruncationMode) -> CaptureSettings {
    CaptureSettings {
        max_capture_length: max_chars,
        max_capture_lines: max_lines,
        truncation_mode: mode,
        strip_ansi_sequences: true,
        normalize_line_endings: true,
        capture_history_size: 10,
    }
}

#[test]
fn test_strip_color_sequences() {
    let input = "\x1b[1;31merror:\x1b[0m something broke";
    assert_eq!(strip_ansi(input), "error: something broke");
}

#[test]
fn test_strip_cursor_and_erase_sequences() {
    let input = "progress\x1b[2K\x1b[1Gdone";
    assert_eq!(strip_ansi(input), "progressdone");
}

#[test]
fn test_strip_osc_title_and_cwd_reports() {
    let input = "\x1b]0;my terminal\x07prompt$ \x1b]7;file:///home/dev\x1b\\ls";
    assert_eq!(strip_ansi(input), "prompt$ ls");
}

#[test]
fn test_strip_leaves_plain_text_untouched() {
    let input = "just some text with [brackets] and $dollars";
    assert_eq!(strip_ansi(input), input);
}

#[test]
fn test_stripping_is_idempotent() {
    let inputs = [
        "\x1b[31mred\x1b[0m",
        "\x1b]2;title\x07body",
        "mixed \x1b[1mbold\x1b[22m and \x1b]7;file:///x\x07osc",
        "no sequences at all",
    ];
    for input in inputs {
        let once = strip_ansi(input);
        let twice = strip_ansi(&once);
        assert_eq!(once, twice, "stripping must be idempotent for {:?}", input);
    }
}

#[test]
fn test_normalization() {
    assert_eq!(normalize_line_endings("a\r\nb"), "a\nb");
    assert_eq!(normalize_line_endings("a\rb"), "a\nb");
    assert_eq!(normalize_line_endings("a\nb"), "a\nb");
}

#[test]
fn test_within_limits_output_equals_normalized_input() {
    let processor = OutputProcessor::new(settings(1_000, 100, TruncationMode::KeepBoth));
    let result = processor.process("one\r\ntwo\r\nthree");
    assert_eq!(result.text, "one\ntwo\nthree");
    assert!(!result.truncated);
}

#[test]
fn test_all_modes_bound_output_length() {
    let input: String = (0..500)
        .map(|i| format!("line number {}\n", i))
        .collect();
    let max_chars = 200;

    for mode in [
        TruncationMode::KeepStart,
        TruncationMode::KeepEnd,
        TruncationMode::KeepBoth,
    ] {
        let processor = OutputProcessor::new(settings(max_chars, 10_000, mode));
        let result = processor.process(&input);
        assert!(result.truncated);
        // Bounded by the ceiling plus marker overhead
        let overhead = TRUNCATION_MARKER.chars().count() + 2;
        assert!(
            result.text.chars().count() <= max_chars + overhead,
            "mode {:?} produced {} chars",
            mode,
            result.text.chars().count()
        );
    }
}

#[test]
fn test_keep_both_retains_edges() {
    let input: String = (1..=100)
        .map(|i| format!("row-{}", i))
        .collect::<Vec<_>>()
        .join("\n");
    let processor = OutputProcessor::new(settings(100_000, 10, TruncationMode::KeepBoth));
    let result = processor.process(&input);

    assert!(result.truncated);
    assert!(result.text.contains("row-1"));
    assert!(result.text.contains("row-100"));
    assert!(result.text.contains(TRUNCATION_MARKER));
    assert!(!result.text.contains("row-50"));
}

#[test]
fn test_line_and_char_ceilings_are_independent() {
    // Under the line ceiling, over the char ceiling
    let processor = OutputProcessor::new(settings(20, 1_000, TruncationMode::KeepEnd));
    let result = processor.process(&"x".repeat(100));
    assert!(result.truncated);

    // Under the char ceiling, over the line ceiling
    let processor = OutputProcessor::new(settings(100_000, 3, TruncationMode::KeepStart));
    let result = processor.process("l1\nl2\nl3\nl4\nl5");
    assert!(result.truncated);
    assert!(result.text.contains("l3"));
    assert!(!result.text.contains("l5"));
}

#[test]
fn test_trailing_whitespace_is_trimmed() {
    let processor = OutputProcessor::new(settings(1_000, 100, TruncationMode::KeepBoth));
    let result = processor.process("\n\n  hello  \n\n");
    assert_eq!(result.text, "hello");
}
