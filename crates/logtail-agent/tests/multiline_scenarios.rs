//! Scenario tests driving the multiline engine over sample files.
//!
//! Each scenario replays a captured input file line by line, the way the
//! tailer does, and compares the full emitted record sequence - including a
//! final explicit flush for any trailing partial record.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use logtail_agent::config::multiline::{MatchWhichLine, MultilineConfig, Quotation};
use logtail_agent::tail::multiline::{flush, Multiline};

fn run_scenario(config: MultilineConfig, filename: &str) -> Vec<String> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/testdata")
        .join(filename);
    let file =
        File::open(&path).unwrap_or_else(|e| panic!("failed to open {}: {e}", path.display()));

    let mut engine = Multiline::new(config).expect("configuration was ok");
    let mut buffer = String::new();
    let mut result = Vec::new();

    for line in BufReader::new(file).lines() {
        let line = line.expect("line should be readable");
        let text = engine.process_line(&line, &mut buffer);
        if !text.is_empty() {
            result.push(text);
        }
    }
    let text = flush(&mut buffer);
    if !text.is_empty() {
        result.push(text);
    }
    result
}

#[test]
fn quoted_fields_spanning_lines() {
    let cases = [
        (Quotation::SingleQuotes, '\'', "multiline_quoted_single.csv"),
        (Quotation::DoubleQuotes, '"', "multiline_quoted_double.csv"),
        (Quotation::Backticks, '`', "multiline_quoted_backticks.csv"),
    ];

    for (quotation, q, filename) in cases {
        let expected = vec![
            "1660819827410,1,some text without quotes,A".to_string(),
            format!("1660819827411,1,{q}some text all quoted{q},A"),
            format!("1660819827412,1,{q}some text all quoted\nbut wrapped{q},A"),
            format!("1660819827420,2,some text with {q}quotes{q},B"),
            "1660819827430,3,some text with 'multiple \"quotes\" in `one` line',C".to_string(),
            format!("1660819827440,4,some multiline text with {q}quotes\n")
                + &format!("spanning \\{q}multiple\\{q}\n")
                + &format!("lines{q} but do not {q}end\ndirectly{q},D"),
            format!("1660819827450,5,all of {q}this{q} should {q}basically{q} work...,E"),
        ];

        let result = run_scenario(
            MultilineConfig {
                match_which_line: MatchWhichLine::Next,
                quotation,
                preserve_newline: true,
                ..MultilineConfig::default()
            },
            filename,
        );
        assert_eq!(result, expected, "scenario {filename}");
    }
}

// The quote scanner is a plain toggle, not a grammar-aware parser: a stray
// unmatched quote desynchronizes it, merging unrelated rows. That output is
// preserved compatibility, not something to correct.
#[test]
fn stray_quote_merges_unrelated_rows() {
    let result = run_scenario(
        MultilineConfig {
            match_which_line: MatchWhichLine::Next,
            quotation: Quotation::SingleQuotes,
            preserve_newline: true,
            ..MultilineConfig::default()
        },
        "multiline_quoted_messed_up.csv",
    );
    assert_eq!(
        result,
        vec![
            "1660819827410,1,some text without quotes,A".to_string(),
            "1660819827411,1,'some text all quoted,A\n1660819827412,1,'some text all quoted"
                .to_string(),
            "but wrapped,A".to_string(),
        ]
    );
}

#[test]
fn missing_closing_quote_recovered_by_final_flush() {
    let result = run_scenario(
        MultilineConfig {
            match_which_line: MatchWhichLine::Next,
            quotation: Quotation::SingleQuotes,
            preserve_newline: true,
            ..MultilineConfig::default()
        },
        "multiline_quoted_missing_close.csv",
    );
    assert_eq!(
        result,
        vec![
            "1660819827411,2,'some text all quoted,B\n1660819827410,1,some text without quotes,A"
                .to_string(),
        ]
    );
}

const TIMESTAMP_PATTERN: &str =
    r"\[[0-9]{2}/[A-Za-z]{3}/[0-9]{4}:[0-9]{2}:[0-9]{2}:[0-9]{2} \+[0-9]{4}\]";

#[test]
fn stack_trace_without_preserved_newlines() {
    let result = run_scenario(
        MultilineConfig {
            pattern: TIMESTAMP_PATTERN.to_string(),
            invert_match: true,
            ..MultilineConfig::default()
        },
        "test_multiline.log",
    );
    assert_eq!(
        result,
        vec![
            "[04/Jun/2016:12:41:45 +0100] DEBUG HelloExample: This is debug".to_string(),
            "[04/Jun/2016:12:41:48 +0100] INFO HelloExample: This is info".to_string(),
            "[04/Jun/2016:12:41:46 +0100] ERROR HelloExample: Sorry, something wrong! ".to_string()
                + "java.lang.ArithmeticException: / by zero"
                + "\tat com.foo.HelloExample2.divide(HelloExample2.java:24)"
                + "\tat com.foo.HelloExample2.main(HelloExample2.java:14)",
            "[04/Jun/2016:12:41:48 +0100] WARN HelloExample: This is warn".to_string(),
        ]
    );
}

#[test]
fn stack_trace_with_preserved_newlines() {
    let result = run_scenario(
        MultilineConfig {
            pattern: TIMESTAMP_PATTERN.to_string(),
            invert_match: true,
            preserve_newline: true,
            ..MultilineConfig::default()
        },
        "test_multiline.log",
    );
    assert_eq!(
        result,
        vec![
            "[04/Jun/2016:12:41:45 +0100] DEBUG HelloExample: This is debug".to_string(),
            "[04/Jun/2016:12:41:48 +0100] INFO HelloExample: This is info".to_string(),
            "[04/Jun/2016:12:41:46 +0100] ERROR HelloExample: Sorry, something wrong! ".to_string()
                + "\njava.lang.ArithmeticException: / by zero"
                + "\n\tat com.foo.HelloExample2.divide(HelloExample2.java:24)"
                + "\n\tat com.foo.HelloExample2.main(HelloExample2.java:14)",
            "[04/Jun/2016:12:41:48 +0100] WARN HelloExample: This is warn".to_string(),
        ]
    );
}
