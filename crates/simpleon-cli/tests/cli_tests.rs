//! Integration tests for the `simpleon` CLI binary.
//!
//! These use `assert_cmd` and `predicates` to exercise the binary end to
//! end: stdin/stdout piping, file I/O, JSON output, multi-document streams,
//! comment-embedded extraction, and error reporting with line numbers.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn simpleon() -> Command {
    Command::cargo_bin("simpleon").unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing stdin
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn parse_stdin_to_stdout() {
    simpleon()
        .write_stdin("{ name: widget, count: 3 }")
        .assert()
        .success()
        .stdout(predicate::eq("{\"count\":3,\"name\":\"widget\"}\n"));
}

#[test]
fn dict_keys_come_out_sorted() {
    simpleon()
        .write_stdin("{ b: 1, a: 2 }")
        .assert()
        .success()
        .stdout(predicate::eq("{\"a\":2,\"b\":1}\n"));
}

#[test]
fn multi_documents_one_per_line() {
    simpleon()
        .arg("--multi")
        .write_stdin("1\n2\n3\n")
        .assert()
        .success()
        .stdout(predicate::eq("1\n2\n3\n"));
}

#[test]
fn raw_strings_disable_conversion() {
    simpleon()
        .arg("--raw-strings")
        .write_stdin("42")
        .assert()
        .success()
        .stdout(predicate::eq("\"42\"\n"));
}

#[test]
fn multiline_string_spans_input_lines() {
    simpleon()
        .write_stdin("\"\"\"first\nsecond\"\"\"")
        .assert()
        .success()
        .stdout(predicate::eq("\"first\\nsecond\"\n"));
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON output
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn json_output_is_pretty_printed() {
    simpleon()
        .arg("--json")
        .write_stdin("{ a: 1 }")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"a\": 1"));
}

#[test]
fn json_output_keeps_unquoted_strings_as_strings() {
    simpleon()
        .arg("--json")
        .write_stdin("{ kind: widget }")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"widget\""));
}

// ─────────────────────────────────────────────────────────────────────────────
// File I/O
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn file_to_file() {
    let input_path = "/tmp/simpleon-test-input.son";
    let output_path = "/tmp/simpleon-test-output.txt";
    let _ = std::fs::remove_file(input_path);
    let _ = std::fs::remove_file(output_path);

    std::fs::write(input_path, "[1 2 3]\n").unwrap();

    simpleon()
        .args(["-i", input_path, "-o", output_path])
        .assert()
        .success();

    let content = std::fs::read_to_string(output_path).expect("output file must exist");
    assert_eq!(content, "[1,2,3]\n");

    let _ = std::fs::remove_file(input_path);
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn missing_input_file_fails() {
    simpleon()
        .args(["-i", "/tmp/simpleon-test-does-not-exist.son"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open file"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Comment-embedded extraction
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn extract_mode_reads_marked_lines_only() {
    simpleon()
        .args(["--extract", "#:"])
        .write_stdin("#!/bin/sh\n#: { retries: 3 }\necho hi\n")
        .assert()
        .success()
        .stdout(predicate::eq("{\"retries\":3}\n"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Error reporting
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn errors_carry_line_numbers() {
    simpleon()
        .write_stdin("{\n  a 1\n}\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn unterminated_string_reported_at_end_of_input() {
    simpleon()
        .write_stdin("\"never closed")
        .assert()
        .failure()
        .stderr(predicate::str::contains("end of input"));
}

#[test]
fn trailing_garbage_after_document_is_ignored() {
    // Single-document mode stops reading once the document is complete.
    simpleon()
        .write_stdin("[1]\n}}}invalid\n")
        .assert()
        .success()
        .stdout(predicate::eq("[1]\n"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Misc
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn help_shows_usage() {
    simpleon()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("SimpleON"))
        .stdout(predicate::str::contains("--multi"));
}

#[test]
fn empty_input_produces_no_output() {
    simpleon()
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::eq(""));
}
