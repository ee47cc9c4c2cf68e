//! CLI integration tests
//!
//! These tests run the built binary against documents written to a
//! temporary directory.

#![cfg(feature = "cli")]

use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn treeconv(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_treeconv"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("Failed to write temp file");
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ============================================================================
// Convert Command Tests
// ============================================================================

#[test]
fn test_cli_convert_yaml_to_xml() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "doc.yaml", "a: 1\nb: true\nc: null\n");

    let output = treeconv(&["convert", arg(&input), "--to", "xml"]);

    assert!(output.status.success(), "convert should succeed");
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "<root><a>1</a><b>true</b><c/></root>\n"
    );
}

#[test]
fn test_cli_convert_to_output_file() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "doc.xml", r#"<doc id="7"><a>1</a><a>2</a></doc>"#);
    let target = dir.path().join("out.json");

    let output = treeconv(&["convert", arg(&input), "-o", arg(&target)]);
    assert!(output.status.success(), "convert should succeed");

    let written = fs::read_to_string(&target).unwrap();
    let json: serde_json::Value = serde_json::from_str(&written).expect("Output should be valid JSON");
    assert_eq!(json, serde_json::json!({"$id": 7, "a": [1, 2]}));
}

#[test]
fn test_cli_convert_custom_root_with_declaration() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "doc.json", r#"[1, 2]"#);

    let output = treeconv(&[
        "convert",
        arg(&input),
        "--to",
        "xml",
        "--root",
        "list",
        "--item",
        "n",
        "--declaration",
    ]);

    assert!(output.status.success(), "convert should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(stdout.contains("<list><n>1</n><n>2</n></list>"));
}

#[test]
fn test_cli_convert_unknown_format() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "doc.json", "{}");

    let output = treeconv(&["convert", arg(&input), "--to", "toml"]);

    assert!(!output.status.success(), "unknown format should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown format 'toml'"), "should name the bad format");
}

#[test]
fn test_cli_convert_rejects_multi_document_yaml() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "docs.yaml", "a: 1\n---\nb: 2\n");

    let output = treeconv(&["convert", arg(&input), "--to", "xml"]);

    assert!(!output.status.success(), "multi-document YAML cannot become XML");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("found 2"), "should report the document count");
}

// ============================================================================
// Compare Command Tests
// ============================================================================

#[test]
fn test_cli_compare_lenient_and_strict() {
    let dir = TempDir::new().unwrap();
    let left = write_file(&dir, "left.json", r#"{"a": 1, "c": null}"#);
    let right = write_file(&dir, "right.xml", "<root><a>1</a><c/></root>");

    let lenient = treeconv(&["compare", "--lenient", arg(&left), arg(&right)]);
    assert!(lenient.status.success(), "lenient compare should pass");
    assert!(String::from_utf8_lossy(&lenient.stdout).contains("Documents are equivalent"));

    let strict = treeconv(&["compare", arg(&left), arg(&right)]);
    assert_eq!(strict.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&strict.stdout);
    assert!(stdout.contains("Documents differ"));
    assert!(stdout.contains("$.c"), "should show the differing path");
}

#[test]
fn test_cli_compare_json_report() {
    let dir = TempDir::new().unwrap();
    let left = write_file(&dir, "left.yaml", "a: 1\nb: x\n");
    let right = write_file(&dir, "right.yaml", "a: 2\nb: x\n");

    let output = treeconv(&["compare", "--json", arg(&left), arg(&right)]);
    assert!(!output.status.success());

    let report: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("Report should be valid JSON");
    assert_eq!(report["mode"], "strict");
    assert_eq!(report["differences"][0]["path"], "$.a");
}
