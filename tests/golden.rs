//! Golden tests for cachetrace
//!
//! These tests verify that command outputs match expected golden files.
//! Golden tests ensure:
//! - The trace comment format stays byte-stable
//! - Annotated pages keep their exact markup
//! - No unexpected regressions in output structure

use assert_cmd::Command;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

/// Get the path to the fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn fixture(name: &str) -> String {
    fs::read_to_string(fixtures_dir().join(name)).expect("fixture exists")
}

/// Create a command for running the binary from the fixtures directory
fn cachetrace_cmd() -> Command {
    let mut cmd = Command::cargo_bin("cachetrace").expect("Failed to find cachetrace binary");
    cmd.current_dir(fixtures_dir())
        .env_remove("CACHETRACE_MODE")
        .env_remove("RUST_LOG");
    cmd
}

/// Parse JSONL output into a vector of JSON values
fn parse_jsonl(output: &str) -> Vec<Value> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str::<Value>(l).ok())
        .collect()
}

/// Remove the record digest, which is checked for shape only
fn normalize_item(mut item: Value) -> Value {
    if let Some(meta) = item.get_mut("meta").and_then(|m| m.as_object_mut()) {
        if let Some(hash) = meta.remove("hash") {
            assert_eq!(hash.as_str().map(str::len), Some(16), "digest is 16 hex chars");
        }
    }
    item
}

fn run_stdout(args: &[&str]) -> String {
    let output = cachetrace_cmd().args(args).output().expect("failed to execute");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Trace Tests ====================

    #[test]
    fn golden_trace_page() {
        let stdout = run_stdout(&["trace", "render.json"]);
        assert_eq!(stdout.trim_end(), fixture("page.html").trim_end());
    }

    #[test]
    fn golden_trace_bulk_operations() {
        let stdout = run_stdout(&["trace", "bulk.json"]);
        assert_eq!(stdout.trim_end(), fixture("bulk.html").trim_end());
        assert_eq!(stdout.matches("CACHE_DEBUG:").count(), 1);
    }

    #[test]
    fn golden_trace_is_deterministic() {
        let first = run_stdout(&["trace", "render.json"]);
        let second = run_stdout(&["trace", "render.json"]);
        assert_eq!(first, second);
    }

    // ==================== Annotate Tests ====================

    #[test]
    fn golden_annotate_page() {
        let stdout = run_stdout(&["annotate", "page.html"]);
        assert_eq!(stdout.trim_end(), fixture("annotated.html").trim_end());
    }

    // ==================== Elements Tests ====================

    #[test]
    fn golden_elements() {
        let stdout = run_stdout(&["elements", "page.html"]);
        let items: Vec<Value> = parse_jsonl(&stdout)
            .into_iter()
            .map(normalize_item)
            .collect();

        let expected = vec![
            json!({
                "kind": "element",
                "path": "page.html",
                "element": "html>body>article#node-5",
                "line": 4,
                "excerpt": "node:5",
                "data": {
                    "summary": ["node:5"],
                    "records": [
                        {
                            "method": "get",
                            "raw_id": "node:5:[languages:language_interface]=en",
                            "keys": ["node", "5"],
                            "contexts": ["[languages:language_interface]=en"]
                        },
                        {
                            "method": "set",
                            "raw_id": "node:5:[languages:language_interface]=en",
                            "keys": ["node", "5"],
                            "contexts": ["[languages:language_interface]=en"],
                            "tags": ["node:5", "node_view"]
                        }
                    ]
                },
                "meta": {"records": 2}
            }),
            json!({
                "kind": "element",
                "path": "page.html",
                "element": "html>body>nav",
                "line": 5,
                "excerpt": "menu:main\nblock:menu",
                "data": {
                    "summary": ["menu:main", "block:menu"],
                    "records": [
                        {
                            "method": "set",
                            "raw_id": "menu:main",
                            "keys": ["menu", "main"],
                            "contexts": [],
                            "tags": ["config:menu"]
                        },
                        {
                            "method": "get",
                            "raw_id": "block:menu:[user.roles]=anonymous",
                            "keys": ["block", "menu"],
                            "contexts": ["[user.roles]=anonymous"]
                        },
                        {
                            "method": "set",
                            "raw_id": "block:menu:[user.roles]=anonymous",
                            "keys": ["block", "menu"],
                            "contexts": ["[user.roles]=anonymous"],
                            "tags": ["config:menu"]
                        }
                    ]
                },
                "meta": {"records": 3}
            }),
            json!({
                "kind": "element",
                "path": "page.html",
                "element": "html>body>footer",
                "line": 6,
                "excerpt": "menu:main\nblock:footer",
                "data": {
                    "summary": ["menu:main", "block:footer"],
                    "records": [
                        {
                            "method": "delete",
                            "raw_id": "menu:main",
                            "keys": ["menu", "main"],
                            "contexts": []
                        },
                        {
                            "method": "get",
                            "raw_id": "block:footer",
                            "keys": ["block", "footer"],
                            "contexts": []
                        },
                        {
                            "method": "set",
                            "raw_id": "block:footer",
                            "keys": ["block", "footer"],
                            "contexts": [],
                            "tags": []
                        }
                    ]
                },
                "meta": {"records": 3}
            }),
        ];

        assert_eq!(items, expected);
    }

    #[test]
    fn golden_elements_raw() {
        let stdout = run_stdout(&["--format", "raw", "elements", "page.html"]);
        assert_eq!(
            stdout.trim_end(),
            "node:5\n---\nmenu:main\nblock:menu\n---\nmenu:main\nblock:footer"
        );
    }

    // ==================== Inspect Tests ====================

    #[test]
    fn golden_inspect_raw_panel() {
        let stdout = run_stdout(&["--format", "raw", "inspect", "page.html", "h2"]);
        assert_eq!(
            stdout.trim_end(),
            "get    node:5\n       contexts: [languages:language_interface]=en\n\
             set    node:5\n       contexts: [languages:language_interface]=en\n       tags: node:5, node_view"
        );
    }

    #[test]
    fn golden_inspect_get_mode() {
        let stdout = run_stdout(&["--mode", "get", "--format", "raw", "inspect", "page.html", "nav"]);
        assert_eq!(
            stdout.trim_end(),
            "get    block:menu\n       contexts: [user.roles]=anonymous"
        );
    }

    // ==================== Lint Tests ====================

    #[test]
    fn golden_lint_broken_page() {
        let stdout = run_stdout(&["lint", "broken.html"]);
        let items = parse_jsonl(&stdout);

        let found: Vec<(String, String, u64)> = items
            .iter()
            .map(|v| {
                (
                    v["errors"][0]["code"].as_str().unwrap().to_string(),
                    v["element"].as_str().unwrap().to_string(),
                    v["line"].as_u64().unwrap(),
                )
            })
            .collect();

        assert_eq!(
            found,
            vec![
                ("MALFORMED_TRACE".into(), "html>body>div:2".into(), 5),
                ("UNSUPPORTED_VERSION".into(), "html>body>div:3".into(), 7),
                ("EMPTY_KEYS".into(), "html>body>div:4".into(), 10),
            ]
        );
        assert!(items.iter().all(|v| v["path"] == "broken.html"));
    }

    #[test]
    fn golden_lint_clean_page() {
        let stdout = run_stdout(&["lint", "page.html"]);
        assert!(parse_jsonl(&stdout).is_empty());
    }
}
