//! Trace linting
//!
//! Checks for:
//! - Trace comments that carry the marker but do not decode
//! - Trace comments written with a newer wire version
//! - Traced elements whose records have no keys

use anyhow::Result;
use std::path::Path;

use crate::core::file_reader::read_lenient;
use crate::core::model::{ResultItem, ResultSet, TraceIssue};
use crate::core::render::{RenderConfig, Renderer};
use crate::core::util::{collect_pages, display_path};
use crate::overlay::api::PageSession;
use crate::overlay::state::DisplayMode;

/// Lint issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    Error,
    Warning,
}

impl LintSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            LintSeverity::Error => "error",
            LintSeverity::Warning => "warning",
        }
    }
}

/// A lint issue
#[derive(Debug, Clone)]
pub struct LintIssue {
    pub severity: LintSeverity,
    pub code: String,
    pub message: String,
    pub path: String,
    pub element: Option<String>,
    pub line: Option<u32>,
}

impl LintIssue {
    pub fn error(code: &str, message: &str, path: &str, line: Option<u32>) -> Self {
        Self {
            severity: LintSeverity::Error,
            code: code.to_string(),
            message: message.to_string(),
            path: path.to_string(),
            element: None,
            line,
        }
    }

    pub fn warning(code: &str, message: &str, path: &str, line: Option<u32>) -> Self {
        Self {
            severity: LintSeverity::Warning,
            ..Self::error(code, message, path, line)
        }
    }

    pub fn with_element(mut self, element: String) -> Self {
        self.element = Some(element);
        self
    }

    pub fn to_result_item(&self) -> ResultItem {
        let mut item = ResultItem::issue(TraceIssue::new(&self.code, &self.message));
        item.path = Some(self.path.clone());
        item.element = self.element.clone();
        item.line = self.line;
        item.with_data(serde_json::json!({ "severity": self.severity.as_str() }))
    }
}

/// Lint one parsed page
pub fn lint_session(session: &PageSession) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    let doc = &session.doc;
    let index = session.overlay.index();

    for skipped in index.skipped() {
        issues.push(
            LintIssue::error(
                skipped.code,
                &skipped.message,
                &session.label,
                Some(skipped.line),
            )
            .with_element(doc.path(skipped.element)),
        );
    }

    for trace in index.iter() {
        let keyless = trace.records.iter().filter(|r| r.keys.is_empty()).count();
        if keyless == 0 {
            continue;
        }
        issues.push(
            LintIssue::warning(
                "EMPTY_KEYS",
                &format!(
                    "{} of {} trace records have no keys (cid is only contexts or empty)",
                    keyless,
                    trace.records.len()
                ),
                &session.label,
                Some(doc.node(trace.element).line),
            )
            .with_element(doc.path(trace.element)),
        );
    }

    issues.sort_by_key(|issue| issue.line);
    issues
}

/// Lint a page file or every page under a directory
pub fn lint_pages(path: &Path) -> Result<Vec<LintIssue>> {
    let mut issues = Vec::new();

    for page in collect_pages(path) {
        let label = display_path(&page, path);
        let read = read_lenient(&page)?;

        for warning in &read.warnings {
            issues.push(LintIssue::warning(
                warning.code.as_str(),
                &warning.message,
                &label,
                None,
            ));
        }

        let Some(markup) = read.content else {
            continue;
        };

        let session = PageSession::from_markup(label, &markup, DisplayMode::default());
        issues.extend(lint_session(&session));
    }

    tracing::info!(issues = issues.len(), "lint finished");
    Ok(issues)
}

/// Run lint command
pub fn run_lint(path: &Path, config: RenderConfig) -> Result<()> {
    let issues = lint_pages(path)?;

    let mut result_set: ResultSet = issues.iter().map(LintIssue::to_result_item).collect();
    result_set.sort();
    if result_set.is_empty() {
        tracing::info!(path = %path.display(), "no trace issues found");
    }

    let renderer = Renderer::with_config(config);
    println!("{}", renderer.render(&result_set));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn lint(markup: &str) -> Vec<LintIssue> {
        lint_session(&PageSession::from_markup(
            "page.html",
            markup,
            DisplayMode::Both,
        ))
    }

    #[test]
    fn test_clean_page() {
        let issues = lint(r#"<body><!-- CACHE_DEBUG:{"method":"get","cid":"a:b"} --><div></div>"#);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_malformed_and_unsupported() {
        let page = concat!(
            "<body>\n",
            "<!-- CACHE_DEBUG:{\"method\":\"fetch\",\"cid\":\"a\"} -->\n",
            "<!-- CACHE_DEBUG:{\"v\":2,\"method\":\"get\",\"cid\":\"a\"} -->\n",
            "<div></div>\n",
            "</body>"
        );
        let issues = lint(page);
        let codes: Vec<_> = issues.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["MALFORMED_TRACE", "UNSUPPORTED_VERSION"]);
        assert_eq!(issues[0].line, Some(2));
        assert_eq!(issues[1].line, Some(3));
        assert_eq!(issues[0].element.as_deref(), Some("html>body>div"));
        assert!(issues.iter().all(|i| i.severity == LintSeverity::Error));
    }

    #[test]
    fn test_empty_keys() {
        let issues = lint(concat!(
            "<body>",
            r#"<!-- CACHE_DEBUG:{"method":"get","cid":"[user]=1"} -->"#,
            r#"<!-- CACHE_DEBUG:{"method":"get","cid":"a"} -->"#,
            "<p></p>"
        ));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "EMPTY_KEYS");
        assert_eq!(issues[0].severity, LintSeverity::Warning);
        assert!(issues[0].message.starts_with("1 of 2"));
    }

    #[test]
    fn test_issue_result_item() {
        let item = LintIssue::error("MALFORMED_TRACE", "bad", "page.html", Some(4))
            .with_element("div".into())
            .to_result_item();
        assert_eq!(item.errors[0].code, "MALFORMED_TRACE");
        assert_eq!(item.line, Some(4));
        assert_eq!(item.data.unwrap()["severity"], "error");
    }

    #[test]
    fn test_lint_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.html"),
            "<body><!-- CACHE_DEBUG:{oops} --><div></div>",
        )
        .unwrap();
        fs::write(dir.path().join("b.html"), "<div></div>").unwrap();
        fs::write(dir.path().join("c.html"), b"<div>\x00</div>").unwrap();

        let issues = lint_pages(dir.path()).unwrap();
        let found: Vec<_> = issues
            .iter()
            .map(|i| (i.path.as_str(), i.code.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![("a.html", "MALFORMED_TRACE"), ("c.html", "BINARY_FILE")]
        );
    }

    #[test]
    fn test_lint_missing_file() {
        assert!(lint_pages(Path::new("/nonexistent/page.html")).is_err());
    }
}
