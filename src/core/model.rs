//! Unified Result Model
//!
//! All commands that report on a page map their findings to this model before
//! rendering output.

use serde::{Deserialize, Serialize};

/// The kind of result item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A traced element and its summary
    Element,
    /// The inspection panel for one element
    Panel,
    /// Overlay state after one replayed event
    Snapshot,
    /// A problem found in a page
    Issue,
}

/// Metadata for a result item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Digest of the element's trace records (xxh3)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    /// Number of trace records behind the item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
}

/// Issue information for a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceIssue {
    pub code: String,
    pub message: String,
}

impl TraceIssue {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// The unified result item that all page commands produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    pub kind: Kind,

    /// Page file the item comes from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Element path inside the page, e.g. `html>body>main#content>article:2`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,

    /// 1-based source line of the element or comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    /// Human-readable text (summary, panel rows, issue message)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,

    /// Structured payload (records, panel rows, overlay state)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default)]
    pub meta: Meta,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<TraceIssue>,
}

impl ResultItem {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            path: None,
            element: None,
            line: None,
            excerpt: None,
            data: None,
            meta: Meta::default(),
            errors: Vec::new(),
        }
    }

    /// Create a traced-element result
    pub fn element(path: impl Into<String>, element: impl Into<String>) -> Self {
        let mut item = Self::new(Kind::Element);
        item.path = Some(path.into());
        item.element = Some(element.into());
        item
    }

    /// Create a panel result
    pub fn panel(path: impl Into<String>, element: impl Into<String>) -> Self {
        let mut item = Self::new(Kind::Panel);
        item.path = Some(path.into());
        item.element = Some(element.into());
        item
    }

    /// Create a replay snapshot result
    pub fn snapshot(path: impl Into<String>) -> Self {
        let mut item = Self::new(Kind::Snapshot);
        item.path = Some(path.into());
        item
    }

    /// Create an issue result
    pub fn issue(issue: TraceIssue) -> Self {
        let mut item = Self::new(Kind::Issue);
        item.excerpt = Some(issue.message.clone());
        item.errors.push(issue);
        item
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Set structured data payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Result set containing multiple result items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub items: Vec<ResultItem>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: ResultItem) {
        self.items.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = ResultItem>) {
        self.items.extend(items);
    }

    /// Sort items by path and line for stable output. Items without a line keep
    /// their relative order after the ones that have one.
    pub fn sort(&mut self) {
        self.items.sort_by(|a, b| match (&a.path, &b.path) {
            (Some(pa), Some(pb)) => pa.cmp(pb).then_with(|| match (a.line, b.line) {
                (Some(la), Some(lb)) => la.cmp(&lb),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = ResultItem;
    type IntoIter = std::vec::IntoIter<ResultItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<ResultItem> for ResultSet {
    fn from_iter<T: IntoIterator<Item = ResultItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_item_element() {
        let item = ResultItem::element("page.html", "html>body>div");
        assert_eq!(item.kind, Kind::Element);
        assert_eq!(item.path, Some("page.html".to_string()));
        assert_eq!(item.element, Some("html>body>div".to_string()));
    }

    #[test]
    fn test_result_item_issue() {
        let item = ResultItem::issue(TraceIssue::new("MALFORMED_TRACE", "bad json"));
        assert_eq!(item.kind, Kind::Issue);
        assert_eq!(item.errors.len(), 1);
        assert_eq!(item.errors[0].code, "MALFORMED_TRACE");
        assert_eq!(item.excerpt, Some("bad json".to_string()));
    }

    #[test]
    fn test_result_set_sort_by_path_then_line() {
        let mut set = ResultSet::new();
        set.push(ResultItem::element("b.html", "x").with_line(1));
        set.push(ResultItem::element("a.html", "y").with_line(9));
        set.push(ResultItem::element("a.html", "z").with_line(3));
        set.push(ResultItem::issue(TraceIssue::new("X", "no path")));
        set.sort();

        let order: Vec<_> = set
            .items
            .iter()
            .map(|i| i.element.clone().unwrap_or_default())
            .collect();
        assert_eq!(order, vec!["z", "y", "x", ""]);
    }

    #[test]
    fn test_data_is_embedded_not_escaped() {
        let item = ResultItem::panel("p.html", "div").with_data(serde_json::json!({
            "rows": [{"method": "get"}]
        }));
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"data\":{\"rows\":[{\"method\":\"get\"}]}"));
        assert!(json.contains("\"kind\":\"panel\""));
    }

    #[test]
    fn test_meta_skips_empty_fields() {
        let item = ResultItem::element("p.html", "div").with_meta(Meta::default());
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"meta\":{}"));
        assert!(!json.contains("errors"));
    }

    #[test]
    fn test_result_item_deserialization() {
        let json = r#"{"kind":"snapshot","path":"p.html","meta":{"records":2}}"#;
        let item: ResultItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, Kind::Snapshot);
        assert_eq!(item.meta.records, Some(2));
    }

    #[test]
    fn test_result_set_from_iter() {
        let set: ResultSet = vec![ResultItem::snapshot("a"), ResultItem::snapshot("b")]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }
}
