//! Render scripts - replay a page render through traced bins
//!
//! A script is a JSON array of steps. Markup steps are written to the page as
//! is; cache steps go through the traced bins, which annotate the page as they
//! run. Example:
//!
//! [
//!   {"step": "markup", "html": "<main>"},
//!   {"step": "render", "bin": "render", "cid": "node:5:[lang]=en",
//!    "tags": ["node:5"], "html": "<article>Node 5</article>"},
//!   {"step": "markup", "html": "</main>"}
//! ]

use anyhow::{Context, Result};
use serde::Deserialize;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::backend::debug::RenderOutput;
use crate::backend::factory::DebugBackendFactory;
use crate::backend::{CacheBackend, CacheEntry, Expire};
use crate::core::file_reader::read_required;

fn default_bin() -> String {
    "default".to_string()
}

/// One script step
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Write markup to the page
    Markup { html: String },

    /// Render-cache pattern: get, and on a miss set `html` as the cached
    /// value. The cached or fresh markup is then written.
    Render {
        #[serde(default = "default_bin")]
        bin: String,
        cid: String,
        #[serde(default)]
        tags: Vec<String>,
        html: String,
    },

    Get {
        #[serde(default = "default_bin")]
        bin: String,
        cid: String,
        #[serde(default)]
        allow_invalid: bool,
    },

    Set {
        #[serde(default = "default_bin")]
        bin: String,
        cid: String,
        #[serde(default)]
        data: serde_json::Value,
        /// Unix timestamp, permanent when absent
        #[serde(default)]
        expire: Option<i64>,
        #[serde(default)]
        tags: Vec<String>,
    },

    Delete {
        #[serde(default = "default_bin")]
        bin: String,
        cid: String,
    },

    Invalidate {
        #[serde(default = "default_bin")]
        bin: String,
        cid: String,
    },

    InvalidateTags {
        #[serde(default = "default_bin")]
        bin: String,
        tags: Vec<String>,
    },

    GarbageCollection {
        #[serde(default = "default_bin")]
        bin: String,
    },

    GetMultiple {
        #[serde(default = "default_bin")]
        bin: String,
        cids: Vec<String>,
        #[serde(default)]
        allow_invalid: bool,
    },

    SetMultiple {
        #[serde(default = "default_bin")]
        bin: String,
        entries: Vec<CacheEntry>,
    },

    DeleteMultiple {
        #[serde(default = "default_bin")]
        bin: String,
        cids: Vec<String>,
    },

    DeleteAll {
        #[serde(default = "default_bin")]
        bin: String,
    },

    InvalidateMultiple {
        #[serde(default = "default_bin")]
        bin: String,
        cids: Vec<String>,
    },

    InvalidateAll {
        #[serde(default = "default_bin")]
        bin: String,
    },

    RemoveBin {
        #[serde(default = "default_bin")]
        bin: String,
    },
}

/// Parse a script from JSON text
pub fn parse_script(text: &str) -> Result<Vec<Step>> {
    serde_json::from_str(text).context("Invalid render script")
}

/// Run a script and return the rendered page
pub fn render_page(steps: &[Step]) -> Result<String> {
    let page = Rc::new(RefCell::new(Vec::<u8>::new()));
    let output: RenderOutput = page.clone();
    let mut factory = DebugBackendFactory::new(output);

    for (index, step) in steps.iter().enumerate() {
        run_step(&mut factory, &page, step)
            .with_context(|| format!("Render script step {} failed", index))?;
    }
    tracing::info!(steps = steps.len(), bins = ?factory.bins(), "render script finished");

    let bytes = page.borrow().clone();
    String::from_utf8(bytes).context("Rendered page is not valid UTF-8")
}

fn run_step(
    factory: &mut DebugBackendFactory,
    page: &Rc<RefCell<Vec<u8>>>,
    step: &Step,
) -> Result<()> {
    match step {
        Step::Markup { html } => {
            page.borrow_mut().extend_from_slice(html.as_bytes());
        }
        Step::Render {
            bin,
            cid,
            tags,
            html,
        } => {
            let cache = factory.get(bin);
            let markup = match cache.get(cid, false)? {
                Some(item) => item.data.as_str().unwrap_or(html).to_string(),
                None => {
                    cache.set(cid, serde_json::Value::String(html.clone()), Expire::Permanent, tags)?;
                    html.clone()
                }
            };
            page.borrow_mut().extend_from_slice(markup.as_bytes());
        }
        Step::Get {
            bin,
            cid,
            allow_invalid,
        } => {
            factory.get(bin).get(cid, *allow_invalid)?;
        }
        Step::Set {
            bin,
            cid,
            data,
            expire,
            tags,
        } => {
            factory
                .get(bin)
                .set(cid, data.clone(), Expire::from_timestamp(*expire), tags)?;
        }
        Step::Delete { bin, cid } => factory.get(bin).delete(cid)?,
        Step::Invalidate { bin, cid } => factory.get(bin).invalidate(cid)?,
        Step::InvalidateTags { bin, tags } => factory.get(bin).invalidate_tags(tags)?,
        Step::GarbageCollection { bin } => factory.get(bin).garbage_collection()?,
        Step::GetMultiple {
            bin,
            cids,
            allow_invalid,
        } => {
            let mut misses = cids.clone();
            let hits = factory.get(bin).get_multiple(&mut misses, *allow_invalid)?;
            tracing::debug!(bin = %bin, hits = hits.len(), ?misses, "get_multiple");
        }
        Step::SetMultiple { bin, entries } => factory.get(bin).set_multiple(entries.clone())?,
        Step::DeleteMultiple { bin, cids } => factory.get(bin).delete_multiple(cids)?,
        Step::DeleteAll { bin } => factory.get(bin).delete_all()?,
        Step::InvalidateMultiple { bin, cids } => factory.get(bin).invalidate_multiple(cids)?,
        Step::InvalidateAll { bin } => factory.get(bin).invalidate_all()?,
        Step::RemoveBin { bin } => factory.get(bin).remove_bin()?,
    }
    Ok(())
}

/// Run the trace command: replay a script file and print (or save) the page
pub fn run_trace(script: &Path, out: Option<&Path>) -> Result<()> {
    let text = read_required(script)?;
    let steps = parse_script(&text)?;
    let page = render_page(&steps)?;

    match out {
        Some(path) => std::fs::write(path, &page)
            .with_context(|| format!("Failed to write page: {:?}", path))?,
        None => println!("{}", page),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_step_miss_then_hit() {
        let steps = parse_script(
            r#"[
                {"step": "render", "cid": "block:a", "tags": ["block"], "html": "<p>a</p>"},
                {"step": "render", "cid": "block:a", "html": "<p>ignored</p>"}
            ]"#,
        )
        .unwrap();

        let page = render_page(&steps).unwrap();
        assert_eq!(
            page,
            concat!(
                r#"<!-- CACHE_DEBUG:{"method":"get","cid":"block:a","tags":null} -->"#,
                r#"<!-- CACHE_DEBUG:{"method":"set","cid":"block:a","tags":["block"]} -->"#,
                "<p>a</p>",
                r#"<!-- CACHE_DEBUG:{"method":"get","cid":"block:a","tags":null} -->"#,
                "<p>a</p>",
            )
        );
    }

    #[test]
    fn test_bins_default_and_named() {
        let steps = parse_script(
            r#"[
                {"step": "set", "bin": "data", "cid": "x", "data": 1},
                {"step": "get", "cid": "x"},
                {"step": "markup", "html": "<div></div>"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            steps[1],
            Step::Get {
                bin: "default".into(),
                cid: "x".into(),
                allow_invalid: false
            }
        );
        let page = render_page(&steps).unwrap();
        assert!(page.ends_with("<div></div>"));
    }

    #[test]
    fn test_untraced_steps_leave_no_comment() {
        let steps = parse_script(
            r#"[
                {"step": "set", "cid": "x", "tags": ["t"]},
                {"step": "invalidate_tags", "tags": ["t"]},
                {"step": "invalidate", "cid": "x"},
                {"step": "garbage_collection"},
                {"step": "delete", "cid": "x"}
            ]"#,
        )
        .unwrap();
        let page = render_page(&steps).unwrap();
        assert_eq!(page.matches("CACHE_DEBUG:").count(), 2);
    }

    #[test]
    fn test_bulk_steps_delegate_without_comments() {
        let steps = parse_script(
            r#"[
                {"step": "set_multiple", "entries": [
                    {"cid": "a", "data": 1, "tags": ["t"]},
                    {"cid": "b", "data": 2}
                ]},
                {"step": "get_multiple", "cids": ["a", "b", "c"]},
                {"step": "invalidate_multiple", "cids": ["a"]},
                {"step": "delete_multiple", "cids": ["b"]},
                {"step": "invalidate_all"},
                {"step": "delete_all"},
                {"step": "remove_bin"},
                {"step": "render", "cid": "a", "html": "<p>fresh</p>"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            steps[0],
            Step::SetMultiple {
                bin: "default".into(),
                entries: vec![
                    CacheEntry {
                        cid: "a".into(),
                        data: serde_json::json!(1),
                        expire: Expire::Permanent,
                        tags: vec!["t".into()],
                    },
                    CacheEntry {
                        cid: "b".into(),
                        data: serde_json::json!(2),
                        expire: Expire::Permanent,
                        tags: vec![],
                    },
                ],
            }
        );

        let page = render_page(&steps).unwrap();
        assert_eq!(
            page,
            concat!(
                r#"<!-- CACHE_DEBUG:{"method":"get","cid":"a","tags":null} -->"#,
                r#"<!-- CACHE_DEBUG:{"method":"set","cid":"a","tags":[]} -->"#,
                "<p>fresh</p>",
            )
        );
    }

    #[test]
    fn test_store_error_aborts_with_step_index() {
        let steps = parse_script(r#"[{"step": "markup", "html": "x"}, {"step": "get", "cid": ""}]"#)
            .unwrap();
        let err = render_page(&steps).unwrap_err();
        assert!(format!("{:#}", err).contains("step 1"));
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        assert!(parse_script(r#"[{"step": "explode"}]"#).is_err());
    }
}
