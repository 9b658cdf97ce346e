//! Common utilities

use std::path::Path;
use walkdir::WalkDir;
use xxhash_rust::xxh3::xxh3_64;

/// Page file extensions picked up when a directory is given
const PAGE_EXTENSIONS: &[&str] = &["html", "htm", "xhtml"];

/// Compute the xxh3 digest of bytes as 16 hex chars
pub fn hash_bytes(data: &[u8]) -> String {
    format!("{:016x}", xxh3_64(data))
}

/// Whether a path looks like a captured page
pub fn is_page_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| PAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand a page argument: a file stays as is, a directory becomes every page
/// file beneath it, sorted for stable output.
pub fn collect_pages(path: &Path) -> Vec<std::path::PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }

    let mut pages: Vec<_> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_page_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    pages.sort();
    pages
}

/// Display form of a page path, relative to `base` when possible, using '/'
pub fn display_path(path: &Path, base: &Path) -> String {
    let shown = path.strip_prefix(base).unwrap_or(path);
    let shown = if shown.as_os_str().is_empty() {
        path
    } else {
        shown
    };
    shown.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hash_bytes() {
        let hash = hash_bytes(b"hello world");
        assert_eq!(hash.len(), 16);
        assert_eq!(hash, hash_bytes(b"hello world"));
        assert_ne!(hash, hash_bytes(b"hello world!"));
    }

    #[test]
    fn test_is_page_file() {
        assert!(is_page_file(Path::new("a/page.html")));
        assert!(is_page_file(Path::new("PAGE.HTM")));
        assert!(!is_page_file(Path::new("script.json")));
        assert!(!is_page_file(Path::new("noext")));
    }

    #[test]
    fn test_collect_pages_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.html"), "").unwrap();
        fs::write(dir.path().join("sub/a.htm"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let pages = collect_pages(dir.path());
        let names: Vec<_> = pages
            .iter()
            .map(|p| display_path(p, dir.path()))
            .collect();
        assert_eq!(names, vec!["b.html", "sub/a.htm"]);
    }

    #[test]
    fn test_collect_pages_single_file() {
        let pages = collect_pages(Path::new("page.html"));
        assert_eq!(pages, vec![std::path::PathBuf::from("page.html")]);
    }

    #[test]
    fn test_display_path_for_file_argument() {
        let path = Path::new("captures/page.html");
        assert_eq!(display_path(path, path), "captures/page.html");
    }
}
