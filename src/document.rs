//! Reading corpus documents and resolving the links between them.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Read a corpus document. Pages are expected to be UTF-8; stray bytes are
/// replaced rather than failing the whole page.
pub fn read_document(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Drop the `?query` and `#fragment` parts of an href.
pub fn strip_href(href: &str) -> &str {
    let end = href.find(['?', '#']).unwrap_or(href.len());
    href[..end].trim()
}

pub fn is_external(href: &str) -> bool {
    let lower = href.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

/// Last path segment of an href: "../html/A001menu.html?x" → "A001menu.html"
pub fn href_file_name(href: &str) -> &str {
    let path = strip_href(href);
    path.rsplit('/').next().unwrap_or(path)
}

/// Resolve an href found in a document under `base_dir` to a local path.
///
/// Root-relative hrefs ("/html/top.html") resolve against the corpus root.
/// External and empty hrefs resolve to nothing.
pub fn resolve_href(root: &Path, base_dir: &Path, href: &str) -> Option<PathBuf> {
    if is_external(href) {
        return None;
    }
    let path = strip_href(href);
    if path.is_empty() {
        return None;
    }
    let joined = match path.strip_prefix('/') {
        Some(rooted) => root.join(rooted),
        None => base_dir.join(path),
    };
    Some(normalize(&joined))
}

/// Lexically fold `.` and `..` so the same document always has the same path.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Corpus-relative, slash-separated form of a path for the snapshot.
pub fn relative_url(root: &Path, path: &Path) -> String {
    let root = normalize(root);
    let path = normalize(path);
    let rel = path.strip_prefix(&root).unwrap_or(&path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Collapse runs of whitespace (including 　) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_href() {
        assert_eq!(strip_href("A001menu.html#top"), "A001menu.html");
        assert_eq!(strip_href("A001menu.html?v=2"), "A001menu.html");
        assert_eq!(strip_href("#section"), "");
    }

    #[test]
    fn test_href_file_name() {
        assert_eq!(href_file_name("../html/A001menu.html?x=1"), "A001menu.html");
        assert_eq!(href_file_name("shi_list.html"), "shi_list.html");
    }

    #[test]
    fn test_resolve_relative_and_rooted() {
        let root = Path::new("/corpus");
        let base = Path::new("/corpus/html/sub");
        assert_eq!(
            resolve_href(root, base, "../A001menu.html"),
            Some(PathBuf::from("/corpus/html/A001menu.html"))
        );
        assert_eq!(
            resolve_href(root, base, "/top.html"),
            Some(PathBuf::from("/corpus/top.html"))
        );
        assert_eq!(resolve_href(root, base, "http://example.org/a.html"), None);
        assert_eq!(resolve_href(root, base, "#anchor"), None);
    }

    #[test]
    fn test_relative_url() {
        let root = Path::new("/corpus/./");
        assert_eq!(
            relative_url(root, Path::new("/corpus/html/A0010001.html")),
            "html/A0010001.html"
        );
    }

    #[test]
    fn test_normalize_keeps_leading_parent_dirs() {
        assert_eq!(normalize(Path::new("./../../tmp/c")), PathBuf::from("../../tmp/c"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize(Path::new("/../corpus/./top.html")), PathBuf::from("/corpus/top.html"));
    }

    #[test]
    fn test_relative_url_with_dot_root() {
        // WalkDir under "." yields "./html/..." while resolved links are folded
        assert_eq!(
            relative_url(Path::new("."), Path::new("./html/A0010010001.html")),
            "html/A0010010001.html"
        );
        assert_eq!(
            relative_url(Path::new("./corpus"), Path::new("corpus/html/A0010010001.html")),
            "html/A0010010001.html"
        );
    }

    #[test]
    fn test_read_document_tolerates_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.html");
        fs::write(&path, b"<p>\xff\xfe\xe5\x8d\xb7</p>").unwrap();
        let text = read_document(&path).unwrap();
        assert!(text.contains('卷'));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace(" 十三卷　 宋刊本\n"), "十三卷 宋刊本");
    }
}
