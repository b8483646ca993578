//! Expand one catalog entry into its ordered list of volumes.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use catalog_types::BookVolume;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::config::CorpusLayout;
use crate::document::{href_file_name, read_document, resolve_href};
use crate::error::StructureError;
use crate::volume::{VolumeMiss, parse_volume, read_volume};

// Book prefix: one uppercase letter + 3 digits, e.g. "A001" in
// "html/A001menu.html" or "A0010010003.html".
static RE_BOOK_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]\d{3}").unwrap());

// Volume link inside a menu: prefix + 7 digits, e.g. "A0010010003.html"
static RE_VOLUME_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]\d{3}\d{7}\.html$").unwrap());

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// The 4-character book prefix, looked up in the file name first and then
/// anywhere in the url.
pub fn book_prefix(url: &str) -> Option<&str> {
    RE_BOOK_PREFIX
        .find(href_file_name(url))
        .or_else(|| RE_BOOK_PREFIX.find(url))
        .map(|m| m.as_str())
}

/// Resolve a book's volumes. Any failure is logged with the book's url and
/// yields an empty list; one book never blocks the others.
pub fn book_structure(
    url: &str,
    entry_path: Option<&Path>,
    root: &Path,
    layout: &CorpusLayout,
) -> Vec<BookVolume> {
    match resolve_structure(url, entry_path, root, layout) {
        Ok(volumes) => volumes,
        Err(StructureError::External(_)) => {
            debug!(url, "external entry, no local structure");
            Vec::new()
        }
        Err(e) => {
            warn!(url, "structure resolution failed: {e}");
            Vec::new()
        }
    }
}

pub fn resolve_structure(
    url: &str,
    entry_path: Option<&Path>,
    root: &Path,
    layout: &CorpusLayout,
) -> Result<Vec<BookVolume>, StructureError> {
    let entry_path = entry_path.ok_or_else(|| StructureError::External(url.to_string()))?;
    let entry_dir = entry_path.parent().unwrap_or(root);
    let entry_name = entry_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let menu_path = if layout.is_menu_or_top(entry_name) {
        entry_path.to_path_buf()
    } else {
        let prefix = book_prefix(url).ok_or_else(|| StructureError::NoPrefix(url.to_string()))?;
        entry_dir.join(layout.menu_file_name(prefix))
    };

    let mut volumes = if menu_path.is_file() {
        volumes_from_menu(&menu_path, root)?
    } else {
        warn!(url, menu = %menu_path.display(), "menu document missing, scanning volume files");
        let prefix = book_prefix(url).ok_or_else(|| StructureError::NoPrefix(url.to_string()))?;
        scan_volumes(entry_dir, prefix, root, layout)
    };

    sort_volumes(&mut volumes);
    Ok(volumes)
}

/// Every volume link in a menu document (strict file-name pattern, first
/// occurrence only), parsed in link order.
fn volumes_from_menu(menu_path: &Path, root: &Path) -> Result<Vec<BookVolume>, StructureError> {
    let html = read_document(menu_path).map_err(|source| StructureError::MenuUnreadable {
        path: menu_path.to_path_buf(),
        source,
    })?;
    let menu_dir = menu_path.parent().unwrap_or(root);

    let links = volume_links(&html, root, menu_dir);
    debug!(menu = %menu_path.display(), links = links.len(), "menu volume links");

    Ok(links
        .iter()
        .filter_map(|path| parse_volume(path, root))
        .collect())
}

fn volume_links(html: &str, root: &Path, menu_dir: &Path) -> Vec<PathBuf> {
    let document = Html::parse_document(html);
    let mut links: Vec<PathBuf> = Vec::new();

    for anchor in document.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !RE_VOLUME_FILE.is_match(href_file_name(href)) {
            continue;
        }
        if let Some(path) = resolve_href(root, menu_dir, href)
            && !links.contains(&path)
        {
            links.push(path);
        }
    }

    links
}

/// Probe `{prefix}{seq:04}.html` for seq = 1..=scan_limit. After the first
/// miss, at most `scan_miss_budget` further probes are issued, hits or not.
fn scan_volumes(dir: &Path, prefix: &str, root: &Path, layout: &CorpusLayout) -> Vec<BookVolume> {
    let mut volumes = Vec::new();
    let mut probes_after_first_miss: Option<u32> = None;

    for seq in 1..=layout.scan_limit {
        if probes_after_first_miss.is_some_and(|n| n >= layout.scan_miss_budget) {
            debug!(prefix, seq, "scan budget exhausted");
            break;
        }
        if let Some(n) = probes_after_first_miss.as_mut() {
            *n += 1;
        }

        let path = dir.join(layout.scan_file_name(prefix, seq));
        match read_volume(&path, root) {
            Ok(volume) => volumes.push(volume),
            Err(miss) => {
                match miss {
                    VolumeMiss::NotFound => debug!(probe = %path.display(), "scan miss"),
                    other => warn!("skipping volume {}: {other}", path.display()),
                }
                if probes_after_first_miss.is_none() {
                    probes_after_first_miss = Some(0);
                }
            }
        }
    }

    volumes
}

/// Ascending by volume number (absent = 0), stable for ties.
fn sort_volumes(volumes: &mut [BookVolume]) {
    volumes.sort_by_key(|v| v.volume_number.unwrap_or(0));
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn volume_page(num: u32, name: &str) -> String {
        format!("<script>var volNum = {num};\nvar volName = \"{name}\";</script>")
    }

    #[test]
    fn test_book_prefix() {
        assert_eq!(book_prefix("html/A001menu.html"), Some("A001"));
        assert_eq!(book_prefix("B0020010003.html"), Some("B002"));
        assert_eq!(book_prefix("C123/index.html"), Some("C123"));
        assert_eq!(book_prefix("about.html"), None);
    }

    #[test]
    fn test_menu_links_strict_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let html = r#"
            <a href="A0010010002.html">卷二</a>
            <a href="A0010010001.html">卷一</a>
            <a href="A0010010001.html#p3">卷一 p3</a>
            <a href="A0010001.html">short name</a>
            <a href="a0010010001.html">lowercase</a>
            <a href="../top.html">top</a>"#;
        let links = volume_links(html, root, root);
        assert_eq!(
            links,
            vec![root.join("A0010010002.html"), root.join("A0010010001.html")]
        );
    }

    #[test]
    fn test_menu_structure_sorted_and_sparse() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let html_dir = root.join("html");
        fs::create_dir(&html_dir).unwrap();
        fs::write(
            html_dir.join("A001menu.html"),
            r#"<a href="A0010010003.html">3</a><a href="A0010010001.html">1</a><a href="A0010010002.html">2</a><a href="A0010010004.html">4</a>"#,
        )
        .unwrap();
        fs::write(html_dir.join("A0010010003.html"), volume_page(3, "尚書正義卷第三")).unwrap();
        fs::write(html_dir.join("A0010010001.html"), volume_page(1, "尚書正義卷第一")).unwrap();
        // 0002 is malformed, 0004 is missing
        fs::write(html_dir.join("A0010010002.html"), "<script>var volNum = 2;</script>").unwrap();

        let layout = CorpusLayout::default();
        let entry = html_dir.join("A001menu.html");
        let volumes = resolve_structure("html/A001menu.html", Some(&entry), root, &layout).unwrap();
        let ids: Vec<&str> = volumes.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["A0010010001", "A0010010003"]);
        assert_eq!(volumes[1].url, "html/A0010010003.html");
    }

    #[test]
    fn test_menu_derived_from_entry_url() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("B002menu.html"), r#"<a href="B0020010001.html">1</a>"#).unwrap();
        fs::write(root.join("B0020010001.html"), volume_page(1, "說文卷第一")).unwrap();

        let layout = CorpusLayout::default();
        let entry = root.join("B002index.html");
        let volumes = resolve_structure("B002index.html", Some(&entry), root, &layout).unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].id, "B0020010001");
    }

    #[test]
    fn test_no_menu_no_files_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CorpusLayout::default();
        let entry = dir.path().join("C003index.html");
        let volumes = book_structure("C003index.html", Some(&entry), dir.path(), &layout);
        assert!(volumes.is_empty());
    }

    #[test]
    fn test_scan_fallback_stops_after_miss_budget() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        // 1–3 present, 4 missing, 5–20 present
        for seq in (1..=3).chain(5..=20) {
            fs::write(
                root.join(format!("D004{seq:04}.html")),
                volume_page(seq, &format!("卷第{seq}")),
            )
            .unwrap();
        }

        let layout = CorpusLayout::default();
        let volumes = scan_volumes(root, "D004", root, &layout);
        let seqs: Vec<u32> = volumes.iter().filter_map(|v| v.file_sequence).collect();
        // Ten probes after the miss at 4: sequences 5..=14
        let expected: Vec<u32> = (1..=3).chain(5..=14).collect();
        assert_eq!(seqs, expected);
    }

    #[test]
    fn test_scan_collects_contiguous_run() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for seq in 1..=4 {
            fs::write(root.join(format!("E005{seq:04}.html")), volume_page(seq, "附錄")).unwrap();
        }
        let layout = CorpusLayout::default();
        let entry = root.join("E005index.html");
        let volumes = resolve_structure("E005index.html", Some(&entry), root, &layout).unwrap();
        assert_eq!(volumes.len(), 4);
    }

    #[test]
    fn test_missing_prefix_and_external_yield_empty() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CorpusLayout::default();
        let entry = dir.path().join("about.html");
        assert!(matches!(
            resolve_structure("about.html", Some(&entry), dir.path(), &layout),
            Err(StructureError::NoPrefix(_))
        ));
        assert!(book_structure("http://example.org/A001.html", None, dir.path(), &layout).is_empty());
    }

    #[test]
    fn test_sort_is_stable_for_ties_and_absent_numbers() {
        let v = |id: &str, n: Option<u32>| BookVolume {
            id: id.to_string(),
            title: String::new(),
            url: String::new(),
            volume_number: n,
            chapter_number: None,
            start_page: None,
            max_page: None,
            book_number: None,
            file_sequence: None,
        };
        let mut volumes = vec![v("a", Some(2)), v("b", None), v("c", Some(1)), v("d", Some(2))];
        sort_volumes(&mut volumes);
        let ids: Vec<&str> = volumes.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a", "d"]);
    }
}
