//! Find volume documents on disk that no book's structure reaches.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use catalog_types::LibraryDataset;
use regex::Regex;
use walkdir::WalkDir;

use crate::document::relative_url;

// Menu-linked (prefix + 7 digits) and scan-probed (prefix + 4 digits) names
static RE_ANY_VOLUME_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]\d{3}(?:\d{7}|\d{4})\.html$").unwrap());

/// Corpus-relative paths of volume documents not referenced by any book,
/// sorted.
pub fn unreferenced_volumes(root: &Path, dataset: &LibraryDataset) -> Vec<String> {
    let referenced: HashSet<&str> = dataset
        .books
        .iter()
        .filter_map(|b| b.structure.as_ref())
        .flatten()
        .map(|v| v.url.as_str())
        .collect();

    let mut orphans: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|name| RE_ANY_VOLUME_FILE.is_match(name))
        })
        .map(|e| relative_url(root, e.path()))
        .filter(|url| !referenced.contains(url.as_str()))
        .collect();

    orphans.sort();
    orphans
}
