//! Recursive walk over the catalog's listing pages.
//!
//! The walker owns all traversal state: the current category, the set of
//! listing pages already entered, the running book index, and the
//! identifiers handed out so far. It produces one `BookLead` per book link,
//! in discovery order; structure resolution happens afterwards.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::biblio::{Classification, classify};
use crate::config::CorpusLayout;
use crate::document::{href_file_name, normalize, read_document, relative_url, resolve_href};
use crate::error::CatalogError;
use crate::listing::{CatalogLink, ListingItem, parse_listing};
use crate::structure::book_prefix;

/// Identifier prefixes for collections whose urls carry no book prefix.
/// Keyed by a distinctive url substring; the running index completes the id.
pub const SPECIAL_PREFIXES: &[(&str, &str)] = &[
    ("dunhuang", "DH"),
    ("tonko", "DH"),
    ("takuhon", "RUB"),
    ("rubbing", "RUB"),
    ("shokan", "LTR"),
];

/// A discovered book before its volumes are resolved.
#[derive(Debug, Clone)]
pub struct BookLead {
    pub id: String,
    pub category: String,
    pub title: String,
    /// Corpus-relative path, or the raw href for external links
    pub url: String,
    /// Local entry document; `None` for external links
    pub entry_path: Option<PathBuf>,
    pub classification: Classification,
}

pub struct CatalogWalker<'a> {
    root: PathBuf,
    layout: &'a CorpusLayout,
    visited: HashSet<PathBuf>,
    leads: Vec<BookLead>,
    book_index: usize,
    issued: HashMap<String, usize>,
}

impl<'a> CatalogWalker<'a> {
    pub fn new(root: &Path, layout: &'a CorpusLayout) -> Self {
        CatalogWalker {
            root: normalize(root),
            layout,
            visited: HashSet::new(),
            leads: Vec::new(),
            book_index: 0,
            issued: HashMap::new(),
        }
    }

    /// Walk from the root listing. Only an unreadable root listing fails.
    pub fn walk(mut self) -> Result<Vec<BookLead>, CatalogError> {
        let root_doc = self.root.join(self.layout.root_document);
        let html = read_document(&root_doc).map_err(|source| CatalogError::RootUnreadable {
            path: root_doc.clone(),
            source,
        })?;

        self.visited.insert(root_doc.clone());
        self.walk_listing(&root_doc, &html, None);

        info!(
            books = self.leads.len(),
            listings = self.visited.len(),
            "catalog walk finished"
        );
        Ok(self.leads)
    }

    fn walk_listing(&mut self, doc: &Path, html: &str, inherited: Option<String>) {
        let base_dir = doc.parent().unwrap_or(&self.root).to_path_buf();
        let mut category = inherited;

        for item in parse_listing(html) {
            match item {
                ListingItem::Heading(text) => {
                    debug!(category = %text, doc = %doc.display(), "category heading");
                    category = Some(text);
                }
                ListingItem::Link(link) => {
                    let target = resolve_href(&self.root, &base_dir, &link.href);
                    if self.layout.is_listing(href_file_name(&link.href)) {
                        self.enter_listing(&link.href, target, category.clone());
                    } else if let Some(category) = &category {
                        self.add_book(category, link, target);
                    } else {
                        debug!(href = %link.href, "link before any category heading, ignored");
                    }
                }
            }
        }
    }

    fn enter_listing(&mut self, href: &str, target: Option<PathBuf>, category: Option<String>) {
        let Some(path) = target else {
            warn!(href, "external listing link, not followed");
            return;
        };
        if !self.visited.insert(path.clone()) {
            warn!(listing = %path.display(), "listing already walked, skipping repeated reference");
            return;
        }

        match read_document(&path) {
            Ok(html) => {
                debug!(listing = %path.display(), "entering nested listing");
                self.walk_listing(&path, &html, category);
            }
            Err(e) => warn!(listing = %path.display(), "nested listing unreadable: {e}"),
        }
    }

    fn add_book(&mut self, category: &str, link: CatalogLink, target: Option<PathBuf>) {
        let id = self.assign_id(&link.href);
        let url = match &target {
            Some(path) => relative_url(&self.root, path),
            None => link.href.clone(),
        };
        let classification = classify(&link.title, link.description.as_deref().unwrap_or(""));

        debug!(%id, title = %link.title, %url, "book entry");
        self.leads.push(BookLead {
            id,
            category: category.to_string(),
            title: link.title,
            url,
            entry_path: target,
            classification,
        });
    }

    /// Book prefix from the url, else a special-collection prefix plus the
    /// running index, else UNKNOWN plus the running index. The index moves
    /// once per book whichever rule applies.
    fn assign_id(&mut self, href: &str) -> String {
        self.book_index += 1;
        let index = self.book_index;

        let base = book_prefix(href)
            .map(str::to_string)
            .or_else(|| special_prefix(href).map(|p| format!("{p}{index:03}")))
            .unwrap_or_else(|| format!("UNKNOWN{index:03}"));

        let seen = self.issued.entry(base.clone()).or_insert(0);
        *seen += 1;
        match *seen {
            1 => base,
            n => format!("{base}-{n}"),
        }
    }
}

fn special_prefix(href: &str) -> Option<&'static str> {
    let lower = href.to_ascii_lowercase();
    SPECIAL_PREFIXES
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, prefix)| *prefix)
}
