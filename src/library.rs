//! The whole extraction run: walk → resolve → aggregate → snapshot.

use std::fs;
use std::path::Path;

use catalog_types::{BookEntry, BookVolume, LibraryDataset};
use chrono::Utc;
use rayon::prelude::*;
use tracing::info;

use crate::aggregate::aggregate;
use crate::catalog::{BookLead, CatalogWalker};
use crate::config::CorpusLayout;
use crate::error::CatalogError;
use crate::structure::book_structure;

impl BookLead {
    /// Single write of every field once the volumes are known.
    pub fn into_entry(self, structure: Vec<BookVolume>) -> BookEntry {
        let c = self.classification;
        BookEntry {
            id: self.id,
            category: self.category,
            title: self.title,
            volume_count: c.volume_count,
            authors: c.authors,
            dynasty: c.dynasty,
            publication_info: c.publication_info,
            collection_info: c.collection_info,
            url: self.url,
            edition_type: c.edition_type,
            is_incomplete: c.is_incomplete,
            has_seals: c.has_seals,
            has_annotations: c.has_annotations,
            total_volumes: Some(structure.len()),
            structure: Some(structure),
        }
    }
}

/// Build the dataset for the corpus under `root`.
///
/// Structure resolution runs on a pool of `jobs` threads; the indexed
/// collect keeps books in discovery order whatever the completion order.
pub fn build_library(
    root: &Path,
    layout: &CorpusLayout,
    jobs: usize,
) -> Result<LibraryDataset, CatalogError> {
    info!(root = %root.display(), "walking catalog listings");
    let leads = CatalogWalker::new(root, layout).walk()?;

    info!(books = leads.len(), jobs, "resolving book structures");
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    let structures: Vec<Vec<BookVolume>> = pool.install(|| {
        leads
            .par_iter()
            .map(|lead| book_structure(&lead.url, lead.entry_path.as_deref(), root, layout))
            .collect()
    });

    let books: Vec<BookEntry> = leads
        .into_iter()
        .zip(structures)
        .map(|(lead, structure)| lead.into_entry(structure))
        .collect();

    let dataset = aggregate(books, layout.library_title, Utc::now());
    info!(
        books = dataset.metadata.total_books,
        volumes = dataset.metadata.total_volumes,
        categories = dataset.metadata.categories.len(),
        "aggregation finished"
    );
    Ok(dataset)
}

/// Replace the snapshot at `path` (temporary sibling, then rename).
pub fn write_snapshot(dataset: &LibraryDataset, path: &Path) -> Result<usize, CatalogError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(dataset)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    info!(path = %path.display(), bytes = json.len(), "snapshot written");
    Ok(json.len())
}

pub fn read_snapshot(path: &Path) -> Result<LibraryDataset, CatalogError> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
