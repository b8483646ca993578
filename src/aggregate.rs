use std::collections::BTreeMap;

use catalog_types::{
    BookEntry, DatasetMetadata, EditionType, LibraryDataset, LibraryStatistics, VolumeBucket,
};
use chrono::{DateTime, Utc};

use crate::numeral::parse_numeral_or;

/// Volume count used for bucketing: the catalog's declared count when it
/// has one (不分卷 counts as 1), otherwise the resolved volume total.
pub fn counted_volumes(book: &BookEntry) -> u32 {
    match &book.volume_count {
        Some(declared) => parse_numeral_or(declared.trim_end_matches('卷'), 1),
        None => book.total_volumes.unwrap_or(0) as u32,
    }
}

/// Fold the finished book list into the snapshot.
pub fn aggregate(books: Vec<BookEntry>, title: &str, generated_at: DateTime<Utc>) -> LibraryDataset {
    let mut categories: Vec<String> = Vec::new();
    let mut stats = LibraryStatistics {
        by_edition_type: EditionType::ALL.iter().map(|t| (*t, 0)).collect(),
        by_volume_count_bucket: VolumeBucket::ALL.iter().map(|b| (*b, 0)).collect(),
        ..LibraryStatistics::default()
    };

    for book in &books {
        if !categories.contains(&book.category) {
            categories.push(book.category.clone());
        }
        *stats.by_category.entry(book.category.clone()).or_insert(0) += 1;
        *stats.by_edition_type.entry(book.edition_type).or_insert(0) += 1;
        if let Some(dynasty) = &book.dynasty {
            *stats.by_dynasty.entry(dynasty.clone()).or_insert(0) += 1;
        }
        let bucket = VolumeBucket::for_count(counted_volumes(book));
        *stats.by_volume_count_bucket.entry(bucket).or_insert(0) += 1;
    }

    let total_volumes = books.iter().map(|b| b.total_volumes.unwrap_or(0)).sum();

    LibraryDataset {
        metadata: DatasetMetadata {
            title: title.to_string(),
            total_books: books.len(),
            categories,
            generated_at,
            total_volumes,
        },
        books,
        statistics: stats,
    }
}

/// Sorted (label, count) rows, largest first, for the corpus report.
pub fn ranked(counts: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    let mut rows: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    rows.sort_by_key(|(_, c)| std::cmp::Reverse(*c));
    rows
}
