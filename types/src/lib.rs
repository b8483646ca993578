//! Snapshot data model shared by the catalog extractor and every
//! downstream consumer of `library.json` (manifest generator, index
//! renderer, validator, schema generator).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Edition type ─────────────────────────────────────────────────────────

/// How a physical book was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditionType {
    /// 鈔本 / 手稿 / 手簡
    Manuscript,
    /// 刊本 / 活字印本 / 石印本
    Printed,
    /// 拓本
    Rubbing,
    Unknown,
}

impl EditionType {
    pub const ALL: [EditionType; 4] = [
        EditionType::Manuscript,
        EditionType::Printed,
        EditionType::Rubbing,
        EditionType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manuscript => "manuscript",
            Self::Printed => "printed",
            Self::Rubbing => "rubbing",
            Self::Unknown => "unknown",
        }
    }
}

// ── Volume-count bucket ──────────────────────────────────────────────────

/// Fixed histogram buckets for per-book volume counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VolumeBucket {
    #[serde(rename = "0")]
    Empty,
    #[serde(rename = "1-5")]
    UpTo5,
    #[serde(rename = "6-10")]
    UpTo10,
    #[serde(rename = "11-20")]
    UpTo20,
    #[serde(rename = "21-50")]
    UpTo50,
    #[serde(rename = "50+")]
    Over50,
}

impl VolumeBucket {
    pub const ALL: [VolumeBucket; 6] = [
        VolumeBucket::Empty,
        VolumeBucket::UpTo5,
        VolumeBucket::UpTo10,
        VolumeBucket::UpTo20,
        VolumeBucket::UpTo50,
        VolumeBucket::Over50,
    ];

    pub fn for_count(count: u32) -> Self {
        match count {
            0 => Self::Empty,
            1..=5 => Self::UpTo5,
            6..=10 => Self::UpTo10,
            11..=20 => Self::UpTo20,
            21..=50 => Self::UpTo50,
            _ => Self::Over50,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Empty => "0",
            Self::UpTo5 => "1-5",
            Self::UpTo10 => "6-10",
            Self::UpTo20 => "11-20",
            Self::UpTo50 => "21-50",
            Self::Over50 => "50+",
        }
    }
}

// ── Volume ───────────────────────────────────────────────────────────────

/// One physical volume (fascicle) of a book, parsed from its volume document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookVolume {
    /// File stem of the volume document, e.g. "A0010010003"
    pub id: String,
    pub title: String,
    /// Corpus-relative path of the volume document
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_number: Option<u32>,
    /// 第N册, when the volume name carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_number: Option<u32>,
    /// Ordering fallback taken from the file name's 4-digit suffix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_sequence: Option<u32>,
}

// ── Book ─────────────────────────────────────────────────────────────────

/// One catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookEntry {
    pub id: String,
    pub category: String,
    pub title: String,
    /// Declared count as written in the catalog, e.g. "十卷", "不分卷"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_count: Option<String>,
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynasty: Option<String>,
    pub publication_info: String,
    pub collection_info: String,
    /// Corpus-relative path (or external URL) of the catalog link
    pub url: String,
    pub edition_type: EditionType,
    /// Damaged or partially held copy
    pub is_incomplete: bool,
    pub has_seals: bool,
    pub has_annotations: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<Vec<BookVolume>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_volumes: Option<usize>,
}

// ── Dataset ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    pub title: String,
    pub total_books: usize,
    /// Distinct categories in order of first appearance
    pub categories: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub total_volumes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStatistics {
    pub by_category: BTreeMap<String, usize>,
    pub by_edition_type: BTreeMap<EditionType, usize>,
    pub by_dynasty: BTreeMap<String, usize>,
    pub by_volume_count_bucket: BTreeMap<VolumeBucket, usize>,
}

/// The run's snapshot: the sole artifact written by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryDataset {
    pub metadata: DatasetMetadata,
    pub books: Vec<BookEntry>,
    pub statistics: LibraryStatistics,
}

impl LibraryDataset {
    pub fn find_book(&self, id: &str) -> Option<&BookEntry> {
        self.books.iter().find(|b| b.id == id)
    }
}
