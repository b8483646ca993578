//! Error types for the catalog extractor

use std::path::PathBuf;

use thiserror::Error;

/// Run-level failures. Only an unreadable root listing aborts a run.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read root listing {}: {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot build structure-resolution pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while resolving one book's structure. Absorbed at the book
/// boundary: the book keeps an empty volume list.
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("no book prefix in entry url {0}")]
    NoPrefix(String),

    #[error("external entry url {0}")]
    External(String),

    #[error("cannot read menu {}: {source}", path.display())]
    MenuUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
