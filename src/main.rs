mod aggregate;
mod audit;
mod biblio;
mod catalog;
mod config;
mod document;
mod error;
mod library;
mod listing;
mod numeral;
mod structure;
mod volume;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use catalog_types::{EditionType, LibraryDataset, VolumeBucket};
use clap::{Parser, Subcommand};
use config::{CorpusLayout, OUTPUT_DIR, SNAPSHOT_FILE};

#[derive(Parser)]
#[command(
    name = "kanseki_catalog",
    about = "Classical-text library catalog extractor"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Walk the catalog and write output/library.json
    Extract {
        /// Path to the corpus root (the directory holding top.html)
        #[arg(default_value = ".")]
        corpus: PathBuf,
        /// Worker threads for book structure resolution
        #[arg(short, long, default_value = "1", value_parser = parse_jobs)]
        jobs: usize,
    },
    /// Print the statistics block of the cached snapshot
    Stats,
    /// Print one book of the cached snapshot as JSON, e.g. "A001"
    Show { id: String },
}

/// Parse and validate jobs argument (must be at least 1)
fn parse_jobs(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("'{s}' is not a valid number"))?;
    if n < 1 {
        Err("jobs must be at least 1".to_string())
    } else {
        Ok(n)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Extract { corpus, jobs }) => run_extract(&corpus, jobs),
        Some(Command::Stats) => run_stats(),
        Some(Command::Show { id }) => run_show(&id),
        // Default: extract from current directory
        None => run_extract(Path::new("."), 1),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  OUTPUT FILE HELPERS
// ═══════════════════════════════════════════════════════════════════════

fn snapshot_path() -> PathBuf {
    Path::new(OUTPUT_DIR).join(SNAPSHOT_FILE)
}

fn read_cached_snapshot() -> anyhow::Result<LibraryDataset> {
    let path = snapshot_path();
    library::read_snapshot(&path).with_context(|| {
        format!(
            "cannot load {}; run `extract` first to generate it",
            path.display()
        )
    })
}

// ═══════════════════════════════════════════════════════════════════════
//  EXTRACT MODE: corpus → output/library.json
// ═══════════════════════════════════════════════════════════════════════

fn run_extract(root: &Path, jobs: usize) -> anyhow::Result<()> {
    let layout = CorpusLayout::default();
    let dataset = library::build_library(root, &layout, jobs)
        .with_context(|| format!("extraction failed for corpus {}", root.display()))?;

    let path = snapshot_path();
    let bytes = library::write_snapshot(&dataset, &path)
        .with_context(|| format!("cannot write {}", path.display()))?;

    print_statistics(&dataset);

    let orphans = audit::unreferenced_volumes(root, &dataset);
    if !orphans.is_empty() {
        eprintln!("\n══════════════════════════════════════════");
        eprintln!("  UNREFERENCED VOLUME DOCUMENTS ({} total)", orphans.len());
        eprintln!("══════════════════════════════════════════");
        for o in orphans.iter().take(ORPHAN_WARNINGS) {
            tracing::warn!(volume = %o, "volume document not reached from any book");
        }
        for line in orphan_lines(&orphans) {
            eprintln!("{line}");
        }
    }

    eprintln!("\n  {} ({} bytes)", path.display(), bytes);
    Ok(())
}

const ORPHAN_WARNINGS: usize = 5;
const ORPHAN_LISTED: usize = 30;

/// Report rows under the unreferenced-volumes banner.
fn orphan_lines(orphans: &[String]) -> Vec<String> {
    let mut lines: Vec<String> = orphans
        .iter()
        .take(ORPHAN_LISTED)
        .map(|o| format!("  {o}"))
        .collect();
    if orphans.len() > ORPHAN_LISTED {
        lines.push(format!("  ... and {} more", orphans.len() - ORPHAN_LISTED));
    }
    lines
}

// ═══════════════════════════════════════════════════════════════════════
//  STATS / SHOW MODES: read the cached snapshot
// ═══════════════════════════════════════════════════════════════════════

fn run_stats() -> anyhow::Result<()> {
    let dataset = read_cached_snapshot()?;
    print_statistics(&dataset);
    Ok(())
}

fn run_show(id: &str) -> anyhow::Result<()> {
    let dataset = read_cached_snapshot()?;
    let Some(book) = dataset.find_book(id) else {
        bail!("no book with id {id} in {}", snapshot_path().display());
    };
    let json = serde_json::to_string_pretty(book).context("JSON serialization")?;
    println!("{json}");
    Ok(())
}

fn print_statistics(dataset: &LibraryDataset) {
    let meta = &dataset.metadata;
    let stats = &dataset.statistics;

    eprintln!("\n══════════════════════════════════════════");
    eprintln!("  {}", meta.title);
    eprintln!("══════════════════════════════════════════");
    eprintln!("  generated: {}", meta.generated_at.to_rfc3339());
    eprintln!("  books:     {}", meta.total_books);
    eprintln!("  volumes:   {}", meta.total_volumes);

    eprintln!("\nBy category:");
    for category in &meta.categories {
        let count = stats.by_category.get(category).copied().unwrap_or(0);
        eprintln!("  {category}: {count} books");
    }

    eprintln!("\nBy edition type:");
    for edition in EditionType::ALL {
        let count = stats.by_edition_type.get(&edition).copied().unwrap_or(0);
        eprintln!("  {:<10} {count}", edition.as_str());
    }

    eprintln!("\nBy dynasty:");
    for (dynasty, count) in aggregate::ranked(&stats.by_dynasty) {
        eprintln!("  {dynasty}: {count}");
    }

    eprintln!("\nBy volume count:");
    for bucket in VolumeBucket::ALL {
        let count = stats.by_volume_count_bucket.get(&bucket).copied().unwrap_or(0);
        eprintln!("  {:>5}: {count}", bucket.label());
    }

    let incomplete = dataset.books.iter().filter(|b| b.is_incomplete).count();
    let empty = dataset
        .books
        .iter()
        .filter(|b| b.total_volumes.unwrap_or(0) == 0)
        .count();
    eprintln!("\nIncomplete copies: {incomplete}");
    eprintln!("Books without resolved volumes: {empty}");
}
