use std::io;
use std::path::Path;
use std::sync::LazyLock;

use catalog_types::BookVolume;
use regex::Regex;
use tracing::{debug, warn};

use crate::document::{read_document, relative_url};
use crate::numeral::{NUMERAL_CLASS, parse_numeral};

// ── Script declarations ─────────────────────────────────────────────
//
// Every volume page embeds its viewer state as script variables:
//     <script>
//     var bookNum = 1;
//     var volNum = 3;
//     var volName = "尚書正義卷第三";
//     var startPage = 5;
//     var maxPage = 142;
//     </script>
//
// volNum and volName are mandatory; the rest may be missing.

static RE_VOL_NUM: LazyLock<Regex> = LazyLock::new(|| int_declaration("volNum"));
static RE_START_PAGE: LazyLock<Regex> = LazyLock::new(|| int_declaration("startPage"));
static RE_MAX_PAGE: LazyLock<Regex> = LazyLock::new(|| int_declaration("maxPage"));
static RE_BOOK_NUM: LazyLock<Regex> = LazyLock::new(|| int_declaration("bookNum"));

static RE_VOL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bvolName\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')"#).unwrap()
});

// 卷第{numeral} inside the volume name: "尚書正義卷第十二" → 12
static RE_JUAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("卷第(?P<n>[{NUMERAL_CLASS}]+)")).unwrap());

// 第{numeral}册 inside the volume name: "史記卷第一第二册" → 2
static RE_CE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("第(?P<n>[{NUMERAL_CLASS}]+)[册冊]")).unwrap());

// 4-digit sequence at the end of the file name: "A0010010003.html" → 3
static RE_FILE_SEQ: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{4})\.html$").unwrap());

/// `name = 12`, `var name = "12";`
fn int_declaration(name: &str) -> Regex {
    Regex::new(&format!(r#"\b{name}\s*=\s*["']?(\d+)"#)).unwrap()
}

fn capture_int(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

// ── Parsing ─────────────────────────────────────────────────────────

/// Why a volume document yielded no volume. Never a run failure.
#[derive(Debug)]
pub enum VolumeMiss {
    NotFound,
    Unreadable(io::Error),
    /// The page exists but lacks a mandatory declaration
    Malformed(&'static str),
}

impl std::fmt::Display for VolumeMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VolumeMiss::NotFound => write!(f, "not found"),
            VolumeMiss::Unreadable(e) => write!(f, "unreadable: {e}"),
            VolumeMiss::Malformed(field) => write!(f, "missing {field} declaration"),
        }
    }
}

/// Read and parse one volume document.
pub fn read_volume(path: &Path, root: &Path) -> Result<BookVolume, VolumeMiss> {
    let text = read_document(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => VolumeMiss::NotFound,
        _ => VolumeMiss::Unreadable(e),
    })?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    parse_volume_text(&text, file_name, &relative_url(root, path))
}

/// Read one volume document, logging and discarding any miss.
pub fn parse_volume(path: &Path, root: &Path) -> Option<BookVolume> {
    match read_volume(path, root) {
        Ok(volume) => {
            debug!(id = %volume.id, title = %volume.title, "parsed volume");
            Some(volume)
        }
        Err(miss) => {
            warn!("skipping volume {}: {miss}", path.display());
            None
        }
    }
}

/// Build a volume from the declarations embedded in a page's text.
pub fn parse_volume_text(text: &str, file_name: &str, url: &str) -> Result<BookVolume, VolumeMiss> {
    let declared_num = capture_int(&RE_VOL_NUM, text).ok_or(VolumeMiss::Malformed("volNum"))?;
    let vol_name = RE_VOL_NAME
        .captures(text)
        .and_then(|c| c.name("dq").or_else(|| c.name("sq")))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or(VolumeMiss::Malformed("volName"))?;

    let mut volume_number = declared_num;
    let mut chapter_number = None;
    if let Some(caps) = RE_JUAN.captures(&vol_name) {
        volume_number = parse_numeral(&caps["n"]);
        chapter_number = RE_CE.captures(&vol_name).map(|c| parse_numeral(&c["n"]));
    }

    let file_sequence = RE_FILE_SEQ
        .captures(file_name)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(declared_num);

    let id = file_name
        .strip_suffix(".html")
        .unwrap_or(file_name)
        .to_string();

    Ok(BookVolume {
        id,
        title: vol_name,
        url: url.to_string(),
        volume_number: Some(volume_number),
        chapter_number,
        start_page: capture_int(&RE_START_PAGE, text),
        max_page: capture_int(&RE_MAX_PAGE, text),
        book_number: capture_int(&RE_BOOK_NUM, text),
        file_sequence: Some(file_sequence),
    })
}
