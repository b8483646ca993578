use std::sync::LazyLock;

use catalog_types::EditionType;
use regex::Regex;

use crate::numeral::NUMERAL_CLASS;

// ── Keyword tables ──────────────────────────────────────────────────
//
// Real catalog descriptions look like:
//     十三卷　宋刊本　宋朱熹撰
//     不分卷　明鈔本　存卷一至卷五　有汪氏藏書圖記
//     二十卷　淸刊本　漢鄭玄注　唐賈公彥疏　有校語
//     一卷　拓本　残
//
// Every rule below is applied independently; none excludes another.

/// Dynasty names, in match priority order.
pub const DYNASTIES: &[&str] = &[
    "漢", "魏", "晉", "南北朝", "隋", "唐", "五代", "宋", "遼", "金", "元", "明", "淸", "清",
    "民國",
];

const MANUSCRIPT_MARKERS: &[&str] = &["鈔本", "手稿", "手簡"];
const PRINTED_MARKERS: &[&str] = &["刊本", "活字印本", "石印本"];
const RUBBING_MARKERS: &[&str] = &["拓本"];
const SEAL_MARKERS: &[&str] = &["圖記", "印記"];
const ANNOTATION_MARKERS: &[&str] = &["識語", "题跋", "校語"];

/// Role suffixes, in the order their patterns run:
/// 撰 authored, 輯 compiled, 注 annotated, 疏 sub-commentary, 集 collected.
pub const ROLE_SUFFIXES: &[char] = &['撰', '輯', '注', '疏', '集'];

/// Segments of a description that record provenance rather than the edition.
const COLLECTION_MARKERS: &[&str] = &["藏", "圖記", "印記", "識語", "题跋"];

/// Punctuation and spacing that can precede a personal name.
const NAME_BOUNDARY: &str = r"\s　，。、；：:;,（）()「」『』〔〕［］\[\]〈〉《》・";

// ── Patterns ────────────────────────────────────────────────────────

// {numeral|不分}卷, taken verbatim: "十三卷", "不分卷"
static RE_VOLUME_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?:[{NUMERAL_CLASS}]+|不分)卷")).unwrap()
});

static RE_DYNASTY: LazyLock<Regex> = LazyLock::new(|| Regex::new(&build_dynasty_regex()).unwrap());

// One pattern per role suffix:
//     {boundary}{Name}{role}
// where the boundary is a dynasty name, punctuation/space, or the start of
// the text. Dynasties come first so "宋朱熹撰" yields 朱熹, not 宋朱熹.
static RE_AUTHORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ROLE_SUFFIXES
        .iter()
        .map(|role| Regex::new(&build_author_regex(*role)).unwrap())
        .collect()
});

/// `(?:漢|魏|...|民國)`
pub fn build_dynasty_regex() -> String {
    format!("(?:{})", DYNASTIES.join("|"))
}

fn build_author_regex(role: char) -> String {
    let roles: String = ROLE_SUFFIXES.iter().collect();
    format!(
        "(?:{}|[{NAME_BOUNDARY}]|^)(?P<name>[^{NAME_BOUNDARY}{roles}]{{2,4}}){role}",
        build_dynasty_regex()
    )
}

// ── Classification ──────────────────────────────────────────────────

/// Everything the catalog's free text says about one book.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub volume_count: Option<String>,
    pub is_incomplete: bool,
    pub edition_type: EditionType,
    pub has_seals: bool,
    pub has_annotations: bool,
    pub dynasty: Option<String>,
    pub authors: Vec<String>,
    pub publication_info: String,
    pub collection_info: String,
}

/// Run every rule over a catalog title and its trailing description.
pub fn classify(title: &str, description: &str) -> Classification {
    let (publication_info, collection_info) = split_description(description);
    Classification {
        volume_count: volume_count(title, description),
        is_incomplete: is_incomplete(title, description),
        edition_type: edition_type(description),
        has_seals: has_seals(description),
        has_annotations: has_annotations(description),
        dynasty: dynasty(description),
        authors: authors(description),
        publication_info,
        collection_info,
    }
}

/// First "{numeral}卷" / "不分卷" phrase, description before title.
pub fn volume_count(title: &str, description: &str) -> Option<String> {
    [description, title]
        .iter()
        .find_map(|text| RE_VOLUME_COUNT.find(text))
        .map(|m| m.as_str().to_string())
}

/// 殘 / 零片 in the title, or 残 / 存卷 in the description.
pub fn is_incomplete(title: &str, description: &str) -> bool {
    title.contains('殘')
        || title.contains("零片")
        || description.contains('残')
        || description.contains("存卷")
}

/// Manuscript markers win over printed, printed over rubbing.
pub fn edition_type(description: &str) -> EditionType {
    let has_any = |markers: &[&str]| markers.iter().any(|m| description.contains(m));
    if has_any(MANUSCRIPT_MARKERS) {
        EditionType::Manuscript
    } else if has_any(PRINTED_MARKERS) {
        EditionType::Printed
    } else if has_any(RUBBING_MARKERS) {
        EditionType::Rubbing
    } else {
        EditionType::Unknown
    }
}

pub fn has_seals(description: &str) -> bool {
    SEAL_MARKERS.iter().any(|m| description.contains(m))
}

pub fn has_annotations(description: &str) -> bool {
    ANNOTATION_MARKERS.iter().any(|m| description.contains(m))
}

/// Leftmost dynasty name anywhere in the description.
pub fn dynasty(description: &str) -> Option<String> {
    RE_DYNASTY
        .find(description)
        .map(|m| m.as_str().to_string())
}

/// Names attached to a role suffix, de-duplicated in order of first
/// appearance across the five role passes.
pub fn authors(description: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for re in RE_AUTHORS.iter() {
        for caps in re.captures_iter(description) {
            let Some(name) = caps.name("name") else {
                continue;
            };
            let name = strip_dynasty(name.as_str().trim());
            if !name.is_empty() && !found.iter().any(|n| n == name) {
                found.push(name.to_string());
            }
        }
    }
    found
}

/// "宋朱熹" → "朱熹". A separator followed by a dynasty lets the dynasty
/// slip into the captured name; a bare two-character name is kept whole.
fn strip_dynasty(name: &str) -> &str {
    for d in DYNASTIES {
        if let Some(rest) = name.strip_prefix(d)
            && rest.chars().count() >= 2
        {
            return rest;
        }
    }
    name
}

/// Split a description into (publication, collection) text. Segments are
/// separated by spaces or 。；, provenance segments go to the collection side.
pub fn split_description(description: &str) -> (String, String) {
    let mut publication = Vec::new();
    let mut collection = Vec::new();

    for segment in description
        .split(|c: char| c.is_whitespace() || matches!(c, '。' | '；' | ';'))
        .filter(|s| !s.is_empty())
    {
        if COLLECTION_MARKERS.iter().any(|m| segment.contains(m)) {
            collection.push(segment);
        } else {
            publication.push(segment);
        }
    }

    (publication.join(" "), collection.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── volume count ────────────────────────────────────────────────

    #[test]
    fn test_volume_count_verbatim() {
        assert_eq!(volume_count("周易注疏", "十三卷　宋刊本"), Some("十三卷".to_string()));
        assert_eq!(volume_count("說文", "不分卷　明鈔本"), Some("不分卷".to_string()));
        assert_eq!(volume_count("說文", "存2卷"), Some("2卷".to_string()));
    }

    #[test]
    fn test_volume_count_falls_back_to_title() {
        assert_eq!(volume_count("史記一百三十卷", "宋刊本"), Some("一百三十卷".to_string()));
        assert_eq!(volume_count("史記", "宋刊本"), None);
    }

    // ── completeness ────────────────────────────────────────────────

    #[test]
    fn test_incomplete_markers() {
        assert!(is_incomplete("殘本論語", ""));
        assert!(is_incomplete("敦煌零片", ""));
        assert!(is_incomplete("論語", "残"));
        assert!(is_incomplete("論語", "存卷一至卷五"));
        assert!(!is_incomplete("論語", "十卷　宋刊本"));
    }

    #[test]
    fn test_damaged_without_edition_keywords() {
        let c = classify("論語", "残");
        assert!(c.is_incomplete);
        assert_eq!(c.edition_type, EditionType::Unknown);
    }

    // ── edition type ────────────────────────────────────────────────

    #[test]
    fn test_edition_type_each_kind() {
        assert_eq!(edition_type("明鈔本"), EditionType::Manuscript);
        assert_eq!(edition_type("著者手稿"), EditionType::Manuscript);
        assert_eq!(edition_type("宋刊本"), EditionType::Printed);
        assert_eq!(edition_type("木活字印本"), EditionType::Printed);
        assert_eq!(edition_type("石印本"), EditionType::Printed);
        assert_eq!(edition_type("拓本"), EditionType::Rubbing);
        assert_eq!(edition_type(""), EditionType::Unknown);
    }

    #[test]
    fn test_edition_type_priority() {
        // Manuscript copy of a printed edition is a manuscript
        assert_eq!(edition_type("據宋刊本鈔本"), EditionType::Manuscript);
        assert_eq!(edition_type("刊本及拓本"), EditionType::Printed);
    }

    // ── flags ───────────────────────────────────────────────────────

    #[test]
    fn test_seals_and_annotations() {
        assert!(has_seals("有汪氏藏書圖記"));
        assert!(has_seals("有印記"));
        assert!(!has_seals("宋刊本"));
        assert!(has_annotations("有校語"));
        assert!(has_annotations("羅振玉識語"));
        assert!(has_annotations("有题跋"));
        assert!(!has_annotations("宋刊本"));
    }

    // ── dynasty ─────────────────────────────────────────────────────

    #[test]
    fn test_dynasty_first_match() {
        assert_eq!(dynasty("宋刊本　元修"), Some("宋".to_string()));
        assert_eq!(dynasty("民國石印本"), Some("民國".to_string()));
        assert_eq!(dynasty("淸刊本"), Some("淸".to_string()));
        assert_eq!(dynasty("刊本"), None);
    }

    // ── authors ─────────────────────────────────────────────────────

    #[test]
    fn test_author_after_dynasty() {
        assert_eq!(authors("宋刊本　宋朱熹撰"), vec!["朱熹"]);
    }

    #[test]
    fn test_authors_across_roles_in_pattern_order() {
        // 疏 appears first in the text but 注 runs first
        let found = authors("唐賈公彥疏　漢鄭玄注");
        assert_eq!(found, vec!["鄭玄", "賈公彥"]);
    }

    #[test]
    fn test_authors_deduplicated() {
        let found = authors("宋朱熹撰　宋朱熹注　宋朱熹集");
        assert_eq!(found, vec!["朱熹"]);
    }

    #[test]
    fn test_author_after_separator_loses_dynasty() {
        assert_eq!(strip_dynasty("宋朱熹"), "朱熹");
        assert_eq!(strip_dynasty("元稹"), "元稹");
        assert_eq!(authors("明刊本　漢鄭玄注"), vec!["鄭玄"]);
    }

    #[test]
    fn test_author_in_brackets() {
        assert_eq!(authors("（魏）何晏集解"), vec!["何晏"]);
    }

    #[test]
    fn test_no_author_without_role_suffix() {
        assert!(authors("宋刊本　有圖記").is_empty());
    }

    // ── full record ─────────────────────────────────────────────────

    #[test]
    fn test_classify_printed_song_edition() {
        let c = classify("論語注疏", "二十卷　宋刊本　宋朱熹撰　有汪氏藏書圖記");
        assert_eq!(c.edition_type, EditionType::Printed);
        assert_eq!(c.dynasty.as_deref(), Some("宋"));
        assert_eq!(c.authors, vec!["朱熹"]);
        assert_eq!(c.volume_count.as_deref(), Some("二十卷"));
        assert!(c.has_seals);
        assert!(!c.is_incomplete);
        assert_eq!(c.publication_info, "二十卷 宋刊本 宋朱熹撰");
        assert_eq!(c.collection_info, "有汪氏藏書圖記");
    }
}
