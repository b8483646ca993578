//! Chinese numeral normalization for 卷/册 counts and volume names.

/// Regex character class body covering every character `parse_numeral`
/// understands. Used by the volume and bibliographic patterns.
pub const NUMERAL_CLASS: &str = "〇零一二兩三四五六七八九十百千萬0-9";

/// Single digit character → value 0–9. ASCII digits count too, since
/// catalog text mixes them in (e.g. "卷第12").
fn cn_digit(c: char) -> Option<u32> {
    match c {
        '〇' | '零' | '0' => Some(0),
        '一' | '1' => Some(1),
        '二' | '兩' | '2' => Some(2),
        '三' | '3' => Some(3),
        '四' | '4' => Some(4),
        '五' | '5' => Some(5),
        '六' | '6' => Some(6),
        '七' | '7' => Some(7),
        '八' | '8' => Some(8),
        '九' | '9' => Some(9),
        _ => None,
    }
}

fn cn_unit(c: char) -> Option<u32> {
    match c {
        '十' => Some(10),
        '百' => Some(100),
        '千' => Some(1000),
        '萬' => Some(10_000),
        _ => None,
    }
}

/// Parse a numeral token → integer, 0 when nothing numeric is found.
///
/// Plain ASCII tokens are read as decimal. Otherwise a left-to-right
/// place-value scan: a unit below 萬 multiplies the pending digit (1 when
/// there is none, so a leading 十 is 10) into the current section; 萬
/// closes the section into the total. Digit runs without a unit read
/// positionally ("二〇" → 20). Unknown characters are skipped, so malformed
/// input yields a best-effort partial value.
///
///   十 → 10, 十一 → 11, 一十一 → 11, 一百五十 → 150, 一百零五 → 105,
///   三千二百 → 3200, 一萬二千 → 12000
pub fn parse_numeral(token: &str) -> u32 {
    let token = token.trim();
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        return token.parse().unwrap_or(0);
    }

    let mut total: u32 = 0;
    let mut section: u32 = 0;
    let mut pending: Option<u32> = None;

    for c in token.chars() {
        if let Some(d) = cn_digit(c) {
            pending = Some(pending.unwrap_or(0).saturating_mul(10).saturating_add(d));
        } else if let Some(unit) = cn_unit(c) {
            if unit == 10_000 {
                let group = section.saturating_add(pending.take().unwrap_or(0));
                let group = if group == 0 { 1 } else { group };
                total = total.saturating_add(group.saturating_mul(unit));
                section = 0;
            } else {
                let digit = pending.take().unwrap_or(1);
                section = section.saturating_add(digit.saturating_mul(unit));
            }
        }
    }

    total
        .saturating_add(section)
        .saturating_add(pending.unwrap_or(0))
}

/// `parse_numeral`, substituting `default` when the token has no numeral
/// content (e.g. 不分卷 counts as one volume).
pub fn parse_numeral_or(token: &str, default: u32) -> u32 {
    match parse_numeral(token) {
        0 => default,
        n => n,
    }
}
