//! Reduce a catalog listing page to its headings and links, in document order.

use scraper::{ElementRef, Html, Node};

use crate::document::{collapse_whitespace, strip_href};

/// One thing the catalog walker reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingItem {
    /// A category heading (h1–h6)
    Heading(String),
    Link(CatalogLink),
}

/// An anchor plus whatever text trails it on the same line.
///
/// Real listing markup:
///   <h3>經部</h3>
///   <a href="html/A001menu.html">周易注疏</a>　十三卷　宋刊本<br>
///   <a href="shi_list.html">史部目錄</a><br>
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogLink {
    pub href: String,
    pub title: String,
    pub description: Option<String>,
}

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Elements that end an entry's trailing description.
const ENTRY_BREAKS: &[&str] = &[
    "a", "br", "hr", "p", "div", "li", "ul", "ol", "dl", "dt", "dd", "table", "tr", "td",
    "h1", "h2", "h3", "h4", "h5", "h6",
];

pub fn parse_listing(html: &str) -> Vec<ListingItem> {
    let document = Html::parse_document(html);
    let mut items = Vec::new();

    for node in document.root_element().descendants() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        let name = el.value().name();

        if HEADINGS.contains(&name) {
            let text = element_text(el);
            if !text.is_empty() {
                items.push(ListingItem::Heading(text));
            }
        } else if name == "a" {
            if let Some(link) = catalog_link(el) {
                items.push(ListingItem::Link(link));
            }
        }
    }

    items
}

fn catalog_link(anchor: ElementRef) -> Option<CatalogLink> {
    let href = anchor.value().attr("href")?.trim();
    let lower = href.to_ascii_lowercase();
    if strip_href(href).is_empty()
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
    {
        return None;
    }

    let description = trailing_text(anchor);
    Some(CatalogLink {
        href: href.to_string(),
        title: element_text(anchor),
        description: (!description.is_empty()).then_some(description),
    })
}

/// Text of the siblings after `anchor`, up to the next entry break.
fn trailing_text(anchor: ElementRef) -> String {
    let mut parts: Vec<String> = Vec::new();

    for sibling in anchor.next_siblings() {
        match sibling.value() {
            Node::Text(text) => {
                let text: &str = text;
                parts.push(text.to_owned());
            }
            Node::Element(el) => {
                if ENTRY_BREAKS.contains(&el.name()) {
                    break;
                }
                let Some(el_ref) = ElementRef::wrap(sibling) else {
                    continue;
                };
                // <span><a>…</a></span> starts the next entry
                if contains_anchor(el_ref) {
                    break;
                }
                parts.push(el_ref.text().collect());
            }
            _ => {}
        }
    }

    if parts.iter().all(|p| p.trim().is_empty()) {
        return following_cells(anchor);
    }
    collapse_whitespace(&parts.concat())
}

/// Table layout: `<td><a>title</a></td><td>十卷 宋刊本</td>`. When the anchor
/// is alone in its cell, the description is the text of the following cells
/// of the same row, up to a cell holding another anchor.
fn following_cells(anchor: ElementRef) -> String {
    let Some(cell) = anchor.parent().and_then(ElementRef::wrap) else {
        return String::new();
    };
    if !matches!(cell.value().name(), "td" | "th") || element_text(cell) != element_text(anchor) {
        return String::new();
    }

    let mut parts: Vec<String> = Vec::new();
    for sibling in cell.next_siblings().filter_map(ElementRef::wrap) {
        if !matches!(sibling.value().name(), "td" | "th") || contains_anchor(sibling) {
            break;
        }
        parts.push(element_text(sibling));
    }
    collapse_whitespace(&parts.join(" "))
}

fn contains_anchor(el: ElementRef) -> bool {
    el.descendants()
        .filter_map(ElementRef::wrap)
        .any(|d| d.value().name() == "a")
}

fn element_text(el: ElementRef) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}
