//! Item extraction from listing HTML

use super::join_text_nodes;
use crate::models::Item;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;

/// One joke body on a listing page
const BLOCK_SELECTOR: &str = "div.anekdot-text";

/// Attributes checked for an id, in order
const ID_ATTRS: [&str; 2] = ["data-id", "id"];

fn trailing_digits() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\D*$").ok()).as_ref()
}

fn permalink_id() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/([^/?#]+)/(\d+)/?(?:[?#].*)?$").ok())
        .as_ref()
}

/// Extract every well-formed item from a listing page of `category`.
///
/// Duplicate ids on the same page keep their first occurrence. Links of the
/// form `/{category}/{n}/` are pagination and never serve as ids.
pub fn extract_items(content: &str, category: &str) -> Vec<Item> {
    let document = Html::parse_document(content);
    let (Ok(block_sel), Ok(p_sel), Ok(link_sel)) = (
        Selector::parse(BLOCK_SELECTOR),
        Selector::parse("p"),
        Selector::parse("a[href]"),
    ) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for block in document.select(&block_sel) {
        let Some(text) = block
            .select(&p_sel)
            .next()
            .map(|p| join_text_nodes(p.text()))
            .filter(|t| !t.is_empty())
        else {
            continue;
        };

        let Some(id) = item_id(block, &block_sel, &link_sel, category) else {
            continue;
        };

        if seen.insert(id.clone()) {
            items.push(Item { id, text });
        }
    }

    items
}

/// Resolve the stable id of a block from its own attributes, its parent's
/// attributes, or a numeric permalink next to it.
///
/// The permalink is only trusted when the parent wraps this block alone;
/// a shared container cannot tell which link belongs to which joke.
fn item_id(
    block: ElementRef<'_>,
    block_sel: &Selector,
    link_sel: &Selector,
    category: &str,
) -> Option<String> {
    if let Some(id) = attr_id(block) {
        return Some(id);
    }

    let parent = block.parent().and_then(ElementRef::wrap)?;
    if let Some(id) = attr_id(parent) {
        return Some(id);
    }

    if parent.select(block_sel).count() != 1 {
        return None;
    }

    parent
        .select(link_sel)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| permalink(href, category))
}

/// Numeric id of an item link; pagination links of `category` yield nothing
fn permalink(href: &str, category: &str) -> Option<String> {
    let caps = permalink_id()?.captures(href)?;
    let segment = caps.get(1)?.as_str();
    if segment == category {
        return None;
    }
    caps.get(2).map(|m| m.as_str().to_string())
}

fn attr_id(element: ElementRef<'_>) -> Option<String> {
    ID_ATTRS
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(normalize_id)
}

/// `anekdot-123` and `123` name the same item
pub fn normalize_id(raw: &str) -> String {
    trailing_digits()
        .and_then(|re| re.captures(raw))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| raw.to_string())
}
