//! Listing page parsing
//!
//! Turns a category or date listing page into [`Item`](crate::models::Item)s.
//! Malformed markup is expected; blocks that do not yield both an id and
//! text are skipped without error.

mod html;

pub use html::*;

/// Collapse a text node sequence the way the site renders it: one line per
/// non-empty node, surrounding whitespace trimmed.
pub fn join_text_nodes<'a>(nodes: impl Iterator<Item = &'a str>) -> String {
    nodes
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_text_nodes() {
        let nodes = ["  first line ", "\n", "second", "   "];
        assert_eq!(join_text_nodes(nodes.into_iter()), "first line\nsecond");
        assert_eq!(join_text_nodes(std::iter::empty()), "");
    }
}
