//! Text significance rules.
//!
//! Decides which text nodes carry meaning and what their content becomes once
//! formatting whitespace is dropped. Shared by the tree compiler and by the
//! round-trip check, which compares trees with formatting differences ignored.

use lazy_static::lazy_static;
use regex::Regex;

use crate::validate::{NodeId, NodeKind, TemplateIR};

lazy_static! {
    static ref WHITESPACE_RUN_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Parents whose text keeps its whitespace runs verbatim.
pub const WHITESPACE_PRESERVING_TAGS: &[&str] =
    &["pre", "textarea", "listing", "plaintext", "style", "script"];

pub fn preserves_whitespace(parent_tag: &str) -> bool {
    WHITESPACE_PRESERVING_TAGS
        .iter()
        .any(|tag| tag.eq_ignore_ascii_case(parent_tag))
}

/// True when the text is nothing but whitespace.
pub fn is_insignificant(text: &str) -> bool {
    text.trim().is_empty()
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN_RE.replace_all(text, " ").into_owned()
}

/// Text as it is emitted: raw inside preserving parents, collapsed elsewhere.
pub fn normalize_text(text: &str, parent_tag: &str) -> String {
    if preserves_whitespace(parent_tag) {
        text.to_string()
    } else {
        collapse_whitespace(text)
    }
}

/// Meaningful content of a text node, or `None` for formatting whitespace.
pub fn significant_text(text: &str, parent_tag: &str) -> Option<String> {
    if is_insignificant(text) {
        return None;
    }
    Some(normalize_text(text, parent_tag))
}

/// [`significant_text`] for a node of the template, resolving its parent
/// through the back reference. Text without a parent element is never
/// significant.
pub fn text_node_significant_text(template: &TemplateIR, id: NodeId) -> Option<String> {
    let node = template.node(id);
    let NodeKind::Text { value } = &node.kind else {
        return None;
    };
    let parent_tag = template.node(node.parent?).tag()?;
    significant_text(value, parent_tag)
}
