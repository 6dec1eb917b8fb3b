//! Small tree-sitter helpers shared by the analyzers.

use std::string::ToString;

use tree_sitter::{
    Language,
    Node,
    Parser,
    Tree,
};

use super::types::AnalyzerError;

/// Parses `source` with the given grammar.
pub(super) fn parse(source: &str, language: &Language) -> Result<Tree, AnalyzerError> {
    let mut parser = Parser::new();
    parser.set_language(language).map_err(AnalyzerError::LanguageSetup)?;
    parser.parse(source, None).ok_or(AnalyzerError::ParseFailed)
}

/// Extracts text content from a tree-sitter node
pub(super) fn node_text(node: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    node.utf8_text(source_bytes).ok().map(ToString::to_string)
}

/// Value of a plain string literal (`"x"`, `'x'`, or a template without substitutions).
pub(super) fn string_literal_value(node: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    match node.kind() {
        "string" => {
            let text = node.utf8_text(source_bytes).ok()?;
            Some(strip_quotes(text).to_string())
        }
        "template_string" => {
            let mut cursor = node.walk();
            if node.named_children(&mut cursor).any(|c| c.kind() == "template_substitution") {
                return None;
            }
            let text = node.utf8_text(source_bytes).ok()?;
            Some(strip_quotes(text).to_string())
        }
        _ => None,
    }
}

/// Removes one pair of surrounding quote characters.
fn strip_quotes(text: &str) -> &str {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if open == close && matches!(open, '"' | '\'' | '`') => {
            chars.as_str()
        }
        _ => text,
    }
}

/// Finds the closest ancestor node of a given type
pub(super) fn closest_ancestor<'a>(node: Node<'a>, target_types: &[&str]) -> Option<Node<'a>> {
    let mut current_node = node;

    while let Some(parent) = current_node.parent() {
        if target_types.contains(&parent.kind()) {
            return Some(parent);
        }
        current_node = parent;
    }

    None
}

/// Visits every node of the subtree rooted at `root` in source order.
pub(super) fn walk_preorder<'a>(root: Node<'a>, mut visit: impl FnMut(Node<'a>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}
