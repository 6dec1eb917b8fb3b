//! Extracts translation keys invoked through the translation function.

use std::collections::BTreeSet;

use tree_sitter::{
    Language,
    Node,
};

use super::nodes::{
    closest_ancestor,
    node_text,
    parse,
    string_literal_value,
    walk_preorder,
};
use super::scope::{
    ScopeInfo,
    Scopes,
};
use super::types::{
    AnalyzerError,
    DEFAULT_TRANS_FN,
    KEYED_METHODS,
    TRANSLATION_HOOKS,
    TransFnBinding,
};

/// Extracts the fully qualified keys looked up via the translation function.
///
/// Only real call expressions count: `t("a.b")` inside a string literal or a
/// comment is ignored. Keys called through a function bound with
/// `useTranslations("Ns")` / `getTranslations("Ns")` are prefixed with `Ns`.
///
/// # Errors
/// Returns `AnalyzerError` if the grammar cannot be loaded or parsing fails.
pub fn extract_used_keys(
    source: &str,
    language: &Language,
    key_separator: &str,
) -> Result<BTreeSet<String>, AnalyzerError> {
    let tree = parse(source, language)?;
    let source_bytes = source.as_bytes();
    let root_node = tree.root_node();

    let mut scopes = Scopes::new();
    scopes.push_scope(ScopeInfo::new(root_node, TransFnBinding::new(DEFAULT_TRANS_FN)));

    let mut keys = BTreeSet::new();

    walk_preorder(root_node, |node| match node.kind() {
        "variable_declarator" => {
            let Some(binding) = parse_hook_binding(node, source_bytes) else {
                return;
            };
            scopes.leave_out_of_scope(&binding.trans_fn_name, node);
            let scope_node = closest_ancestor(node, &["statement_block"]).unwrap_or(root_node);
            scopes.push_scope(ScopeInfo::new(scope_node, binding));
        }
        "call_expression" => {
            let Some((trans_fn_name, key)) = parse_trans_fn_call(node, source_bytes) else {
                return;
            };
            if !scopes.has_scope(&trans_fn_name) {
                return;
            }
            scopes.leave_out_of_scope(&trans_fn_name, node);
            if let Some(scope_info) = scopes.current_scope(&trans_fn_name) {
                keys.insert(scope_info.binding.qualify(&key, key_separator));
            }
        }
        _ => {}
    });

    Ok(keys)
}

/// Parses `const t = useTranslations("Ns")` or `const t = await getTranslations(...)`.
fn parse_hook_binding(declarator: Node<'_>, source_bytes: &[u8]) -> Option<TransFnBinding> {
    let name_node = declarator.child_by_field_name("name")?;
    if name_node.kind() != "identifier" {
        return None;
    }
    let mut value = declarator.child_by_field_name("value")?;
    if value.kind() == "await_expression" {
        let mut cursor = value.walk();
        value = value.named_children(&mut cursor).find(|c| c.kind() == "call_expression")?;
    }
    if value.kind() != "call_expression" {
        return None;
    }

    let hook_name = node_text(value.child_by_field_name("function")?, source_bytes)?;
    if !TRANSLATION_HOOKS.contains(&hook_name.as_str()) {
        return None;
    }

    let binding = TransFnBinding::new(node_text(name_node, source_bytes)?);
    let namespace = value
        .child_by_field_name("arguments")
        .and_then(|args| hook_namespace_argument(args, source_bytes));

    Some(match namespace {
        Some(ns) if !ns.is_empty() => binding.with_namespace(ns),
        _ => binding,
    })
}

/// Namespace passed to a hook: `("Ns")` or `({ namespace: "Ns", locale })`.
fn hook_namespace_argument(args: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    let mut cursor = args.walk();
    let first = args.named_children(&mut cursor).next()?;

    if let Some(value) = string_literal_value(first, source_bytes) {
        return Some(value);
    }
    if first.kind() != "object" {
        return None;
    }

    let mut pair_cursor = first.walk();
    first.named_children(&mut pair_cursor).find_map(|pair| {
        if pair.kind() != "pair" {
            return None;
        }
        let key = pair.child_by_field_name("key")?;
        let key_text = node_text(key, source_bytes)?;
        if key_text.trim_matches(|c| c == '"' || c == '\'') != "namespace" {
            return None;
        }
        string_literal_value(pair.child_by_field_name("value")?, source_bytes)
    })
}

/// Parses `t("key")` / `t.rich("key", ...)`, returning the function name and raw key.
fn parse_trans_fn_call(call: Node<'_>, source_bytes: &[u8]) -> Option<(String, String)> {
    let function = call.child_by_field_name("function")?;
    let trans_fn_name = match function.kind() {
        "identifier" => node_text(function, source_bytes)?,
        "member_expression" => {
            let object = function.child_by_field_name("object")?;
            let property = node_text(function.child_by_field_name("property")?, source_bytes)?;
            if object.kind() != "identifier" || !KEYED_METHODS.contains(&property.as_str()) {
                return None;
            }
            node_text(object, source_bytes)?
        }
        _ => return None,
    };

    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let first = args.named_children(&mut cursor).next()?;
    let key = string_literal_value(first, source_bytes)?;
    if key.is_empty() {
        return None;
    }

    Some((trans_fn_name, key))
}
