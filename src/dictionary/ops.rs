//! Tree algorithms over [`Dictionary`]: diff, merge and flat-path conversion.

use super::{
    Dictionary,
    Node,
    TreeError,
};

/// Returns the part of `reference` that is absent from `target`.
///
/// A key missing from `target` carries its entire reference subtree; the walk
/// only descends where both sides have a namespace at the same path. The
/// result is empty iff every leaf path of `reference` exists in `target`.
#[must_use]
pub fn diff_missing(reference: &Dictionary, target: &Dictionary) -> Dictionary {
    let mut missing = Dictionary::new();

    for (key, reference_node) in reference.iter() {
        match (reference_node, target.get(key)) {
            (Node::Branch(reference_child), Some(Node::Branch(target_child))) => {
                let child_missing = diff_missing(reference_child, target_child);
                if !child_missing.is_empty() {
                    missing.insert(key.clone(), Node::Branch(child_missing));
                }
            }
            (Node::Leaf(_), Some(Node::Leaf(_))) => {}
            // absent, or a leaf where the reference has a namespace (or vice versa)
            _ => {
                missing.insert(key.clone(), reference_node.clone());
            }
        }
    }

    missing
}

/// Part of `source` that can be merged into `target` without replacing anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Additions {
    /// Paths of `source` absent from `target`, with their subtrees.
    pub missing: Dictionary,
    /// Dotted paths where one side has a string and the other a namespace.
    pub conflicts: Vec<String>,
}

/// Like [`diff_missing`], but a leaf/namespace mismatch is reported as a
/// conflict instead of being treated as missing.
///
/// Merging `missing` into `target` therefore only ever adds paths.
#[must_use]
pub fn diff_additions(source: &Dictionary, target: &Dictionary, separator: &str) -> Additions {
    let mut conflicts = Vec::new();
    let missing = additions_into(source, target, separator, None, &mut conflicts);
    Additions { missing, conflicts }
}

/// Recursive worker for [`diff_additions`].
fn additions_into(
    source: &Dictionary,
    target: &Dictionary,
    separator: &str,
    prefix: Option<&str>,
    conflicts: &mut Vec<String>,
) -> Dictionary {
    let mut missing = Dictionary::new();

    for (key, source_node) in source.iter() {
        let path = prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
        match (source_node, target.get(key)) {
            (_, None) => {
                missing.insert(key.clone(), source_node.clone());
            }
            (Node::Branch(source_child), Some(Node::Branch(target_child))) => {
                let child = additions_into(source_child, target_child, separator, Some(&path), conflicts);
                if !child.is_empty() {
                    missing.insert(key.clone(), Node::Branch(child));
                }
            }
            (Node::Leaf(_), Some(Node::Leaf(_))) => {}
            (Node::Leaf(_), Some(Node::Branch(_))) | (Node::Branch(_), Some(Node::Leaf(_))) => {
                conflicts.push(path);
            }
        }
    }

    missing
}

/// Overlays `source` onto `target` in place.
///
/// Leaves from `source` win; namespaces present on both sides are merged key
/// by key. Keys only present in `target` are kept untouched.
pub fn deep_merge(target: &mut Dictionary, source: &Dictionary) {
    for (key, source_node) in source.iter() {
        match (target.entries.get_mut(key), source_node) {
            (Some(Node::Branch(target_child)), Node::Branch(source_child)) => {
                deep_merge(target_child, source_child);
            }
            _ => {
                target.entries.insert(key.clone(), source_node.clone());
            }
        }
    }
}

/// Flattens a dictionary into `(dotted path, text)` pairs in tree order.
///
/// Empty namespaces carry no leaves and therefore produce no entries.
#[must_use]
pub fn flatten(dict: &Dictionary, separator: &str) -> Vec<(String, String)> {
    let mut result = Vec::new();
    flatten_into(dict, separator, None, &mut result);
    result
}

/// Recursive worker for [`flatten`].
fn flatten_into(
    dict: &Dictionary,
    separator: &str,
    prefix: Option<&str>,
    result: &mut Vec<(String, String)>,
) {
    for (key, node) in dict.iter() {
        let path = prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
        match node {
            Node::Leaf(text) => result.push((path, text.clone())),
            Node::Branch(child) => flatten_into(child, separator, Some(&path), result),
        }
    }
}

/// Rebuilds a nested dictionary from `(dotted path, text)` pairs.
///
/// Later entries overwrite earlier ones with the same path.
///
/// # Errors
/// - [`TreeError::EmptySegment`] if a key contains an empty segment
/// - [`TreeError::PathConflict`] if one key is both a leaf and a namespace
pub fn unflatten<I, K, V>(entries: I, separator: &str) -> Result<Dictionary, TreeError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut root = Dictionary::new();

    for (key, value) in entries {
        let key = key.as_ref();
        let segments: Vec<&str> = key.split(separator).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(TreeError::EmptySegment { key: key.to_string() });
        }
        let Some((leaf, parents)) = segments.split_last() else {
            return Err(TreeError::EmptySegment { key: key.to_string() });
        };

        let mut current = &mut root;
        let mut walked = String::new();
        for segment in parents {
            if !walked.is_empty() {
                walked.push_str(separator);
            }
            walked.push_str(segment);

            let node = current
                .entries
                .entry((*segment).to_string())
                .or_insert_with(|| Node::Branch(Dictionary::new()));
            current = match node {
                Node::Branch(child) => child,
                Node::Leaf(_) => return Err(TreeError::PathConflict { path: walked }),
            };
        }

        if let Some(Node::Branch(_)) = current.get(leaf) {
            return Err(TreeError::PathConflict { path: key.to_string() });
        }
        current.insert_leaf(*leaf, value);
    }

    Ok(root)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::matchers::is_empty as empty;
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::{
        Value,
        json,
    };

    use super::*;

    fn dict(value: &Value) -> Dictionary {
        Dictionary::from_json(value).unwrap()
    }

    #[rstest]
    #[case::identical(json!({"a": "A"}), json!({"a": "x"}), json!({}))]
    #[case::missing_leaf(json!({"a": "A", "b": "B"}), json!({"a": "x"}), json!({"b": "B"}))]
    #[case::missing_branch_carries_whole_subtree(
        json!({"ns": {"a": "A", "deep": {"b": "B"}}}),
        json!({}),
        json!({"ns": {"a": "A", "deep": {"b": "B"}}})
    )]
    #[case::partial_branch(
        json!({"ns": {"a": "A", "b": "B"}}),
        json!({"ns": {"a": "x"}}),
        json!({"ns": {"b": "B"}})
    )]
    #[case::leaf_where_namespace_expected(
        json!({"ns": {"a": "A"}}),
        json!({"ns": "flat"}),
        json!({"ns": {"a": "A"}})
    )]
    #[case::target_extra_keys_ignored(json!({"a": "A"}), json!({"a": "x", "z": "Z"}), json!({}))]
    fn test_diff_missing(#[case] reference: Value, #[case] target: Value, #[case] expected: Value) {
        let missing = diff_missing(&dict(&reference), &dict(&target));

        assert_that!(missing, eq(&dict(&expected)));
    }

    #[rstest]
    fn diff_missing_is_empty_for_superset() {
        let reference = dict(&json!({"a": {"b": "B"}, "c": "C"}));
        let target = dict(&json!({"a": {"b": "x", "extra": "y"}, "c": "z", "d": "w"}));

        assert_that!(diff_missing(&reference, &target).is_empty(), eq(true));
    }

    #[rstest]
    fn diff_additions_keeps_existing_leaf_where_namespace_is_proposed() {
        let new_keys = dict(&json!({"Home": {"title": "Welcome"}, "nav": {"a": "A", "b": "B"}}));
        let existing = dict(&json!({"Home": "Home page", "nav": {"a": "x", "b": {"deep": "D"}}}));

        let additions = diff_additions(&new_keys, &existing, ".");

        assert_that!(additions.missing.is_empty(), eq(true));
        assert_that!(additions.conflicts, elements_are![eq("Home"), eq("nav.b")]);
    }

    #[rstest]
    fn diff_additions_matches_diff_missing_without_conflicts() {
        let reference = dict(&json!({"a": "A", "ns": {"b": "B", "c": "C"}, "new": {"d": "D"}}));
        let target = dict(&json!({"a": "x", "ns": {"b": "y"}}));

        let additions = diff_additions(&reference, &target, ".");

        assert_that!(additions.missing, eq(&diff_missing(&reference, &target)));
        assert_that!(additions.conflicts, empty());
    }

    #[rstest]
    fn merging_additions_never_replaces_entries() {
        let mut target = dict(&json!({"Home": "Home page", "ns": {"a": "x"}}));
        let source = dict(&json!({"Home": {"title": "T"}, "ns": {"a": "A", "b": "B"}}));

        let additions = diff_additions(&source, &target, ".");
        deep_merge(&mut target, &additions.missing);

        assert_that!(target, eq(&dict(&json!({"Home": "Home page", "ns": {"a": "x", "b": "B"}}))));
    }

    #[rstest]
    fn deep_merge_is_right_biased() {
        let mut target = dict(&json!({"a": "1", "b": "2"}));

        deep_merge(&mut target, &dict(&json!({"b": "3", "c": "4"})));

        assert_that!(target, eq(&dict(&json!({"a": "1", "b": "3", "c": "4"}))));
    }

    #[rstest]
    fn deep_merge_merges_namespaces_key_by_key() {
        let mut target = dict(&json!({"ns": {"keep": "K", "over": "old"}}));

        deep_merge(&mut target, &dict(&json!({"ns": {"over": "new", "add": "A"}})));

        assert_that!(
            target,
            eq(&dict(&json!({"ns": {"keep": "K", "over": "new", "add": "A"}})))
        );
    }

    #[rstest]
    fn deep_merge_is_idempotent() {
        let x = dict(&json!({"a": {"b": "1"}, "c": "2"}));
        let y = dict(&json!({"a": {"d": "3"}, "c": "4"}));

        let mut merged = x.clone();
        deep_merge(&mut merged, &y);
        let mut again = x;
        deep_merge(&mut again, &merged);

        assert_that!(again, eq(&merged));
    }

    #[rstest]
    fn flatten_nested() {
        let tree =
            dict(&json!({"common": {"hello": "Hello", "nested": {"deep": "Deep"}}, "top": "T"}));

        let flat = flatten(&tree, ".");

        assert_that!(
            flat,
            elements_are![
                eq(&("common.hello".to_string(), "Hello".to_string())),
                eq(&("common.nested.deep".to_string(), "Deep".to_string())),
                eq(&("top".to_string(), "T".to_string()))
            ]
        );
    }

    #[rstest]
    #[case::flat(json!({"a": "A", "b": "B"}))]
    #[case::nested(json!({"a": {"b": {"c": "C"}, "d": "D"}, "e": "E"}))]
    #[case::placeholders(json!({"greet": "Hello {name}", "ns": {"count": "{count} items"}}))]
    fn flatten_unflatten_round_trip(#[case] value: Value) {
        let tree = dict(&value);

        let rebuilt = unflatten(flatten(&tree, "."), ".").unwrap();

        assert_that!(rebuilt, eq(&tree));
    }

    #[rstest]
    fn unflatten_custom_separator() {
        let rebuilt = unflatten([("a:b", "x"), ("a:c", "y")], ":").unwrap();

        assert_that!(rebuilt, eq(&dict(&json!({"a": {"b": "x", "c": "y"}}))));
    }

    #[rstest]
    #[case::leaf_then_branch(vec![("a", "x"), ("a.b", "y")], "a")]
    #[case::branch_then_leaf(vec![("a.b", "y"), ("a", "x")], "a")]
    fn unflatten_rejects_conflicts(#[case] entries: Vec<(&str, &str)>, #[case] path: &str) {
        let result = unflatten(entries, ".");

        assert_that!(result, err(eq(&TreeError::PathConflict { path: path.to_string() })));
    }

    #[rstest]
    fn unflatten_rejects_empty_segments() {
        let result = unflatten([("a..b", "x")], ".");

        assert_that!(result, err(eq(&TreeError::EmptySegment { key: "a..b".to_string() })));
    }
}
