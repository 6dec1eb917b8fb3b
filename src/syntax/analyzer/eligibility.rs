//! Heuristic detection of files with untranslated user-facing text.

use tree_sitter::{
    Language,
    Node,
};

use super::nodes::{
    node_text,
    parse,
    string_literal_value,
    walk_preorder,
};
use super::types::{
    AnalyzerError,
    TRANSLATION_HOOKS,
    TRANSLATION_MODULES,
};

/// JSX attributes whose string values are shown to users.
const USER_FACING_ATTRIBUTES: &[&str] =
    &["alt", "title", "placeholder", "aria-label", "label"];

/// What the eligibility walk found in one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkupScan {
    /// JSX text or a user-facing attribute contains alphabetic text.
    pub has_literal_text: bool,
    /// The file already imports or calls the translation API.
    pub uses_translation_api: bool,
}

impl MarkupScan {
    /// Literal markup text present and no translation API referenced yet.
    #[must_use]
    pub const fn is_eligible(self) -> bool {
        self.has_literal_text && !self.uses_translation_api
    }
}

/// Scans a source file for literal markup text and translation API usage.
///
/// # Errors
/// Returns `AnalyzerError` if the grammar cannot be loaded or parsing fails.
pub fn scan_markup(source: &str, language: &Language) -> Result<MarkupScan, AnalyzerError> {
    let tree = parse(source, language)?;
    let source_bytes = source.as_bytes();
    let mut scan = MarkupScan::default();

    walk_preorder(tree.root_node(), |node| match node.kind() {
        "jsx_text" => {
            if node_text(node, source_bytes).is_some_and(|text| has_words(&text)) {
                scan.has_literal_text = true;
            }
        }
        "jsx_attribute" => {
            if user_facing_attribute_text(node, source_bytes).is_some_and(|text| has_words(&text))
            {
                scan.has_literal_text = true;
            }
        }
        "import_statement" => {
            if let Some(module) = node
                .child_by_field_name("source")
                .and_then(|source| string_literal_value(source, source_bytes))
                && is_translation_module(&module)
            {
                scan.uses_translation_api = true;
            }
        }
        "identifier" => {
            if node_text(node, source_bytes)
                .is_some_and(|name| TRANSLATION_HOOKS.contains(&name.as_str()))
            {
                scan.uses_translation_api = true;
            }
        }
        _ => {}
    });

    Ok(scan)
}

/// String value of `alt="..."` and friends.
fn user_facing_attribute_text(attribute: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    let mut cursor = attribute.walk();
    let mut children = attribute.named_children(&mut cursor);
    let name = node_text(children.next()?, source_bytes)?;
    if !USER_FACING_ATTRIBUTES.contains(&name.as_str()) {
        return None;
    }
    string_literal_value(children.next()?, source_bytes)
}

/// `next-intl` itself or any of its entry points (`next-intl/server`).
fn is_translation_module(module: &str) -> bool {
    TRANSLATION_MODULES
        .iter()
        .any(|m| module == *m || module.strip_prefix(m).is_some_and(|rest| rest.starts_with('/')))
}

/// At least one alphabetic character; punctuation and whitespace-only text is not user copy.
fn has_words(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[fixture]
    fn tsx_lang() -> Language {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    }

    #[rstest]
    #[case::heading("export default function A() { return <h1>Welcome</h1>; }", true)]
    #[case::attribute(r#"export const I = () => <input placeholder="Search" />;"#, true)]
    #[case::punctuation_only("export const S = () => <span> - | </span>;", false)]
    #[case::expression_only("export const E = ({ n }) => <span>{n}</span>;", false)]
    #[case::class_names_only(r#"export const D = () => <div className="flex" />;"#, false)]
    #[case::no_markup("export const sum = (a: number, b: number) => a + b;", false)]
    fn test_literal_text(tsx_lang: Language, #[case] code: &str, #[case] expected: bool) {
        let scan = scan_markup(code, &tsx_lang).unwrap();

        assert_that!(scan.has_literal_text, eq(expected));
    }

    #[rstest]
    #[case::hook(
        r#"export default function A() { const t = useTranslations("A"); return <h1>{t("x")} Hi</h1>; }"#
    )]
    #[case::import(r#"import { useTranslations } from "next-intl"; export const B = () => <p>Hi</p>;"#)]
    #[case::server_import(
        r#"import { getTranslations } from 'next-intl/server'; export const C = () => <p>Hi</p>;"#
    )]
    fn test_translation_api_detected(tsx_lang: Language, #[case] code: &str) {
        let scan = scan_markup(code, &tsx_lang).unwrap();

        assert_that!(scan.uses_translation_api, eq(true));
        assert_that!(scan.is_eligible(), eq(false));
    }

    #[rstest]
    fn test_unrelated_import_is_eligible(tsx_lang: Language) {
        let code = r#"
            import Link from "next/link";
            import { intlFormat } from "next-intl-helpers";
            export default function Nav() {
                return <Link href="/about">About us</Link>;
            }
            "#;

        let scan = scan_markup(code, &tsx_lang).unwrap();

        assert_that!(scan, eq(MarkupScan { has_literal_text: true, uses_translation_api: false }));
        assert_that!(scan.is_eligible(), eq(true));
    }
}
