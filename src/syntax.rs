//! Source analysis: which files need refactoring and which keys they use.

pub mod analyzer;
pub mod language;

use std::collections::BTreeSet;

pub use analyzer::eligibility::MarkupScan;
pub use analyzer::types::AnalyzerError;
pub use language::ProgrammingLanguage;

/// Keys actually invoked through the translation function in `source`.
///
/// # Errors
/// Returns `AnalyzerError` if the source cannot be parsed.
pub fn extract_used_keys(
    source: &str,
    language: ProgrammingLanguage,
    key_separator: &str,
) -> Result<BTreeSet<String>, AnalyzerError> {
    analyzer::extractor::extract_used_keys(
        source,
        &language.tree_sitter_language(),
        key_separator,
    )
}

/// Whether a file contains literal markup text and no translation API usage yet.
///
/// # Errors
/// Returns `AnalyzerError` if the source cannot be parsed.
pub fn is_eligible(source: &str, language: ProgrammingLanguage) -> Result<bool, AnalyzerError> {
    analyzer::eligibility::scan_markup(source, &language.tree_sitter_language())
        .map(MarkupScan::is_eligible)
}
