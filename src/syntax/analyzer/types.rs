//! Types for the analyzer module

use thiserror::Error;

/// Names of the hooks that hand out a translation function.
pub const TRANSLATION_HOOKS: &[&str] = &["useTranslations", "getTranslations"];

/// Modules whose import marks a file as already internationalized.
pub const TRANSLATION_MODULES: &[&str] = &["next-intl"];

/// Methods on the translation function that still take a key (`t.rich("key")`).
pub const KEYED_METHODS: &[&str] = &["rich", "markup", "raw"];

/// Default translation function name, usable without a visible hook binding.
pub const DEFAULT_TRANS_FN: &str = "t";

/// A translation function bound in source, e.g. `const t = useTranslations("Header")`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransFnBinding {
    /// Variable name of the translation function (e.g., `t`, `tNav`).
    pub trans_fn_name: String,
    /// Namespace passed to the hook; prefixed to every key looked up through it.
    pub namespace: Option<String>,
}

impl TransFnBinding {
    #[must_use]
    pub fn new(trans_fn_name: impl Into<String>) -> Self {
        Self { trans_fn_name: trans_fn_name.into(), namespace: None }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Full dictionary path for a key looked up through this binding.
    #[must_use]
    pub fn qualify(&self, key: &str, key_separator: &str) -> String {
        self.namespace
            .as_ref()
            .map_or_else(|| key.to_string(), |ns| format!("{ns}{key_separator}{key}"))
    }
}

/// Defines errors that may occur during the analysis process
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Error when failing to set the language for the parser
    #[error("Failed to set language for parser: {0}")]
    LanguageSetup(#[from] tree_sitter::LanguageError),
    /// Error when failing to parse source code
    #[error("Failed to parse source code")]
    ParseFailed,
}
