//! Source languages the analyzer understands.

use std::path::Path;

/// Supported programming languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgrammingLanguage {
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
}

impl ProgrammingLanguage {
    /// Infers the programming language from file extension.
    #[must_use]
    pub fn from_path(file_path: &Path) -> Option<Self> {
        match file_path.extension().and_then(|ext| ext.to_str()) {
            Some("tsx") => Some(Self::Tsx),
            Some("ts" | "mts" | "cts") => Some(Self::TypeScript),
            Some("jsx") => Some(Self::Jsx),
            Some("js" | "mjs" | "cjs") => Some(Self::JavaScript),
            _ => None,
        }
    }

    /// Grammar used to parse this language.
    ///
    /// The JavaScript grammar already accepts JSX, so `.js` files containing
    /// components parse without a dedicated dialect.
    #[must_use]
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            Self::JavaScript | Self::Jsx => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}
