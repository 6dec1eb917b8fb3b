use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "includePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// How missing keys are sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TranslationMode {
    /// One call per locale carrying the whole missing subtree.
    #[default]
    Batch,
    /// One call per missing string.
    PerLeaf,
}

/// How outstanding AI calls are scheduled under the concurrency limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ConcurrencyStrategy {
    /// N workers drain a shared queue; a slow item never blocks the others.
    #[default]
    WorkerPool,
    /// Process N items, wait for all of them, then the next N.
    FixedBatches,
}

/// Pipeline settings. Built once at startup and passed by reference from then on.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Locale whose dictionary is authoritative for keys and source text.
    pub reference_locale: String,
    /// Translation targets.
    pub additional_locales: Vec<String>,
    /// Folder (relative to the project root) holding `<locale>.json` files.
    pub locales_folder: PathBuf,

    /// Directories (relative to the project root) scanned for components.
    pub source_dirs: Vec<PathBuf>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,

    pub model: String,
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Upper bound of simultaneously outstanding AI requests.
    pub concurrency: usize,
    pub concurrency_strategy: ConcurrencyStrategy,
    /// Extra attempts after a contract violation.
    pub max_retries: u32,
    /// Deadline for a single AI call.
    pub request_timeout_secs: u64,
    pub max_tokens: u32,
    pub translation_mode: TranslationMode,

    pub key_separator: String,
    /// Start missing target locale files from `{}` instead of skipping them.
    pub create_missing_locales: bool,
    /// Discover and diff only: no AI calls, no writes.
    pub dry_run: bool,
}

impl Settings {
    /// Reference locale followed by the additional locales.
    pub fn all_locales(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.reference_locale.as_str())
            .chain(self.additional_locales.iter().map(String::as_str))
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Inconsistent locale list
    /// - Zero concurrency or timeout
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.reference_locale.trim().is_empty() {
            errors.push(ValidationError::new(
                "referenceLocale",
                "The reference locale cannot be empty. Example: \"en\"",
            ));
        }

        let mut seen = HashSet::new();
        for (index, locale) in self.additional_locales.iter().enumerate() {
            let field = format!("additionalLocales[{index}]");
            if locale.trim().is_empty() {
                errors.push(ValidationError::new(field, "Locale identifiers cannot be empty"));
            } else if *locale == self.reference_locale {
                errors.push(ValidationError::new(
                    field,
                    format!("'{locale}' is the reference locale and cannot also be a target"),
                ));
            } else if !seen.insert(locale.as_str()) {
                errors.push(ValidationError::new(field, format!("Duplicate locale '{locale}'")));
            }
        }

        if self.locales_folder.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "localesFolder",
                "The locales folder cannot be empty. Example: \"messages\"",
            ));
        }

        for (index, pattern) in self.include_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("includePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        for (index, pattern) in self.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.model.trim().is_empty() {
            errors.push(ValidationError::new("model", "The model identifier cannot be empty"));
        }

        if self.endpoint.trim().is_empty() {
            errors.push(ValidationError::new("endpoint", "The endpoint URL cannot be empty"));
        }

        if self.concurrency == 0 {
            errors.push(ValidationError::new("concurrency", "Concurrency must be at least 1"));
        }

        if self.request_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "requestTimeoutSecs",
                "The request timeout must be at least 1 second",
            ));
        }

        if self.key_separator.is_empty() {
            errors.push(ValidationError::new(
                "keySeparator",
                "The separator cannot be empty. Please specify a separator, for example: \".\" (dot)",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reference_locale: "en".to_string(),
            additional_locales: Vec::new(),
            locales_folder: PathBuf::from("messages"),
            source_dirs: vec![
                PathBuf::from("src"),
                PathBuf::from("app"),
                PathBuf::from("components"),
            ],
            include_patterns: vec!["**/*.{js,jsx,ts,tsx}".to_string()],
            exclude_patterns: vec![
                "**/node_modules/**".to_string(),
                "**/*.d.ts".to_string(),
                "**/*.test.*".to_string(),
                "**/*.spec.*".to_string(),
            ],
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            concurrency: 10,
            concurrency_strategy: ConcurrencyStrategy::default(),
            max_retries: 2,
            request_timeout_secs: 120,
            max_tokens: 8192,
            translation_mode: TranslationMode::default(),
            key_separator: ".".to_string(),
            create_missing_locales: false,
            dry_run: false,
        }
    }
}

/// API credential for the completion endpoint.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    /// Returns `None` for an empty or whitespace-only key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Option<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() { None } else { Some(Self { api_key }) }
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("api_key", &"<redacted>").finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[rstest]
    fn validate_valid_settings() {
        let settings = Settings::default();

        assert_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    fn deserialize_partial_settings() {
        let json = r#"{"referenceLocale": "es", "additionalLocales": ["en", "fr"], "translationMode": "perLeaf"}"#;

        let settings: Settings = serde_json::from_str(json).unwrap();

        assert_that!(settings.reference_locale, eq("es"));
        assert_that!(settings.additional_locales, elements_are![eq("en"), eq("fr")]);
        assert_that!(settings.translation_mode, eq(TranslationMode::PerLeaf));
        assert_that!(settings.concurrency, eq(10));
        assert_that!(settings.key_separator, eq("."));
    }

    #[rstest]
    fn deserialize_empty_settings() {
        let settings: Settings = serde_json::from_str("{}").unwrap();

        assert_that!(settings, eq(&Settings::default()));
        assert_that!(settings.include_patterns, elements_are![eq("**/*.{js,jsx,ts,tsx}")]);
        assert_that!(settings.concurrency_strategy, eq(ConcurrencyStrategy::WorkerPool));
    }

    #[rstest]
    fn all_locales_starts_with_reference() {
        let settings = Settings {
            reference_locale: "es".to_string(),
            additional_locales: vec!["en".to_string(), "de".to_string()],
            ..Settings::default()
        };

        let locales: Vec<&str> = settings.all_locales().collect();

        assert_that!(locales, elements_are![eq(&"es"), eq(&"en"), eq(&"de")]);
    }

    #[rstest]
    #[case::empty_reference(
        Settings { reference_locale: String::new(), ..Settings::default() },
        "referenceLocale",
        "cannot be empty"
    )]
    #[case::reference_as_target(
        Settings { additional_locales: vec!["en".to_string()], ..Settings::default() },
        "additionalLocales[0]",
        "reference locale"
    )]
    #[case::duplicate_target(
        Settings {
            additional_locales: vec!["fr".to_string(), "fr".to_string()],
            ..Settings::default()
        },
        "additionalLocales[1]",
        "Duplicate locale"
    )]
    #[case::zero_concurrency(
        Settings { concurrency: 0, ..Settings::default() },
        "concurrency",
        "at least 1"
    )]
    #[case::zero_timeout(
        Settings { request_timeout_secs: 0, ..Settings::default() },
        "requestTimeoutSecs",
        "at least 1 second"
    )]
    #[case::empty_separator(
        Settings { key_separator: String::new(), ..Settings::default() },
        "keySeparator",
        "cannot be empty"
    )]
    #[case::invalid_glob(
        Settings { include_patterns: vec!["**/*.{js,ts".to_string()], ..Settings::default() },
        "includePatterns[0]",
        "Invalid glob pattern"
    )]
    #[case::empty_model(
        Settings { model: " ".to_string(), ..Settings::default() },
        "model",
        "cannot be empty"
    )]
    fn validate_reports_field(
        #[case] settings: Settings,
        #[case] field_path: &str,
        #[case] message: &str,
    ) {
        let result = settings.validate();

        assert_that!(
            result,
            err(elements_are![all![
                field!(ValidationError.field_path, eq(field_path)),
                field!(ValidationError.message, contains_substring(message))
            ]])
        );
    }

    #[rstest]
    fn config_error_validation_errors_format() {
        let settings = Settings {
            key_separator: String::new(),
            concurrency: 0,
            ..Settings::default()
        };

        let errors = settings.validate().unwrap_err();
        let error_message = format!("{}", ConfigError::ValidationErrors(errors));

        assert_that!(error_message, contains_substring("Configuration validation failed"));
        assert_that!(error_message, contains_substring("1. concurrency"));
        assert_that!(error_message, contains_substring("2. keySeparator"));
    }

    #[rstest]
    fn credentials_reject_blank_and_redact() {
        assert_that!(Credentials::new("  ").is_none(), eq(true));

        let credentials = Credentials::new("sk-secret").unwrap();

        assert_that!(credentials.api_key(), eq("sk-secret"));
        assert_that!(format!("{credentials:?}"), not(contains_substring("sk-secret")));
    }
}
