//! Pipeline configuration: settings, credentials and source matching.

/// Config file loader
mod loader;
/// Settings resolution (file + command line)
mod manager;
/// Component file filter
mod matcher;
/// Configuration types and settings
mod types;

pub use loader::{
    CONFIG_FILE_NAME,
    load_from_project,
};
pub use manager::{
    SettingsOverrides,
    resolve_settings,
};
pub use matcher::{
    MatcherError,
    PatternList,
    SourceMatcher,
};
pub use types::{
    ConcurrencyStrategy,
    ConfigError,
    Credentials,
    Settings,
    TranslationMode,
    ValidationError,
};
