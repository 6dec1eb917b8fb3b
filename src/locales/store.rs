//! Locale dictionary files: one `<locale>.json` per locale under a root folder.

use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

use crate::dictionary::{
    Dictionary,
    TreeError,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid dictionary in {path:?}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: TreeError,
    },

    #[error("Failed to serialize dictionary: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reads and writes locale dictionaries.
///
/// Each locale file has a single writer per run: the task handling that
/// locale. Two runs against the same folder must not overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleStore {
    /// Folder holding the locale files.
    root: PathBuf,
}

impl LocaleStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn path_for(&self, locale: &str) -> PathBuf {
        self.root.join(format!("{locale}.json"))
    }

    /// Loads a locale dictionary. `Ok(None)` if the file does not exist.
    ///
    /// Comments and trailing commas are tolerated; an empty file is an empty dictionary.
    ///
    /// # Errors
    /// Returns `StoreError` if the file cannot be read or is not a string tree.
    pub async fn load(&self, locale: &str) -> Result<Option<Dictionary>, StoreError> {
        let path = self.path_for(locale);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Locale file not found: {:?}", path);
                return Ok(None);
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let value = match jsonc_parser::parse_to_serde_value(
            &content,
            &jsonc_parser::ParseOptions::default(),
        ) {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(Some(Dictionary::new())),
            Err(e) => return Err(StoreError::Parse { path, message: e.to_string() }),
        };

        Dictionary::from_json(&value)
            .map(Some)
            .map_err(|source| StoreError::Malformed { path, source })
    }

    /// Writes a locale dictionary, pretty-printed with a trailing newline.
    ///
    /// # Errors
    /// Returns `StoreError` if the folder or file cannot be written.
    pub async fn save(&self, locale: &str, dictionary: &Dictionary) -> Result<(), StoreError> {
        let path = self.path_for(locale);
        let content = dictionary.to_pretty_json()?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::Io { path: self.root.clone(), source })?;
        tokio::fs::write(&path, content).await.map_err(|source| StoreError::Io { path, source })
    }
}
