//! Sends eligible files to the model and applies the validated rewrites.

use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

use super::discovery::EligibleFile;
use crate::ai::{
    AiError,
    CompletionClient,
    RefactorOutcome,
};
use crate::concurrency::run_bounded;
use crate::config::Settings;
use crate::dictionary::{
    Additions,
    Dictionary,
    TreeError,
    deep_merge,
    diff_additions,
    flatten,
    unflatten,
};
use crate::syntax::{
    AnalyzerError,
    extract_used_keys,
};

/// Why a single file could not be refactored.
#[derive(Error, Debug)]
pub enum RefactorError {
    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("Failed to analyze updated code: {0}")]
    Analyze(#[from] AnalyzerError),

    #[error("Proposed keys conflict: {0}")]
    Keys(#[from] TreeError),
}

/// A file that failed, with the reason kept for the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// A key that a file proposed differently from a file earlier in path order.
///
/// The earlier file's text stays in the aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConflict {
    /// File whose proposal was not merged.
    pub path: PathBuf,
    pub key: String,
}

/// Aggregate result of [`refactor_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefactorReport {
    /// Files rewritten on disk.
    pub updated: Vec<PathBuf>,
    /// Files the model left alone.
    pub unchanged: Vec<PathBuf>,
    pub failed: Vec<FileFailure>,
    /// Newly confirmed keys with their original-language text.
    pub confirmed: Dictionary,
    /// Proposed keys dropped because the updated code never looks them up.
    pub discarded_keys: usize,
    /// Keys that clashed with another file's proposal.
    pub conflicts: Vec<KeyConflict>,
}

impl RefactorReport {
    /// Number of confirmed keys.
    #[must_use]
    pub fn confirmed_count(&self) -> usize {
        self.confirmed.leaf_count()
    }
}

/// Per-file success.
#[derive(Debug)]
enum FileResult {
    /// The model reported nothing to extract.
    Unchanged,
    /// The file was rewritten; `confirmed` holds the keys its new code looks up.
    Updated { confirmed: Dictionary, discarded: usize },
}

/// Refactors every file with at most `settings.concurrency` requests in flight.
///
/// One file's failure never stops the others; it is logged and reported.
/// Only keys that the rewritten code demonstrably looks up are confirmed.
/// Confirmed keys are merged in path order, so the aggregate does not depend
/// on which request finished first.
pub async fn refactor_all(
    client: &CompletionClient,
    files: impl IntoIterator<Item = EligibleFile>,
    settings: &Settings,
) -> RefactorReport {
    let separator = settings.key_separator.as_str();

    let mut results = run_bounded(files, settings.concurrency, settings.concurrency_strategy, |file| {
        async move {
            let result = refactor_file(client, &file, separator).await;
            (file.path, result)
        }
    })
    .await;
    results.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut report = RefactorReport::default();
    for (path, result) in results {
        match result {
            Ok(FileResult::Unchanged) => {
                tracing::debug!(path = %path.display(), "No update needed");
                report.unchanged.push(path);
            }
            Ok(FileResult::Updated { confirmed, discarded }) => {
                tracing::info!(
                    path = %path.display(),
                    keys = confirmed.leaf_count(),
                    "File refactored"
                );
                for key in merge_confirmed(&mut report.confirmed, &confirmed, separator) {
                    tracing::warn!(
                        path = %path.display(),
                        key = %key,
                        "Key already proposed by another file, keeping the earlier text"
                    );
                    report.conflicts.push(KeyConflict { path: path.clone(), key });
                }
                report.discarded_keys += discarded;
                report.updated.push(path);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to refactor file: {e}");
                report.failed.push(FileFailure { path, reason: e.to_string() });
            }
        }
    }

    report
}

/// Adds one file's confirmed keys to the aggregate and returns the keys it
/// could not add: those already present with different text, and those whose
/// path is a string on one side and a namespace on the other.
fn merge_confirmed(aggregate: &mut Dictionary, confirmed: &Dictionary, separator: &str) -> Vec<String> {
    let Additions { missing, mut conflicts } = diff_additions(confirmed, aggregate, separator);
    conflicts.extend(
        flatten(confirmed, separator)
            .into_iter()
            .filter(|(key, text)| {
                let segments: Vec<&str> = key.split(separator).collect();
                aggregate.leaf_at(&segments).is_some_and(|existing| existing != text)
            })
            .map(|(key, _)| key),
    );
    deep_merge(aggregate, &missing);
    conflicts
}

/// Read, ask, filter, write.
async fn refactor_file(
    client: &CompletionClient,
    file: &EligibleFile,
    separator: &str,
) -> Result<FileResult, RefactorError> {
    let source = tokio::fs::read_to_string(&file.path).await.map_err(|e| io_error(&file.path, e))?;

    let (code, translations) = match client.refactor_file(&file.path, &source, separator).await? {
        RefactorOutcome::Unchanged => return Ok(FileResult::Unchanged),
        RefactorOutcome::Updated { code, translations } => (code, translations),
    };

    let used_keys = extract_used_keys(&code, file.language, separator)?;
    let (kept, dropped): (Vec<_>, Vec<_>) = flatten(&translations, separator)
        .into_iter()
        .partition(|(key, _)| used_keys.contains(key));
    if !dropped.is_empty() {
        tracing::debug!(
            path = %file.path.display(),
            dropped = ?dropped.iter().map(|(key, _)| key).collect::<Vec<_>>(),
            "Discarding keys not used by the updated code"
        );
    }
    let confirmed = unflatten(kept, separator)?;

    let mut content = code;
    content.truncate(content.trim_end().len());
    content.push('\n');
    tokio::fs::write(&file.path, content).await.map_err(|e| io_error(&file.path, e))?;

    Ok(FileResult::Updated { confirmed, discarded: dropped.len() })
}

/// Wraps an I/O error with the file it happened on.
fn io_error(path: &Path, source: std::io::Error) -> RefactorError {
    RefactorError::Io { path: path.to_path_buf(), source }
}
