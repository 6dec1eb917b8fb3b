//! Eligible file discovery.

use std::collections::HashSet;
use std::path::{
    Path,
    PathBuf,
};

use futures::{
    StreamExt,
    stream,
};
use ignore::{
    DirEntry,
    WalkBuilder,
};

use crate::config::SourceMatcher;
use crate::syntax::{
    ProgrammingLanguage,
    is_eligible,
};

/// Build output, dependency and version-control directories, never descended into.
pub const SKIPPED_DIRECTORIES: &[&str] =
    &["node_modules", ".next", ".git", "dist", "build", "out", "coverage"];

/// 同時に読み込むファイル数の上限
const MAX_CONCURRENT_READS: usize = 16;

/// A source file that still contains literal user-facing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleFile {
    pub path: PathBuf,
    pub language: ProgrammingLanguage,
}

/// Finds the eligible files under every source directory.
///
/// Candidates come from [`candidate_files`]; each is read with `tokio::fs` and
/// kept if it still has literal UI text. Unreadable or unparsable files are
/// logged and skipped. The result keeps traversal order.
pub async fn discover_eligible_files(
    matcher: &SourceMatcher,
    source_dirs: &[PathBuf],
) -> Vec<EligibleFile> {
    stream::iter(candidate_files(matcher, source_dirs))
        .map(classify)
        .buffered(MAX_CONCURRENT_READS)
        .filter_map(|file| async move { file })
        .collect()
        .await
}

/// Lazily walks every source directory and yields matching source paths.
///
/// Directories are resolved against the matcher's project root; missing ones
/// are skipped. Files reachable from several source directories are yielded
/// once. Order follows directory traversal and is not stable across platforms.
pub fn candidate_files(
    matcher: &SourceMatcher,
    source_dirs: &[PathBuf],
) -> impl Iterator<Item = PathBuf> {
    let root = matcher.project_root();
    let mut seen = HashSet::new();

    source_dirs
        .iter()
        .map(move |dir| root.join(dir))
        .filter(|dir| {
            let exists = dir.is_dir();
            if !exists {
                tracing::debug!(dir = %dir.display(), "Source directory not found, skipping");
            }
            exists
        })
        .flat_map(walk_source_dir)
        .filter(move |path| matcher.is_source_file(path))
        .filter(move |path| seen.insert(path.clone()))
}

/// ファイルを走査する（依存・ビルド成果物のディレクトリは除外）
fn walk_source_dir(dir: PathBuf) -> impl Iterator<Item = PathBuf> {
    WalkBuilder::new(dir)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .follow_links(false)
        .filter_entry(|entry| !is_skipped_directory(entry))
        .build()
        .filter_map(|result| match result {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!(?err, "Failed to read directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(DirEntry::into_path)
}

/// `SKIPPED_DIRECTORIES` に含まれるディレクトリか（走査の起点は除く）
fn is_skipped_directory(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_some_and(|ft| ft.is_dir())
        && entry.file_name().to_str().is_some_and(|name| SKIPPED_DIRECTORIES.contains(&name))
}

/// Reads the file and applies the markup heuristic.
async fn classify(path: PathBuf) -> Option<EligibleFile> {
    let language = ProgrammingLanguage::from_path(&path)?;
    let source = read_source(&path).await?;

    match is_eligible(&source, language) {
        Ok(true) => {
            tracing::debug!(path = %path.display(), "Eligible file");
            Some(EligibleFile { path, language })
        }
        Ok(false) => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), "Failed to analyze file: {e}");
            None
        }
    }
}

/// ファイル内容を読み込む（失敗は警告のみ）
async fn read_source(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(source) => Some(source),
        Err(e) => {
            tracing::warn!("Failed to read file {:?}: {}", path, e);
            None
        }
    }
}
