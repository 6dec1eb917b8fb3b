//! End-of-run summary.

use std::fmt;

use super::Command;
use crate::locales::{
    LocaleResult,
    LocaleStatus,
};
use crate::refactor::RefactorReport;

/// Everything a run did, for the user and for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub command: Command,
    pub dry_run: bool,
    /// Eligible files found by discovery.
    pub discovered_files: usize,
    /// `None` when nothing was refactored (translate command or dry run).
    pub refactor: Option<RefactorReport>,
    /// Per-locale result of merging newly confirmed keys.
    pub new_keys: Vec<LocaleResult>,
    /// Leaves the translation stage had to fill.
    pub missing_keys: usize,
    /// Per-locale result of the translation stage.
    pub locales: Vec<LocaleResult>,
}

impl RunSummary {
    #[must_use]
    pub const fn new(command: Command, dry_run: bool) -> Self {
        Self {
            command,
            dry_run,
            discovered_files: 0,
            refactor: None,
            new_keys: Vec::new(),
            missing_keys: 0,
            locales: Vec::new(),
        }
    }

    /// Whether any file or locale failed, or a proposed key clashed with an existing one.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.refactor
            .as_ref()
            .is_some_and(|report| !report.failed.is_empty() || !report.conflicts.is_empty())
            || self.new_keys.iter().chain(&self.locales).any(|result| {
                matches!(result.status, LocaleStatus::Failed { .. }) || !result.conflicts.is_empty()
            })
    }

    /// Locales with the given kind of status in the translation stage.
    fn count_locales(&self, predicate: impl Fn(&LocaleStatus) -> bool) -> usize {
        self.locales.iter().filter(|result| predicate(&result.status)).count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.dry_run { " (dry run)" } else { "" };
        writeln!(f, "Summary of `{}`{mode}", self.command)?;

        if self.command.refactors() {
            match &self.refactor {
                Some(report) => {
                    writeln!(
                        f,
                        "  Files: {} eligible, {} updated, {} unchanged, {} failed",
                        self.discovered_files,
                        report.updated.len(),
                        report.unchanged.len(),
                        report.failed.len()
                    )?;
                    for failure in &report.failed {
                        writeln!(f, "    failed {}: {}", failure.path.display(), failure.reason)?;
                    }
                    for conflict in &report.conflicts {
                        writeln!(
                            f,
                            "    conflicting key {} in {}: kept the earlier file's text",
                            conflict.key,
                            conflict.path.display()
                        )?;
                    }
                    writeln!(
                        f,
                        "  Keys: {} confirmed, {} discarded as unused",
                        report.confirmed_count(),
                        report.discarded_keys
                    )?;
                }
                None => writeln!(f, "  Files: {} eligible", self.discovered_files)?,
            }
            for result in &self.new_keys {
                if let LocaleStatus::Failed { reason } = &result.status {
                    writeln!(f, "    failed to merge new keys into {}: {reason}", result.locale)?;
                }
                write_conflicts(f, result)?;
            }
        }

        writeln!(
            f,
            "  Locales: {} updated, {} up to date, {} skipped, {} failed ({} missing keys)",
            self.count_locales(|s| matches!(s, LocaleStatus::Updated { .. } | LocaleStatus::Planned { .. })),
            self.count_locales(|s| matches!(s, LocaleStatus::UpToDate)),
            self.count_locales(|s| matches!(s, LocaleStatus::Skipped { .. })),
            self.count_locales(|s| matches!(s, LocaleStatus::Failed { .. })),
            self.missing_keys
        )?;
        for result in &self.locales {
            writeln!(f, "    {}: {}", result.locale, result.status)?;
            write_conflicts(f, result)?;
        }
        Ok(())
    }
}

/// Lists keys left alone because the locale holds the other shape there.
fn write_conflicts(f: &mut fmt::Formatter<'_>, result: &LocaleResult) -> fmt::Result {
    if result.conflicts.is_empty() {
        return Ok(());
    }
    writeln!(
        f,
        "    {}: kept existing entries that clash with {}",
        result.locale,
        result.conflicts.join(", ")
    )
}
