//! Locale dictionary synchronization.
//!
//! Two passes exist:
//! - [`sync_new_keys`] merges keys confirmed by refactoring into every locale
//!   as original-language text.
//! - [`sync_from_reference`] translates what each target locale is missing
//!   relative to the reference locale and merges it in.
//!
//! Both are additive: an existing entry is never overwritten. A key that needs
//! a namespace where a locale has a string (or the reverse) is left alone and
//! reported in [`LocaleResult::conflicts`].

use std::collections::BTreeMap;
use std::fmt;

use super::store::LocaleStore;
use crate::ai::CompletionClient;
use crate::concurrency::run_bounded;
use crate::config::{
    Settings,
    TranslationMode,
};
use crate::dictionary::{
    Additions,
    Dictionary,
    deep_merge,
    diff_additions,
};

/// Subtree added to each locale by [`sync_new_keys`], keyed by locale.
pub type AddedKeys = BTreeMap<String, Dictionary>;

/// What happened to one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleStatus {
    /// The file was rewritten with `added` new leaves, `fallbacks` of which kept
    /// the original-language text because translation failed.
    Updated { added: usize, fallbacks: usize },
    /// Nothing was missing.
    UpToDate,
    /// Dry run: `missing` leaves would be added.
    Planned { missing: usize },
    Skipped { reason: String },
    Failed { reason: String },
}

impl fmt::Display for LocaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Updated { added, fallbacks: 0 } => write!(f, "updated ({added} keys)"),
            Self::Updated { added, fallbacks } => {
                write!(f, "updated ({added} keys, {fallbacks} left in original language)")
            }
            Self::UpToDate => f.write_str("up to date"),
            Self::Planned { missing } => write!(f, "{missing} keys missing"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleResult {
    pub locale: String,
    pub status: LocaleStatus,
    /// Keys not merged because the locale already holds the other shape at that path.
    pub conflicts: Vec<String>,
}

impl LocaleResult {
    /// Builds a result for `locale`.
    fn new(locale: &str, status: LocaleStatus) -> Self {
        Self { locale: locale.to_string(), status, conflicts: Vec::new() }
    }

    /// Attaches the keys that were left alone.
    fn with_conflicts(mut self, conflicts: Vec<String>) -> Self {
        self.conflicts = conflicts;
        self
    }
}

/// Which keys a translation pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncScope {
    /// Everything the reference has and the target lacks, plus recently added keys.
    Reference,
    /// Only the keys [`sync_new_keys`] just added.
    NewKeysOnly,
}

/// A locale that needs translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLocale {
    pub locale: String,
    /// Current content of the locale file.
    pub target: Dictionary,
    /// Reference-language subtree to translate and merge.
    pub missing: Dictionary,
    /// Reference keys that clash with the shape of an existing entry.
    pub conflicts: Vec<String>,
}

/// Result of [`plan_sync`]: locales with work, and locales already settled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub pending: Vec<PendingLocale>,
    pub settled: Vec<LocaleResult>,
}

impl SyncPlan {
    /// Total leaves that would be translated.
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.pending.iter().map(|p| p.missing.leaf_count()).sum()
    }

    /// Reports the plan without executing it.
    #[must_use]
    pub fn into_dry_run(self) -> Vec<LocaleResult> {
        let mut results = self.settled;
        results.extend(self.pending.into_iter().map(|pending| {
            LocaleResult::new(&pending.locale, LocaleStatus::Planned {
                missing: pending.missing.leaf_count(),
            })
            .with_conflicts(pending.conflicts)
        }));
        sort_results(&mut results);
        results
    }
}

/// Outcome of [`sync_new_keys`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewKeysReport {
    pub added: AddedKeys,
    pub results: Vec<LocaleResult>,
}

/// Translated subtree plus the number of leaves that fell back to the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub dictionary: Dictionary,
    pub fallbacks: usize,
}

/// Merges `new_keys` (original-language text) into every locale, reference included.
///
/// Only paths a locale lacks are added. A new key whose path collides with an
/// existing entry of the other shape is skipped and listed in the locale's
/// conflicts. In a dry run nothing is written but the report is the same.
pub async fn sync_new_keys(
    store: &LocaleStore,
    new_keys: &Dictionary,
    settings: &Settings,
) -> NewKeysReport {
    let mut report = NewKeysReport::default();
    if new_keys.is_empty() {
        return report;
    }

    for locale in settings.all_locales() {
        let is_reference = locale == settings.reference_locale;
        let mut existing = match store.load(locale).await {
            Ok(Some(dict)) => dict,
            Ok(None) if is_reference || settings.create_missing_locales => Dictionary::new(),
            Ok(None) => {
                report.results.push(LocaleResult::new(locale, missing_file(store, locale)));
                continue;
            }
            Err(e) => {
                tracing::warn!(locale, "Failed to load locale: {e}");
                report
                    .results
                    .push(LocaleResult::new(locale, LocaleStatus::Failed { reason: e.to_string() }));
                continue;
            }
        };

        let Additions { missing: added, conflicts } =
            diff_additions(new_keys, &existing, &settings.key_separator);
        if !conflicts.is_empty() {
            tracing::warn!(locale, ?conflicts, "Keeping existing entries that clash with new keys");
        }

        let count = added.leaf_count();
        let status = if added.is_empty() {
            LocaleStatus::UpToDate
        } else if settings.dry_run {
            LocaleStatus::Planned { missing: count }
        } else {
            deep_merge(&mut existing, &added);
            match store.save(locale, &existing).await {
                Ok(()) => {
                    tracing::info!(locale, keys = count, "Merged new keys");
                    LocaleStatus::Updated { added: count, fallbacks: 0 }
                }
                Err(e) => {
                    tracing::warn!(locale, "Failed to write locale: {e}");
                    LocaleStatus::Failed { reason: e.to_string() }
                }
            }
        };
        if matches!(status, LocaleStatus::Updated { .. } | LocaleStatus::Planned { .. }) {
            report.added.insert(locale.to_string(), added);
        }
        report.results.push(LocaleResult::new(locale, status).with_conflicts(conflicts));
    }

    report
}

/// Works out what every target locale is missing. Reads files, writes nothing.
pub async fn plan_sync(
    store: &LocaleStore,
    reference: &Dictionary,
    settings: &Settings,
    scope: SyncScope,
    recently_added: &AddedKeys,
) -> SyncPlan {
    let mut plan = SyncPlan::default();

    for locale in &settings.additional_locales {
        let target = match store.load(locale).await {
            Ok(Some(dict)) => dict,
            Ok(None) if settings.create_missing_locales => Dictionary::new(),
            Ok(None) => {
                plan.settled.push(LocaleResult::new(locale, missing_file(store, locale)));
                continue;
            }
            Err(e) => {
                tracing::warn!(locale = %locale, "Failed to load locale: {e}");
                plan.settled
                    .push(LocaleResult::new(locale, LocaleStatus::Failed { reason: e.to_string() }));
                continue;
            }
        };

        let (missing, conflicts) = match scope {
            SyncScope::Reference => {
                let Additions { mut missing, conflicts } =
                    diff_additions(reference, &target, &settings.key_separator);
                if let Some(added) = recently_added.get(locale) {
                    deep_merge(&mut missing, added);
                }
                (missing, conflicts)
            }
            SyncScope::NewKeysOnly => {
                (recently_added.get(locale).cloned().unwrap_or_default(), Vec::new())
            }
        };
        if !conflicts.is_empty() {
            tracing::warn!(locale = %locale, ?conflicts, "Reference keys clash with existing entries");
        }

        if missing.is_empty() {
            tracing::debug!(locale = %locale, "Locale is up to date");
            plan.settled
                .push(LocaleResult::new(locale, LocaleStatus::UpToDate).with_conflicts(conflicts));
        } else {
            tracing::debug!(locale = %locale, missing = missing.leaf_count(), "Locale needs translation");
            plan.pending.push(PendingLocale { locale: locale.clone(), target, missing, conflicts });
        }
    }

    plan
}

/// Translates every pending locale and writes it back.
///
/// Locales fan out under the concurrency limit; each locale's file is written
/// only after its own translation completes.
pub async fn apply_plan(
    client: &CompletionClient,
    store: &LocaleStore,
    plan: SyncPlan,
    settings: &Settings,
) -> Vec<LocaleResult> {
    let SyncPlan { pending, settled } = plan;

    let mut results =
        run_bounded(pending, settings.concurrency, settings.concurrency_strategy, |pending| {
            translate_locale(client, store, pending, settings)
        })
        .await;

    results.extend(settled);
    sort_results(&mut results);
    results
}

/// Plans and, unless this is a dry run, applies a translation pass.
pub async fn sync_from_reference(
    client: &CompletionClient,
    store: &LocaleStore,
    reference: &Dictionary,
    settings: &Settings,
    scope: SyncScope,
    recently_added: &AddedKeys,
) -> Vec<LocaleResult> {
    let plan = plan_sync(store, reference, settings, scope, recently_added).await;
    if settings.dry_run {
        return plan.into_dry_run();
    }
    apply_plan(client, store, plan, settings).await
}

/// Translates `missing` into `target_locale`.
///
/// Batch mode sends the whole subtree at once and degrades to per-leaf calls if
/// that fails. A leaf whose translation fails keeps its original text, so the
/// result always has exactly the paths of `missing`.
pub async fn translate_missing(
    client: &CompletionClient,
    missing: &Dictionary,
    target_locale: &str,
    settings: &Settings,
) -> Translation {
    let source_locale = settings.reference_locale.as_str();

    if settings.translation_mode == TranslationMode::Batch {
        match client
            .translate_batch(missing, source_locale, target_locale, &settings.key_separator)
            .await
        {
            Ok(dictionary) => return Translation { dictionary, fallbacks: 0 },
            Err(e) => {
                tracing::warn!(
                    locale = target_locale,
                    "Batch translation failed, translating strings one by one: {e}"
                );
            }
        }
    }

    let results = run_bounded(
        missing.leaves(),
        settings.concurrency,
        settings.concurrency_strategy,
        |(path, text)| async move {
            let translated = client.translate_text(&text, source_locale, target_locale).await;
            (path, text, translated)
        },
    )
    .await;

    let mut dictionary = missing.clone();
    let mut fallbacks = 0;
    for (path, original, translated) in results {
        let text = match translated {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    locale = target_locale,
                    key = %path.join(&settings.key_separator),
                    "Keeping original text: {e}"
                );
                fallbacks += 1;
                original
            }
        };
        dictionary.set_leaf(&path, text);
    }

    Translation { dictionary, fallbacks }
}

/// Translates one locale and writes the merged dictionary.
async fn translate_locale(
    client: &CompletionClient,
    store: &LocaleStore,
    pending: PendingLocale,
    settings: &Settings,
) -> LocaleResult {
    let PendingLocale { locale, mut target, missing, conflicts } = pending;

    let translation = translate_missing(client, &missing, &locale, settings).await;
    deep_merge(&mut target, &translation.dictionary);

    let status = match store.save(&locale, &target).await {
        Ok(()) => {
            tracing::info!(
                locale = %locale,
                keys = translation.dictionary.leaf_count(),
                fallbacks = translation.fallbacks,
                "Locale updated"
            );
            LocaleStatus::Updated {
                added: translation.dictionary.leaf_count(),
                fallbacks: translation.fallbacks,
            }
        }
        Err(e) => {
            tracing::warn!(locale = %locale, "Failed to write locale: {e}");
            LocaleStatus::Failed { reason: e.to_string() }
        }
    };

    LocaleResult::new(&locale, status).with_conflicts(conflicts)
}

/// Status of a target locale without a dictionary file.
fn missing_file(store: &LocaleStore, locale: &str) -> LocaleStatus {
    let path = store.path_for(locale);
    tracing::info!(locale, "Locale file not found, skipping: {:?}", path);
    LocaleStatus::Skipped { reason: format!("{} does not exist", path.display()) }
}

/// Stable report order, independent of completion order.
fn sort_results(results: &mut [LocaleResult]) {
    results.sort_by(|a, b| a.locale.cmp(&b.locale));
}
