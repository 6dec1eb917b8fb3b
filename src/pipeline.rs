//! Pipeline driver.
//!
//! `DISCOVER → REFACTOR → AGGREGATE_KEYS → SYNC_DICTIONARIES → DONE`, or
//! `ABORTED` on a fatal configuration problem. Fatal checks all happen before
//! the first write; per-file and per-locale failures are absorbed into the
//! [`RunSummary`].
//!
//! Precondition: two runs must never execute concurrently against the same
//! project. Each locale file has exactly one writer within a run, and nothing
//! guards against a second process.

mod summary;

use std::fmt;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use thiserror::Error;

pub use summary::RunSummary;

use crate::ai::{
    ClientOptions,
    CompletionClient,
    HttpTransport,
    TransportError,
};
use crate::config::{
    ConfigError,
    Credentials,
    MatcherError,
    Settings,
    SourceMatcher,
};
use crate::dictionary::Dictionary;
use crate::locales::{
    AddedKeys,
    LocaleStore,
    StoreError,
    SyncScope,
    apply_plan,
    plan_sync,
    sync_new_keys,
};
use crate::refactor::{
    EligibleFile,
    discover_eligible_files,
    refactor_all,
};

/// What a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Refactor, then translate everything the targets are missing.
    Run,
    /// Refactor, then translate only the newly confirmed keys.
    Refactor,
    /// Translate what the targets are missing relative to the reference.
    Translate,
}

impl Command {
    /// Whether the run starts with discovering and refactoring source files.
    #[must_use]
    pub const fn refactors(self) -> bool {
        matches!(self, Self::Run | Self::Refactor)
    }

    /// Which keys the translation stage covers.
    #[must_use]
    pub const fn sync_scope(self) -> SyncScope {
        match self {
            Self::Run | Self::Translate => SyncScope::Reference,
            Self::Refactor => SyncScope::NewKeysOnly,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Run => "run",
            Self::Refactor => "refactor",
            Self::Translate => "translate",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discover,
    Refactor,
    AggregateKeys,
    SyncDictionaries,
    Done,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Discover => "DISCOVER",
            Self::Refactor => "REFACTOR",
            Self::AggregateKeys => "AGGREGATE_KEYS",
            Self::SyncDictionaries => "SYNC_DICTIONARIES",
            Self::Done => "DONE",
            Self::Aborted => "ABORTED",
        })
    }
}

/// Problems that abort the whole run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("No API credential configured (set OPENAI_API_KEY or pass --api-key)")]
    MissingCredential,

    #[error("No target locales configured (additionalLocales is empty)")]
    NoLocales,

    #[error("Reference dictionary not found: {0:?}")]
    MissingReferenceDictionary(PathBuf),

    #[error("Failed to load reference dictionary: {0}")]
    ReferenceDictionary(#[source] StoreError),

    #[error(transparent)]
    Matcher(#[from] MatcherError),

    #[error("Failed to set up completion client: {0}")]
    Client(#[from] TransportError),
}

/// Drives one command over one project.
#[derive(Debug)]
pub struct Pipeline {
    /// Root that source directories and the locales folder are relative to.
    project_root: PathBuf,
    settings: Settings,
    /// `None` only in dry runs.
    client: Option<CompletionClient>,
    stage: Stage,
}

impl Pipeline {
    /// Validates the configuration and builds a pipeline around `client`.
    ///
    /// # Errors
    /// - `PipelineError::Configuration` if the settings are invalid
    /// - `PipelineError::MissingCredential` if there is no client outside a dry run
    /// - `PipelineError::NoLocales` if no target locale is configured
    pub fn new(
        project_root: impl Into<PathBuf>,
        settings: Settings,
        client: Option<CompletionClient>,
    ) -> Result<Self, PipelineError> {
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        if client.is_none() && !settings.dry_run {
            return Err(PipelineError::MissingCredential);
        }
        if settings.additional_locales.is_empty() {
            return Err(PipelineError::NoLocales);
        }
        Ok(Self { project_root: project_root.into(), settings, client, stage: Stage::Discover })
    }

    /// Builds a pipeline that talks to the configured HTTP endpoint.
    ///
    /// # Errors
    /// Same as [`Pipeline::new`], plus `PipelineError::Client` if the HTTP client
    /// cannot be built.
    pub fn connect(
        project_root: impl Into<PathBuf>,
        settings: Settings,
        credentials: Option<Credentials>,
    ) -> Result<Self, PipelineError> {
        let client = match credentials {
            Some(credentials) => {
                let transport = HttpTransport::new(settings.endpoint.clone(), credentials)?;
                Some(CompletionClient::new(Arc::new(transport), ClientOptions::from_settings(&settings)))
            }
            None => None,
        };
        Self::new(project_root, settings, client)
    }

    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Executes `command` to completion.
    ///
    /// # Errors
    /// Returns `PipelineError` for fatal problems; the pipeline is then `ABORTED`
    /// and nothing has been written.
    pub async fn run(&mut self, command: Command) -> Result<RunSummary, PipelineError> {
        match self.execute(command).await {
            Ok(summary) => {
                self.advance(Stage::Done);
                Ok(summary)
            }
            Err(e) => {
                tracing::error!("Pipeline aborted: {e}");
                self.advance(Stage::Aborted);
                Err(e)
            }
        }
    }

    /// Stage sequence; returns early only on fatal errors.
    async fn execute(&mut self, command: Command) -> Result<RunSummary, PipelineError> {
        tracing::info!(%command, dry_run = self.settings.dry_run, "Starting pipeline");
        self.stage = Stage::Discover;
        let store = LocaleStore::new(self.project_root.join(&self.settings.locales_folder));
        let reference = self.load_reference(&store).await?;
        let matcher = if command.refactors() {
            Some(SourceMatcher::new(self.project_root.clone(), &self.settings)?)
        } else {
            None
        };

        let client = if self.settings.dry_run { None } else { self.client.clone() };
        let mut summary = RunSummary::new(command, self.settings.dry_run);
        let mut recently_added = AddedKeys::new();

        if let Some(matcher) = matcher {
            let files: Vec<EligibleFile> =
                discover_eligible_files(&matcher, &self.settings.source_dirs).await;
            tracing::info!(files = files.len(), "Discovered eligible files");
            summary.discovered_files = files.len();

            self.advance(Stage::Refactor);
            match &client {
                Some(client) => {
                    let report = refactor_all(client, files, &self.settings).await;

                    self.advance(Stage::AggregateKeys);
                    let new_keys = sync_new_keys(&store, &report.confirmed, &self.settings).await;
                    recently_added = new_keys.added;
                    summary.new_keys = new_keys.results;
                    summary.refactor = Some(report);
                }
                None => {
                    tracing::info!("Dry run: skipping refactor of {} files", files.len());
                    self.advance(Stage::AggregateKeys);
                }
            }
        }

        self.advance(Stage::SyncDictionaries);
        let plan = plan_sync(&store, &reference, &self.settings, command.sync_scope(), &recently_added)
            .await;
        summary.missing_keys = plan.missing_count();
        tracing::info!(
            missing = summary.missing_keys,
            locales = plan.pending.len(),
            "Computed missing keys"
        );

        summary.locales = match &client {
            Some(client) => apply_plan(client, &store, plan, &self.settings).await,
            None => plan.into_dry_run(),
        };

        Ok(summary)
    }

    /// The reference dictionary must exist before anything else happens.
    async fn load_reference(&self, store: &LocaleStore) -> Result<Dictionary, PipelineError> {
        let locale = &self.settings.reference_locale;
        match store.load(locale).await {
            Ok(Some(reference)) => Ok(reference),
            Ok(None) => Err(PipelineError::MissingReferenceDictionary(store.path_for(locale))),
            Err(e) => Err(PipelineError::ReferenceDictionary(e)),
        }
    }

    /// Moves to `stage`.
    fn advance(&mut self, stage: Stage) {
        tracing::info!("{} -> {}", self.stage, stage);
        self.stage = stage;
    }
}
