//! Contract-enforcing completion client with a bounded retry loop.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;

use super::contract::{
    self,
    BuildError,
    CompileFix,
    ContractViolation,
    RefactorOutcome,
    TaskKind,
};
use super::prompt;
use super::transport::{
    CompletionRequest,
    CompletionTransport,
    TransportError,
};
use crate::config::Settings;
use crate::dictionary::Dictionary;

/// Failure of one unit of AI work.
#[derive(Error, Debug)]
pub enum AiError {
    /// Network failure, non-success status or timeout. Not retried.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Every attempt produced a response that broke the task contract.
    #[error("{task} for '{subject}' violated the response contract after {attempts} attempts: {reason}")]
    ContractViolation {
        task: TaskKind,
        /// File path, locale or key the task was about.
        subject: String,
        attempts: u32,
        reason: ContractViolation,
    },
}

/// Request parameters shared by every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub model: String,
    pub max_tokens: u32,
    /// Extra attempts after a contract violation.
    pub max_retries: u32,
    /// Deadline of a single round trip.
    pub request_timeout: Duration,
    /// Upper bound of outstanding requests across all clones of the client.
    pub max_in_flight: usize,
}

impl ClientOptions {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            max_retries: settings.max_retries,
            request_timeout: settings.request_timeout(),
            max_in_flight: settings.concurrency,
        }
    }
}

/// Executes AI tasks and returns contract-validated results.
///
/// Cloning is cheap; clones share the transport and the in-flight limit, so
/// nested fan-outs (locales, then leaves) still respect `max_in_flight`.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    /// Injected wire access.
    transport: Arc<dyn CompletionTransport>,
    /// Request parameters.
    options: ClientOptions,
    /// One permit per outstanding request.
    limiter: Arc<Semaphore>,
}

impl CompletionClient {
    #[must_use]
    pub fn new(transport: Arc<dyn CompletionTransport>, options: ClientOptions) -> Self {
        let limiter = Arc::new(Semaphore::new(options.max_in_flight.max(1)));
        Self { transport, options, limiter }
    }

    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Asks the model to move the literal text of a file into translation lookups.
    ///
    /// # Errors
    /// Returns `AiError` on transport failure or exhausted retries.
    pub async fn refactor_file(
        &self,
        file_path: &Path,
        source: &str,
        key_separator: &str,
    ) -> Result<RefactorOutcome, AiError> {
        let subject = file_path.display().to_string();
        let prompt = prompt::refactor_file(&subject, source, key_separator);
        self.run(TaskKind::RefactorFile, &subject, &prompt, contract::parse_refactor).await
    }

    /// Translates a single string.
    ///
    /// # Errors
    /// Returns `AiError` on transport failure or exhausted retries.
    pub async fn translate_text(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<String, AiError> {
        let prompt = prompt::translate_text(text, source_locale, target_locale);
        self.run(TaskKind::TranslateText, target_locale, &prompt, contract::parse_translated_text)
            .await
    }

    /// Translates a whole subtree in one call.
    ///
    /// The response must carry exactly the requested key paths.
    ///
    /// # Errors
    /// Returns `AiError` on transport failure or exhausted retries.
    pub async fn translate_batch(
        &self,
        missing: &Dictionary,
        source_locale: &str,
        target_locale: &str,
        key_separator: &str,
    ) -> Result<Dictionary, AiError> {
        let payload = serde_json::to_string_pretty(missing).map_err(|e| {
            AiError::ContractViolation {
                task: TaskKind::TranslateBatch,
                subject: target_locale.to_string(),
                attempts: 0,
                reason: ContractViolation::NotJson(e.to_string()),
            }
        })?;
        let prompt = prompt::translate_batch(&payload, source_locale, target_locale);
        self.run(TaskKind::TranslateBatch, target_locale, &prompt, |raw| {
            contract::parse_translated_batch(raw, missing, key_separator)
        })
        .await
    }

    /// Extracts structured errors from a build log.
    ///
    /// # Errors
    /// Returns `AiError` on transport failure or exhausted retries.
    pub async fn extract_build_errors(&self, build_log: &str) -> Result<Vec<BuildError>, AiError> {
        let prompt = prompt::extract_build_errors(build_log);
        self.run(TaskKind::ExtractBuildErrors, "build output", &prompt, contract::parse_build_errors)
            .await
    }

    /// Asks for a fixed version of a file that fails to compile.
    ///
    /// # Errors
    /// Returns `AiError` on transport failure or exhausted retries.
    pub async fn fix_compile_error(
        &self,
        file_path: &Path,
        source: &str,
        error_description: &str,
    ) -> Result<CompileFix, AiError> {
        let subject = file_path.display().to_string();
        let prompt = prompt::fix_compile_error(&subject, source, error_description);
        self.run(TaskKind::FixCompileError, &subject, &prompt, contract::parse_compile_fix).await
    }

    /// Attempt loop: send, parse, and on a violation re-send with a correction
    /// notice until `max_retries` extra attempts are used up.
    async fn run<T, P>(
        &self,
        task: TaskKind,
        subject: &str,
        base_prompt: &str,
        parse: P,
    ) -> Result<T, AiError>
    where
        P: Fn(&str) -> Result<T, ContractViolation> + Send + Sync,
    {
        let mut current_prompt = base_prompt.to_string();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let raw = self.send(current_prompt.clone()).await?;

            match parse(&raw) {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(%task, subject, attempt, "Valid response after retry");
                    }
                    return Ok(value);
                }
                Err(reason) if attempt <= self.options.max_retries => {
                    tracing::debug!(%task, subject, attempt, %reason, "Invalid response, retrying");
                    current_prompt =
                        prompt::with_retry_notice(base_prompt, task, attempt, &reason.to_string());
                }
                Err(reason) => {
                    return Err(AiError::ContractViolation {
                        task,
                        subject: subject.to_string(),
                        attempts: attempt,
                        reason,
                    });
                }
            }
        }
    }

    /// One round trip under the per-call deadline.
    async fn send(&self, prompt: String) -> Result<String, TransportError> {
        let request = CompletionRequest {
            model: self.options.model.clone(),
            prompt,
            max_tokens: self.options.max_tokens,
        };
        let deadline = self.options.request_timeout;
        let _permit = self.limiter.acquire().await.map_err(|_| TransportError::Closed)?;

        tokio::time::timeout(deadline, self.transport.complete(&request))
            .await
            .map_err(|_| TransportError::Timeout(deadline))?
    }
}
