//! next-i18n-autopilot
//!
//! Next.js (next-intl) プロジェクト向けの AI によるリファクタリング＋翻訳パイプライン

pub mod ai;
pub mod concurrency;
pub mod config;
pub mod dictionary;
pub mod locales;
pub mod pipeline;
pub mod refactor;
pub mod syntax;

#[cfg(test)]
mod test_utils;

pub use pipeline::{
    Command,
    Pipeline,
    PipelineError,
    RunSummary,
    Stage,
};
