//! AI completion client.
//!
//! [`CompletionClient`] runs one task against an injected
//! [`CompletionTransport`] and hands back a typed, validated result.

pub mod client;
pub mod contract;
pub mod prompt;
pub mod transport;

pub use client::{
    AiError,
    ClientOptions,
    CompletionClient,
};
pub use contract::{
    BuildError,
    CompileFix,
    ContractViolation,
    RefactorOutcome,
    TaskKind,
};
pub use transport::{
    CompletionRequest,
    CompletionTransport,
    HttpTransport,
    TransportError,
};
