//! File refactor orchestrator.

pub mod discovery;
pub mod orchestrator;

pub use discovery::{
    EligibleFile,
    SKIPPED_DIRECTORIES,
    candidate_files,
    discover_eligible_files,
};
pub use orchestrator::{
    FileFailure,
    KeyConflict,
    RefactorError,
    RefactorReport,
    refactor_all,
};
