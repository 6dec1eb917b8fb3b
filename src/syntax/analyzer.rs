pub mod eligibility;
pub mod extractor;
mod nodes;
pub mod scope;
pub mod types;
