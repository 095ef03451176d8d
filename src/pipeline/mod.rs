//! Email triage pipeline.
//!
//! Every stored email flows through:
//! 1. `mail::fetch`: retrieve and parse the raw object
//! 2. `AttachmentRelocator`: store supported attachments with signed links
//! 3. `Classifier`: LLM verdict on the subject (案件 / 要員 / 不明)
//! 4. `Summarizer`: LLM extraction of the category's business fields
//! 5. `Publisher`: record API post and spreadsheet row
//!
//! `Orchestrator` sequences the stages and owns the failure policy.

pub mod classifier;
pub mod orchestrator;
pub mod prompts;
pub mod response;
pub mod summarizer;
pub mod types;

pub use classifier::Classifier;
pub use orchestrator::{Orchestrator, Outcome, Stage};
pub use summarizer::Summarizer;
