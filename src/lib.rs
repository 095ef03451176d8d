//! Mail Triage: classifies stored emails with an LLM and publishes summaries.

pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod mail;
pub mod pipeline;
pub mod publish;
pub mod secrets;
pub mod storage;
pub mod trigger;
