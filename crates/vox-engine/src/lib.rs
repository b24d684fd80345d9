//! Generation orchestration.
//!
//! This crate owns the provider-agnostic lifecycle of a generation:
//! validate the clip, take the in-progress guard, submit the vendor job,
//! poll it within the provider's attempt budget, resolve the artifact
//! (uploading inline bytes to the vault when needed) and commit the result
//! to the clip record exactly once.

pub mod error;
pub mod orchestrator;
pub mod poll;

pub use error::{EngineError, EngineResult};
pub use orchestrator::Orchestrator;
pub use poll::poll_until_terminal;
