//! Shared data models for the VocalizeX backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video clip records and their lifecycle status
//! - Generation records (the durable job-status store)
//! - Provider identifiers

pub mod clip;
pub mod generation;
pub mod provider;

// Re-export common types
pub use clip::{ClipId, ClipStatus, Orientation, VideoClip};
pub use generation::{GenerationId, GenerationRecord, GenerationStatus};
pub use provider::ProviderKind;
