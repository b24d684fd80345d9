//! S3-compatible media vault.
//!
//! This crate provides:
//! - The `ArtifactSink` trait (upload bytes, get back a hosted URL)
//! - An S3-compatible client implementation
//!
//! Providers that stream a finished video inline (rather than returning a
//! hosted URL) need their bytes re-uploaded here before a result URL exists.

pub mod client;
pub mod error;
pub mod sink;

pub use client::{S3Vault, VaultConfig};
pub use error::{StorageError, StorageResult};
pub use sink::ArtifactSink;
