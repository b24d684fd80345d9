//! Client for the hosted entity store that owns VocalizeX records.
//!
//! This crate provides:
//! - `ClipStore` / `GenerationStore` traits (the persistence seam)
//! - An HTTP implementation against the platform records service
//! - An in-memory implementation for tests and local development
//! - Retry with exponential backoff and jitter

pub mod client;
pub mod error;
pub mod memory;
pub mod retry;
pub mod store;

pub use client::{RecordsClient, RecordsConfig};
pub use error::{RecordsError, RecordsResult};
pub use memory::MemoryStore;
pub use retry::RetryConfig;
pub use store::{ClipStore, GenerationStore};
