//! Vendor adapters for remote video-generation jobs.
//!
//! This crate provides:
//! - The `VideoProvider` trait: `submit -> JobHandle`, `poll -> JobState`
//! - Adapters for D-ID, Runway ML and Stability AI
//! - A registry that constructs every configured adapter once at startup
//!
//! Each adapter maps its vendor's status vocabulary onto the shared
//! three-state model through a pure classification function, so the
//! orchestration loop never sees vendor-specific payloads.

pub mod did;
pub mod error;
pub mod provider;
pub mod registry;
pub mod runway;
pub mod stability;
pub mod types;

pub use did::DidProvider;
pub use error::{ProviderError, ProviderResult};
pub use provider::VideoProvider;
pub use registry::ProviderRegistry;
pub use runway::RunwayProvider;
pub use stability::StabilityProvider;
pub use types::{JobHandle, JobState, PollPolicy, RenderArtifact, RenderRequest, VendorFailure};
