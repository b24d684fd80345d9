//! Generation provider identifiers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The external vendor a generation job is submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// D-ID talking-head generation
    Did,
    /// Runway ML image-to-video
    Runway,
    /// Stability AI image-to-video
    Stability,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Did => "did",
            ProviderKind::Runway => "runway",
            ProviderKind::Stability => "stability",
        }
    }

    /// All known providers, in registry order.
    pub fn all() -> [ProviderKind; 3] {
        [ProviderKind::Did, ProviderKind::Runway, ProviderKind::Stability]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "did" | "d-id" => Ok(ProviderKind::Did),
            "runway" | "runwayml" => Ok(ProviderKind::Runway),
            "stability" | "stabilityai" => Ok(ProviderKind::Stability),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}
