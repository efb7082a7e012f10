//! Quality tiers and per-shot credit costs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Billing/quality level for a production run.
///
/// Determines the per-shot credit cost and the generation parameters the
/// service applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Standard generation quality
    #[default]
    Standard,
    /// Higher-fidelity generation at a higher per-shot cost
    Professional,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Standard => "standard",
            QualityTier::Professional => "professional",
        }
    }

    /// Credits charged per completed shot at this tier.
    pub fn credit_cost(&self) -> u32 {
        match self {
            QualityTier::Standard => 10,
            QualityTier::Professional => 25,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
