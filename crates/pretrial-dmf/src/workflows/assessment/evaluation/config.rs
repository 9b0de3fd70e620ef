use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::super::domain::{FactorValue, RiskFactor};
use super::super::predicate::Predicate;

const REFERENCE_DOCUMENT: &str = include_str!("../../../../config/reference_dmf.json");

/// Organization-scoped decision-matrix document. Read-only once an engine is built from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionMatrixConfig {
    pub jurisdiction: String,
    /// Counts above this value collapse to it before weighting.
    #[serde(default = "default_count_cap")]
    pub count_cap: u32,
    pub weights: ScaleWeights,
    pub cutpoints: ScaleCutpoints,
    pub nvca: NvcaRule,
    /// Release tiers ordered from least to most restrictive.
    pub tiers: Vec<ReleaseTier>,
    pub matrix: Vec<MatrixCell>,
    pub overrides: OverrideRules,
}

fn default_count_cap() -> u32 {
    3
}

impl DecisionMatrixConfig {
    /// PSA-style reference configuration bundled with the crate.
    pub fn reference() -> Result<Self, MatrixDocumentError> {
        Self::from_json(REFERENCE_DOCUMENT)
    }

    pub fn from_json(document: &str) -> Result<Self, MatrixDocumentError> {
        serde_json::from_str::<Self>(document)?.checked()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, MatrixDocumentError> {
        serde_json::from_reader::<_, Self>(reader)?.checked()
    }

    /// Reject an NVCA overlay that reads scales; it runs before any scale exists.
    pub fn checked(self) -> Result<Self, MatrixDocumentError> {
        match &self.nvca.overlay {
            Some(overlay) if overlay.reads_scales() => Err(MatrixDocumentError::ScaleInOverlay),
            _ => Ok(self),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MatrixDocumentError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleWeights {
    pub nca: Vec<WeightEntry>,
    pub fta: Vec<WeightEntry>,
    pub nvca: Vec<WeightEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub factor: RiskFactor,
    pub value: FactorValue,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleCutpoints {
    pub nca: Cutpoints,
    pub fta: Cutpoints,
}

/// Upper bounds (inclusive) of scale 1 through 6, non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cutpoints(pub [i32; 6]);

/// NVCA is flagged when the raw total reaches `threshold` or the overlay holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NvcaRule {
    pub threshold: i32,
    /// Evaluated against responses only. Scale predicates are refused on load.
    #[serde(default)]
    pub overlay: Option<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseTier {
    pub id: String,
    #[serde(default)]
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub nca: u8,
    pub fta: u8,
    pub nvca: bool,
    pub release_type: String,
    #[serde(default)]
    pub conditions: Vec<String>,
}

/// The three override rules. Their precedence is fixed by the engine, not by this document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRules {
    pub step_two: OverrideRule,
    pub step_four: OverrideRule,
    pub secondary_release_decrease: OverrideRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRule {
    pub when: Predicate,
    pub effect: TierShift,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TierShift {
    Escalate { tiers: usize },
    EscalateTo { tier: String },
    Relax { tiers: usize },
}

/// Failure to load a decision-matrix document.
#[derive(Debug, thiserror::Error)]
pub enum MatrixDocumentError {
    #[error("failed to read decision matrix document: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid decision matrix document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("NVCA overlay may only test responses, not scored scales")]
    ScaleInOverlay,
}
