use serde::{Deserialize, Serialize};

use super::super::domain::Recommendation;
use super::super::predicate::ScaleReadout;
use super::overrides::OverrideId;
use super::scoring::{RawScores, ScoreComponent};

/// Scores, recommendation and override trail for one assessment.
///
/// Fields are private; a result only comes out of [`assemble`] and is never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResult {
    nca_scale: u8,
    fta_scale: u8,
    nvca_flag: bool,
    nca_raw_total: i32,
    fta_raw_total: i32,
    nvca_raw_total: i32,
    base_recommendation: Recommendation,
    recommendation: Recommendation,
    triggered_overrides: Vec<OverrideId>,
    components: Vec<ScoreComponent>,
}

impl ScoringResult {
    pub fn nca_scale(&self) -> u8 {
        self.nca_scale
    }

    pub fn fta_scale(&self) -> u8 {
        self.fta_scale
    }

    pub fn nvca_flag(&self) -> bool {
        self.nvca_flag
    }

    pub fn nca_raw_total(&self) -> i32 {
        self.nca_raw_total
    }

    pub fn fta_raw_total(&self) -> i32 {
        self.fta_raw_total
    }

    pub fn nvca_raw_total(&self) -> i32 {
        self.nvca_raw_total
    }

    /// Matrix cell before overrides, for reviewers comparing against the final call.
    pub fn base_recommendation(&self) -> &Recommendation {
        &self.base_recommendation
    }

    pub fn recommendation(&self) -> &Recommendation {
        &self.recommendation
    }

    pub fn triggered_overrides(&self) -> &[OverrideId] {
        &self.triggered_overrides
    }

    pub fn components(&self) -> &[ScoreComponent] {
        &self.components
    }

    pub fn summary(&self) -> String {
        let overrides = if self.triggered_overrides.is_empty() {
            "none".to_string()
        } else {
            self.triggered_overrides
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "NCA {} / FTA {} / NVCA {}: {} (overrides: {})",
            self.nca_scale,
            self.fta_scale,
            if self.nvca_flag { "yes" } else { "no" },
            self.recommendation.release_type,
            overrides
        )
    }
}

pub fn assemble(
    readout: ScaleReadout,
    raw: RawScores,
    base: Recommendation,
    recommendation: Recommendation,
    triggered_overrides: Vec<OverrideId>,
) -> ScoringResult {
    ScoringResult {
        nca_scale: readout.nca_scale,
        fta_scale: readout.fta_scale,
        nvca_flag: readout.nvca_flag,
        nca_raw_total: raw.nca,
        fta_raw_total: raw.fta,
        nvca_raw_total: raw.nvca,
        base_recommendation: base,
        recommendation,
        triggered_overrides,
        components: raw.components,
    }
}
