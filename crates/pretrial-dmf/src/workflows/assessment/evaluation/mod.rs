mod config;
mod matrix;
mod overrides;
mod result;
mod scoring;

pub use config::{
    Cutpoints, DecisionMatrixConfig, MatrixCell, MatrixDocumentError, NvcaRule, OverrideRule,
    OverrideRules, ReleaseTier, ScaleCutpoints, ScaleWeights, TierShift, WeightEntry,
};
pub use matrix::{DecisionMatrixResolver, MatrixKey};
pub use overrides::{OverrideEngine, OverrideId};
pub use result::{assemble, ScoringResult};
pub use scoring::{
    nvca_flag, scale_from_raw, RawScores, ScaleScorer, ScoreComponent, MAX_SCALE, MIN_SCALE,
};

use tracing::{debug, error, warn};

use super::domain::{RawResponses, ValidResponses};
use super::error::{ConfigurationError, EvaluationError};
use super::predicate::Facts;
use super::validation::{validate, ResponseSchema};

/// Stateless engine holding one frozen jurisdiction configuration.
///
/// Safe to share behind an `Arc` across threads; evaluation never mutates it.
#[derive(Debug, Clone)]
pub struct DmfEngine {
    config: DecisionMatrixConfig,
    scorer: ScaleScorer,
    resolver: DecisionMatrixResolver,
    overrides: OverrideEngine,
}

impl DmfEngine {
    pub fn new(config: DecisionMatrixConfig) -> Self {
        let scorer = ScaleScorer::new(&config);
        let resolver = DecisionMatrixResolver::new(&config);
        let overrides = OverrideEngine::new(&config);

        Self {
            config,
            scorer,
            resolver,
            overrides,
        }
    }

    pub fn config(&self) -> &DecisionMatrixConfig {
        &self.config
    }

    /// Score, resolve, override and assemble a validated record.
    pub fn evaluate(&self, responses: &ValidResponses) -> Result<ScoringResult, ConfigurationError> {
        let raw = self.scorer.score(responses)?;
        let readout = self.scorer.readout(responses, &raw);
        let base = self.resolver.resolve(MatrixKey::from(readout))?;
        let facts = Facts::scored(responses.responses(), readout);
        let (recommendation, triggered) = self.overrides.apply(&base, &facts)?;

        Ok(assemble(readout, raw, base, recommendation, triggered))
    }

    /// Full pipeline from an intake record, with rejection and fault logging.
    pub fn assess(
        &self,
        raw: &RawResponses,
        schema: &ResponseSchema,
    ) -> Result<ScoringResult, EvaluationError> {
        let responses = validate(raw, schema).inspect_err(|err| {
            warn!(error = %err, "risk factor responses rejected");
        })?;

        let result = self.evaluate(&responses).inspect_err(|err| {
            error!(
                jurisdiction = %self.config.jurisdiction,
                error = %err,
                "decision matrix configuration fault"
            );
        })?;

        debug!(
            nca = result.nca_scale(),
            fta = result.fta_scale(),
            nvca = result.nvca_flag(),
            release_type = %result.recommendation().release_type,
            overrides = ?result.triggered_overrides(),
            "assessment evaluated"
        );
        Ok(result)
    }
}
