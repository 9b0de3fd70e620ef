use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::super::domain::{FactorValue, RiskFactor, Scale, ValidResponses};
use super::super::error::ConfigurationError;
use super::super::predicate::{Facts, ScaleReadout};
use super::config::{Cutpoints, DecisionMatrixConfig, NvcaRule, WeightEntry};

pub const MIN_SCALE: u8 = 1;
pub const MAX_SCALE: u8 = 6;

/// Points one factor contributed to one scale, kept for audit trails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponent {
    pub scale: Scale,
    pub factor: RiskFactor,
    pub value: FactorValue,
    pub points: i32,
}

/// Raw weighted totals per scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawScores {
    pub nca: i32,
    pub fta: i32,
    pub nvca: i32,
    pub components: Vec<ScoreComponent>,
}

#[derive(Debug, Clone, Default)]
struct WeightTable {
    factors: BTreeSet<RiskFactor>,
    points: HashMap<(RiskFactor, FactorValue), i32>,
}

impl WeightTable {
    fn from_entries(entries: &[WeightEntry]) -> Self {
        let mut table = WeightTable::default();
        for entry in entries {
            table.factors.insert(entry.factor);
            table.points.insert((entry.factor, entry.value), entry.points);
        }
        table
    }
}

/// Weighted summation and cutpoint mapping for the three scales.
#[derive(Debug, Clone)]
pub struct ScaleScorer {
    count_cap: u32,
    tables: BTreeMap<Scale, WeightTable>,
    nca_cutpoints: Cutpoints,
    fta_cutpoints: Cutpoints,
    nvca: NvcaRule,
}

impl ScaleScorer {
    pub fn new(config: &DecisionMatrixConfig) -> Self {
        let mut tables = BTreeMap::new();
        tables.insert(Scale::Nca, WeightTable::from_entries(&config.weights.nca));
        tables.insert(Scale::Fta, WeightTable::from_entries(&config.weights.fta));
        tables.insert(Scale::Nvca, WeightTable::from_entries(&config.weights.nvca));

        Self {
            count_cap: config.count_cap,
            tables,
            nca_cutpoints: config.cutpoints.nca,
            fta_cutpoints: config.cutpoints.fta,
            nvca: config.nvca.clone(),
        }
    }

    /// Sum the weights of every factor listed in each scale's table.
    pub fn score(&self, responses: &ValidResponses) -> Result<RawScores, ConfigurationError> {
        let record = responses.responses();
        let mut totals = BTreeMap::new();
        let mut components = Vec::new();

        for (scale, table) in &self.tables {
            let mut total: i32 = 0;
            for factor in RiskFactor::ALL {
                if !table.factors.contains(&factor) {
                    continue;
                }
                let value = record.factor_value(factor, self.count_cap);
                let points = *table.points.get(&(factor, value)).ok_or(
                    ConfigurationError::MissingWeight {
                        scale: *scale,
                        factor,
                        value,
                    },
                )?;
                total = total
                    .checked_add(points)
                    .ok_or(ConfigurationError::ScoreOverflow { scale: *scale })?;
                components.push(ScoreComponent {
                    scale: *scale,
                    factor,
                    value,
                    points,
                });
            }
            totals.insert(*scale, total);
        }

        let total_for = |scale| totals.get(&scale).copied().unwrap_or_default();
        Ok(RawScores {
            nca: total_for(Scale::Nca),
            fta: total_for(Scale::Fta),
            nvca: total_for(Scale::Nvca),
            components,
        })
    }

    /// Map raw totals to the ordinal scales and the NVCA flag.
    pub fn readout(&self, responses: &ValidResponses, raw: &RawScores) -> ScaleReadout {
        ScaleReadout {
            nca_scale: scale_from_raw(raw.nca, &self.nca_cutpoints),
            fta_scale: scale_from_raw(raw.fta, &self.fta_cutpoints),
            nvca_flag: nvca_flag(raw.nvca, &self.nvca, responses),
        }
    }
}

/// Smallest scale whose cutpoint is at least `raw`; totals past the last cutpoint map to 6.
pub fn scale_from_raw(raw: i32, cutpoints: &Cutpoints) -> u8 {
    cutpoints
        .0
        .iter()
        .position(|bound| raw <= *bound)
        .map(|index| MIN_SCALE + index as u8)
        .unwrap_or(MAX_SCALE)
}

pub fn nvca_flag(raw: i32, rule: &NvcaRule, responses: &ValidResponses) -> bool {
    raw >= rule.threshold
        || rule
            .overlay
            .as_ref()
            .is_some_and(|overlay| overlay.evaluate(&Facts::responses(responses.responses())))
}
