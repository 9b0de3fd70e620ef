use std::collections::HashMap;

use super::super::domain::Recommendation;
use super::super::error::ConfigurationError;
use super::super::predicate::ScaleReadout;
use super::config::DecisionMatrixConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixKey {
    pub nca: u8,
    pub fta: u8,
    pub nvca: bool,
}

impl From<ScaleReadout> for MatrixKey {
    fn from(readout: ScaleReadout) -> Self {
        Self {
            nca: readout.nca_scale,
            fta: readout.fta_scale,
            nvca: readout.nvca_flag,
        }
    }
}

/// Composite-key lookup of base recommendations.
#[derive(Debug, Clone)]
pub struct DecisionMatrixResolver {
    cells: HashMap<MatrixKey, Recommendation>,
}

impl DecisionMatrixResolver {
    pub fn new(config: &DecisionMatrixConfig) -> Self {
        let cells = config
            .matrix
            .iter()
            .map(|cell| {
                (
                    MatrixKey {
                        nca: cell.nca,
                        fta: cell.fta,
                        nvca: cell.nvca,
                    },
                    Recommendation {
                        release_type: cell.release_type.clone(),
                        conditions: cell.conditions.clone(),
                    },
                )
            })
            .collect();
        Self { cells }
    }

    /// A missing cell is a configuration fault; there is no fallback recommendation.
    pub fn resolve(&self, key: MatrixKey) -> Result<Recommendation, ConfigurationError> {
        self.cells
            .get(&key)
            .cloned()
            .ok_or(ConfigurationError::MissingCell {
                nca: key.nca,
                fta: key.fta,
                nvca: key.nvca,
            })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
