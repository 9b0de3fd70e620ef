use serde::{Deserialize, Serialize};

use super::super::domain::Recommendation;
use super::super::error::ConfigurationError;
use super::super::predicate::Facts;
use super::config::{DecisionMatrixConfig, OverrideRule, ReleaseTier, TierShift};

/// Identifiers recorded for each override that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideId {
    StepTwoIncrease,
    StepFourIncrease,
    SecondaryReleaseDecrease,
}

impl OverrideId {
    pub const fn as_str(self) -> &'static str {
        match self {
            OverrideId::StepTwoIncrease => "step_two_increase",
            OverrideId::StepFourIncrease => "step_four_increase",
            OverrideId::SecondaryReleaseDecrease => "secondary_release_decrease",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupMode {
    /// At most one rule of the group applies: the first whose condition holds.
    FirstMatch,
    /// Every rule whose condition holds applies.
    Independent,
}

#[derive(Debug, Clone)]
struct RuleGroup {
    mode: GroupMode,
    rules: Vec<(OverrideId, OverrideRule)>,
}

/// Applies the step and secondary-release rules to a base recommendation.
///
/// Groups run in order: step-two then step-four (exclusive), then secondary-release
/// decrease. The tier index saturates at both ends of the configured ordering.
#[derive(Debug, Clone)]
pub struct OverrideEngine {
    tiers: Vec<ReleaseTier>,
    groups: Vec<RuleGroup>,
}

impl OverrideEngine {
    pub fn new(config: &DecisionMatrixConfig) -> Self {
        let rules = &config.overrides;
        let groups = vec![
            RuleGroup {
                mode: GroupMode::FirstMatch,
                rules: vec![
                    (OverrideId::StepTwoIncrease, rules.step_two.clone()),
                    (OverrideId::StepFourIncrease, rules.step_four.clone()),
                ],
            },
            RuleGroup {
                mode: GroupMode::Independent,
                rules: vec![(
                    OverrideId::SecondaryReleaseDecrease,
                    rules.secondary_release_decrease.clone(),
                )],
            },
        ];

        Self {
            tiers: config.tiers.clone(),
            groups,
        }
    }

    pub fn apply(
        &self,
        base: &Recommendation,
        facts: &Facts<'_>,
    ) -> Result<(Recommendation, Vec<OverrideId>), ConfigurationError> {
        let base_index = self.tier_index(&base.release_type)?;
        let mut index = base_index;
        let mut triggered = Vec::new();

        for group in &self.groups {
            for (id, rule) in &group.rules {
                if !rule.when.evaluate(facts) {
                    continue;
                }
                index = self.shift(index, &rule.effect)?;
                triggered.push(*id);
                if group.mode == GroupMode::FirstMatch {
                    break;
                }
            }
        }

        if index == base_index {
            return Ok((base.clone(), triggered));
        }

        let tier = &self.tiers[index];
        Ok((
            Recommendation {
                release_type: tier.id.clone(),
                conditions: tier.conditions.clone(),
            },
            triggered,
        ))
    }

    fn shift(&self, index: usize, effect: &TierShift) -> Result<usize, ConfigurationError> {
        let most_restrictive = self.tiers.len().saturating_sub(1);
        let shifted = match effect {
            TierShift::Escalate { tiers } => index.saturating_add(*tiers).min(most_restrictive),
            TierShift::EscalateTo { tier } => index.max(self.tier_index(tier)?),
            TierShift::Relax { tiers } => index.saturating_sub(*tiers),
        };
        Ok(shifted)
    }

    fn tier_index(&self, release_type: &str) -> Result<usize, ConfigurationError> {
        self.tiers
            .iter()
            .position(|tier| tier.id == release_type)
            .ok_or_else(|| ConfigurationError::UnknownTier {
                tier: release_type.to_string(),
            })
    }
}
