use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scoring::domain::{Dimension, SourceBucket};

/// Reliability and dimension mix for one evidence source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProfile {
    pub reliability: f64,
    pub weights: BTreeMap<Dimension, f64>,
}

impl SourceProfile {
    pub fn new(reliability: f64, weights: &[(Dimension, f64)]) -> Self {
        Self {
            reliability,
            weights: weights.iter().copied().collect(),
        }
    }

    /// Weights rescaled to sum to 1. Negative or non-finite weights are dropped;
    /// a profile with no positive weight contributes nothing.
    pub fn normalized_weights(&self) -> BTreeMap<Dimension, f64> {
        let usable: BTreeMap<Dimension, f64> = self
            .weights
            .iter()
            .filter(|(_, weight)| weight.is_finite() && **weight > 0.0)
            .map(|(dimension, weight)| (*dimension, *weight))
            .collect();
        let total: f64 = usable.values().sum();
        if total <= 0.0 {
            return BTreeMap::new();
        }
        usable
            .into_iter()
            .map(|(dimension, weight)| (dimension, weight / total))
            .collect()
    }

    pub fn clamped_reliability(&self) -> f64 {
        if self.reliability.is_finite() {
            self.reliability.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

pub type SourceProfileTable = BTreeMap<SourceBucket, SourceProfile>;

/// Source matrix used when no configuration override is supplied.
pub fn standard_source_profiles() -> SourceProfileTable {
    use Dimension::*;

    let mut table = BTreeMap::new();
    table.insert(
        SourceBucket::TechnologyHiring,
        SourceProfile::new(
            0.85,
            &[
                (DataInfrastructure, 0.10),
                (TechnologyStack, 0.20),
                (TalentSkills, 0.70),
                (CultureChange, 0.10),
            ],
        ),
    );
    table.insert(
        SourceBucket::InnovationActivity,
        SourceProfile::new(
            0.80,
            &[
                (DataInfrastructure, 0.20),
                (TechnologyStack, 0.50),
                (UseCasePortfolio, 0.30),
            ],
        ),
    );
    table.insert(
        SourceBucket::DigitalPresence,
        SourceProfile::new(0.70, &[(DataInfrastructure, 0.60), (TechnologyStack, 0.40)]),
    );
    table.insert(
        SourceBucket::LeadershipSignals,
        SourceProfile::new(
            0.80,
            &[
                (AiGovernance, 0.25),
                (LeadershipVision, 0.60),
                (CultureChange, 0.15),
            ],
        ),
    );
    table.insert(
        SourceBucket::FilingItem1,
        SourceProfile::new(0.90, &[(TechnologyStack, 0.30), (UseCasePortfolio, 0.70)]),
    );
    table.insert(
        SourceBucket::FilingItem1a,
        SourceProfile::new(0.90, &[(DataInfrastructure, 0.20), (AiGovernance, 0.80)]),
    );
    table.insert(
        SourceBucket::FilingItem7,
        SourceProfile::new(
            0.90,
            &[
                (DataInfrastructure, 0.20),
                (LeadershipVision, 0.50),
                (UseCasePortfolio, 0.30),
            ],
        ),
    );
    table.insert(
        SourceBucket::CultureReviews,
        SourceProfile::new(
            0.75,
            &[
                (TalentSkills, 0.10),
                (LeadershipVision, 0.10),
                (CultureChange, 0.80),
            ],
        ),
    );
    table.insert(
        SourceBucket::BoardComposition,
        SourceProfile::new(0.90, &[(AiGovernance, 0.70), (LeadershipVision, 0.30)]),
    );
    table
}
