use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{clamp, Dimension};

pub const DEFAULT_SECTOR: &str = "Services";
pub const DEFAULT_HR_BASELINE: f64 = 75.0;
pub const DEFAULT_AVERAGE_VR: f64 = 50.0;

/// Dimension weights and HR anchor for one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorProfile {
    pub sector_name: String,
    #[serde(default)]
    pub weights: BTreeMap<Dimension, f64>,
    #[serde(default)]
    pub hr_baseline_value: Option<f64>,
    /// Sector average VR used by the position factor; looked up by name when absent.
    #[serde(default)]
    pub average_vr: Option<f64>,
}

impl SectorProfile {
    pub fn new(sector_name: impl Into<String>, weights: &[(Dimension, f64)], hr_baseline: f64) -> Self {
        Self {
            sector_name: sector_name.into(),
            weights: weights.iter().copied().collect(),
            hr_baseline_value: Some(hr_baseline),
            average_vr: None,
        }
    }

    /// Profile used when a sector has no configuration.
    pub fn uniform(sector_name: impl Into<String>) -> Self {
        Self {
            sector_name: sector_name.into(),
            weights: BTreeMap::new(),
            hr_baseline_value: None,
            average_vr: None,
        }
    }

    /// Weights in `Dimension::ALL` order, summing to 1. Negative or missing
    /// weights count as zero; an all-zero profile becomes uniform.
    pub fn normalized_weights(&self) -> [f64; 7] {
        let mut weights = [0.0; 7];
        for dimension in Dimension::ALL {
            let raw = self.weights.get(&dimension).copied().unwrap_or(0.0);
            weights[dimension.index()] = if raw.is_finite() { raw.max(0.0) } else { 0.0 };
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return [1.0 / 7.0; 7];
        }
        weights.map(|weight| weight / total)
    }

    pub fn hr_baseline(&self) -> f64 {
        match self.hr_baseline_value {
            Some(value) if value.is_finite() => clamp(value, 0.0, 100.0),
            _ => DEFAULT_HR_BASELINE,
        }
    }

    pub fn average_vr(&self) -> f64 {
        match self.average_vr {
            Some(value) if value.is_finite() => clamp(value, 0.0, 100.0),
            _ => sector_average_vr(&self.sector_name),
        }
    }
}

/// Published sector VR averages, keyed by both the market-data sector names
/// and the coarser configuration sector names.
pub fn sector_average_vr(sector_name: &str) -> f64 {
    match sector_name.trim().to_ascii_lowercase().replace(' ', "_").as_str() {
        "technology" => 65.0,
        "financial_services" | "financial" => 55.0,
        "healthcare" => 52.0,
        "business_services" | "services" => 50.0,
        "retail" | "consumer" => 48.0,
        "manufacturing" | "industrials" => 45.0,
        _ => DEFAULT_AVERAGE_VR,
    }
}

/// Seeded `v1.0` sector table.
pub fn standard_sector_profiles() -> Vec<SectorProfile> {
    use Dimension::*;

    vec![
        SectorProfile::new(
            "Industrials",
            &[
                (DataInfrastructure, 0.16),
                (AiGovernance, 0.10),
                (TechnologyStack, 0.16),
                (TalentSkills, 0.12),
                (LeadershipVision, 0.14),
                (UseCasePortfolio, 0.18),
                (CultureChange, 0.14),
            ],
            72.0,
        ),
        SectorProfile::new(
            "Healthcare",
            &[
                (DataInfrastructure, 0.14),
                (AiGovernance, 0.18),
                (TechnologyStack, 0.12),
                (TalentSkills, 0.12),
                (LeadershipVision, 0.12),
                (UseCasePortfolio, 0.14),
                (CultureChange, 0.18),
            ],
            78.0,
        ),
        SectorProfile::new(
            "Services",
            &[
                (DataInfrastructure, 0.15),
                (AiGovernance, 0.12),
                (TechnologyStack, 0.13),
                (TalentSkills, 0.16),
                (LeadershipVision, 0.14),
                (UseCasePortfolio, 0.16),
                (CultureChange, 0.14),
            ],
            75.0,
        ),
        SectorProfile::new(
            "Consumer",
            &[
                (DataInfrastructure, 0.14),
                (AiGovernance, 0.10),
                (TechnologyStack, 0.14),
                (TalentSkills, 0.12),
                (LeadershipVision, 0.14),
                (UseCasePortfolio, 0.20),
                (CultureChange, 0.16),
            ],
            70.0,
        ),
        SectorProfile::new(
            "Financial",
            &[
                (DataInfrastructure, 0.16),
                (AiGovernance, 0.20),
                (TechnologyStack, 0.14),
                (TalentSkills, 0.12),
                (LeadershipVision, 0.12),
                (UseCasePortfolio, 0.12),
                (CultureChange, 0.14),
            ],
            80.0,
        ),
    ]
}

/// Result of resolving a company's sector against the configured table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorResolution {
    pub profile: SectorProfile,
    pub configured: bool,
}

/// Case-insensitive lookup; unknown sectors get a uniform profile under the
/// requested name so the position factor can still use the name table.
pub fn resolve_sector(profiles: &[SectorProfile], sector: Option<&str>) -> SectorResolution {
    let requested = sector
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_SECTOR);

    match profiles
        .iter()
        .find(|profile| profile.sector_name.eq_ignore_ascii_case(requested))
    {
        Some(profile) => SectorResolution {
            profile: profile.clone(),
            configured: true,
        },
        None => SectorResolution {
            profile: SectorProfile::uniform(requested),
            configured: false,
        },
    }
}
