use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::composite::{BandScheme, CompositeFormula};
use super::evidence::{standard_source_profiles, SourceProfileTable};
use super::hr::{HrParams, MAX_WINDOW_DAYS};
use super::rubric::{standard_rubric_bands, RubricBands};
use super::sector::{standard_sector_profiles, SectorProfile};
use super::sem::SemParams;
use super::synergy::{standard_synergy_rules, SynergyRule, DEFAULT_SYNERGY_CAP};
use super::talent::TalentPenaltyConfig;
use super::vr::DispersionPenalty;

pub const STANDARD_CONFIG_VERSION: &str = "v1.0";

/// Read-only tables for one scoring run. Any table left out of a JSON
/// document falls back to the standard one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub version: String,
    pub sectors: Vec<SectorProfile>,
    pub synergy_rules: Vec<SynergyRule>,
    pub synergy_cap: f64,
    pub talent_penalty: TalentPenaltyConfig,
    pub source_profiles: SourceProfileTable,
    pub rubric_bands: RubricBands,
    pub dispersion: DispersionPenalty,
    pub hr: HrParams,
    pub sem: SemParams,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl ScoringConfig {
    pub fn standard() -> Self {
        Self {
            version: STANDARD_CONFIG_VERSION.to_string(),
            sectors: standard_sector_profiles(),
            synergy_rules: standard_synergy_rules(),
            synergy_cap: DEFAULT_SYNERGY_CAP,
            talent_penalty: TalentPenaltyConfig::default(),
            source_profiles: standard_source_profiles(),
            rubric_bands: standard_rubric_bands(),
            dispersion: DispersionPenalty::default(),
            hr: HrParams::default(),
            sem: SemParams::default(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ScoringConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        if !HrParams::window_is_valid(self.hr.window_days) {
            return Err(ScoringConfigError::InvalidHrWindow(self.hr.window_days));
        }
        Ok(())
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, ScoringConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ScoringConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}

/// Scoring model generation. Each version binds one composite formula and
/// one band scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelVersion {
    /// Talent multiplier, rule synergy bonus, `(VR + bonus) × penalty`.
    #[serde(rename = "org-air-v1")]
    V1,
    /// HR blend, formula synergy, penalized VR in the blended composite.
    #[default]
    #[serde(rename = "org-air-v2")]
    V2,
}

impl ModelVersion {
    pub fn label(self) -> &'static str {
        match self {
            ModelVersion::V1 => "org-air-v1",
            ModelVersion::V2 => "org-air-v2",
        }
    }

    pub fn formula(self) -> CompositeFormula {
        match self {
            ModelVersion::V1 => CompositeFormula::Legacy,
            ModelVersion::V2 => CompositeFormula::blended(),
        }
    }

    pub fn band_scheme(self) -> BandScheme {
        match self {
            ModelVersion::V1 => BandScheme::Verbal,
            ModelVersion::V2 => BandScheme::Quintile,
        }
    }

    /// Whether the hiring factor rescales `talent_skills` before aggregation.
    pub fn applies_talent_multiplier(self) -> bool {
        matches!(self, ModelVersion::V1)
    }

    /// Whether the composite blends a separate HR score.
    pub fn blends_hr(self) -> bool {
        matches!(self, ModelVersion::V2)
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ModelVersion {
    type Err = ScoringConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "org-air-v1" | "v1" => Ok(ModelVersion::V1),
            "org-air-v2" | "v2" => Ok(ModelVersion::V2),
            _ => Err(ScoringConfigError::UnknownModelVersion(value.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringConfigError {
    #[error("failed to read scoring config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scoring config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("hr.window_days must be between 1 and {MAX_WINDOW_DAYS}, got {0}")]
    InvalidHrWindow(i64),
    #[error("unknown model version `{0}` (expected org-air-v1 or org-air-v2)")]
    UnknownModelVersion(String),
}
