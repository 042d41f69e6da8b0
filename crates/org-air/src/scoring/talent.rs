//! Talent concentration: HHI over job-function shares of hiring signals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{clamp, EvidenceItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobFunction {
    DataEngineering,
    MlEngineering,
    DataScience,
    Analytics,
    AiResearch,
    SoftwareEngineering,
    Other,
}

impl JobFunction {
    pub fn ordered() -> [JobFunction; 7] {
        [
            JobFunction::DataEngineering,
            JobFunction::MlEngineering,
            JobFunction::DataScience,
            JobFunction::Analytics,
            JobFunction::AiResearch,
            JobFunction::SoftwareEngineering,
            JobFunction::Other,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            JobFunction::DataEngineering => "data_engineering",
            JobFunction::MlEngineering => "ml_engineering",
            JobFunction::DataScience => "data_science",
            JobFunction::Analytics => "analytics",
            JobFunction::AiResearch => "ai_research",
            JobFunction::SoftwareEngineering => "software_engineering",
            JobFunction::Other => "other",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ordered()
            .into_iter()
            .find(|function| function.label() == normalized)
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            JobFunction::DataEngineering => &["data engineer", "etl", "pipeline", "spark", "dbt"],
            JobFunction::MlEngineering => &[
                "ml engineer",
                "machine learning engineer",
                "mlops",
                "model deployment",
            ],
            JobFunction::DataScience => &["data scientist", "research scientist", "applied scientist"],
            JobFunction::Analytics => &["data analyst", "business analyst", "analytics", "bi analyst"],
            JobFunction::AiResearch => &[
                "ai researcher",
                "research",
                "nlp",
                "computer vision",
                "deep learning",
            ],
            JobFunction::SoftwareEngineering => &["software engineer", "backend", "platform engineer"],
            JobFunction::Other => &[],
        }
    }
}

/// First function in precedence order with a keyword in `text`.
pub fn classify_job_function(text: &str) -> JobFunction {
    let lowered = text.to_lowercase();
    JobFunction::ordered()
        .into_iter()
        .find(|function| {
            function
                .keywords()
                .iter()
                .any(|keyword| lowered.contains(keyword))
        })
        .unwrap_or(JobFunction::Other)
}

/// Explicit tag wins over the posting body.
pub fn function_for(item: &EvidenceItem) -> JobFunction {
    if let Some(tag) = item.job_function.as_deref().filter(|tag| !tag.trim().is_empty()) {
        return JobFunction::from_label(tag).unwrap_or_else(|| classify_job_function(tag));
    }
    let body = match &item.title {
        Some(title) => format!("{title} {}", item.text),
        None => item.text.clone(),
    };
    classify_job_function(&body)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TalentPenaltyConfig {
    pub hhi_threshold_mild: f64,
    pub hhi_threshold_severe: f64,
    pub penalty_factor_mild: f64,
    pub penalty_factor_severe: f64,
    pub min_sample_size: u32,
}

impl Default for TalentPenaltyConfig {
    fn default() -> Self {
        Self {
            hhi_threshold_mild: 0.40,
            hhi_threshold_severe: 0.70,
            penalty_factor_mild: 0.95,
            penalty_factor_severe: 0.85,
            min_sample_size: 15,
        }
    }
}

impl TalentPenaltyConfig {
    fn mild_factor(&self) -> f64 {
        clamp(self.penalty_factor_mild, 0.0, 1.0)
    }

    /// Never more lenient than the mild factor.
    fn severe_factor(&self) -> f64 {
        clamp(self.penalty_factor_severe, 0.0, 1.0).min(self.mild_factor())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcentrationLevel {
    InsufficientSample,
    Diversified,
    Mild,
    Severe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalentConcentration {
    pub sample_size: u32,
    pub function_counts: BTreeMap<JobFunction, u32>,
    pub hhi: f64,
    pub level: ConcentrationLevel,
    pub penalty_factor: f64,
    /// Stored penalty, `1 - penalty_factor`.
    pub talent_penalty: f64,
    pub talent_risk_adjustment: f64,
}

/// Σ share²; zero for an empty sample.
pub fn hhi<'a, I>(counts: I) -> f64
where
    I: IntoIterator<Item = &'a u32>,
{
    let counts: Vec<f64> = counts.into_iter().map(|count| f64::from(*count)).collect();
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    clamp(counts.iter().map(|count| (count / total).powi(2)).sum(), 0.0, 1.0)
}

pub fn penalty_factor(hhi: f64, sample_size: u32, config: &TalentPenaltyConfig) -> (f64, ConcentrationLevel) {
    if sample_size < config.min_sample_size {
        return (1.0, ConcentrationLevel::InsufficientSample);
    }
    if hhi >= config.hhi_threshold_severe {
        (config.severe_factor(), ConcentrationLevel::Severe)
    } else if hhi >= config.hhi_threshold_mild {
        (config.mild_factor(), ConcentrationLevel::Mild)
    } else {
        (1.0, ConcentrationLevel::Diversified)
    }
}

/// Continuous complement of the banded penalty.
pub fn talent_risk_adjustment(hhi: f64) -> f64 {
    clamp(1.0 - 0.15 * (hhi - 0.25).max(0.0), 0.0, 1.0)
}

pub fn assess_counts(
    function_counts: BTreeMap<JobFunction, u32>,
    config: &TalentPenaltyConfig,
) -> TalentConcentration {
    let sample_size = function_counts.values().sum();
    let hhi = hhi(function_counts.values());
    let (penalty_factor, level) = penalty_factor(hhi, sample_size, config);
    TalentConcentration {
        sample_size,
        function_counts,
        hhi,
        level,
        penalty_factor,
        talent_penalty: 1.0 - penalty_factor,
        talent_risk_adjustment: talent_risk_adjustment(hhi),
    }
}

pub fn assess<'a, I>(signals: I, config: &TalentPenaltyConfig) -> TalentConcentration
where
    I: IntoIterator<Item = &'a EvidenceItem>,
{
    let mut counts: BTreeMap<JobFunction, u32> = BTreeMap::new();
    for item in signals {
        *counts.entry(function_for(item)).or_insert(0) += 1;
    }
    assess_counts(counts, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_follows_precedence() {
        assert_eq!(classify_job_function("Senior Data Engineer (Spark)"), JobFunction::DataEngineering);
        assert_eq!(classify_job_function("MLOps Engineer"), JobFunction::MlEngineering);
        assert_eq!(classify_job_function("Applied Scientist, NLP"), JobFunction::DataScience);
        assert_eq!(classify_job_function("Backend developer"), JobFunction::SoftwareEngineering);
        assert_eq!(classify_job_function("Store manager"), JobFunction::Other);
    }

    #[test]
    fn explicit_tag_wins() {
        let item = EvidenceItem::new("jobs", "Data Engineer building pipelines")
            .with_job_function("Data Science");
        assert_eq!(function_for(&item), JobFunction::DataScience);
    }

    #[test]
    fn concentrated_sample_takes_severe_factor() {
        let mut counts = BTreeMap::new();
        counts.insert(JobFunction::DataEngineering, 9);
        counts.insert(JobFunction::Other, 1);
        let config = TalentPenaltyConfig {
            min_sample_size: 10,
            ..TalentPenaltyConfig::default()
        };
        let result = assess_counts(counts, &config);
        assert!((result.hhi - 0.82).abs() < 1e-12);
        assert!(result.hhi > config.hhi_threshold_severe);
        assert_eq!(result.level, ConcentrationLevel::Severe);
        assert_eq!(result.penalty_factor, config.penalty_factor_severe);
        assert!((result.talent_penalty - 0.15).abs() < 1e-12);
    }

    #[test]
    fn small_sample_is_not_penalized() {
        let mut counts = BTreeMap::new();
        counts.insert(JobFunction::DataEngineering, 9);
        counts.insert(JobFunction::Other, 1);
        let result = assess_counts(counts, &TalentPenaltyConfig::default());
        assert_eq!(result.level, ConcentrationLevel::InsufficientSample);
        assert_eq!(result.penalty_factor, 1.0);
    }

    #[test]
    fn empty_sample_has_zero_hhi() {
        let result = assess(std::iter::empty(), &TalentPenaltyConfig::default());
        assert_eq!(result.hhi, 0.0);
        assert_eq!(result.sample_size, 0);
        assert_eq!(result.talent_risk_adjustment, 1.0);
    }

    #[test]
    fn misordered_factors_are_repaired() {
        let config = TalentPenaltyConfig {
            penalty_factor_severe: 0.99,
            penalty_factor_mild: 0.9,
            min_sample_size: 1,
            ..TalentPenaltyConfig::default()
        };
        assert_eq!(penalty_factor(0.9, 20, &config).0, 0.9);
    }
}
