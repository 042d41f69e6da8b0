use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The seven readiness dimensions every scoring run reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    DataInfrastructure,
    AiGovernance,
    TechnologyStack,
    TalentSkills,
    LeadershipVision,
    UseCasePortfolio,
    CultureChange,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::DataInfrastructure,
        Dimension::AiGovernance,
        Dimension::TechnologyStack,
        Dimension::TalentSkills,
        Dimension::LeadershipVision,
        Dimension::UseCasePortfolio,
        Dimension::CultureChange,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Dimension::DataInfrastructure => "data_infrastructure",
            Dimension::AiGovernance => "ai_governance",
            Dimension::TechnologyStack => "technology_stack",
            Dimension::TalentSkills => "talent_skills",
            Dimension::LeadershipVision => "leadership_vision",
            Dimension::UseCasePortfolio => "use_case_portfolio",
            Dimension::CultureChange => "culture_change",
        }
    }

    /// Position of the dimension inside `Dimension::ALL` and score vectors.
    pub fn index(self) -> usize {
        match self {
            Dimension::DataInfrastructure => 0,
            Dimension::AiGovernance => 1,
            Dimension::TechnologyStack => 2,
            Dimension::TalentSkills => 3,
            Dimension::LeadershipVision => 4,
            Dimension::UseCasePortfolio => 5,
            Dimension::CultureChange => 6,
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|dimension| dimension.label() == value)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical evidence sources. Every evidence item lands in exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceBucket {
    TechnologyHiring,
    InnovationActivity,
    DigitalPresence,
    LeadershipSignals,
    FilingItem1,
    FilingItem1a,
    FilingItem7,
    CultureReviews,
    BoardComposition,
}

impl SourceBucket {
    pub const ALL: [SourceBucket; 9] = [
        SourceBucket::TechnologyHiring,
        SourceBucket::InnovationActivity,
        SourceBucket::DigitalPresence,
        SourceBucket::LeadershipSignals,
        SourceBucket::FilingItem1,
        SourceBucket::FilingItem1a,
        SourceBucket::FilingItem7,
        SourceBucket::CultureReviews,
        SourceBucket::BoardComposition,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SourceBucket::TechnologyHiring => "technology_hiring",
            SourceBucket::InnovationActivity => "innovation_activity",
            SourceBucket::DigitalPresence => "digital_presence",
            SourceBucket::LeadershipSignals => "leadership_signals",
            SourceBucket::FilingItem1 => "filing_item_1",
            SourceBucket::FilingItem1a => "filing_item_1a",
            SourceBucket::FilingItem7 => "filing_item_7",
            SourceBucket::CultureReviews => "culture_reviews",
            SourceBucket::BoardComposition => "board_composition",
        }
    }
}

impl fmt::Display for SourceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single piece of collected evidence.
///
/// Collectors disagree on field names; the intake layer resolves those
/// alternates before an item is built, so every optional field here has
/// exactly one meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Explicit source tag as reported by the collector (`jobs`, `sec_item_1a`, ...).
    #[serde(default)]
    pub source: Option<String>,
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Job function tag attached by a hiring collector, when present.
    #[serde(default)]
    pub job_function: Option<String>,
}

impl EvidenceItem {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_job_function(mut self, function: impl Into<String>) -> Self {
        self.job_function = Some(function.into());
        self
    }

    pub fn published(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }
}

/// Aggregated evidence for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionFeature {
    pub dimension: Dimension,
    pub weighted_signal: f64,
    pub evidence_count: u32,
    pub reliability_weighted: f64,
    pub top_keywords: Vec<String>,
}

impl DimensionFeature {
    pub fn empty(dimension: Dimension) -> Self {
        Self {
            dimension,
            weighted_signal: 0.0,
            evidence_count: 0,
            reliability_weighted: 0.0,
            top_keywords: Vec::new(),
        }
    }
}

/// Rubric output for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub score: f64,
    pub confidence: f64,
    pub evidence_count: u32,
    #[serde(default)]
    pub top_keywords: Vec<String>,
    #[serde(default)]
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub String);

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CompanyId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoringRunId(pub Uuid);

impl ScoringRunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScoringRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScoringRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Company attributes the scoring run needs besides evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company_id: CompanyId,
    #[serde(default)]
    pub sector: Option<String>,
    /// Market-cap rank within the sector, 0.0 (smallest) to 1.0 (largest).
    #[serde(default)]
    pub market_cap_percentile: Option<f64>,
}

impl CompanyProfile {
    pub fn new(company_id: impl Into<String>) -> Self {
        Self {
            company_id: CompanyId(company_id.into()),
            sector: None,
            market_cap_percentile: None,
        }
    }

    pub fn in_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_market_cap_percentile(mut self, percentile: f64) -> Self {
        self.market_cap_percentile = Some(percentile);
        self
    }
}

/// Everything the engine consumes for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyScoringInput {
    pub company: CompanyProfile,
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
    /// Timing multiplier for formula synergy; 1.0 when absent.
    #[serde(default)]
    pub timing_factor: Option<f64>,
}

impl CompanyScoringInput {
    pub fn new(company: CompanyProfile, evidence: Vec<EvidenceItem>) -> Self {
        Self {
            company,
            evidence,
            timing_factor: None,
        }
    }
}

/// Prior scored company used as SEM training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalScore {
    pub company_id: CompanyId,
    pub dimensions: [f64; 7],
    pub composite: f64,
}

pub(crate) fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return lo;
    }
    value.max(lo).min(hi)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
