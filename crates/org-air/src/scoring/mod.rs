//! Organizational AI-readiness scoring.
//!
//! Evidence flows through the mapper and rubric into seven dimension scores,
//! which the sector VR aggregator, HR adjuster, synergy calculator, and talent
//! penalty combine into a composite. The SEM estimator puts a confidence band
//! around it. [`ScoringEngine`] runs that pipeline for one company;
//! [`ScoringService`] runs batches with persistence and an audit trail.

pub mod audit;
pub mod composite;
pub mod config;
pub mod domain;
pub mod engine;
pub mod evidence;
pub mod hr;
pub mod portfolio;
pub mod repository;
pub mod router;
pub mod rubric;
pub mod run;
pub mod sector;
pub mod sem;
pub mod service;
pub mod synergy;
pub mod talent;
pub mod vr;

#[cfg(test)]
mod tests;

pub use audit::{AuditRecord, AuditStep};
pub use composite::{BandScheme, CompositeFormula, ScoreBand};
pub use config::{ModelVersion, ScoringConfig, ScoringConfigError};
pub use domain::{
    CompanyId, CompanyProfile, CompanyScoringInput, Dimension, DimensionScore, EvidenceItem,
    HistoricalScore, ScoringRunId, SourceBucket,
};
pub use engine::{CompanyScoring, DimensionPreview, ScoringContext, ScoringEngine, ScoringError};
pub use repository::{AuditError, AuditLog, RepositoryError, RunRepository, ScoreRepository};
pub use router::scoring_router;
pub use run::{OrgAirScore, RunStatus, ScoreSummary, ScoringRun};
pub use sem::{SemEstimate, SemMethod};
pub use service::{CompanyFailure, RunSummary, ScoringService, ScoringServiceError};
