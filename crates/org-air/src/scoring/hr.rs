//! Hiring-intensity adjustment and the HR score used by the blended model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{clamp, Dimension, DimensionScore, EvidenceItem, SourceBucket};
use super::evidence::infer_bucket;

/// Sector baseline that maps to a normalization of 1.0.
pub const HR_ANCHOR: f64 = 75.0;
pub const POSITION_FACTOR_WEIGHT: f64 = 0.15;
/// Longest accepted hiring window, one hundred years.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HrParams {
    pub window_days: i64,
    pub min_signals: u32,
}

impl HrParams {
    pub fn window_is_valid(window_days: i64) -> bool {
        (1..=MAX_WINDOW_DAYS).contains(&window_days)
    }
}

impl Default for HrParams {
    fn default() -> Self {
        Self {
            window_days: 365,
            min_signals: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HrMethod {
    JobsProxy,
    Neutral,
}

impl HrMethod {
    pub fn label(self) -> &'static str {
        match self {
            HrMethod::JobsProxy => "jobs_proxy",
            HrMethod::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrAdjustment {
    pub hiring_signals: u32,
    pub portfolio_average: f64,
    pub intensity: Option<f64>,
    pub baseline: f64,
    pub baseline_norm: f64,
    pub hr_factor: f64,
    pub method: HrMethod,
    pub window_days: i64,
}

/// Evidence items that land in the hiring bucket and fall inside the window.
/// Undated postings are counted. A window reaching past the representable
/// calendar has no lower bound.
pub fn hiring_signals<'a>(
    items: &'a [EvidenceItem],
    as_of: DateTime<Utc>,
    window_days: i64,
) -> impl Iterator<Item = &'a EvidenceItem> {
    let window_start = window_start(as_of, window_days);
    items.iter().filter(move |item| {
        infer_bucket(item) == SourceBucket::TechnologyHiring
            && item
                .published_at
                .map(|at| window_start.map_or(true, |start| at >= start) && at <= as_of)
                .unwrap_or(true)
    })
}

fn window_start(as_of: DateTime<Utc>, window_days: i64) -> Option<DateTime<Utc>> {
    Duration::try_days(window_days.max(0)).and_then(|span| as_of.checked_sub_signed(span))
}

pub fn count_hiring_signals(items: &[EvidenceItem], as_of: DateTime<Utc>, window_days: i64) -> u32 {
    let count = hiring_signals(items, as_of, window_days).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Mean signal count over companies that posted at least once.
pub fn portfolio_average<I>(counts: I) -> f64
where
    I: IntoIterator<Item = u32>,
{
    let (total, companies) = counts
        .into_iter()
        .filter(|count| *count > 0)
        .fold((0.0, 0usize), |(total, n), count| {
            (total + f64::from(count), n + 1)
        });
    if companies == 0 {
        0.0
    } else {
        total / companies as f64
    }
}

pub fn compute_hr_factor(
    hiring_signals: u32,
    portfolio_average: f64,
    baseline: f64,
    params: &HrParams,
) -> HrAdjustment {
    let baseline = if baseline.is_finite() {
        clamp(baseline, 0.0, 100.0)
    } else {
        HR_ANCHOR
    };
    let baseline_norm = clamp(baseline / HR_ANCHOR, 0.7, 1.3);

    let neutral = HrAdjustment {
        hiring_signals,
        portfolio_average,
        intensity: None,
        baseline,
        baseline_norm,
        hr_factor: 1.0,
        method: HrMethod::Neutral,
        window_days: params.window_days,
    };

    if hiring_signals < params.min_signals
        || !portfolio_average.is_finite()
        || portfolio_average <= 0.0
    {
        return neutral;
    }

    let intensity = f64::from(hiring_signals) / portfolio_average;
    let hr_factor = clamp(1.0 + 0.5 * (intensity - 1.0) / baseline_norm, 0.0, 2.0);

    HrAdjustment {
        intensity: Some(intensity),
        hr_factor,
        method: HrMethod::JobsProxy,
        ..neutral
    }
}

/// Scale the talent dimension in place. Every other dimension is left alone.
pub fn apply_to_talent(scores: &mut [DimensionScore], hr_factor: f64) {
    for score in scores
        .iter_mut()
        .filter(|score| score.dimension == Dimension::TalentSkills)
    {
        let before = score.score;
        score.score = clamp(before * hr_factor, 0.0, 100.0);
        score
            .reasons
            .push(format!("hr_factor {hr_factor:.3} applied: {before:.2} → {:.2}", score.score));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFactor {
    pub vr_component: f64,
    pub market_cap_component: f64,
    pub value: f64,
}

pub fn position_factor(vr: f64, sector_average_vr: f64, market_cap_percentile: f64) -> PositionFactor {
    let vr_component = clamp((vr - sector_average_vr) / 50.0, -1.0, 1.0);
    let percentile = if market_cap_percentile.is_finite() {
        market_cap_percentile
    } else {
        0.5
    };
    let market_cap_component = clamp((percentile - 0.5) * 2.0, -1.0, 1.0);
    PositionFactor {
        vr_component,
        market_cap_component,
        value: clamp(0.6 * vr_component + 0.4 * market_cap_component, -1.0, 1.0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrScore {
    pub hr_base: f64,
    pub position_factor: PositionFactor,
    pub score: f64,
}

/// `hr_base × (1 + 0.15 × position_factor)`, with `hr_base` the sector
/// baseline scaled by the hiring factor.
pub fn hr_score(baseline: f64, hr_factor: f64, position: PositionFactor) -> HrScore {
    let hr_base = clamp(baseline * hr_factor, 0.0, 100.0);
    HrScore {
        hr_base,
        position_factor: position,
        score: clamp(hr_base * (1.0 + POSITION_FACTOR_WEIGHT * position.value), 0.0, 100.0),
    }
}
