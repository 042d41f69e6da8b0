//! Evidence mapping: raw items to per-dimension aggregate features.
//!
//! Each item is matched against the keyword taxonomy once per dimension. Every
//! (item, dimension) pair with at least one keyword hit counts toward the
//! item's source bucket. Bucket counts are then spread across dimensions using
//! the source profile matrix, discounted by source reliability.

mod bucket;
mod profiles;
mod taxonomy;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::domain::{Dimension, DimensionFeature, EvidenceItem, SourceBucket};

pub use bucket::infer_bucket;
pub use profiles::{standard_source_profiles, SourceProfile, SourceProfileTable};

const TOP_KEYWORDS: usize = 5;

/// Keyword hits accumulated for one source bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcePayload {
    pub count: u32,
    pub keywords: BTreeMap<String, u32>,
}

/// Mapper output: bucket payloads plus exactly one feature per dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceMapping {
    pub payloads: BTreeMap<SourceBucket, SourcePayload>,
    pub features: Vec<DimensionFeature>,
}

impl EvidenceMapping {
    pub fn feature(&self, dimension: Dimension) -> Option<&DimensionFeature> {
        self.features
            .iter()
            .find(|feature| feature.dimension == dimension)
    }
}

/// Per-dimension explainability row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionCoverage {
    pub dimension: Dimension,
    pub has_evidence: bool,
    pub source_count: usize,
    pub weighted_signal: f64,
    pub reliability_weighted: f64,
}

pub fn map_evidence(items: &[EvidenceItem], profiles: &SourceProfileTable) -> EvidenceMapping {
    let payloads = build_source_payloads(items);
    let features = map_features(&payloads, profiles);
    EvidenceMapping { payloads, features }
}

pub fn build_source_payloads(items: &[EvidenceItem]) -> BTreeMap<SourceBucket, SourcePayload> {
    let mut payloads: BTreeMap<SourceBucket, SourcePayload> = BTreeMap::new();

    for item in items {
        let lowered = item.text.to_lowercase();
        let mut bucket = None;

        for dimension in Dimension::ALL {
            let hits = taxonomy::matched_keywords(&lowered, dimension);
            if hits.is_empty() {
                continue;
            }
            let bucket = *bucket.get_or_insert_with(|| infer_bucket(item));
            let payload = payloads.entry(bucket).or_default();
            payload.count += 1;
            for keyword in hits {
                *payload.keywords.entry(keyword.to_string()).or_insert(0) += 1;
            }
        }
    }

    payloads
}

#[derive(Default)]
struct FeatureAccumulator {
    weighted_signal: f64,
    exposure: f64,
    evidence_count: u32,
    keywords: BTreeMap<String, u32>,
}

pub fn map_features(
    payloads: &BTreeMap<SourceBucket, SourcePayload>,
    profiles: &SourceProfileTable,
) -> Vec<DimensionFeature> {
    let mut acc: BTreeMap<Dimension, FeatureAccumulator> = BTreeMap::new();

    for (bucket, payload) in payloads {
        let Some(profile) = profiles.get(bucket) else {
            continue;
        };
        let reliability = profile.clamped_reliability();
        let count = f64::from(payload.count);

        for (dimension, weight) in profile.normalized_weights() {
            let entry = acc.entry(dimension).or_default();
            entry.weighted_signal += count * weight * reliability;
            entry.exposure += count * weight;
            entry.evidence_count += payload.count;
            for (keyword, frequency) in &payload.keywords {
                *entry.keywords.entry(keyword.clone()).or_insert(0) += frequency;
            }
        }
    }

    Dimension::ALL
        .into_iter()
        .map(|dimension| match acc.remove(&dimension) {
            Some(entry) => DimensionFeature {
                dimension,
                weighted_signal: entry.weighted_signal,
                evidence_count: entry.evidence_count,
                reliability_weighted: if entry.exposure > 0.0 {
                    (entry.weighted_signal / entry.exposure).clamp(0.0, 1.0)
                } else {
                    0.0
                },
                top_keywords: top_keywords(entry.keywords),
            },
            None => DimensionFeature::empty(dimension),
        })
        .collect()
}

fn top_keywords(frequencies: BTreeMap<String, u32>) -> Vec<String> {
    let mut ranked: Vec<(String, u32)> = frequencies.into_iter().collect();
    // BTreeMap order is alphabetical and the sort is stable, so ties stay alphabetical.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(TOP_KEYWORDS)
        .map(|(keyword, _)| keyword)
        .collect()
}

pub fn coverage_report(
    mapping: &EvidenceMapping,
    profiles: &SourceProfileTable,
) -> Vec<DimensionCoverage> {
    let mut sources: BTreeMap<Dimension, BTreeSet<SourceBucket>> = BTreeMap::new();
    for (bucket, payload) in &mapping.payloads {
        if payload.count == 0 {
            continue;
        }
        if let Some(profile) = profiles.get(bucket) {
            for dimension in profile.normalized_weights().into_keys() {
                sources.entry(dimension).or_default().insert(*bucket);
            }
        }
    }

    mapping
        .features
        .iter()
        .map(|feature| {
            let source_count = sources
                .get(&feature.dimension)
                .map(BTreeSet::len)
                .unwrap_or(0);
            DimensionCoverage {
                dimension: feature.dimension,
                has_evidence: source_count > 0,
                source_count,
                weighted_signal: feature.weighted_signal,
                reliability_weighted: feature.reliability_weighted,
            }
        })
        .collect()
}
