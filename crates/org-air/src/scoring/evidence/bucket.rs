use std::collections::HashMap;
use std::sync::OnceLock;

use crate::scoring::domain::{EvidenceItem, SourceBucket};

static SOURCE_ALIASES: OnceLock<HashMap<&'static str, SourceBucket>> = OnceLock::new();

fn source_aliases() -> &'static HashMap<&'static str, SourceBucket> {
    SOURCE_ALIASES.get_or_init(|| {
        const ALIASES: &[(&str, SourceBucket)] = &[
            ("technology_hiring", SourceBucket::TechnologyHiring),
            ("jobs", SourceBucket::TechnologyHiring),
            ("job_posting", SourceBucket::TechnologyHiring),
            ("job_postings", SourceBucket::TechnologyHiring),
            ("innovation_activity", SourceBucket::InnovationActivity),
            ("patents", SourceBucket::InnovationActivity),
            ("digital_presence", SourceBucket::DigitalPresence),
            ("tech", SourceBucket::DigitalPresence),
            ("leadership_signals", SourceBucket::LeadershipSignals),
            ("news", SourceBucket::LeadershipSignals),
            ("filing_item_1", SourceBucket::FilingItem1),
            ("sec_item_1", SourceBucket::FilingItem1),
            ("filing_item_1a", SourceBucket::FilingItem1a),
            ("sec_item_1a", SourceBucket::FilingItem1a),
            ("filing_item_7", SourceBucket::FilingItem7),
            ("sec_item_7", SourceBucket::FilingItem7),
            ("culture_reviews", SourceBucket::CultureReviews),
            ("glassdoor_reviews", SourceBucket::CultureReviews),
            ("board_composition", SourceBucket::BoardComposition),
            ("10k", SourceBucket::FilingItem1),
            ("10_k", SourceBucket::FilingItem1),
        ];
        ALIASES.iter().copied().collect()
    })
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

/// Substring rules for labels that are not in the alias table. Order matters:
/// filing sections are checked before the generic filing markers.
fn heuristic_bucket(haystack: &str) -> Option<SourceBucket> {
    let t = haystack;
    if t.contains("item 1a") {
        return Some(SourceBucket::FilingItem1a);
    }
    if t.contains("item 7") && !t.contains("item 7a") {
        return Some(SourceBucket::FilingItem7);
    }
    if t.contains("item 1") && !t.contains("item 1a") {
        return Some(SourceBucket::FilingItem1);
    }
    if t.contains("glassdoor") && t.contains("review") {
        return Some(SourceBucket::CultureReviews);
    }
    if t.contains("board") && (t.contains("composition") || t.contains("proxy")) {
        return Some(SourceBucket::BoardComposition);
    }
    if t.contains("10-k") || t.contains("10k") || t.contains("10-q") || t.contains("10 q") {
        return Some(SourceBucket::FilingItem1);
    }
    if t.contains("job") || t.contains("hiring") {
        return Some(SourceBucket::TechnologyHiring);
    }
    if t.contains("patent") || t.contains("innovation") {
        return Some(SourceBucket::InnovationActivity);
    }
    if t.contains("tech") || t.contains("stack") || t.contains("digital") {
        return Some(SourceBucket::DigitalPresence);
    }
    None
}

/// Resolve the canonical bucket for an item: alias table on the explicit tag,
/// then substring rules on the tag, then on title and text.
/// Items that match nothing are leadership signals.
pub fn infer_bucket(item: &EvidenceItem) -> SourceBucket {
    if let Some(tag) = item.source.as_deref().filter(|tag| !tag.trim().is_empty()) {
        if let Some(bucket) = source_aliases().get(normalize_tag(tag).as_str()) {
            return *bucket;
        }
        let spaced = tag.trim().to_ascii_lowercase().replace('_', " ");
        if let Some(bucket) = heuristic_bucket(&spaced) {
            return bucket;
        }
    }

    let mut body = String::new();
    if let Some(title) = &item.title {
        body.push_str(&title.to_ascii_lowercase());
        body.push(' ');
    }
    body.push_str(&item.text.to_ascii_lowercase());

    heuristic_bucket(&body).unwrap_or(SourceBucket::LeadershipSignals)
}
