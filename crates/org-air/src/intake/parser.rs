use std::io::Read;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use super::fields::{ColumnMap, Field};
use super::normalizer::normalize_company;
use crate::scoring::domain::EvidenceItem;

#[derive(Debug)]
pub(crate) struct EvidenceRecord {
    pub(crate) company_id: String,
    pub(crate) item: EvidenceItem,
}

#[derive(Debug, Default)]
pub(crate) struct ParsedRows {
    pub(crate) records: Vec<EvidenceRecord>,
    pub(crate) skipped_rows: usize,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<ParsedRows, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let columns = ColumnMap::from_headers(csv_reader.headers()?.iter());
    for field in [Field::Company, Field::Text] {
        if !columns.has(field) {
            warn!(field = ?field, "evidence export has no column for a required field");
        }
    }
    let mut parsed = ParsedRows::default();

    for record in csv_reader.records() {
        let record = record?;
        match build_record(&columns, &record) {
            Some(evidence) => parsed.records.push(evidence),
            None => parsed.skipped_rows += 1,
        }
    }

    Ok(parsed)
}

fn build_record(columns: &ColumnMap, record: &csv::StringRecord) -> Option<EvidenceRecord> {
    let company_id = columns
        .value(record, Field::Company)
        .map(normalize_company)
        .filter(|company| !company.is_empty())?;
    let text = columns.value(record, Field::Text)?;

    let owned = |field| columns.value(record, field).map(str::to_string);
    Some(EvidenceRecord {
        company_id,
        item: EvidenceItem {
            source: owned(Field::Source),
            text: text.to_string(),
            title: owned(Field::Title),
            url: owned(Field::Url),
            published_at: columns
                .value(record, Field::Timestamp)
                .and_then(parse_timestamp),
            job_function: owned(Field::JobFunction),
        },
    })
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Cursor;

    #[test]
    fn timestamps_accept_rfc3339_and_dates() {
        assert_eq!(
            parse_timestamp("2025-09-24T10:00:00+02:00"),
            Utc.with_ymd_and_hms(2025, 9, 24, 8, 0, 0).single()
        );
        assert_eq!(
            parse_timestamp("2025-09-30"),
            Utc.with_ymd_and_hms(2025, 9, 30, 0, 0, 0).single()
        );
        assert!(parse_timestamp("  ").is_none());
        assert!(parse_timestamp("last tuesday").is_none());
    }

    #[test]
    fn rows_without_company_or_text_are_skipped() {
        let csv = "ticker,signal_type,content_text\n\
nvda,jobs,Hiring ML engineers\n\
,jobs,No company here\n\
DG,news,\n";
        let parsed = parse_records(Cursor::new(csv)).expect("parse");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped_rows, 2);
        assert_eq!(parsed.records[0].company_id, "NVDA");
        assert_eq!(parsed.records[0].item.source.as_deref(), Some("jobs"));
    }

    #[test]
    fn unparseable_timestamp_is_dropped_not_fatal() {
        let csv = "company_id,text,published_at\nGE,Turbine analytics rollout,soon\n";
        let parsed = parse_records(Cursor::new(csv)).expect("parse");
        assert_eq!(parsed.records.len(), 1);
        assert!(parsed.records[0].item.published_at.is_none());
    }
}
