use chrono::{TimeZone, Utc};
use org_air::intake::{EvidenceImportError, EvidenceImporter};

#[test]
fn importer_resolves_alternate_columns() {
    let csv = "\u{feff}Ticker,Signal Type,Content Text,Source URL,Collected At,Team\n\
nvda,jobs,Hiring ML engineers for inference,https://jobs.example/1,2025-09-24,ml_engineering\n\
NVDA,sec_item_1a,Model risk governance overseen by audit,,2025-09-01T08:00:00Z,\n\
jpm,news,CEO outlines AI roadmap,https://news.example/2,not a date,\n";

    let import = EvidenceImporter::from_reader(csv.as_bytes()).expect("import succeeds");

    assert_eq!(import.companies.len(), 2);
    assert_eq!(import.skipped_rows, 0);

    let nvda = &import.companies[0];
    assert_eq!(nvda.company_id, "NVDA");
    assert_eq!(nvda.items.len(), 2);
    let posting = &nvda.items[0];
    assert_eq!(posting.source.as_deref(), Some("jobs"));
    assert_eq!(posting.text, "Hiring ML engineers for inference");
    assert_eq!(posting.url.as_deref(), Some("https://jobs.example/1"));
    assert_eq!(posting.job_function.as_deref(), Some("ml_engineering"));
    assert_eq!(
        posting.published_at,
        Utc.with_ymd_and_hms(2025, 9, 24, 0, 0, 0).single()
    );
    assert!(nvda.items[1].url.is_none());
    assert!(nvda.items[1].job_function.is_none());

    let jpm = &import.companies[1];
    assert_eq!(jpm.company_id, "JPM");
    assert!(jpm.items[0].published_at.is_none());
}

#[test]
fn preferred_columns_win_when_both_are_present() {
    let csv = "company_id,ticker,source_bucket,source,text,body\n\
WMT,IGNORED,technology_hiring,jobs,Primary text,Fallback body\n\
DG,,,news,,Fallback body only\n";

    let import = EvidenceImporter::from_reader(csv.as_bytes()).expect("import succeeds");

    let wmt = &import.companies[0];
    assert_eq!(wmt.company_id, "WMT");
    assert_eq!(wmt.items[0].source.as_deref(), Some("technology_hiring"));
    assert_eq!(wmt.items[0].text, "Primary text");

    let dg = &import.companies[1];
    assert_eq!(dg.items[0].source.as_deref(), Some("news"));
    assert_eq!(dg.items[0].text, "Fallback body only");
}

#[test]
fn incomplete_rows_are_counted_not_fatal() {
    let csv = "ticker,text\n,orphan evidence\nGE,\nGE,Predictive maintenance models\n";
    let import = EvidenceImporter::from_reader(csv.as_bytes()).expect("import succeeds");
    assert_eq!(import.skipped_rows, 2);
    assert_eq!(import.item_count(), 1);
}

#[test]
fn importer_from_path_propagates_io_errors() {
    let error = EvidenceImporter::from_path("./no-such-export.csv").expect_err("expected io error");
    assert!(matches!(error, EvidenceImportError::Io(_)));
    assert!(error.to_string().starts_with("failed to read evidence export"));
}
