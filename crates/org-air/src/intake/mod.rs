//! Collector CSV exports into grouped evidence.

mod fields;
mod normalizer;
mod parser;

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::scoring::domain::{CompanyProfile, CompanyScoringInput, EvidenceItem};

#[derive(Debug)]
pub enum EvidenceImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for EvidenceImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvidenceImportError::Io(err) => write!(f, "failed to read evidence export: {}", err),
            EvidenceImportError::Csv(err) => write!(f, "invalid evidence CSV data: {}", err),
        }
    }
}

impl std::error::Error for EvidenceImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EvidenceImportError::Io(err) => Some(err),
            EvidenceImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for EvidenceImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for EvidenceImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Evidence for one company, in file order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyEvidence {
    pub company_id: String,
    pub items: Vec<EvidenceItem>,
}

impl CompanyEvidence {
    pub fn into_input(self, sector: Option<&str>) -> CompanyScoringInput {
        let mut profile = CompanyProfile::new(self.company_id);
        if let Some(sector) = sector {
            profile = profile.in_sector(sector);
        }
        CompanyScoringInput::new(profile, self.items)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvidenceImport {
    /// Companies in first-seen order.
    pub companies: Vec<CompanyEvidence>,
    pub skipped_rows: usize,
}

impl EvidenceImport {
    pub fn item_count(&self) -> usize {
        self.companies.iter().map(|company| company.items.len()).sum()
    }
}

pub struct EvidenceImporter;

impl EvidenceImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<EvidenceImport, EvidenceImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<EvidenceImport, EvidenceImportError> {
        let parsed = parser::parse_records(reader)?;
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut companies: Vec<CompanyEvidence> = Vec::new();

        for record in parsed.records {
            let position = *positions
                .entry(record.company_id.clone())
                .or_insert_with(|| {
                    companies.push(CompanyEvidence {
                        company_id: record.company_id.clone(),
                        items: Vec::new(),
                    });
                    companies.len() - 1
                });
            companies[position].items.push(record.item);
        }

        let import = EvidenceImport {
            companies,
            skipped_rows: parsed.skipped_rows,
        };
        debug!(
            companies = import.companies.len(),
            items = import.item_count(),
            skipped = import.skipped_rows,
            "evidence import parsed"
        );
        Ok(import)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn groups_rows_by_company_in_first_seen_order() {
        let csv = "ticker,source,text\n\
dg,news,Store openings\n\
NVDA,jobs,ML engineer\n\
DG,glassdoor_reviews,Culture of learning\n";
        let import = EvidenceImporter::from_reader(Cursor::new(csv)).expect("import succeeds");

        let ids: Vec<&str> = import
            .companies
            .iter()
            .map(|company| company.company_id.as_str())
            .collect();
        assert_eq!(ids, vec!["DG", "NVDA"]);
        assert_eq!(import.companies[0].items.len(), 2);
        assert_eq!(import.item_count(), 3);
        assert_eq!(import.skipped_rows, 0);
    }

    #[test]
    fn into_input_carries_sector() {
        let evidence = CompanyEvidence {
            company_id: "JPM".to_string(),
            items: vec![EvidenceItem::new("news", "AI fraud detection")],
        };
        let input = evidence.into_input(Some("Financial"));
        assert_eq!(input.company.company_id.0, "JPM");
        assert_eq!(input.company.sector.as_deref(), Some("Financial"));
        assert_eq!(input.evidence.len(), 1);
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let error = EvidenceImporter::from_path("./does-not-exist.csv").expect_err("io error");
        match error {
            EvidenceImportError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
