use std::collections::HashMap;
use std::sync::OnceLock;

use super::normalizer::normalize_header;

/// Logical evidence fields a collector export can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Field {
    Company,
    Source,
    Text,
    Title,
    Url,
    Timestamp,
    JobFunction,
}

impl Field {
    #[cfg(test)]
    pub(crate) const ALL: [Field; 7] = [
        Field::Company,
        Field::Source,
        Field::Text,
        Field::Title,
        Field::Url,
        Field::Timestamp,
        Field::JobFunction,
    ];
}

static HEADER_ALIASES: OnceLock<HashMap<String, (Field, usize)>> = OnceLock::new();

/// Field and precedence rank (0 wins) for a normalized header.
pub(crate) fn field_for_header(normalized: &str) -> Option<(Field, usize)> {
    header_aliases().get(normalized).copied()
}

fn header_aliases() -> &'static HashMap<String, (Field, usize)> {
    HEADER_ALIASES.get_or_init(|| {
        const ALIASES: &[(Field, &[&str])] = &[
            (Field::Company, &["company_id", "ticker"]),
            (
                Field::Source,
                &["source_bucket", "evidence_type", "signal_type", "filing_type", "source"],
            ),
            (Field::Text, &["text", "content_text", "content", "body"]),
            (Field::Title, &["title", "name"]),
            (Field::Url, &["url", "source_url"]),
            (Field::Timestamp, &["published_at", "collected_at", "created_at"]),
            (Field::JobFunction, &["function", "job_function", "category", "team"]),
        ];

        let mut map = HashMap::new();
        for (field, headers) in ALIASES {
            for (rank, header) in headers.iter().enumerate() {
                map.insert(normalize_header(header), (*field, rank));
            }
        }
        map
    })
}

/// Column positions per field, ordered by precedence.
#[derive(Debug, Default)]
pub(crate) struct ColumnMap {
    columns: HashMap<Field, Vec<(usize, usize)>>,
}

impl ColumnMap {
    pub(crate) fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut columns: HashMap<Field, Vec<(usize, usize)>> = HashMap::new();
        for (index, header) in headers.into_iter().enumerate() {
            if let Some((field, rank)) = field_for_header(&normalize_header(header)) {
                columns.entry(field).or_default().push((rank, index));
            }
        }
        for positions in columns.values_mut() {
            positions.sort_unstable();
        }
        Self { columns }
    }

    pub(crate) fn has(&self, field: Field) -> bool {
        self.columns.contains_key(&field)
    }

    /// First non-empty value for `field` in precedence order.
    pub(crate) fn value<'r>(&self, record: &'r csv::StringRecord, field: Field) -> Option<&'r str> {
        self.columns
            .get(&field)?
            .iter()
            .filter_map(|(_, index)| record.get(*index))
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}
