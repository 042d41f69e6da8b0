/// Canonical form of a CSV header: invisible marks removed, whitespace
/// collapsed to single underscores, lowercase.
pub(crate) fn normalize_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    collapsed.to_ascii_lowercase()
}

/// Company identifiers are compared as trimmed uppercase tickers.
pub(crate) fn normalize_company(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "").trim().to_ascii_uppercase()
}
