use crate::models::holding::RawHolding;

use super::{parse_number, ParseReport, RowRejection};

/// A line containing any of these opens the holdings section.
pub const SECTION_MARKERS: &[&str] = &["HOLDINGS AS ON", "Scheme Name"];

/// Lines containing any of these inside the section are column headers.
pub const HEADER_MARKERS: &[&str] = &["Scheme Name", "AMC", "Category"];

/// A token containing any of these is taken as part of the AMC name.
pub const AMC_KEYWORDS: &[&str] = &["Mutual", "Fund", "Asset"];

const MIN_TOKENS: usize = 11;
const NUMERIC_FIELDS: usize = 5;
const MIN_TEXT_TOKENS: usize = 6;
/// category, sub-category, folio number, source
const TRAILING_TEXT_FIELDS: usize = 4;
/// Tokens given to the AMC when no AMC keyword is present.
const FALLBACK_AMC_TOKENS: usize = 3;
/// Tokens before an AMC keyword that still belong to the AMC name.
const AMC_PREFIX_TOKENS: usize = 2;

/// Scan extracted statement text for holding lines.
///
/// Everything before the first section marker is ignored. Inside the
/// section, blank lines and repeated column headers are passed over and every
/// other line is run through [`parse_holding_line`].
pub fn parse_pdf_text(text: &str) -> ParseReport {
    let mut report = ParseReport::default();
    let mut in_section = false;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if !in_section {
            in_section = SECTION_MARKERS.iter().any(|m| line.contains(m));
            continue;
        }
        if line.is_empty() || HEADER_MARKERS.iter().any(|m| line.contains(m)) {
            continue;
        }
        report.push_row(index + 1, parse_holding_line(line));
    }
    report
}

/// Recover one holding from a whitespace-separated statement line.
///
/// The last five numeric tokens are units, invested value, current value,
/// returns and XIRR. The text before the first of them ends with category,
/// sub-category, folio number and source; what remains is split into scheme
/// name and AMC name by [`split_scheme_and_amc`].
pub fn parse_holding_line(line: &str) -> Result<RawHolding, RowRejection> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < MIN_TOKENS {
        return Err(RowRejection::TooFewTokens(tokens.len()));
    }

    // Walk backwards, keeping the index and value of each numeric token.
    let numeric: Vec<(usize, f64)> = tokens
        .iter()
        .enumerate()
        .rev()
        .filter_map(|(i, t)| parse_number(t).map(|v| (i, v)))
        .take(NUMERIC_FIELDS)
        .collect();
    if numeric.len() < NUMERIC_FIELDS {
        return Err(RowRejection::TooFewNumbers(numeric.len()));
    }
    // Encounter order is xirr, returns, current, invested, units.
    let (first_numeric, units) = numeric[4];
    let invested_value = numeric[3].1;
    let current_value = numeric[2].1;
    let returns = numeric[1].1;
    let xirr = numeric[0].1;

    let text = &tokens[..first_numeric];
    if text.len() < MIN_TEXT_TOKENS {
        return Err(RowRejection::TooFewTextTokens(text.len()));
    }
    let (leading, trailing) = text.split_at(text.len() - TRAILING_TEXT_FIELDS);
    let (scheme_name, amc_name) = split_scheme_and_amc(leading);
    if scheme_name.is_empty() {
        return Err(RowRejection::EmptySchemeName);
    }
    if amc_name.is_empty() {
        return Err(RowRejection::EmptyAmcName);
    }

    let holding = RawHolding {
        scheme_name,
        amc_name,
        category: trailing[0].to_string(),
        sub_category: trailing[1].to_string(),
        folio_number: trailing[2].to_string(),
        source: trailing[3].to_string(),
        units,
        invested_value,
        current_value,
        returns,
        xirr,
    };
    holding
        .validate()
        .map_err(|e| RowRejection::InvalidHolding(e.to_string()))?;
    Ok(holding)
}

/// Split the leading text tokens into (scheme name, AMC name).
///
/// The first token containing an AMC keyword, together with up to two tokens
/// before it, starts the AMC name. Without a keyword the last three tokens
/// are the AMC name, but the scheme name always keeps at least one token.
pub fn split_scheme_and_amc(tokens: &[&str]) -> (String, String) {
    let split_at = match tokens
        .iter()
        .position(|t| AMC_KEYWORDS.iter().any(|k| t.contains(k)))
    {
        Some(keyword_at) => keyword_at.saturating_sub(AMC_PREFIX_TOKENS),
        None => tokens.len().saturating_sub(FALLBACK_AMC_TOKENS).max(1),
    };
    let split_at = split_at.min(tokens.len());
    let (scheme, amc) = tokens.split_at(split_at);
    (scheme.join(" "), amc.join(" "))
}
