use crate::models::holding::MatchedHolding;
use crate::models::portfolio::Portfolio;

/// Header row of the CSV export.
pub const EXPORT_HEADER: &str = "Scheme Name,AMC,Category,Sub Category,Folio Number,Source,Units,Invested Value,Current Value,Returns,Returns %,XIRR,Match Status";

/// Renders a portfolio as a UTF-8 CSV document, one row per holding.
///
/// Text fields are always double-quoted (embedded quotes doubled); numbers
/// use their shortest round-trip form so a re-import reads them back exactly.
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    pub fn export_csv(&self, portfolio: &Portfolio) -> String {
        let mut csv = String::from(EXPORT_HEADER);
        csv.push('\n');
        for holding in portfolio.holdings() {
            csv.push_str(&Self::row(holding));
            csv.push('\n');
        }
        csv
    }

    fn row(matched: &MatchedHolding) -> String {
        let h = &matched.holding;
        let status = if matched.is_matched() { "Matched" } else { "Unmatched" };
        format!(
            "{},{},{},{},{},{},{},{},{},{},{:.2},{},{}",
            quote(&h.scheme_name),
            quote(&h.amc_name),
            quote(&h.category),
            quote(&h.sub_category),
            quote(&h.folio_number),
            quote(&h.source),
            h.units,
            h.invested_value,
            h.current_value,
            h.returns,
            h.returns_percentage(),
            h.xirr,
            status,
        )
    }
}

impl Default for ExportService {
    fn default() -> Self {
        Self::new()
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
