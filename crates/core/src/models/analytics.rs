use serde::{Deserialize, Serialize};

/// Totals derived from a portfolio's holdings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Sum of invested values
    pub total_investments: f64,

    /// Sum of current values
    pub current_portfolio_value: f64,

    /// Sum of the statement-supplied returns
    pub total_returns: f64,

    /// total_returns / total_investments × 100 (0 when nothing is invested)
    pub returns_percentage: f64,

    /// Investment-weighted average of each holding's XIRR
    pub overall_xirr: f64,

    pub holdings_count: usize,
}

/// Totals for one group of holdings (a category or a source).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub name: String,
    pub invested_value: f64,
    pub current_value: f64,
    pub returns: f64,
    pub count: usize,

    /// Share of the total current portfolio value, in percent.
    pub allocation_percentage: f64,
}

/// Full analytics view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAnalytics {
    pub summary: PortfolioSummary,
    pub by_category: Vec<BreakdownEntry>,
    pub by_source: Vec<BreakdownEntry>,
    pub matched_count: usize,
    pub unmatched_count: usize,
}
