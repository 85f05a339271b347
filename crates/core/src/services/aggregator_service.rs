use std::collections::HashMap;

use crate::models::analytics::{BreakdownEntry, PortfolioAnalytics, PortfolioSummary};
use crate::models::holding::MatchedHolding;
use crate::services::matcher_service::MatchStats;

/// Folds reconciled holdings into portfolio statistics.
///
/// Pure reductions over the holdings list; nothing is cached between calls.
pub struct PortfolioAggregator;

impl PortfolioAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Totals, return percentage and investment-weighted XIRR.
    /// Every ratio is 0 when nothing is invested.
    pub fn build_summary(&self, holdings: &[MatchedHolding]) -> PortfolioSummary {
        let total_investments: f64 = holdings.iter().map(|h| h.holding.invested_value).sum();
        let current_portfolio_value: f64 = holdings.iter().map(|h| h.holding.current_value).sum();
        let total_returns: f64 = holdings.iter().map(|h| h.holding.returns).sum();

        let (returns_percentage, overall_xirr) = if total_investments != 0.0 {
            let weighted_xirr: f64 = holdings
                .iter()
                .map(|h| h.holding.xirr * (h.holding.invested_value / total_investments))
                .sum();
            (total_returns / total_investments * 100.0, weighted_xirr)
        } else {
            (0.0, 0.0)
        };

        PortfolioSummary {
            total_investments,
            current_portfolio_value,
            total_returns,
            returns_percentage,
            overall_xirr,
            holdings_count: holdings.len(),
        }
    }

    /// Group by the holding's statement category.
    pub fn category_breakdown(&self, holdings: &[MatchedHolding]) -> Vec<BreakdownEntry> {
        Self::breakdown(holdings, |h| h.holding.category.as_str())
    }

    /// Group by the holding's statement source (registrar/platform).
    pub fn source_breakdown(&self, holdings: &[MatchedHolding]) -> Vec<BreakdownEntry> {
        Self::breakdown(holdings, |h| h.holding.source.as_str())
    }

    pub fn analytics(&self, holdings: &[MatchedHolding]) -> PortfolioAnalytics {
        let stats = MatchStats::of(holdings);
        PortfolioAnalytics {
            summary: self.build_summary(holdings),
            by_category: self.category_breakdown(holdings),
            by_source: self.source_breakdown(holdings),
            matched_count: stats.matched,
            unmatched_count: stats.unmatched,
        }
    }

    /// Accumulate per group, then fill in allocation once the total current
    /// value is known. Largest groups first; ties by name.
    fn breakdown<F>(holdings: &[MatchedHolding], key: F) -> Vec<BreakdownEntry>
    where
        F: Fn(&MatchedHolding) -> &str,
    {
        let mut groups: HashMap<&str, BreakdownEntry> = HashMap::new();
        let mut total_current = 0.0;

        for holding in holdings {
            let name = key(holding);
            let entry = groups.entry(name).or_insert_with(|| BreakdownEntry {
                name: name.to_string(),
                invested_value: 0.0,
                current_value: 0.0,
                returns: 0.0,
                count: 0,
                allocation_percentage: 0.0,
            });
            entry.invested_value += holding.holding.invested_value;
            entry.current_value += holding.holding.current_value;
            entry.returns += holding.holding.returns;
            entry.count += 1;
            total_current += holding.holding.current_value;
        }

        let mut entries: Vec<BreakdownEntry> = groups.into_values().collect();
        for entry in &mut entries {
            entry.allocation_percentage = if total_current != 0.0 {
                entry.current_value / total_current * 100.0
            } else {
                0.0
            };
        }
        entries.sort_by(|a, b| {
            b.current_value
                .partial_cmp(&a.current_value)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        entries
    }
}

impl Default for PortfolioAggregator {
    fn default() -> Self {
        Self::new()
    }
}
