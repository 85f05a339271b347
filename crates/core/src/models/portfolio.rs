use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analytics::PortfolioSummary;
use super::holding::MatchedHolding;
use crate::services::aggregator_service::PortfolioAggregator;

/// The persisted aggregate: every imported holding plus its derived summary.
///
/// There is exactly one way to build a `Portfolio` (`Portfolio::new`), and it
/// always derives the summary from the holdings. Changing a single holding
/// means rebuilding the whole value from the modified list. Deserialization
/// goes through the same constructor, so a stored summary is never trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredPortfolio")]
pub struct Portfolio {
    holdings: Vec<MatchedHolding>,
    summary: PortfolioSummary,
    last_updated: DateTime<Utc>,
}

#[derive(Deserialize)]
struct StoredPortfolio {
    holdings: Vec<MatchedHolding>,
    last_updated: DateTime<Utc>,
}

impl From<StoredPortfolio> for Portfolio {
    fn from(stored: StoredPortfolio) -> Self {
        Portfolio::new(stored.holdings, stored.last_updated)
    }
}

impl Portfolio {
    pub fn new(holdings: Vec<MatchedHolding>, last_updated: DateTime<Utc>) -> Self {
        let summary = PortfolioAggregator::new().build_summary(&holdings);
        Self {
            holdings,
            summary,
            last_updated,
        }
    }

    /// Holdings in import order.
    pub fn holdings(&self) -> &[MatchedHolding] {
        &self.holdings
    }

    pub fn summary(&self) -> &PortfolioSummary {
        &self.summary
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn get_holding(&self, id: Uuid) -> Option<&MatchedHolding> {
        self.holdings.iter().find(|h| h.id == id)
    }

    pub fn matched_count(&self) -> usize {
        self.holdings.iter().filter(|h| h.is_matched()).count()
    }

    /// Give up the aggregate and take the holdings list, e.g. to rebuild it.
    pub fn into_holdings(self) -> Vec<MatchedHolding> {
        self.holdings
    }
}
