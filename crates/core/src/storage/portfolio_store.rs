use log::warn;
use std::sync::Arc;

use super::store::KeyValueStore;
use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;

/// Storage key of the single saved portfolio.
pub const PORTFOLIO_KEY: &str = "saved_portfolio";

/// Saves and loads the portfolio as one JSON blob.
///
/// Saves replace the stored record wholesale. A record that no longer
/// deserializes is discarded and reported as "no portfolio".
pub struct PortfolioStore {
    store: Arc<dyn KeyValueStore>,
}

impl PortfolioStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, portfolio: &Portfolio) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec(portfolio)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize portfolio: {e}")))?;
        self.store.put(PORTFOLIO_KEY, bytes)
    }

    pub fn load(&self) -> Result<Option<Portfolio>, CoreError> {
        let Some(bytes) = self.store.get(PORTFOLIO_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_slice::<Portfolio>(&bytes) {
            Ok(portfolio) => Ok(Some(portfolio)),
            Err(e) => {
                warn!("Discarding unreadable saved portfolio: {e}");
                self.store.remove(PORTFOLIO_KEY)?;
                Ok(None)
            }
        }
    }

    /// Returns `true` if a saved portfolio was removed.
    pub fn clear(&self) -> Result<bool, CoreError> {
        self.store.remove(PORTFOLIO_KEY)
    }
}
