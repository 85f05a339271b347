use chrono::Duration;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::fund::{FundDetails, FundHistory, FundRecord};
use crate::providers::traits::FundRegistry;
use crate::storage::cache::{history_key, FundRegistryCache, ALL_FUNDS_KEY};

/// Read-through access to the fund registry.
///
/// Cache strategy:
/// - **Fund list**: served from cache within the default window (24 h);
///   refetched on a miss or when the caller forces a refresh.
/// - **Fund history**: cached per scheme code; the detail view asks for a
///   tighter window (4 h) than list-level reads.
/// - A failed cache write is logged and ignored. A failed registry fetch is
///   returned to the caller.
pub struct FundRegistryService {
    registry: Arc<dyn FundRegistry>,
    cache: FundRegistryCache,
    detail_max_age: Duration,
}

impl FundRegistryService {
    pub fn new(
        registry: Arc<dyn FundRegistry>,
        cache: FundRegistryCache,
        detail_max_age: Duration,
    ) -> Self {
        Self {
            registry,
            cache,
            detail_max_age,
        }
    }

    pub fn cache(&self) -> &FundRegistryCache {
        &self.cache
    }

    /// The full fund list, from cache unless stale or `force_refresh` is set.
    pub async fn all_funds(&self, force_refresh: bool) -> Result<Vec<FundRecord>, CoreError> {
        if !force_refresh {
            if let Some(funds) = self.cache.get::<Vec<FundRecord>>(ALL_FUNDS_KEY, None) {
                debug!("Fund list served from cache ({} schemes)", funds.len());
                return Ok(funds);
            }
        }

        let funds = self.registry.list_all_funds().await?;
        info!(
            "Fetched {} schemes from {}",
            funds.len(),
            self.registry.name()
        );
        if let Err(e) = self.cache.put(ALL_FUNDS_KEY, &funds) {
            warn!("Could not cache fund list: {e}");
        }
        Ok(funds)
    }

    /// NAV history for one scheme, from cache if younger than `max_age`
    /// (the default window when `None`).
    pub async fn fund_history(
        &self,
        scheme_code: &str,
        max_age: Option<Duration>,
    ) -> Result<FundHistory, CoreError> {
        let key = history_key(scheme_code);
        if let Some(history) = self.cache.get::<FundHistory>(&key, max_age) {
            debug!("History for {scheme_code} served from cache");
            return Ok(history);
        }

        let history = self.registry.get_fund_history(scheme_code).await?;
        if let Err(e) = self.cache.put(&key, &history) {
            warn!("Could not cache history for {scheme_code}: {e}");
        }
        Ok(history)
    }

    /// Detail view of one fund, using the tighter detail freshness window.
    pub async fn fund_details(&self, scheme_code: &str) -> Result<FundDetails, CoreError> {
        let history = self
            .fund_history(scheme_code, Some(self.detail_max_age))
            .await?;
        Ok(FundDetails::from_history(history))
    }

    /// Funds whose name contains every whitespace-separated term of `query`
    /// (case-insensitive), in registry order, at most `limit` of them.
    pub async fn search_funds(&self, query: &str, limit: usize) -> Result<Vec<FundRecord>, CoreError> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let funds = self.all_funds(false).await?;
        Ok(funds
            .into_iter()
            .filter(|f| {
                let name = f.scheme_name.to_lowercase();
                terms.iter().all(|t| name.contains(t.as_str()))
            })
            .take(limit)
            .collect())
    }

    /// Drop the cached history of one scheme.
    pub fn invalidate_history(&self, scheme_code: &str) {
        self.cache.invalidate(&history_key(scheme_code));
    }
}
