use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::fund::{FundHistory, FundRecord};

/// Abstraction over the external mutual-fund registry.
///
/// The engine only needs the full scheme list and one scheme's NAV history.
/// Implementations own transport and wire decoding; everything they return
/// is already normalised (string scheme codes, typed NAV points).
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait FundRegistry: Send + Sync {
    /// Human-readable name of this registry (for logs/errors).
    fn name(&self) -> &str;

    /// Every scheme the registry knows about.
    async fn list_all_funds(&self) -> Result<Vec<FundRecord>, CoreError>;

    /// NAV history for one scheme, most recent first.
    async fn get_fund_history(&self, scheme_code: &str) -> Result<FundHistory, CoreError>;
}
