use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::traits::FundRegistry;
use crate::errors::CoreError;
use crate::models::fund::{FundHistory, FundMeta, FundRecord, NavPoint};
use crate::models::settings::DEFAULT_REGISTRY_BASE_URL;

const PROVIDER: &str = "MFAPI";

/// NAV dates arrive as `dd-MM-yyyy`.
const NAV_DATE_FORMAT: &str = "%d-%m-%Y";

/// mfapi.in mutual-fund registry.
///
/// - **Free**: No API key.
/// - **Endpoints**: `/mf` (every scheme), `/mf/{schemeCode}` (NAV history,
///   newest first).
/// - Scheme codes come back as JSON numbers in some payloads and as strings
///   in others; both decode to `String`.
pub struct MfApiProvider {
    client: Client,
    base_url: String,
}

impl MfApiProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_REGISTRY_BASE_URL, 30)
    }

    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(timeout_secs));
        #[cfg(target_arch = "wasm32")]
        let _ = timeout_secs;
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, CoreError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("HTTP {status} from {url}"),
            });
        }
        Ok(resp.text().await?)
    }
}

impl Default for MfApiProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── mfapi response types ────────────────────────────────────────────

#[derive(Deserialize)]
struct HistoryResponse {
    meta: FundMeta,
    #[serde(default)]
    data: Vec<NavRow>,
}

#[derive(Deserialize)]
struct NavRow {
    date: String,
    nav: String,
}

impl NavRow {
    fn into_point(self) -> Option<NavPoint> {
        let date = NaiveDate::parse_from_str(self.date.trim(), NAV_DATE_FORMAT).ok()?;
        let nav = self.nav.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
        Some(NavPoint { date, nav })
    }
}

/// Decode a `/mf` response body.
pub fn decode_fund_list(body: &str) -> Result<Vec<FundRecord>, CoreError> {
    serde_json::from_str(body)
        .map_err(|e| CoreError::Decoding(format!("Failed to parse fund list: {e}")))
}

/// Decode a `/mf/{schemeCode}` response body. NAV rows with an unreadable
/// date or value are dropped.
pub fn decode_fund_history(body: &str) -> Result<FundHistory, CoreError> {
    let resp: HistoryResponse = serde_json::from_str(body)
        .map_err(|e| CoreError::Decoding(format!("Failed to parse fund history: {e}")))?;

    let total = resp.data.len();
    let data: Vec<NavPoint> = resp.data.into_iter().filter_map(NavRow::into_point).collect();
    if data.len() < total {
        warn!(
            "Dropped {} unreadable NAV rows for scheme {}",
            total - data.len(),
            resp.meta.scheme_code
        );
    }

    Ok(FundHistory {
        meta: resp.meta,
        data,
    })
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl FundRegistry for MfApiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn list_all_funds(&self) -> Result<Vec<FundRecord>, CoreError> {
        let url = format!("{}/mf", self.base_url);
        let body = self.get_text(&url).await?;
        let funds = decode_fund_list(&body)?;
        debug!("{PROVIDER} returned {} schemes", funds.len());
        Ok(funds)
    }

    async fn get_fund_history(&self, scheme_code: &str) -> Result<FundHistory, CoreError> {
        let code = scheme_code.trim();
        if code.is_empty() {
            return Err(CoreError::ValidationError("Scheme code must not be empty".into()));
        }
        let url = format!("{}/mf/{code}", self.base_url);
        let body = self.get_text(&url).await?;
        decode_fund_history(&body)
    }
}
