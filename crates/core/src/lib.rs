pub mod clock;
pub mod errors;
pub mod models;
pub mod parsers;
pub mod providers;
pub mod services;
pub mod storage;

use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use clock::{Clock, SystemClock};
use errors::CoreError;
use models::{
    analytics::{PortfolioAnalytics, PortfolioSummary},
    fund::{FundDetails, FundRecord},
    holding::{MatchedHolding, RawHolding, SourceKind},
    portfolio::Portfolio,
    settings::Settings,
};
use parsers::{PageTextSource, ParseReport, SkippedRow, StatementParser};
use providers::traits::FundRegistry;
use services::{
    aggregator_service::PortfolioAggregator,
    export_service::ExportService,
    matcher_service::{FundMatcher, MatchConfidence, MatchStats},
    registry_service::FundRegistryService,
};
use storage::{cache::FundRegistryCache, portfolio_store::PortfolioStore, store::KeyValueStore};

/// Outcome of a successful statement import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub holdings_imported: usize,
    /// Statement rows that could not be read and were left out.
    pub skipped: Vec<SkippedRow>,
    pub stats: MatchStats,
}

/// Main entry point for the holdings reconciliation engine.
///
/// Runs the import pipeline (parse → fund list → match → aggregate →
/// persist) and owns the current portfolio. Every collaborator is passed in
/// at construction; nothing is global. The portfolio and the store are only
/// touched after a stage completes, so a failed or abandoned operation
/// leaves the previous portfolio as it was.
#[must_use]
pub struct HoldingsReconciler {
    portfolio: Option<Portfolio>,
    parser: StatementParser,
    matcher: FundMatcher,
    aggregator: PortfolioAggregator,
    exporter: ExportService,
    registry_service: FundRegistryService,
    portfolio_store: PortfolioStore,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for HoldingsReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoldingsReconciler")
            .field(
                "holdings",
                &self.portfolio.as_ref().map(|p| p.holdings().len()),
            )
            .field("matcher", self.matcher.config())
            .finish()
    }
}

impl HoldingsReconciler {
    /// Build an engine on wall-clock time.
    pub fn new(
        registry: Arc<dyn FundRegistry>,
        store: Arc<dyn KeyValueStore>,
        settings: &Settings,
    ) -> Result<Self, CoreError> {
        Self::with_clock(registry, store, Arc::new(SystemClock), settings)
    }

    /// Build an engine with an explicit clock. Fails on invalid settings.
    pub fn with_clock(
        registry: Arc<dyn FundRegistry>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        settings: &Settings,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let cache = FundRegistryCache::new(store.clone(), clock.clone(), &settings.cache);
        let registry_service =
            FundRegistryService::new(registry, cache, settings.cache.detail_max_age());

        Ok(Self {
            portfolio: None,
            parser: StatementParser::new(),
            matcher: FundMatcher::new(settings.matcher),
            aggregator: PortfolioAggregator::new(),
            exporter: ExportService::new(),
            registry_service,
            portfolio_store: PortfolioStore::new(store),
            clock,
        })
    }

    /// Engine backed by mfapi.in and a directory of cache/portfolio files
    /// (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open_default(
        data_dir: impl AsRef<std::path::Path>,
        settings: &Settings,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let store = storage::store::FileStore::open(data_dir)?;
        let registry = providers::mfapi::MfApiProvider::with_base_url(
            &settings.registry_base_url,
            settings.request_timeout_secs,
        );
        Self::new(Arc::new(registry), Arc::new(store), settings)
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Load the saved portfolio, if any. An unreadable record counts as none.
    pub fn load(&mut self) -> Result<Option<&Portfolio>, CoreError> {
        self.portfolio = self.portfolio_store.load()?;
        Ok(self.portfolio.as_ref())
    }

    /// Forget the current portfolio, in memory and in storage.
    pub fn delete_portfolio(&mut self) -> Result<(), CoreError> {
        self.portfolio_store.clear()?;
        self.portfolio = None;
        Ok(())
    }

    // ── Import ──────────────────────────────────────────────────────

    /// Import a statement file; its kind is taken from the file extension.
    pub async fn import_statement(
        &mut self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ImportReport, CoreError> {
        let kind = SourceKind::from_file_name(file_name)?;
        info!("Importing {kind} statement '{file_name}'");
        self.import_bytes(kind, bytes).await
    }

    /// Import raw statement bytes of a known kind.
    pub async fn import_bytes(
        &mut self,
        kind: SourceKind,
        bytes: &[u8],
    ) -> Result<ImportReport, CoreError> {
        let report = self.parser.parse(kind, bytes)?;
        self.reconcile_and_save(report).await
    }

    /// Import statement text: CSV content, or PDF text already extracted.
    pub async fn import_text(
        &mut self,
        kind: SourceKind,
        text: &str,
    ) -> Result<ImportReport, CoreError> {
        let report = match kind {
            SourceKind::Csv => self.parser.parse_csv(text)?,
            SourceKind::Pdf => self.parser.parse_pdf_text(text)?,
        };
        self.reconcile_and_save(report).await
    }

    /// Import a PDF whose pages are extracted by the caller.
    pub async fn import_pdf_pages(
        &mut self,
        document: &dyn PageTextSource,
    ) -> Result<ImportReport, CoreError> {
        let report = self.parser.parse_pdf(document)?;
        self.reconcile_and_save(report).await
    }

    /// Match the parsed holdings and replace the portfolio with the result.
    async fn reconcile_and_save(&mut self, report: ParseReport) -> Result<ImportReport, CoreError> {
        let ParseReport { holdings, skipped } = report;
        let registry = self.registry_service.all_funds(false).await?;
        let matched = self.matcher.match_holdings(&holdings, &registry);
        let stats = MatchStats::of(&matched);
        let holdings_imported = matched.len();

        self.commit(matched)?;
        Ok(ImportReport {
            holdings_imported,
            skipped,
            stats,
        })
    }

    // ── Refresh & holding edits ─────────────────────────────────────

    /// Re-match every holding against the registry. `force` bypasses the
    /// cached fund list.
    pub async fn refresh(&mut self, force: bool) -> Result<MatchStats, CoreError> {
        let Some(portfolio) = self.portfolio.as_ref() else {
            return Err(CoreError::ValidationError("No portfolio to refresh".into()));
        };
        let registry = self.registry_service.all_funds(force).await?;
        let rematched = self.matcher.rematch_holdings(portfolio.holdings(), &registry);
        let stats = MatchStats::of(&rematched);
        self.commit(rematched)?;
        Ok(stats)
    }

    /// Match and append one holding. Returns its id.
    pub async fn add_holding(&mut self, holding: RawHolding) -> Result<Uuid, CoreError> {
        holding.validate()?;
        let registry = self.registry_service.all_funds(false).await?;
        let matched = self
            .matcher
            .match_holdings(std::slice::from_ref(&holding), &registry)
            .remove(0);
        let id = matched.id;

        let mut holdings = self.current_holdings();
        holdings.push(matched);
        self.commit(holdings)?;
        Ok(id)
    }

    /// Replace one holding's data and match it again; its id is kept.
    pub async fn update_holding(&mut self, id: Uuid, holding: RawHolding) -> Result<(), CoreError> {
        holding.validate()?;
        let mut holdings = self.current_holdings();
        let index = holdings
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| CoreError::HoldingNotFound(id.to_string()))?;

        let registry = self.registry_service.all_funds(false).await?;
        let draft = MatchedHolding {
            id,
            holding,
            matched_scheme_code: None,
            match_score: None,
        };
        holdings[index] = self
            .matcher
            .rematch_holdings(std::slice::from_ref(&draft), &registry)
            .remove(0);
        self.commit(holdings)
    }

    pub fn remove_holding(&mut self, id: Uuid) -> Result<(), CoreError> {
        let mut holdings = self.current_holdings();
        let before = holdings.len();
        holdings.retain(|h| h.id != id);
        if holdings.len() == before {
            return Err(CoreError::HoldingNotFound(id.to_string()));
        }
        self.commit(holdings)
    }

    // ── Read models ─────────────────────────────────────────────────

    #[must_use]
    pub fn portfolio(&self) -> Option<&Portfolio> {
        self.portfolio.as_ref()
    }

    /// Summary of the current portfolio (all zeros when there is none).
    #[must_use]
    pub fn summary(&self) -> PortfolioSummary {
        self.portfolio
            .as_ref()
            .map(|p| p.summary().clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn analytics(&self) -> PortfolioAnalytics {
        let holdings = self.portfolio.as_ref().map(|p| p.holdings()).unwrap_or(&[]);
        self.aggregator.analytics(holdings)
    }

    /// Display band of one holding's match.
    #[must_use]
    pub fn match_confidence(&self, id: Uuid) -> Option<MatchConfidence> {
        self.portfolio
            .as_ref()?
            .get_holding(id)
            .map(MatchConfidence::for_holding)
    }

    /// The current portfolio as CSV.
    pub fn export_csv(&self) -> Result<String, CoreError> {
        let portfolio = self
            .portfolio
            .as_ref()
            .ok_or_else(|| CoreError::ValidationError("No portfolio to export".into()))?;
        Ok(self.exporter.export_csv(portfolio))
    }

    // ── Registry ────────────────────────────────────────────────────

    /// Detail view of one fund (NAV history no older than the detail window).
    pub async fn fund_details(&self, scheme_code: &str) -> Result<FundDetails, CoreError> {
        self.registry_service.fund_details(scheme_code).await
    }

    pub async fn search_funds(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<FundRecord>, CoreError> {
        self.registry_service.search_funds(query, limit).await
    }

    // ── Cache Management ────────────────────────────────────────────

    #[must_use]
    pub fn cache_size_bytes(&self) -> usize {
        self.registry_service.cache().size_bytes()
    }

    pub fn clear_cache(&self) {
        self.registry_service.cache().invalidate_all();
    }

    // ── Internal ────────────────────────────────────────────────────

    fn current_holdings(&self) -> Vec<MatchedHolding> {
        self.portfolio
            .as_ref()
            .map(|p| p.holdings().to_vec())
            .unwrap_or_default()
    }

    /// Build the new portfolio, persist it, and only then adopt it.
    fn commit(&mut self, holdings: Vec<MatchedHolding>) -> Result<(), CoreError> {
        let portfolio = Portfolio::new(holdings, self.clock.now());
        self.portfolio_store.save(&portfolio)?;
        self.portfolio = Some(portfolio);
        Ok(())
    }
}
