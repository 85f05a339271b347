//! Statement parsing: recovers raw fund holdings from broker exports.
//!
//! Two input shapes are supported: CSV exports with a fixed 11-column layout,
//! and PDF statements whose extracted text lists one holding per line. Rows
//! that cannot be read are dropped and reported, never fatal on their own.

pub mod csv;
pub mod pdf;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::CoreError;
use crate::models::holding::{RawHolding, SourceKind};

/// Why a single statement row was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RowRejection {
    #[error("expected at least {expected} columns, found {found}")]
    TooFewColumns { expected: usize, found: usize },

    #[error("column '{column}' is not a number: '{value}'")]
    InvalidNumber { column: String, value: String },

    #[error("expected at least 11 tokens, found {0}")]
    TooFewTokens(usize),

    #[error("expected 5 numeric tokens, found {0}")]
    TooFewNumbers(usize),

    #[error("expected at least 6 text tokens, found {0}")]
    TooFewTextTokens(usize),

    #[error("scheme name is empty")]
    EmptySchemeName,

    #[error("AMC name is empty")]
    EmptyAmcName,

    #[error("invalid holding: {0}")]
    InvalidHolding(String),
}

/// A dropped row and the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based line number within the statement text.
    pub line_number: usize,
    pub reason: RowRejection,
}

/// Outcome of parsing one statement: the holdings recovered, in statement
/// order, plus every row that was dropped on the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseReport {
    pub holdings: Vec<RawHolding>,
    pub skipped: Vec<SkippedRow>,
}

impl ParseReport {
    fn push_row(&mut self, line_number: usize, row: Result<RawHolding, RowRejection>) {
        match row {
            Ok(holding) => self.holdings.push(holding),
            Err(reason) => {
                debug!("Skipping statement line {line_number}: {reason}");
                self.skipped.push(SkippedRow {
                    line_number,
                    reason,
                });
            }
        }
    }

    fn ensure_not_empty(self, kind: SourceKind) -> Result<Self, CoreError> {
        if self.holdings.is_empty() {
            return Err(CoreError::NoDataFound(format!(
                "no holdings could be read from the {kind} statement ({} rows skipped)",
                self.skipped.len()
            )));
        }
        info!(
            "Parsed {} holdings from {kind} statement ({} rows skipped)",
            self.holdings.len(),
            self.skipped.len()
        );
        Ok(self)
    }
}

/// Access to the text of a document page by page.
///
/// Page extraction is owned by whatever opened the document; the parser only
/// needs the text.
pub trait PageTextSource {
    fn page_count(&self) -> usize;
    fn extract_text(&self, page_index: usize) -> Result<String, CoreError>;
}

impl PageTextSource for Vec<String> {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn extract_text(&self, page_index: usize) -> Result<String, CoreError> {
        self.get(page_index).cloned().ok_or_else(|| {
            CoreError::DataExtraction(format!("page {page_index} is out of range"))
        })
    }
}

/// Text of a PDF document, extracted up front.
#[derive(Debug, Clone)]
pub struct PdfText {
    pages: Vec<String>,
}

impl PdfText {
    /// Open a PDF from raw bytes and extract the text of every page.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| CoreError::PdfRead(e.to_string()))?;
        // Page breaks come through as form feeds.
        let pages = text.split('\u{c}').map(str::to_string).collect();
        Ok(Self { pages })
    }

    pub fn from_pages(pages: Vec<String>) -> Self {
        Self { pages }
    }
}

impl PageTextSource for PdfText {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn extract_text(&self, page_index: usize) -> Result<String, CoreError> {
        self.pages.extract_text(page_index)
    }
}

/// Converts statement content into raw holdings.
///
/// Pure business logic, no shared state; safe to run on any worker.
pub struct StatementParser;

impl StatementParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse raw file bytes of the given kind.
    pub fn parse(&self, kind: SourceKind, bytes: &[u8]) -> Result<ParseReport, CoreError> {
        match kind {
            SourceKind::Csv => {
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    CoreError::InvalidDataFormat(format!("CSV is not valid UTF-8: {e}"))
                })?;
                self.parse_csv(text)
            }
            SourceKind::Pdf => self.parse_pdf_bytes(bytes),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn parse_pdf_bytes(&self, bytes: &[u8]) -> Result<ParseReport, CoreError> {
        let document = PdfText::from_bytes(bytes)?;
        self.parse_pdf(&document)
    }

    #[cfg(target_arch = "wasm32")]
    fn parse_pdf_bytes(&self, _bytes: &[u8]) -> Result<ParseReport, CoreError> {
        Err(CoreError::PdfRead(
            "PDF extraction is not available on this platform; pass extracted page text instead"
                .into(),
        ))
    }

    /// Parse CSV text (header row first).
    pub fn parse_csv(&self, text: &str) -> Result<ParseReport, CoreError> {
        csv::parse_csv(text)?.ensure_not_empty(SourceKind::Csv)
    }

    /// Parse a PDF from its page texts.
    pub fn parse_pdf(&self, document: &dyn PageTextSource) -> Result<ParseReport, CoreError> {
        let mut pages = Vec::with_capacity(document.page_count());
        for index in 0..document.page_count() {
            pages.push(document.extract_text(index)?);
        }
        self.parse_pdf_text(&pages.join("\n"))
    }

    /// Parse already-concatenated PDF text.
    pub fn parse_pdf_text(&self, text: &str) -> Result<ParseReport, CoreError> {
        if text.trim().is_empty() {
            return Err(CoreError::DataExtraction(
                "the PDF contains no extractable text".into(),
            ));
        }
        pdf::parse_pdf_text(text).ensure_not_empty(SourceKind::Pdf)
    }
}

impl Default for StatementParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a statement number: `%` and thousands separators are ignored, and
/// the result must be finite.
pub fn parse_number(token: &str) -> Option<f64> {
    let cleaned: String = token
        .trim()
        .chars()
        .filter(|c| *c != '%' && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
