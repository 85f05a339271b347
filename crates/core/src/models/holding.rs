use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::CoreError;

/// Kind of statement file being imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Pdf,
    Csv,
}

impl SourceKind {
    /// Pick the source kind from a file name's extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Result<Self, CoreError> {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(SourceKind::Pdf),
            "csv" => Ok(SourceKind::Csv),
            _ => Err(CoreError::UnsupportedFileType(file_name.to_string())),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Pdf => write!(f, "PDF"),
            SourceKind::Csv => write!(f, "CSV"),
        }
    }
}

/// One fund holding recovered from a statement, before registry matching.
///
/// All eleven fields are always present. `returns` is taken from the
/// statement as-is and is never re-derived from the two values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHolding {
    pub scheme_name: String,
    pub amc_name: String,
    pub category: String,
    pub sub_category: String,
    pub folio_number: String,
    pub source: String,
    pub units: f64,
    pub invested_value: f64,
    pub current_value: f64,
    pub returns: f64,
    /// Annualised return, in percent.
    pub xirr: f64,
}

impl RawHolding {
    /// Check the record invariants: names present, numbers finite, units non-negative.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.scheme_name.trim().is_empty() {
            return Err(CoreError::ValidationError("Scheme name must not be empty".into()));
        }
        if self.amc_name.trim().is_empty() {
            return Err(CoreError::ValidationError("AMC name must not be empty".into()));
        }
        let numbers = [
            ("units", self.units),
            ("invested value", self.invested_value),
            ("current value", self.current_value),
            ("returns", self.returns),
            ("XIRR", self.xirr),
        ];
        if let Some((name, value)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(CoreError::ValidationError(format!(
                "{name} must be a finite number, got {value}"
            )));
        }
        if self.units < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Units must not be negative, got {}",
                self.units
            )));
        }
        Ok(())
    }

    /// Returns as a percentage of the invested value (0 when nothing was invested).
    pub fn returns_percentage(&self) -> f64 {
        if self.invested_value != 0.0 {
            self.returns / self.invested_value * 100.0
        } else {
            0.0
        }
    }
}

/// A holding after registry reconciliation.
///
/// Values are never mutated in place once shared: re-matching builds a new
/// `MatchedHolding` that keeps the same `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedHolding {
    /// Stable identity, used to update or remove a single holding.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    #[serde(flatten)]
    pub holding: RawHolding,

    /// Registry scheme code, if a candidate cleared the acceptance threshold.
    pub matched_scheme_code: Option<String>,

    /// Score of the accepted candidate.
    #[serde(default)]
    pub match_score: Option<f64>,
}

impl MatchedHolding {
    /// Wrap a raw holding with a fresh identity and no match.
    pub fn unmatched(holding: RawHolding) -> Self {
        Self {
            id: Uuid::new_v4(),
            holding,
            matched_scheme_code: None,
            match_score: None,
        }
    }

    /// Build a copy carrying a new match result; the identity is kept.
    pub fn with_match(&self, scheme_code: Option<String>, score: Option<f64>) -> Self {
        Self {
            id: self.id,
            holding: self.holding.clone(),
            matched_scheme_code: scheme_code,
            match_score: score,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.matched_scheme_code.is_some()
    }
}
