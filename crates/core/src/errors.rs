use thiserror::Error;

/// Unified error type for the entire holdings-reconciler-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Statement import ────────────────────────────────────────────
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Could not read PDF: {0}")]
    PdfRead(String),

    #[error("Data extraction failed: {0}")]
    DataExtraction(String),

    #[error("No holdings found: {0}")]
    NoDataFound(String),

    #[error("Invalid data format: {0}")]
    InvalidDataFormat(String),

    // ── Registry / Network ──────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(String),

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    // ── Storage ─────────────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Holding not found: {0}")]
    HoldingNotFound(String),
}

impl CoreError {
    /// One human-readable message per failure class, for display to the user.
    /// The underlying cause is appended for registry failures only.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::UnsupportedFileType(_) => {
                "Unsupported file type. Please choose a PDF or CSV statement.".to_string()
            }
            CoreError::PdfRead(_) => "The PDF file could not be opened.".to_string(),
            CoreError::DataExtraction(_) | CoreError::NoDataFound(_) => {
                "No holdings could be extracted from this statement.".to_string()
            }
            CoreError::InvalidDataFormat(_) => {
                "The statement contents are not in a recognised format.".to_string()
            }
            CoreError::Network(cause) | CoreError::Decoding(cause) => {
                format!("Could not load fund data: {cause}")
            }
            CoreError::Api { message, .. } => format!("Could not load fund data: {message}"),
            CoreError::Serialization(_)
            | CoreError::Deserialization(_)
            | CoreError::Storage(_)
            | CoreError::FileIO(_) => "Your portfolio could not be saved or loaded.".to_string(),
            CoreError::ValidationError(msg) => msg.clone(),
            CoreError::HoldingNotFound(_) => "That holding no longer exists.".to_string(),
        }
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::Network(_) | CoreError::Decoding(_) | CoreError::Api { .. }
        )
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors often carry the full request URL; drop the query part.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        if e.is_decode() {
            CoreError::Decoding(sanitized)
        } else {
            CoreError::Network(sanitized)
        }
    }
}
