use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad asset class of a scheme, derived from keywords in its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FundCategory {
    Equity,
    Debt,
    Hybrid,
    Other,
}

impl fmt::Display for FundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FundCategory::Equity => write!(f, "Equity"),
            FundCategory::Debt => write!(f, "Debt"),
            FundCategory::Hybrid => write!(f, "Hybrid"),
            FundCategory::Other => write!(f, "Other"),
        }
    }
}

// Checked in this order: hybrid names often mention "equity" or "debt" too.
const HYBRID_KEYWORDS: &[&str] = &[
    "hybrid",
    "balanced",
    "arbitrage",
    "multi asset",
    "equity savings",
    "asset allocation",
    "dynamic asset",
];

const DEBT_KEYWORDS: &[&str] = &[
    "debt",
    "liquid",
    "bond",
    "gilt",
    "overnight",
    "money market",
    "credit risk",
    "duration",
    "corporate",
    "banking and psu",
    "floater",
    "income",
];

const EQUITY_KEYWORDS: &[&str] = &[
    "equity",
    "flexi cap",
    "large cap",
    "mid cap",
    "small cap",
    "multi cap",
    "large & mid",
    "elss",
    "tax saver",
    "bluechip",
    "focused",
    "value",
    "contra",
    "index",
    "nifty",
    "sensex",
];

/// One scheme in the external fund registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundRecord {
    #[serde(deserialize_with = "scheme_code::deserialize")]
    pub scheme_code: String,
    pub scheme_name: String,
    #[serde(default)]
    pub isin_growth: Option<String>,
    #[serde(default)]
    pub isin_div_reinvestment: Option<String>,
}

impl FundRecord {
    pub fn new(scheme_code: impl Into<String>, scheme_name: impl Into<String>) -> Self {
        Self {
            scheme_code: scheme_code.into(),
            scheme_name: scheme_name.into(),
            isin_growth: None,
            isin_div_reinvestment: None,
        }
    }

    /// First whitespace-delimited token of the scheme name.
    pub fn fund_house(&self) -> &str {
        self.scheme_name.split_whitespace().next().unwrap_or("")
    }

    pub fn is_growth_plan(&self) -> bool {
        self.scheme_name.to_lowercase().contains("growth")
    }

    pub fn is_dividend_plan(&self) -> bool {
        let name = self.scheme_name.to_lowercase();
        name.contains("dividend") || name.contains("idcw")
    }

    pub fn category(&self) -> FundCategory {
        classify_scheme_name(&self.scheme_name)
    }
}

/// Keyword classification of a scheme name into a broad category.
pub fn classify_scheme_name(name: &str) -> FundCategory {
    let lower = name.to_lowercase();
    let has_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
    if has_any(HYBRID_KEYWORDS) {
        FundCategory::Hybrid
    } else if has_any(DEBT_KEYWORDS) {
        FundCategory::Debt
    } else if has_any(EQUITY_KEYWORDS) {
        FundCategory::Equity
    } else {
        FundCategory::Other
    }
}

/// Registry payloads send scheme codes as JSON numbers or JSON strings.
/// Both are normalised to a trimmed string here, at the decode boundary.
pub(crate) mod scheme_code {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        from_value(&value).map_err(D::Error::custom)
    }

    pub fn from_value(value: &Value) -> Result<String, String> {
        let code = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    u.to_string()
                } else if let Some(i) = n.as_i64() {
                    i.to_string()
                } else {
                    return Err(format!("scheme code must be an integer, got {n}"));
                }
            }
            other => return Err(format!("scheme code must be a number or string, got {other}")),
        };
        if code.is_empty() {
            return Err("scheme code must not be empty".to_string());
        }
        Ok(code)
    }
}

/// Scheme metadata attached to a NAV history response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundMeta {
    #[serde(default)]
    pub fund_house: String,
    #[serde(default)]
    pub scheme_type: String,
    #[serde(default)]
    pub scheme_category: String,
    #[serde(deserialize_with = "scheme_code::deserialize")]
    pub scheme_code: String,
    #[serde(default)]
    pub scheme_name: String,
}

/// A single NAV observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: f64,
}

/// Per-fund NAV history, most recent first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundHistory {
    pub meta: FundMeta,
    pub data: Vec<NavPoint>,
}

impl FundHistory {
    pub fn latest(&self) -> Option<&NavPoint> {
        self.data.first()
    }

    /// The most recent observation on or before `date`.
    pub fn nav_on_or_before(&self, date: NaiveDate) -> Option<&NavPoint> {
        self.data.iter().find(|p| p.date <= date)
    }
}

/// Read model for a single fund's detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundDetails {
    pub scheme_code: String,
    pub scheme_name: String,
    pub fund_house: String,
    pub scheme_type: String,
    pub scheme_category: String,
    pub latest_nav: Option<NavPoint>,
    pub previous_nav: Option<NavPoint>,
    pub day_change: Option<f64>,
    pub day_change_pct: Option<f64>,
    /// Point-to-point NAV return over the last year, when history reaches back that far.
    pub one_year_return_pct: Option<f64>,
    pub history: Vec<NavPoint>,
}

impl FundDetails {
    pub fn from_history(history: FundHistory) -> Self {
        let latest_nav = history.data.first().cloned();
        let previous_nav = history.data.get(1).cloned();

        let (day_change, day_change_pct) = match (&latest_nav, &previous_nav) {
            (Some(latest), Some(prev)) => {
                let change = latest.nav - prev.nav;
                let pct = if prev.nav != 0.0 {
                    Some(change / prev.nav * 100.0)
                } else {
                    None
                };
                (Some(change), pct)
            }
            _ => (None, None),
        };

        let one_year_return_pct = latest_nav.as_ref().and_then(|latest| {
            let year_ago = latest.date.checked_sub_signed(chrono::Duration::days(365))?;
            let base = history.nav_on_or_before(year_ago)?;
            if base.nav == 0.0 {
                return None;
            }
            Some((latest.nav - base.nav) / base.nav * 100.0)
        });

        let FundHistory { meta, data } = history;
        Self {
            scheme_code: meta.scheme_code,
            scheme_name: meta.scheme_name,
            fund_house: meta.fund_house,
            scheme_type: meta.scheme_type,
            scheme_category: meta.scheme_category,
            latest_nav,
            previous_nav,
            day_change,
            day_change_pct,
            one_year_return_pct,
            history: data,
        }
    }
}
