use crate::error::ConfigError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

fn default_from_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 6, 1).expect("hardcoded date")
}

fn default_to_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 6, 21).expect("hardcoded date")
}

fn default_ticker() -> String {
    "SPY".to_string()
}

fn default_startcash() -> Decimal {
    Decimal::from(1_000_000)
}

/// The typed view of a run description document.
///
/// Every field has a default, a minimal document is just a strategy spec.
/// Aliases accept both the camelCase keys of hand-written documents and the
/// lowercased keys the file loader normalizes to.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// First quote date replayed, inclusive.
    #[serde(alias = "fromDate", alias = "fromdate", default = "default_from_date")]
    pub from_date: NaiveDate,
    /// End of the replay window, exclusive.
    #[serde(alias = "toDate", alias = "todate", default = "default_to_date")]
    pub to_date: NaiveDate,
    #[serde(default = "default_ticker")]
    pub ticker: String,
    /// Starting cash of every spawned portfolio.
    #[serde(default = "default_startcash")]
    pub startcash: Decimal,
    /// Quote archive connection string. Falls back to the DATABASE_URL
    /// environment variable when absent.
    #[serde(alias = "databaseUrl", alias = "databaseurl", default)]
    pub database_url: Option<String>,
    /// Post-run parameter bucketing requests.
    #[serde(default)]
    pub analyze: Vec<AnalyzeSpec>,
    /// The complete raw document, kept for permutation expansion and for
    /// per-strategy parameter blocks the typed fields do not cover.
    #[serde(skip)]
    pub document: Value,
}

/// One statistics request: average results per value of each named
/// parameter, restricted to runs of one strategy type.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeSpec {
    pub strategy: String,
    pub params: Vec<String>,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.startcash <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "startcash must be positive, got {}",
                self.startcash
            )));
        }
        Ok(())
    }
}
