use serde::{Deserialize, Serialize};

use crate::analytics::WindowMode;

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
    #[serde(default)]
    pub display: DisplaySettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy)]
pub struct AnalyticsSettings {
    /// How payments are bucketed into the trailing twelve months
    #[serde(default)]
    pub window: WindowMode,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplaySettings {
    pub currency_symbol: String,
    /// chrono format string used for payment dates in the ledger
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            date_format: default_date_format(),
        }
    }
}

fn default_date_format() -> String {
    "%d/%m/%Y".to_string()
}
