//! Environment configuration.

use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_MODEL: &str = "sonar";

/// Settings read from the process environment (and `.env`, if present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Absent key means adjustments are always neutral.
    pub perplexity_api_key: Option<String>,
    pub perplexity_base_url: String,
    pub perplexity_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            perplexity_api_key: None,
            perplexity_base_url: DEFAULT_BASE_URL.to_string(),
            perplexity_model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let non_empty = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_url = non_empty("PERPLEXITY_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "PERPLEXITY_BASE_URL must start with http:// or https:// (got '{base_url}')"
            )));
        }

        Ok(Self {
            perplexity_api_key: non_empty("PERPLEXITY_API_KEY"),
            perplexity_base_url: base_url,
            perplexity_model: non_empty("PERPLEXITY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}
