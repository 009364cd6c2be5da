//! Macro-economic adjustment via a Perplexity-style chat completions API.
//!
//! The client only ever sends the anonymized [`AdjustmentRequest`] (industry,
//! location, cadence, three summary numbers and holiday names). Every failure
//! mode is folded into [`AdjustmentOutcome::Degraded`] so callers always get a
//! usable, neutral answer.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::domain::{AdjustmentRequest, AiAdjustment};
use crate::error::AppError;

/// Bound on the absolute adjustment, in percent.
pub const MAX_ADJUSTMENT_PCT: f64 = 20.0;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: u32 = 500;
const DEFAULT_RATIONALE: &str = "Macro adjustment applied";

const SYSTEM_PROMPT: &str = "You are a cautious forecaster. You never see raw sales data. \
You only output a small adjustment percentage and a concise rationale. \
Stay within ±20% total adjustment.";

/// Why no adjustment could be obtained.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DegradedReason {
    #[error("API key not configured")]
    MissingCredentials,
    #[error("API request timed out")]
    Timeout,
    #[error("API service unavailable")]
    Transport(String),
    #[error("API request failed (status {0})")]
    HttpStatus(u16),
    #[error("Empty API response")]
    EmptyResponse,
    #[error("Invalid API response format")]
    InvalidFormat(String),
    #[error("Invalid adjustment value")]
    InvalidAdjustment(String),
}

/// Result of one adjustment attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AdjustmentOutcome {
    Success {
        adjustment_pct: f64,
        rationale: String,
        sources: Vec<String>,
    },
    Degraded {
        reason: DegradedReason,
    },
}

impl AdjustmentOutcome {
    /// Convert into the reported adjustment. Degraded outcomes are neutral.
    pub fn into_adjustment(self) -> AiAdjustment {
        match self {
            AdjustmentOutcome::Success {
                adjustment_pct,
                rationale,
                sources,
            } => AiAdjustment {
                applied: true,
                adjustment_pct: clamp_pct(adjustment_pct),
                rationale,
                sources,
            },
            AdjustmentOutcome::Degraded { reason } => AiAdjustment {
                applied: false,
                adjustment_pct: 0.0,
                rationale: format!("No reliable macro adjustment - {reason}"),
                sources: Vec::new(),
            },
        }
    }
}

/// Source of bounded macro adjustments.
#[async_trait]
pub trait MacroAdjuster: Send + Sync {
    async fn adjust(&self, request: &AdjustmentRequest) -> AdjustmentOutcome;
}

/// Clamp to `[-20, 20]`; non-finite input becomes 0.
pub fn clamp_pct(pct: f64) -> f64 {
    if pct.is_finite() {
        pct.clamp(-MAX_ADJUSTMENT_PCT, MAX_ADJUSTMENT_PCT)
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct SonarClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
}

impl SonarClient {
    pub fn new(settings: &Settings) -> Result<Self, AppError> {
        Self::with_timeout(settings, REQUEST_TIMEOUT)
    }

    fn with_timeout(settings: &Settings, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("salesforecast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;

        let api_key = settings
            .perplexity_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        if api_key.is_none() {
            warn!("PERPLEXITY_API_KEY not set; macro adjustments will be neutral");
        }

        Ok(Self {
            http,
            api_key,
            endpoint: format!("{}/chat/completions", settings.perplexity_base_url.trim_end_matches('/')),
            model: settings.perplexity_model.clone(),
        })
    }

    async fn request_adjustment(&self, api_key: &str, request: &AdjustmentRequest) -> AdjustmentOutcome {
        let body = ChatRequest {
            model: &self.model,
            messages: build_messages(request),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = match self.http.post(&self.endpoint).bearer_auth(api_key).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => return degraded(DegradedReason::Timeout),
            Err(e) => return degraded(DegradedReason::Transport(e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %truncate(&text, 200), "adjustment API error");
            return degraded(DegradedReason::HttpStatus(status.as_u16()));
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) if e.is_timeout() => return degraded(DegradedReason::Timeout),
            Err(e) => return degraded(DegradedReason::Transport(e.to_string())),
        };
        let parsed: ChatResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => return degraded(DegradedReason::InvalidFormat(e.to_string())),
        };

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return degraded(DegradedReason::EmptyResponse);
        }

        match parse_adjustment(&content, &parsed.citations) {
            Ok(outcome) => outcome,
            Err(reason) => {
                warn!(content = %truncate(&content, 200), "unusable adjustment content");
                degraded(reason)
            }
        }
    }
}

#[async_trait]
impl MacroAdjuster for SonarClient {
    async fn adjust(&self, request: &AdjustmentRequest) -> AdjustmentOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            return degraded(DegradedReason::MissingCredentials);
        };

        info!(
            industry = %request.industry,
            location = %request.location(),
            freq = %request.freq,
            horizon = request.horizon,
            "requesting macro adjustment"
        );
        let outcome = self.request_adjustment(api_key, request).await;
        if let AdjustmentOutcome::Success { adjustment_pct, .. } = &outcome {
            info!(adjustment_pct, "macro adjustment received");
        }
        outcome
    }
}

fn degraded(reason: DegradedReason) -> AdjustmentOutcome {
    match &reason {
        DegradedReason::Transport(detail) | DegradedReason::InvalidFormat(detail) => {
            error!(%reason, detail = %detail, "macro adjustment unavailable");
        }
        _ => warn!(%reason, "macro adjustment unavailable"),
    }
    AdjustmentOutcome::Degraded { reason }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// System + user messages for one request. Only anonymized fields are used.
pub fn build_messages(request: &AdjustmentRequest) -> Vec<ChatMessage> {
    let units = request.freq.units();
    let summary = &request.recent_summary;
    let holidays = if request.holidays_window.is_empty() {
        "None".to_string()
    } else {
        request.holidays_window.join(", ")
    };
    let industry = request.industry.trim();
    let country = request.country.trim();
    let state = request.state.as_deref().map(str::trim).unwrap_or_default();
    let city = request.city.as_deref().map(str::trim).unwrap_or_default();

    let user = format!(
        "We have a short-term {freq}-level sales forecast for the {industry} sector in {location}.\n\
         Horizon: next {horizon} {units}.\n\
         Recent pattern summary (approximate, anonymized):\n\
         - Last 4 {units} growth: {growth}%\n\
         - YoY last comparable period: {yoy}%\n\
         - Volatility index (0-1): {vol}\n\
         \n\
         Upcoming holidays/events in scope: {holidays}\n\
         \n\
         Task:\n\
         1) Search current macro signals that materially impact {industry} in {country}/{state}/{city}: \
         inflation/CPI, consumer confidence, policy rates, FX, fuel, supply/logistics, major retail events, \
         weather anomalies.\n\
         2) Propose one net bounded adjustment in percent (negative for down, positive for up) in the range \
         -20 to +20 applied to the baseline.\n\
         3) Provide a concise rationale (<= 60 words) with 2-4 bullet reasons.\n\
         4) Return STRICT JSON ONLY:\n\
         \n\
         {{\n  \"adjustment_pct\": <number between -20 and 20>,\n  \"rationale\": \"<one short paragraph>\",\n  \
         \"sources\": [\"<url1>\", \"<url2>\"]\n}}\n\
         \n\
         Do not include any other text.",
        freq = request.freq.code(),
        location = request.location(),
        horizon = request.horizon,
        growth = summary.last4_growth_pct,
        yoy = summary.yoy_last_period_pct,
        vol = summary.volatility_index,
    );

    vec![
        ChatMessage {
            role: "system",
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user",
            content: user,
        },
    ]
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Interpret the model's message content.
///
/// `citations` is the response's top-level citation list, used when the
/// content carries no `sources` of its own.
pub fn parse_adjustment(content: &str, citations: &[String]) -> Result<AdjustmentOutcome, DegradedReason> {
    let json = extract_json(content).ok_or_else(|| DegradedReason::InvalidFormat("no JSON object found".to_string()))?;
    let value: Value = serde_json::from_str(json).map_err(|e| DegradedReason::InvalidFormat(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| DegradedReason::InvalidFormat("expected a JSON object".to_string()))?;

    let raw_pct = match object.get("adjustment_pct") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    let pct = raw_pct
        .filter(|p| p.is_finite())
        .ok_or_else(|| DegradedReason::InvalidAdjustment(format!("{:?}", object.get("adjustment_pct"))))?;

    let rationale = object
        .get("rationale")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_RATIONALE)
        .to_string();

    let sources = match object.get("sources") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => citations.to_vec(),
    };

    Ok(AdjustmentOutcome::Success {
        adjustment_pct: clamp_pct(pct),
        rationale,
        sources,
    })
}

/// Pull the JSON payload out of free-form model text.
///
/// Markdown code fences win; otherwise the span from the first `{` to the
/// last `}` is used.
fn extract_json(text: &str) -> Option<&str> {
    let text = text.trim();
    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        let inner = match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        };
        let inner = inner.trim();
        if inner.starts_with('{') {
            return Some(inner);
        }
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
