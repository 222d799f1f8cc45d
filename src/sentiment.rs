//! Sentiment classification for product reviews.
//!
//! The hosted Hugging Face classifier is the primary source of labels. Remote
//! failures that still produced an HTTP response become fixed "degraded" labels;
//! when the endpoint cannot be reached at all, a keyword heuristic over
//! Indonesian review vocabulary stands in for it.

use once_cell::sync::Lazy;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::SentimentConfig;

pub const LABEL_POSITIVE: &str = "POSITIVE";
pub const LABEL_NEGATIVE: &str = "NEGATIVE";
pub const LABEL_NEUTRAL: &str = "NEUTRAL";

/// Degraded label: the classifier rejected our token (HTTP 401).
pub const LABEL_UNAUTHORIZED: &str = "NEUTRAL (UNAUTHORIZED)";
/// Degraded label: the classifier is rate limited or still loading (HTTP 429/503).
pub const LABEL_MODEL_BUSY: &str = "NEUTRAL (MODEL BUSY)";
/// Degraded label: any other status or an unusable response body.
pub const LABEL_ERROR: &str = "NEUTRAL (ERROR)";

// Markers are matched as substrings of the lower-cased review.
static POSITIVE_MARKERS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "bagus", "mantap", "cepat", "puas", "suka", "keren", "awet", "murah",
        "rekomendasi", "terbaik", "lancar", "nyaman",
    ]
});

static NEGATIVE_MARKERS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "mahal", "jelek", "lambat", "lemot", "kecewa", "buruk", "rusak", "boros",
        "lelet", "cacat",
    ]
});

/// Classifies `text` with the keyword heuristic.
///
/// Each marker counts once no matter how often it appears. Positive minus
/// negative hits decides the label; a tie is neutral.
pub fn fallback_classify(text: &str) -> &'static str {
    let lowercase_text = text.to_lowercase();

    let positive_count = POSITIVE_MARKERS
        .iter()
        .filter(|m| lowercase_text.contains(*m))
        .count() as i64;
    let negative_count = NEGATIVE_MARKERS
        .iter()
        .filter(|m| lowercase_text.contains(*m))
        .count() as i64;

    match positive_count - negative_count {
        score if score > 0 => LABEL_POSITIVE,
        score if score < 0 => LABEL_NEGATIVE,
        _ => LABEL_NEUTRAL,
    }
}

/// Why a remote classification did not produce a label.
#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("classifier rejected the API token")]
    Unauthorized,

    #[error("classifier overloaded (HTTP {0})")]
    Overloaded(u16),

    #[error("classifier returned HTTP {0}")]
    Status(u16),

    #[error("unexpected classifier response: {0}")]
    UnexpectedShape(String),

    #[error("classifier unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Picks the highest-scoring label from an inference response.
///
/// Accepts both `[{label, score}, ...]` and `[[{label, score}, ...]]`.
fn best_label(body: &Value) -> Result<String, SentimentError> {
    let Value::Array(items) = body else {
        return Err(SentimentError::UnexpectedShape("body is not a list".to_string()));
    };

    let candidates = match items.first() {
        Some(Value::Array(inner)) => inner,
        _ => items,
    };

    candidates
        .iter()
        .filter_map(|v| LabelScore::deserialize(v).ok())
        // first maximum wins on ties
        .reduce(|best, c| if c.score > best.score { c } else { best })
        .map(|c| c.label.to_uppercase())
        .ok_or_else(|| SentimentError::UnexpectedShape("no label/score pairs".to_string()))
}

/// Client for the hosted sentiment classifier.
pub struct SentimentClient {
    http: reqwest::Client,
    endpoint: String,
    api_token: String,
}

impl SentimentClient {
    pub fn new(config: &SentimentConfig) -> Result<Self, SentimentError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
        })
    }

    /// Performs one inference call and classifies its outcome.
    pub async fn request(&self, text: &str) -> Result<String, SentimentError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({ "inputs": text }))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED => return Err(SentimentError::Unauthorized),
            s @ (StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE) => {
                return Err(SentimentError::Overloaded(s.as_u16()))
            }
            s => return Err(SentimentError::Status(s.as_u16())),
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| SentimentError::UnexpectedShape(e.to_string()))?;
        best_label(&value)
    }

    /// Returns a sentiment label for `text`. Never fails.
    pub async fn classify(&self, text: &str) -> String {
        match self.request(text).await {
            Ok(label) => label,
            Err(SentimentError::Transport(e)) => {
                tracing::info!("[Sentiment] classifier unreachable ({}), using keyword fallback", e);
                fallback_classify(text).to_string()
            }
            Err(SentimentError::Unauthorized) => {
                tracing::warn!("⚠️ [Sentiment] HF_API_TOKEN was rejected (401)");
                LABEL_UNAUTHORIZED.to_string()
            }
            Err(e @ SentimentError::Overloaded(_)) => {
                tracing::warn!("⚠️ [Sentiment] {}", e);
                LABEL_MODEL_BUSY.to_string()
            }
            Err(e) => {
                tracing::warn!("⚠️ [Sentiment] {}", e);
                LABEL_ERROR.to_string()
            }
        }
    }
}
