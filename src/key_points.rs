//! Key-point extraction via the Gemini `generateContent` API.
//!
//! Models are tried in the configured order until one answers. If none does,
//! or the answer has no usable lines, keyword-triggered canned statements are
//! used instead.

use serde::Deserialize;
use thiserror::Error;

use crate::config::KeyPointConfig;

/// Upper bound on points returned for one review.
pub const MAX_POINTS: usize = 3;

/// Emitted when no fallback trigger matches.
pub const GENERIC_POINT: &str = "Ulasan bersifat umum, tidak ada poin dominan.";

/// Fallback triggers in priority order: any substring hit appends the statement once.
const FALLBACK_RULES: &[(&[&str], &str)] = &[
    (
        &["cepat", "lambat", "lemot", "performa", "kencang", "lelet"],
        "Performa dan kecepatan produk menjadi sorotan utama.",
    ),
    (
        &["baterai", "awet", "tahan lama", "daya tahan"],
        "Daya tahan baterai atau produk dibahas dalam ulasan.",
    ),
    (
        &["harga", "mahal", "murah"],
        "Harga produk menjadi pertimbangan penting.",
    ),
];

/// Derives key points from `text` with the keyword rules alone.
pub fn fallback_extract(text: &str) -> Vec<String> {
    let lowercase_text = text.to_lowercase();

    let mut points: Vec<String> = FALLBACK_RULES
        .iter()
        .filter(|(triggers, _)| triggers.iter().any(|t| lowercase_text.contains(t)))
        .map(|(_, statement)| statement.to_string())
        .collect();

    if points.is_empty() {
        points.push(GENERIC_POINT.to_string());
    }
    points.truncate(MAX_POINTS);
    points
}

/// Splits model output into cleaned bullet lines, keeping at most [`MAX_POINTS`].
pub fn parse_points(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| {
            line.trim_start_matches(|c: char| c == '-' || c == '•' || c.is_whitespace())
                .trim_end()
        })
        .filter(|line| !line.is_empty())
        .take(MAX_POINTS)
        .map(String::from)
        .collect()
}

fn build_prompt(text: &str) -> String {
    format!(
        "Dari ulasan produk berikut, identifikasi maksimal 3 poin kunci terpenting. \
         Tulis jawaban dalam bahasa Indonesia sebagai daftar poin, satu poin per baris, \
         masing-masing diawali tanda \"-\", tanpa teks pembuka atau penutup.\n\
         Ulasan: \"{}\"",
        text
    )
}

#[derive(Debug, Error)]
pub enum KeyPointError {
    #[error("HTTP {0}: {1}")]
    Status(u16, String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("undecodable response: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate; empty when the model produced none.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Client for the generative key-point endpoint.
pub struct KeyPointExtractor {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    models: Vec<String>,
}

impl KeyPointExtractor {
    pub fn new(config: &KeyPointConfig) -> Result<Self, KeyPointError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            models: config.models.clone(),
        })
    }

    /// One `generateContent` call against `model`.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String, KeyPointError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let payload = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(200)
                .collect();
            return Err(KeyPointError::Status(status.as_u16(), detail));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| KeyPointError::Decode(e.to_string()))?;
        Ok(body.text())
    }

    /// Returns between one and three key points for `text`. Never fails.
    pub async fn extract(&self, text: &str) -> Vec<String> {
        let prompt = build_prompt(text);

        for model in &self.models {
            match self.generate(model, &prompt).await {
                Ok(raw) => {
                    let points = parse_points(&raw);
                    if points.is_empty() {
                        tracing::info!("[KeyPoints] {} returned no usable lines, using keyword fallback", model);
                        return fallback_extract(text);
                    }
                    tracing::debug!("[KeyPoints] {} produced {} points", model, points.len());
                    return points;
                }
                Err(e) => tracing::warn!("⚠️ [KeyPoints] {} failed: {}", model, e),
            }
        }

        tracing::info!("[KeyPoints] all {} models failed, using keyword fallback", self.models.len());
        fallback_extract(text)
    }
}
