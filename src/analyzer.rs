//! Review analysis pipeline: sentiment, then key points.

use serde::Serialize;

use crate::config::Config;
use crate::key_points::KeyPointExtractor;
use crate::sentiment::SentimentClient;

/// Outcome of analysing one review, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub sentiment: String,
    pub key_points: String,
}

/// Renders points as `- point` lines joined by newlines.
pub fn render_key_points(points: &[String]) -> String {
    points
        .iter()
        .map(|p| format!("- {}", p))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct ReviewAnalyzer {
    sentiment: SentimentClient,
    key_points: KeyPointExtractor,
}

impl ReviewAnalyzer {
    pub fn new(sentiment: SentimentClient, key_points: KeyPointExtractor) -> Self {
        Self { sentiment, key_points }
    }

    /// Builds both remote adapters from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            SentimentClient::new(&config.sentiment)?,
            KeyPointExtractor::new(&config.key_points)?,
        ))
    }

    /// Analyses `text`. Remote failures are absorbed by the adapters, so this
    /// always yields a result.
    pub async fn analyze(&self, text: &str) -> AnalysisResult {
        let sentiment = self.sentiment.classify(text).await;
        let points = self.key_points.extract(text).await;

        tracing::info!("🧠 Review analysed: sentiment={}, {} key points", sentiment, points.len());

        AnalysisResult {
            sentiment,
            key_points: render_key_points(&points),
        }
    }
}
