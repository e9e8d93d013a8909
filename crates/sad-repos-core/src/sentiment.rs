//! Sentiment classification wire types and transport.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{excerpt, BatchError};

/// Batch endpoint of the public sentiment service.
pub const DEFAULT_SENTIMENT_ENDPOINT: &str = "http://sentiment.vivekn.com/api/batch/";

/// Classifier label. Labels other than `Positive`/`Negative` are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sentiment {
    Positive,
    Negative,
    Other(String),
}

impl From<String> for Sentiment {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Positive" => Sentiment::Positive,
            "Negative" => Sentiment::Negative,
            _ => Sentiment::Other(label),
        }
    }
}

impl From<Sentiment> for String {
    fn from(sentiment: Sentiment) -> Self {
        match sentiment {
            Sentiment::Positive => "Positive".to_string(),
            Sentiment::Negative => "Negative".to_string(),
            Sentiment::Other(label) => label,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "Positive"),
            Sentiment::Negative => write!(f, "Negative"),
            Sentiment::Other(label) => write!(f, "{label}"),
        }
    }
}

/// Classification of one commit message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sentiment: Sentiment,
    /// Classifier certainty, 0-100
    pub confidence: f32,
}

/// Record as returned by the service; confidence arrives as text.
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    result: String,
    confidence: String,
}

/// Parse a textual confidence such as `"87.50"`.
pub fn parse_confidence(index: usize, value: &str) -> Result<f32, BatchError> {
    let invalid = |reason: String| BatchError::InvalidConfidence {
        index,
        value: value.to_string(),
        reason,
    };

    let confidence: f32 = value
        .parse()
        .map_err(|e: std::num::ParseFloatError| invalid(e.to_string()))?;
    if !confidence.is_finite() {
        return Err(invalid("not a finite number".to_string()));
    }
    Ok(confidence)
}

/// Decode a sentiment service response body.
///
/// The first unparsable confidence rejects the whole body.
pub fn parse_response(body: &str) -> Result<Vec<AnalysisResult>, BatchError> {
    let raw: Vec<RawAnalysis> =
        serde_json::from_str(body).map_err(|source| BatchError::MalformedResponse {
            source,
            body: excerpt(body),
        })?;

    raw.into_iter()
        .enumerate()
        .map(|(index, record)| {
            Ok::<_, BatchError>(AnalysisResult {
                confidence: parse_confidence(index, &record.confidence)?,
                sentiment: Sentiment::from(record.result),
            })
        })
        .collect()
}

/// Remote batch classifier.
#[async_trait]
pub trait SentimentTransport: Send + Sync {
    /// POST an encoded batch and return the raw success body.
    async fn post_batch(&self, payload: Vec<u8>) -> Result<String, BatchError>;
}

/// [`SentimentTransport`] over HTTP.
pub struct HttpSentimentClient {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpSentimentClient {
    pub fn new(endpoint: &str, http: reqwest::Client) -> Self {
        HttpSentimentClient {
            endpoint: endpoint.to_string(),
            http,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SentimentTransport for HttpSentimentClient {
    async fn post_batch(&self, payload: Vec<u8>) -> Result<String, BatchError> {
        debug!(endpoint = %self.endpoint, bytes = payload.len(), "posting sentiment batch");

        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(BatchError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(BatchError::Transport)?;

        if !status.is_success() {
            return Err(BatchError::Status {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_confidence_decimal_text() {
        let value = parse_confidence(0, "87.50").unwrap();
        assert!((value - 87.5).abs() < 1e-4);
        assert_eq!(parse_confidence(0, "100").unwrap(), 100.0);
        assert_eq!(parse_confidence(0, "0.0").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_confidence_rejects_garbage() {
        let err = parse_confidence(4, "eighty").unwrap_err();
        match err {
            BatchError::InvalidConfidence { index, value, .. } => {
                assert_eq!(index, 4);
                assert_eq!(value, "eighty");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_confidence(0, "").is_err());
        assert!(parse_confidence(0, " 87.5").is_err());
    }

    #[test]
    fn test_parse_confidence_rejects_non_finite() {
        assert!(parse_confidence(0, "NaN").is_err());
        assert!(parse_confidence(0, "inf").is_err());
    }

    #[test]
    fn test_parse_response_keeps_order_and_labels() {
        let body = r#"[
            {"result": "Positive", "confidence": "87.50"},
            {"result": "Negative", "confidence": "61.2"},
            {"result": "Neutral", "confidence": "50"}
        ]"#;
        let results = parse_response(body).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].sentiment, Sentiment::Positive);
        assert!((results[0].confidence - 87.5).abs() < 1e-4);
        assert_eq!(results[1].sentiment, Sentiment::Negative);
        assert_eq!(results[2].sentiment, Sentiment::Other("Neutral".to_string()));
    }

    #[test]
    fn test_parse_response_one_bad_confidence_fails_batch() {
        let body = r#"[
            {"result": "Positive", "confidence": "87.50"},
            {"result": "Negative", "confidence": "n/a"}
        ]"#;
        let err = parse_response(body).unwrap_err();
        assert!(matches!(err, BatchError::InvalidConfidence { index: 1, .. }));
    }

    #[test]
    fn test_parse_response_malformed_json_carries_body() {
        let err = parse_response("<html>502 Bad Gateway</html>").unwrap_err();
        match &err {
            BatchError::MalformedResponse { body, .. } => {
                assert!(body.contains("502 Bad Gateway"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("502 Bad Gateway"));
    }

    #[test]
    fn test_parse_response_numeric_confidence_is_malformed() {
        let err = parse_response(r#"[{"result": "Positive", "confidence": 87.5}]"#).unwrap_err();
        assert!(matches!(err, BatchError::MalformedResponse { .. }));
    }

    #[test]
    fn test_sentiment_label_round_trip() {
        let json = serde_json::to_string(&Sentiment::Other("Mixed".into())).unwrap();
        assert_eq!(json, r#""Mixed""#);
        let parsed: Sentiment = serde_json::from_str(r#""Negative""#).unwrap();
        assert_eq!(parsed, Sentiment::Negative);
        assert_eq!(Sentiment::Positive.to_string(), "Positive");
    }
}
