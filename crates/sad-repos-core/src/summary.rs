//! Per-repository sentiment summaries.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::repo::RepoId;
use crate::sentiment::{AnalysisResult, Sentiment};

/// Confidence required by default, in percent.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 75.0;

/// Minimum confidence for a result to count as positive or negative.
///
/// Always within 0-100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct ConfidenceThreshold(f32);

impl ConfidenceThreshold {
    pub fn new(value: f32) -> Result<Self, ConfigError> {
        if (0.0..=100.0).contains(&value) {
            Ok(ConfidenceThreshold(value))
        } else {
            Err(ConfigError::InvalidThreshold { value })
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Whether a result with `confidence` clears the threshold.
    pub fn admits(self, confidence: f32) -> bool {
        confidence >= self.0
    }
}

impl Default for ConfidenceThreshold {
    fn default() -> Self {
        ConfidenceThreshold(DEFAULT_MIN_CONFIDENCE)
    }
}

impl TryFrom<f32> for ConfidenceThreshold {
    type Error = ConfigError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        ConfidenceThreshold::new(value)
    }
}

impl From<ConfidenceThreshold> for f32 {
    fn from(threshold: ConfidenceThreshold) -> Self {
        threshold.0
    }
}

impl std::fmt::Display for ConfidenceThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Positive-to-negative ratio.
///
/// Zero negative results never produce an IEEE infinity or NaN: the ratio
/// is `Unbounded` when there are positives and `Undefined` when there are
/// none either.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PosNegRatio {
    Finite(f64),
    Unbounded,
    Undefined,
}

impl PosNegRatio {
    pub fn new(positive: usize, negative: usize) -> Self {
        match (positive, negative) {
            (0, 0) => PosNegRatio::Undefined,
            (_, 0) => PosNegRatio::Unbounded,
            (p, n) => PosNegRatio::Finite(p as f64 / n as f64),
        }
    }

    pub fn as_f64(self) -> Option<f64> {
        match self {
            PosNegRatio::Finite(value) => Some(value),
            _ => None,
        }
    }
}

impl std::fmt::Display for PosNegRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PosNegRatio::Finite(value) => write!(f, "{value:.6}"),
            PosNegRatio::Unbounded => write!(f, "inf"),
            PosNegRatio::Undefined => write!(f, "n/a"),
        }
    }
}

/// Counts derived from one repository's analysis results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub repo: RepoId,
    /// Positive results at or above the threshold
    pub positive: usize,
    /// Negative results at or above the threshold
    pub negative: usize,
    /// Results below the threshold, whatever their label
    pub below_threshold: usize,
    pub total: usize,
    pub mean_confidence: Option<f32>,
    pub ratio: PosNegRatio,
}

impl RepositorySummary {
    pub fn from_results(
        repo: RepoId,
        results: &[AnalysisResult],
        threshold: ConfidenceThreshold,
    ) -> Self {
        let mut positive = 0;
        let mut negative = 0;
        let mut below_threshold = 0;

        for result in results {
            if !threshold.admits(result.confidence) {
                below_threshold += 1;
                continue;
            }
            match result.sentiment {
                Sentiment::Positive => positive += 1,
                Sentiment::Negative => negative += 1,
                Sentiment::Other(_) => {}
            }
        }

        let mean_confidence = if results.is_empty() {
            None
        } else {
            let sum: f32 = results.iter().map(|r| r.confidence).sum();
            Some(sum / results.len() as f32)
        };

        RepositorySummary {
            repo,
            positive,
            negative,
            below_threshold,
            total: results.len(),
            mean_confidence,
            ratio: PosNegRatio::new(positive, negative),
        }
    }
}
