//! Batch analysis: one request per batch, results concatenated in order.

use std::sync::Arc;

use tracing::debug;

use crate::batch::{batches, Batch, MAX_BATCH_BYTES};
use crate::commits::CommitMessage;
use crate::error::BatchError;
use crate::obs;
use crate::sentiment::{parse_response, AnalysisResult, SentimentTransport};

/// Sends size-bounded batches to a [`SentimentTransport`].
#[derive(Clone)]
pub struct BatchAnalyzer {
    transport: Arc<dyn SentimentTransport>,
    limit: usize,
}

impl BatchAnalyzer {
    pub fn new(transport: Arc<dyn SentimentTransport>) -> Self {
        BatchAnalyzer {
            transport,
            limit: MAX_BATCH_BYTES,
        }
    }

    /// Use a different payload ceiling.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Classify one batch.
    ///
    /// The response must hold exactly one record per message; results keep
    /// the order the service returned them in.
    pub async fn bulk_analyze(&self, batch: &Batch) -> Result<Vec<AnalysisResult>, BatchError> {
        let payload = batch.to_json()?;
        let body = self.transport.post_batch(payload).await?;
        let results = parse_response(&body)?;

        if results.len() != batch.len() {
            return Err(BatchError::ResultCountMismatch {
                expected: batch.len(),
                actual: results.len(),
            });
        }
        Ok(results)
    }

    /// Classify every message, batching under the configured ceiling.
    ///
    /// Batches are sent one at a time. The first failure aborts the run and
    /// no partial result is returned.
    pub async fn process<I>(&self, messages: I) -> Result<Vec<AnalysisResult>, BatchError>
    where
        I: IntoIterator<Item = CommitMessage>,
    {
        let mut results = Vec::new();

        for (seq, batch) in batches(messages, self.limit).enumerate() {
            let batch = batch?;
            debug!(seq, messages = batch.len(), bytes = batch.encoded_len(), "flushing batch");

            let analysed = self.bulk_analyze(&batch).await?;
            obs::emit_batch_analyzed(seq, batch.len(), batch.encoded_len());
            results.extend(analysed);
        }

        Ok(results)
    }
}
