//! Size-bounded batching of commit messages.
//!
//! The sentiment service accepts a JSON array of strings and rejects large
//! payloads, so messages are grouped into batches whose compact JSON
//! encoding stays within a byte ceiling. Batching is a single forward pass:
//!
//! - a message joins the pending batch when the grown batch still fits;
//! - otherwise the pending batch is sealed and the message starts a new one;
//! - a message that is too large on its own still travels, alone.
//!
//! Messages are never split, dropped or reordered.

use crate::commits::CommitMessage;
use crate::error::BatchError;

/// Default payload ceiling in bytes.
pub const MAX_BATCH_BYTES: usize = 1_000_000;

/// Encoded length of a JSON array holding `count` elements of
/// `element_bytes` total encoded size.
fn array_len(count: usize, element_bytes: usize) -> usize {
    2 + element_bytes + count.saturating_sub(1)
}

/// Encoded length of a single message as a JSON string.
pub fn encoded_message_len(message: &str) -> Result<usize, BatchError> {
    serde_json::to_vec(message)
        .map(|encoded| encoded.len())
        .map_err(BatchError::Serialize)
}

/// An ordered group of messages sent in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    messages: Vec<CommitMessage>,
    element_bytes: usize,
}

impl Batch {
    pub fn messages(&self) -> &[CommitMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<CommitMessage> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Size in bytes of [`Batch::to_json`].
    pub fn encoded_len(&self) -> usize {
        array_len(self.messages.len(), self.element_bytes)
    }

    /// The request body: a compact JSON array of the messages.
    pub fn to_json(&self) -> Result<Vec<u8>, BatchError> {
        serde_json::to_vec(&self.messages).map_err(BatchError::Serialize)
    }

    fn encoded_len_with(&self, element_len: usize) -> usize {
        array_len(self.messages.len() + 1, self.element_bytes + element_len)
    }

    fn push(&mut self, message: CommitMessage, element_len: usize) {
        self.messages.push(message);
        self.element_bytes += element_len;
    }
}

/// Accumulates messages into batches under a byte ceiling.
#[derive(Debug, Clone)]
pub struct BatchBuilder {
    limit: usize,
    pending: Batch,
}

impl Default for BatchBuilder {
    fn default() -> Self {
        BatchBuilder::new(MAX_BATCH_BYTES)
    }
}

impl BatchBuilder {
    pub fn new(limit: usize) -> Self {
        BatchBuilder {
            limit,
            pending: Batch::default(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn pending(&self) -> &Batch {
        &self.pending
    }

    /// Add `message`, returning the batch sealed to make room for it, if any.
    pub fn push(&mut self, message: CommitMessage) -> Result<Option<Batch>, BatchError> {
        let element_len = encoded_message_len(&message)?;

        if self.pending.encoded_len_with(element_len) > self.limit && !self.pending.is_empty() {
            let sealed = std::mem::take(&mut self.pending);
            self.pending.push(message, element_len);
            return Ok(Some(sealed));
        }

        self.pending.push(message, element_len);
        Ok(None)
    }

    /// Seal whatever is pending. Returns `None` when nothing is.
    pub fn flush(&mut self) -> Option<Batch> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

/// Iterator adapter turning a message sequence into batches.
pub struct Batches<I> {
    messages: I,
    builder: BatchBuilder,
    failed: bool,
}

impl<I> Batches<I>
where
    I: Iterator<Item = CommitMessage>,
{
    pub fn new(messages: I, limit: usize) -> Self {
        Batches {
            messages,
            builder: BatchBuilder::new(limit),
            failed: false,
        }
    }
}

impl<I> Iterator for Batches<I>
where
    I: Iterator<Item = CommitMessage>,
{
    type Item = Result<Batch, BatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        for message in self.messages.by_ref() {
            match self.builder.push(message) {
                Ok(Some(batch)) => return Some(Ok(batch)),
                Ok(None) => {}
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
        self.builder.flush().map(Ok)
    }
}

/// Partition `messages` into batches of at most `limit` encoded bytes.
pub fn batches<I>(messages: I, limit: usize) -> Batches<I::IntoIter>
where
    I: IntoIterator<Item = CommitMessage>,
{
    Batches::new(messages.into_iter(), limit)
}
