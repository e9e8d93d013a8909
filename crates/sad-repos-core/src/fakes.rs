//! In-memory fakes for the remote collaborators (testing only)
//!
//! `MemoryCommitSource` serves scripted commit pages and records every page
//! request; `FakeSentimentTransport` classifies messages with a closure,
//! optionally overridden by queued replies, and records every batch sent.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::commits::{CommitMessage, CommitPage, CommitSource};
use crate::error::{BatchError, FetchError};
use crate::repo::RepoId;
use crate::sentiment::SentimentTransport;

// ---------------------------------------------------------------------------
// MemoryCommitSource
// ---------------------------------------------------------------------------

/// A page request observed by [`MemoryCommitSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub repo: RepoId,
    pub page: u32,
    pub per_page: u32,
}

/// Commit source serving fixed pages per repository.
///
/// Page `n` links to page `n + 1` while more pages exist. Unknown
/// repositories answer HTTP 404.
#[derive(Debug, Default)]
pub struct MemoryCommitSource {
    pages: HashMap<RepoId, Vec<Vec<CommitMessage>>>,
    failures: HashMap<(RepoId, u32), u16>,
    requests: Mutex<Vec<PageRequest>>,
}

impl MemoryCommitSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `pages` for `repo`, first page first.
    pub fn with_pages(mut self, repo: &RepoId, pages: Vec<Vec<&str>>) -> Self {
        let pages: Vec<Vec<CommitMessage>> = pages
            .into_iter()
            .map(|page| page.into_iter().map(str::to_string).collect())
            .collect();
        self.pages.insert(repo.clone(), pages);
        self
    }

    /// Answer `page` of `repo` with HTTP `status` instead of commits.
    pub fn failing_at(mut self, repo: &RepoId, page: u32, status: u16) -> Self {
        self.failures.insert((repo.clone(), page), status);
        self
    }

    /// Every page request received so far.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommitSource for MemoryCommitSource {
    async fn list_commits(
        &self,
        repo: &RepoId,
        page: u32,
        per_page: u32,
    ) -> Result<CommitPage, FetchError> {
        self.requests.lock().unwrap().push(PageRequest {
            repo: repo.clone(),
            page,
            per_page,
        });

        if let Some(&status) = self.failures.get(&(repo.clone(), page)) {
            let body = "scripted failure".to_string();
            return Err(match status {
                401 | 403 => FetchError::Unauthorized {
                    repo: repo.to_string(),
                    status,
                    body,
                },
                _ => FetchError::Status {
                    repo: repo.to_string(),
                    status,
                    body,
                },
            });
        }

        let pages = self.pages.get(repo).ok_or_else(|| FetchError::Status {
            repo: repo.to_string(),
            status: 404,
            body: "Not Found".to_string(),
        })?;

        let index = page.saturating_sub(1) as usize;
        let messages = pages.get(index).cloned().unwrap_or_default();
        let next_page = if index + 1 < pages.len() {
            Some(page + 1)
        } else {
            None
        };

        Ok(CommitPage {
            messages,
            next_page,
        })
    }
}

// ---------------------------------------------------------------------------
// FakeSentimentTransport
// ---------------------------------------------------------------------------

type Classifier = Box<dyn Fn(&str) -> (String, String) + Send + Sync>;

/// Sentiment transport answering from a classifier closure.
///
/// Queued replies take precedence, one per request: `Ok(body)` is returned
/// verbatim and `Err(status)` becomes [`BatchError::Status`].
pub struct FakeSentimentTransport {
    classify: Classifier,
    replies: Mutex<VecDeque<Result<String, u16>>>,
    batches: Mutex<Vec<Vec<CommitMessage>>>,
}

impl FakeSentimentTransport {
    /// Classify each message as `(label, confidence text)`.
    pub fn new<F>(classify: F) -> Self
    where
        F: Fn(&str) -> (String, String) + Send + Sync + 'static,
    {
        FakeSentimentTransport {
            classify: Box::new(classify),
            replies: Mutex::new(VecDeque::new()),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Every message is `Positive` at 87.50.
    pub fn positive() -> Self {
        Self::new(|_| ("Positive".to_string(), "87.50".to_string()))
    }

    /// Queue a scripted reply for the next unanswered request.
    pub fn with_reply(self, reply: Result<String, u16>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Decoded batches in the order they were posted.
    pub fn batches(&self) -> Vec<Vec<CommitMessage>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl SentimentTransport for FakeSentimentTransport {
    async fn post_batch(&self, payload: Vec<u8>) -> Result<String, BatchError> {
        let messages: Vec<CommitMessage> =
            serde_json::from_slice(&payload).map_err(BatchError::Serialize)?;
        self.batches.lock().unwrap().push(messages.clone());

        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            return reply.map_err(|status| BatchError::Status {
                status,
                body: "scripted failure".to_string(),
            });
        }

        let records: Vec<serde_json::Value> = messages
            .iter()
            .map(|message| {
                let (result, confidence) = (self.classify)(message.as_str());
                serde_json::json!({ "result": result, "confidence": confidence })
            })
            .collect();
        Ok(serde_json::Value::Array(records).to_string())
    }
}
