//! Commit message collection.
//!
//! `CommitSource` is the seam to the remote commit-listing service: one call
//! returns one page. `CommitFetcher` walks the pages in order, drops merge
//! commits and hands back the remaining messages exactly as the service
//! ordered them.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{stream, Stream, TryStreamExt};
use tracing::debug;

use crate::error::FetchError;
use crate::repo::RepoId;

/// Free-text message of a single commit.
pub type CommitMessage = String;

/// Records requested per page.
pub const PAGE_SIZE: u32 = 100;

/// Pagination starts here.
pub const FIRST_PAGE: u32 = 1;

/// Messages starting with one of these are treated as merge commits.
pub const MERGE_PREFIXES: [&str; 2] = ["Merge pull request", "Merge branch"];

/// One page of a commit listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitPage {
    pub messages: Vec<CommitMessage>,
    /// Page to request next; `None` or `Some(0)` ends the listing
    pub next_page: Option<u32>,
}

/// Paginated commit-listing service.
#[async_trait]
pub trait CommitSource: Send + Sync {
    /// Fetch a single page of commit messages for `repo`.
    async fn list_commits(
        &self,
        repo: &RepoId,
        page: u32,
        per_page: u32,
    ) -> Result<CommitPage, FetchError>;
}

/// Whether a message looks like a merge commit.
pub fn is_merge_commit(message: &str) -> bool {
    MERGE_PREFIXES
        .iter()
        .any(|prefix| message.starts_with(prefix))
}

/// Walks a [`CommitSource`] page by page.
#[derive(Clone)]
pub struct CommitFetcher {
    source: Arc<dyn CommitSource>,
}

impl CommitFetcher {
    pub fn new(source: Arc<dyn CommitSource>) -> Self {
        CommitFetcher { source }
    }

    /// Raw pages for `repo`, merge commits included.
    ///
    /// The stream is lazy and single-pass: a page is requested only when the
    /// previous one has been consumed, and it ends after the first error.
    pub fn pages<'a>(
        &'a self,
        repo: &'a RepoId,
    ) -> impl Stream<Item = Result<Vec<CommitMessage>, FetchError>> + 'a {
        stream::try_unfold(Some(FIRST_PAGE), move |cursor| async move {
            let Some(page) = cursor else {
                return Ok(None);
            };

            let listing = self.source.list_commits(repo, page, PAGE_SIZE).await?;
            let next = match listing.next_page {
                None | Some(0) => None,
                Some(next) if next <= page => {
                    return Err(FetchError::MalformedResponse {
                        repo: repo.to_string(),
                        reason: format!("next page {next} does not advance past page {page}"),
                    });
                }
                Some(next) => Some(next),
            };

            Ok::<_, FetchError>(Some((listing.messages, next)))
        })
    }

    /// Non-merge commit messages for `repo`, in listing order.
    pub fn messages<'a>(
        &'a self,
        repo: &'a RepoId,
    ) -> impl Stream<Item = Result<CommitMessage, FetchError>> + 'a {
        self.pages(repo)
            .map_ok(|page| stream::iter(page.into_iter().map(Ok::<CommitMessage, FetchError>)))
            .try_flatten()
            .try_filter(|message| futures::future::ready(!is_merge_commit(message)))
    }

    /// Collect every non-merge commit message for `repo`.
    ///
    /// All-or-nothing: on error the messages gathered so far are dropped.
    pub async fn fetch(&self, repo: &RepoId) -> Result<Vec<CommitMessage>, FetchError> {
        let mut pages = std::pin::pin!(self.pages(repo));
        let mut kept = Vec::new();
        let mut disregarded = 0usize;

        while let Some(page) = pages.try_next().await? {
            for message in page {
                if is_merge_commit(&message) {
                    disregarded += 1;
                    continue;
                }
                kept.push(message);
            }
        }

        debug!(
            repo = %repo,
            kept = kept.len(),
            disregarded = disregarded,
            "collected commit messages"
        );
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemoryCommitSource;

    fn repo() -> RepoId {
        RepoId::new("octo", "cat")
    }

    #[test]
    fn test_is_merge_commit_prefixes() {
        assert!(is_merge_commit("Merge pull request #12 from octo/feature"));
        assert!(is_merge_commit("Merge branch 'main' into dev"));
        assert!(!is_merge_commit("Fix merge conflict handling"));
        assert!(!is_merge_commit("merge branch lowercase is kept"));
        assert!(!is_merge_commit(" Merge branch with leading space"));
    }

    #[tokio::test]
    async fn test_fetch_filters_merges_and_keeps_order() {
        let source = MemoryCommitSource::new().with_pages(
            &repo(),
            vec![
                vec!["third", "Merge pull request #3 from a/b", "second"],
                vec!["Merge branch 'x'", "first"],
            ],
        );
        let fetcher = CommitFetcher::new(Arc::new(source));

        let messages = fetcher.fetch(&repo()).await.unwrap();
        assert_eq!(messages, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_fetch_requests_pages_in_order_with_fixed_size() {
        let source = Arc::new(MemoryCommitSource::new().with_pages(
            &repo(),
            vec![vec!["a"], vec!["b"], vec!["c"]],
        ));
        let fetcher = CommitFetcher::new(source.clone());

        fetcher.fetch(&repo()).await.unwrap();

        let requests = source.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests.iter().map(|r| r.page).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(requests.iter().all(|r| r.per_page == PAGE_SIZE));
    }

    #[tokio::test]
    async fn test_fetch_fails_without_partial_result() {
        let source = MemoryCommitSource::new()
            .with_pages(&repo(), vec![vec!["a"], vec!["b"]])
            .failing_at(&repo(), 2, 502);
        let fetcher = CommitFetcher::new(Arc::new(source));

        let err = fetcher.fetch(&repo()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_fetch_unauthorized_surfaces_immediately() {
        let source = Arc::new(
            MemoryCommitSource::new()
                .with_pages(&repo(), vec![vec!["a"], vec!["b"]])
                .failing_at(&repo(), 1, 401),
        );
        let fetcher = CommitFetcher::new(source.clone());

        let err = fetcher.fetch(&repo()).await.unwrap_err();
        assert!(matches!(err, FetchError::Unauthorized { .. }));
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_messages_stream_is_lazy() {
        let source = Arc::new(MemoryCommitSource::new().with_pages(
            &repo(),
            vec![vec!["a", "b"], vec!["c"]],
        ));
        let fetcher = CommitFetcher::new(source.clone());
        let repo = repo();

        let mut messages = std::pin::pin!(fetcher.messages(&repo));
        assert_eq!(messages.try_next().await.unwrap(), Some("a".to_string()));
        assert_eq!(source.requests().len(), 1);

        let rest: Vec<_> = messages.try_collect().await.unwrap();
        assert_eq!(rest, vec!["b", "c"]);
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_messages_stream_skips_merges() {
        let source = MemoryCommitSource::new().with_pages(
            &repo(),
            vec![vec!["Merge branch 'a'", "keep"], vec!["Merge pull request #1"]],
        );
        let fetcher = CommitFetcher::new(Arc::new(source));
        let repo = repo();

        let messages: Vec<_> = fetcher.messages(&repo).try_collect().await.unwrap();
        assert_eq!(messages, vec!["keep"]);
    }

    #[tokio::test]
    async fn test_non_advancing_cursor_is_malformed() {
        struct StuckSource;

        #[async_trait]
        impl CommitSource for StuckSource {
            async fn list_commits(
                &self,
                _repo: &RepoId,
                page: u32,
                _per_page: u32,
            ) -> Result<CommitPage, FetchError> {
                Ok(CommitPage {
                    messages: vec!["again".to_string()],
                    next_page: Some(page),
                })
            }
        }

        let fetcher = CommitFetcher::new(Arc::new(StuckSource));
        let err = fetcher.fetch(&repo()).await.unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_zero_next_page_ends_listing() {
        struct ZeroSource;

        #[async_trait]
        impl CommitSource for ZeroSource {
            async fn list_commits(
                &self,
                _repo: &RepoId,
                _page: u32,
                _per_page: u32,
            ) -> Result<CommitPage, FetchError> {
                Ok(CommitPage {
                    messages: vec!["only".to_string()],
                    next_page: Some(0),
                })
            }
        }

        let fetcher = CommitFetcher::new(Arc::new(ZeroSource));
        assert_eq!(fetcher.fetch(&repo()).await.unwrap(), vec!["only"]);
    }
}
