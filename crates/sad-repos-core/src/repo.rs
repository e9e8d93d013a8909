//! Repository identifiers and input selection.

use serde::{Deserialize, Serialize};

/// A GitHub repository, addressed as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: &str, name: &str) -> Self {
        RepoId {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    /// Parse an `owner/name` identifier.
    ///
    /// Returns `None` unless the input splits on `/` into exactly two
    /// non-empty parts.
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Some(RepoId::new(owner, name))
            }
            _ => None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Outcome of validating a list of repository identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoSelection {
    /// Parsed identifiers, in input order
    pub valid: Vec<RepoId>,
    /// Inputs that were not `owner/name`, in input order
    pub skipped: Vec<String>,
}

/// Split raw identifiers into parsed repositories and skipped inputs.
pub fn select_repos<I, S>(inputs: I) -> RepoSelection
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut selection = RepoSelection::default();
    for input in inputs {
        let input = input.as_ref();
        match RepoId::parse(input) {
            Some(repo) => selection.valid.push(repo),
            None => selection.skipped.push(input.to_string()),
        }
    }
    selection
}
