//! sad-repos - commit sentiment for GitHub repositories
//!
//! Classifies every non-merge commit message of each repository and prints
//! one summary row per repository:
//!
//! ```text
//! sad-repos [OPTIONS] <TOKEN> <REPOS>...
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};

use sad_repos_core::{
    render_table, write_report_json, ConfidenceThreshold, RepoAnalyzer, SentimentReport, Settings,
    DEFAULT_MIN_CONFIDENCE,
};

#[derive(Parser, Debug)]
#[command(name = "sad-repos")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sentiment of the commit history of GitHub repositories", long_about = None)]
struct Cli {
    /// GitHub token for accessing commit history
    token: String,

    /// Repositories to analyse, as owner/repository
    #[arg(required = true)]
    repos: Vec<String>,

    /// Minimum confidence (0-100) for a commit to count as positive or negative
    #[arg(short, long, default_value_t = DEFAULT_MIN_CONFIDENCE, allow_negative_numbers = true)]
    confidence: f32,

    /// Also write the JSON report to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// GitHub API base URL
    #[arg(long, env = "SAD_REPOS_GITHUB_API")]
    github_api: Option<String>,

    /// Sentiment service batch endpoint
    #[arg(long, env = "SAD_REPOS_SENTIMENT_ENDPOINT")]
    sentiment_endpoint: Option<String>,

    /// Maximum serialized size of one sentiment request, in bytes
    #[arg(long)]
    max_batch_bytes: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Environment settings with command-line overrides applied.
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::from_env().context("Invalid environment settings")?;

        if let Some(url) = &self.github_api {
            settings = settings.with_github_api(url);
        }
        if let Some(endpoint) = &self.sentiment_endpoint {
            settings = settings.with_sentiment_endpoint(endpoint);
        }
        if let Some(bytes) = self.max_batch_bytes {
            settings = settings
                .with_max_batch_bytes(bytes)
                .context("Invalid --max-batch-bytes")?;
        }
        Ok(settings)
    }
}

async fn run(cli: &Cli) -> Result<SentimentReport> {
    // Nothing touches the network with a bad threshold.
    ConfidenceThreshold::new(cli.confidence).context("Invalid --confidence")?;

    let settings = cli.settings()?;
    let analyzer = RepoAnalyzer::from_settings(&settings, &cli.token)
        .context("Failed to set up HTTP clients")?;

    let report = analyzer
        .report(cli.repos.as_slice(), cli.confidence)
        .await
        .context("Sentiment analysis failed")?;

    if let Some(path) = &cli.output {
        write_report_json(path, &report)?;
        info!("Report written to {}", path.display());
    }

    Ok(report)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    sad_repos_core::init_tracing(cli.json, level);

    let report = run(&cli).await?;
    println!("{}", render_table(&report.repositories));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_token_and_repos() {
        let cli = Cli::try_parse_from(["sad-repos", "tok", "octo/cat", "rust-lang/rust"]).unwrap();
        assert_eq!(cli.token, "tok");
        assert_eq!(cli.repos, vec!["octo/cat", "rust-lang/rust"]);
        assert_eq!(cli.confidence, 75.0);
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_cli_requires_a_repo() {
        assert!(Cli::try_parse_from(["sad-repos", "tok"]).is_err());
    }

    #[test]
    fn test_cli_confidence_flag() {
        let cli = Cli::try_parse_from(["sad-repos", "-c", "60", "tok", "octo/cat"]).unwrap();
        assert_eq!(cli.confidence, 60.0);

        let cli = Cli::try_parse_from(["sad-repos", "--confidence", "-5", "tok", "octo/cat"]).unwrap();
        assert_eq!(cli.confidence, -5.0);
    }

    #[test]
    fn test_cli_overrides_settings() {
        let cli = Cli::try_parse_from([
            "sad-repos",
            "--github-api",
            "http://127.0.0.1:1",
            "--sentiment-endpoint",
            "http://127.0.0.1:2/batch",
            "--max-batch-bytes",
            "2048",
            "tok",
            "octo/cat",
        ])
        .unwrap();

        let settings = cli.settings().unwrap();
        assert_eq!(settings.github_api_url, "http://127.0.0.1:1");
        assert_eq!(settings.sentiment_endpoint, "http://127.0.0.1:2/batch");
        assert_eq!(settings.max_batch_bytes, 2048);
    }

    #[tokio::test]
    async fn test_run_rejects_out_of_range_confidence() {
        // Port 1 is never listening; reaching it would surface a transport error instead.
        let cli = Cli::try_parse_from([
            "sad-repos",
            "--confidence",
            "101",
            "--github-api",
            "http://127.0.0.1:1",
            "tok",
            "octo/cat",
        ])
        .unwrap();

        let err = run(&cli).await.unwrap_err();
        assert!(format!("{err:#}").contains("confidence must be between 0-100"));
    }

    #[tokio::test]
    async fn test_run_with_only_malformed_repos_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let cli = Cli::try_parse_from([
            "sad-repos",
            "--github-api",
            "http://127.0.0.1:1",
            "-o",
            path.to_str().unwrap(),
            "tok",
            "ownername",
            "a/b/c",
        ])
        .unwrap();

        let report = run(&cli).await.unwrap();

        assert!(report.repositories.is_empty());
        assert_eq!(report.skipped, vec!["ownername", "a/b/c"]);
        let loaded = sad_repos_core::read_report_json(&path).unwrap();
        assert_eq!(loaded.skipped, report.skipped);
    }
}
