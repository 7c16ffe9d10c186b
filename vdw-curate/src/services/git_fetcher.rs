//! Shallow git fetching of source repositories
//!
//! Runs the system `git` binary with prompts disabled. Failures are classified
//! from stderr so the acquirer knows whether a retry can help.

use crate::config::RetryConfig;
use crate::models::SourceDescriptor;
use crate::utils::Retryable;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// stderr fragments that indicate a network-level (retryable) failure
const TRANSIENT_MARKERS: &[&str] = &[
    "Could not resolve host",
    "Connection",
    "timed out",
    "early EOF",
    "RPC failed",
    "unable to access",
    "Operation timed out",
];

/// Fetch failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network trouble or timeout; another attempt may succeed
    #[error("transient fetch failure: {0}")]
    Transient(String),

    /// Missing repository or branch, authentication, missing git binary
    #[error("permanent fetch failure: {0}")]
    Permanent(String),
}

impl Retryable for FetchError {
    fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

/// Mechanism that materializes a source's tree into a directory
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch `source` into `dest` (which must not exist yet)
    ///
    /// `narrow_path` restricts the tree to one subdirectory; `"."` keeps the
    /// whole tree while still using the narrow fetch steps.
    async fn fetch(
        &self,
        source: &SourceDescriptor,
        narrow_path: Option<&str>,
        dest: &Path,
    ) -> Result<(), FetchError>;
}

/// Per-step time limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTimeouts {
    /// Each narrow clone/checkout step
    pub narrow_step: Duration,
    /// The sparse-checkout pattern step
    pub sparse_config: Duration,
    /// The full clone
    pub full: Duration,
}

impl Default for FetchTimeouts {
    fn default() -> Self {
        Self {
            narrow_step: Duration::from_secs(30),
            sparse_config: Duration::from_secs(10),
            full: Duration::from_secs(300),
        }
    }
}

impl From<&RetryConfig> for FetchTimeouts {
    fn from(config: &RetryConfig) -> Self {
        Self {
            narrow_step: Duration::from_secs(config.narrow_step_timeout_secs),
            sparse_config: Duration::from_secs(config.sparse_config_timeout_secs),
            full: Duration::from_secs(config.full_timeout_secs),
        }
    }
}

/// [`SourceFetcher`] backed by the `git` command line
pub struct GitFetcher {
    program: PathBuf,
    timeouts: FetchTimeouts,
}

impl GitFetcher {
    pub fn new(timeouts: FetchTimeouts) -> Self {
        Self {
            program: PathBuf::from("git"),
            timeouts,
        }
    }

    /// Use a specific git executable
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    async fn full_clone(&self, source: &SourceDescriptor, dest: &Path) -> Result<(), FetchError> {
        let dest = dest.to_string_lossy();
        self.run_git(
            "clone",
            &[
                "clone",
                "--depth",
                "1",
                "--single-branch",
                "--branch",
                &source.branch,
                &source.url,
                &dest,
            ],
            self.timeouts.full,
        )
        .await
    }

    async fn narrow_clone(
        &self,
        source: &SourceDescriptor,
        narrow_path: &str,
        dest: &Path,
    ) -> Result<(), FetchError> {
        let dest = dest.to_string_lossy();
        self.run_git(
            "sparse clone",
            &[
                "clone",
                "--depth",
                "1",
                "--filter=blob:none",
                "--sparse",
                "--single-branch",
                "--branch",
                &source.branch,
                "--no-checkout",
                &source.url,
                &dest,
            ],
            self.timeouts.narrow_step,
        )
        .await?;

        let pattern = sparse_pattern(narrow_path);
        if let Err(e) = self
            .run_git(
                "sparse-checkout set",
                &["-C", &dest, "sparse-checkout", "set", "--no-cone", &pattern],
                self.timeouts.sparse_config,
            )
            .await
        {
            // Checkout still succeeds with the default sparse pattern
            tracing::warn!(source = %source.name, error = %e, "Sparse-checkout config failed");
        }

        self.run_git(
            "checkout",
            &["-C", &dest, "checkout"],
            self.timeouts.narrow_step,
        )
        .await
    }

    async fn run_git(&self, step: &str, args: &[&str], limit: Duration) -> Result<(), FetchError> {
        tracing::debug!(step, args = ?args, "Running git");

        let child = Command::new(&self.program)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_ASKPASS", "echo")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FetchError::Permanent(format!("failed to start git: {}", e)))?;

        // Dropping the future on timeout drops the child, which kills it
        let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(FetchError::Transient(format!("git {} I/O error: {}", step, e)))
            }
            Err(_) => {
                return Err(FetchError::Transient(format!(
                    "git {} timed out after {}s",
                    step,
                    limit.as_secs()
                )))
            }
        };

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(classify_git_failure(step, &stderr))
    }
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new(FetchTimeouts::default())
    }
}

#[async_trait]
impl SourceFetcher for GitFetcher {
    async fn fetch(
        &self,
        source: &SourceDescriptor,
        narrow_path: Option<&str>,
        dest: &Path,
    ) -> Result<(), FetchError> {
        match narrow_path {
            Some(path) => self.narrow_clone(source, path, dest).await,
            None => self.full_clone(source, dest).await,
        }
    }
}

/// Map a narrow subpath to a non-cone sparse pattern
fn sparse_pattern(narrow_path: &str) -> String {
    let trimmed = narrow_path.trim().trim_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        "/*".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

/// Decide whether a failed git invocation is worth retrying
pub fn classify_git_failure(step: &str, stderr: &str) -> FetchError {
    let summary = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .unwrap_or("no error output");
    let message = format!("git {} failed: {}", step, summary);

    if TRANSIENT_MARKERS.iter().any(|m| stderr.contains(m)) {
        FetchError::Transient(message)
    } else {
        FetchError::Permanent(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_errors_are_transient() {
        let err = classify_git_failure(
            "clone",
            "Cloning into 'x'...\nfatal: unable to access 'https://github.com/a/b/': Could not resolve host: github.com\n",
        );
        assert!(err.is_transient());

        let err = classify_git_failure("clone", "error: RPC failed; curl 56\nfatal: early EOF\n");
        assert!(err.is_transient());
    }

    #[test]
    fn test_missing_branch_is_permanent() {
        let err = classify_git_failure(
            "clone",
            "warning: Could not find remote branch nope to clone.\nfatal: Remote branch nope not found in upstream origin\n",
        );
        assert!(!err.is_transient());
        assert_eq!(
            err,
            FetchError::Permanent(
                "git clone failed: fatal: Remote branch nope not found in upstream origin".into()
            )
        );
    }

    #[test]
    fn test_empty_stderr_is_permanent() {
        let err = classify_git_failure("checkout", "");
        assert_eq!(
            err,
            FetchError::Permanent("git checkout failed: no error output".into())
        );
    }

    #[test]
    fn test_sparse_pattern() {
        assert_eq!(sparse_pattern("gruvbox"), "/gruvbox/");
        assert_eq!(sparse_pattern("images/anime/"), "/images/anime/");
        assert_eq!(sparse_pattern("."), "/*");
    }

    #[tokio::test]
    async fn test_missing_git_binary_is_permanent() {
        let fetcher = GitFetcher::default().with_program("/nonexistent/vdw-git-binary");
        let source = SourceDescriptor::new("https://example.invalid/a/b", "main", "a/b");
        let dir = tempfile::tempdir().unwrap();

        let err = fetcher
            .fetch(&source, None, &dir.path().join("tree"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Permanent(_)));
    }
}
