//! Repository fetchers.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::WalkError;

/// Materializes a repository into an empty directory.
#[async_trait]
pub trait RepoFetcher: Send + Sync {
    async fn fetch(&self, url: &str, branch: Option<&str>, dest: &Path) -> Result<(), WalkError>;
}

/// Shallow clone with the `git` command-line client.
#[derive(Debug, Clone, Default)]
pub struct GitFetcher;

#[async_trait]
impl RepoFetcher for GitFetcher {
    async fn fetch(&self, url: &str, branch: Option<&str>, dest: &Path) -> Result<(), WalkError> {
        let mut cmd = Command::new("git");
        cmd.arg("clone").arg("--depth").arg("1");
        if let Some(branch) = branch {
            cmd.arg("--branch").arg(branch).arg("--single-branch");
        }
        // Keep git from prompting for credentials on a terminal
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.arg("--").arg(url).arg(dest);

        debug!(url, branch, dest = %dest.display(), "cloning repository");
        let output = cmd.output().await.map_err(|e| WalkError::CloneFailure {
            url: url.to_string(),
            reason: format!("failed to run git: {}", e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WalkError::CloneFailure {
                url: url.to_string(),
                reason: stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}
