use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, TimeZone};
use tracing::debug;

/// Narrow contract over the version-control system.
///
/// Consumed by the cadence tracker and the summary generators; implemented
/// by [`GitCli`] in production and by in-memory fakes in tests.
pub trait VersionControlGateway: Send + Sync {
    /// Whether the project root is inside a git work tree
    fn is_repository(&self) -> Result<bool>;

    /// Commit subject lines for a calendar date, oldest first
    fn commits_on_date(&self, date: NaiveDate) -> Result<Vec<String>>;

    /// Commit subject lines for an inclusive date range, oldest first
    fn commits_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>>;

    /// Whether the working tree has uncommitted changes
    fn has_uncommitted_changes(&self) -> Result<bool>;

    /// Stage everything and commit; returns whether the commit succeeded
    fn commit_all(&self, message: &str) -> Result<bool>;

    /// Date of the most recent commit, if any
    fn last_commit_date(&self) -> Result<Option<NaiveDate>>;

    /// Unified diff of the working tree against HEAD
    fn uncommitted_diff(&self) -> Result<String>;

    /// Short grouped description of uncommitted changes
    fn changes_summary(&self) -> Result<String>;
}

/// Gateway implementation shelling out to the `git` binary
pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    fn run_git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_root)
            .args(args)
            .output()
            .context("Failed to run git")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "git {} failed: {}",
                args.first().unwrap_or(&""),
                stderr.trim()
            );
        }

        String::from_utf8(output.stdout).context("Invalid UTF-8 in git output")
    }
}

impl VersionControlGateway for GitCli {
    fn is_repository(&self) -> Result<bool> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_root)
            .args(["rev-parse", "--is-inside-work-tree"])
            .output()
            .context("Failed to run git")?;

        Ok(output.status.success()
            && String::from_utf8_lossy(&output.stdout).trim() == "true")
    }

    fn commits_on_date(&self, date: NaiveDate) -> Result<Vec<String>> {
        self.commits_between(date, date)
    }

    fn commits_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<String>> {
        let after_end = end.succ_opt().context("Date out of range")?;
        let output = self.run_git(&[
            "log",
            "--reverse",
            "--pretty=format:%s",
            &format!("--since={start} 00:00:00"),
            &format!("--until={after_end} 00:00:00"),
        ])?;

        let subjects: Vec<String> = output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();

        debug!(%start, %end, count = subjects.len(), "Queried commit history");

        Ok(subjects)
    }

    fn has_uncommitted_changes(&self) -> Result<bool> {
        let output = self.run_git(&["status", "--porcelain"])?;
        Ok(!output.trim().is_empty())
    }

    fn commit_all(&self, message: &str) -> Result<bool> {
        self.run_git(&["add", "-A"])?;

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_root)
            .args(["commit", "-m", message])
            .output()
            .context("Failed to run git commit")?;

        Ok(output.status.success())
    }

    fn last_commit_date(&self) -> Result<Option<NaiveDate>> {
        let output = self.run_git(&["log", "-1", "--pretty=format:%ct"])?;
        let trimmed = output.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let timestamp: i64 = trimmed.parse().context("Invalid commit timestamp")?;
        Ok(Local
            .timestamp_opt(timestamp, 0)
            .single()
            .map(|dt| dt.date_naive()))
    }

    fn uncommitted_diff(&self) -> Result<String> {
        self.run_git(&["diff", "HEAD"])
    }

    fn changes_summary(&self) -> Result<String> {
        let porcelain = self.run_git(&["status", "--porcelain"])?;
        Ok(summarize_porcelain(&porcelain))
    }
}

/// Condense `git status --porcelain` output into a short grouped description
/// suitable for a commit-message prompt, e.g.
/// `added: new.rs; modified: main.rs, lib.rs and 2 more`.
fn summarize_porcelain(porcelain: &str) -> String {
    let mut added = Vec::new();
    let mut modified = Vec::new();
    let mut deleted = Vec::new();

    for line in porcelain.lines() {
        if line.len() < 4 {
            continue;
        }
        let status = &line[..2];
        let path = line[3..].trim();
        let name = path.rsplit('/').next().unwrap_or(path).to_string();

        if status.contains('D') {
            deleted.push(name);
        } else if status.contains('A') || status == "??" {
            added.push(name);
        } else {
            modified.push(name);
        }
    }

    let groups: Vec<String> = [
        ("added", &added),
        ("modified", &modified),
        ("deleted", &deleted),
    ]
    .iter()
    .filter_map(|(label, files)| describe_group(label, files))
    .collect();

    if groups.is_empty() {
        "No changes".to_string()
    } else {
        groups.join("; ")
    }
}

fn describe_group(label: &str, files: &[String]) -> Option<String> {
    if files.is_empty() {
        return None;
    }

    let shown = files.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
    let extra = files.len().saturating_sub(3);

    Some(if extra > 0 {
        format!("{label}: {shown} and {extra} more")
    } else {
        format!("{label}: {shown}")
    })
}
