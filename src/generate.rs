//! Summary and commit-message generation flows.
//!
//! Wires the version-control gateway, prompt builders, LLM client, store,
//! and notification sink together. LLM failures are caught here and
//! forwarded to the sink as a single notification; nothing retries
//! automatically.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::dates::{date_key, iso_week_key, week_bounds, week_range_label};
use crate::git::VersionControlGateway;
use crate::llm::OpenAiClient;
use crate::notify::NotificationSink;
use crate::prompts::{
    build_commit_message_prompt, build_daily_summary_prompt, build_weekly_summary_prompt,
    PromptTemplates,
};
use crate::scheduler::WeeklyAction;
use crate::store::{SummaryKind, SummaryStore};

/// Orchestrates the generation flows for one project
pub struct Generator<G: VersionControlGateway> {
    gateway: G,
    client: OpenAiClient,
    store: SummaryStore,
    templates: PromptTemplates,
    sink: Arc<dyn NotificationSink>,
}

impl<G: VersionControlGateway> Generator<G> {
    pub fn new(
        gateway: G,
        client: OpenAiClient,
        store: SummaryStore,
        templates: PromptTemplates,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            gateway,
            client,
            store,
            templates,
            sink,
        }
    }

    /// Get the gateway for direct access
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Get the store for direct access
    pub fn store(&self) -> &SummaryStore {
        &self.store
    }

    /// Generate and save the daily summary for `date`.
    ///
    /// Returns the saved path, or `None` when skipped (no commits) or when
    /// the model call failed — in both cases the outcome has already been
    /// reported through the notification sink.
    pub async fn generate_daily_summary(&self, date: NaiveDate) -> Result<Option<PathBuf>> {
        let commits = self
            .gateway
            .commits_on_date(date)
            .context("Failed to query commit history")?;

        if commits.is_empty() {
            self.sink.warn(
                "Daily summary skipped",
                &format!("no commits recorded on {date}"),
            );
            return Ok(None);
        }

        info!(%date, commits = commits.len(), "Generating daily summary");

        let changes = self.working_tree_changes();
        let (system, user) = build_daily_summary_prompt(&self.templates, &commits, &changes);

        let text = match self.client.send(&system, &user).await {
            Ok(text) => text,
            Err(e) => {
                self.sink.error("Daily summary failed", &e.to_string());
                return Ok(None);
            }
        };

        let content = format!("{}\n{}\n", daily_header(date), text.trim());
        let path = self.store.save(SummaryKind::Daily, &date_key(date), &content)?;

        self.sink
            .info("Daily summary saved", &path.display().to_string());

        Ok(Some(path))
    }

    /// Generate and save the weekly summary for the week containing `date`.
    pub async fn generate_weekly_summary(&self, date: NaiveDate) -> Result<Option<PathBuf>> {
        let (monday, sunday) = week_bounds(date);
        let commits = self
            .gateway
            .commits_between(monday, sunday)
            .context("Failed to query commit history")?;

        let week_key = iso_week_key(date);

        if commits.is_empty() {
            self.sink.warn(
                "Weekly summary skipped",
                &format!("no commits recorded in week {week_key}"),
            );
            return Ok(None);
        }

        let range = week_range_label(monday, sunday);
        info!(week = %week_key, commits = commits.len(), "Generating weekly summary");

        let (system, user) = build_weekly_summary_prompt(&self.templates, &commits, &range);

        let text = match self.client.send(&system, &user).await {
            Ok(text) => text,
            Err(e) => {
                self.sink.error("Weekly summary failed", &e.to_string());
                return Ok(None);
            }
        };

        let content = format!("{}\n{}\n", weekly_header(&week_key, &range), text.trim());
        let path = self.store.save(SummaryKind::Weekly, &week_key, &content)?;

        self.sink
            .info("Weekly summary saved", &path.display().to_string());

        Ok(Some(path))
    }

    /// Generate a commit message for the current uncommitted changes.
    ///
    /// Returns the message text without committing; the caller decides
    /// whether to run `commit_all` with it.
    pub async fn generate_commit_message(&self) -> Result<Option<String>> {
        if !self
            .gateway
            .has_uncommitted_changes()
            .context("Failed to inspect working tree")?
        {
            self.sink.warn(
                "Commit message skipped",
                "no uncommitted changes in the working tree",
            );
            return Ok(None);
        }

        let changes = self.working_tree_changes();
        let diff = self
            .gateway
            .uncommitted_diff()
            .context("Failed to read working tree diff")?;

        let (system, user) = build_commit_message_prompt(&self.templates, &changes, &diff);

        match self.client.send(&system, &user).await {
            Ok(text) => Ok(Some(text.trim().to_string())),
            Err(e) => {
                self.sink
                    .error("Commit message generation failed", &e.to_string());
                Ok(None)
            }
        }
    }

    fn working_tree_changes(&self) -> String {
        match self.gateway.changes_summary() {
            Ok(changes) => changes,
            Err(e) => {
                warn!(error = %e, "Could not summarize working tree changes");
                "No changes".to_string()
            }
        }
    }
}

#[async_trait]
impl<G: VersionControlGateway + 'static> WeeklyAction for Generator<G> {
    async fn run(&self, week_key: &str) -> Result<()> {
        info!(week = %week_key, "Scheduled weekly summary triggered");
        self.generate_weekly_summary(Local::now().date_naive())
            .await
            .map(|_| ())
    }
}

fn daily_header(date: NaiveDate) -> String {
    format!(
        "==========================================\n\
         Date: {date}\n\
         Daily work report\n\
         ==========================================\n"
    )
}

fn weekly_header(week_key: &str, range: &str) -> String {
    format!(
        "==========================================\n\
         Week: {week_key} ({range})\n\
         Weekly work report\n\
         ==========================================\n"
    )
}
