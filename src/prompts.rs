//! Prompt builders for the three generation flows.
//!
//! Pure functions: no network or file I/O. Each builder returns a
//! `(system, user)` message pair ready for the chat-completions API. System
//! instructions are user-configurable through [`PromptTemplates`].

/// Maximum number of diff bytes embedded in a commit-message prompt.
pub const DIFF_BUDGET: usize = 2000;

/// Appended to the embedded diff when it was clipped to [`DIFF_BUDGET`].
pub const TRUNCATION_MARKER: &str = "\n...(truncated)";

/// Rendered in place of the numbered commit list when a day has no commits.
pub const NO_COMMITS_SENTINEL: &str = "no commits today";

pub const DEFAULT_COMMIT_MESSAGE_SYSTEM: &str = "\
You are an assistant that writes Git commit messages.
Given a set of code changes, produce a concise, clear commit message.
Rules:
1. The first line is a short summary (at most 50 characters).
2. If more detail is needed, leave the second line blank and elaborate from the third line.
3. Start with a verb (add, fix, update, refactor, ...).
4. Describe the intent and impact of the change, not just which lines were edited.";

pub const DEFAULT_DAILY_SUMMARY_SYSTEM: &str = "\
You are an assistant that writes work summaries.
Given today's commit records, produce a short daily report.
Rules:
1. Summarize the main work completed today in 3-5 items.
2. One sentence per item, highlighting what matters.
3. Order items by importance.
4. Keep the format compact and easy to read.";

pub const DEFAULT_WEEKLY_SUMMARY_SYSTEM: &str = "\
You are an assistant that writes work summaries.
Given this week's commit records, produce a weekly report.
Rules:
1. Group the work by category (new features, bug fixes, improvements, ...).
2. List the 2-3 main results per category.
3. Highlight the most significant work of the week.
4. Keep the format clear and suitable for reporting upward.";

/// System-instruction templates, user-editable via config.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub commit_message: String,
    pub daily_summary: String,
    pub weekly_summary: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            commit_message: DEFAULT_COMMIT_MESSAGE_SYSTEM.to_string(),
            daily_summary: DEFAULT_DAILY_SUMMARY_SYSTEM.to_string(),
            weekly_summary: DEFAULT_WEEKLY_SUMMARY_SYSTEM.to_string(),
        }
    }
}

/// Build the prompt pair for commit-message generation.
///
/// The diff is clipped to [`DIFF_BUDGET`] bytes on a UTF-8 character
/// boundary; the marker is appended only when clipping occurred.
pub fn build_commit_message_prompt(
    templates: &PromptTemplates,
    changes_summary: &str,
    diff: &str,
) -> (String, String) {
    let clipped = truncate_on_char_boundary(diff, DIFF_BUDGET);
    let marker = if clipped.len() < diff.len() {
        TRUNCATION_MARKER
    } else {
        ""
    };

    let user = format!(
        "Generate a commit message for the following changes.\n\n\
         Change summary:\n{changes_summary}\n\n\
         Detailed diff (for reference, may be clipped):\n{clipped}{marker}\n\n\
         Produce one concise, clear commit message."
    );

    (templates.commit_message.clone(), user)
}

/// Build the prompt pair for a daily work summary.
///
/// Commits are rendered as a 1-indexed list in chronological order; an
/// empty list renders the [`NO_COMMITS_SENTINEL`] instead.
pub fn build_daily_summary_prompt(
    templates: &PromptTemplates,
    commits: &[String],
    changes_summary: &str,
) -> (String, String) {
    let commits_text = if commits.is_empty() {
        NO_COMMITS_SENTINEL.to_string()
    } else {
        numbered(commits)
    };

    let user = format!(
        "Generate a daily summary from today's work records.\n\n\
         Today's commits:\n{commits_text}\n\n\
         Main changes today:\n{changes_summary}\n\n\
         Produce a short daily report covering the main work completed today."
    );

    (templates.daily_summary.clone(), user)
}

/// Build the prompt pair for a weekly work summary.
pub fn build_weekly_summary_prompt(
    templates: &PromptTemplates,
    commits: &[String],
    week_range: &str,
) -> (String, String) {
    let commits_text = if commits.is_empty() {
        "no commits this week".to_string()
    } else {
        numbered(commits)
    };

    let user = format!(
        "Generate a weekly report for {week_range}.\n\n\
         Commits this week ({} total):\n{commits_text}\n\n\
         Produce a weekly report grouping the main work and results.",
        commits.len()
    );

    (templates.weekly_summary.clone(), user)
}

/// Minimal prompt pair used by the connection test.
pub fn build_test_prompt() -> (String, String) {
    (
        "You are a helpful assistant.".to_string(),
        "Hello".to_string(),
    )
}

fn numbered(commits: &[String]) -> String {
    commits
        .iter()
        .enumerate()
        .map(|(i, commit)| format!("{}. {}", i + 1, commit))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate to at most `max` bytes without splitting a UTF-8 codepoint.
fn truncate_on_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_prompt_numbering() {
        let templates = PromptTemplates::default();
        let commits = vec!["fix bug A".to_string(), "add feature B".to_string()];

        let (system, user) = build_daily_summary_prompt(&templates, &commits, "No changes");

        assert_eq!(system, DEFAULT_DAILY_SUMMARY_SYSTEM);
        assert!(user.contains("1. fix bug A\n2. add feature B"));
    }

    #[test]
    fn test_daily_prompt_empty_commits() {
        let templates = PromptTemplates::default();

        let (_, user) = build_daily_summary_prompt(&templates, &[], "No changes");

        assert!(user.contains(NO_COMMITS_SENTINEL));
        assert!(!user.contains("1. "));
    }

    #[test]
    fn test_weekly_prompt_count_and_range() {
        let templates = PromptTemplates::default();
        let commits = vec!["one".to_string(), "two".to_string(), "three".to_string()];

        let (_, user) =
            build_weekly_summary_prompt(&templates, &commits, "2024-06-03 to 2024-06-09");

        assert!(user.contains("2024-06-03 to 2024-06-09"));
        assert!(user.contains("(3 total)"));
        assert!(user.contains("1. one"));
        assert!(user.contains("3. three"));
    }

    #[test]
    fn test_commit_prompt_truncates_long_diff() {
        let templates = PromptTemplates::default();
        let diff = "x".repeat(5000);

        let (_, user) = build_commit_message_prompt(&templates, "modified: main.rs", &diff);

        assert!(user.contains(TRUNCATION_MARKER));
        let embedded: usize = user.matches('x').count();
        assert_eq!(embedded, DIFF_BUDGET);
    }

    #[test]
    fn test_commit_prompt_short_diff_untouched() {
        let templates = PromptTemplates::default();

        let (_, user) = build_commit_message_prompt(&templates, "modified: main.rs", "tiny diff");

        assert!(user.contains("tiny diff"));
        assert!(!user.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncation_respects_utf8_boundary() {
        // Three-byte characters: the 2000-byte budget lands mid-codepoint
        let diff = "あ".repeat(2000);

        let clipped = truncate_on_char_boundary(&diff, DIFF_BUDGET);

        assert!(clipped.len() <= DIFF_BUDGET);
        assert_eq!(clipped.len() % 3, 0);
        assert!(clipped.chars().all(|c| c == 'あ'));
    }

    #[test]
    fn test_custom_template_used() {
        let templates = PromptTemplates {
            daily_summary: "my custom instructions".to_string(),
            ..Default::default()
        };

        let (system, _) = build_daily_summary_prompt(&templates, &[], "No changes");

        assert_eq!(system, "my custom instructions");
    }
}
