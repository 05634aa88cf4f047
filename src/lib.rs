pub mod cadence;
pub mod config;
pub mod dates;
pub mod generate;
pub mod git;
pub mod llm;
pub mod notify;
pub mod prompts;
pub mod scheduler;
pub mod store;

pub use cadence::should_force_commit;
pub use config::Config;
pub use generate::Generator;
pub use git::{GitCli, VersionControlGateway};
pub use llm::{LlmError, OpenAiClient, TimeoutPolicy};
pub use notify::{LogSink, NotificationSink};
pub use prompts::PromptTemplates;
pub use scheduler::{PeriodicScheduler, SchedulerRegistry, WeeklyAction, WeeklyGate};
pub use store::{SummaryEntry, SummaryKind, SummaryStore};
