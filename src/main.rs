use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use commit_cadence::{
    dates::parse_weekday, should_force_commit, Config, Generator, GitCli, LogSink, OpenAiClient,
    PeriodicScheduler, SchedulerRegistry, SummaryKind, SummaryStore, VersionControlGateway,
    WeeklyGate,
};

#[derive(Parser)]
#[command(name = "commit-cadence")]
#[command(about = "Daily commit cadence enforcement with AI-generated work summaries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file
    #[arg(long, env = "CADENCE_CONFIG", default_value = ".cadence/config.yml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a commit is required before continuing work
    Check,

    /// Generate a daily work summary
    Daily {
        /// Date to summarize (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Generate a weekly work summary
    Weekly {
        /// Any date inside the week to summarize (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Generate a commit message for uncommitted changes
    Commit {
        /// Commit the changes with the generated message
        #[arg(long)]
        execute: bool,
    },

    /// Verify the LLM API configuration
    TestConnection,

    /// Run the weekly summary scheduler until interrupted
    Watch,

    /// List recent summaries
    List {
        /// Summary kind: daily or weekly
        #[arg(long, default_value = "daily")]
        kind: String,

        /// Maximum number of entries
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Print a stored summary
    Show {
        /// Summary key (YYYY-MM-DD for daily, YYYY-Www for weekly)
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("commit_cadence=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Check => run_check(&config),
        Commands::Daily { date } => run_daily(&config, date).await,
        Commands::Weekly { date } => run_weekly(&config, date).await,
        Commands::Commit { execute } => run_commit(&config, execute).await,
        Commands::TestConnection => run_test_connection(&config).await,
        Commands::Watch => run_watch(&config).await,
        Commands::List { kind, limit } => run_list(&config, &kind, limit),
        Commands::Show { key } => run_show(&config, &key),
    }
}

fn build_store(config: &Config) -> SummaryStore {
    SummaryStore::new(
        config.storage.daily_dir.clone(),
        config.storage.weekly_dir.clone(),
    )
}

fn build_generator(config: &Config) -> Result<Generator<GitCli>> {
    let api_key = config.llm.api_key()?;
    let client = OpenAiClient::new(&config.llm.base_url, api_key, config.llm.model.clone())?;

    Ok(Generator::new(
        GitCli::new("."),
        client,
        build_store(config),
        config.templates(),
        Arc::new(LogSink),
    ))
}

fn run_check(config: &Config) -> Result<()> {
    let gateway = GitCli::new(".");
    let today = Local::now().date_naive();

    if should_force_commit(today, &config.cadence, &gateway) {
        println!("Commit required: no commit was recorded yesterday.");
        if let Ok(Some(last)) = gateway.last_commit_date() {
            println!("Last commit: {last}");
        }
        std::process::exit(1);
    }

    println!("Cadence satisfied: no forced commit needed today.");
    Ok(())
}

async fn run_daily(config: &Config, date: Option<NaiveDate>) -> Result<()> {
    let generator = build_generator(config)?;
    let date = date.unwrap_or_else(|| Local::now().date_naive());

    if let Some(path) = generator.generate_daily_summary(date).await? {
        println!("Daily summary written to {}", path.display());
    }

    Ok(())
}

async fn run_weekly(config: &Config, date: Option<NaiveDate>) -> Result<()> {
    let generator = build_generator(config)?;
    let date = date.unwrap_or_else(|| Local::now().date_naive());

    if let Some(path) = generator.generate_weekly_summary(date).await? {
        println!("Weekly summary written to {}", path.display());
    }

    Ok(())
}

async fn run_commit(config: &Config, execute: bool) -> Result<()> {
    let generator = build_generator(config)?;

    let Some(message) = generator.generate_commit_message().await? else {
        return Ok(());
    };

    println!("{message}");

    if execute {
        if generator.gateway().commit_all(&message)? {
            println!("Changes committed.");
        } else {
            anyhow::bail!("git commit failed");
        }
    }

    Ok(())
}

async fn run_test_connection(config: &Config) -> Result<()> {
    let api_key = config.llm.api_key()?;
    let client = OpenAiClient::new(&config.llm.base_url, api_key, config.llm.model.clone())?;

    match client.test_connection().await {
        Ok(()) => {
            println!("Connection OK: the model responded.");
            Ok(())
        }
        Err(e) => {
            eprintln!("Connection failed: {e}");
            std::process::exit(1);
        }
    }
}

async fn run_watch(config: &Config) -> Result<()> {
    let generator = Arc::new(build_generator(config)?);
    let registry = SchedulerRegistry::new();

    let gate = WeeklyGate::new(
        parse_weekday(&config.schedule.weekly_report_day),
        config.schedule.weekly_report_hour,
    );
    let store = build_store(config);
    let poll_interval = Duration::from_secs(config.schedule.poll_interval_secs);

    let scheduler = registry
        .get_or_create(Path::new("."), || {
            PeriodicScheduler::new(gate, generator.clone(), store, poll_interval)
        })
        .await;

    scheduler.lock().await.start();
    info!(
        day = %config.schedule.weekly_report_day,
        hour = config.schedule.weekly_report_hour,
        "Scheduler armed; press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;

    registry.stop_all().await;
    info!("Scheduler stopped");

    Ok(())
}

fn run_list(config: &Config, kind: &str, limit: usize) -> Result<()> {
    let kind = parse_kind(kind)?;
    let store = build_store(config);

    let entries = store.list_recent(kind, limit)?;
    if entries.is_empty() {
        println!("No {} summaries stored.", kind.as_str());
        return Ok(());
    }

    for entry in entries {
        println!("{}  {}", entry.key, entry.path.display());
    }

    Ok(())
}

fn run_show(config: &Config, key: &str) -> Result<()> {
    // Weekly keys look like 2024-W23, daily keys like 2024-06-04
    let kind = if key.contains("-W") {
        SummaryKind::Weekly
    } else {
        SummaryKind::Daily
    };

    let store = build_store(config);
    match store.read(kind, key)? {
        Some(content) => println!("{content}"),
        None => println!("No summary found for {key}."),
    }

    Ok(())
}

fn parse_kind(kind: &str) -> Result<SummaryKind> {
    match kind {
        "daily" => Ok(SummaryKind::Daily),
        "weekly" => Ok(SummaryKind::Weekly),
        other => anyhow::bail!("Unknown summary kind: {other} (expected daily or weekly)"),
    }
}
