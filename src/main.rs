use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use postgen::commands;
use postgen::config::Config;
use postgen::images::{HttpImageResolver, ImageResolver};
use postgen::provider::ProviderClient;
use postgen::publisher::WordPressPublisher;
use postgen::scheduler::Dispatcher;
use postgen::storage::SqliteJobStore;

#[derive(Parser)]
#[command(
    name = "postgen",
    version,
    about = "Scheduled AI blog-post generation and publishing",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file; environment variables are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dispatcher loop
    Run {
        /// Process one batch and exit instead of looping
        #[arg(long, default_value = "false")]
        once: bool,
    },

    /// Schedule a single generation job
    Schedule {
        /// Prompt text; the configured template is used when absent
        #[arg(short, long)]
        prompt: Option<String>,

        /// Execution time as "YYYY-MM-DD HH:MM:SS"; due immediately when absent
        #[arg(long)]
        at: Option<String>,
    },

    /// Schedule the configured backdate range as individual jobs
    ScheduleBulk,

    /// Run one batch immediately, ignoring the posting window
    ForceRun,

    /// Show the job queue status
    Status {
        /// Maximum jobs to list
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Delete a job by id
    Delete {
        /// Job id
        id: Uuid,
    },

    /// Verify provider credentials with a canned prompt
    TestConnection,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate()?;

    let log_format = cli
        .log_format
        .as_deref()
        .unwrap_or(&config.logging.format);
    setup_tracing(log_format, cli.verbose, &config.logging.level)?;

    tracing::info!(provider = %config.provider.name, "postgen starting");

    match cli.command {
        Commands::Run { once } => {
            run(config, once).await?;
        }

        Commands::Schedule { prompt, at } => {
            let store = SqliteJobStore::open(&config.database.path)?;
            let at = at
                .map(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S"))
                .transpose()?;
            let id = commands::schedule_single(&store, &config, prompt.as_deref(), at)?;
            println!("Scheduled job {id}");
        }

        Commands::ScheduleBulk => {
            let store = SqliteJobStore::open(&config.database.path)?;
            let created = commands::schedule_bulk(&store, &config)?;
            println!("Scheduled {created} backdated jobs");
        }

        Commands::ForceRun => {
            let dispatcher = build_dispatcher(&config)?;
            let outcome = commands::force_run_now(&dispatcher).await?;
            println!("Run outcome: {outcome:?}");
        }

        Commands::Status { limit } => {
            let store = SqliteJobStore::open(&config.database.path)?;
            let report = commands::get_status(&store, limit)?;
            println!("Completed today: {}", report.completed_today);
            println!("Pending jobs: {}", report.pending.len());
            for job in &report.pending {
                println!("  {} due {} - {}", job.id, job.schedule_at, job.status);
            }
            println!("Recent jobs:");
            for job in &report.recent {
                println!("  {} due {} - {}", job.id, job.schedule_at, job.status);
            }
        }

        Commands::Delete { id } => {
            let store = SqliteJobStore::open(&config.database.path)?;
            if commands::delete_job(&store, id)? {
                println!("Deleted job {id}");
            } else {
                println!("Job {id} not found");
            }
        }

        Commands::TestConnection => {
            let provider = Arc::new(ProviderClient::new()?);
            let models = commands::test_provider_connection(provider, &config).await?;
            println!("Connection OK. Available models:");
            for model in models {
                println!("  {model}");
            }
        }
    }

    Ok(())
}

/// Dispatcher loop: backdate once if configured, then run both trigger
/// cadences into the same batch entry point
///
/// The single-post interval and the batch sweep are separate tickers, but
/// they funnel into `run_batch`, where the lease makes overlapping firings
/// a no-op.
async fn run(config: Config, once: bool) -> Result<()> {
    let store = SqliteJobStore::open(&config.database.path)?;

    if config.backdate.enabled {
        let created = commands::schedule_bulk(&store, &config)?;
        if created > 0 {
            tracing::info!(created, "Backdate history scheduled");
        }
    }

    let dispatcher = build_dispatcher(&config)?;

    if once {
        let outcome = dispatcher.run_batch(Local::now()).await?;
        tracing::info!(outcome = ?outcome, "Dispatcher sweep finished");
        return Ok(());
    }

    let mut posting = tokio::time::interval(std::time::Duration::from_secs(
        config.schedule.posting_interval_mins * 60,
    ));
    let mut sweep = tokio::time::interval(std::time::Duration::from_secs(
        config.schedule.sweep_interval_mins * 60,
    ));

    loop {
        tokio::select! {
            _ = posting.tick() => {
                let outcome = dispatcher.run_batch(Local::now()).await?;
                tracing::info!(outcome = ?outcome, "Posting trigger finished");
            }
            _ = sweep.tick() => {
                let outcome = dispatcher.run_batch(Local::now()).await?;
                tracing::info!(outcome = ?outcome, "Sweep trigger finished");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                return Ok(());
            }
        }
    }
}

fn build_dispatcher(config: &Config) -> Result<Dispatcher> {
    let store = Arc::new(SqliteJobStore::open(&config.database.path)?);
    let provider = Arc::new(ProviderClient::new()?);
    let publisher = Arc::new(WordPressPublisher::new(&config.publish)?);
    let images: Option<Arc<dyn ImageResolver>> = HttpImageResolver::new(&config.images)
        .map(|r| Arc::new(r) as Arc<dyn ImageResolver>);

    Ok(Dispatcher::new(
        store,
        provider,
        publisher,
        images,
        config.clone(),
    )?)
}

fn setup_tracing(format: &str, verbose: bool, level: &str) -> Result<()> {
    // --verbose wins over the configured level
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("postgen=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new(format!("postgen={level},warn"))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
