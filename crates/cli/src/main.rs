//! `jobdeck` — terminal consumer of the dashboard synchronization core.
//!
//! Stands in for the view layer: everything here goes through the store
//! subscription surface, the REST client, and the pure formatters.

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use jd_client::config::DashboardConfig;
use jd_client::{DashboardApi, DashboardSync};
use jd_domain::duration::{format_duration, human_file_size};
use jd_domain::jobs::{JobState, PageRequest};
use jd_domain::schedule::parse_schedule_expression;
use jd_domain::stats::StatsSnapshot;

#[derive(Parser)]
#[command(name = "jobdeck", about = "Terminal dashboard for a background-job cluster")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "jobdeck.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow live job statistics from the event stream.
    Watch,
    /// List job servers and their resources.
    Servers,
    /// List jobs in a given state.
    Jobs {
        /// SCHEDULED, ENQUEUED, PROCESSING, SUCCEEDED, FAILED or DELETED.
        #[arg(long, default_value = "ENQUEUED")]
        state: String,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// List recurring jobs and their schedules.
    Recurring,
    /// Show current cluster problems.
    Problems,
    /// Show the job server version.
    Version,
    /// Delete a job.
    DeleteJob { id: Uuid },
    /// Requeue a job.
    RequeueJob { id: Uuid },
    /// Trigger a recurring job now.
    Trigger { id: String },
    /// Delete a recurring job.
    DeleteRecurring { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("jobdeck=info,jd_client=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = DashboardConfig::load_or_default(&cli.config);

    match cli.command {
        Command::Watch => watch(&config).await,
        Command::Servers => {
            let api = DashboardApi::new(config.api.clone())?;
            for server in api.servers().await? {
                let name = server.name.as_deref().unwrap_or("unnamed");
                println!(
                    "{}  {}  workers={}  cpu={:.0}%  free={}  up since {}",
                    server.id,
                    name,
                    server.worker_pool_size,
                    server.process_cpu_load * 100.0,
                    human_file_size(server.process_free_memory, false),
                    server.first_heartbeat.format("%Y-%m-%d %H:%M:%S"),
                );
            }
            Ok(())
        }
        Command::Jobs { state, offset, limit } => {
            let api = DashboardApi::new(config.api.clone())?;
            let state = parse_state(&state)?;
            let page_request = PageRequest::default().with_offset(offset).with_limit(limit);
            let page = api.jobs(state, &page_request).await?;
            println!(
                "{} jobs in {} (page {}/{})",
                page.total,
                state.as_str(),
                page.current_page + 1,
                page.total_pages().max(1),
            );
            for job in &page.items {
                println!("{}  {}  updated {}", job.id, job.job_name, job.updated_at);
            }
            Ok(())
        }
        Command::Recurring => {
            let api = DashboardApi::new(config.api.clone())?;
            let page = api.recurring_jobs(&PageRequest::default()).await?;
            for job in &page.items {
                let schedule = parse_schedule_expression(&job.schedule_expression);
                let margins = match (&schedule.margin_before, &schedule.margin_after) {
                    (Some(before), Some(after)) => format!("  (margins {before}/{after})"),
                    _ => String::new(),
                };
                let next = job
                    .next_run
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{}  {}  \"{}\"{}  next {}",
                    job.id, job.job_name, schedule.schedule_expression, margins, next,
                );
            }
            Ok(())
        }
        Command::Problems => {
            let api = DashboardApi::new(config.api.clone())?;
            let problems = api.problems().await?;
            if problems.is_empty() {
                println!("no problems");
            }
            for problem in problems {
                let message = problem.message.as_deref().unwrap_or("");
                println!("{}  {}", problem.kind.as_str(), message);
            }
            Ok(())
        }
        Command::Version => {
            let api = DashboardApi::new(config.api.clone())?;
            let info = api.version().await?;
            match info.latest_version {
                Some(latest) if latest != info.version => {
                    println!("{} (latest: {latest})", info.version)
                }
                _ => println!("{}", info.version),
            }
            Ok(())
        }
        Command::DeleteJob { id } => {
            DashboardApi::new(config.api.clone())?.delete_job(id).await?;
            println!("deleted {id}");
            Ok(())
        }
        Command::RequeueJob { id } => {
            DashboardApi::new(config.api.clone())?.requeue_job(id).await?;
            println!("requeued {id}");
            Ok(())
        }
        Command::Trigger { id } => {
            DashboardApi::new(config.api.clone())?
                .trigger_recurring_job(&id)
                .await?;
            println!("triggered {id}");
            Ok(())
        }
        Command::DeleteRecurring { id } => {
            DashboardApi::new(config.api.clone())?
                .delete_recurring_job(&id)
                .await?;
            println!("deleted {id}");
            Ok(())
        }
    }
}

async fn watch(config: &DashboardConfig) -> anyhow::Result<()> {
    let sync = DashboardSync::start(config)?;
    let stats = sync.stats().clone();

    let (update_tx, mut update_rx) = tokio::sync::mpsc::unbounded_channel();
    let _subscription = stats.subscribe(move || {
        let _ = update_tx.send(());
    });

    tracing::info!(stream = %config.stream.base_url, "watching job statistics");
    println!("watching {} (ctrl-c to stop)", config.stream.base_url);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = update_rx.recv() => {
                if update.is_none() {
                    break;
                }
                println!("{}", render_stats(&stats.get()));
            }
        }
    }

    sync.shutdown();
    Ok(())
}

fn render_stats(snapshot: &StatsSnapshot) -> String {
    let stats = &snapshot.stats;
    let estimation = &snapshot.estimation;

    let outlook = if estimation.processing_done {
        "processing done".to_string()
    } else if let Some(eta) = estimation.estimated_processing_time {
        let remaining = (eta - Utc::now()).num_seconds().max(0) as f64;
        match format_duration(remaining).as_str() {
            "" => "done any moment now".to_string(),
            human => format!("done in ~{human}"),
        }
    } else {
        "estimating...".to_string()
    };

    format!(
        "enqueued={} processing={} succeeded={} failed={}  |  {}",
        stats.enqueued, stats.processing, stats.succeeded, stats.failed, outlook,
    )
}

fn parse_state(text: &str) -> anyhow::Result<JobState> {
    let state = match text.to_ascii_uppercase().as_str() {
        "SCHEDULED" => JobState::Scheduled,
        "ENQUEUED" => JobState::Enqueued,
        "PROCESSING" => JobState::Processing,
        "SUCCEEDED" => JobState::Succeeded,
        "FAILED" => JobState::Failed,
        "DELETED" => JobState::Deleted,
        other => anyhow::bail!("unknown job state: {other}"),
    };
    Ok(state)
}
