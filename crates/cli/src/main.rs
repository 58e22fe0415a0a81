//! `choreboard` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`: run the web server and the in-process job scheduler.
//! - `migrate`: run pending database migrations.
//! - `evaluate`: create today's chore instances.
//! - `distribute`: assign pool instances whose distribution time passed.
//! - `weekly-reset`: snapshot and zero weekly points.
//! - `create-user`: add a household member or staff account.

mod config;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use api::AppState;
use db::DbPool;
use engine::users::UserInput;
use engine::{Scheduler, UserService};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "choreboard", about = "Household chore board", version)]
struct Cli {
    /// Settings file. Defaults to `choreboard.toml` when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides `database.url`.
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the boards and run the scheduled jobs.
    Serve {
        /// Overrides `server.bind`.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run pending database migrations.
    Migrate,
    /// Create today's instances for every scheduled chore.
    Evaluate,
    /// Assign pool instances that have reached their distribution time.
    Distribute,
    /// Snapshot weekly points and reset them to zero.
    WeeklyReset,
    /// Create a user.
    CreateUser {
        username: String,
        #[arg(long, default_value = "")]
        display_name: String,
        /// Required for staff accounts.
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        staff: bool,
        /// Never auto-assign chores to this user.
        #[arg(long)]
        no_assign: bool,
        /// Do not award points to this user.
        #[arg(long)]
        no_points: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let mut settings = config::load(cli.config.as_deref())?;
    if let Some(url) = cli.database_url {
        settings.database.url = url;
    }

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                settings.server.bind = bind;
            }
            serve(settings).await
        }
        Command::Migrate => {
            let pool = connect(&settings).await?;
            db::pool::run_migrations(&pool).await.context("migration failed")?;
            info!("Migrations applied successfully");
            Ok(())
        }
        Command::Evaluate => {
            let scheduler = scheduler(&settings).await?;
            let created = scheduler.evaluate_day(Utc::now()).await?;
            println!("Created {} instance(s)", created.len());
            Ok(())
        }
        Command::Distribute => {
            let scheduler = scheduler(&settings).await?;
            let report = scheduler.distribute(Utc::now()).await?;
            println!(
                "Assigned {} instance(s), {} left without eligible users, {} skipped",
                report.assigned.len(),
                report.unassigned.len(),
                report.skipped.len()
            );
            Ok(())
        }
        Command::WeeklyReset => {
            let scheduler = scheduler(&settings).await?;
            let report = scheduler.weekly_reset(Utc::now()).await?;
            if report.already_done {
                println!("Week ending {} was already reset", report.week_ending);
            } else {
                println!("Reset {} user(s) for week ending {}", report.users_reset, report.week_ending);
            }
            Ok(())
        }
        Command::CreateUser { username, display_name, password, staff, no_assign, no_points } => {
            let pool = connect(&settings).await?;
            let user = UserService::new(pool)
                .create_user(&UserInput {
                    username,
                    display_name,
                    password,
                    is_staff: staff,
                    can_be_assigned: !no_assign,
                    eligible_for_points: !no_points,
                })
                .await?;
            println!("Created user {} ({})", user.username, user.id);
            Ok(())
        }
    }
}

async fn connect(settings: &Settings) -> Result<DbPool> {
    db::pool::create_pool(&settings.database.url, settings.database.max_connections)
        .await
        .with_context(|| format!("failed to connect to {}", settings.database.url))
}

async fn scheduler(settings: &Settings) -> Result<Scheduler> {
    let pool = connect(settings).await?;
    Ok(Scheduler::new(pool, settings.schedule.clone()))
}

async fn serve(settings: Settings) -> Result<()> {
    let pool = connect(&settings).await?;
    db::pool::run_migrations(&pool).await.context("migration failed")?;

    let (stop_jobs, jobs_shutdown) = watch::channel(false);
    let scheduler = Scheduler::new(pool.clone(), settings.schedule.clone());
    let jobs = tokio::spawn(engine::jobs::run(scheduler, jobs_shutdown));

    let state = AppState::new(pool, settings.schedule, settings.web);
    api::serve(&settings.server.bind, state, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // The receiver may already be gone if the job loop exited on its own.
    let _ = stop_jobs.send(true);
    jobs.await.context("job scheduler panicked")?;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, starting graceful shutdown...");
}
