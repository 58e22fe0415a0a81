//! In-process job loop run next to the HTTP server.
//!
//! Every tick distributes due pool instances. The first tick of a new local
//! date runs the midnight evaluation and purges expired sessions, and the
//! first tick of a local Monday also runs the weekly reset.

use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::schedule::local_date;
use crate::scheduler::Scheduler;
use crate::users::UserService;

/// Dates on which the daily and weekly jobs last succeeded.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JobState {
    pub last_evaluated: Option<NaiveDate>,
    pub last_weekly_reset: Option<NaiveDate>,
}

/// Run the due jobs once. Failures are logged and retried on the next tick.
pub async fn tick(scheduler: &Scheduler, state: &mut JobState, now: DateTime<Utc>) {
    let today = local_date(now, scheduler.config().offset());

    if state.last_evaluated != Some(today) {
        match scheduler.evaluate_day(now).await {
            Ok(_) => state.last_evaluated = Some(today),
            Err(e) => error!("midnight evaluation failed: {e}"),
        }
        match UserService::new(scheduler.pool.clone()).purge_sessions(now).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "expired sessions purged"),
            Err(e) => error!("session purge failed: {e}"),
        }
    }

    if today.weekday() == Weekday::Mon && state.last_weekly_reset != Some(today) {
        match scheduler.weekly_reset(now).await {
            Ok(_) => state.last_weekly_reset = Some(today),
            Err(e) => error!("weekly reset failed: {e}"),
        }
    }

    if let Err(e) = scheduler.distribute(now).await {
        error!("distribution failed: {e}");
    }
}

/// Tick every `distribution_interval_secs` until `shutdown` flips to `true`
/// or its sender is dropped.
pub async fn run(scheduler: Scheduler, mut shutdown: watch::Receiver<bool>) {
    let period = Duration::from_secs(scheduler.config().distribution_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut state = JobState::default();
    info!(interval_secs = period.as_secs(), "job scheduler started");

    loop {
        tokio::select! {
            _ = ticker.tick() => tick(&scheduler, &mut state, Utc::now()).await,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("job scheduler stopped");
}
