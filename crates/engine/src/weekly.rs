//! Weekly points reset.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use db::models::ActionType;
use db::repository::{action_logs, snapshots, users};

use crate::schedule::local_date;
use crate::scheduler::Scheduler;
use crate::EngineError;

#[derive(Debug, Serialize)]
pub struct WeeklyResetReport {
    pub week_ending: NaiveDate,
    /// Users whose weekly points were snapshotted and zeroed.
    pub users_reset: usize,
    /// `true` when the week had already been reset.
    pub already_done: bool,
}

/// The most recent Sunday on or before `date`.
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

impl Scheduler {
    /// Snapshot and zero the weekly points of every user eligible for
    /// points. A second run for the same week does nothing.
    #[instrument(skip(self))]
    pub async fn weekly_reset(&self, now: DateTime<Utc>) -> Result<WeeklyResetReport, EngineError> {
        let week_ending = week_ending(local_date(now, self.config.offset()));

        let mut tx = self.pool.begin().await?;
        if snapshots::exists_for_week(&mut *tx, week_ending).await? {
            info!(%week_ending, "weekly reset already done");
            return Ok(WeeklyResetReport { week_ending, users_reset: 0, already_done: true });
        }

        let eligible: Vec<_> = users::list_users(&mut *tx)
            .await?
            .into_iter()
            .filter(|u| u.eligible_for_points)
            .collect();

        for user in &eligible {
            snapshots::create_snapshot(&mut *tx, user.id, week_ending, user.weekly_points).await?;
            users::reset_weekly_points(&mut *tx, user.id).await?;
        }

        action_logs::record(
            &mut *tx,
            ActionType::WeeklyReset,
            None,
            None,
            &format!("Weekly points reset for week ending {week_ending}"),
        )
        .await?;
        tx.commit().await?;

        info!(%week_ending, users = eligible.len(), "weekly reset finished");
        Ok(WeeklyResetReport { week_ending, users_reset: eligible.len(), already_done: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_ends_on_the_latest_sunday() {
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        assert_eq!(week_ending(sunday), sunday);
        assert_eq!(week_ending(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()), sunday);
        assert_eq!(week_ending(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()), sunday);
    }
}
