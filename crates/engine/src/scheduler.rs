//! Midnight evaluation: turns chore definitions into the day's instances.
//!
//! `Scheduler` also owns distribution (`assignment.rs`) and the weekly
//! reset (`weekly.rs`); the three jobs share the pool and configuration.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use db::DbPool;
use db::models::ChoreInstanceRow;
use db::repository::{chores, dependencies, instances};

use crate::config::EngineConfig;
use crate::schedule::{
    end_of_day, instance_for, is_scheduled_on, local_date, recurring_times, start_of_day,
};
use crate::EngineError;

/// Runs the scheduled jobs against one database.
#[derive(Clone)]
pub struct Scheduler {
    pub(crate) pool: DbPool,
    pub(crate) config: EngineConfig,
}

impl Scheduler {
    pub fn new(pool: DbPool, config: EngineConfig) -> Self {
        Self { pool, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create today's instances of every active recurring chore.
    ///
    /// Dependency children are skipped (they are spawned by their parent's
    /// completion) as are chores that already have an instance due today,
    /// so running the job twice on the same day creates nothing new.
    #[instrument(skip(self))]
    pub async fn evaluate_day(&self, now: DateTime<Utc>) -> Result<Vec<ChoreInstanceRow>, EngineError> {
        let offset = self.config.offset();
        let today = local_date(now, offset);
        let (day_start, day_end) = (start_of_day(today, offset), end_of_day(today, offset));

        let children: HashSet<Uuid> = dependencies::list_child_chore_ids(&self.pool)
            .await?
            .into_iter()
            .collect();
        let active = chores::list_chores(&self.pool, false).await?;

        let mut created = Vec::new();
        for chore in active
            .iter()
            .filter(|c| is_scheduled_on(c, today) && !children.contains(&c.id))
        {
            if instances::exists_due_between(&self.pool, chore.id, day_start, day_end).await? {
                debug!(chore = %chore.name, "instance already exists for today");
                continue;
            }

            let (due_at, distribution_at) = recurring_times(chore, today, offset);
            let row = instances::create_instance(&self.pool, &instance_for(chore, due_at, distribution_at))
                .await?;
            debug!(chore = %chore.name, instance_id = %row.id, status = %row.status, "instance created");
            created.push(row);
        }

        let overdue = instances::count_overdue(&self.pool, now).await?;
        info!(%today, created = created.len(), overdue, "midnight evaluation finished");

        Ok(created)
    }
}
