//! Chore and template administration.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use db::DbPool;
use db::models::{
    ActionType, ChoreFields, ChoreInstanceRow, ChoreRow, ChoreTemplateRow, ScheduleType,
    TemplateFields,
};
use db::repository::{action_logs, chores, completions, instances, templates, users};

use crate::config::EngineConfig;
use crate::error::missing;
use crate::schedule::{instance_for, one_time_times};
use crate::EngineError;

/// Distribution time used when the form leaves it blank.
pub const DEFAULT_DISTRIBUTION_TIME: &str = "17:30";

/// Chore form as submitted by an admin. Validated into [`ChoreFields`].
#[derive(Debug, Clone, Deserialize)]
pub struct ChoreInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Hundredths of a point.
    pub points: i64,
    #[serde(default)]
    pub is_pool: bool,
    pub assigned_to: Option<Uuid>,
    #[serde(default)]
    pub is_undesirable: bool,
    #[serde(default)]
    pub is_difficult: bool,
    pub schedule_type: ScheduleType,
    pub weekday: Option<i64>,
    pub every_n_days: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    /// Local wall-clock `HH:MM`.
    #[serde(default)]
    pub distribution_time: String,
}

impl ChoreInput {
    /// Check the input and normalise the schedule columns: fields that do
    /// not belong to the schedule type are cleared.
    pub fn validate(&self) -> Result<ChoreFields, EngineError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation("chore name is required".into()));
        }
        if self.points < 0 {
            return Err(EngineError::Validation("points cannot be negative".into()));
        }
        match (self.is_pool, self.assigned_to) {
            (true, Some(_)) => {
                return Err(EngineError::Validation("a pool chore cannot have an assignee".into()))
            }
            (false, None) => {
                return Err(EngineError::Validation("a non-pool chore needs an assignee".into()))
            }
            _ => {}
        }

        let (mut weekday, mut every_n_days, mut start_date, mut due_date) = (None, None, None, None);
        match self.schedule_type {
            ScheduleType::Daily => {}
            ScheduleType::Weekly => match self.weekday {
                Some(day @ 0..=6) => weekday = Some(day),
                _ => {
                    return Err(EngineError::Validation(
                        "weekly chores need a weekday between 0 (Monday) and 6 (Sunday)".into(),
                    ))
                }
            },
            ScheduleType::EveryNDays => match (self.every_n_days, self.start_date) {
                (Some(n), Some(start)) if n >= 1 => {
                    every_n_days = Some(n);
                    start_date = Some(start);
                }
                _ => {
                    return Err(EngineError::Validation(
                        "every-n-days chores need n >= 1 and a start date".into(),
                    ))
                }
            },
            ScheduleType::OneTime => due_date = self.due_date,
        }

        Ok(ChoreFields {
            name: name.to_owned(),
            description: self.description.trim().to_owned(),
            points: self.points,
            is_pool: self.is_pool,
            assigned_to: self.assigned_to,
            is_undesirable: self.is_undesirable,
            is_difficult: self.is_difficult,
            schedule_type: self.schedule_type,
            weekday,
            every_n_days,
            start_date,
            due_date,
            distribution_time: parse_distribution_time(&self.distribution_time)?,
        })
    }
}

/// Parse `HH:MM` (or `HH:MM:SS`). Blank input yields the default time.
pub fn parse_distribution_time(raw: &str) -> Result<NaiveTime, EngineError> {
    let raw = match raw.trim() {
        "" => DEFAULT_DISTRIBUTION_TIME,
        other => other,
    };
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| EngineError::Validation(format!("invalid distribution time '{raw}', expected HH:MM")))
}

/// Values that replace a template's defaults when instantiating it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateOverrides {
    pub name: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// What deleting a chore did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum DeleteOutcome {
    /// The chore had completions: it was deactivated and its open instances
    /// removed.
    Deactivated { removed_instances: u64 },
    /// The chore had no completions and was removed entirely.
    Deleted,
}

#[derive(Clone)]
pub struct ChoreService {
    pool: DbPool,
    config: EngineConfig,
}

impl ChoreService {
    pub fn new(pool: DbPool, config: EngineConfig) -> Self {
        Self { pool, config }
    }

    pub async fn list_chores(&self, include_inactive: bool) -> Result<Vec<ChoreRow>, EngineError> {
        Ok(chores::list_chores(&self.pool, include_inactive).await?)
    }

    pub async fn get_chore(&self, id: Uuid) -> Result<ChoreRow, EngineError> {
        chores::get_chore(&self.pool, id).await.map_err(missing("chore"))
    }

    /// Create a chore. A one-time chore gets its single instance right away.
    pub async fn create_chore(
        &self,
        input: &ChoreInput,
        now: DateTime<Utc>,
    ) -> Result<(ChoreRow, Option<ChoreInstanceRow>), EngineError> {
        self.create_chore_with_eligibility(input, &[], now).await
    }

    /// Create a chore restricted to `eligible` users (empty = everybody).
    /// Nothing is stored when an assignee or eligible user does not exist.
    #[instrument(skip(self, input, eligible), fields(name = %input.name))]
    pub async fn create_chore_with_eligibility(
        &self,
        input: &ChoreInput,
        eligible: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<(ChoreRow, Option<ChoreInstanceRow>), EngineError> {
        let fields = input.validate()?;

        let mut tx = self.pool.begin().await?;
        if let Some(assignee) = fields.assigned_to {
            users::get_user(&mut *tx, assignee).await.map_err(missing("assignee"))?;
        }
        for user_id in eligible {
            users::get_user(&mut *tx, *user_id).await.map_err(missing("user"))?;
        }

        let chore = chores::create_chore(&mut *tx, &fields).await?;
        if !eligible.is_empty() {
            chores::replace_eligibility(&mut *tx, chore.id, eligible).await?;
        }
        let instance = if chore.schedule_type == ScheduleType::OneTime {
            let (due_at, distribution_at) = one_time_times(&chore, now, self.config.offset());
            Some(instances::create_instance(&mut *tx, &instance_for(&chore, due_at, distribution_at)).await?)
        } else {
            None
        };
        tx.commit().await?;

        info!(chore_id = %chore.id, schedule = %chore.schedule_type, "chore created");
        Ok((chore, instance))
    }

    /// Update a chore definition and replace its eligibility list. Existing
    /// instances keep their point value and assignee.
    #[instrument(skip(self, input, eligible))]
    pub async fn update_chore(
        &self,
        id: Uuid,
        input: &ChoreInput,
        eligible: &[Uuid],
    ) -> Result<ChoreRow, EngineError> {
        let fields = input.validate()?;

        let mut tx = self.pool.begin().await?;
        chores::get_chore(&mut *tx, id).await.map_err(missing("chore"))?;
        if let Some(assignee) = fields.assigned_to {
            users::get_user(&mut *tx, assignee).await.map_err(missing("assignee"))?;
        }
        for user_id in eligible {
            users::get_user(&mut *tx, *user_id).await.map_err(missing("user"))?;
        }
        let chore = chores::update_chore(&mut *tx, id, &fields).await?;
        chores::replace_eligibility(&mut *tx, id, eligible).await?;
        tx.commit().await?;

        info!(chore_id = %chore.id, "chore updated");
        Ok(chore)
    }

    /// Reactivate or deactivate a chore without touching its instances.
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<(), EngineError> {
        chores::set_active(&self.pool, id, active)
            .await
            .map_err(missing("chore"))
    }

    /// Remove a chore.
    ///
    /// Chores with completions keep their history: they are deactivated and
    /// only their open instances are removed. Chores nobody ever completed
    /// are deleted outright.
    #[instrument(skip(self))]
    pub async fn delete_chore(&self, id: Uuid, actor: Option<Uuid>) -> Result<DeleteOutcome, EngineError> {
        let mut tx = self.pool.begin().await?;

        let chore = chores::get_chore(&mut *tx, id).await.map_err(missing("chore"))?;
        let outcome = if completions::count_for_chore(&mut *tx, id).await? > 0 {
            chores::set_active(&mut *tx, id, false).await?;
            let removed_instances = instances::delete_open_for_chore(&mut *tx, id).await?;
            action_logs::record(
                &mut *tx,
                ActionType::ChoreDeactivated,
                actor,
                None,
                &format!("{} deactivated, {removed_instances} open instance(s) removed", chore.name),
            )
            .await?;
            DeleteOutcome::Deactivated { removed_instances }
        } else {
            chores::delete_chore(&mut *tx, id).await?;
            action_logs::record(
                &mut *tx,
                ActionType::ChoreDeleted,
                actor,
                None,
                &format!("{} deleted", chore.name),
            )
            .await?;
            DeleteOutcome::Deleted
        };
        tx.commit().await?;

        info!(chore = %chore.name, ?outcome, "chore removed");
        Ok(outcome)
    }

    /// Replace the users eligible for auto-assignment of a chore.
    pub async fn set_eligibility(&self, chore_id: Uuid, user_ids: &[Uuid]) -> Result<(), EngineError> {
        let mut tx = self.pool.begin().await?;
        chores::get_chore(&mut *tx, chore_id).await.map_err(missing("chore"))?;
        for user_id in user_ids {
            users::get_user(&mut *tx, *user_id).await.map_err(missing("user"))?;
        }
        chores::replace_eligibility(&mut *tx, chore_id, user_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn eligibility(&self, chore_id: Uuid) -> Result<Vec<Uuid>, EngineError> {
        Ok(chores::list_eligible_user_ids(&self.pool, chore_id).await?)
    }

    // -----------------------------------------------------------------------
    // Templates
    // -----------------------------------------------------------------------

    /// Save a chore form as a template. The template keeps the schedule
    /// shape but not dates or the assignee.
    pub async fn create_template(
        &self,
        input: &ChoreInput,
        created_by: Option<Uuid>,
    ) -> Result<ChoreTemplateRow, EngineError> {
        let is_pool = input.is_pool;
        // Templates carry no assignee and no dates.
        let shape = ChoreInput {
            is_pool: true,
            assigned_to: None,
            start_date: input.start_date.or(Some(NaiveDate::MIN)),
            ..input.clone()
        };
        let fields = shape.validate()?;

        Ok(templates::create_template(
            &self.pool,
            &TemplateFields {
                name: fields.name,
                description: fields.description,
                points: fields.points,
                is_pool,
                is_undesirable: fields.is_undesirable,
                is_difficult: fields.is_difficult,
                schedule_type: fields.schedule_type,
                weekday: fields.weekday,
                every_n_days: fields.every_n_days,
                distribution_time: fields.distribution_time,
                created_by,
            },
        )
        .await?)
    }

    pub async fn list_templates(&self) -> Result<Vec<ChoreTemplateRow>, EngineError> {
        Ok(templates::list_templates(&self.pool).await?)
    }

    pub async fn delete_template(&self, id: Uuid) -> Result<(), EngineError> {
        templates::delete_template(&self.pool, id)
            .await
            .map_err(missing("template"))
    }

    /// Create a chore from a template, applying `overrides`.
    pub async fn create_chore_from_template(
        &self,
        template_id: Uuid,
        overrides: &TemplateOverrides,
        now: DateTime<Utc>,
    ) -> Result<(ChoreRow, Option<ChoreInstanceRow>), EngineError> {
        let template = templates::get_template(&self.pool, template_id)
            .await
            .map_err(missing("template"))?;

        let input = ChoreInput {
            name: overrides.name.clone().unwrap_or(template.name),
            description: template.description,
            points: template.points,
            is_pool: template.is_pool,
            assigned_to: if template.is_pool { None } else { overrides.assigned_to },
            is_undesirable: template.is_undesirable,
            is_difficult: template.is_difficult,
            schedule_type: template.schedule_type,
            weekday: template.weekday,
            every_n_days: template.every_n_days,
            start_date: overrides.start_date,
            due_date: overrides.due_date,
            distribution_time: template.distribution_time.format("%H:%M").to_string(),
        };

        self.create_chore(&input, now).await
    }
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn input(schedule_type: ScheduleType) -> ChoreInput {
        ChoreInput {
            name: "  Vacuum ".into(),
            description: String::new(),
            points: 200,
            is_pool: true,
            assigned_to: None,
            is_undesirable: false,
            is_difficult: false,
            schedule_type,
            weekday: Some(3),
            every_n_days: Some(2),
            start_date: None,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 9),
            distribution_time: "08:15".into(),
        }
    }

    #[test]
    fn daily_input_clears_unrelated_schedule_fields() {
        let fields = input(ScheduleType::Daily).validate().unwrap();
        assert_eq!(fields.name, "Vacuum");
        assert_eq!(fields.weekday, None);
        assert_eq!(fields.every_n_days, None);
        assert_eq!(fields.due_date, None);
        assert_eq!(fields.distribution_time, NaiveTime::from_hms_opt(8, 15, 0).unwrap());
    }

    #[test]
    fn weekday_must_be_in_range() {
        let mut weekly = input(ScheduleType::Weekly);
        assert_eq!(weekly.validate().unwrap().weekday, Some(3));
        weekly.weekday = Some(7);
        assert!(matches!(weekly.validate(), Err(EngineError::Validation(_))));
    }

    #[test]
    fn every_n_days_needs_a_start_date() {
        let mut every = input(ScheduleType::EveryNDays);
        assert!(every.validate().is_err());
        every.start_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(every.validate().unwrap().every_n_days, Some(2));
        every.every_n_days = Some(0);
        assert!(every.validate().is_err());
    }

    #[test]
    fn pool_and_assignee_are_exclusive() {
        let mut chore = input(ScheduleType::Daily);
        chore.assigned_to = Some(Uuid::new_v4());
        assert!(chore.validate().is_err());
        chore.is_pool = false;
        assert!(chore.validate().is_ok());
        chore.assigned_to = None;
        assert!(chore.validate().is_err());
    }

    #[test]
    fn blank_name_and_negative_points_are_rejected() {
        let mut chore = input(ScheduleType::Daily);
        chore.name = "   ".into();
        assert!(chore.validate().is_err());

        let mut chore = input(ScheduleType::Daily);
        chore.points = -1;
        assert!(chore.validate().is_err());
    }

    #[test]
    fn distribution_time_parsing() {
        assert_eq!(parse_distribution_time("").unwrap(), NaiveTime::from_hms_opt(17, 30, 0).unwrap());
        assert_eq!(parse_distribution_time("06:05:30").unwrap(), NaiveTime::from_hms_opt(6, 5, 30).unwrap());
        assert!(parse_distribution_time("25:00").is_err());
        assert!(parse_distribution_time("noon").is_err());
    }
}
