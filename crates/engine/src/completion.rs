//! Claims, completions with point sharing, undo, skip and reassignment.
//!
//! Every state change runs in one transaction together with its point
//! updates, action-log entry and (for completions) dependency spawning.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{info, instrument};
use uuid::Uuid;

use db::DbPool;
use db::models::{
    ActionType, ChoreInstanceRow, CompletionRow, CompletionShareRow, InstanceStatus, UserRow,
};
use db::repository::{action_logs, completions, instances, users};

use crate::config::EngineConfig;
use crate::dependency::spawn_dependent_chores;
use crate::error::missing;
use crate::points::{format_points, split_points};
use crate::schedule::{local_date, start_of_day};
use crate::EngineError;

/// Result of completing an instance.
#[derive(Debug, Serialize)]
pub struct CompletionOutcome {
    pub completion: CompletionRow,
    pub shares: Vec<CompletionShareRow>,
    /// Child instances created by dependencies of the completed chore.
    pub spawned: Vec<ChoreInstanceRow>,
}

/// Result of undoing a completion.
#[derive(Debug, Serialize)]
pub struct UndoOutcome {
    pub instance: ChoreInstanceRow,
    /// Open child instances removed together with the completion.
    pub removed_children: u64,
}

#[derive(Clone)]
pub struct CompletionService {
    pool: DbPool,
    config: EngineConfig,
}

impl CompletionService {
    pub fn new(pool: DbPool, config: EngineConfig) -> Self {
        Self { pool, config }
    }

    /// Take a pool instance.
    ///
    /// # Errors
    /// - [`EngineError::InvalidState`] unless the instance is in the pool.
    /// - [`EngineError::NotAssignable`] for inactive or unassignable users.
    /// - [`EngineError::ClaimLimitReached`] past the daily claim limit.
    #[instrument(skip(self))]
    pub async fn claim(
        &self,
        instance_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ChoreInstanceRow, EngineError> {
        let mut tx = self.pool.begin().await?;

        let detail = instances::get_instance_detail(&mut *tx, instance_id)
            .await
            .map_err(missing("instance"))?;
        if detail.status != InstanceStatus::Pool {
            return Err(EngineError::InvalidState { status: detail.status, action: "claim" });
        }

        let user = assignable_user(&mut *tx, user_id).await?;

        let limit = self.config.max_claims_per_day;
        if limit > 0 {
            let offset = self.config.offset();
            let since = start_of_day(local_date(now, offset), offset);
            let claimed = instances::count_claims_since(&mut *tx, user.id, since).await?;
            if claimed >= i64::from(limit) {
                return Err(EngineError::ClaimLimitReached { limit });
            }
        }

        instances::assign(&mut *tx, instance_id, user.id, "claimed", now).await?;
        action_logs::record(
            &mut *tx,
            ActionType::Claim,
            Some(user.id),
            Some(user.id),
            &format!("{} claimed {}", user.display_name, detail.chore_name),
        )
        .await?;
        let row = instances::get_instance(&mut *tx, instance_id).await?;
        tx.commit().await?;

        info!(chore = %detail.chore_name, user = %user.username, "instance claimed");
        Ok(row)
    }

    /// Complete an open instance and share its points among the helpers.
    ///
    /// `helpers` defaults to the completer. Duplicates are dropped, keeping
    /// the first occurrence. Helpers not eligible for points get no share.
    #[instrument(skip(self, helpers))]
    pub async fn complete(
        &self,
        instance_id: Uuid,
        completed_by: Uuid,
        helpers: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, EngineError> {
        let mut tx = self.pool.begin().await?;

        let instance = instances::get_instance(&mut *tx, instance_id)
            .await
            .map_err(missing("instance"))?;
        if !instance.status.is_open() {
            return Err(EngineError::InvalidState { status: instance.status, action: "complete" });
        }

        let completer = users::get_user(&mut *tx, completed_by)
            .await
            .map_err(missing("user"))?;

        let requested: &[Uuid] = if helpers.is_empty() {
            std::slice::from_ref(&completed_by)
        } else {
            helpers
        };
        let mut helper_ids: Vec<Uuid> = Vec::with_capacity(requested.len());
        for id in requested {
            if !helper_ids.contains(id) {
                helper_ids.push(*id);
            }
        }

        let mut earners: Vec<UserRow> = Vec::with_capacity(helper_ids.len());
        for id in helper_ids {
            let helper = users::get_user(&mut *tx, id).await.map_err(missing("helper"))?;
            if helper.eligible_for_points {
                earners.push(helper);
            }
        }

        let was_late = now > instance.due_at;
        let completion =
            completions::create_completion(&mut *tx, instance.id, completer.id, now, was_late).await?;

        let mut shares = Vec::with_capacity(earners.len());
        for (helper, points) in earners.iter().zip(split_points(instance.points_value, earners.len())) {
            shares.push(completions::create_share(&mut *tx, completion.id, helper.id, points).await?);
            users::add_points(&mut *tx, helper.id, points).await?;
        }

        instances::update_status(&mut *tx, instance.id, InstanceStatus::Completed, Some(now)).await?;

        action_logs::record(
            &mut *tx,
            ActionType::Complete,
            Some(completer.id),
            Some(completer.id),
            &format!(
                "{} completed a chore worth {} points{}",
                completer.display_name,
                format_points(instance.points_value),
                if was_late { " (late)" } else { "" },
            ),
        )
        .await?;

        let spawned =
            spawn_dependent_chores(&mut *tx, self.config.offset(), &instance, &completer, now).await?;
        tx.commit().await?;

        info!(
            instance_id = %instance.id,
            user = %completer.username,
            helpers = shares.len(),
            spawned = spawned.len(),
            was_late,
            "instance completed"
        );
        Ok(CompletionOutcome { completion, shares, spawned })
    }

    /// Reverse a completion made within the undo window.
    #[instrument(skip(self))]
    pub async fn undo_completion(
        &self,
        completion_id: Uuid,
        actor: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<UndoOutcome, EngineError> {
        let mut tx = self.pool.begin().await?;

        let completion = completions::get_completion(&mut *tx, completion_id)
            .await
            .map_err(missing("completion"))?;
        if completion.is_undone {
            return Err(EngineError::AlreadyUndone);
        }
        let hours = self.config.undo_window_hours;
        if now - completion.completed_at > Duration::hours(hours) {
            return Err(EngineError::UndoWindowExpired { hours });
        }

        for share in completions::list_shares(&mut *tx, completion.id).await? {
            users::add_points(&mut *tx, share.user_id, -share.points_awarded).await?;
        }
        completions::mark_undone(&mut *tx, completion.id, actor, now).await?;

        let instance = instances::get_instance(&mut *tx, completion.instance_id).await?;
        let status = if instance.assigned_to.is_some() {
            InstanceStatus::Assigned
        } else {
            InstanceStatus::Pool
        };
        instances::update_status(&mut *tx, instance.id, status, None).await?;
        let removed_children = instances::delete_open_spawned_from(&mut *tx, instance.id).await?;

        action_logs::record(
            &mut *tx,
            ActionType::Undo,
            actor,
            Some(completion.completed_by),
            &format!("Completion undone, {removed_children} follow-up chore(s) removed"),
        )
        .await?;

        let instance = instances::get_instance(&mut *tx, instance.id).await?;
        tx.commit().await?;

        info!(completion_id = %completion.id, removed_children, "completion undone");
        Ok(UndoOutcome { instance, removed_children })
    }

    /// Mark an open instance as skipped. No points change hands.
    #[instrument(skip(self))]
    pub async fn skip(&self, instance_id: Uuid, actor: Option<Uuid>) -> Result<ChoreInstanceRow, EngineError> {
        let mut tx = self.pool.begin().await?;

        let detail = instances::get_instance_detail(&mut *tx, instance_id)
            .await
            .map_err(missing("instance"))?;
        if !detail.status.is_open() {
            return Err(EngineError::InvalidState { status: detail.status, action: "skip" });
        }

        instances::update_status(&mut *tx, instance_id, InstanceStatus::Skipped, None).await?;
        action_logs::record(
            &mut *tx,
            ActionType::Skip,
            actor,
            detail.assigned_to,
            &format!("{} skipped", detail.chore_name),
        )
        .await?;
        let row = instances::get_instance(&mut *tx, instance_id).await?;
        tx.commit().await?;

        Ok(row)
    }

    /// Hand an open instance to `user_id`.
    #[instrument(skip(self))]
    pub async fn reassign(
        &self,
        instance_id: Uuid,
        user_id: Uuid,
        actor: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<ChoreInstanceRow, EngineError> {
        let mut tx = self.pool.begin().await?;

        let detail = instances::get_instance_detail(&mut *tx, instance_id)
            .await
            .map_err(missing("instance"))?;
        if !detail.status.is_open() {
            return Err(EngineError::InvalidState { status: detail.status, action: "reassign" });
        }

        let user = assignable_user(&mut *tx, user_id).await?;

        instances::assign(&mut *tx, instance_id, user.id, "manual", now).await?;
        action_logs::record(
            &mut *tx,
            ActionType::Reassign,
            actor,
            Some(user.id),
            &format!("{} reassigned to {}", detail.chore_name, user.display_name),
        )
        .await?;
        let row = instances::get_instance(&mut *tx, instance_id).await?;
        tx.commit().await?;

        info!(chore = %detail.chore_name, user = %user.username, "instance reassigned");
        Ok(row)
    }
}

async fn assignable_user(conn: &mut SqliteConnection, user_id: Uuid) -> Result<UserRow, EngineError> {
    let user = users::get_user(&mut *conn, user_id).await.map_err(missing("user"))?;
    if !user.is_active || !user.can_be_assigned {
        return Err(EngineError::NotAssignable(user.username));
    }
    Ok(user)
}
