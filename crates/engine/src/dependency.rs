//! Chore dependencies: completing a parent chore's instance spawns an
//! instance of each child chore.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use db::DbPool;
use db::models::{
    ActionType, ChoreDependencyRow, ChoreInstanceRow, InstanceStatus, NewInstance, UserRow,
};
use db::repository::{action_logs, chores, dependencies, instances, users};

use crate::config::EngineConfig;
use crate::dag::{validate_dependency_graph, DependencyEdge};
use crate::error::missing;
use crate::schedule::{end_of_day, local_date};
use crate::EngineError;

/// Reason stored on instances handed to the parent's completer.
pub const DEPENDENCY_REASON: &str = "dependency";

#[derive(Clone)]
pub struct DependencyService {
    pool: DbPool,
    config: EngineConfig,
}

impl DependencyService {
    pub fn new(pool: DbPool, config: EngineConfig) -> Self {
        Self { pool, config }
    }

    /// Add "`child` is spawned when `parent` is completed".
    ///
    /// # Errors
    /// - [`EngineError::Validation`] for a self-dependency or a negative offset.
    /// - [`EngineError::UnknownChoreReference`] when either chore is missing.
    /// - [`EngineError::CycleDetected`] when the edge would close a cycle.
    /// - [`EngineError::Conflict`] when the edge already exists.
    #[instrument(skip(self))]
    pub async fn add_dependency(
        &self,
        child: Uuid,
        parent: Uuid,
        offset_hours: i64,
    ) -> Result<ChoreDependencyRow, EngineError> {
        if offset_hours < 0 {
            return Err(EngineError::Validation("offset hours cannot be negative".into()));
        }

        let chore_ids: Vec<Uuid> = chores::list_chores(&self.pool, true)
            .await?
            .iter()
            .map(|c| c.id)
            .collect();

        let mut edges: Vec<DependencyEdge> = dependencies::list_dependencies(&self.pool)
            .await?
            .iter()
            .map(|d| DependencyEdge { parent: d.depends_on_id, child: d.chore_id })
            .collect();
        edges.push(DependencyEdge { parent, child });

        validate_dependency_graph(&chore_ids, &edges)?;

        let row = dependencies::create_dependency(&self.pool, child, parent, offset_hours).await?;
        info!(dependency_id = %row.id, "dependency added");
        Ok(row)
    }

    pub async fn remove_dependency(&self, id: Uuid) -> Result<(), EngineError> {
        dependencies::delete_dependency(&self.pool, id)
            .await
            .map_err(missing("dependency"))
    }

    pub async fn list_dependencies(&self) -> Result<Vec<ChoreDependencyRow>, EngineError> {
        Ok(dependencies::list_dependencies(&self.pool).await?)
    }

    /// Spawn the children of a completed instance in a transaction of its
    /// own. Completion calls [`spawn_dependent_chores`] inside its own
    /// transaction instead.
    pub async fn spawn_dependent_chores(
        &self,
        parent_instance_id: Uuid,
        completed_by: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<Vec<ChoreInstanceRow>, EngineError> {
        let mut tx = self.pool.begin().await?;
        let parent = instances::get_instance(&mut *tx, parent_instance_id)
            .await
            .map_err(missing("instance"))?;
        let completer = users::get_user(&mut *tx, completed_by)
            .await
            .map_err(missing("user"))?;

        let spawned = spawn_dependent_chores(
            &mut *tx,
            self.config.offset(),
            &parent,
            &completer,
            completed_at,
        )
        .await?;
        tx.commit().await?;

        Ok(spawned)
    }
}

/// Create the child instances of `parent` after it was completed.
///
/// Each active child chore gets one instance distributed `offset_hours`
/// after `completed_at` and due at the end of that local day. The completer
/// keeps the follow-up when they can be assigned chores; otherwise it goes
/// to the pool. A parent instance never spawns the same child twice.
#[instrument(skip_all, fields(parent_instance = %parent.id))]
pub async fn spawn_dependent_chores(
    conn: &mut SqliteConnection,
    offset: FixedOffset,
    parent: &ChoreInstanceRow,
    completer: &UserRow,
    completed_at: DateTime<Utc>,
) -> Result<Vec<ChoreInstanceRow>, EngineError> {
    let edges = dependencies::list_children_of(&mut *conn, parent.chore_id).await?;
    let mut spawned = Vec::with_capacity(edges.len());

    for edge in edges {
        let child = chores::get_chore(&mut *conn, edge.chore_id).await?;
        if !child.is_active {
            debug!(chore = %child.name, "child chore inactive, not spawning");
            continue;
        }
        if instances::exists_spawned(&mut *conn, parent.id, child.id).await? {
            debug!(chore = %child.name, "child already spawned");
            continue;
        }

        let distribution_at = completed_at + Duration::hours(edge.offset_hours);
        let due_at = end_of_day(local_date(distribution_at, offset), offset);

        let keep = completer.is_active && completer.can_be_assigned;
        let new = NewInstance {
            chore_id: child.id,
            status: if keep { InstanceStatus::Assigned } else { InstanceStatus::Pool },
            assigned_to: keep.then_some(completer.id),
            assignment_reason: keep.then(|| DEPENDENCY_REASON.to_owned()),
            points_value: child.points,
            due_at,
            distribution_at,
            spawned_from: Some(parent.id),
        };
        let row = instances::create_instance(&mut *conn, &new).await?;

        action_logs::record(
            &mut *conn,
            ActionType::Spawn,
            Some(completer.id),
            row.assigned_to,
            &format!("{} spawned by completion of its parent chore", child.name),
        )
        .await?;

        info!(chore = %child.name, instance_id = %row.id, status = %row.status, "dependent chore spawned");
        spawned.push(row);
    }

    Ok(spawned)
}
