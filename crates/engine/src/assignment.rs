//! Auto-assignment of pool instances once their distribution time passes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use db::models::{ActionType, ChoreInstanceRow, UserRow};
use db::repository::{action_logs, chores, completions, instances, users};
use db::DbError;

use crate::scheduler::Scheduler;
use crate::EngineError;

/// Reason stored on instances nobody could be given.
pub const NO_ELIGIBLE_USERS: &str = "no_eligible_users";

/// A user that may receive an instance, with the load figures used to pick
/// between candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub user_id: Uuid,
    pub username: String,
    pub open_assigned: i64,
    pub weekly_points: i64,
}

/// Filter the assignable users down to those allowed to take a chore.
///
/// `listed` is the chore's eligibility list (empty = everybody). For
/// undesirable chores `last_completer` is removed from the result unless
/// that would leave nobody.
pub fn eligible_users<'a>(
    assignable: &'a [UserRow],
    listed: &[Uuid],
    is_undesirable: bool,
    last_completer: Option<Uuid>,
) -> Vec<&'a UserRow> {
    let allowed: Vec<&UserRow> = assignable
        .iter()
        .filter(|u| u.is_active && u.can_be_assigned)
        .filter(|u| listed.is_empty() || listed.contains(&u.id))
        .collect();

    match (is_undesirable, last_completer) {
        (true, Some(previous)) => {
            let rotated: Vec<&UserRow> = allowed.iter().copied().filter(|u| u.id != previous).collect();
            if rotated.is_empty() { allowed } else { rotated }
        }
        _ => allowed,
    }
}

/// Pick the least loaded candidate: fewest open assigned instances, then
/// lowest weekly points, then username.
pub fn choose_assignee(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates
        .iter()
        .min_by(|a, b| {
            a.open_assigned
                .cmp(&b.open_assigned)
                .then(a.weekly_points.cmp(&b.weekly_points))
                .then_with(|| a.username.cmp(&b.username))
        })
}

/// What a distribution run did.
#[derive(Debug, Default, Serialize)]
pub struct DistributionReport {
    /// `(instance_id, user_id)` pairs.
    pub assigned: Vec<(Uuid, Uuid)>,
    /// Instances left in the pool because nobody was eligible.
    pub unassigned: Vec<Uuid>,
    /// Instances claimed, reassigned or closed while the run was in progress.
    pub skipped: Vec<Uuid>,
}

/// Result of offering one instance to the auto-assigner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    Assigned(Uuid),
    NoEligibleUsers,
    /// The instance was no longer an unoffered pool instance.
    Skipped,
}

impl Scheduler {
    /// Auto-assign every pool instance whose distribution time has passed
    /// and that was not attempted before.
    #[instrument(skip(self))]
    pub async fn distribute(&self, now: DateTime<Utc>) -> Result<DistributionReport, EngineError> {
        let pending = instances::list_pending_distribution(&self.pool, now).await?;
        let mut report = DistributionReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        let assignable = users::list_assignable(&self.pool).await?;

        for instance in &pending {
            match self.distribute_instance(instance, &assignable, now).await? {
                Distribution::Assigned(user_id) => report.assigned.push((instance.id, user_id)),
                Distribution::NoEligibleUsers => report.unassigned.push(instance.id),
                Distribution::Skipped => report.skipped.push(instance.id),
            }
        }

        Ok(report)
    }

    /// Offer one pending instance. The write only lands while the instance
    /// is still an unoffered pool instance, so a claim or reassignment made
    /// after `instance` was read wins.
    pub(crate) async fn distribute_instance(
        &self,
        instance: &ChoreInstanceRow,
        assignable: &[UserRow],
        now: DateTime<Utc>,
    ) -> Result<Distribution, EngineError> {
        let chore = match chores::get_chore(&self.pool, instance.chore_id).await {
            Ok(chore) => chore,
            // Hard-deleted chores take their instances with them.
            Err(DbError::NotFound) => return Ok(Distribution::Skipped),
            Err(e) => return Err(e.into()),
        };
        let listed = chores::list_eligible_user_ids(&self.pool, chore.id).await?;
        let last_completer = if chore.is_undesirable {
            completions::last_completer_for_chore(&self.pool, chore.id).await?
        } else {
            None
        };

        let mut candidates = Vec::new();
        for user in eligible_users(assignable, &listed, chore.is_undesirable, last_completer) {
            candidates.push(Candidate {
                user_id: user.id,
                username: user.username.clone(),
                open_assigned: instances::count_open_assigned(&self.pool, user.id).await?,
                weekly_points: user.weekly_points,
            });
        }

        let Some(chosen) = choose_assignee(&candidates) else {
            if !instances::mark_pool_reason(&self.pool, instance.id, NO_ELIGIBLE_USERS).await? {
                debug!(instance_id = %instance.id, "instance left the pool during distribution");
                return Ok(Distribution::Skipped);
            }
            warn!(chore = %chore.name, instance_id = %instance.id, "no eligible users, leaving in pool");
            return Ok(Distribution::NoEligibleUsers);
        };

        let mut tx = self.pool.begin().await?;
        if !instances::assign_from_pool(&mut *tx, instance.id, chosen.user_id, "auto", now).await? {
            debug!(instance_id = %instance.id, "instance left the pool during distribution");
            return Ok(Distribution::Skipped);
        }
        action_logs::record(
            &mut *tx,
            ActionType::AutoAssign,
            None,
            Some(chosen.user_id),
            &format!("{} auto-assigned to {}", chore.name, chosen.username),
        )
        .await?;
        tx.commit().await?;

        info!(chore = %chore.name, user = %chosen.username, "instance auto-assigned");
        Ok(Distribution::Assigned(chosen.user_id))
    }
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            username: username.into(),
            display_name: username.into(),
            password_hash: None,
            is_staff: false,
            is_active: true,
            can_be_assigned: true,
            eligible_for_points: true,
            weekly_points: 0,
            all_time_points: 0,
            created_at: Utc::now(),
        }
    }

    fn candidate(username: &str, open_assigned: i64, weekly_points: i64) -> Candidate {
        Candidate {
            user_id: Uuid::new_v4(),
            username: username.into(),
            open_assigned,
            weekly_points,
        }
    }

    #[test]
    fn undesirable_chore_rotates_away_from_last_completer() {
        let users = vec![user("ada"), user("bob")];
        let eligible = eligible_users(&users, &[], true, Some(users[0].id));
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].username, "bob");
    }

    #[test]
    fn rotation_keeps_the_only_eligible_user() {
        let users = vec![user("ada")];
        let eligible = eligible_users(&users, &[], true, Some(users[0].id));
        assert_eq!(eligible.len(), 1);
    }

    #[test]
    fn rotation_does_not_apply_to_ordinary_chores() {
        let users = vec![user("ada"), user("bob")];
        assert_eq!(eligible_users(&users, &[], false, Some(users[0].id)).len(), 2);
    }

    #[test]
    fn eligibility_list_restricts_candidates() {
        let mut users = vec![user("ada"), user("bob"), user("cy")];
        users[2].can_be_assigned = false;
        let eligible = eligible_users(&users, &[users[1].id, users[2].id], false, None);
        assert_eq!(eligible.iter().map(|u| u.username.as_str()).collect::<Vec<_>>(), vec!["bob"]);
    }

    #[test]
    fn least_loaded_candidate_wins() {
        let candidates = vec![
            candidate("ada", 2, 0),
            candidate("bob", 1, 900),
            candidate("cy", 1, 300),
        ];
        assert_eq!(choose_assignee(&candidates).map(|c| c.username.as_str()), Some("cy"));
    }

    #[test]
    fn username_breaks_ties() {
        let candidates = vec![candidate("zoe", 0, 0), candidate("amy", 0, 0)];
        assert_eq!(choose_assignee(&candidates).map(|c| c.username.as_str()), Some("amy"));
        assert!(choose_assignee(&[]).is_none());
    }
}
