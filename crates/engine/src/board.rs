//! Read models for the boards, leaderboard and admin dashboard.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use db::DbPool;
use db::models::{
    ActionLogRow, CompletionDetailRow, InstanceDetailRow, InstanceStatus, ShareDetailRow, UserRow,
};
use db::repository::{action_logs, chores, completions, instances, users};

use crate::config::EngineConfig;
use crate::schedule::{classify, end_of_day, local_date, no_due_date, start_of_day, DueState};
use crate::EngineError;

/// An open instance with its due classification.
#[derive(Debug, Clone, Serialize)]
pub struct BoardItem {
    #[serde(flatten)]
    pub instance: InstanceDetailRow,
    pub due_state: DueState,
}

impl BoardItem {
    pub fn is_overdue(&self) -> bool {
        self.due_state == DueState::Overdue
    }
}

/// One user's column on the main board.
#[derive(Debug, Clone, Serialize)]
pub struct UserColumn {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub items: Vec<BoardItem>,
    pub overdue_count: usize,
}

/// A completion made today with the users it credited.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedItem {
    #[serde(flatten)]
    pub completion: CompletionDetailRow,
    pub helpers: Vec<ShareDetailRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub today: NaiveDate,
    pub pool: Vec<BoardItem>,
    pub pool_overdue: usize,
    pub users: Vec<UserColumn>,
    pub overdue_count: usize,
    pub completed_today: Vec<CompletedItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserBoard {
    pub user: UserRow,
    pub today: NaiveDate,
    pub items: Vec<BoardItem>,
    pub overdue_count: usize,
    /// Today's completions this user was credited for.
    pub completed_today: Vec<CompletedItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolBoard {
    pub today: NaiveDate,
    pub items: Vec<BoardItem>,
    pub overdue_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub weekly_points: i64,
    pub all_time_points: i64,
}

/// Figures shown at the top of the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub active_chores: usize,
    pub pool_size: i64,
    pub assigned_open: i64,
    pub overdue_count: i64,
    pub completions_today: i64,
}

/// Classify open instances and split them into the pool and per-user
/// columns. Every user in `users` gets a column, plus any assignee that
/// holds an instance without being listed. Columns are sorted by display
/// name.
pub fn build_columns(
    open: Vec<InstanceDetailRow>,
    users: &[UserRow],
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> (Vec<BoardItem>, Vec<UserColumn>) {
    let mut columns: HashMap<Uuid, UserColumn> = users
        .iter()
        .map(|u| {
            (
                u.id,
                UserColumn {
                    user_id: u.id,
                    username: u.username.clone(),
                    display_name: u.display_name.clone(),
                    items: Vec::new(),
                    overdue_count: 0,
                },
            )
        })
        .collect();
    let mut pool = Vec::new();

    for instance in open {
        let item = BoardItem { due_state: classify(instance.due_at, now, offset), instance };
        match (item.instance.status, item.instance.assigned_to) {
            (InstanceStatus::Assigned, Some(user_id)) => {
                let column = columns.entry(user_id).or_insert_with(|| UserColumn {
                    user_id,
                    username: item.instance.assignee_username.clone().unwrap_or_default(),
                    display_name: item.instance.assignee_display_name.clone().unwrap_or_default(),
                    items: Vec::new(),
                    overdue_count: 0,
                });
                column.overdue_count += usize::from(item.is_overdue());
                column.items.push(item);
            }
            _ => pool.push(item),
        }
    }

    let mut columns: Vec<UserColumn> = columns.into_values().collect();
    columns.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.username.cmp(&b.username))
    });

    (pool, columns)
}

fn overdue_in(items: &[BoardItem]) -> usize {
    items.iter().filter(|i| i.is_overdue()).count()
}

#[derive(Clone)]
pub struct BoardService {
    pool: DbPool,
    config: EngineConfig,
}

impl BoardService {
    pub fn new(pool: DbPool, config: EngineConfig) -> Self {
        Self { pool, config }
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        local_date(now, self.config.offset())
    }

    /// Open instances due by the end of today, overdue ones and those with
    /// no due date.
    async fn visible_instances(&self, now: DateTime<Utc>) -> Result<Vec<InstanceDetailRow>, EngineError> {
        let offset = self.config.offset();
        let cutoff = end_of_day(local_date(now, offset), offset);
        Ok(instances::list_open_due_by(&self.pool, cutoff, no_due_date()).await?)
    }

    async fn completed_today(&self, now: DateTime<Utc>) -> Result<Vec<CompletedItem>, EngineError> {
        let offset = self.config.offset();
        let since = start_of_day(local_date(now, offset), offset);

        let mut helpers: HashMap<Uuid, Vec<ShareDetailRow>> = HashMap::new();
        for share in completions::list_share_details_since(&self.pool, since).await? {
            helpers.entry(share.completion_id).or_default().push(share);
        }

        Ok(completions::list_details_since(&self.pool, since)
            .await?
            .into_iter()
            .map(|completion| CompletedItem {
                helpers: helpers.remove(&completion.id).unwrap_or_default(),
                completion,
            })
            .collect())
    }

    pub async fn board(&self, now: DateTime<Utc>) -> Result<Board, EngineError> {
        let open = self.visible_instances(now).await?;
        let assignable = users::list_assignable(&self.pool).await?;
        let (pool, users) = build_columns(open, &assignable, now, self.config.offset());

        let pool_overdue = overdue_in(&pool);
        let overdue_count = pool_overdue + users.iter().map(|c| c.overdue_count).sum::<usize>();

        Ok(Board {
            today: self.today(now),
            pool,
            pool_overdue,
            users,
            overdue_count,
            completed_today: self.completed_today(now).await?,
        })
    }

    /// The board filtered to one user's assigned instances.
    pub async fn user_board(&self, username: &str, now: DateTime<Utc>) -> Result<UserBoard, EngineError> {
        let user = users::find_by_username(&self.pool, username)
            .await?
            .ok_or(EngineError::NotFound("user"))?;

        let offset = self.config.offset();
        let items: Vec<BoardItem> = self
            .visible_instances(now)
            .await?
            .into_iter()
            .filter(|i| i.status == InstanceStatus::Assigned && i.assigned_to == Some(user.id))
            .map(|instance| BoardItem { due_state: classify(instance.due_at, now, offset), instance })
            .collect();

        let completed_today = self
            .completed_today(now)
            .await?
            .into_iter()
            .filter(|c| c.completion.completed_by == user.id || c.helpers.iter().any(|h| h.user_id == user.id))
            .collect();

        Ok(UserBoard {
            today: self.today(now),
            overdue_count: overdue_in(&items),
            items,
            user,
            completed_today,
        })
    }

    pub async fn pool_board(&self, now: DateTime<Utc>) -> Result<PoolBoard, EngineError> {
        let offset = self.config.offset();
        let items: Vec<BoardItem> = self
            .visible_instances(now)
            .await?
            .into_iter()
            .filter(|i| i.status == InstanceStatus::Pool)
            .map(|instance| BoardItem { due_state: classify(instance.due_at, now, offset), instance })
            .collect();

        Ok(PoolBoard { today: self.today(now), overdue_count: overdue_in(&items), items })
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, EngineError> {
        Ok(users::leaderboard(&self.pool)
            .await?
            .into_iter()
            .enumerate()
            .map(|(i, u)| LeaderboardEntry {
                rank: i + 1,
                user_id: u.id,
                username: u.username,
                display_name: u.display_name,
                weekly_points: u.weekly_points,
                all_time_points: u.all_time_points,
            })
            .collect())
    }

    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<DashboardStats, EngineError> {
        let offset = self.config.offset();
        let since = start_of_day(local_date(now, offset), offset);

        Ok(DashboardStats {
            active_chores: chores::list_chores(&self.pool, false).await?.len(),
            pool_size: instances::count_by_status(&self.pool, InstanceStatus::Pool).await?,
            assigned_open: instances::count_by_status(&self.pool, InstanceStatus::Assigned).await?,
            overdue_count: instances::count_overdue(&self.pool, now).await?,
            completions_today: completions::count_since(&self.pool, since).await?,
        })
    }

    pub async fn recent_activity(&self, limit: i64) -> Result<Vec<ActionLogRow>, EngineError> {
        Ok(action_logs::list_recent(&self.pool, limit).await?)
    }

    /// Latest completions, undone ones included.
    pub async fn recent_completions(&self, limit: i64) -> Result<Vec<CompletionDetailRow>, EngineError> {
        Ok(completions::list_recent_details(&self.pool, limit).await?)
    }

    /// Every open instance, for the admin reassign/skip pages.
    pub async fn open_instances(&self, now: DateTime<Utc>) -> Result<Vec<BoardItem>, EngineError> {
        let offset = self.config.offset();
        Ok(instances::list_open(&self.pool)
            .await?
            .into_iter()
            .map(|instance| BoardItem { due_state: classify(instance.due_at, now, offset), instance })
            .collect())
    }
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn user(username: &str, display_name: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            username: username.into(),
            display_name: display_name.into(),
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

    fn instance(assignee: Option<&UserRow>, due_at: DateTime<Utc>) -> InstanceDetailRow {
        InstanceDetailRow {
            id: Uuid::new_v4(),
            chore_id: Uuid::new_v4(),
            chore_name: "Dishes".into(),
            chore_description: String::new(),
            is_undesirable: false,
            is_difficult: false,
            status: if assignee.is_some() { InstanceStatus::Assigned } else { InstanceStatus::Pool },
            assigned_to: assignee.map(|u| u.id),
            assignee_username: assignee.map(|u| u.username.clone()),
            assignee_display_name: assignee.map(|u| u.display_name.clone()),
            assignment_reason: None,
            points_value: 100,
            due_at,
            distribution_at: due_at,
            spawned_from: None,
        }
    }

    #[test]
    fn columns_are_split_and_sorted_by_display_name() {
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let zed = user("zed", "Zed");
        let amy = user("amy", "amy");

        let open = vec![
            instance(Some(&zed), now - Duration::hours(1)),
            instance(None, now + Duration::hours(1)),
            instance(Some(&zed), now + Duration::hours(2)),
        ];
        let (pool, columns) = build_columns(open, &[zed.clone(), amy.clone()], now, utc);

        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].due_state, DueState::DueToday);
        assert_eq!(
            columns.iter().map(|c| c.username.as_str()).collect::<Vec<_>>(),
            vec!["amy", "zed"]
        );
        assert!(columns[0].items.is_empty());
        assert_eq!(columns[1].items.len(), 2);
        assert_eq!(columns[1].overdue_count, 1);
    }

    #[test]
    fn unlisted_assignee_still_gets_a_column() {
        let now = Utc::now();
        let utc = FixedOffset::east_opt(0).unwrap();
        let retired = user("old", "Old Timer");

        let (_, columns) = build_columns(vec![instance(Some(&retired), now)], &[], now, utc);
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].display_name, "Old Timer");
    }
}
