//! Fixtures shared by the engine's database-backed tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use db::models::{ChoreInstanceRow, ChoreRow, NewUser, ScheduleType, UserRow};
use db::pool::create_memory_pool;
use db::repository::{instances, users};
use db::DbPool;

use crate::chores::{ChoreInput, ChoreService};
use crate::config::EngineConfig;
use crate::schedule::{instance_for, recurring_times};

pub(crate) async fn setup() -> (DbPool, EngineConfig) {
    let pool = create_memory_pool().await.expect("in-memory pool");
    (pool, EngineConfig::default())
}

pub(crate) fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub(crate) async fn user(pool: &DbPool, username: &str) -> UserRow {
    users::create_user(
        pool,
        &NewUser {
            username: username.into(),
            display_name: capitalise(username),
            password_hash: None,
            is_staff: false,
            can_be_assigned: true,
            eligible_for_points: true,
        },
    )
    .await
    .expect("create user")
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn daily(name: &str) -> ChoreInput {
    ChoreInput {
        name: name.into(),
        description: String::new(),
        points: 100,
        is_pool: true,
        assigned_to: None,
        is_undesirable: false,
        is_difficult: false,
        schedule_type: ScheduleType::Daily,
        weekday: None,
        every_n_days: None,
        start_date: None,
        due_date: None,
        distribution_time: "08:00".into(),
    }
}

pub(crate) async fn chore(pool: &DbPool, config: &EngineConfig, input: ChoreInput) -> ChoreRow {
    ChoreService::new(pool.clone(), config.clone())
        .create_chore(&input, Utc::now())
        .await
        .expect("create chore")
        .0
}

/// Create the chore's regular instance for `date`.
pub(crate) async fn instance_on(pool: &DbPool, chore: &ChoreRow, date: NaiveDate) -> ChoreInstanceRow {
    let utc = EngineConfig::default().offset();
    let (due_at, distribution_at) = recurring_times(chore, date, utc);
    instances::create_instance(pool, &instance_for(chore, due_at, distribution_at))
        .await
        .expect("create instance")
}
