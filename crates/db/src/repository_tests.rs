//! Repository tests against an in-memory SQLite database.

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::models::{ChoreFields, InstanceStatus, NewInstance, NewUser, ScheduleType};
use crate::pool::create_memory_pool;
use crate::repository::{chores, completions, instances, snapshots, users};
use crate::DbError;

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.into(),
        display_name: username.to_uppercase(),
        password_hash: None,
        is_staff: false,
        can_be_assigned: true,
        eligible_for_points: true,
    }
}

fn daily_chore(name: &str) -> ChoreFields {
    ChoreFields {
        name: name.into(),
        description: String::new(),
        points: 150,
        is_pool: true,
        assigned_to: None,
        is_undesirable: false,
        is_difficult: false,
        schedule_type: ScheduleType::Daily,
        weekday: None,
        every_n_days: None,
        start_date: None,
        due_date: None,
        distribution_time: NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
    }
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let pool = create_memory_pool().await.unwrap();
    users::create_user(&pool, &new_user("ada")).await.unwrap();

    let err = users::create_user(&pool, &new_user("ada")).await.unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)));
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let pool = create_memory_pool().await.unwrap();
    let err = users::get_user(&pool, uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[tokio::test]
async fn weekly_points_never_drop_below_zero() {
    let pool = create_memory_pool().await.unwrap();
    let user = users::create_user(&pool, &new_user("ada")).await.unwrap();

    users::add_points(&pool, user.id, 100).await.unwrap();
    users::reset_weekly_points(&pool, user.id).await.unwrap();
    users::add_points(&pool, user.id, -100).await.unwrap();

    let user = users::get_user(&pool, user.id).await.unwrap();
    assert_eq!(user.weekly_points, 0);
    assert_eq!(user.all_time_points, 0);
}

#[tokio::test]
async fn chore_round_trips_schedule_columns() {
    let pool = create_memory_pool().await.unwrap();
    let mut fields = daily_chore("Water plants");
    fields.schedule_type = ScheduleType::EveryNDays;
    fields.every_n_days = Some(3);
    fields.start_date = NaiveDate::from_ymd_opt(2024, 3, 1);

    let created = chores::create_chore(&pool, &fields).await.unwrap();
    let fetched = chores::get_chore(&pool, created.id).await.unwrap();

    assert_eq!(fetched.schedule_type, ScheduleType::EveryNDays);
    assert_eq!(fetched.every_n_days, Some(3));
    assert_eq!(fetched.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    assert_eq!(fetched.distribution_time, NaiveTime::from_hms_opt(17, 30, 0).unwrap());
    assert!(fetched.is_active);
}

#[tokio::test]
async fn open_due_query_excludes_future_and_closed_instances() {
    let pool = create_memory_pool().await.unwrap();
    let chore = chores::create_chore(&pool, &daily_chore("Dishes")).await.unwrap();
    let sentinel = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
    let cutoff = Utc.with_ymd_and_hms(2024, 3, 4, 23, 59, 59).unwrap();

    let make = |due_at: chrono::DateTime<Utc>, status: InstanceStatus| NewInstance {
        chore_id: chore.id,
        status,
        assigned_to: None,
        assignment_reason: None,
        points_value: 150,
        due_at,
        distribution_at: due_at - Duration::hours(6),
        spawned_from: None,
    };

    let today = instances::create_instance(&pool, &make(cutoff, InstanceStatus::Pool)).await.unwrap();
    let no_due = instances::create_instance(&pool, &make(sentinel, InstanceStatus::Pool)).await.unwrap();
    instances::create_instance(&pool, &make(cutoff + Duration::days(1), InstanceStatus::Pool))
        .await
        .unwrap();
    instances::create_instance(&pool, &make(cutoff, InstanceStatus::Skipped)).await.unwrap();

    let open = instances::list_open_due_by(&pool, cutoff, sentinel).await.unwrap();
    let ids: Vec<_> = open.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![today.id, no_due.id]);
    assert_eq!(open[0].chore_name, "Dishes");
}

#[tokio::test]
async fn undone_completions_are_ignored_for_last_completer() {
    let pool = create_memory_pool().await.unwrap();
    let ada = users::create_user(&pool, &new_user("ada")).await.unwrap();
    let bob = users::create_user(&pool, &new_user("bob")).await.unwrap();
    let chore = chores::create_chore(&pool, &daily_chore("Trash")).await.unwrap();
    let now = Utc::now();

    let instance = instances::create_instance(
        &pool,
        &NewInstance {
            chore_id: chore.id,
            status: InstanceStatus::Pool,
            assigned_to: None,
            assignment_reason: None,
            points_value: 150,
            due_at: now,
            distribution_at: now,
            spawned_from: None,
        },
    )
    .await
    .unwrap();

    completions::create_completion(&pool, instance.id, ada.id, now - Duration::hours(2), false)
        .await
        .unwrap();
    let later = completions::create_completion(&pool, instance.id, bob.id, now, false)
        .await
        .unwrap();
    completions::mark_undone(&pool, later.id, None, now).await.unwrap();

    let last = completions::last_completer_for_chore(&pool, chore.id).await.unwrap();
    assert_eq!(last, Some(ada.id));

    let again = completions::mark_undone(&pool, later.id, None, now).await;
    assert!(matches!(again, Err(DbError::NotFound)));
}

#[tokio::test]
async fn second_snapshot_for_same_week_is_a_conflict() {
    let pool = create_memory_pool().await.unwrap();
    let ada = users::create_user(&pool, &new_user("ada")).await.unwrap();
    let week = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();

    snapshots::create_snapshot(&pool, ada.id, week, 500).await.unwrap();
    assert!(snapshots::exists_for_week(&pool, week).await.unwrap());

    let err = snapshots::create_snapshot(&pool, ada.id, week, 10).await.unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)));
}
