//! Schedule rules: which chores are due on which local date, and the due and
//! distribution times of the instances they produce.
//!
//! All functions here are pure. Local wall-clock times are expressed through
//! a `FixedOffset`; storage is always UTC.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use db::models::{ChoreRow, InstanceStatus, NewInstance, ScheduleType};

/// Due date stored for tasks that have no due date. Never overdue.
pub fn no_due_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub fn is_no_due_date(due_at: DateTime<Utc>) -> bool {
    due_at >= no_due_date()
}

/// The local calendar date of `now`.
pub fn local_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// The UTC instant of a local wall-clock time.
pub fn at_local(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(time) - Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&local)
}

/// First instant of the local day.
pub fn start_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    at_local(date, NaiveTime::MIN, offset)
}

/// Last second of the local day.
pub fn end_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    start_of_day(date, offset) + Duration::days(1) - Duration::seconds(1)
}

/// Whether a recurring chore produces an instance on `date`.
///
/// One-time chores are never "scheduled": their single instance is created
/// together with the chore.
pub fn is_scheduled_on(chore: &ChoreRow, date: NaiveDate) -> bool {
    match chore.schedule_type {
        ScheduleType::Daily => true,
        ScheduleType::Weekly => chore
            .weekday
            .is_some_and(|weekday| i64::from(date.weekday().num_days_from_monday()) == weekday),
        ScheduleType::EveryNDays => match (chore.every_n_days, chore.start_date) {
            (Some(n), Some(start)) if n > 0 => {
                let elapsed = (date - start).num_days();
                elapsed >= 0 && elapsed % n == 0
            }
            _ => false,
        },
        ScheduleType::OneTime => false,
    }
}

/// Due and distribution instants of a recurring chore's instance on `date`.
pub fn recurring_times(
    chore: &ChoreRow,
    date: NaiveDate,
    offset: FixedOffset,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        end_of_day(date, offset),
        at_local(date, chore.distribution_time, offset),
    )
}

/// Due and distribution instants of a one-time chore created at `now`.
///
/// Without a due date the instance carries the `no_due_date` sentinel and is
/// distributable right away.
pub fn one_time_times(
    chore: &ChoreRow,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> (DateTime<Utc>, DateTime<Utc>) {
    match chore.due_date {
        Some(date) => (
            end_of_day(date, offset),
            at_local(date, chore.distribution_time, offset),
        ),
        None => (no_due_date(), now),
    }
}

/// Column values of a chore's next instance.
///
/// Pool chores (or chores whose assignee went missing) start in the pool;
/// assigned chores start with their fixed assignee.
pub fn instance_for(
    chore: &ChoreRow,
    due_at: DateTime<Utc>,
    distribution_at: DateTime<Utc>,
) -> NewInstance {
    let (status, assigned_to, reason) = match (chore.is_pool, chore.assigned_to) {
        (false, Some(user_id)) => (InstanceStatus::Assigned, Some(user_id), Some("fixed".to_owned())),
        _ => (InstanceStatus::Pool, None, None),
    };

    NewInstance {
        chore_id: chore.id,
        status,
        assigned_to,
        assignment_reason: reason,
        points_value: chore.points,
        due_at,
        distribution_at,
        spawned_from: None,
    }
}

// ---------------------------------------------------------------------------
// Due-date classification
// ---------------------------------------------------------------------------

/// Where an open instance stands relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueState {
    Overdue,
    DueToday,
    Upcoming,
    NoDueDate,
}

pub fn classify(due_at: DateTime<Utc>, now: DateTime<Utc>, offset: FixedOffset) -> DueState {
    if is_no_due_date(due_at) {
        DueState::NoDueDate
    } else if due_at < now {
        DueState::Overdue
    } else if due_at <= end_of_day(local_date(now, offset), offset) {
        DueState::DueToday
    } else {
        DueState::Upcoming
    }
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn chore(schedule_type: ScheduleType) -> ChoreRow {
        ChoreRow {
            id: Uuid::new_v4(),
            name: "Dishes".into(),
            description: String::new(),
            points: 100,
            is_pool: true,
            assigned_to: None,
            is_undesirable: false,
            is_difficult: false,
            schedule_type,
            weekday: None,
            every_n_days: None,
            start_date: None,
            due_date: None,
            distribution_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn weekly_chore_matches_only_its_weekday() {
        let mut c = chore(ScheduleType::Weekly);
        c.weekday = Some(0); // Monday

        assert!(is_scheduled_on(&c, date(2024, 3, 4))); // Monday
        assert!(!is_scheduled_on(&c, date(2024, 3, 5)));
    }

    #[test]
    fn every_n_days_counts_from_start_date() {
        let mut c = chore(ScheduleType::EveryNDays);
        c.every_n_days = Some(3);
        c.start_date = Some(date(2024, 3, 1));

        assert!(is_scheduled_on(&c, date(2024, 3, 1)));
        assert!(!is_scheduled_on(&c, date(2024, 3, 2)));
        assert!(is_scheduled_on(&c, date(2024, 3, 4)));
        assert!(!is_scheduled_on(&c, date(2024, 2, 27)), "before start date");
    }

    #[test]
    fn one_time_chores_are_never_scheduled() {
        assert!(!is_scheduled_on(&chore(ScheduleType::OneTime), date(2024, 3, 4)));
    }

    #[test]
    fn one_time_without_due_date_gets_sentinel() {
        let c = chore(ScheduleType::OneTime);
        let now = Utc::now();
        let (due, dist) = one_time_times(&c, now, utc());
        assert_eq!(due, no_due_date());
        assert_eq!(dist, now);
        assert_eq!(classify(due, now, utc()), DueState::NoDueDate);
    }

    #[test]
    fn day_bounds_follow_the_offset() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let end = end_of_day(date(2024, 3, 4), plus_two);
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 4, 21, 59, 59).unwrap());

        let late_evening_utc = Utc.with_ymd_and_hms(2024, 3, 4, 23, 30, 0).unwrap();
        assert_eq!(local_date(late_evening_utc, plus_two), date(2024, 3, 5));
    }

    #[test]
    fn classification_of_due_times() {
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();
        let today_end = end_of_day(date(2024, 3, 4), utc());

        assert_eq!(classify(now - Duration::minutes(1), now, utc()), DueState::Overdue);
        assert_eq!(classify(today_end, now, utc()), DueState::DueToday);
        assert_eq!(classify(today_end + Duration::seconds(1), now, utc()), DueState::Upcoming);
    }

    #[test]
    fn assigned_chore_instance_starts_assigned() {
        let mut c = chore(ScheduleType::Daily);
        let user = Uuid::new_v4();
        c.is_pool = false;
        c.assigned_to = Some(user);

        let (due, dist) = recurring_times(&c, date(2024, 3, 4), utc());
        let new = instance_for(&c, due, dist);
        assert_eq!(new.status, InstanceStatus::Assigned);
        assert_eq!(new.assigned_to, Some(user));
        assert_eq!(dist, Utc.with_ymd_and_hms(2024, 3, 4, 17, 0, 0).unwrap());
    }
}
