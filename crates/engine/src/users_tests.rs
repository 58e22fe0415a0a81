//! Accounts, passwords and sessions against an in-memory database.

use chrono::Duration;

use db::models::UserFlags;

use crate::test_support::{at, setup};
use crate::users::UserInput;
use crate::{EngineError, UserService};

fn staff_input(username: &str, password: &str) -> UserInput {
    UserInput {
        username: username.into(),
        display_name: String::new(),
        password: Some(password.into()),
        is_staff: true,
        can_be_assigned: false,
        eligible_for_points: false,
    }
}

fn flags(display_name: &str) -> UserFlags {
    UserFlags {
        display_name: display_name.into(),
        is_staff: true,
        is_active: true,
        can_be_assigned: false,
        eligible_for_points: false,
    }
}

#[tokio::test]
async fn password_is_stored_exactly_as_typed() {
    let (pool, _) = setup().await;
    let users = UserService::new(pool);

    users.create_user(&staff_input("mum", "  correct horse ")).await.unwrap();

    assert!(users.authenticate("mum", "  correct horse ").await.is_ok());
    assert!(matches!(
        users.authenticate("mum", "correct horse").await,
        Err(EngineError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn staff_account_needs_a_non_blank_password() {
    let (pool, _) = setup().await;
    let users = UserService::new(pool);

    let err = users.create_user(&staff_input("mum", "   ")).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn set_password_replaces_the_old_one() {
    let (pool, _) = setup().await;
    let users = UserService::new(pool);
    let mum = users.create_user(&staff_input("mum", "correct horse")).await.unwrap();

    users.set_password(mum.id, "battery staple").await.unwrap();

    assert!(users.authenticate("mum", "battery staple").await.is_ok());
    assert!(users.authenticate("mum", "correct horse").await.is_err());
}

#[tokio::test]
async fn rejected_update_changes_nothing() {
    let (pool, _) = setup().await;
    let users = UserService::new(pool);
    let mum = users.create_user(&staff_input("mum", "correct horse")).await.unwrap();

    let err = users
        .update_user(mum.id, &flags("  "), Some("battery staple"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(users.authenticate("mum", "correct horse").await.is_ok());

    let err = users.update_user(mum.id, &flags("Mum"), Some("short")).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(users.get_user(mum.id).await.unwrap().display_name, "mum");
}

#[tokio::test]
async fn update_sets_flags_and_password_together() {
    let (pool, _) = setup().await;
    let users = UserService::new(pool);
    let mum = users.create_user(&staff_input("mum", "correct horse")).await.unwrap();

    let updated = users
        .update_user(mum.id, &flags("Mum"), Some("battery staple"))
        .await
        .unwrap();

    assert_eq!(updated.display_name, "Mum");
    assert!(users.authenticate("mum", "battery staple").await.is_ok());
}

#[tokio::test]
async fn purge_drops_only_expired_sessions() {
    let (pool, _) = setup().await;
    let users = UserService::new(pool);
    users.create_user(&staff_input("mum", "correct horse")).await.unwrap();

    let start = at(2024, 3, 4, 9, 0);
    let (_, old) = users.login("mum", "correct horse", Duration::hours(1), start).await.unwrap();
    let (_, fresh) = users.login("mum", "correct horse", Duration::days(7), start).await.unwrap();

    let later = start + Duration::hours(2);
    assert_eq!(users.purge_sessions(later).await.unwrap(), 1);
    assert!(users.resolve_session(&old.token, start).await.unwrap().is_none());
    assert!(users.resolve_session(&fresh.token, later).await.unwrap().is_some());
}
