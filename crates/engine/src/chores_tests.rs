//! Chore editing and eligibility against an in-memory database.

use chrono::NaiveDate;
use uuid::Uuid;

use db::repository::instances;

use crate::test_support::{at, chore, daily, instance_on, setup, user};
use crate::{ChoreService, EngineError};

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

#[tokio::test]
async fn update_keeps_existing_instances_at_their_old_value() {
    let (pool, config) = setup().await;
    let service = ChoreService::new(pool.clone(), config.clone());
    let ada = user(&pool, "ada").await;
    let bob = user(&pool, "bob").await;

    let dishes = chore(&pool, &config, daily("Dishes")).await;
    let open = instance_on(&pool, &dishes, march(4)).await;

    let mut edited = daily("Dishes and pans");
    edited.points = 300;
    edited.is_pool = false;
    edited.assigned_to = Some(ada.id);
    let updated = service.update_chore(dishes.id, &edited, &[bob.id]).await.unwrap();

    assert_eq!(updated.name, "Dishes and pans");
    assert_eq!(updated.points, 300);
    assert_eq!(updated.assigned_to, Some(ada.id));
    assert_eq!(service.eligibility(dishes.id).await.unwrap(), vec![bob.id]);

    let row = instances::get_instance(&pool, open.id).await.unwrap();
    assert_eq!(row.points_value, 100);
    assert_eq!(row.assigned_to, None);
}

#[tokio::test]
async fn invalid_update_leaves_the_chore_alone() {
    let (pool, config) = setup().await;
    let service = ChoreService::new(pool.clone(), config.clone());
    let dishes = chore(&pool, &config, daily("Dishes")).await;

    let mut blank = daily("   ");
    blank.points = 500;
    let err = service.update_chore(dishes.id, &blank, &[]).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let mut ghost = daily("Dishes");
    ghost.is_pool = false;
    ghost.assigned_to = Some(Uuid::new_v4());
    let err = service.update_chore(dishes.id, &ghost, &[]).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound("assignee")));

    let stored = service.get_chore(dishes.id).await.unwrap();
    assert_eq!(stored.name, "Dishes");
    assert_eq!(stored.points, 100);
    assert!(stored.is_pool);

    let err = service.update_chore(Uuid::new_v4(), &daily("Mop"), &[]).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound("chore")));
}

#[tokio::test]
async fn unknown_eligible_user_creates_nothing() {
    let (pool, config) = setup().await;
    let service = ChoreService::new(pool.clone(), config.clone());
    let ada = user(&pool, "ada").await;

    let err = service
        .create_chore_with_eligibility(&daily("Bins"), &[ada.id, Uuid::new_v4()], at(2024, 3, 4, 9, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound("user")));
    assert!(service.list_chores(true).await.unwrap().is_empty());

    let (bins, _) = service
        .create_chore_with_eligibility(&daily("Bins"), &[ada.id], at(2024, 3, 4, 9, 0))
        .await
        .unwrap();
    assert_eq!(service.eligibility(bins.id).await.unwrap(), vec![ada.id]);
}

#[tokio::test]
async fn deactivated_chore_can_be_reactivated() {
    let (pool, config) = setup().await;
    let service = ChoreService::new(pool.clone(), config.clone());
    let dishes = chore(&pool, &config, daily("Dishes")).await;

    service.set_active(dishes.id, false).await.unwrap();
    assert!(service.list_chores(false).await.unwrap().is_empty());

    service.set_active(dishes.id, true).await.unwrap();
    assert!(service.get_chore(dishes.id).await.unwrap().is_active);
    assert!(matches!(
        service.set_active(Uuid::new_v4(), true).await,
        Err(EngineError::NotFound("chore"))
    ));
}
