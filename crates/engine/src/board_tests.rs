//! Board, user board and leaderboard read models.

use chrono::NaiveDate;

use db::models::ScheduleType;
use db::repository::users;

use crate::schedule::DueState;
use crate::test_support::{at, chore, daily, instance_on, setup, user};
use crate::{BoardService, ChoreService, CompletionService, EngineError};

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

#[tokio::test]
async fn board_shows_open_instances_due_today_overdue_or_undated() {
    let (pool, config) = setup().await;
    let board = BoardService::new(pool.clone(), config.clone());
    let ada = user(&pool, "ada").await;

    let dishes = chore(&pool, &config, daily("Dishes")).await;
    let overdue = instance_on(&pool, &dishes, march(3)).await;
    let today = instance_on(&pool, &dishes, march(4)).await;
    instance_on(&pool, &dishes, march(5)).await; // tomorrow: hidden

    let mut fence = daily("Fix fence");
    fence.schedule_type = ScheduleType::OneTime;
    fence.is_pool = false;
    fence.assigned_to = Some(ada.id);
    ChoreService::new(pool.clone(), config.clone())
        .create_chore(&fence, at(2024, 3, 1, 9, 0))
        .await
        .unwrap();

    let now = at(2024, 3, 4, 12, 0);
    let view = board.board(now).await.unwrap();

    let pool_ids: Vec<_> = view.pool.iter().map(|i| i.instance.id).collect();
    assert_eq!(pool_ids, vec![overdue.id, today.id]);
    assert_eq!(view.pool[0].due_state, DueState::Overdue);
    assert_eq!(view.pool_overdue, 1);

    assert_eq!(view.users.len(), 1);
    assert_eq!(view.users[0].username, "ada");
    assert_eq!(view.users[0].items.len(), 1);
    assert_eq!(view.users[0].items[0].due_state, DueState::NoDueDate);
    assert_eq!(view.users[0].overdue_count, 0);

    assert_eq!(view.overdue_count, 1);
    assert_eq!(view.today, march(4));
}

#[tokio::test]
async fn completed_and_skipped_instances_leave_the_board() {
    let (pool, config) = setup().await;
    let board = BoardService::new(pool.clone(), config.clone());
    let completions = CompletionService::new(pool.clone(), config.clone());
    let ada = user(&pool, "ada").await;
    let bob = user(&pool, "bob").await;

    let dishes = chore(&pool, &config, daily("Dishes")).await;
    let done = instance_on(&pool, &dishes, march(4)).await;
    let skipped = instance_on(&pool, &chore(&pool, &config, daily("Trash")).await, march(4)).await;

    completions
        .complete(done.id, ada.id, &[ada.id, bob.id], at(2024, 3, 4, 10, 0))
        .await
        .unwrap();
    completions.skip(skipped.id, None).await.unwrap();

    let view = board.board(at(2024, 3, 4, 12, 0)).await.unwrap();
    assert!(view.pool.is_empty());
    assert!(view.users.iter().all(|c| c.items.is_empty()));

    assert_eq!(view.completed_today.len(), 1);
    let shown = &view.completed_today[0];
    assert_eq!(shown.completion.chore_name, "Dishes");
    assert_eq!(shown.completion.completed_by_display_name, "Ada");
    assert_eq!(
        shown.helpers.iter().map(|h| (h.display_name.as_str(), h.points_awarded)).collect::<Vec<_>>(),
        vec![("Ada", 50), ("Bob", 50)]
    );

    // Yesterday's completions are not "today".
    let tomorrow = board.board(at(2024, 3, 5, 8, 0)).await.unwrap();
    assert!(tomorrow.completed_today.is_empty());
}

#[tokio::test]
async fn user_board_only_lists_that_users_assignments() {
    let (pool, config) = setup().await;
    let board = BoardService::new(pool.clone(), config.clone());
    let completions = CompletionService::new(pool.clone(), config.clone());
    let ada = user(&pool, "ada").await;
    let bob = user(&pool, "bob").await;

    let dishes = chore(&pool, &config, daily("Dishes")).await;
    let mine = instance_on(&pool, &dishes, march(3)).await;
    let theirs = instance_on(&pool, &chore(&pool, &config, daily("Trash")).await, march(4)).await;
    instance_on(&pool, &chore(&pool, &config, daily("Mop")).await, march(4)).await;

    completions.reassign(mine.id, ada.id, None, at(2024, 3, 3, 9, 0)).await.unwrap();
    completions.reassign(theirs.id, bob.id, None, at(2024, 3, 4, 9, 0)).await.unwrap();

    let view = board.user_board("ada", at(2024, 3, 4, 12, 0)).await.unwrap();
    assert_eq!(view.user.id, ada.id);
    assert_eq!(view.items.iter().map(|i| i.instance.id).collect::<Vec<_>>(), vec![mine.id]);
    assert_eq!(view.overdue_count, 1);

    let pool_view = board.pool_board(at(2024, 3, 4, 12, 0)).await.unwrap();
    assert_eq!(pool_view.items.len(), 1);
    assert_eq!(pool_view.items[0].instance.chore_name, "Mop");

    assert!(matches!(
        board.user_board("nobody", at(2024, 3, 4, 12, 0)).await,
        Err(EngineError::NotFound("user"))
    ));
}

#[tokio::test]
async fn leaderboard_ranks_by_weekly_then_all_time_points() {
    let (pool, config) = setup().await;
    let board = BoardService::new(pool.clone(), config.clone());
    let ada = user(&pool, "ada").await;
    let bob = user(&pool, "bob").await;
    let cy = user(&pool, "cy").await;

    users::add_points(&pool, ada.id, 300).await.unwrap();
    users::add_points(&pool, bob.id, 500).await.unwrap();
    users::add_points(&pool, cy.id, 900).await.unwrap();
    users::reset_weekly_points(&pool, cy.id).await.unwrap();
    users::add_points(&pool, cy.id, 300).await.unwrap();

    let ranks = board.leaderboard().await.unwrap();
    let order: Vec<_> = ranks.iter().map(|e| (e.rank, e.username.as_str())).collect();
    assert_eq!(order, vec![(1, "bob"), (2, "cy"), (3, "ada")]);
}

#[tokio::test]
async fn dashboard_counts_pool_overdue_and_completions() {
    let (pool, config) = setup().await;
    let board = BoardService::new(pool.clone(), config.clone());
    let completions = CompletionService::new(pool.clone(), config.clone());
    let ada = user(&pool, "ada").await;

    let dishes = chore(&pool, &config, daily("Dishes")).await;
    instance_on(&pool, &dishes, march(3)).await;
    let today = instance_on(&pool, &dishes, march(4)).await;
    completions.complete(today.id, ada.id, &[], at(2024, 3, 4, 10, 0)).await.unwrap();

    let stats = board.dashboard(at(2024, 3, 4, 12, 0)).await.unwrap();
    assert_eq!(stats.active_chores, 1);
    assert_eq!(stats.pool_size, 1);
    assert_eq!(stats.overdue_count, 1);
    assert_eq!(stats.completions_today, 1);

    let activity = board.recent_activity(10).await.unwrap();
    assert_eq!(activity.len(), 1);
}
