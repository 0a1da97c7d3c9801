use crate::error::FetchError;
use crate::harvester::test_helpers::{SourceCall, create_test_harvester, post, posts};
use crate::types::{SortOrder, TaskKind, TaskStatus, TimeWindow};

fn sorts_and_windows(calls: &[SourceCall]) -> Vec<(SortOrder, TimeWindow)> {
    calls
        .iter()
        .map(|call| match call {
            SourceCall::CommunityFeed { sort, window, .. } => (*sort, *window),
            other => panic!("unexpected call {other:?}"),
        })
        .collect()
}

#[tokio::test]
async fn test_productive_new_page_never_triggers_fallbacks() {
    let h = create_test_harvester().await;
    h.source.push_community(Ok(posts("n", 5)));

    let task = h
        .harvester
        .create_task(TaskKind::Community, "rust", 5)
        .await
        .unwrap();
    h.harvester.run_task(task.id).await;

    let task = h.harvester.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.current_count, 5);
    assert_eq!(
        sorts_and_windows(&h.source.calls()),
        vec![(SortOrder::New, TimeWindow::All)]
    );
}

#[tokio::test]
async fn test_cascade_walks_new_hot_then_top_across_windows() {
    let h = create_test_harvester().await;
    // Every stage reaches the platform but returns nothing new
    for _ in 0..8 {
        h.source.push_community(Ok(vec![]));
    }

    let task = h
        .harvester
        .create_task(TaskKind::Community, "rust", 10)
        .await
        .unwrap();
    h.harvester.run_task(task.id).await;

    let task = h.harvester.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(
        task.status,
        TaskStatus::Completed,
        "an exhausted cascade completes under target"
    );
    assert_eq!(task.current_count, 0);

    assert_eq!(
        sorts_and_windows(&h.source.calls()),
        vec![
            (SortOrder::New, TimeWindow::All),
            (SortOrder::Hot, TimeWindow::All),
            (SortOrder::Top, TimeWindow::Hour),
            (SortOrder::Top, TimeWindow::Day),
            (SortOrder::Top, TimeWindow::Week),
            (SortOrder::Top, TimeWindow::Month),
            (SortOrder::Top, TimeWindow::Year),
            (SortOrder::Top, TimeWindow::All),
        ]
    );
}

#[tokio::test]
async fn test_duplicate_new_page_falls_back_to_hot() {
    let h = create_test_harvester().await;
    // First pass: `new` yields three fresh posts
    h.source.push_community(Ok(posts("n", 3)));
    // Second pass: the same `new` page (all duplicates), then `hot` delivers
    h.source.push_community(Ok(posts("n", 3)));
    h.source.push_community(Ok(posts("h", 7)));

    let task = h
        .harvester
        .create_task(TaskKind::Community, "rust", 10)
        .await
        .unwrap();
    h.harvester.run_task(task.id).await;

    let task = h.harvester.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.current_count, 10);
    assert_eq!(
        sorts_and_windows(&h.source.calls()),
        vec![
            (SortOrder::New, TimeWindow::All),
            (SortOrder::New, TimeWindow::All),
            (SortOrder::Hot, TimeWindow::All),
        ]
    );
}

#[tokio::test]
async fn test_hot_page_is_persisted_newest_first() {
    let h = create_test_harvester().await;
    h.source.push_community(Ok(vec![]));
    // Hot rank order puts the older post first; recency must win
    h.source
        .push_community(Ok(vec![post("older", 1_000), post("newer", 2_000)]));

    let task = h
        .harvester
        .create_task(TaskKind::Community, "rust", 1)
        .await
        .unwrap();
    h.harvester.run_task(task.id).await;

    let items = h.harvester.db.list_items("posts_rust").await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].post_id, "newer",
        "a truncated hot page keeps the freshest post"
    );
}

#[tokio::test]
async fn test_isolated_stage_error_does_not_spend_the_budget() {
    let h = create_test_harvester().await;
    // `new` fails but `hot` succeeds: the pass still counts as reachable
    h.source
        .push_community(Err(FetchError::Network("connection reset".to_string())));
    h.source.push_community(Ok(posts("h", 2)));

    let task = h
        .harvester
        .create_task(TaskKind::Community, "rust", 2)
        .await
        .unwrap();
    h.harvester.run_task(task.id).await;

    let task = h.harvester.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.current_count, 2);
}

#[tokio::test]
async fn test_three_fully_failed_passes_fail_the_task() {
    let h = create_test_harvester().await;
    // 3 passes x 8 stages, every fetch fails
    for _ in 0..24 {
        h.source
            .push_community(Err(FetchError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }));
    }

    let task = h
        .harvester
        .create_task(TaskKind::Community, "rust", 5)
        .await
        .unwrap();
    h.harvester.run_task(task.id).await;

    let task = h.harvester.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.error_message.is_some());
    assert_eq!(h.source.calls().len(), 24, "budget caps the passes at 3");
}

#[tokio::test]
async fn test_budget_resets_after_a_reachable_pass() {
    let h = create_test_harvester().await;
    // One fully failed pass, then a pass where `new` delivers the target
    for _ in 0..8 {
        h.source
            .push_community(Err(FetchError::Network("timeout".to_string())));
    }
    h.source.push_community(Ok(posts("n", 2)));

    let task = h
        .harvester
        .create_task(TaskKind::Community, "rust", 2)
        .await
        .unwrap();
    h.harvester.run_task(task.id).await;

    let task = h.harvester.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.current_count, 2);
}
