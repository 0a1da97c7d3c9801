use crate::error::FetchError;
use crate::harvester::test_helpers::{SourceCall, create_test_harvester, posts};
use crate::types::{SortOrder, TaskKind, TaskStatus, TimeWindow};

#[tokio::test]
async fn test_keyword_reaches_target_and_completes() {
    let h = create_test_harvester().await;
    h.source.push_search(Ok(posts("a", 10)));

    let task = h
        .harvester
        .create_task(TaskKind::Keyword, "rust", 5)
        .await
        .unwrap();
    h.harvester.run_task(task.id).await;

    let task = h.harvester.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.current_count, 5);
    assert!((task.progress - 100.0).abs() < 0.01);
    assert_eq!(h.harvester.db.count_items("posts_rust").await.unwrap(), 5);

    // Fetch size is bounded by what the task still needs
    assert_eq!(
        h.source.calls(),
        vec![SourceCall::Search {
            query: "rust".to_string(),
            sort: SortOrder::Relevance,
            limit: 5,
            window: TimeWindow::All,
        }]
    );
}

#[tokio::test]
async fn test_keyword_stops_when_page_is_all_duplicates() {
    let h = create_test_harvester().await;
    // The search endpoint has no cursor: the second call repeats the page
    h.source.push_search(Ok(posts("a", 3)));
    h.source.push_search(Ok(posts("a", 3)));

    let task = h
        .harvester
        .create_task(TaskKind::Keyword, "rust", 10)
        .await
        .unwrap();
    h.harvester.run_task(task.id).await;

    let task = h.harvester.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(
        task.status,
        TaskStatus::Completed,
        "an exhausted search completes under target"
    );
    assert_eq!(task.current_count, 3);
    assert_eq!(h.source.calls().len(), 2);
}

#[tokio::test]
async fn test_keyword_empty_first_page_completes_with_nothing() {
    let h = create_test_harvester().await;
    h.source.push_search(Ok(vec![]));

    let task = h
        .harvester
        .create_task(TaskKind::Keyword, "obscure", 10)
        .await
        .unwrap();
    h.harvester.run_task(task.id).await;

    let task = h.harvester.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.current_count, 0);
}

#[tokio::test]
async fn test_keyword_fails_after_three_consecutive_errors() {
    let h = create_test_harvester().await;
    for _ in 0..3 {
        h.source
            .push_search(Err(FetchError::Network("connection reset".to_string())));
    }

    let task = h
        .harvester
        .create_task(TaskKind::Keyword, "rust", 5)
        .await
        .unwrap();
    h.harvester.run_task(task.id).await;

    let task = h.harvester.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.error_message.is_some());
    assert_eq!(task.current_count, 0);
    assert_eq!(
        h.source.calls().len(),
        3,
        "no further fetches after the budget is spent"
    );
}

#[tokio::test]
async fn test_keyword_budget_resets_after_a_successful_fetch() {
    let h = create_test_harvester().await;
    h.source
        .push_search(Err(FetchError::Network("timeout".to_string())));
    h.source
        .push_search(Err(FetchError::Network("timeout".to_string())));
    h.source.push_search(Ok(posts("a", 2)));
    for _ in 0..3 {
        h.source
            .push_search(Err(FetchError::Network("timeout".to_string())));
    }

    let task = h
        .harvester
        .create_task(TaskKind::Keyword, "rust", 10)
        .await
        .unwrap();
    h.harvester.run_task(task.id).await;

    let task = h.harvester.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(
        task.status,
        TaskStatus::Failed,
        "the three errors after the success spend a fresh budget"
    );
    assert_eq!(task.current_count, 2, "items from the good page are kept");
    assert_eq!(h.source.calls().len(), 6);
}
