use std::net::SocketAddr;
use std::sync::Arc;

use client::{ApiClient, ClientError, QueryKey, QueryState, TaskBoard};
use common::{CreateCategoryPayload, CreateTaskPayload, UpdateTaskPayload};
use server::routes::create_router;
use server::storage::MemStorage;

/// Serves a fresh volatile backend on an ephemeral port.
async fn spawn_server() -> SocketAddr {
    let app = create_router(Arc::new(MemStorage::new()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn board() -> TaskBoard {
    let addr = spawn_server().await;
    TaskBoard::new(ApiClient::new(format!("http://{addr}")))
}

#[tokio::test]
async fn test_add_then_read_refetches_day() {
    let board = board().await;

    let empty = board.tasks_for_date("2024-01-15").await;
    assert!(empty.data().unwrap().incomplete.is_empty());

    let added = board
        .add_task("  Write spec ", "2024-01-15")
        .await
        .unwrap()
        .expect("non-blank input creates a task");
    assert_eq!(added.text, "Write spec");
    assert!(board.cache().is_stale(&QueryKey::tasks_for_date("2024-01-15")));

    let day = board.tasks_for_date("2024-01-15").await;
    let day = day.data().unwrap();
    assert_eq!(day.incomplete, vec![added]);
    assert!(day.completed.is_empty());
}

#[tokio::test]
async fn test_toggle_moves_task_to_completed() {
    let board = board().await;
    let task = board.add_task("Toggle", "2024-01-15").await.unwrap().unwrap();
    board.tasks_for_date("2024-01-15").await;

    let toggled = board.toggle_task(&task).await.unwrap().unwrap();
    assert!(toggled.completed);

    let day = board.tasks_for_date("2024-01-15").await;
    let day = day.data().unwrap();
    assert!(day.incomplete.is_empty());
    assert_eq!(day.completed.len(), 1);
    assert_eq!(day.completed[0].text, "Toggle");
}

#[tokio::test]
async fn test_delete_and_missing_ids() {
    let board = board().await;
    let task = board.add_task("Gone soon", "2024-01-15").await.unwrap().unwrap();

    assert!(board.delete_task(&task.id).await.unwrap());
    assert!(!board.delete_task(&task.id).await.unwrap());
    assert_eq!(
        board
            .edit_task(&task.id, &UpdateTaskPayload::completed(true))
            .await
            .unwrap(),
        None
    );

    let day = board.tasks_for_date("2024-01-15").await;
    assert!(day.data().unwrap().incomplete.is_empty());
}

#[tokio::test]
async fn test_sidebar_follows_mutations() {
    let board = board().await;
    board.add_task("One", "2024-01-15").await.unwrap();
    board.add_task("Two", "2024-01-16").await.unwrap();

    let stats = board.sidebar("2024-01-15").await;
    let stats = stats.data().unwrap();
    assert_eq!(stats.today.pending, 1);
    assert_eq!(stats.dates_with_tasks.len(), 2);

    board.add_task("Three", "2024-01-17").await.unwrap();
    let stats = board.sidebar("2024-01-15").await;
    assert_eq!(stats.data().unwrap().dates_with_tasks.len(), 3);
}

#[tokio::test]
async fn test_category_deletion_refreshes_tasks() {
    let board = board().await;
    // A bare ApiClient on its own server round-trips categories too.
    let api = ApiClient::new(format!("http://{}", spawn_server().await));
    let created = api
        .create_category(&CreateCategoryPayload {
            name: "Solo".to_string(),
            color: "#123456".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(api.list_categories().await.unwrap(), vec![created]);

    let work = board
        .add_category(&CreateCategoryPayload {
            name: "Work".to_string(),
            color: "#ff0000".to_string(),
        })
        .await
        .unwrap();
    let categories = board.categories().await;
    assert_eq!(categories.data().unwrap().len(), 1);

    let task = board.add_task("Tagged", "2024-01-15").await.unwrap().unwrap();
    let patch = UpdateTaskPayload {
        category_id: Some(Some(work.id.clone())),
        ..UpdateTaskPayload::default()
    };
    board.edit_task(&task.id, &patch).await.unwrap();
    let day = board.tasks_for_date("2024-01-15").await;
    assert_eq!(
        day.data().unwrap().incomplete[0].category_id.as_deref(),
        Some(work.id.as_str())
    );

    assert!(board.delete_category(&work.id).await.unwrap());

    assert!(board.categories().await.data().unwrap().is_empty());
    let day = board.tasks_for_date("2024-01-15").await;
    assert_eq!(day.data().unwrap().incomplete[0].category_id, None);
}

#[tokio::test]
async fn test_validation_errors_surface_as_api_errors() {
    let addr = spawn_server().await;
    let api = ApiClient::new(format!("http://{addr}"));

    let err = api
        .create_task(&CreateTaskPayload {
            text: "Task".to_string(),
            date: "someday".to_string(),
            ..CreateTaskPayload::default()
        })
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("YYYY-MM-DD"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_summary_and_dates_endpoints() {
    let addr = spawn_server().await;
    let api = ApiClient::new(format!("http://{addr}"));
    for (text, date) in [("a", "2024-01-15"), ("b", "2024-01-15"), ("c", "2024-01-16")] {
        api.create_task(&CreateTaskPayload {
            text: text.to_string(),
            date: date.to_string(),
            ..CreateTaskPayload::default()
        })
        .await
        .unwrap();
    }

    let summary = api.day_summary("2024-01-15").await.unwrap();
    assert_eq!((summary.total, summary.completed, summary.pending), (2, 0, 2));
    assert_eq!(
        api.task_dates().await.unwrap(),
        vec!["2024-01-15".to_string(), "2024-01-16".to_string()]
    );
    assert_eq!(api.get_task("missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_unreachable_server_is_error_state() {
    let board = TaskBoard::new(ApiClient::new("http://127.0.0.1:9"));

    let state = board.tasks_for_date("2024-01-15").await;
    assert!(matches!(state, QueryState::Error(_)));
    assert!(board.add_task("Task", "2024-01-15").await.is_err());
    assert!(!board.is_adding());
}
