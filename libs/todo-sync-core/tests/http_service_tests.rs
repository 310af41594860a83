//! HTTP todo service against an in-process axum server

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use todo_sync_core::{
    ApiConfig, HttpTodoService, NotificationCenter, RemoteTodo, RemoteTodoInput, Todo,
    TodoService, TodoStore,
};

type Db = Arc<Mutex<Vec<RemoteTodo>>>;

/// Id that makes the server fail with a plain-text 500
const EXPLODING_ID: i64 = 999;

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Todo not found" })),
    )
        .into_response()
}

async fn list(State(db): State<Db>) -> Json<Vec<RemoteTodo>> {
    Json(db.lock().clone())
}

async fn create(State(db): State<Db>, Json(input): Json<RemoteTodoInput>) -> Response {
    if input.title.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Title is required" })),
        )
            .into_response();
    }
    let mut todos = db.lock();
    let id = todos.iter().filter_map(|t| t.id).max().unwrap_or(0) + 1;
    let created = RemoteTodo {
        id: Some(id),
        title: Some(input.title),
        description: input.description,
        done: Some(input.done),
    };
    todos.push(created.clone());
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn get_one(State(db): State<Db>, Path(id): Path<i64>) -> Response {
    match db.lock().iter().find(|t| t.id == Some(id)) {
        Some(todo) => Json(todo.clone()).into_response(),
        None => not_found(),
    }
}

async fn update(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<RemoteTodoInput>,
) -> Response {
    if id == EXPLODING_ID {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    let mut todos = db.lock();
    let Some(todo) = todos.iter_mut().find(|t| t.id == Some(id)) else {
        return not_found();
    };
    todo.title = Some(input.title);
    todo.description = input.description;
    todo.done = Some(input.done);
    StatusCode::OK.into_response()
}

async fn delete(State(db): State<Db>, Path(id): Path<i64>) -> Response {
    let mut todos = db.lock();
    let before = todos.len();
    todos.retain(|t| t.id != Some(id));
    if todos.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn spawn_server(seed: Vec<RemoteTodo>) -> (HttpTodoService, Db) {
    let db: Db = Arc::new(Mutex::new(seed));
    let app = Router::new()
        .route("/api/v1/todos", get(list).post(create))
        .route("/api/v1/todos/:id", get(get_one).put(update).delete(delete))
        .with_state(db.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let service = HttpTodoService::new(&ApiConfig {
        base_url: format!("http://{addr}"),
        request_timeout_secs: 5,
    })
    .unwrap();
    (service, db)
}

fn remote(id: i64, title: &str, done: bool) -> RemoteTodo {
    RemoteTodo {
        id: Some(id),
        title: Some(title.to_string()),
        description: None,
        done: Some(done),
    }
}

fn input(title: &str, done: bool) -> RemoteTodoInput {
    RemoteTodoInput {
        title: title.to_string(),
        description: None,
        done,
    }
}

#[tokio::test]
async fn test_list_and_get() {
    let (service, _db) = spawn_server(vec![remote(1, "Buy milk", false)]).await;

    let todos = service.list_all().await.unwrap();
    assert_eq!(todos, vec![remote(1, "Buy milk", false)]);

    let one = service.get_by_id(1).await.unwrap();
    assert_eq!(one.title.as_deref(), Some("Buy milk"));
}

#[tokio::test]
async fn test_partial_remote_todo_is_tolerated() {
    let (service, db) = spawn_server(vec![]).await;
    db.lock().push(RemoteTodo {
        id: Some(7),
        ..RemoteTodo::default()
    });

    let todos = service.list_all().await.unwrap();
    let mapped = todo_sync_core::map_to_domain(todos[0].clone());
    assert_eq!(mapped.title(), "");
    assert!(!mapped.is_completed());
    assert_eq!(mapped.description(), None);
}

#[tokio::test]
async fn test_create_update_delete() {
    let (service, db) = spawn_server(vec![]).await;

    let created = service.create(input("Write tests", false)).await.unwrap();
    assert_eq!(created.id, Some(1));

    service.update(1, input("Write more tests", true)).await.unwrap();
    assert_eq!(db.lock()[0].done, Some(true));

    service.delete(1).await.unwrap();
    assert!(db.lock().is_empty());
}

#[tokio::test]
async fn test_error_statuses_carry_server_message() {
    let (service, _db) = spawn_server(vec![]).await;

    let err = service.create(input("  ", false)).await.unwrap_err();
    let transport = err.as_transport().unwrap();
    assert_eq!(transport.status, Some(400));
    assert_eq!(transport.server_message.as_deref(), Some("Title is required"));
    assert!(!transport.is_network_failure());

    let err = service.delete(42).await.unwrap_err();
    assert_eq!(err.as_transport().unwrap().status, Some(404));
}

#[tokio::test]
async fn test_non_json_error_body() {
    let (service, _db) = spawn_server(vec![]).await;

    let err = service
        .update(EXPLODING_ID, input("x", false))
        .await
        .unwrap_err();
    let transport = err.as_transport().unwrap();
    assert_eq!(transport.status, Some(500));
    assert_eq!(transport.server_message, None);
    assert_eq!(transport.best_message(), "Request failed with status code 500");
}

#[tokio::test]
async fn test_store_over_http() {
    let (service, db) = spawn_server(vec![
        remote(1, "Buy milk", false),
        remote(2, "Write report", true),
    ])
    .await;
    let store = TodoStore::new(Arc::new(service), NotificationCenter::new_default());

    store.refresh().await.unwrap();
    assert_eq!(store.stats().completed, 1);

    let milk = store.get(1).unwrap();
    store.toggle_todo_completion(&milk).await.unwrap();
    assert_eq!(db.lock()[0].done, Some(true));

    store
        .create_todo(Todo::create("Call mom", None))
        .await
        .unwrap();
    assert_eq!(store.todos().len(), 3);

    let ghost = Todo::new(Some(EXPLODING_ID), "Ghost", None, false);
    let before = store.todos();
    store.update_todo(ghost).await.unwrap_err();
    assert_eq!(store.todos(), before);

    let titles: Vec<_> = store
        .notifications()
        .notifications()
        .into_iter()
        .filter_map(|n| n.title)
        .collect();
    assert_eq!(titles, vec!["Success", "Success", "Server Error"]);
    store.notifications().shutdown();
}
