//! HTTP API（axum）
//!
//! JSON の `/todos` とフォーム送信用の `/actions/todos` を提供します。
//! 入力の検証と永続化はすべて command-handler / query-handler に委譲します。

pub mod actions;
pub mod error;
pub mod handlers;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use command_handler::TodoCommandHandler;
use infrastructure::{
    DynamoDbClient, DynamoTodoRepository, InMemoryTodoRepository, TodoListView, TodoRepository,
};
use query_handler::TodoQueryHandler;
use shared::{Config, StoreBackend};
use std::sync::Arc;
use tracing::info;

/// ルータを構築して返します（InMemory ストア）
pub fn app() -> Router {
    app_with_state(AppState::default())
}

/// 外部から状態を注入できる版
pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/todos",
            get(handlers::list_todos)
                .post(handlers::create_todo)
                .fallback(handlers::collection_not_allowed),
        )
        .route(
            "/todos/:id",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo)
                .fallback(handlers::item_not_allowed),
        )
        .route(
            "/actions/todos",
            post(actions::create_todo_action).fallback(actions::action_not_allowed),
        )
        .route(
            "/actions/todos/:id/toggle",
            post(actions::toggle_todo_action).fallback(actions::action_not_allowed),
        )
        .route(
            "/actions/todos/:id/delete",
            post(actions::delete_todo_action).fallback(actions::action_not_allowed),
        )
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// アプリケーションの共有状態
#[derive(Clone)]
pub struct AppState {
    commands: TodoCommandHandler,
    queries: TodoQueryHandler,
}

impl AppState {
    /// 更新系と参照系で同じストアを共有します
    pub fn new(repo: Arc<dyn TodoRepository>) -> Self {
        Self {
            commands: TodoCommandHandler::new(repo.clone(), Arc::new(TodoListView::new())),
            queries: TodoQueryHandler::new(repo),
        }
    }

    pub async fn from_config(config: &Config) -> Self {
        match config.store_backend {
            StoreBackend::Memory => {
                info!("using in-memory todo store");
                Self::default()
            }
            StoreBackend::DynamoDb => {
                info!(table = %config.dynamodb_table, "using DynamoDB todo store");
                let client = DynamoDbClient::shared(config).await.clone();
                Self::new(Arc::new(DynamoTodoRepository::new(client)))
            }
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryTodoRepository::new()))
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    info!(%method, %path, status = response.status().as_u16(), "request handled");
    response
}
