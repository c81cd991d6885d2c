use crate::error::{method_not_allowed, ApiError};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domain::{RawIdentifier, RawTodoFields, TodoOrder};
use serde::{Deserialize, Serialize};

/// GET /todos のクエリ
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// newest（既定）または oldest
    order: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    /// サービスの簡易ステータス
    status: &'static str,
}

/// ヘルスチェック用ハンドラ
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthBody { status: "ok" }))
}

/// 一覧（既定は新しい順）
pub async fn list_todos(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let order = match params.order.as_deref() {
        Some(raw) => raw.parse::<TodoOrder>().map_err(ApiError::BadRequest)?,
        None => TodoOrder::default(),
    };
    let todos = state
        .queries
        .list_todos(order)
        .await
        .map_err(ApiError::for_operation("fetch"))?;
    Ok((StatusCode::OK, Json(todos)).into_response())
}

pub async fn create_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let raw: RawTodoFields = parse_body(&body)?;
    let todo = state
        .commands
        .create_todo(&raw)
        .await
        .map_err(ApiError::for_operation("create"))?;
    Ok((StatusCode::CREATED, Json(todo)).into_response())
}

/// 単一 Todo 取得
pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let todo = state
        .queries
        .get_todo(&RawIdentifier::new(id))
        .await
        .map_err(ApiError::for_operation("fetch"))?;
    Ok((StatusCode::OK, Json(todo)).into_response())
}

/// 部分更新（指定されたフィールドのみ変更）
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let raw: RawTodoFields = parse_body(&body)?;
    let todo = state
        .commands
        .update_todo(&RawIdentifier::new(id), &raw)
        .await
        .map_err(ApiError::for_operation("update"))?;
    Ok((StatusCode::OK, Json(todo)).into_response())
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .commands
        .delete_todo(&RawIdentifier::new(id))
        .await
        .map_err(ApiError::for_operation("delete"))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn collection_not_allowed(method: Method) -> Response {
    method_not_allowed(&method, "GET, POST")
}

pub async fn item_not_allowed(method: Method) -> Response {
    method_not_allowed(&method, "GET, PUT, DELETE")
}

/// 空ボディは空オブジェクトとして扱う
fn parse_body(body: &Bytes) -> Result<RawTodoFields, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RawTodoFields::default());
    }
    Ok(serde_json::from_slice(body)?)
}
