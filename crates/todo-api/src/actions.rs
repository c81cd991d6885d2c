//! フォーム送信用のアクション
//!
//! 成功時は一覧 (`/`) へ 303 でリダイレクトし、失敗時は JSON のエラーを返します。
//! フォームとして読めないボディ（Content-Type 不一致など）も 400 の JSON エラーです。
//!
//! 完了の切り替えフォームは、チェックボックスの前に同名の hidden 入力を置きます。
//! `<input type="hidden" name="complete" value="false">` に続けて
//! `<input type="checkbox" name="complete" value="true">`。
//! 同じキーは後の値が優先されるため、未チェックなら false が送られます。

use crate::error::{method_not_allowed, ApiError};
use crate::AppState;
use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::Method,
    response::{Redirect, Response},
    Form,
};
use domain::{RawIdentifier, RawTodoFields, RawToggle};
use serde_json::Value;
use std::collections::HashMap;

const LIST_PATH: &str = "/";

/// フォーム値（すべて文字列）から生入力を組み立てます
fn fields_from_form(mut form: HashMap<String, String>) -> RawTodoFields {
    let mut take = |key: &str| form.remove(key).map(Value::String);
    RawTodoFields {
        title: take("title"),
        complete: None,
        // 未選択のセレクトボックスは未指定扱い（既定の Medium）
        priority: take("priority").filter(|v| v != ""),
        due_date: take("dueDate"),
        tags: take("tags"),
        recurrence: take("recurrence"),
        attachment_url: take("attachmentUrl"),
    }
}

/// チェックボックスの値を真偽値に変換。解釈できない値は文字列のまま渡して検証で落とす
fn complete_from_form(raw: Option<&String>) -> Option<Value> {
    raw.map(|value| match value.as_str() {
        "true" | "on" => Value::Bool(true),
        "false" | "off" => Value::Bool(false),
        other => Value::String(other.to_string()),
    })
}

pub async fn create_todo_action(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Redirect, ApiError> {
    let Form(form) = form?;
    state
        .commands
        .create_todo(&fields_from_form(form))
        .await
        .map_err(ApiError::for_operation("create"))?;
    Ok(Redirect::to(LIST_PATH))
}

pub async fn toggle_todo_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Redirect, ApiError> {
    let Form(form) = form?;
    let raw = RawToggle {
        id: Some(Value::String(id)),
        complete: complete_from_form(form.get("complete")),
    };
    state
        .commands
        .toggle_complete(&raw)
        .await
        .map_err(ApiError::for_operation("update"))?;
    Ok(Redirect::to(LIST_PATH))
}

pub async fn delete_todo_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, ApiError> {
    state
        .commands
        .delete_todo(&RawIdentifier::new(id))
        .await
        .map_err(ApiError::for_operation("delete"))?;
    Ok(Redirect::to(LIST_PATH))
}

pub async fn action_not_allowed(method: Method) -> Response {
    method_not_allowed(&method, "POST")
}
