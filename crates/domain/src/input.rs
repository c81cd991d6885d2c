//! 型の付いていない入力（HTTP ボディ・フォーム・引数）と、検証済みレコードへの変換
//!
//! 各フィールドは「未指定」(`None`) と「null を明示」(`Some(Value::Null)`) を区別して保持します。

use crate::errors::TodoError;
use crate::todo::{FieldUpdate, NewTodo, TodoId, TodoPatch};
use crate::validation::{
    validate_complete, validate_due_date, validate_id, validate_optional_text, validate_priority,
    validate_tags, validate_title,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 作成・更新用の生入力
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTodoFields {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub complete: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub priority: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub tags: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub recurrence: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub attachment_url: Option<Value>,
}

/// 完了切り替え用の生入力
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawToggle {
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub complete: Option<Value>,
}

/// 識別子のみの生入力（取得・削除用）
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawIdentifier {
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
}

impl RawToggle {
    pub fn new(id: impl Into<Value>, complete: impl Into<Value>) -> Self {
        Self {
            id: Some(id.into()),
            complete: Some(complete.into()),
        }
    }
}

impl RawIdentifier {
    pub fn new(id: impl Into<Value>) -> Self {
        Self { id: Some(id.into()) }
    }
}

impl RawTodoFields {
    pub fn with_title(title: impl Into<Value>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// キーが存在すれば null でも `Some` にする
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// 検証済みの完了切り替え
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleTodo {
    pub id: TodoId,
    pub complete: bool,
}

pub fn parse_identifier(raw: &RawIdentifier) -> Result<TodoId, TodoError> {
    validate_id(raw.id.as_ref().unwrap_or(&Value::Null))
}

pub fn parse_toggle(raw: &RawToggle) -> Result<ToggleTodo, TodoError> {
    let id = validate_id(raw.id.as_ref().unwrap_or(&Value::Null))?;
    let complete = raw
        .complete
        .as_ref()
        .ok_or(TodoError::InvalidCompleteFlag)
        .and_then(validate_complete)?;
    Ok(ToggleTodo { id, complete })
}

/// 作成用レコードを組み立てます。`complete` は常に false です。
pub fn build_create(raw: &RawTodoFields) -> Result<NewTodo, TodoError> {
    let title = validate_title(raw.title.as_ref().unwrap_or(&Value::Null))?;
    let priority = validate_priority(raw.priority.as_ref())?;
    let due_date = match &raw.due_date {
        Some(v) => validate_due_date(v)?,
        None => None,
    };
    let tags = match &raw.tags {
        Some(v) => validate_tags(v)?,
        None => Vec::new(),
    };
    let recurrence = match &raw.recurrence {
        Some(v) => validate_optional_text(v, TodoError::InvalidRecurrence)?,
        None => None,
    };
    let attachment_url = match &raw.attachment_url {
        Some(v) => validate_optional_text(v, TodoError::InvalidAttachmentUrl)?,
        None => None,
    };

    Ok(NewTodo {
        title,
        complete: false,
        priority,
        due_date,
        tags,
        recurrence,
        attachment_url,
    })
}

/// 部分更新を組み立てます。指定されたフィールドだけが含まれます。
pub fn build_update(raw: &RawTodoFields) -> Result<TodoPatch, TodoError> {
    let title = raw.title.as_ref().map(validate_title).transpose()?;
    let complete = raw.complete.as_ref().map(validate_complete).transpose()?;
    let priority = match &raw.priority {
        None => None,
        Some(Value::Null) => {
            return Err(TodoError::InvalidPriority(
                "priority cannot be null".to_string(),
            ))
        }
        Some(v) => Some(validate_priority(Some(v))?),
    };
    let due_date = match &raw.due_date {
        None => FieldUpdate::Unchanged,
        Some(v) => validate_due_date(v)?.map_or(FieldUpdate::Clear, FieldUpdate::Set),
    };
    let tags = raw.tags.as_ref().map(validate_tags).transpose()?;
    let recurrence = optional_text_update(raw.recurrence.as_ref(), TodoError::InvalidRecurrence)?;
    let attachment_url =
        optional_text_update(raw.attachment_url.as_ref(), TodoError::InvalidAttachmentUrl)?;

    Ok(TodoPatch {
        title,
        complete,
        priority,
        due_date,
        tags,
        recurrence,
        attachment_url,
    })
}

fn optional_text_update(
    raw: Option<&Value>,
    on_error: fn(String) -> TodoError,
) -> Result<FieldUpdate<String>, TodoError> {
    Ok(match raw {
        None => FieldUpdate::Unchanged,
        Some(v) => validate_optional_text(v, on_error)?.map_or(FieldUpdate::Clear, FieldUpdate::Set),
    })
}
