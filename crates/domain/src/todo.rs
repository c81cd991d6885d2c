use crate::errors::TodoError;
use crate::validation::is_uuid_shape;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Todo の識別子（UUID 形式の不透明な文字列）
///
/// 受け取った文字列の大文字・小文字はそのまま保持します。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// 新しい v4 UUID を採番します（永続化層から呼ばれる想定）
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// UUID 形式を検証して識別子を作成
    pub fn parse(raw: &str) -> Result<Self, TodoError> {
        if is_uuid_shape(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(TodoError::InvalidIdentifier(format!(
                "'{raw}' is not a valid todo identifier"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 優先度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl FromStr for Priority {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Priority::Low),
            "Medium" => Ok(Priority::Medium),
            "High" => Ok(Priority::High),
            other => Err(TodoError::InvalidPriority(format!(
                "'{other}' is not one of Low, Medium, High"
            ))),
        }
    }
}

/// Todo エンティティ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub complete: bool,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub recurrence: Option<String>,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 作成用の検証済みレコード（id と作成日時は永続化層が付与）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub complete: bool,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub recurrence: Option<String>,
    pub attachment_url: Option<String>,
}

impl NewTodo {
    /// タイトルのみを持つ既定値のレコード
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            complete: false,
            priority: Priority::default(),
            due_date: None,
            tags: Vec::new(),
            recurrence: None,
            attachment_url: None,
        }
    }

    pub fn into_todo(self, id: TodoId, now: DateTime<Utc>) -> Todo {
        Todo {
            id,
            title: self.title,
            complete: self.complete,
            priority: self.priority,
            due_date: self.due_date,
            tags: self.tags,
            recurrence: self.recurrence,
            attachment_url: self.attachment_url,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 省略（Unchanged）と明示的な消去（Clear）を区別する更新値
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    Unchanged,
    Set(T),
    Clear,
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Unchanged
    }
}

impl<T: Clone> FieldUpdate<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, FieldUpdate::Unchanged)
    }

    pub fn apply(&self, current: &Option<T>) -> Option<T> {
        match self {
            FieldUpdate::Unchanged => current.clone(),
            FieldUpdate::Set(value) => Some(value.clone()),
            FieldUpdate::Clear => None,
        }
    }
}

/// 部分更新（指定されたフィールドのみ変更）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub complete: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: FieldUpdate<NaiveDate>,
    pub tags: Option<Vec<String>>,
    pub recurrence: FieldUpdate<String>,
    pub attachment_url: FieldUpdate<String>,
}

impl TodoPatch {
    /// 完了フラグだけを変更する更新
    pub fn toggle(complete: bool) -> Self {
        Self {
            complete: Some(complete),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.complete.is_none()
            && self.priority.is_none()
            && self.due_date.is_unchanged()
            && self.tags.is_none()
            && self.recurrence.is_unchanged()
            && self.attachment_url.is_unchanged()
    }

    /// 既存レコードに適用した結果を返します。`updated_at` は呼び出し側で更新します。
    pub fn apply(&self, existing: &Todo) -> Todo {
        Todo {
            id: existing.id.clone(),
            title: self.title.clone().unwrap_or_else(|| existing.title.clone()),
            complete: self.complete.unwrap_or(existing.complete),
            priority: self.priority.unwrap_or(existing.priority),
            due_date: self.due_date.apply(&existing.due_date),
            tags: self.tags.clone().unwrap_or_else(|| existing.tags.clone()),
            recurrence: self.recurrence.apply(&existing.recurrence),
            attachment_url: self.attachment_url.apply(&existing.attachment_url),
            created_at: existing.created_at,
            updated_at: existing.updated_at,
        }
    }
}

/// 一覧の並び順（既定は新しい順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TodoOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl TodoOrder {
    /// 作成日時で並べ替えます。同時刻の場合は入力順を基準にします。
    pub fn sort(&self, todos: &mut [Todo]) {
        match self {
            TodoOrder::NewestFirst => todos.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            TodoOrder::OldestFirst => todos.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        }
    }
}

impl FromStr for TodoOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(TodoOrder::NewestFirst),
            "oldest" => Ok(TodoOrder::OldestFirst),
            other => Err(format!("unknown order '{other}', expected newest or oldest")),
        }
    }
}
