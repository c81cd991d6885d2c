//! フィールド単位の検証と正規化
//!
//! すべて純粋関数です（I/O なし）。入力は型の付いていない JSON 値として受け取り、
//! 成功時は正規化済みの値を返します。最初に見つかった不正で失敗します。

use crate::errors::TodoError;
use crate::todo::{Priority, TodoId};
use chrono::{DateTime, NaiveDate};
use serde_json::Value;

/// タイトルの最大文字数（正規化後）
pub const TITLE_MAX_CHARS: usize = 120;

/// 8-4-4-4-12 の UUID 形式か（バージョン 1..5、バリアント 8/9/a/b）
pub fn is_uuid_shape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        8 | 13 | 18 | 23 => *b == b'-',
        14 => matches!(b, b'1'..=b'5'),
        19 => matches!(b.to_ascii_lowercase(), b'8' | b'9' | b'a' | b'b'),
        _ => b.is_ascii_hexdigit(),
    })
}

pub fn validate_id(raw: &Value) -> Result<TodoId, TodoError> {
    match raw {
        Value::String(s) => TodoId::parse(s),
        other => Err(TodoError::InvalidIdentifier(format!(
            "expected a string identifier, got {}",
            kind_of(other)
        ))),
    }
}

pub fn validate_title(raw: &Value) -> Result<String, TodoError> {
    match raw {
        Value::String(s) => normalize_title(s),
        _ => Err(TodoError::InvalidTitle(
            "Todo title must be provided as plain text.".to_string(),
        )),
    }
}

/// 前後の空白を除去し、連続する空白を 1 つにまとめます。
pub fn normalize_title(raw: &str) -> Result<String, TodoError> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    if normalized.is_empty() {
        return Err(TodoError::InvalidTitle(
            "Todo title cannot be empty.".to_string(),
        ));
    }
    if normalized.chars().count() > TITLE_MAX_CHARS {
        return Err(TodoError::InvalidTitle(format!(
            "Todo title must be at most {TITLE_MAX_CHARS} characters."
        )));
    }
    Ok(normalized)
}

pub fn validate_complete(raw: &Value) -> Result<bool, TodoError> {
    raw.as_bool().ok_or(TodoError::InvalidCompleteFlag)
}

/// 未指定（または null）の場合は Medium
pub fn validate_priority(raw: Option<&Value>) -> Result<Priority, TodoError> {
    match raw {
        None | Some(Value::Null) => Ok(Priority::default()),
        Some(Value::String(s)) => s.parse(),
        Some(other) => Err(TodoError::InvalidPriority(format!(
            "expected a string, got {}",
            kind_of(other)
        ))),
    }
}

/// 空文字・null は `None`。それ以外は実在する日付でなければなりません。
pub fn validate_due_date(raw: &Value) -> Result<Option<NaiveDate>, TodoError> {
    let text = match raw {
        Value::Null => return Ok(None),
        Value::String(s) => s.trim(),
        other => {
            return Err(TodoError::InvalidDueDate(format!(
                "expected a date string, got {}",
                kind_of(other)
            )))
        }
    };
    if text.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.date_naive()))
        .map(Some)
        .map_err(|_| TodoError::InvalidDueDate(format!("'{text}' is not a calendar date")))
}

/// カンマ区切り文字列、または文字列 / `{ "name": ... }` の配列を受け付けます。
pub fn validate_tags(raw: &Value) -> Result<Vec<String>, TodoError> {
    let candidates: Vec<&str> = match raw {
        Value::Null => Vec::new(),
        Value::String(s) => s.split(',').collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.as_str()),
                Value::Object(obj) => obj.get("name").and_then(Value::as_str).ok_or_else(|| {
                    TodoError::InvalidTags("tag objects must carry a string name".to_string())
                }),
                other => Err(TodoError::InvalidTags(format!(
                    "tag entries must be strings, got {}",
                    kind_of(other)
                ))),
            })
            .collect::<Result<_, _>>()?,
        other => {
            return Err(TodoError::InvalidTags(format!(
                "expected a string or a list of strings, got {}",
                kind_of(other)
            )))
        }
    };

    let mut tags: Vec<String> = Vec::with_capacity(candidates.len());
    for tag in candidates.into_iter().map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    Ok(tags)
}

/// recurrence / attachmentUrl 用。型以外の検証は行いません。
pub fn validate_optional_text(
    raw: &Value,
    on_error: fn(String) -> TodoError,
) -> Result<Option<String>, TodoError> {
    match raw {
        Value::Null => Ok(None),
        Value::String(s) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        other => Err(on_error(format!("expected text, got {}", kind_of(other)))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
