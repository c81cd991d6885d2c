use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, NaiveDate, Utc};
use domain::{Priority, StoreError, Todo, TodoId};
use std::collections::HashMap;

/// 一覧を 1 パーティションにまとめるためのパーティションキー
pub const TODO_PARTITION: &str = "TODOS";

/// エンティティタイプ属性の値
pub const TODO_ENTITY: &str = "Todo";

/// DynamoDB Single Table Design のキー構造
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoDbKeys {
    pub pk: String, // パーティションキー
    pub sk: String, // ソートキー
}

impl DynamoDbKeys {
    /// Todo 用のキーを生成（UUID の大文字・小文字は区別しない）
    pub fn for_todo(todo_id: &TodoId) -> Self {
        Self {
            pk: TODO_PARTITION.to_string(),
            sk: format!("TODO#{}", todo_id.as_str().to_ascii_lowercase()),
        }
    }

    pub fn to_key_map(&self) -> HashMap<String, AttributeValue> {
        HashMap::from([
            ("PK".to_string(), AttributeValue::S(self.pk.clone())),
            ("SK".to_string(), AttributeValue::S(self.sk.clone())),
        ])
    }
}

/// Todo を DynamoDB AttributeValue マップに変換
///
/// タグは Todo アイテム内のリストとして保持するため、Todo の削除でまとめて消えます。
pub fn todo_to_item(todo: &Todo) -> HashMap<String, AttributeValue> {
    let mut map = DynamoDbKeys::for_todo(&todo.id).to_key_map();

    map.insert("EntityType".to_string(), AttributeValue::S(TODO_ENTITY.to_string()));
    map.insert("id".to_string(), AttributeValue::S(todo.id.as_str().to_string()));
    map.insert("title".to_string(), AttributeValue::S(todo.title.clone()));
    map.insert("complete".to_string(), AttributeValue::Bool(todo.complete));
    map.insert(
        "priority".to_string(),
        AttributeValue::S(todo.priority.as_str().to_string()),
    );
    map.insert("tags".to_string(), tags_attribute(&todo.tags));

    if let Some(due_date) = todo.due_date {
        map.insert("due_date".to_string(), date_attribute(due_date));
    }
    if let Some(recurrence) = &todo.recurrence {
        map.insert("recurrence".to_string(), AttributeValue::S(recurrence.clone()));
    }
    if let Some(url) = &todo.attachment_url {
        map.insert("attachment_url".to_string(), AttributeValue::S(url.clone()));
    }

    map.insert(
        "created_at".to_string(),
        AttributeValue::S(todo.created_at.to_rfc3339()),
    );
    map.insert(
        "updated_at".to_string(),
        AttributeValue::S(todo.updated_at.to_rfc3339()),
    );

    map
}

pub fn tags_attribute(tags: &[String]) -> AttributeValue {
    AttributeValue::L(tags.iter().cloned().map(AttributeValue::S).collect())
}

pub fn date_attribute(date: NaiveDate) -> AttributeValue {
    AttributeValue::S(date.format("%Y-%m-%d").to_string())
}

/// DynamoDB AttributeValue マップから Todo を復元
pub fn todo_from_item(map: &HashMap<String, AttributeValue>) -> Result<Todo, StoreError> {
    let id = required_s(map, "id")?;
    let id = TodoId::parse(id).map_err(|e| malformed("id", &e.to_string()))?;

    let title = required_s(map, "title")?.clone();

    let complete = *map
        .get("complete")
        .and_then(|v| v.as_bool().ok())
        .ok_or_else(|| malformed("complete", "missing"))?;

    let priority: Priority = required_s(map, "priority")?
        .parse()
        .map_err(|e: domain::TodoError| malformed("priority", &e.to_string()))?;

    let due_date = optional_s(map, "due_date")
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .map_err(|e| malformed("due_date", &e.to_string()))?;

    let tags = match map.get("tags") {
        Some(value) => value
            .as_l()
            .map_err(|_| malformed("tags", "not a list"))?
            .iter()
            .map(|tag| tag.as_s().cloned().map_err(|_| malformed("tags", "non-string tag")))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(Todo {
        id,
        title,
        complete,
        priority,
        due_date,
        tags,
        recurrence: optional_s(map, "recurrence").cloned(),
        attachment_url: optional_s(map, "attachment_url").cloned(),
        created_at: timestamp(map, "created_at")?,
        updated_at: timestamp(map, "updated_at")?,
    })
}

fn required_s<'a>(
    map: &'a HashMap<String, AttributeValue>,
    key: &str,
) -> Result<&'a String, StoreError> {
    optional_s(map, key).ok_or_else(|| malformed(key, "missing"))
}

fn optional_s<'a>(map: &'a HashMap<String, AttributeValue>, key: &str) -> Option<&'a String> {
    map.get(key).and_then(|v| v.as_s().ok())
}

fn timestamp(map: &HashMap<String, AttributeValue>, key: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(required_s(map, key)?)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| malformed(key, &e.to_string()))
}

fn malformed(field: &str, reason: &str) -> StoreError {
    StoreError::Unavailable(format!("malformed todo item ({field}: {reason})"))
}
