use crate::models::{
    date_attribute, tags_attribute, todo_from_item, todo_to_item, DynamoDbKeys, TODO_PARTITION,
};
use crate::repositories::TodoRepository;
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use chrono::Utc;
use domain::{FieldUpdate, NewTodo, StoreError, Todo, TodoId, TodoOrder, TodoPatch};
use shared::Config;
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// プロセス全体で共有する DynamoDB クライアント
static SHARED_CLIENT: OnceCell<DynamoDbClient> = OnceCell::const_new();

#[derive(Clone)]
pub struct DynamoDbClient {
    client: Client,
    table_name: String,
}

impl DynamoDbClient {
    pub async fn new(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()));
        if let Some(endpoint) = &config.dynamodb_endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let aws_config = loader.load().await;

        Self {
            client: Client::new(&aws_config),
            table_name: config.dynamodb_table.clone(),
        }
    }

    /// 共有クライアントを返します。初回呼び出しでのみ構築し、
    /// 同時に初回呼び出しがあっても 2 つ目のクライアントは作られません。
    pub async fn shared(config: &Config) -> &'static DynamoDbClient {
        SHARED_CLIENT
            .get_or_init(|| async {
                info!(table = %config.dynamodb_table, "initializing shared DynamoDB client");
                Self::new(config).await
            })
            .await
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// DynamoDB を使った Todo リポジトリ
#[derive(Clone)]
pub struct DynamoTodoRepository {
    db: DynamoDbClient,
}

impl DynamoTodoRepository {
    pub fn new(db: DynamoDbClient) -> Self {
        Self { db }
    }
}

fn unavailable(err: impl std::error::Error) -> StoreError {
    StoreError::Unavailable(DisplayErrorContext(&err).to_string())
}

/// 部分更新から `SET ... REMOVE ...` 式を組み立てます
#[derive(Debug, Default, PartialEq)]
pub struct UpdateExpression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

impl UpdateExpression {
    pub fn from_patch(patch: &TodoPatch, updated_at: &str) -> Self {
        let mut out = UpdateExpression::default();
        let mut set_parts = Vec::new();
        let mut remove_parts = Vec::new();

        let mut set = |out: &mut UpdateExpression, field: &str, value: AttributeValue| {
            out.names.insert(format!("#{field}"), field.to_string());
            out.values.insert(format!(":{field}"), value);
            set_parts.push(format!("#{field} = :{field}"));
        };

        set(&mut out, "updated_at", AttributeValue::S(updated_at.to_string()));
        if let Some(title) = &patch.title {
            set(&mut out, "title", AttributeValue::S(title.clone()));
        }
        if let Some(complete) = patch.complete {
            set(&mut out, "complete", AttributeValue::Bool(complete));
        }
        if let Some(priority) = patch.priority {
            set(&mut out, "priority", AttributeValue::S(priority.as_str().to_string()));
        }
        if let Some(tags) = &patch.tags {
            set(&mut out, "tags", tags_attribute(tags));
        }

        let optional = [
            ("due_date", attribute_update(&patch.due_date, |d| date_attribute(*d))),
            ("recurrence", attribute_update(&patch.recurrence, |s| AttributeValue::S(s.clone()))),
            (
                "attachment_url",
                attribute_update(&patch.attachment_url, |s| AttributeValue::S(s.clone())),
            ),
        ];
        for (field, update) in optional {
            match update {
                FieldUpdate::Unchanged => {}
                FieldUpdate::Set(value) => set(&mut out, field, value),
                FieldUpdate::Clear => {
                    out.names.insert(format!("#{field}"), field.to_string());
                    remove_parts.push(format!("#{field}"));
                }
            }
        }

        out.expression = format!("SET {}", set_parts.join(", "));
        if !remove_parts.is_empty() {
            out.expression.push_str(&format!(" REMOVE {}", remove_parts.join(", ")));
        }
        out
    }
}

fn attribute_update<T>(
    update: &FieldUpdate<T>,
    to_attribute: impl Fn(&T) -> AttributeValue,
) -> FieldUpdate<AttributeValue> {
    match update {
        FieldUpdate::Unchanged => FieldUpdate::Unchanged,
        FieldUpdate::Set(value) => FieldUpdate::Set(to_attribute(value)),
        FieldUpdate::Clear => FieldUpdate::Clear,
    }
}

#[async_trait]
impl TodoRepository for DynamoTodoRepository {
    async fn find_one(&self, id: &TodoId) -> Result<Option<Todo>, StoreError> {
        let result = self
            .db
            .client()
            .get_item()
            .table_name(self.db.table_name())
            .set_key(Some(DynamoDbKeys::for_todo(id).to_key_map()))
            .consistent_read(true)
            .send()
            .await
            .map_err(unavailable)?;

        result.item().map(todo_from_item).transpose()
    }

    async fn find_all(&self, order: TodoOrder) -> Result<Vec<Todo>, StoreError> {
        let mut todos = Vec::new();
        let mut start_key = None;

        loop {
            let page = self
                .db
                .client()
                .query()
                .table_name(self.db.table_name())
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
                .expression_attribute_values(":pk", AttributeValue::S(TODO_PARTITION.to_string()))
                .expression_attribute_values(":sk_prefix", AttributeValue::S("TODO#".to_string()))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(unavailable)?;

            for item in page.items() {
                todos.push(todo_from_item(item)?);
            }

            match page.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        debug!(count = todos.len(), "loaded todos from DynamoDB");
        order.sort(&mut todos);
        Ok(todos)
    }

    async fn create(&self, new: NewTodo) -> Result<Todo, StoreError> {
        let todo = new.into_todo(TodoId::new(), Utc::now());

        self.db
            .client()
            .put_item()
            .table_name(self.db.table_name())
            .set_item(Some(todo_to_item(&todo)))
            .condition_expression("attribute_not_exists(SK)")
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                err if err.is_conditional_check_failed_exception() => {
                    StoreError::Constraint(format!("duplicate id {}", todo.id))
                }
                err => unavailable(err),
            })?;

        Ok(todo)
    }

    async fn update(&self, id: &TodoId, patch: &TodoPatch) -> Result<Todo, StoreError> {
        let update = UpdateExpression::from_patch(patch, &Utc::now().to_rfc3339());

        let result = self
            .db
            .client()
            .update_item()
            .table_name(self.db.table_name())
            .set_key(Some(DynamoDbKeys::for_todo(id).to_key_map()))
            .update_expression(update.expression)
            .set_expression_attribute_names(Some(update.names))
            .set_expression_attribute_values(Some(update.values))
            .condition_expression("attribute_exists(SK)")
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                err if err.is_conditional_check_failed_exception() => {
                    StoreError::NotFound(id.to_string())
                }
                err => unavailable(err),
            })?;

        let item = result
            .attributes()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        todo_from_item(item)
    }

    async fn delete(&self, id: &TodoId) -> Result<(), StoreError> {
        self.db
            .client()
            .delete_item()
            .table_name(self.db.table_name())
            .set_key(Some(DynamoDbKeys::for_todo(id).to_key_map()))
            .condition_expression("attribute_exists(SK)")
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                err if err.is_conditional_check_failed_exception() => {
                    StoreError::NotFound(id.to_string())
                }
                err => unavailable(err),
            })?;

        Ok(())
    }
}
