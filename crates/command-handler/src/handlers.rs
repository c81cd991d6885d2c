use domain::{
    build_create, build_update, parse_identifier, parse_toggle, RawIdentifier, RawTodoFields,
    RawToggle, StoreError, Todo, TodoError, TodoPatch,
};
use infrastructure::{TodoRepository, ViewInvalidator};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 更新系エントリポイント
///
/// どの操作も「検証 → 永続化（1 回）→ 一覧ビューの無効化」の順に実行します。
/// 検証エラーの場合は永続化を呼び出さず、無効化も行いません。
#[derive(Clone)]
pub struct TodoCommandHandler {
    repo: Arc<dyn TodoRepository>,
    views: Arc<dyn ViewInvalidator>,
}

impl TodoCommandHandler {
    pub fn new(repo: Arc<dyn TodoRepository>, views: Arc<dyn ViewInvalidator>) -> Self {
        Self { repo, views }
    }

    /// 完了フラグの切り替え
    pub async fn toggle_complete(&self, raw: &RawToggle) -> Result<Todo, TodoError> {
        let input = parse_toggle(raw).map_err(rejected)?;

        let todo = self
            .repo
            .update(&input.id, &TodoPatch::toggle(input.complete))
            .await
            .map_err(|e| persistence_failure("toggle", e))?;

        self.views.mark_stale();
        info!(todo_id = %todo.id, complete = todo.complete, "todo toggled");
        Ok(todo)
    }

    pub async fn create_todo(&self, raw: &RawTodoFields) -> Result<Todo, TodoError> {
        let new = build_create(raw).map_err(rejected)?;

        let todo = self
            .repo
            .create(new)
            .await
            .map_err(|e| persistence_failure("create", e))?;

        self.views.mark_stale();
        info!(todo_id = %todo.id, "todo created");
        Ok(todo)
    }

    /// 部分更新（指定されたフィールドのみ変更）
    pub async fn update_todo(
        &self,
        id: &RawIdentifier,
        raw: &RawTodoFields,
    ) -> Result<Todo, TodoError> {
        let id = parse_identifier(id).map_err(rejected)?;
        let patch = build_update(raw).map_err(rejected)?;

        let todo = self
            .repo
            .update(&id, &patch)
            .await
            .map_err(|e| persistence_failure("update", e))?;

        self.views.mark_stale();
        info!(todo_id = %todo.id, "todo updated");
        Ok(todo)
    }

    /// 削除。同じ識別子で 2 回呼ぶと 2 回目は NotFound で失敗します。
    pub async fn delete_todo(&self, raw: &RawIdentifier) -> Result<(), TodoError> {
        let id = parse_identifier(raw).map_err(rejected)?;

        self.repo
            .delete(&id)
            .await
            .map_err(|e| persistence_failure("delete", e))?;

        self.views.mark_stale();
        info!(todo_id = %id, "todo deleted");
        Ok(())
    }
}

fn rejected(err: TodoError) -> TodoError {
    warn!(error = %err, "rejected todo input");
    err
}

fn persistence_failure(operation: &str, err: StoreError) -> TodoError {
    match &err {
        StoreError::NotFound(id) => warn!(operation, todo_id = %id, "todo not found"),
        other => error!(operation, error = %other, "todo persistence failed"),
    }
    TodoError::PersistenceFailure(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Priority, TodoId, TodoOrder};
    use infrastructure::{InMemoryTodoRepository, StoreCall, TodoListView};
    use serde_json::json;

    struct Fixture {
        repo: Arc<InMemoryTodoRepository>,
        view: Arc<TodoListView>,
        handler: TodoCommandHandler,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryTodoRepository::new());
        let view = Arc::new(TodoListView::new());
        let handler = TodoCommandHandler::new(repo.clone(), view.clone());
        Fixture { repo, view, handler }
    }

    #[tokio::test]
    async fn create_then_find_one_returns_defaults() {
        let f = fixture();
        let todo = f
            .handler
            .create_todo(&RawTodoFields::with_title("Buy milk"))
            .await
            .unwrap();

        let stored = f.repo.find_one(&todo.id).await.unwrap().unwrap();
        assert!(!stored.complete);
        assert_eq!(stored.priority, Priority::Medium);
        assert_eq!(stored.title, "Buy milk");
        assert_eq!(f.view.generation(), 1);
    }

    #[tokio::test]
    async fn create_with_empty_title_persists_nothing() {
        let f = fixture();
        let err = f
            .handler
            .create_todo(&RawTodoFields::with_title(""))
            .await
            .unwrap_err();

        assert!(matches!(err, TodoError::InvalidTitle(_)));
        assert!(f.repo.calls().await.is_empty());
        assert!(f.repo.find_all(TodoOrder::default()).await.unwrap().is_empty());
        assert_eq!(f.view.generation(), 0);
    }

    #[tokio::test]
    async fn toggle_then_delete_end_to_end() {
        let f = fixture();
        let todo = f
            .handler
            .create_todo(&RawTodoFields::with_title("Walk the dog"))
            .await
            .unwrap();

        let toggled = f
            .handler
            .toggle_complete(&RawToggle::new(todo.id.as_str(), true))
            .await
            .unwrap();
        assert!(toggled.complete);
        assert!(f.repo.find_one(&todo.id).await.unwrap().unwrap().complete);

        f.handler
            .delete_todo(&RawIdentifier::new(todo.id.as_str()))
            .await
            .unwrap();
        assert!(f.repo.find_one(&todo.id).await.unwrap().is_none());
        assert_eq!(f.view.generation(), 3);
    }

    #[tokio::test]
    async fn second_delete_fails_with_not_found() {
        let f = fixture();
        let todo = f
            .handler
            .create_todo(&RawTodoFields::with_title("Once"))
            .await
            .unwrap();
        let raw = RawIdentifier::new(todo.id.as_str());

        f.handler.delete_todo(&raw).await.unwrap();
        let err = f.handler.delete_todo(&raw).await.unwrap_err();
        assert!(err.is_not_found());
        // 失敗した操作ではビューを無効化しない
        assert_eq!(f.view.generation(), 2);
    }

    #[tokio::test]
    async fn toggle_rejects_bad_input_before_persistence() {
        let f = fixture();
        let err = f
            .handler
            .toggle_complete(&RawToggle::new("not-a-uuid", true))
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::InvalidIdentifier(_)));

        let err = f
            .handler
            .toggle_complete(&RawToggle::new(TodoId::new().as_str(), "yes"))
            .await
            .unwrap_err();
        assert_eq!(err, TodoError::InvalidCompleteFlag);
        assert!(f.repo.calls().await.is_empty());
    }

    #[tokio::test]
    async fn update_rejects_bad_input_before_persistence() {
        let f = fixture();
        let todo = f
            .handler
            .create_todo(&RawTodoFields::with_title("Task"))
            .await
            .unwrap();
        let id = RawIdentifier::new(todo.id.as_str());

        for body in [
            json!({ "title": "   " }),
            json!({ "priority": "urgent" }),
            json!({ "priority": null }),
            json!({ "dueDate": "2023-02-30" }),
            json!({ "tags": 5 }),
        ] {
            let raw: RawTodoFields = serde_json::from_value(body.clone()).unwrap();
            let err = f.handler.update_todo(&id, &raw).await.unwrap_err();
            assert!(err.is_validation(), "{body} should be rejected");
        }

        let err = f
            .handler
            .update_todo(&RawIdentifier::new("not-a-uuid"), &RawTodoFields::with_title("X"))
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::InvalidIdentifier(_)));

        // 作成の 1 回だけ
        assert_eq!(
            f.repo.calls().await,
            vec![StoreCall::Create { title: "Task".into() }]
        );
        assert_eq!(f.view.generation(), 1);
        assert_eq!(f.repo.find_one(&todo.id).await.unwrap().unwrap(), todo);
    }

    #[tokio::test]
    async fn toggle_unknown_id_is_persistence_failure() {
        let f = fixture();
        let err = f
            .handler
            .toggle_complete(&RawToggle::new(TodoId::new().as_str(), true))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn update_changes_only_supplied_fields() {
        let f = fixture();
        let raw: RawTodoFields = serde_json::from_value(json!({
            "title": "Pay rent",
            "dueDate": "2024-06-01",
            "tags": ["home"]
        }))
        .unwrap();
        let todo = f.handler.create_todo(&raw).await.unwrap();

        let patch: RawTodoFields =
            serde_json::from_value(json!({ "priority": "High", "dueDate": "" })).unwrap();
        let updated = f
            .handler
            .update_todo(&RawIdentifier::new(todo.id.as_str()), &patch)
            .await
            .unwrap();

        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.due_date, None);
        assert_eq!(updated.title, "Pay rent");
        assert_eq!(updated.tags, vec!["home"]);
    }

    #[tokio::test]
    async fn store_outage_surfaces_as_persistence_failure() {
        let f = fixture();
        f.repo
            .set_failure(Some(StoreError::Unavailable("connection refused".into())))
            .await;

        let err = f
            .handler
            .create_todo(&RawTodoFields::with_title("X"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TodoError::PersistenceFailure(StoreError::Unavailable(_))
        ));
        assert_eq!(f.view.generation(), 0);
    }

    #[tokio::test]
    async fn writes_go_through_a_single_store_call() {
        let f = fixture();
        let todo = f
            .handler
            .create_todo(&RawTodoFields::with_title("Task"))
            .await
            .unwrap();
        f.handler
            .toggle_complete(&RawToggle::new(todo.id.as_str(), true))
            .await
            .unwrap();

        assert_eq!(
            f.repo.calls().await,
            vec![
                StoreCall::Create { title: "Task".into() },
                StoreCall::Update { id: todo.id.clone() },
            ]
        );
    }
}
