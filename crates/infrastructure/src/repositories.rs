use async_trait::async_trait;
use chrono::Utc;
use domain::{NewTodo, StoreError, Todo, TodoId, TodoOrder, TodoPatch};
use tokio::sync::RwLock;
use tracing::debug;

/// Todo の永続化コラボレータ
///
/// 存在しない識別子への `update` / `delete` は `StoreError::NotFound` を返します。
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn find_one(&self, id: &TodoId) -> Result<Option<Todo>, StoreError>;

    async fn find_all(&self, order: TodoOrder) -> Result<Vec<Todo>, StoreError>;

    /// 識別子と作成日時を採番して保存します
    async fn create(&self, new: NewTodo) -> Result<Todo, StoreError>;

    /// 部分更新を適用し、更新後のレコードを返します
    async fn update(&self, id: &TodoId, patch: &TodoPatch) -> Result<Todo, StoreError>;

    async fn delete(&self, id: &TodoId) -> Result<(), StoreError>;
}

/// 書き込み呼び出しの履歴（テスト観測用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create { title: String },
    Update { id: TodoId },
    Delete { id: TodoId },
}

#[derive(Default)]
struct MemoryState {
    // 挿入順
    todos: Vec<Todo>,
    calls: Vec<StoreCall>,
    failure: Option<StoreError>,
}

/// 簡易な InMemory 実装（開発/テスト用）
#[derive(Default)]
pub struct InMemoryTodoRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// これまでの書き込み呼び出し
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.read().await.calls.clone()
    }

    /// 以後の全操作を指定のエラーで失敗させます（`None` で解除）
    pub async fn set_failure(&self, failure: Option<StoreError>) {
        self.state.write().await.failure = failure;
    }
}

fn position(todos: &[Todo], id: &TodoId) -> Option<usize> {
    todos
        .iter()
        .position(|t| t.id.as_str().eq_ignore_ascii_case(id.as_str()))
}

fn check(state: &MemoryState) -> Result<(), StoreError> {
    match &state.failure {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn find_one(&self, id: &TodoId) -> Result<Option<Todo>, StoreError> {
        let state = self.state.read().await;
        check(&state)?;
        Ok(position(&state.todos, id).map(|i| state.todos[i].clone()))
    }

    async fn find_all(&self, order: TodoOrder) -> Result<Vec<Todo>, StoreError> {
        let state = self.state.read().await;
        check(&state)?;
        let mut todos = state.todos.clone();
        if order == TodoOrder::NewestFirst {
            // 同時刻の場合も後から追加したものを先に
            todos.reverse();
        }
        order.sort(&mut todos);
        Ok(todos)
    }

    async fn create(&self, new: NewTodo) -> Result<Todo, StoreError> {
        let mut state = self.state.write().await;
        check(&state)?;
        state.calls.push(StoreCall::Create {
            title: new.title.clone(),
        });

        let todo = new.into_todo(TodoId::new(), Utc::now());
        if position(&state.todos, &todo.id).is_some() {
            return Err(StoreError::Constraint(format!("duplicate id {}", todo.id)));
        }
        state.todos.push(todo.clone());
        debug!(todo_id = %todo.id, "stored todo in memory");
        Ok(todo)
    }

    async fn update(&self, id: &TodoId, patch: &TodoPatch) -> Result<Todo, StoreError> {
        let mut state = self.state.write().await;
        check(&state)?;
        state.calls.push(StoreCall::Update { id: id.clone() });

        let index = position(&state.todos, id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let mut updated = patch.apply(&state.todos[index]);
        updated.updated_at = Utc::now();
        state.todos[index] = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &TodoId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        check(&state)?;
        state.calls.push(StoreCall::Delete { id: id.clone() });

        let index = position(&state.todos, id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        state.todos.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::FieldUpdate;

    #[tokio::test]
    async fn create_assigns_id_and_defaults() {
        let repo = InMemoryTodoRepository::new();
        let todo = repo.create(NewTodo::with_title("Buy milk")).await.unwrap();

        let found = repo.find_one(&todo.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Buy milk");
        assert!(!found.complete);
        assert_eq!(
            repo.calls().await,
            vec![StoreCall::Create { title: "Buy milk".into() }]
        );
    }

    #[tokio::test]
    async fn find_one_ignores_identifier_case() {
        let repo = InMemoryTodoRepository::new();
        let todo = repo.create(NewTodo::with_title("Task")).await.unwrap();
        let upper = TodoId::parse(&todo.id.as_str().to_ascii_uppercase()).unwrap();
        assert!(repo.find_one(&upper).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn find_all_lists_newest_first_by_default() {
        let repo = InMemoryTodoRepository::new();
        for title in ["A", "B", "C"] {
            repo.create(NewTodo::with_title(title)).await.unwrap();
        }

        let newest: Vec<String> = repo
            .find_all(TodoOrder::NewestFirst)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(newest, vec!["C", "B", "A"]);

        let oldest: Vec<String> = repo
            .find_all(TodoOrder::OldestFirst)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(oldest, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let repo = InMemoryTodoRepository::new();
        let mut new = NewTodo::with_title("Task");
        new.recurrence = Some("daily".into());
        let todo = repo.create(new).await.unwrap();

        let patch = TodoPatch {
            title: Some("Renamed".into()),
            recurrence: FieldUpdate::Clear,
            ..TodoPatch::default()
        };
        let updated = repo.update(&todo.id, &patch).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.recurrence, None);
        assert_eq!(updated.priority, todo.priority);
        assert_eq!(updated.created_at, todo.created_at);
        assert!(updated.updated_at >= todo.updated_at);
    }

    #[tokio::test]
    async fn update_and_delete_unknown_id_are_not_found() {
        let repo = InMemoryTodoRepository::new();
        let id = TodoId::new();
        assert!(matches!(
            repo.update(&id, &TodoPatch::toggle(true)).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(repo.delete(&id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_twice_fails_the_second_time() {
        let repo = InMemoryTodoRepository::new();
        let todo = repo.create(NewTodo::with_title("Task")).await.unwrap();
        repo.delete(&todo.id).await.unwrap();
        assert!(repo.find_one(&todo.id).await.unwrap().is_none());
        assert!(matches!(repo.delete(&todo.id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn injected_failure_is_returned_by_every_operation() {
        let repo = InMemoryTodoRepository::new();
        repo.set_failure(Some(StoreError::Unavailable("down".into()))).await;
        assert!(repo.find_all(TodoOrder::default()).await.is_err());
        assert!(repo.create(NewTodo::with_title("X")).await.is_err());
        assert!(repo.calls().await.is_empty());

        repo.set_failure(None).await;
        assert!(repo.find_all(TodoOrder::default()).await.is_ok());
    }
}
