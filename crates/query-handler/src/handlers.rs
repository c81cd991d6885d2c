use domain::{parse_identifier, RawIdentifier, StoreError, Todo, TodoError, TodoOrder};
use infrastructure::TodoRepository;
use std::sync::Arc;
use tracing::{debug, error};

/// 参照系エントリポイント
///
/// 一覧・単一取得とも毎回ストアから読み込みます。
#[derive(Clone)]
pub struct TodoQueryHandler {
    repo: Arc<dyn TodoRepository>,
}

impl TodoQueryHandler {
    pub fn new(repo: Arc<dyn TodoRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_todos(&self, order: TodoOrder) -> Result<Vec<Todo>, TodoError> {
        let todos = self.repo.find_all(order).await.map_err(load_failure)?;
        debug!(count = todos.len(), ?order, "loaded todo list");
        Ok(todos)
    }

    /// 単一取得。存在しなければ NotFound の PersistenceFailure
    pub async fn get_todo(&self, raw: &RawIdentifier) -> Result<Todo, TodoError> {
        let id = parse_identifier(raw)?;
        self.repo
            .find_one(&id)
            .await
            .map_err(load_failure)?
            .ok_or_else(|| TodoError::PersistenceFailure(StoreError::NotFound(id.to_string())))
    }
}

fn load_failure(err: StoreError) -> TodoError {
    error!(error = %err, "failed to load todos");
    TodoError::PersistenceFailure(err)
}
