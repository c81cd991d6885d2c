//! 楽観的な完了切り替え（呼び出し側の一覧スナップショット用）
//!
//! 1. `begin` で表示上の状態を先に反映し、元の値を覚えておく
//! 2. 更新結果を待つ
//! 3. `settle` で成功なら確定値に置き換え、失敗なら元に戻す

use crate::handlers::TodoCommandHandler;
use domain::{RawToggle, Todo, TodoError, TodoId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticToggle {
    id: TodoId,
    previous: bool,
}

impl OptimisticToggle {
    /// 対象がスナップショットに無い場合は `None`
    pub fn begin(items: &mut [Todo], id: &TodoId, complete: bool) -> Option<Self> {
        let item = items.iter_mut().find(|t| same_id(&t.id, id))?;
        let previous = item.complete;
        item.complete = complete;
        Some(Self {
            id: id.clone(),
            previous,
        })
    }

    pub fn settle(self, items: &mut [Todo], result: &Result<Todo, TodoError>) {
        let Some(item) = items.iter_mut().find(|t| same_id(&t.id, &self.id)) else {
            return;
        };
        match result {
            Ok(todo) => *item = todo.clone(),
            Err(_) => item.complete = self.previous,
        }
    }
}

/// ストアと同じく大文字・小文字を区別せずに照合
fn same_id(a: &TodoId, b: &TodoId) -> bool {
    a.as_str().eq_ignore_ascii_case(b.as_str())
}

/// 楽観的に反映してから更新を待ち、結果に合わせて確定または巻き戻します。
/// 結果は必ず呼び出し側に返します。
pub async fn toggle_optimistically(
    handler: &TodoCommandHandler,
    items: &mut [Todo],
    id: &TodoId,
    complete: bool,
) -> Result<Todo, TodoError> {
    let pending = OptimisticToggle::begin(items, id, complete);
    let result = handler
        .toggle_complete(&RawToggle::new(id.as_str(), complete))
        .await;
    if let Some(pending) = pending {
        pending.settle(items, &result);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{NewTodo, RawTodoFields, StoreError};
    use infrastructure::{InMemoryTodoRepository, TodoListView};
    use std::sync::Arc;

    fn local(title: &str) -> Todo {
        NewTodo::with_title(title).into_todo(TodoId::new(), Utc::now())
    }

    #[test]
    fn begin_applies_pending_state() {
        let mut items = vec![local("A")];
        let id = items[0].id.clone();
        let pending = OptimisticToggle::begin(&mut items, &id, true).unwrap();
        assert!(items[0].complete);

        pending.settle(&mut items, &Err(TodoError::InvalidCompleteFlag));
        assert!(!items[0].complete);
    }

    #[test]
    fn begin_on_unknown_item_is_none() {
        let mut items = vec![local("A")];
        assert!(OptimisticToggle::begin(&mut items, &TodoId::new(), true).is_none());
        assert!(!items[0].complete);
    }

    #[tokio::test]
    async fn success_keeps_authoritative_record() {
        let repo = Arc::new(InMemoryTodoRepository::new());
        let handler = TodoCommandHandler::new(repo.clone(), Arc::new(TodoListView::new()));
        let created = handler
            .create_todo(&RawTodoFields::with_title("Task"))
            .await
            .unwrap();
        let mut items = vec![created.clone()];

        let result = toggle_optimistically(&handler, &mut items, &created.id, true).await;
        assert!(result.is_ok());
        assert!(items[0].complete);
        assert!(items[0].updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn uppercase_id_still_applies_and_settles() {
        let repo = Arc::new(InMemoryTodoRepository::new());
        let handler = TodoCommandHandler::new(repo.clone(), Arc::new(TodoListView::new()));
        let created = handler
            .create_todo(&RawTodoFields::with_title("Task"))
            .await
            .unwrap();
        let mut items = vec![created.clone()];
        let upper = TodoId::parse(&created.id.as_str().to_ascii_uppercase()).unwrap();

        let pending = OptimisticToggle::begin(&mut items, &upper, true);
        assert!(pending.is_some());
        assert!(items[0].complete);
        pending
            .unwrap()
            .settle(&mut items, &Err(TodoError::InvalidCompleteFlag));
        assert!(!items[0].complete);

        let result = toggle_optimistically(&handler, &mut items, &upper, true).await;
        assert!(result.is_ok());
        assert!(items[0].complete);
        assert_eq!(items[0].id, created.id);
    }

    #[tokio::test]
    async fn failure_reverts_and_reports_error() {
        let repo = Arc::new(InMemoryTodoRepository::new());
        let handler = TodoCommandHandler::new(repo.clone(), Arc::new(TodoListView::new()));
        let created = handler
            .create_todo(&RawTodoFields::with_title("Task"))
            .await
            .unwrap();
        let mut items = vec![created.clone()];

        repo.set_failure(Some(StoreError::Unavailable("offline".into())))
            .await;
        let result = toggle_optimistically(&handler, &mut items, &created.id, true).await;

        assert!(matches!(result, Err(TodoError::PersistenceFailure(_))));
        assert!(!items[0].complete);
    }
}
