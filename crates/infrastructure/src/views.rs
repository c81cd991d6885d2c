use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// 更新成功後に一覧ビューを古い状態としてマークするコラボレータ
pub trait ViewInvalidator: Send + Sync {
    fn mark_stale(&self);
}

/// Todo 一覧ビューの世代番号
///
/// 一覧の内容はプロセス内に保持しません。他プロセスが同じストアに書き込んでも
/// 食い違わないよう、参照系は毎回ストアから読み込みます。ここでは更新の回数だけを数えます。
#[derive(Debug, Default)]
pub struct TodoListView {
    generation: AtomicU64,
}

impl TodoListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl ViewInvalidator for TodoListView {
    fn mark_stale(&self) {
        let next = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation = next, "todo list marked stale");
    }
}
