use thiserror::Error;

/// ストア層（永続化コラボレータ）のエラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Todo not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Todo の検証・更新で発生するエラー
///
/// `Invalid*` はすべて永続化の前に検出され、何も書き込まれていないことを保証します。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TodoError {
    #[error("Invalid todo identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Todo completion flag must be a boolean.")]
    InvalidCompleteFlag,

    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    #[error("Invalid due date: {0}")]
    InvalidDueDate(String),

    #[error("Invalid tags: {0}")]
    InvalidTags(String),

    #[error("Invalid recurrence: {0}")]
    InvalidRecurrence(String),

    #[error("Invalid attachment URL: {0}")]
    InvalidAttachmentUrl(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] StoreError),
}

impl TodoError {
    /// 入力検証エラーかどうか（クライアント側で回復可能）
    pub fn is_validation(&self) -> bool {
        !matches!(self, TodoError::PersistenceFailure(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TodoError::PersistenceFailure(StoreError::NotFound(_)))
    }
}
