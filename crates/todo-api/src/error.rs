use axum::extract::rejection::FormRejection;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use domain::TodoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Todo not found")]
    NotFound,

    /// 詳細はログにのみ出力し、レスポンスには汎用メッセージを返す
    #[error("Failed to {0} todo")]
    Internal(&'static str),
}

impl ApiError {
    /// 操作名付きで `TodoError` を HTTP エラーに変換するクロージャ
    pub fn for_operation(operation: &'static str) -> impl Fn(TodoError) -> ApiError {
        move |err| match err {
            err if err.is_validation() => ApiError::BadRequest(err.to_string()),
            err if err.is_not_found() => ApiError::NotFound,
            _ => ApiError::Internal(operation),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("Invalid JSON: {e}"))
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::BadRequest(format!("Invalid form: {}", rejection.body_text()))
    }
}

/// 405 レスポンス（Allow ヘッダ付き）
pub fn method_not_allowed(method: &Method, allow: &'static str) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, allow)],
        format!("Method {method} Not Allowed"),
    )
        .into_response()
}
