//! Maps Axum's extractor rejections onto [`AppError`].

use axum::extract::rejection::{JsonRejection, QueryRejection};

use super::error::AppError;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::RequestFormat(rejection.to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::RequestFormat(rejection.to_string())
    }
}
