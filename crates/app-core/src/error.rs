//! A centralized and idiomatic error handling module for the Axum web
//! application.

use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bb8_redis::{bb8, redis};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use super::config::ConfigError;
use super::graph::GraphError;
use super::jwt::JwtError;
use super::password::HashingError;

const INTERNAL_MSG: &str = "An internal server error occurred";

/// A registration attempt whose merged form data did not validate.
///
/// Carries the submitted data together with the field errors so callers can
/// re-render the form or ask the user for the missing fields.
#[derive(Debug)]
pub struct IncompleteProfile {
    pub message: String,
    pub data: BTreeMap<String, String>,
    pub errors: ValidationErrors,
}

impl IncompleteProfile {
    pub fn new(message: String, data: BTreeMap<String, String>, errors: ValidationErrors) -> Self {
        Self { message, data, errors }
    }

    /// The submitted form data without secrets.
    pub fn public_data(&self) -> BTreeMap<&str, &str> {
        self.data
            .iter()
            .filter(|(key, _)| !key.starts_with("password"))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect()
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid request format: {0}")]
    RequestFormat(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Incomplete profile: {}", .0.message)]
    IncompleteProfile(Box<IncompleteProfile>),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    // Internal Libraries
    #[error("Config operation failed")]
    Config(#[from] ConfigError),

    #[error("JWT operation failed")]
    Jwt(#[from] JwtError),

    #[error("Graph API operation failed")]
    Graph(#[from] GraphError),

    #[error("Password Hashing operation failed")]
    Hashing(#[from] HashingError),

    // Third Party Libraries
    #[error("Sea ORM operation failed")]
    Database(#[from] sea_orm::DbErr),

    #[error("Redis operation failed")]
    Redis(#[from] redis::RedisError),

    #[error("Redis connection pool operation failed")]
    RedisPool(#[from] bb8::RunError<redis::RedisError>),

    #[error("Serde JSON operation failed")]
    JsonParse(#[from] serde_json::Error),

    #[error("An internal server error occurred")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

fn internal() -> (StatusCode, String, Option<serde_json::Value>) {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MSG.to_string(), None)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::Validation(err) => {
                let details = json!(err.field_errors());
                (StatusCode::UNPROCESSABLE_ENTITY, "Validation failed".to_string(), Some(details))
            },
            AppError::RequestFormat(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::InvalidState(msg) => {
                tracing::warn!("Invalid connect state: {}", msg);
                (StatusCode::BAD_REQUEST, msg, None)
            },
            AppError::IncompleteProfile(profile) => {
                tracing::info!("Incomplete profile: {}", profile.message);
                let details = json!({
                    "errors": profile.errors.field_errors(),
                    "data": profile.public_data(),
                });
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Facebook profile is incomplete".to_string(),
                    Some(details),
                )
            },
            AppError::DuplicateEntry(detail) => {
                tracing::warn!("Duplicate entry: {}", detail);
                (StatusCode::CONFLICT, "Resource already exists".to_string(), None)
            },

            // Internal Libraries
            AppError::Config(err) => {
                tracing::error!("Config getter error: {:?}", err);
                internal()
            },
            AppError::Jwt(err) => {
                tracing::error!("JWT error: {:?}", err);
                match err {
                    JwtError::TokenExpired | JwtError::InvalidToken => (StatusCode::UNAUTHORIZED, err.to_string(), None),
                    JwtError::TokenCreation => internal(),
                }
            },
            AppError::Graph(err) => match err {
                GraphError::Api(_) | GraphError::NotAuthenticated => {
                    tracing::warn!("Graph API rejected the request: {:?}", err);
                    (StatusCode::BAD_REQUEST, err.to_string(), None)
                },
                GraphError::HttpClient(_) | GraphError::ResponseParse => {
                    tracing::error!("Graph API unavailable: {:?}", err);
                    (StatusCode::BAD_GATEWAY, "Facebook is unavailable".to_string(), None)
                },
            },
            AppError::Hashing(err) => {
                tracing::error!("Password hashing error: {:?}", err);
                internal()
            },

            // Third Party Libraries
            AppError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                internal()
            },
            AppError::Redis(err) | AppError::RedisPool(bb8::RunError::User(err)) => {
                tracing::error!("Redis error: {:?}", err);
                internal()
            },
            AppError::RedisPool(bb8::RunError::TimedOut) => {
                tracing::error!("Redis connection pool timed out");
                internal()
            },
            AppError::JsonParse(err) => {
                tracing::error!("Failed to parse JSON: {:?}", err);
                internal()
            },
            AppError::Internal => internal(),
        };

        (status, Json(ErrorResponse { message, details })).into_response()
    }
}
