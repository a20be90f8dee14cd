//! Unified application error model and mapping helpers.
//! Every layer (persistence, identity core, HTTP shell) converges on `AppError`;
//! leaf modules keep their own `thiserror` enums and convert at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Message shown for any failed sign-in. Deliberately identical for unknown
/// email, inactive account and wrong password.
pub const INVALID_CREDENTIALS_MSG: &str = "E-mail ou senha inválidos";

/// Generic retry-suggesting message for persistence failures.
pub const PERSISTENCE_RETRY_MSG: &str = "Não foi possível concluir a operação. Tente novamente.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    InvalidCredentials { code: String, message: String },
    NotConfigured { code: String, message: String },
    MalformedSession { code: String, message: String },
    DuplicateUnique { code: String, message: String },
    NotFound { code: String, message: String },
    UserInput { code: String, message: String },
    Persistence { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::InvalidCredentials { code, .. }
            | AppError::NotConfigured { code, .. }
            | AppError::MalformedSession { code, .. }
            | AppError::DuplicateUnique { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::UserInput { code, .. }
            | AppError::Persistence { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::InvalidCredentials { message, .. }
            | AppError::NotConfigured { message, .. }
            | AppError::MalformedSession { message, .. }
            | AppError::DuplicateUnique { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::UserInput { message, .. }
            | AppError::Persistence { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn invalid_credentials() -> Self {
        AppError::InvalidCredentials { code: "invalid_credentials".into(), message: INVALID_CREDENTIALS_MSG.into() }
    }
    pub fn not_configured<S: Into<String>>(msg: S) -> Self { AppError::NotConfigured { code: "not_configured".into(), message: msg.into() } }
    pub fn malformed_session<S: Into<String>>(msg: S) -> Self { AppError::MalformedSession { code: "malformed_session".into(), message: msg.into() } }
    pub fn duplicate<S: Into<String>>(code: S, msg: S) -> Self { AppError::DuplicateUnique { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn persistence() -> Self { AppError::Persistence { code: "persistence_error".into(), message: PERSISTENCE_RETRY_MSG.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::InvalidCredentials { .. } => 401,
            AppError::NotConfigured { .. } => 503,
            AppError::MalformedSession { .. } => 400,
            AppError::DuplicateUnique { .. } => 409,
            AppError::NotFound { .. } => 404,
            AppError::UserInput { .. } => 400,
            AppError::Persistence { .. } => 503,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal_error".into(), message: err.to_string() }
    }
}

impl From<crate::persistence::StoreError> for AppError {
    fn from(err: crate::persistence::StoreError) -> Self {
        use crate::persistence::StoreError;
        match err {
            StoreError::NotConfigured => AppError::not_configured("persistence boundary is not configured"),
            StoreError::DuplicateUnique { table, column } => {
                AppError::duplicate(format!("duplicate_{}_{}", table, column), duplicate_message(&table, &column))
            }
            StoreError::InvalidRow(msg) => AppError::user("invalid_row".to_string(), msg),
            StoreError::Io(e) => {
                tracing::error!(target: "persistence", "io failure: {e}");
                AppError::persistence()
            }
            StoreError::Json(e) => {
                tracing::error!(target: "persistence", "snapshot encoding failure: {e}");
                AppError::persistence()
            }
        }
    }
}

fn duplicate_message(table: &str, column: &str) -> String {
    match (table, column) {
        ("users", "email") => "Já existe um usuário com este e-mail".to_string(),
        ("bill_categories", "name") => "Já existe uma categoria com este nome".to_string(),
        _ => format!("Valor duplicado em {}.{}", table, column),
    }
}
