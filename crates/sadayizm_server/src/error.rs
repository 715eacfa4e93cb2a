//! HTTP error mapping and startup failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use sadayizm_core::{RepoError, TrollServiceError};
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MSG_REQUIRED_FIELDS: &str = "Nick y Steam ID son requeridos";
pub const MSG_INVALID_BODY: &str = "Cuerpo JSON inválido";
pub const MSG_ID_REQUIRED: &str = "Se requiere un id numérico";
pub const MSG_STEAM_ID64_REQUIRED: &str = "Se requiere un steamId64 numérico";
pub const MSG_NOT_FOUND: &str = "Troll no encontrado";
pub const MSG_INTERNAL: &str = "Error interno del servidor";

/// Error returned by request handlers.
#[derive(Debug)]
pub enum ApiError {
    /// 400 with a user-facing message.
    BadRequest(&'static str),
    /// 404.
    NotFound,
    /// 500; the detail is echoed in the body for diagnosis.
    Internal(String),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(message) => write!(f, "bad request: {message}"),
            Self::NotFound => write!(f, "not found"),
            Self::Internal(details) => write!(f, "internal error: {details}"),
        }
    }
}

impl Error for ApiError {}

impl From<TrollServiceError> for ApiError {
    fn from(value: TrollServiceError) -> Self {
        match value {
            TrollServiceError::Validation(_) => Self::BadRequest(MSG_REQUIRED_FIELDS),
            TrollServiceError::NotFound(_) => Self::NotFound,
            TrollServiceError::Repo(err) => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": MSG_NOT_FOUND }))).into_response()
            }
            Self::Internal(details) => {
                error!("event=api_request module=server status=error details={details}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": MSG_INTERNAL, "details": details })),
                )
                    .into_response()
            }
        }
    }
}

/// Failures that stop the process before or while serving.
#[derive(Debug)]
pub enum StartupError {
    Store(RepoError),
    HttpClient(reqwest::Error),
    Bind {
        address: String,
        source: std::io::Error,
    },
    Serve(std::io::Error),
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "failed to open record store: {err}"),
            Self::HttpClient(err) => write!(f, "failed to build ELO http client: {err}"),
            Self::Bind { address, source } => write!(f, "failed to bind {address}: {source}"),
            Self::Serve(err) => write!(f, "server stopped with error: {err}"),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::HttpClient(err) => Some(err),
            Self::Bind { source, .. } => Some(source),
            Self::Serve(err) => Some(err),
        }
    }
}

impl From<RepoError> for StartupError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

impl From<sadayizm_core::db::DbError> for StartupError {
    fn from(value: sadayizm_core::db::DbError) -> Self {
        Self::Store(RepoError::Db(value))
    }
}

impl From<reqwest::Error> for StartupError {
    fn from(value: reqwest::Error) -> Self {
        Self::HttpClient(value)
    }
}
