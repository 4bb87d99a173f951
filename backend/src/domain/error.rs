use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppError {
    code: ErrorCode,
    message: String,
    status: StatusCode,
    challenge: Option<String>,
}

impl AppError {
    /// 401 carrying a `WWW-Authenticate: Basic realm="<realm>"` challenge.
    pub fn unauthorized(realm: &str, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Unauthorized,
            message: message.into(),
            status: StatusCode::UNAUTHORIZED,
            challenge: Some(format!("Basic realm=\"{}\"", realm.replace('"', "\\\""))),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Forbidden,
            message: message.into(),
            status: StatusCode::FORBIDDEN,
            challenge: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = (
            self.status,
            Json(ErrorResponse {
                code: self.code.as_str(),
                message: self.message,
            }),
        )
            .into_response();
        if let Some(challenge) = self.challenge {
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}

/// Rejection of a candidate `config.json` document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Parse(String),
    #[error("failed to persist config: {0}")]
    Persist(String),
}
