use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// A user field referenced by validation, uniqueness, and no-change errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Name,
    Email,
    Password,
    Phone,
    Address,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Username => "username",
            Field::Name => "name",
            Field::Email => "email",
            Field::Password => "password",
            Field::Phone => "phone",
            Field::Address => "address",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failure an operation can end with. All of these are terminal for the
/// request; handlers recover them into a status code plus a JSON body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} is not valid")]
    InvalidInput(Field),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    AlreadyExists(Field),

    #[error("{0} is not changed")]
    NoChange(Field),

    #[error("password does not match")]
    PasswordMismatch,

    #[error("user could not be deleted")]
    DeleteFailed,

    #[error("update was not applied")]
    PersistenceFailed,

    #[error("store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),

    #[error("token not valid")]
    TokenInvalid,

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("not allowed")]
    NotAllowed,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_)
            | ApiError::AlreadyExists(_)
            | ApiError::NoChange(_)
            | ApiError::PasswordMismatch
            | ApiError::DeleteFailed
            | ApiError::PersistenceFailed => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::TokenInvalid | ApiError::NotAllowed => StatusCode::FORBIDDEN,
            ApiError::StoreUnavailable(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Server faults get a generic body; internal detail stays in the logs.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
