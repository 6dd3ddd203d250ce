//! Error handling for the API.
//!
//! In development, feel free to add a variant to the AmbassadorError enum
//! to better format errors. This is always better than just forcing it
//! into a `BadRequest` or a generic `ServerError`. Make sure when doing
//! so to add adequate documentation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// The error enum for all error handling across the API.
///
/// See each variant for its corresponding error status code
/// and JSON error bodies.
#[derive(Debug, thiserror::Error)]
pub enum AmbassadorError {
    /// \[401\] The endpoint requires a logged-in member.
    ///
    /// ```json
    /// {
    ///     "message": "login required",
    ///     "statusCode": 401
    /// }
    /// ```
    #[error("login required")]
    Unauthorized,
    /// \[401\] The email and password provided at login don't match a member.
    ///
    /// ```json
    /// {
    ///     "message": "invalid email or password",
    ///     "statusCode": 401
    /// }
    /// ```
    #[error("invalid email or password")]
    InvalidCredentials,
    /// \[403\] The current member is logged in but may not do this.
    ///
    /// ```json
    /// {
    ///     "message": "access forbidden",
    ///     "statusCode": 403,
    ///     "reason": <reason>?
    /// }
    /// ```
    #[error("access forbidden")]
    Forbidden(Option<String>),
    /// \[404\] The requested resource doesn't exist.
    ///
    /// ```json
    /// {
    ///     "message": "resource not found",
    ///     "statusCode": 404
    /// }
    /// ```
    #[error("resource not found")]
    NotFound,
    /// \[304\] The requested change would leave everything as it was.
    ///
    /// Sent without a body.
    #[error("not modified")]
    NotModified,
    /// \[400\] The request to the API was malformed.
    ///
    /// ```json
    /// {
    ///     "message": "bad request",
    ///     "statusCode": 400,
    ///     "reason": <reason>
    /// }
    /// ```
    #[error("bad request")]
    BadRequest(String),
    /// \[500\] Some of the counter adjustments for an event change failed,
    /// so member service minutes may no longer match their attendance.
    ///
    /// ```json
    /// {
    ///     "message": "service minutes may be inconsistent",
    ///     "statusCode": 500,
    ///     "eventId": <event ID>,
    ///     "failed": <number of failed adjustments>,
    ///     "attempted": <number of attempted adjustments>
    /// }
    /// ```
    #[error("service minutes may be inconsistent")]
    IntegrityRisk {
        event_id: i64,
        failed: usize,
        attempted: usize,
    },
    /// \[500\] An error occured while interacting with the database.
    ///
    /// ```json
    /// {
    ///     "message": "database error",
    ///     "statusCode": 500,
    ///     "error": <error message>
    /// }
    /// ```
    #[error("database error")]
    DbError(#[from] sqlx::Error),
    /// \[500\] An error occurred while handling the request.
    ///
    /// ```json
    /// {
    ///     "message": "server error",
    ///     "statusCode": 500,
    ///     "error": <error message>
    /// }
    /// ```
    #[error("server error")]
    ServerError(String),
}

/// The return type for all endpoints.
pub type AmbassadorResult<T> = Result<T, AmbassadorError>;

impl AmbassadorError {
    pub fn status(&self) -> StatusCode {
        match self {
            AmbassadorError::Unauthorized | AmbassadorError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AmbassadorError::Forbidden(_) => StatusCode::FORBIDDEN,
            AmbassadorError::NotFound => StatusCode::NOT_FOUND,
            AmbassadorError::NotModified => StatusCode::NOT_MODIFIED,
            AmbassadorError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AmbassadorError::IntegrityRisk { .. }
            | AmbassadorError::DbError(_)
            | AmbassadorError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_json(&self) -> Value {
        let mut json_val = match self {
            AmbassadorError::Forbidden(Some(reason)) | AmbassadorError::BadRequest(reason) => {
                json!({ "reason": reason })
            }
            AmbassadorError::IntegrityRisk {
                event_id,
                failed,
                attempted,
            } => json!({
                "eventId": event_id,
                "failed": failed,
                "attempted": attempted,
            }),
            AmbassadorError::DbError(error) => json!({ "error": error.to_string() }),
            AmbassadorError::ServerError(error) => json!({ "error": error }),
            _ => json!({}),
        };

        json_val["statusCode"] = json!(self.status().as_u16());
        json_val["message"] = json!(self.to_string());

        json_val
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        AmbassadorError::Forbidden(Some(reason.into()))
    }
}

impl IntoResponse for AmbassadorError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        if status == StatusCode::NOT_MODIFIED {
            status.into_response()
        } else {
            (status, Json(self.as_json())).into_response()
        }
    }
}
