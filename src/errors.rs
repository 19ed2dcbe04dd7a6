//! # Errors for list endpoints
//!
//! The pipeline itself never fails on bad input: it skips what it cannot use and
//! records a [`Diagnostic`](crate::Diagnostic). The only fatal failures are a
//! query string that cannot be parsed at all and the database itself.
//!
//! [`ApiError`] turns those into HTTP responses. Database details are logged
//! server-side with `tracing` and replaced by a generic message for the client.
//!
//! ```rust,ignore
//! async fn list_blogs(
//!     State(db): State<DatabaseConnection>,
//!     Query(params): Query<QueryParams>,
//! ) -> Result<Paginated<serde_json::Value>, ApiError> {
//!     Ok(Blog::list(&db, params).await?)
//! }
//! ```

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request: the query string could not be read.
    BadRequest { message: String },

    /// 500 Internal Server Error. `internal` is logged, never sent.
    Database { message: String, internal: DbErr },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Wrap a database error. Its details are logged but not sent to the client.
    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The sanitized, client-facing message.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::BadRequest { message } | Self::Database { message, .. } => message,
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error while listing");
            }
            Self::BadRequest { message } => {
                tracing::debug!(error = %message, status = %self.status_code(), "API error");
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();
        let body = ErrorResponse {
            error: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database { internal, .. } => Some(internal),
            Self::BadRequest { .. } => None,
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::database(err)
    }
}
