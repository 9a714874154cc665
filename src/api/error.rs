use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::auth::AuthError;

#[must_use]
pub const fn status_code(err: &AuthError) -> StatusCode {
    match err {
        AuthError::Validation(_) | AuthError::DuplicateUsername => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::ExpiredToken => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::Forbidden => StatusCode::FORBIDDEN,
        AuthError::NotFound => StatusCode::NOT_FOUND,
        AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = status_code(&self);

        match self {
            Self::Internal(detail) => {
                error!("Internal error: {detail}");
                (status, "Internal server error").into_response()
            }
            Self::Validation(message) => (status, message).into_response(),
            Self::InvalidToken | Self::ExpiredToken => {
                let mut response = (status, self.to_string()).into_response();
                response
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}
