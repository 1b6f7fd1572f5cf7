//! Mapping of store errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::StoreError;

impl StoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::UnknownDomain(_)
            | StoreError::InvalidSegment(_)
            | StoreError::LocaleRequired(_)
            | StoreError::LocaleNotAllowed(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Io { .. } | StoreError::Format { .. } | StoreError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Storage failure");
            "storage failure".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Domain;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            StoreError::LocaleRequired(Domain::Translation).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(StoreError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);

        let response = StoreError::io("/x", std::io::Error::other("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
