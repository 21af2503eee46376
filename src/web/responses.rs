//! HTTP response mapping
//!
//! Maps pipeline errors onto the status codes of the public contract.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;

impl AppError {
    /// Status code this error surfaces as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::ClientUnidentified => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            // Rate-limit rejections carry no body.
            AppError::RateLimited => status.into_response(),
            // Upstream details stay in the logs; clients get the status line.
            AppError::Upstream(_) => (status, "upstream error".to_string()).into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::UpstreamError;

    #[test]
    fn errors_map_to_contract_status_codes() {
        assert_eq!(
            AppError::bad_request("nope").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::ClientUnidentified.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::not_found("123456789012345678").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Upstream(UpstreamError::Http { status: 500 }).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
