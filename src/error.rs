//! Errors surfaced to API callers.

use hyper::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("malformed request body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        ServiceError::BadRequest(detail.into())
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        ServiceError::Unauthorized(detail.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Malformed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_their_cause() {
        let err = ServiceError::from(anyhow::anyhow!("disk I/O error at /var/db"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "internal server error");
    }

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            ServiceError::bad_request("Watch 'x' already exists.").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::unauthorized("expired").status(),
            StatusCode::UNAUTHORIZED
        );
        let malformed = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            ServiceError::from(malformed).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
