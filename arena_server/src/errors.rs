use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use arena_engine::{db_types::ConversionError, ArenaApiError, StoreError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current state of the match. {0}")]
    Conflict(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<ArenaApiError> for ServerError {
    fn from(e: ArenaApiError) -> Self {
        match e {
            ArenaApiError::Validation(_) => Self::InvalidRequestBody(e.to_string()),
            ArenaApiError::MatchNotFound(_) => Self::NoRecordFound(e.to_string()),
            ArenaApiError::Store(e) => e.into(),
            e if e.is_conflict() => Self::Conflict(e.to_string()),
            e => Self::Unspecified(e.to_string()),
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        error!("💻️ Store error while handling a request. {e}");
        Self::BackendError(format!("Database error: {e}"))
    }
}

impl From<ConversionError> for ServerError {
    fn from(e: ConversionError) -> Self {
        Self::InvalidRequestBody(e.to_string())
    }
}
