use actix_web::{HttpResponse, http::StatusCode, ResponseError};
use derive_more::{Display, Error};
use serde::Serialize;

use ffmilp_lib::firefighter::error::ModelError;

/// Blueprint for error responses
#[derive(Serialize)]
struct ErrorResponse {
    status_code: u16,
    error: String,
    message: String,
}

impl ErrorResponse {
    /// Create a new error response
    fn new(status_code: StatusCode, error: String, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            error,
            message,
        }
    }
}

/// Firefighter MILP service error
#[derive(Debug, Display, Error)]
pub enum ServiceError {
    #[display(fmt = "{}", message)]
    Internal { message: String },
    #[display(fmt = "{}", message)]
    BadRequest { message: String },
}

impl ServiceError {
    /// Return the name of this error
    pub fn name(&self) -> String {
        match self {
            Self::Internal { .. } => "Internal Server Error".to_string(),
            Self::BadRequest { .. } => "Bad Request".to_string()
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        log::warn!("Rejecting instance: {}", err);
        Self::BadRequest {
            message: err.to_string()
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match *self {
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST
        }
    }
    fn error_response(&self) -> HttpResponse {
        let res = ErrorResponse::new(
            self.status_code(),
            self.name(),
            self.to_string(),
        );
        HttpResponse::build(self.status_code()).json(res)
    }
}
