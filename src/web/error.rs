use actix::MailboxError;
use actix_web::error::BlockingError;
use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::error::Error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] Error),
    #[error("database worker unavailable: {0}")]
    Mailbox(#[from] MailboxError),
    #[error("password worker unavailable: {0}")]
    Blocking(#[from] BlockingError),
    #[error("authentication required")]
    Unauthorized,
    #[error("you do not have permission to do this")]
    Forbidden,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Domain(error) => match error {
                Error::ResultNotFound(_) => "result_not_found",
                Error::MalformedOdds { .. } => "malformed_odds",
                Error::SubmissionClosed(_) => "submission_closed",
                Error::RaceNotFound(_) => "race_not_found",
                Error::UnknownUser(_) => "unknown_user",
                Error::UsernameTaken(_) => "username_taken",
                Error::InvalidRaceTime(_) => "invalid_race_time",
                Error::Validation(_) => "validation_error",
                Error::Config(_)
                | Error::PersistenceFailure(_)
                | Error::Connection(_)
                | Error::PasswordHash(_) => "internal_error",
            },
            ApiError::Mailbox(_) | ApiError::Blocking(_) => "unavailable",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden => "forbidden",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Domain(error) => match error {
                Error::ResultNotFound(_) | Error::RaceNotFound(_) | Error::UnknownUser(_) => {
                    StatusCode::NOT_FOUND
                }
                Error::SubmissionClosed(_) => StatusCode::CONFLICT,
                Error::UsernameTaken(_) => StatusCode::PRECONDITION_FAILED,
                Error::InvalidRaceTime(_) => StatusCode::UNPROCESSABLE_ENTITY,
                Error::Validation(_) | Error::MalformedOdds { .. } => StatusCode::BAD_REQUEST,
                Error::Config(_)
                | Error::PersistenceFailure(_)
                | Error::Connection(_)
                | Error::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Mailbox(_) | ApiError::Blocking(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("{}", self);
            "An unexpected error occurred".to_string()
        } else {
            self.to_string()
        };

        let mut response = HttpResponse::build(status);
        if let ApiError::Unauthorized = self {
            response.insert_header((header::WWW_AUTHENTICATE, "Basic realm=\"keiba-pool\""));
        }
        response.json(ErrorResponse {
            error: self.code(),
            message,
        })
    }
}
