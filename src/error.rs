use argon2::Error as Argon2Error;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use log::{error, warn};
use mongodb::{bson::ser::Error as BsonError, error::Error as DbError};
use rocket::{
    http::{Status, StatusClass},
    response::{self, Responder},
    serde::json::Json,
    Request, Response,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(#[from] DbError),
    #[error("Failed to encode document: {0}")]
    Encoding(#[from] BsonError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(why: impl Into<String>) -> Self {
        Self::Forbidden(why.into())
    }

    pub fn conflict(why: impl Into<String>) -> Self {
        Self::Conflict(why.into())
    }

    pub fn validation(why: impl Into<String>) -> Self {
        Self::Validation(why.into())
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::NotFound(_) => Status::NotFound,
            Self::Forbidden(_) => Status::Forbidden,
            Self::Conflict(_) => Status::Conflict,
            Self::Validation(_) => Status::BadRequest,
            Self::Unauthorized(_) => Status::Unauthorized,
            Self::Unavailable(_) => Status::ServiceUnavailable,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
            Self::Encoding(_) | Self::Argon2(_) => Status::InternalServerError,
        }
    }
}

/// The JSON body sent alongside every error status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        match status.class() {
            StatusClass::ServerError => error!("{} {}: {self}", req.method(), req.uri()),
            _ => warn!("{} {}: {self}", req.method(), req.uri()),
        }
        let body = Json(ErrorMessage {
            message: self.to_string(),
        });
        Response::build_from(body.respond_to(req)?)
            .status(status)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(Error::not_found("x").status(), Status::NotFound);
        assert_eq!(Error::forbidden("x").status(), Status::Forbidden);
        assert_eq!(Error::conflict("x").status(), Status::Conflict);
        assert_eq!(Error::validation("x").status(), Status::BadRequest);
        assert_eq!(
            Error::Unauthorized("x".to_string()).status(),
            Status::Unauthorized
        );
    }

    #[test]
    fn encoding_failures_are_internal() {
        // BSON has no unsigned 64-bit integers.
        let err: Error = mongodb::bson::to_bson(&u64::MAX).unwrap_err().into();
        assert!(matches!(err, Error::Encoding(_)));
        assert_eq!(err.status(), Status::InternalServerError);
    }

    #[test]
    fn messages_name_the_kind() {
        assert_eq!(
            Error::conflict("You have already voted").to_string(),
            "Conflict: You have already voted"
        );
    }
}
