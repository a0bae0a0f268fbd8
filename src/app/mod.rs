use std::sync::Arc;

use actix_web::{
    http::{header, StatusCode},
    HttpResponse, ResponseError,
};
use diesel::result::DatabaseErrorKind;
use serde::Serialize;
use thiserror::Error;

use crate::{
    auth::token::TokenKeys,
    database::db_utils::{DbConn, DbPool},
};

/** Shared by every worker: the connection pool and the token keys */
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    pub fn new(pool: DbPool, tokens: TokenKeys) -> Self {
        Self {
            pool,
            tokens: Arc::new(tokens),
        }
    }

    /// Checks a connection out of the pool for the duration of a request.
    pub fn conn(&self) -> Result<DbConn, AppError> {
        Ok(self.pool.get()?)
    }
}

/** The errors a request can end with, each maps to one status code */
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authentication(String),
    #[error("You do not have permission to perform this action.")]
    Forbidden,
    #[error("Not found.")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("Internal server error")]
    InternalServerError,
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let AppError::Authentication(_) = self {
            response.insert_header((header::WWW_AUTHENTICATE, "Bearer realm=\"api\""));
        }

        response.json(ErrorBody {
            detail: self.to_string(),
        })
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => AppError::NotFound,
            diesel::result::Error::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => {
                    AppError::Conflict(format!("Already exists: {}", info.message()))
                }
                DatabaseErrorKind::ForeignKeyViolation => {
                    AppError::validation("Referenced object does not exist.")
                }
                DatabaseErrorKind::NotNullViolation | DatabaseErrorKind::CheckViolation => {
                    AppError::validation(info.message().to_string())
                }
                _ => {
                    log::error!("database error: {}", info.message());
                    AppError::InternalServerError
                }
            },
            err => {
                log::error!("database error: {err}");
                AppError::InternalServerError
            }
        }
    }
}

impl From<diesel::r2d2::PoolError> for AppError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        log::error!("could not get a database connection: {err}");
        AppError::InternalServerError
    }
}
