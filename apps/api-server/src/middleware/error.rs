//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use pulse_core::DomainError;
use pulse_core::error::{RepoError, SchedulerError};
use pulse_core::ports::AuthError;
use pulse_shared::{ErrorResponse, ProblemType};

/// Handler error; rendered as problem details.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden(Option<String>),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn problem(&self) -> ProblemType {
        match self {
            AppError::NotFound(_) => ProblemType::NotFound,
            AppError::BadRequest(_) => ProblemType::Validation,
            AppError::Unauthorized => ProblemType::Authentication,
            AppError::Forbidden(_) => ProblemType::Permission,
            AppError::Duplicate(_) => ProblemType::Duplicate,
            AppError::InvalidTransition(_) => ProblemType::InvalidTransition,
            AppError::Unavailable(_) => ProblemType::Unavailable,
            AppError::Internal(_) => ProblemType::Internal,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.problem().status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let error = ErrorResponse::new(self.problem());
        let error = match self {
            AppError::NotFound(detail)
            | AppError::BadRequest(detail)
            | AppError::Duplicate(detail)
            | AppError::InvalidTransition(detail)
            | AppError::Forbidden(Some(detail)) => error.with_detail(detail),
            AppError::Unauthorized => error.with_detail("Incorrect username or password"),
            AppError::Forbidden(None) => error,
            AppError::Unavailable(detail) => {
                tracing::warn!("Service unavailable: {}", detail);
                error.with_detail(detail)
            }
            // Internal details stay in the logs.
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                error
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{entity_type} with id {id} not found"))
            }
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            DomainError::Duplicate(msg) => AppError::Duplicate(msg),
            e @ DomainError::InvalidTransition { .. } => {
                AppError::InvalidTransition(e.to_string())
            }
            DomainError::Unauthorized => AppError::Unauthorized,
            DomainError::Forbidden => {
                AppError::Forbidden(Some("Not enough permissions".to_string()))
            }
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Duplicate(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<SchedulerError> for AppError {
    fn from(err: SchedulerError) -> Self {
        AppError::Unavailable(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Unauthorized,
            AuthError::InsufficientPermissions => AppError::Forbidden(None),
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::domain::PostStatus;
    use uuid::Uuid;

    #[test]
    fn domain_errors_map_to_http_statuses() {
        let cases = [
            (DomainError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (DomainError::Forbidden, StatusCode::FORBIDDEN),
            (DomainError::post_not_found(Uuid::nil()), StatusCode::NOT_FOUND),
            (DomainError::Duplicate("dup".into()), StatusCode::CONFLICT),
            (
                DomainError::InvalidTransition {
                    action: "unschedule",
                    current: PostStatus::Draft,
                },
                StatusCode::CONFLICT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }

    #[test]
    fn invalid_transition_carries_its_own_problem_type() {
        let err = AppError::from(DomainError::InvalidTransition {
            action: "schedule",
            current: PostStatus::Published,
        });
        assert_eq!(err.problem(), ProblemType::InvalidTransition);
        assert_eq!(
            AppError::from(DomainError::Duplicate("dup".into())).problem(),
            ProblemType::Duplicate
        );
    }

    #[test]
    fn store_read_failure_is_unavailable() {
        let err = SchedulerError::StoreRead(RepoError::Connection("down".into()));
        assert_eq!(
            AppError::from(err).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
