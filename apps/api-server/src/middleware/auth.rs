//! Authentication extractors.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::{Ready, ready};

use pulse_core::domain::{Actor, UserRole};
use pulse_core::ports::{AuthError, TokenClaims};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, user {}!", identity.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
    pub role: UserRole,
}

impl Identity {
    /// The caller as seen by the domain services.
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }

    /// The caller, provided they are an admin.
    pub fn admin(&self) -> Result<Actor, AppError> {
        let actor = self.actor();
        if actor.is_admin() {
            Ok(actor)
        } else {
            Err(AppError::Forbidden(Some("Admin access required".to_string())))
        }
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match &self.0 {
            AuthError::TokenExpired | AuthError::InvalidToken(_) | AuthError::MissingAuth => {
                actix_web::http::StatusCode::UNAUTHORIZED
            }
            AuthError::InsufficientPermissions => actix_web::http::StatusCode::FORBIDDEN,
            _ => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        use pulse_shared::{ErrorResponse, ProblemType};

        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(ProblemType::Authentication)
                .with_title("Token Expired")
                .with_detail("Your authentication token has expired. Please login again."),
            AuthError::InvalidToken(msg) => ErrorResponse::new(ProblemType::Authentication)
                .with_title("Invalid Token")
                .with_detail(msg.clone()),
            AuthError::MissingAuth => ErrorResponse::new(ProblemType::Authentication)
                .with_title("Authentication Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
            AuthError::InsufficientPermissions => ErrorResponse::new(ProblemType::Permission),
            _ => ErrorResponse::new(ProblemType::Internal),
        };

        actix_web::HttpResponse::build(self.status_code())
            .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
            .json(error)
    }
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(AuthenticationError))
    }
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AuthError> {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        ));
    };

    let auth_str = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;

    state.tokens.verify_token(token).map(Identity::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: UserRole) -> Identity {
        Identity {
            user_id: uuid::Uuid::new_v4(),
            username: "someone".into(),
            role,
        }
    }

    #[test]
    fn admin_role_maps_to_admin_actor() {
        let admin = identity(UserRole::Admin);
        assert!(admin.actor().is_admin());
        assert!(admin.admin().is_ok());
    }

    #[test]
    fn regular_user_is_not_admin() {
        let user = identity(UserRole::User);
        assert_eq!(user.actor().role, UserRole::User);
        assert!(matches!(user.admin(), Err(AppError::Forbidden(_))));
    }
}
