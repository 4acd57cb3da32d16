//! Authentication handlers.

use actix_web::{HttpResponse, web};

use pulse_core::domain::{User, UserRole};
use pulse_core::ports::{BaseRepository, Clock, PasswordService, TokenService, UserRepository};
use pulse_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=50;

pub(super) fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        role: user.role.to_string(),
        is_active: user.is_active,
        created_at: user.created_at,
        last_login: user.last_login,
    }
}

fn auth_response(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let issued = state.tokens.issue(user)?;

    Ok(AuthResponse {
        access_token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
        user: user_response(user),
    })
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    let username = req.username.trim().to_string();
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(AppError::BadRequest(
            "Username must be between 3 and 50 characters".to_string(),
        ));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let role = match req.role.as_deref() {
        Some(raw) => raw.parse::<UserRole>()?,
        None => UserRole::User,
    };
    if role == UserRole::Admin && !state.allow_admin_registration {
        return Err(AppError::Forbidden(Some(
            "Admin registration is disabled".to_string(),
        )));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Duplicate("Email already registered".to_string()));
    }
    if state.users.find_by_username(&username).await?.is_some() {
        return Err(AppError::Duplicate("Username already taken".to_string()));
    }

    let password_hash = state.passwords.hash(&req.password)?;
    let user = User::new(email, username, req.full_name, password_hash, role);
    let saved = state.users.insert(user).await?;

    tracing::info!(user_id = %saved.id, role = %saved.role, "User registered");
    Ok(HttpResponse::Created().json(auth_response(&state, &saved)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let mut user = state
        .users
        .find_by_login(req.username.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !state.passwords.verify(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }
    if !user.is_active {
        return Err(AppError::BadRequest("Inactive user".to_string()));
    }

    let now = state.clock.now();
    state.users.touch_last_login(user.id, now).await?;
    user.last_login = Some(now);

    Ok(HttpResponse::Ok().json(auth_response(&state, &user)?))
}

/// GET /api/auth/me - Protected route
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(user_response(&user)))
}

/// GET /api/auth/users - Admin only
pub async fn list_users(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    identity.admin()?;
    let users: Vec<UserResponse> = state.users.list().await?.iter().map(user_response).collect();
    Ok(HttpResponse::Ok().json(users))
}
