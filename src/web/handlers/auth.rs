//! Authentication and user management handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::auth::{authenticate, register as register_user, RegistrationRequest};
use crate::db::{Role, UserRepository, UserUpdate};
use crate::web::dto::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, UpdateRoleRequest, UserSummary,
    ValidatedJson,
};
use crate::web::error::{ApiError, ErrorBody};
use crate::web::middleware::AdminUser;

/// POST /auth/register - Create an account.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, description = "Invalid input or role", body = ErrorBody),
        (status = 409, description = "Username already exists", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let db = state.database().await?;
    let repo = UserRepository::new(db.pool());

    let mut request = RegistrationRequest::new(req.username, req.password);
    if let Some(role) = req.role {
        request = request.with_role(role);
    }
    register_user(&repo, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// POST /auth/login - Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 429, description = "Too many login attempts", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let db = state.database().await?;
    let repo = UserRepository::new(db.pool());

    let user = authenticate(&repo, &req.username, &req.password).await?;
    let token = state.tokens.issue(&user)?;

    Ok(Json(LoginResponse {
        token,
        role: user.role.as_str().to_string(),
    }))
}

/// GET /auth/users - List all users (admin only).
#[utoipa::path(
    get,
    path = "/auth/users",
    tag = "auth",
    responses(
        (status = 200, description = "All users", body = Vec<UserSummary>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_claims): AdminUser,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let db = state.database().await?;
    let users = UserRepository::new(db.pool()).list_all().await?;
    Ok(Json(users.iter().map(UserSummary::from).collect()))
}

/// PUT /auth/update-role/:userId - Change a user's role (admin only).
#[utoipa::path(
    put,
    path = "/auth/update-role/{userId}",
    tag = "auth",
    params(
        ("userId" = i64, Path, description = "User ID")
    ),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated user", body = UserSummary),
        (status = 400, description = "Invalid role", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    AdminUser(claims): AdminUser,
    Path(user_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateRoleRequest>,
) -> Result<Json<UserSummary>, ApiError> {
    let role: Role = req
        .role
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid role: {}", req.role)))?;

    let db = state.database().await?;
    let user = UserRepository::new(db.pool())
        .update(user_id, &UserUpdate::new().role(role))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    tracing::info!(
        admin_id = claims.sub,
        user_id = user.id,
        role = %role,
        "User role updated"
    );

    Ok(Json(UserSummary::from(&user)))
}
