//! Bearer token authentication and role gates.
//!
//! The [`token_auth`] middleware makes the [`TokenIssuer`] available to the
//! extractors below. Each extractor only looks at request headers, so role
//! checks complete before a handler reads any body.

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::auth::permission::{require_admin, require_faculty_or_admin};
use crate::auth::{Claims, TokenIssuer};
use crate::web::error::ApiError;

/// Extractor for authenticated users.
///
/// Rejects with 401 when the `Authorization: Bearer` header is missing or the
/// token does not verify.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError::unauthorized("Missing authorization"))?;

        let issuer = parts
            .extensions
            .get::<Arc<TokenIssuer>>()
            .ok_or_else(|| ApiError::internal("Token issuer not configured"))?;

        let claims = issuer.verify(bearer.token()).map_err(|e| {
            tracing::debug!("Token verification failed: {}", e);
            ApiError::from(e)
        })?;

        Ok(AuthUser(claims))
    }
}

/// Extractor for users with faculty or admin role (403 otherwise).
#[derive(Debug, Clone)]
pub struct FacultyUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for FacultyUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        require_faculty_or_admin(&claims)?;
        Ok(FacultyUser(claims))
    }
}

/// Extractor for admin users (403 otherwise).
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        require_admin(&claims)?;
        Ok(AdminUser(claims))
    }
}

/// Middleware function to inject the token issuer into request extensions.
pub async fn token_auth(
    issuer: Arc<TokenIssuer>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(issuer);
    next.run(request).await
}
