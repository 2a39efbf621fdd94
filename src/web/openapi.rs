//! OpenAPI description of the web API.

use axum::{routing::get, Json, Router};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use super::dto::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, ResourceResponse,
    UpdateForm, UpdateRoleRequest, UploadForm, UploadResponse, UserSummary,
};
use super::error::{ErrorBody, ErrorCode, ErrorDetail};
use super::handlers;

/// OpenAPI document for every route.
#[derive(OpenApi)]
#[openapi(
    info(title = "Academia API", description = "Academic resource sharing"),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::list_users,
        handlers::auth::update_role,
        handlers::resource::list_resources,
        handlers::resource::get_resource,
        handlers::resource::upload_resource,
        handlers::resource::update_resource,
        handlers::resource::delete_resource,
        handlers::files::download_file,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        UpdateRoleRequest,
        UploadForm,
        UpdateForm,
        MessageResponse,
        LoginResponse,
        UserSummary,
        ResourceResponse,
        UploadResponse,
        ErrorBody,
        ErrorDetail,
        ErrorCode,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Accounts and tokens"),
        (name = "resources", description = "Academic documents"),
        (name = "files", description = "Stored file retrieval")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` security scheme referenced by the handlers.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Router serving the OpenAPI document at `/api-docs/openapi.json`.
pub fn create_openapi_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/auth/login"));
        assert!(paths.contains_key("/resources/upload"));
        assert!(paths.contains_key("/resources/{id}"));
        assert!(paths.contains_key("/files/{storage_id}"));
    }

    #[test]
    fn test_openapi_upload_is_multipart() {
        let doc = ApiDoc::openapi();
        let upload = doc.paths.paths["/resources/upload"].operations
            [&utoipa::openapi::PathItemType::Post]
            .request_body
            .as_ref()
            .unwrap();
        assert!(upload.content.contains_key("multipart/form-data"));

        let update = doc.paths.paths["/resources/{id}"].operations
            [&utoipa::openapi::PathItemType::Put]
            .request_body
            .as_ref()
            .unwrap();
        assert!(update.content.contains_key("multipart/form-data"));

        let schemas = doc.components.unwrap().schemas;
        assert!(schemas.contains_key("UploadForm"));
        assert!(schemas.contains_key("UpdateForm"));
    }

    #[test]
    fn test_openapi_has_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
