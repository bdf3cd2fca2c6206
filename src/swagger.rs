use utoipa::openapi::{
    Components, OpenApi,
    security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::USER_ID_HEADER;

/// Name of the security scheme referenced by `security(...)` in path docs.
pub const SECURITY_SCHEME: &str = "userId";

/// Registers the user id header scheme and mounts the Swagger UI.
pub fn create_swagger_ui(mut openapi: OpenApi) -> SwaggerUi {
    openapi
        .components
        .get_or_insert_with(Components::new)
        .add_security_scheme(
            SECURITY_SCHEME,
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(USER_ID_HEADER))),
        );

    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi)
}
