use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

const OPENAPI_JSON: &str = "/api-doc/openapi.json";

/// Swagger UI at `/docs` for the console's local API.
pub fn router() -> Router<SharedState> {
    Router::from(SwaggerUi::new("/docs").url(OPENAPI_JSON, ApiDoc::openapi()))
}
