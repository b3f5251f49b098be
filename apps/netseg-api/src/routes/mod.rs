//! API routes

pub mod segment;

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    dto::segment::{
        CreateSegment, CreateSegmentRequest, ErrorResponse, Link, SegmentListResponse,
        SegmentResponse, UpdateSegment, UpdateSegmentRequest,
    },
    handlers, AppState,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::segment::create_segment,
        handlers::segment::list_segments,
        handlers::segment::show_segment,
        handlers::segment::update_segment,
        handlers::segment::delete_segment,
        health_handler
    ),
    components(
        schemas(
            CreateSegment,
            CreateSegmentRequest,
            UpdateSegment,
            UpdateSegmentRequest,
            SegmentResponse,
            SegmentListResponse,
            Link,
            ErrorResponse
        )
    ),
    tags(
        (name = "segments", description = "Network segment management"),
        (name = "health", description = "Health check endpoints")
    ),
    info(
        title = "NetSeg API",
        version = "0.1.0",
        description = "Network segment management service",
        contact(
            name = "NetSeg Team"
        )
    )
)]
pub struct ApiDoc;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(segment::routes())
        .route("/health", axum::routing::get(health_handler))
        .with_state(state)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    ),
    tag = "health"
)]
async fn health_handler() -> &'static str {
    "OK"
}
