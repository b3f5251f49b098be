//! Segment routes

use axum::{routing::get, Router};

use crate::{
    handlers::segment::{
        create_segment, delete_segment, list_segments, show_segment, update_segment,
    },
    AppState,
};

/// Create segment routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v2.0/segments", get(list_segments).post(create_segment))
        .route(
            "/v2.0/segments/:id",
            get(show_segment).put(update_segment).delete(delete_segment),
        )
}
