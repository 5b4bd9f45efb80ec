//! API routes.

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::artifacts::{get_clip, get_subtitle, get_thumbnail};
use crate::handlers::health::health;
use crate::handlers::publish::{publish_instagram, publish_youtube};
use crate::handlers::upload::upload_video;
use crate::handlers::videos::{
    cancel_video, delete_video, get_content_plan, get_highlights, get_status, get_video,
    list_videos,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/upload", post(upload_video))
        .route("/status/:id", get(get_status))
        .route("/videos", get(list_videos))
        .route("/videos/:id", get(get_video))
        .route("/videos/:id", delete(delete_video))
        .route("/videos/:id/highlights", get(get_highlights))
        .route("/videos/:id/content_plan", get(get_content_plan))
        .route("/videos/:id/clips/:segment", get(get_clip))
        .route("/videos/:id/subtitles/:segment", get(get_subtitle))
        .route("/videos/:id/thumbnails/:segment", get(get_thumbnail))
        .route("/videos/:id/cancel", post(cancel_video))
        .route("/publish/youtube/:id/:segment", post(publish_youtube))
        .route("/publish/instagram/:id/:segment", post(publish_instagram));

    let health_routes = Router::new().route("/health", get(health));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    use axum::http::{header, Method};

    let allowed_headers = [header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT];
    let allowed_methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(allowed_methods)
            .allow_headers(allowed_headers)
    } else {
        let parsed: Vec<axum::http::HeaderValue> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods(allowed_methods)
            .allow_headers(allowed_headers)
    }
}
