use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::handlers;
use crate::state::AppState;

pub fn create_routes(state: &AppState) -> Router<AppState> {
    let server_config = &state.config.server;

    Router::new()
        // Page
        .route("/", get(handlers::index).post(handlers::index_submit))

        // Relays
        .route("/translate", post(handlers::translate_text))
        .route(
            "/stt",
            post(handlers::speech_to_text)
                .layer(DefaultBodyLimit::max(server_config.max_upload_bytes)),
        )
        .route("/tts", get(handlers::text_to_speech))

        // Health check
        .route("/api/health", get(handlers::health_check))

        // Static file serving
        .nest_service("/static", ServeDir::new(&server_config.static_dir))
}
