pub mod asr;
pub mod config;
pub mod elevenlabs;
pub mod error;
pub mod handlers;
pub mod page;
pub mod routes;
pub mod state;
pub mod translate;
pub mod tts;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::Config;
pub use error::{ConfigError, RelayError};
pub use state::AppState;

/// Build the gateway router with its middleware stack
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes(&state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
