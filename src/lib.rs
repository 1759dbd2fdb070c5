pub mod auth;
pub mod cache;
pub mod chat;
pub mod config;
pub mod database;
pub mod diary;
pub mod gemini;
pub mod journal;
pub mod logging;
pub mod mood;

pub use config::Config;
pub use database::{create_pool, create_redis_client};
pub use gemini::GeminiClient;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::security::auth_middleware;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: ConnectionManager,
    pub config: Config,
    pub gemini: GeminiClient,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // public routes (no authentication required)
    let public_routes = Router::new()
        .route("/user/signup", post(auth::login::signup))
        .route("/user/login", post(auth::login::login));

    // protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/user/auth-status", get(auth::login::auth_status))
        .route("/user/logout", get(auth::login::logout))
        .route("/chat/new", post(chat::handlers::generate_chat_completion))
        .route("/chat/all-chats", get(chat::handlers::get_all_chats))
        .route("/chat/delete", delete(chat::handlers::delete_chats))
        .route("/diary/create", post(diary::handlers::create_diary))
        .route("/diary/entries", get(diary::handlers::get_diaries))
        .route("/journal/create", post(journal::handlers::create_journal))
        .route("/journal/entries", get(journal::handlers::get_user_journals))
        .route("/mood/create", post(mood::handlers::create_mood_entry))
        .route("/mood/history", get(mood::handlers::get_mood_history))
        .route(
            "/mood/analyze-conversation",
            post(mood::handlers::analyze_conversation),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

// The SPA sends the session cookie cross-origin, so the frontend origin is
// allowed explicitly with credentials rather than via a wildcard.
fn cors_layer(config: &Config) -> CorsLayer {
    match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        Err(_) => CorsLayer::permissive(),
    }
}

async fn root() -> &'static str {
    "Companion Backend API - v0.1.0"
}
