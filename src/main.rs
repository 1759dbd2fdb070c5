use companion_backend::{
    create_pool, create_redis_client, create_router, logging, AppState, Config, GeminiClient,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let _guard = logging::init();

    let config = Config::from_env().expect("missing required environment variables");

    let db = create_pool(&config.database_url)
        .await
        .expect("failed to connect to Postgres");
    let redis = create_redis_client(&config.redis_url)
        .await
        .expect("failed to connect to Redis");
    let gemini = GeminiClient::new(&config);

    let server_address = config.server_address.clone();
    let state = Arc::new(AppState {
        db,
        redis,
        config,
        gemini,
    });

    let app = create_router(state);

    info!(address = %server_address, "starting server");
    let listener = tokio::net::TcpListener::bind(&server_address).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
