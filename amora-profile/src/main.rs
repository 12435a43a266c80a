use axum::{extract::DefaultBodyLimit, routing::{get, post, put}, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod models;
mod repository;
mod routes;
mod schema;
mod services;

use amora_shared::clients::db::create_pool;
use amora_shared::clients::minio::MinioClient;
use amora_shared::clients::rabbitmq::RabbitMQClient;
use config::AppConfig;
use repository::postgres::PgStore;
use services::images::MAX_IMAGE_BYTES;

pub struct AppState {
    pub store: PgStore,
    pub rabbitmq: RabbitMQClient,
    pub minio: MinioClient,
    pub metrics: PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    amora_shared::middleware::init_tracing("amora-profile");
    let metrics = amora_shared::middleware::init_metrics()?;

    let config = AppConfig::load()?;
    let port = config.port;

    let pool = create_pool(&config.database_url, config.db_pool_size)?;
    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let minio = MinioClient::new(
        &config.minio_endpoint,
        &config.minio_access_key,
        &config.minio_secret_key,
        &config.minio_bucket,
        &config.minio_public_url,
    )
    .await;

    let state = Arc::new(AppState {
        store: PgStore::new(pool),
        rabbitmq,
        minio,
        metrics,
    });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/profiles", post(routes::profile::create_profile))
        .route("/profiles/:id", get(routes::profile::get_profile))
        .route("/profiles/telegram/:telegram_id", get(routes::profile::get_profile_by_telegram))
        .route(
            "/me",
            get(routes::profile::get_me)
                .patch(routes::profile::update_me)
                .delete(routes::profile::delete_me),
        )
        .route("/me/navigator", put(routes::navigator::put_navigator))
        .route("/me/filter", get(routes::navigator::get_filter).put(routes::navigator::put_filter))
        .route("/me/images", post(routes::images::upload_image)
            .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)))
        .route(
            "/me/images/:id",
            axum::routing::patch(routes::images::update_image).delete(routes::images::delete_image),
        )
        .route("/discover", get(routes::discovery::discover))
        .route("/likes", post(routes::likes::send_like))
        .route("/likes/:id", axum::routing::delete(routes::likes::remove_like))
        .route("/likes/status/:target_id", get(routes::likes::like_status))
        .route("/blocks", post(routes::blocks::block_profile))
        .route("/complaints", post(routes::complaints::file_complaint))
        .route("/reviews", post(routes::reviews::create_review).get(routes::reviews::list_reviews))
        .route(
            "/reviews/:id",
            get(routes::reviews::get_review)
                .patch(routes::reviews::update_review)
                .delete(routes::reviews::delete_review),
        )
        .layer(axum::middleware::from_fn(amora_shared::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "amora-profile starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
