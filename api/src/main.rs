use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

use kl_core::services::token::{TokenCleanupConfig, TokenCleanupService, TokenService};
use kl_infra::{DatabasePool, MySqlTokenRepository, MySqlUserDirectory};

use kl_api::config::AppConfig;
use kl_api::middleware::AccessTokenValidator;
use kl_api::routes;
use kl_api::routes::auth::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("starting keyline api server");

    let config = AppConfig::from_env()?;

    let pool = DatabasePool::new(&config.database).await?;
    pool.health_check().await?;

    let repository = MySqlTokenRepository::new(pool.pool().clone());
    let directory = MySqlUserDirectory::new(pool.pool().clone());
    let token_service = Arc::new(TokenService::new(repository, directory, config.token.clone())?);

    // Background sweep of expired refresh tokens
    let cleanup = TokenCleanupService::new(
        Arc::new(MySqlTokenRepository::new(pool.pool().clone())),
        TokenCleanupConfig {
            interval_secs: config.cleanup_interval_secs,
            ..TokenCleanupConfig::default()
        },
    );
    let _cleanup = cleanup.spawn();

    let validator: Arc<dyn AccessTokenValidator> = token_service.clone();
    let state = AppState { token_service };

    info!(host = %config.server.host, port = config.server.port, "binding http server");

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(validator.clone()))
            .route("/health", web::get().to(health_check))
            .configure(routes::auth::configure::<MySqlTokenRepository, MySqlUserDirectory>)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    Ok(())
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "keyline-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
