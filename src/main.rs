mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod models;
mod routes;
mod service;

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method};
use config::Config;
use db::{memory::MemoryStore, DBClient, Store};
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};

use service::{
    franchise_service::FranchiseService,
    investment_service::InvestmentService,
    property_service::PropertyService,
    rpc_connection::RobustConnection,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub property_service: Arc<PropertyService>,
    pub franchise_service: Arc<FranchiseService>,
    pub investment_service: Arc<InvestmentService>,
    pub rpc: Arc<RobustConnection>,
}

impl AppState {
    pub fn new(db_client: Arc<dyn Store>, config: &Config) -> Self {
        let property_service = Arc::new(PropertyService::new(
            db_client.clone(),
            config.bulk_concurrency,
        ));
        let franchise_service = Arc::new(FranchiseService::new(db_client.clone()));
        let investment_service = Arc::new(InvestmentService::new(db_client));
        let rpc = Arc::new(RobustConnection::new(
            config.solana_rpc_url.clone(),
            config.solana_fallback_rpc_urls.clone(),
            config.rpc_timeout,
        ));

        Self {
            property_service,
            franchise_service,
            investment_service,
            rpc,
        }
    }
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to the database")?;
    tracing::info!("Connection to the database is successful");

    let db_client = DBClient::new(pool);
    db_client.migrate().await.context("failed to run migrations")?;
    Ok(Arc::new(db_client))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::init()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let db_client = connect_store(&config).await?;

    let allowed_origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid origin in ALLOWED_ORIGINS: {}", origin))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT]);

    let app_state = Arc::new(AppState::new(db_client, &config));
    let app = create_router(app_state).layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    tracing::info!("Server is running on http://localhost:{}", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}
