use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use github_client::GitHubClient;
use repofeed_api::graphql::build_schema;
use repofeed_api::jwt::{JwtService, ISSUER};
use repofeed_api::routes::build_router;
use repofeed_api::ServerDeps;
use repofeed_common::AppConfig;
use repofeed_domains::{MemoryStore, OpenMeteo, PersistentStore, PgStore};
use repofeed_events::EventBus;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn PersistentStore> = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url).await?;
            store.migrate().await?;
            info!("Using Postgres store");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let github = Arc::new(GitHubClient::new(config.github_token.clone()));
    let open_meteo = Arc::new(OpenMeteo::new(
        config.geocoding_url.clone(),
        config.weather_url.clone(),
    ));
    let bus = EventBus::with_buffer(config.subscriber_buffer);

    let deps = ServerDeps::new(
        store,
        github.clone(),
        github,
        open_meteo.clone(),
        open_meteo,
        bus.clone(),
    );
    let schema = build_schema(deps);

    let jwt = match &config.jwt_secret {
        Some(secret) => Some(JwtService::new(secret, ISSUER.to_string())),
        None => {
            warn!("JWT_SECRET not set, every request is unauthenticated");
            None
        }
    };

    let app = build_router(schema, jwt);

    let addr = format!("{}:{}", config.host, config.port);
    info!("repofeed API starting on {addr}");
    info!("GraphiQL IDE available at http://{addr}/graphql");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down, closing subscriptions");
            bus.shutdown();
        })
        .await?;

    Ok(())
}
