use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use billing_sync::adapters::http::{self, AppState};
use billing_sync::adapters::memory::{InMemoryCustomerDirectory, InMemoryPurchaseRepository};
use billing_sync::adapters::postgres::{PostgresCustomerDirectory, PostgresPurchaseRepository};
use billing_sync::adapters::providers::ProviderRegistry;
use billing_sync::config::{AppConfig, ServerConfig};
use billing_sync::ports::{CustomerDirectory, PurchaseRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.server);

    let (purchases, customers): (Arc<dyn PurchaseRepository>, Arc<dyn CustomerDirectory>) =
        match &config.database {
            Some(database) => {
                let pool = database
                    .pool_options()
                    .connect(database.url.expose_secret())
                    .await?;
                if database.run_migrations {
                    sqlx::migrate!("./migrations").run(&pool).await?;
                    tracing::info!("Database migrations applied");
                }
                (
                    Arc::new(PostgresPurchaseRepository::new(pool.clone())),
                    Arc::new(PostgresCustomerDirectory::new(pool)),
                )
            }
            None => {
                tracing::warn!("No database configured, purchases are kept in memory only");
                (
                    Arc::new(InMemoryPurchaseRepository::new()),
                    Arc::new(InMemoryCustomerDirectory::new()),
                )
            }
        };

    let registry = ProviderRegistry::new(config.payment.clone())?;
    let state = AppState::new(Arc::new(registry), purchases, customers);
    let app = http::app(state, &config.server);

    let listener = tokio::net::TcpListener::bind(config.server.socket_addr()?).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        environment = ?config.server.environment,
        "Billing sync listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if server.json_logs() {
        registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(true))
            .init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}
