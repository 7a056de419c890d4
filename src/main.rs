use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use vacancy_analytics_backend::config::{get_config, init_config};
use vacancy_analytics_backend::services::hh_client::{HhClient, HhClientConfig};
use vacancy_analytics_backend::store::postgres::create_pool;
use vacancy_analytics_backend::store::{CorpusStore, MemoryCorpus, PgCorpus};
use vacancy_analytics_backend::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vacancy_analytics_backend=info,tower_http=info".into()),
        )
        .init();

    init_config()?;
    let config = get_config();

    let store: Arc<dyn CorpusStore> = match &config.database_url {
        Some(database_url) => {
            let pool = create_pool(database_url).await?;
            let store = PgCorpus::new(pool);
            store.migrate().await?;
            info!("Corpus store: Postgres");
            Arc::new(store)
        }
        None => {
            info!("Corpus store: in-memory (DATABASE_URL not set)");
            Arc::new(MemoryCorpus::new())
        }
    };

    let mut client_config = HhClientConfig::new(
        config.hh_api_base_url.clone(),
        config.hh_user_agent.clone(),
    );
    client_config.timeout = Duration::from_secs(config.hh_http_timeout_secs);
    let client = HhClient::new(client_config)?;

    let state = AppState::new(
        store,
        client,
        Duration::from_millis(config.collect_page_delay_ms),
    );
    let app = router(state, config.api_rps);

    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    info!(address = %config.server_address, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
