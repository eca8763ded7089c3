use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use grantwatch_common::Config;
use grantwatch_harvest::harvester::Harvester;
use grantwatch_harvest::liveness::HttpProber;
use grantwatch_harvest::scraper::BrowserlessScraper;
use grantwatch_store::PgGrantStore;

mod routes;

/// One scheduled harvest per day, matching the portals' update cadence.
const HARVEST_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting grantwatch-server");

    let config = Config::from_env();
    config.log_redacted();

    let store = PgGrantStore::connect(&config.database_url).await?;
    store.migrate().await?;
    tracing::info!("Connected to database, migrations complete");

    let scraper = BrowserlessScraper::new(
        &config.browserless_url,
        config.browserless_token.as_deref(),
    );
    let model = ai_client::Claude::new(&config.anthropic_api_key, &config.anthropic_model);

    let harvester = Arc::new(Harvester::new(
        Box::new(scraper),
        Box::new(model),
        Box::new(HttpProber::new()),
        Box::new(store),
    ));

    let state = routes::AppState {
        harvester: harvester.clone(),
        run_lock: Arc::new(tokio::sync::Mutex::new(())),
    };

    // Daily scheduler. The first tick fires immediately and is skipped so
    // a restart does not trigger an unscheduled run.
    let scheduler_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HARVEST_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            tracing::info!("Scheduled harvest starting");
            let _guard = scheduler_state.run_lock.lock().await;
            match scheduler_state.harvester.run().await {
                Ok(summary) => tracing::info!("Scheduled harvest complete. {summary}"),
                Err(e) => tracing::error!(error = %format!("{e:#}"), "Scheduled harvest failed"),
            }
        }
    });

    let app = routes::build_router(state);
    let addr = format!("{}:{}", config.web_host, config.web_port);
    tracing::info!(addr = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
