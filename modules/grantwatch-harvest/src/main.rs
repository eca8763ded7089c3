use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use grantwatch_common::Config;
use grantwatch_harvest::harvester::Harvester;
use grantwatch_harvest::liveness::HttpProber;
use grantwatch_harvest::scraper::BrowserlessScraper;
use grantwatch_store::PgGrantStore;

#[derive(Parser)]
#[command(name = "grantwatch-harvest", about = "Run one grant harvest across all sources")]
struct Cli {
    /// Print the run summary as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Grantwatch harvest starting...");

    // Load config
    let config = Config::from_env();
    config.log_redacted();

    // Connect to Postgres and run migrations
    let store = PgGrantStore::connect(&config.database_url).await?;
    store.migrate().await?;

    let scraper = BrowserlessScraper::new(
        &config.browserless_url,
        config.browserless_token.as_deref(),
    );
    let model = ai_client::Claude::new(&config.anthropic_api_key, &config.anthropic_model);

    let harvester = Harvester::new(
        Box::new(scraper),
        Box::new(model),
        Box::new(HttpProber::new()),
        Box::new(store),
    );

    let summary = harvester.run().await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!("Harvest run complete. {summary}");
    }

    Ok(())
}
