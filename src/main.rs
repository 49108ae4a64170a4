//! Token Pulse - token detail data service

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (API keys go here, not in the TOML config)
    dotenvy::dotenv().ok();

    let app = token_pulse::adapters::cli::init();
    token_pulse::adapters::cli::execute(app).await
}
