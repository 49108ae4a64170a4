//! CLI Command Handlers
//!
//! Implementation of all CLI commands for Token Pulse.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::adapters::cache::SharedCache;
use crate::adapters::coingecko::{CoinGeckoClient, CoinGeckoConfig};
use crate::adapters::http::{self, spawn_token_list_refresh, AppState};
use crate::adapters::jupiter::{JupiterTokenClient, JupiterTokenConfig};
use crate::adapters::pools::{GeckoTerminalClient, PoolStatsConfig};
use crate::adapters::token_lists::TokenListFetcher;
use crate::adapters::yahoo::{YahooConfig, YahooFinanceClient};
use crate::application::{TokenPageService, UpstreamSources};
use crate::config::{load_config, Config};
use crate::domain::{Notice, TokenPageParams, TokenRegistry};
use crate::ports::StockQuoteSource;

const DEFAULT_CONFIG: &str = "config/default.toml";

/// Token Pulse - token detail data service
#[derive(Parser, Debug)]
#[command(
    name = "token-pulse",
    version = env!("CARGO_PKG_VERSION"),
    about = "Token detail data service: prices, tokenized stocks, liquidity and token lists",
    long_about = "Token Pulse serves the data a token detail page needs: USD price with \
                  multi-source fallback, tokenized stock quotes, pool TVL and volume, chart \
                  symbols and merged token lists."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeCmd),

    /// Fetch every configured token list and print a summary
    TokenLists(TokenListsCmd),

    /// Resolve a token price through the full fallback chain
    Price(PriceCmd),

    /// Get the daily price change of a stock ticker
    Stock(StockCmd),
}

impl Command {
    pub fn config_path(&self) -> &Path {
        match self {
            Command::Serve(cmd) => &cmd.config,
            Command::TokenLists(cmd) => &cmd.config,
            Command::Price(cmd) => &cmd.config,
            Command::Stock(cmd) => &cmd.config,
        }
    }
}

/// Start the HTTP server
#[derive(Parser, Debug)]
pub struct ServeCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Override bind address
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Override port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,
}

/// Fetch token lists
#[derive(Parser, Debug)]
pub struct TokenListsCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

/// Resolve a token price
#[derive(Parser, Debug)]
pub struct PriceCmd {
    /// Token symbol (e.g., SOL)
    #[arg(value_name = "SYMBOL")]
    pub symbol: String,

    /// Chain id (1 = Ethereum, 101 = Solana, ...)
    #[arg(long, value_name = "ID")]
    pub chain_id: Option<u64>,

    /// Token contract or mint address
    #[arg(long, value_name = "ADDRESS")]
    pub address: Option<String>,

    /// Skip downloading token lists (metadata lookup uses the static list)
    #[arg(long)]
    pub offline_lists: bool,

    /// Print the full page view as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

/// Get a stock quote
#[derive(Parser, Debug)]
pub struct StockCmd {
    /// Stock ticker (e.g., AAPL)
    #[arg(value_name = "TICKER")]
    pub ticker: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

/// Execute the parsed command
pub async fn execute(app: CliApp) -> Result<()> {
    let path = app.command.config_path().to_path_buf();
    let config = load_config(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Serve(cmd) => serve_command(cmd, config).await,
        Command::TokenLists(_) => token_lists_command(config).await,
        Command::Price(cmd) => price_command(cmd, config).await,
        Command::Stock(cmd) => stock_command(cmd, config).await,
    }
}

/// Initialize logging system
///
/// `RUST_LOG` wins, then `--debug`, then `--verbose`, then the configured level.
fn init_logging(verbose: bool, debug: bool, default_level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        default_level
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Build every upstream client around one shared response cache
pub fn build_sources(config: &Config) -> Result<UpstreamSources> {
    let cache = SharedCache::new(config.cache.default_ttl(), config.cache.max_entries);

    let coingecko = CoinGeckoClient::new(CoinGeckoConfig::from(config), cache.clone())
        .context("Failed to create CoinGecko client")?;
    let yahoo = YahooFinanceClient::new(YahooConfig::from(config), cache.clone())
        .context("Failed to create Yahoo Finance client")?;
    let pools = GeckoTerminalClient::new(PoolStatsConfig::from(config), cache)
        .context("Failed to create GeckoTerminal client")?;
    let jupiter = JupiterTokenClient::with_config(JupiterTokenConfig::from(config))
        .context("Failed to create Jupiter client")?;

    Ok(UpstreamSources {
        prices: Arc::new(coingecko),
        solana: Arc::new(jupiter),
        stocks: Arc::new(yahoo),
        pools: Arc::new(pools),
    })
}

fn build_fetcher(config: &Config) -> Result<TokenListFetcher> {
    let fetcher_config = config.token_lists.fetcher_config()?;
    TokenListFetcher::new(fetcher_config).context("Failed to create token list fetcher")
}

/// Handle serve command
async fn serve_command(cmd: ServeCmd, config: Config) -> Result<()> {
    tracing::info!("Starting Token Pulse...");

    let state = AppState::new(build_sources(&config)?, config.chart.default_exchange.clone());
    let fetcher = build_fetcher(&config)?;
    let sources = config.token_lists.sources();

    let loaded = fetcher.fetch_all(&sources).await;
    state.install_lists(&loaded).await;

    let refresh = config
        .token_lists
        .refresh_interval()
        .map(|every| spawn_token_list_refresh(state.clone(), fetcher, sources, every));

    let addr = match (cmd.bind, cmd.port) {
        (None, None) => config.server.address(),
        (bind, port) => format!(
            "{}:{}",
            bind.unwrap_or_else(|| config.server.get_bind()),
            port.unwrap_or_else(|| config.server.get_port())
        ),
    };

    http::serve(state, &addr)
        .await
        .with_context(|| format!("HTTP server on {} failed", addr))?;

    if let Some(handle) = refresh {
        handle.abort();
    }
    tracing::info!("Token Pulse stopped");
    Ok(())
}

/// Handle token-lists command
async fn token_lists_command(config: Config) -> Result<()> {
    let fetcher = build_fetcher(&config)?;
    let loaded = fetcher.fetch_all(&config.token_lists.sources()).await;
    let registry = TokenRegistry::from_lists(loaded.iter().map(|l| &l.list));

    for list in &loaded {
        println!(
            "{:<16} {:<9} {:>6} tokens  {}",
            list.source,
            format!("{:?}", list.origin).to_lowercase(),
            list.list.token_count(),
            list.list.name
        );
    }
    println!("Unique tokens: {}", registry.token_count());
    Ok(())
}

/// Handle price command
async fn price_command(cmd: PriceCmd, config: Config) -> Result<()> {
    let fetcher = build_fetcher(&config)?;
    let registry = if cmd.offline_lists {
        TokenRegistry::from_lists([fetcher.static_list()])
    } else {
        let loaded = fetcher.fetch_all(&config.token_lists.sources()).await;
        TokenRegistry::from_lists(loaded.iter().map(|l| &l.list))
    };

    let service = TokenPageService::new(build_sources(&config)?, Arc::new(RwLock::new(registry)))
        .with_chart_exchange(config.chart.default_exchange.clone());

    let params = TokenPageParams {
        symbol: Some(cmd.symbol.clone()),
        chain_id: cmd.chain_id,
        address: cmd.address.clone(),
        ..Default::default()
    };
    let view = service.load(&params).await;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    match view.price {
        Some(ref quote) => {
            println!("{}: ${:.6} via {:?}", cmd.symbol, quote.price_usd, quote.source);
            if let Some(change) = view.price_change_24h {
                println!("24h change: {:+.2}%", change);
            }
        }
        None => {
            for notice in &view.notices {
                let Notice::PriceUnavailable { message } = notice;
                println!("{}", message);
            }
        }
    }
    if let Some(tvl) = view.tvl {
        println!("TVL: ${:.0}", tvl);
    }
    if let Some(volume) = view.volume_24h {
        println!("24h volume: ${:.0}", volume);
    }
    if let Some(ref stock) = view.stock {
        println!("Underlying {}: ${:.2}", stock.ticker, stock.price);
    }
    if let Some(ref chart) = view.chart_symbol {
        println!("Chart: {}", chart);
    }

    Ok(())
}

/// Handle stock command
async fn stock_command(cmd: StockCmd, config: Config) -> Result<()> {
    let cache = SharedCache::new(config.cache.default_ttl(), config.cache.max_entries);
    let yahoo = YahooFinanceClient::new(YahooConfig::from(&config), cache)
        .context("Failed to create Yahoo Finance client")?;

    let quote = yahoo
        .get_quote(&cmd.ticker)
        .await
        .with_context(|| format!("Failed to get quote for {}", cmd.ticker))?;

    println!("{}: ${:.2}", quote.ticker, quote.price);
    match quote.price_change_percent {
        Some(change) => println!("Change: {:+.2}%", change),
        None => println!("Change: n/a (no previous close)"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_defaults() {
        let app = CliApp::parse_from(["token-pulse", "serve"]);
        assert!(!app.verbose);
        match app.command {
            Command::Serve(cmd) => {
                assert_eq!(cmd.config, PathBuf::from(DEFAULT_CONFIG));
                assert!(cmd.port.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_price_with_chain() {
        let app = CliApp::parse_from([
            "token-pulse",
            "price",
            "JUP",
            "--chain-id",
            "101",
            "--json",
            "--debug",
        ]);
        assert!(app.debug);
        match app.command {
            Command::Price(cmd) => {
                assert_eq!(cmd.symbol, "JUP");
                assert_eq!(cmd.chain_id, Some(101));
                assert!(cmd.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_config_path_per_command() {
        let app = CliApp::parse_from(["token-pulse", "stock", "AAPL", "-c", "local.toml"]);
        assert_eq!(app.command.config_path(), Path::new("local.toml"));
    }

    #[test]
    fn test_default_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG);
        let config = load_config(path).unwrap();
        assert!(!config.token_lists.sources.is_empty());
        assert!(build_sources(&config).is_ok());
    }
}
