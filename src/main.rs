use analytics::{HistoryFilter, HistorySort, parse_price};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use configuration::Config;
use core_types::{TradeId, UserContext, UserId};
use database::{MemoryRepository, PgRepository, TradeRepository, connect, run_migrations};
use journal::{Journal, TradeForm};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod render;
mod telemetry;

/// The main entry point for the Tradebook journal.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the variables may come from the shell.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = configuration::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let _log_guard = telemetry::init(&config.logging)?;

    let repository: Arc<dyn TradeRepository> = match open_database(&config).await? {
        Some(repository) => Arc::new(repository),
        None if cli.command.reads_saved_trades() => anyhow::bail!(
            "`{}` reads saved trades, but no database is configured. \
             Set database.url in the config file or DATABASE_URL.",
            cli.command.name()
        ),
        None => {
            tracing::warn!("No database configured; this trade is not saved (dry run).");
            Arc::new(MemoryRepository::new())
        }
    };
    let journal = Journal::new(repository, &config);
    let ctx = UserContext::new(UserId::new(cli.user));

    run(cli.command, &journal, &ctx, cli.json).await
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A trading journal: record trades, close them, and review your performance.
///
/// Trades are stored in PostgreSQL (database.url or DATABASE_URL). Without a
/// database only `add` works, as a dry run that validates and prints the trade.
#[derive(Parser)]
#[command(author, version, about, long_about)]
struct Cli {
    /// Path to a TOML configuration file. Defaults to ./tradebook.toml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// The user whose journal is read and written.
    #[arg(long, env = "TRADEBOOK_USER")]
    user: String,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new active trade.
    Add(TradeArgs),
    /// Replace the details of an active trade.
    Edit {
        id: TradeId,
        #[command(flatten)]
        trade: TradeArgs,
    },
    /// Close an active trade and book its P&L.
    Close {
        id: TradeId,
        /// The price the position was exited at.
        #[arg(long)]
        exit: String,
    },
    /// List active trades with unrealized P&L.
    Active {
        /// Current price for a ticker, as TICKER=PRICE. Repeatable.
        #[arg(long = "price", value_parser = parse_quote)]
        prices: Vec<(String, Decimal)>,
    },
    /// List closed trades.
    History {
        #[arg(long, default_value_t = HistoryFilter::All)]
        filter: HistoryFilter,
        #[arg(long, default_value_t = HistorySort::Date)]
        sort: HistorySort,
    },
    /// Show aggregate performance statistics.
    Stats,
    /// Show realized P&L per month.
    Monthly,
}

#[derive(Args)]
struct TradeArgs {
    /// The instrument, e.g. "BTCUSDT".
    #[arg(long)]
    ticker: String,

    /// "long" or "short".
    #[arg(long)]
    direction: String,

    /// An entry fill price. Repeat for scaled entries.
    #[arg(long = "entry", required = true)]
    entries: Vec<String>,

    #[arg(long)]
    stop_loss: Option<String>,

    /// A take-profit target. Repeatable; the first one sets the risk/reward.
    #[arg(long = "take-profit")]
    take_profits: Vec<String>,

    #[arg(long)]
    quantity: Option<String>,

    /// Capital committed to the position.
    #[arg(long)]
    cost: Option<String>,

    /// Leverage as "a:b", e.g. "1:10".
    #[arg(long)]
    leverage: Option<String>,

    /// Chart timeframe of the setup, e.g. "4h".
    #[arg(long)]
    timeframe: Option<String>,

    /// The trade date (format: YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    notes: Option<String>,

    /// A confluence indicator, e.g. "fib" or "stoch-rsi". Repeatable.
    #[arg(long = "indicator")]
    indicators: Vec<String>,
}

impl From<TradeArgs> for TradeForm {
    fn from(args: TradeArgs) -> Self {
        TradeForm {
            ticker: args.ticker,
            direction: args.direction,
            timeframe: args.timeframe,
            trade_date: args.date,
            entry_prices: args.entries,
            stop_loss: args.stop_loss,
            take_profits: args.take_profits,
            quantity: args.quantity,
            cost: args.cost,
            leverage: args.leverage,
            notes: args.notes,
            indicators: args.indicators,
        }
    }
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Add(_) => "add",
            Commands::Edit { .. } => "edit",
            Commands::Close { .. } => "close",
            Commands::Active { .. } => "active",
            Commands::History { .. } => "history",
            Commands::Stats => "stats",
            Commands::Monthly => "monthly",
        }
    }

    /// Whether the command only makes sense against trades saved earlier.
    fn reads_saved_trades(&self) -> bool {
        !matches!(self, Commands::Add(_))
    }
}

fn parse_quote(s: &str) -> Result<(String, Decimal), String> {
    let (ticker, price) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TICKER=PRICE, got '{s}'"))?;
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(format!("missing ticker in '{s}'"));
    }
    let price = parse_price(price).ok_or_else(|| format!("'{}' is not a price", price.trim()))?;
    Ok((ticker.to_uppercase(), price))
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Connects to PostgreSQL when a database URL is configured.
async fn open_database(config: &Config) -> anyhow::Result<Option<PgRepository>> {
    let Some(url) = config.database.resolved_url() else {
        return Ok(None);
    };
    let pool = connect(
        &url,
        config.database.max_connections,
        Duration::from_secs(config.database.acquire_timeout_secs),
    )
    .await
    .context("Failed to connect to the database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(Some(PgRepository::new(pool)))
}

async fn run(
    command: Commands,
    journal: &Journal,
    ctx: &UserContext,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        Commands::Add(args) => {
            let trade = journal.create_trade(ctx, args.into()).await?;
            emit(json, &trade, || render::trade(&trade))
        }
        Commands::Edit { id, trade } => {
            let trade = journal.edit_trade(ctx, id, trade.into()).await?;
            emit(json, &trade, || render::trade(&trade))
        }
        Commands::Close { id, exit } => {
            let trade = journal.close_trade(ctx, id, &exit).await?;
            emit(json, &trade, || render::trade(&trade))
        }
        Commands::Active { prices } => {
            let prices: HashMap<String, Decimal> = prices.into_iter().collect();
            let positions = journal.open_positions(ctx, &prices).await?;
            if positions.is_empty() && !json {
                println!("No active trades.");
                return Ok(());
            }
            emit(json, &positions, || render::positions(&positions))
        }
        Commands::History { filter, sort } => {
            let history = journal.history(ctx, filter, sort).await?;
            if json {
                return emit(json, &history, || render::history(&history));
            }
            println!("{}", render::history_summary(&history.stats));
            if history.trades.is_empty() {
                println!("No closed trades match '{filter}'.");
                return Ok(());
            }
            println!("{}", render::history(&history));
            Ok(())
        }
        Commands::Stats => {
            let dashboard = journal.dashboard(ctx).await?;
            emit(json, &dashboard.stats, || render::stats(&dashboard.stats))
        }
        Commands::Monthly => {
            let dashboard = journal.dashboard(ctx).await?;
            if dashboard.monthly.is_empty() && !json {
                println!("No closed trades yet.");
                return Ok(());
            }
            emit(json, &dashboard.monthly, || render::monthly(&dashboard.monthly))
        }
    }
}

fn emit<T: Serialize>(
    json: bool,
    value: &T,
    table: impl FnOnce() -> comfy_table::Table,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", table());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn only_add_runs_without_saved_trades() {
        let add = parse(&[
            "tradebook", "--user", "alice", "add", "--ticker", "BTC", "--direction", "long",
            "--entry", "100",
        ]);
        assert!(!add.command.reads_saved_trades());

        for args in [
            vec!["tradebook", "--user", "alice", "stats"],
            vec!["tradebook", "--user", "alice", "monthly"],
            vec!["tradebook", "--user", "alice", "history", "--filter", "winning"],
            vec!["tradebook", "--user", "alice", "active", "--price", "btc=101"],
        ] {
            let cli = parse(&args);
            assert!(cli.command.reads_saved_trades(), "{}", cli.command.name());
        }
    }

    #[test]
    fn price_quotes_parse_as_ticker_and_decimal() {
        assert_eq!(
            parse_quote("btc = 101.5"),
            Ok(("BTC".to_string(), Decimal::new(1015, 1)))
        );
        assert!(parse_quote("101.5").is_err());
        assert!(parse_quote("=101.5").is_err());
        assert!(parse_quote("BTC=soon").is_err());
    }
}
