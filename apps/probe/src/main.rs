//! Quoteline probe: run one market data query through the provider manager
//! and print the response envelope as JSON.
//!
//! Providers and manager behavior are configured through environment
//! variables (see `quoteline_market_data::factory`); a `.env` file in the
//! working directory is loaded first.
//!
//! ```bash
//! quoteline-probe quote AAPL MSFT
//! quoteline-probe history AAPL --period 3mo
//! quoteline-probe news --limit 5
//! QUOTELINE_LOG_FORMAT=json RUST_LOG=debug quoteline-probe health
//! ```

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use quoteline_market_data::{
    build_manager, CompanyProfileRequest, CorporateActionsRequest, DateRange,
    HistoricalDataRequest, HistoricalPeriod, MarketDataError, NewsRequest, ProviderManager,
    QuotesRequest, SearchRequest,
};

#[derive(Debug, Parser)]
#[command(
    name = "quoteline-probe",
    version,
    about = "Query market data through the Quoteline provider manager"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Latest quotes for one or more symbols
    Quote {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Daily price history
    History {
        symbol: String,
        /// Lookback period (1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max)
        #[arg(long, default_value = "1mo")]
        period: HistoricalPeriod,
        /// Explicit start date (YYYY-MM-DD); overrides the period
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Explicit end date (YYYY-MM-DD), defaults to today
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
    /// Company profile
    Profile { symbol: String },
    /// Dividend history
    Dividends(CorporateActionArgs),
    /// Split history
    Splits(CorporateActionArgs),
    /// Earnings reports
    Earnings(CorporateActionArgs),
    /// Market or company news; no symbols means general news
    News {
        symbols: Vec<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Symbol search
    Search {
        query: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Probe every configured provider and print health and cache state
    Health,
}

#[derive(Debug, Args)]
struct CorporateActionArgs {
    symbol: String,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,
}

impl CorporateActionArgs {
    fn into_request(self) -> anyhow::Result<CorporateActionsRequest> {
        let request = CorporateActionsRequest::new(&self.symbol)?;
        Ok(match date_range(self.from, self.to)? {
            Some(range) => request.with_date_range(range),
            None => request,
        })
    }
}

fn date_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Option<DateRange>, MarketDataError> {
    match from {
        Some(start) => {
            let end = to.unwrap_or_else(|| Utc::now().date_naive());
            DateRange::new(start, end).map(Some)
        }
        None => Ok(None),
    }
}

fn init_tracing() {
    let log_format =
        std::env::var("QUOTELINE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render response")?;
    println!("{}", rendered);
    Ok(())
}

async fn run(manager: &ProviderManager, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Quote { symbols } => {
            let request = QuotesRequest::new(&symbols)?;
            print_json(&manager.get_quotes(&request).await?)
        }
        Command::History {
            symbol,
            period,
            from,
            to,
        } => {
            let mut request = HistoricalDataRequest::new(&symbol, period)?;
            if let Some(range) = date_range(from, to)? {
                request = request.with_date_range(range);
            }
            print_json(&manager.get_historical_data(&request).await?)
        }
        Command::Profile { symbol } => {
            let request = CompanyProfileRequest::new(&symbol)?;
            print_json(&manager.get_company_profile(&request).await?)
        }
        Command::Dividends(args) => {
            print_json(&manager.get_dividends(&args.into_request()?).await?)
        }
        Command::Splits(args) => print_json(&manager.get_splits(&args.into_request()?).await?),
        Command::Earnings(args) => {
            print_json(&manager.get_earnings(&args.into_request()?).await?)
        }
        Command::News { symbols, limit } => {
            let mut request = NewsRequest::for_symbols(&symbols)?;
            if let Some(limit) = limit {
                request = request.with_limit(limit)?;
            }
            print_json(&manager.get_news(&request).await?)
        }
        Command::Search { query, limit } => {
            let mut request = SearchRequest::new(&query)?;
            if let Some(limit) = limit {
                request = request.with_limit(limit)?;
            }
            print_json(&manager.search(&request).await?)
        }
        Command::Health => {
            let checks = manager.check_all_providers_health().await;
            tracing::info!("Health check complete for {} providers", checks.len());
            print_json(&serde_json::json!({
                "order": manager.provider_order(),
                "health": manager.get_provider_health(),
                "cache": manager.get_cache_stats(),
            }))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let manager = build_manager().context("failed to build provider manager")?;

    let outcome = run(&manager, cli.command).await;
    manager.destroy();

    if let Err(err) = &outcome {
        if let Some(market_err) = err.downcast_ref::<MarketDataError>() {
            tracing::error!(
                code = market_err.code(),
                provider = market_err.provider().unwrap_or("-"),
                "Query failed: {}",
                market_err
            );
        }
    }
    outcome
}
