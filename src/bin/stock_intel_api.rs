use stock_intel_api::api;
use stock_intel_api::config::Config;
use stock_intel_api::services::{reporting, StockService};
use stock_intel_api::sources::YahooSource;

use clap::{App, Arg, SubCommand};
use log::{info, error};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger
    env_logger::init();

    let app = App::new("StockIntel")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Stock data intelligence API");

    // 添加子命令
    let app = app.subcommand(
        SubCommand::with_name("serve")
            .about("Run the HTTP API")
            .arg(
                Arg::with_name("addr")
                    .short('a')
                    .long("addr")
                    .value_name("ADDR")
                    .help("Address to bind (overrides STOCK_API_ADDR)")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("timeout")
                    .short('t')
                    .long("timeout")
                    .value_name("SECS")
                    .help("Upstream fetch timeout in seconds")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("tail")
                    .long("tail")
                    .value_name("ROWS")
                    .help("Number of records returned by /data/{symbol}")
                    .takes_value(true),
            ),
    ).subcommand(
        SubCommand::with_name("inspect")
            .about("Fetch and process one symbol, then log the result")
            .arg(
                Arg::with_name("symbol")
                    .short('s')
                    .long("symbol")
                    .value_name("SYMBOL")
                    .help("Ticker symbol, e.g. INFY.NS")
                    .required(true)
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("limit")
                    .short('l')
                    .long("limit")
                    .value_name("LIMIT")
                    .help("Limit the number of records to display")
                    .takes_value(true)
                    .default_value("10"),
            ),
    );

    let matches = app.get_matches();
    let mut config = Config::from_env()?;

    if let Some(matches) = matches.subcommand_matches("serve") {
        if let Some(addr) = matches.value_of("addr") {
            config = config.with_bind_addr(addr);
        }
        if let Some(secs) = matches.value_of("timeout") {
            config = config.with_fetch_timeout(Duration::from_secs(secs.parse::<u64>()?));
        }
        if let Some(rows) = matches.value_of("tail") {
            config = config.with_tail_rows(rows.parse::<usize>()?);
        }
        config.validate()?;

        info!("Fetch timeout: {:?}, tail rows: {}", config.fetch_timeout, config.tail_rows);

        let source = YahooSource::new(&config)?;
        let service = StockService::new(config, Arc::new(source));
        if let Err(e) = api::run_server(service).await {
            error!("Server stopped: {}", e);
            return Err(e.into());
        }
    } else if let Some(matches) = matches.subcommand_matches("inspect") {
        let symbol = matches.value_of("symbol").unwrap_or_default();
        let limit = matches.value_of("limit")
            .unwrap_or("10")
            .parse::<usize>()
            .unwrap_or(10);

        let source = YahooSource::new(&config)?;
        let service = StockService::new(config, Arc::new(source));
        let table = service.load(symbol).await?;

        info!("Found {} records for {}", table.len(), symbol);
        info!("{:-<90}", "");
        info!("{:<12} {:<10} {:<10} {:<10} {:<10} {:<12} {:<10} {:<10} {:<10}",
                 "Date", "Open", "High", "Low", "Close", "Volume", "Return", "MA_7", "Vol");
        info!("{:-<90}", "");

        for record in table.tail(limit) {
            let opt = |v: Option<f64>, p: usize| v.map(|x| format!("{:.*}", p, x)).unwrap_or_else(|| "-".to_string());
            info!("{:<12} {:<10.2} {:<10} {:<10} {:<10.2} {:<12} {:<10} {:<10} {:<10}",
                     record.date.format("%Y-%m-%d").to_string(), record.open,
                     opt(record.high, 2), opt(record.low, 2), record.close,
                     record.volume.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
                     opt(record.daily_return, 4), opt(record.ma_7, 2), opt(record.volatility, 4));
        }

        if table.len() > limit {
            info!("... and {} earlier records", table.len() - limit);
        } else if table.is_empty() {
            info!("No daily data available for this symbol");
        }

        let summary = reporting::summarize(&table);
        info!("Summary: {}", serde_json::to_string(&summary)?);
    } else {
        info!("No command specified. Use --help for usage information.");
    }

    Ok(())
}
