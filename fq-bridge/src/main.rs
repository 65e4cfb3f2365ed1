//! Точка входа `fq-bridge`.
//!
//! Жизненный цикл:
//! - парсинг CLI (ключи провайдеров берутся из окружения один раз)
//! - сборка HTTP-клиента и источника курсов
//! - цикл сессии на stdin/stdout до конца входного потока
//! - любая ошибка: пишем в stderr и выходим с кодом 1

mod backoff;
mod cli;
mod config;
mod currency;
mod dispatch;
mod provider;
mod quotes;
mod session;

use std::io;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::{error, info};

use crate::backoff::ThreadSleep;
use crate::cli::RateSourceKind;
use crate::currency::{DailyRateCache, DailyTableResolver};
use crate::dispatch::{Dispatcher, RateSource};
use crate::provider::{HttpTransport, ProviderClient};

fn main() {
    // stderr - диагностический поток, хост его не читает
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    args.validate()?;

    let policy = config::backoff_policy(&args);
    let transport = HttpTransport::new(Duration::from_secs(args.http_timeout_secs))
        .context("build HTTP client")?;

    let alphavantage = ProviderClient::new(
        config::alphavantage_endpoint(&args),
        transport.clone(),
        ThreadSleep,
        policy.clone(),
    );

    let rates = match args.rate_source {
        RateSourceKind::Alphavantage => RateSource::Alphavantage,
        RateSourceKind::ExchangerateHost => {
            let endpoint = config::exchangerate_endpoint(&args)
                .context("exchangerate.host source selected without an API key")?;
            let client = ProviderClient::new(endpoint, transport, ThreadSleep, policy);
            RateSource::DailyTable(DailyTableResolver::new(client, DailyRateCache::default()))
        }
    };

    info!(
        "Starting fq-bridge: rate_source={:?}, alphavantage={}",
        args.rate_source, args.alphavantage_url
    );

    let mut dispatcher = Dispatcher::new(alphavantage, rates);
    let stdin = io::stdin();
    let stdout = io::stdout();

    session::run_session(stdin.lock(), stdout.lock(), &mut dispatcher).context("session failed")?;

    Ok(())
}
