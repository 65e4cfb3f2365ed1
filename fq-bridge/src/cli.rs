use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};

use crate::config;

/// Откуда брать курсы валют
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RateSourceKind {
    /// прямой курс пары из Alpha Vantage (CURRENCY_EXCHANGE_RATE)
    Alphavantage,
    /// дневная таблица exchangerate.host, кэшируется до конца дня
    ExchangerateHost,
}

/// fq-bridge - читает запросы `(alphavantage "SYM" ...)` / `(currency "TO" "FROM")`
/// со stdin и отвечает котировками в stdout.
///
/// Диагностика пишется в stderr (уровень через RUST_LOG, по умолчанию info).
#[derive(Parser, Debug, Clone)]
#[command(name = "fq-bridge", version, about)]
pub(crate) struct Args {
    /// Ключ Alpha Vantage
    #[arg(long, env = "ALPHAVANTAGE_API_KEY", hide_env_values = true)]
    pub(crate) alphavantage_api_key: String,

    /// Ключ exchangerate.host, нужен только для --rate-source exchangerate-host
    #[arg(long, env = "EXCHANGERATE_API_KEY", hide_env_values = true)]
    pub(crate) exchangerate_api_key: Option<String>,

    /// Источник курсов валют
    #[arg(long, value_enum, default_value_t = RateSourceKind::Alphavantage)]
    pub(crate) rate_source: RateSourceKind,

    /// Базовый URL Alpha Vantage
    #[arg(long, default_value = config::ALPHAVANTAGE_URL)]
    pub(crate) alphavantage_url: String,

    /// Базовый URL exchangerate.host (historical)
    #[arg(long, default_value = config::EXCHANGERATE_URL)]
    pub(crate) exchangerate_url: String,

    /// Первая пауза при троттлинге, секунды
    #[arg(long, default_value_t = config::DEFAULT_INITIAL_BACKOFF_S)]
    pub(crate) initial_backoff_secs: u64,

    /// Во сколько раз растёт пауза после каждого троттлинга подряд
    #[arg(long, default_value_t = config::DEFAULT_BACKOFF_MULTIPLIER)]
    pub(crate) backoff_multiplier: f64,

    /// Потолок паузы, секунды. Без него ждём сколько угодно
    #[arg(long)]
    pub(crate) max_backoff_secs: Option<u64>,

    /// Таймаут одного HTTP запроса, секунды
    #[arg(long, default_value_t = config::DEFAULT_HTTP_TIMEOUT_S)]
    pub(crate) http_timeout_secs: u64,
}

impl Args {
    /// Проверки, которые clap сам не делает
    pub(crate) fn validate(&self) -> Result<()> {
        if self.alphavantage_api_key.trim().is_empty() {
            bail!("--alphavantage-api-key is empty");
        }
        if !(self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0) {
            bail!(
                "--backoff-multiplier must be >= 1 (got: {})",
                self.backoff_multiplier
            );
        }
        if self.initial_backoff_secs == 0 {
            bail!("--initial-backoff-secs must be positive");
        }
        if let Some(cap) = self.max_backoff_secs.filter(|&cap| cap < self.initial_backoff_secs) {
            bail!(
                "--max-backoff-secs ({cap}) is below --initial-backoff-secs ({})",
                self.initial_backoff_secs
            );
        }
        if self.http_timeout_secs == 0 {
            bail!("--http-timeout-secs must be positive");
        }
        if self.rate_source == RateSourceKind::ExchangerateHost
            && self
                .exchangerate_api_key
                .as_deref()
                .is_none_or(|k| k.trim().is_empty())
        {
            bail!("--rate-source exchangerate-host requires --exchangerate-api-key");
        }
        Ok(())
    }
}
