use chrono::NaiveDate;
use fq_core::Quote;
use log::debug;
use serde::Deserialize;

use crate::provider::{Provider, ProviderError, parse_decimal, section};

const GLOBAL_QUOTE: &str = "Global Quote";

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: String,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: String,
}

/// Котировка одного тикера (GLOBAL_QUOTE)
pub(crate) fn resolve_quote<C: Provider>(client: &mut C, symbol: &str) -> Result<Quote, ProviderError> {
    let body = client.call(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])?;
    let gq = GlobalQuote::deserialize(section(&body, GLOBAL_QUOTE, symbol)?)?;

    let as_of = NaiveDate::parse_from_str(gq.latest_trading_day.trim(), "%Y-%m-%d").map_err(|_| {
        ProviderError::BadValue {
            field: "07. latest trading day",
            value: gq.latest_trading_day.clone(),
        }
    })?;
    let last = parse_decimal("05. price", &gq.price)?;

    let quote = Quote::new(symbol, as_of, last);
    debug!("resolved {quote}");
    Ok(quote)
}

/// Пакет котировок: по одному вызову на тикер, порядок сохраняется.
/// Первая же ошибка отменяет весь пакет - частичный ответ хосту не выразить.
pub(crate) fn resolve_quotes<C: Provider>(
    client: &mut C,
    symbols: &[String],
) -> Result<Vec<Quote>, ProviderError> {
    symbols
        .iter()
        .map(|s| resolve_quote(client, s))
        .collect()
}
