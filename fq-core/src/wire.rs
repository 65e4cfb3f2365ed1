//! Ответы хосту в виде association list.
//!
//! Числа пишем через `Display` у `Decimal`: он никогда не уходит в
//! экспоненциальную запись, так что точность цены доходит до хоста как есть.

use std::fmt::Write;

use crate::constants::QUOTE_WALL_CLOCK;
use crate::types::{ExchangeRate, Quote};

const RATE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn render_record(out: &mut String, symbol: &str, time: &str, last: &str, currency: &str) {
    // запись в String не падает
    let _ = write!(
        out,
        "(\"{symbol}\" (symbol . \"{symbol}\") (gnc:time-no-zone . \"{time}\") (last . {last}) (currency . \"{currency}\"))"
    );
}

/// Пакет котировок:
/// `(("SYM" (symbol . "SYM") (gnc:time-no-zone . "YYYY-MM-DD 12:00:00") (last . N) (currency . "CCY")) ...)`
pub fn render_quotes(quotes: &[Quote]) -> String {
    let mut out = String::from("(");
    for (i, q) in quotes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let time = format!("{} {QUOTE_WALL_CLOCK}", q.as_of.format("%Y-%m-%d"));
        render_record(
            &mut out,
            &q.symbol,
            &time,
            &q.last.to_string(),
            &q.currency,
        );
    }
    out.push(')');
    out
}

/// Курс - список из одной записи, `symbol` = исходная валюта, `currency` = целевая
pub fn render_exchange_rate(rate: &ExchangeRate) -> String {
    let mut out = String::from("(");
    let time = rate.as_of.format(RATE_TIMESTAMP_FORMAT).to_string();
    render_record(
        &mut out,
        &rate.from,
        &time,
        &rate.rate.to_string(),
        &rate.to,
    );
    out.push(')');
    out
}
