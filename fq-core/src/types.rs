use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::fmt;

use crate::constants::{DEFAULT_CURRENCY, SUFFIX_CURRENCIES};

/// Котировка одного тикера на дату последних торгов
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// тикер как пришёл в запросе
    pub symbol: String,
    /// дата последних торгов
    pub as_of: NaiveDate,
    /// последняя цена
    pub last: Decimal,
    /// валюта котировки, см. [`currency_for_symbol`]
    pub currency: String,
}

impl Quote {
    /// Собирает котировку, валюта выводится из суффикса тикера
    pub fn new(symbol: impl Into<String>, as_of: NaiveDate, last: Decimal) -> Self {
        let symbol = symbol.into();
        let currency = currency_for_symbol(&symbol).to_string();
        Self {
            symbol,
            as_of,
            last,
            currency,
        }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.symbol, self.as_of, self.last, self.currency
        )
    }
}

/// Курс: одна единица `from` стоит `rate` единиц `to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRate {
    /// исходная валюта
    pub from: String,
    /// целевая валюта
    pub to: String,
    /// момент, на который курс актуален (без часового пояса)
    pub as_of: NaiveDateTime,
    /// множитель from -> to
    pub rate: Decimal,
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {} @ {}", self.from, self.to, self.rate, self.as_of)
    }
}

/// Валюта по суффиксу биржи: `.DE`/`.AMS`/`.AS` -> EUR, остальное USD
pub fn currency_for_symbol(symbol: &str) -> &'static str {
    SUFFIX_CURRENCIES
        .iter()
        .find(|(suffix, _)| symbol.ends_with(suffix))
        .map(|&(_, ccy)| ccy)
        .unwrap_or(DEFAULT_CURRENCY)
}
