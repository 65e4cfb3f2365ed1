use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use fq_core::ExchangeRate;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::provider::{Provider, ProviderError, json_decimal, parse_decimal, section};

const REALTIME_RATE: &str = "Realtime Currency Exchange Rate";

#[derive(Debug, Deserialize)]
struct RealtimeRate {
    #[serde(rename = "5. Exchange Rate")]
    rate: String,
    #[serde(rename = "6. Last Refreshed")]
    last_refreshed: String,
}

/// Прямой курс пары из Alpha Vantage (CURRENCY_EXCHANGE_RATE)
pub(crate) fn resolve_direct<C: Provider>(
    client: &mut C,
    to: &str,
    from: &str,
) -> Result<ExchangeRate, ProviderError> {
    let body = client.call(&[
        ("function", "CURRENCY_EXCHANGE_RATE"),
        ("from_currency", from),
        ("to_currency", to),
    ])?;
    let context = format!("{from}->{to}");
    let rr = RealtimeRate::deserialize(section(&body, REALTIME_RATE, &context)?)?;

    let as_of = NaiveDateTime::parse_from_str(rr.last_refreshed.trim(), "%Y-%m-%d %H:%M:%S")
        .map_err(|_| ProviderError::BadValue {
            field: "6. Last Refreshed",
            value: rr.last_refreshed.clone(),
        })?;
    let rate = parse_decimal("5. Exchange Rate", &rr.rate)?;

    Ok(ExchangeRate {
        from: from.to_string(),
        to: to.to_string(),
        as_of,
        rate,
    })
}

/// Дневная таблица курсов к опорной валюте (exchangerate.host historical)
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RateTable {
    /// опорная валюта, например USD
    source: String,
    date: NaiveDate,
    /// CCY -> сколько CCY за одну единицу `source`
    per_source: HashMap<String, Decimal>,
}

impl RateTable {
    pub(crate) fn from_json(body: &Value) -> Result<Self, ProviderError> {
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            let info = body
                .get("error")
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(ProviderError::Api(info));
        }

        let source = body
            .get("source")
            .and_then(Value::as_str)
            .ok_or(ProviderError::MissingField {
                field: "source",
                context: "rate table".to_string(),
            })?
            .to_string();

        let raw_date = body
            .get("date")
            .and_then(Value::as_str)
            .ok_or(ProviderError::MissingField {
                field: "date",
                context: "rate table".to_string(),
            })?;
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            ProviderError::BadValue {
                field: "date",
                value: raw_date.to_string(),
            }
        })?;

        let quotes = section(body, "quotes", "rate table")?
            .as_object()
            .ok_or(ProviderError::MissingField {
                field: "quotes",
                context: "rate table".to_string(),
            })?;

        let mut per_source = HashMap::with_capacity(quotes.len() + 1);
        for (pair, value) in quotes {
            // ключи вида "USDEUR": опорная валюта + целевая
            let Some(ccy) = pair.strip_prefix(source.as_str()) else {
                continue;
            };
            // одна битая запись не должна ломать всю таблицу
            match json_decimal("quotes", value) {
                Ok(rate) => {
                    per_source.insert(ccy.to_string(), rate);
                }
                Err(e) => warn!("Skipping rate {pair}: {e}"),
            }
        }
        per_source.insert(source.clone(), Decimal::ONE);

        Ok(Self {
            source,
            date,
            per_source,
        })
    }

    /// Сколько `to` стоит одна единица `from`
    pub(crate) fn rate(&self, to: &str, from: &str) -> Result<Decimal, ProviderError> {
        let lookup = |ccy: &str| {
            self.per_source
                .get(ccy)
                .copied()
                .ok_or_else(|| ProviderError::UnknownCurrency(ccy.to_string()))
        };
        let to_per_source = lookup(to)?;
        let from_per_source = lookup(from)?;

        to_per_source
            .checked_div(from_per_source)
            .map(|r| r.normalize())
            .ok_or_else(|| ProviderError::BadValue {
                field: "quotes",
                value: format!("{}{from}={from_per_source}", self.source),
            })
    }

    pub(crate) fn as_of(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN)
    }
}

/// Кэш дневной таблицы на время жизни процесса.
///
/// Таблица действительна до конца календарного дня, в который её загрузили.
/// Владелец - [`DailyTableResolver`], доступ только через `&mut`.
#[derive(Debug, Default)]
pub(crate) struct DailyRateCache {
    entry: Option<(NaiveDate, RateTable)>,
}

impl DailyRateCache {
    /// Таблица на `today`: из кэша, если она загружена сегодня, иначе через `load`.
    /// Вчерашняя таблица выбрасывается до загрузки, даже если `load` упадёт.
    pub(crate) fn get_or_load<E>(
        &mut self,
        today: NaiveDate,
        load: impl FnOnce() -> Result<RateTable, E>,
    ) -> Result<&RateTable, E> {
        let entry = match self.entry.take() {
            Some((day, table)) if day == today => {
                debug!("using cached exchange rates for {today}");
                (day, table)
            }
            _ => (today, load()?),
        };
        Ok(&self.entry.insert(entry).1)
    }
}

/// Курс через дневную таблицу: один запрос к провайдеру в день
pub(crate) struct DailyTableResolver<C> {
    client: C,
    cache: DailyRateCache,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl<C: Provider> DailyTableResolver<C> {
    pub(crate) fn new(client: C, cache: DailyRateCache) -> Self {
        Self::with_clock(client, cache, local_today)
    }

    pub(crate) fn with_clock(client: C, cache: DailyRateCache, today: fn() -> NaiveDate) -> Self {
        Self {
            client,
            cache,
            today,
        }
    }

    fn table(&mut self) -> Result<&RateTable, ProviderError> {
        let today = (self.today)();
        let client = &mut self.client;
        self.cache.get_or_load(today, || {
            let date = today.format("%Y-%m-%d").to_string();
            let body = client.call(&[("date", date.as_str())])?;
            let table = RateTable::from_json(&body)?;
            info!(
                "Exchange rates for {} loaded: {} currencies against {}",
                table.date,
                table.per_source.len(),
                table.source
            );
            Ok(table)
        })
    }

    pub(crate) fn resolve(&mut self, to: &str, from: &str) -> Result<ExchangeRate, ProviderError> {
        let table = self.table()?;
        Ok(ExchangeRate {
            from: from.to_string(),
            to: to.to_string(),
            as_of: table.as_of(),
            rate: table.rate(to, from)?,
        })
    }
}
