use std::time::Duration;

use crate::backoff::BackoffPolicy;
use crate::cli::Args;
use crate::provider::{Endpoint, ThrottleMarker};

pub(crate) const ALPHAVANTAGE_URL: &str = "https://www.alphavantage.co/query";
pub(crate) const EXCHANGERATE_URL: &str = "http://api.exchangerate.host/historical";

/// Признаки превышения лимита у Alpha Vantage: старый ответ кладёт `Note`,
/// нынешний - `Information`. В `Information` приходят и другие сообщения
/// (premium endpoint, неверный ключ), их не пережидаем.
pub(crate) const ALPHAVANTAGE_THROTTLE_MARKERS: &[ThrottleMarker] = &[
    ThrottleMarker { field: "Note", needle: None },
    ThrottleMarker { field: "Information", needle: Some("rate limit") },
];

pub(crate) const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(DEFAULT_INITIAL_BACKOFF_S);
pub(crate) const DEFAULT_INITIAL_BACKOFF_S: u64 = 10;
pub(crate) const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

pub(crate) const DEFAULT_HTTP_TIMEOUT_S: u64 = 30;

pub(crate) fn backoff_policy(args: &Args) -> BackoffPolicy {
    BackoffPolicy {
        initial: Duration::from_secs(args.initial_backoff_secs),
        multiplier: args.backoff_multiplier,
        ceiling: args.max_backoff_secs.map(Duration::from_secs),
    }
}

pub(crate) fn alphavantage_endpoint(args: &Args) -> Endpoint {
    Endpoint {
        name: "alphavantage",
        base_url: args.alphavantage_url.clone(),
        key_param: "apikey",
        api_key: args.alphavantage_api_key.clone(),
        throttle_markers: ALPHAVANTAGE_THROTTLE_MARKERS,
    }
}

/// `None`, если ключ exchangerate.host не задан
pub(crate) fn exchangerate_endpoint(args: &Args) -> Option<Endpoint> {
    let api_key = args.exchangerate_api_key.clone()?;
    Some(Endpoint {
        name: "exchangerate.host",
        base_url: args.exchangerate_url.clone(),
        key_param: "access_key",
        api_key,
        throttle_markers: &[],
    })
}
