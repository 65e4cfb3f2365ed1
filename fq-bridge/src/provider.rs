use std::str::FromStr;
use std::time::Duration;

use log::{info, warn};
use reqwest::Url;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use crate::backoff::{Backoff, BackoffPolicy, Pause};

/// Ошибки обращения к провайдеру. Троттлинг сюда не попадает - его пережидаем.
#[derive(Debug, Error)]
pub(crate) enum ProviderError {
    #[error("invalid provider url {url}: {reason}")]
    Url { url: String, reason: String },

    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("http status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("provider response has no {field:?} ({context})")]
    MissingField {
        field: &'static str,
        context: String,
    },

    #[error("provider field {field:?} has unexpected value {value:?}")]
    BadValue { field: &'static str, value: String },

    #[error("provider reported failure: {0}")]
    Api(String),

    #[error("currency {0} is not in the rate table")]
    UnknownCurrency(String),
}

/// Куда и как ходить: один провайдер = один `Endpoint`
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    pub(crate) name: &'static str,
    pub(crate) base_url: String,
    /// имя query-параметра с ключом
    pub(crate) key_param: &'static str,
    pub(crate) api_key: String,
    /// признаки ответа "слишком часто"; пустой список - троттлинг не распознаём
    pub(crate) throttle_markers: &'static [ThrottleMarker],
}

/// Поле ответа, означающее троттлинг. Если задан `needle`, поле считается
/// троттлингом, только когда его текст содержит эту подстроку (без учёта регистра).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ThrottleMarker {
    pub(crate) field: &'static str,
    pub(crate) needle: Option<&'static str>,
}

impl ThrottleMarker {
    fn matches<'a>(&self, body: &'a Value) -> Option<&'a Value> {
        let value = body.get(self.field)?;
        match self.needle {
            None => Some(value),
            Some(needle) => value
                .as_str()
                .filter(|text| text.to_lowercase().contains(needle))
                .map(|_| value),
        }
    }
}

/// Транспорт: GET по URL, тело ответа как текст
pub(crate) trait Transport {
    fn get(&self, url: &Url) -> Result<String, ProviderError>;
}

/// Блокирующий reqwest-клиент
#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub(crate) fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<String, ProviderError> {
        let resp = self.client.get(url.clone()).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                url: url.as_str().to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.text()?)
    }
}

/// Один вызов провайдера: параметры запроса -> JSON ответа
pub(crate) trait Provider {
    fn call(&mut self, params: &[(&str, &str)]) -> Result<Value, ProviderError>;
}

/// Клиент провайдера с ожиданием при троттлинге.
///
/// Состояние паузы живёт столько же, сколько клиент: после серии
/// троттлингов первый успешный ответ сбрасывает его к начальному значению.
pub(crate) struct ProviderClient<T, P> {
    endpoint: Endpoint,
    transport: T,
    pause: P,
    backoff: Backoff,
}

impl<T: Transport, P: Pause> ProviderClient<T, P> {
    pub(crate) fn new(endpoint: Endpoint, transport: T, pause: P, policy: BackoffPolicy) -> Self {
        Self {
            endpoint,
            transport,
            pause,
            backoff: Backoff::new(policy),
        }
    }

    fn url_with_key(&self, params: &[(&str, &str)], key: &str) -> Result<Url, ProviderError> {
        let all = params
            .iter()
            .copied()
            .chain(std::iter::once((self.endpoint.key_param, key)));
        Url::parse_with_params(&self.endpoint.base_url, all).map_err(|e| ProviderError::Url {
            url: self.endpoint.base_url.clone(),
            reason: e.to_string(),
        })
    }

    fn throttle_marker<'a>(&self, body: &'a Value) -> Option<&'a Value> {
        self.endpoint
            .throttle_markers
            .iter()
            .find_map(|marker| marker.matches(body))
    }
}

impl<T: Transport, P: Pause> Provider for ProviderClient<T, P> {
    fn call(&mut self, params: &[(&str, &str)]) -> Result<Value, ProviderError> {
        let url = self.url_with_key(params, &self.endpoint.api_key)?;
        // ключ в лог не пишем
        let shown = self.url_with_key(params, "***")?;
        let mut throttled = false;

        loop {
            info!("HTTP request ({}): {shown}", self.endpoint.name);
            let body = self.transport.get(&url)?;
            let value: Value = serde_json::from_str(&body)?;
            info!("Response: {value}");

            if let Some(marker) = self.throttle_marker(&value) {
                let delay = self.backoff.advance();
                warn!("Detected rate limiting: {marker}");
                warn!(
                    "Sleeping for {delay:?} (next wait {:?})",
                    self.backoff.current()
                );
                self.pause.pause(delay);
                throttled = true;
                continue;
            }

            if throttled {
                info!("Rate limit cleared");
                self.backoff.reset();
            }
            return Ok(value);
        }
    }
}

/// Обязательное поле-объект ответа
pub(crate) fn section<'a>(
    body: &'a Value,
    field: &'static str,
    context: &str,
) -> Result<&'a Value, ProviderError> {
    body.get(field)
        .filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
        .ok_or_else(|| ProviderError::MissingField {
            field,
            context: context.to_string(),
        })
}

/// Decimal из строки вида "432.1000" (Alpha Vantage шлёт числа строками)
pub(crate) fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal, ProviderError> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| ProviderError::BadValue {
            field,
            value: raw.to_string(),
        })
}

/// Decimal из JSON-числа или строки
pub(crate) fn json_decimal(field: &'static str, value: &Value) -> Result<Decimal, ProviderError> {
    match value {
        Value::Number(n) => parse_decimal(field, &n.to_string()),
        Value::String(s) => parse_decimal(field, s),
        other => Err(ProviderError::BadValue {
            field,
            value: other.to_string(),
        }),
    }
}


#[cfg(test)]
mod tests {
    use super::fake::*;
    use super::*;
    use serde_json::json;

    const THROTTLED: &str = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute"}"#;

    #[test]
    fn call_adds_key_and_params() {
        let transport = ScriptedTransport::new([r#"{"ok": 1}"#]);
        let pause = RecordingPause::default();
        let mut c = client(&transport, &pause);

        let v = c.call(&[("function", "GLOBAL_QUOTE"), ("symbol", "VOO")]).unwrap();
        assert_eq!(v, json!({"ok": 1}));
        assert_eq!(transport.param(0, "function").as_deref(), Some("GLOBAL_QUOTE"));
        assert_eq!(transport.param(0, "symbol").as_deref(), Some("VOO"));
        assert_eq!(transport.param(0, "apikey").as_deref(), Some("SECRET"));
        assert!(pause.delays.borrow().is_empty());
    }

    #[test]
    fn throttled_body_is_never_returned() {
        let transport = ScriptedTransport::new([THROTTLED, r#"{"Global Quote": {}}"#]);
        let pause = RecordingPause::default();
        let mut c = client(&transport, &pause);

        let v = c.call(&[("symbol", "VOO")]).unwrap();
        assert!(v.get("Note").is_none());
        assert_eq!(transport.calls(), 2);
        assert_eq!(*pause.delays.borrow(), vec![Duration::from_secs(10)]);
    }

    #[test]
    fn consecutive_throttles_double_and_success_resets() {
        let transport = ScriptedTransport::new([THROTTLED, THROTTLED, THROTTLED, "{}", THROTTLED, "{}"]);
        let pause = RecordingPause::default();
        let mut c = client(&transport, &pause);

        c.call(&[]).unwrap();
        c.call(&[]).unwrap();

        assert_eq!(
            *pause.delays.borrow(),
            vec![
                Duration::from_secs(10),
                Duration::from_secs(20),
                Duration::from_secs(40),
                Duration::from_secs(10),
            ]
        );
    }

    #[test]
    fn decode_error_is_not_retried() {
        let transport = ScriptedTransport::new(["<html>oops</html>", "{}"]);
        let pause = RecordingPause::default();
        let mut c = client(&transport, &pause);

        let err = c.call(&[]).unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn transport_error_propagates() {
        let transport = ScriptedTransport::new(Vec::<String>::new());
        let pause = RecordingPause::default();
        let mut c = client(&transport, &pause);

        assert!(matches!(c.call(&[]), Err(ProviderError::Api(_))));
    }

    #[test]
    fn information_rate_limit_is_waited_out() {
        let transport = ScriptedTransport::new([
            r#"{"Information": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."}"#,
            r#"{"Global Quote": {}}"#,
        ]);
        let pause = RecordingPause::default();
        let mut c = client(&transport, &pause);

        let v = c.call(&[("symbol", "VOO")]).unwrap();
        assert!(v.get("Global Quote").is_some());
        assert_eq!(transport.calls(), 2);
        assert_eq!(*pause.delays.borrow(), vec![Duration::from_secs(10)]);
    }

    #[test]
    fn other_information_is_returned_without_retry() {
        let transport = ScriptedTransport::new([
            r#"{"Information": "Thank you for using Alpha Vantage! This is a premium endpoint."}"#,
        ]);
        let pause = RecordingPause::default();
        let mut c = client(&transport, &pause);

        assert!(c.call(&[]).unwrap().get("Information").is_some());
        assert_eq!(transport.calls(), 1);
        assert!(pause.delays.borrow().is_empty());
    }

    #[test]
    fn endpoint_without_marker_returns_note_as_is() {
        let transport = ScriptedTransport::new([THROTTLED]);
        let pause = RecordingPause::default();
        let mut endpoint = endpoint();
        endpoint.throttle_markers = &[];
        let mut c = ProviderClient::new(endpoint, transport.clone(), pause.clone(), BackoffPolicy::default());

        assert!(c.call(&[]).unwrap().get("Note").is_some());
        assert!(pause.delays.borrow().is_empty());
    }

    #[test]
    fn bad_base_url_is_reported() {
        let transport = ScriptedTransport::new(["{}"]);
        let pause = RecordingPause::default();
        let mut endpoint = endpoint();
        endpoint.base_url = "not a url".to_string();
        let mut c = ProviderClient::new(endpoint, transport, pause, BackoffPolicy::default());

        assert!(matches!(c.call(&[]), Err(ProviderError::Url { .. })));
    }

    #[test]
    fn decimals_from_strings_and_numbers() {
        assert_eq!(parse_decimal("p", "432.1000").unwrap().to_string(), "432.1000");
        assert_eq!(json_decimal("p", &json!(0.92)).unwrap().to_string(), "0.92");
        assert_eq!(json_decimal("p", &json!(1e-7)).unwrap().to_string(), "0.0000001");
        assert_eq!(json_decimal("p", &json!("1.08")).unwrap().to_string(), "1.08");
        assert!(matches!(
            json_decimal("p", &json!(null)),
            Err(ProviderError::BadValue { .. })
        ));
        assert!(parse_decimal("p", "abc").is_err());
    }

    #[test]
    fn section_rejects_missing_and_empty() {
        let body = json!({"Global Quote": {}, "Other": {"a": 1}});
        assert!(section(&body, "Global Quote", "VOO").is_err());
        assert!(section(&body, "Missing", "VOO").is_err());
        assert!(section(&body, "Other", "x").is_ok());
    }
}
