use std::io;

use fq_core::wire::{render_exchange_rate, render_quotes};
use fq_core::{Command, ExchangeRate, ProtocolError, Quote, QuoteCoreError};
use log::info;
use thiserror::Error;

use crate::currency::{DailyTableResolver, resolve_direct};
use crate::provider::{Provider, ProviderError};
use crate::quotes::resolve_quotes;

/// Всё, что может оборвать сессию
#[derive(Debug, Error)]
pub(crate) enum BridgeError {
    #[error(transparent)]
    Input(#[from] QuoteCoreError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("failed to write response: {0}")]
    Output(#[source] io::Error),
}

/// Источник курсов валют
pub(crate) enum RateSource<C> {
    /// тот же клиент Alpha Vantage, что и для котировок
    Alphavantage,
    DailyTable(DailyTableResolver<C>),
}

/// Ответ до сериализации
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Response {
    Quotes(Vec<Quote>),
    Rate(ExchangeRate),
}

impl Response {
    pub(crate) fn render(&self) -> String {
        match self {
            Response::Quotes(quotes) => render_quotes(quotes),
            Response::Rate(rate) => render_exchange_rate(rate),
        }
    }
}

/// Команда -> вызовы провайдера -> доменные значения
pub(crate) struct Dispatcher<C> {
    alphavantage: C,
    rates: RateSource<C>,
}

impl<C: Provider> Dispatcher<C> {
    pub(crate) fn new(alphavantage: C, rates: RateSource<C>) -> Self {
        Self {
            alphavantage,
            rates,
        }
    }

    pub(crate) fn dispatch(&mut self, cmd: Command) -> Result<Response, BridgeError> {
        match cmd {
            Command::Quotes { symbols } => {
                info!("Quotes for {}", symbols.join(","));
                let quotes = resolve_quotes(&mut self.alphavantage, &symbols)?;
                Ok(Response::Quotes(quotes))
            }
            Command::Currency { to, from } => {
                info!("Exchange rate {from}->{to}");
                let rate = match &mut self.rates {
                    RateSource::Alphavantage => resolve_direct(&mut self.alphavantage, &to, &from)?,
                    RateSource::DailyTable(resolver) => resolver.resolve(&to, &from)?,
                };
                Ok(Response::Rate(rate))
            }
        }
    }
}
