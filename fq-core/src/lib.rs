//! # fq-core
//!
//! Протокол и доменные типы моста между хостом-бухгалтерией и провайдером котировок.
//!
//! Этот крейт содержит:
//!
//! - [`frame`] — сборка кадров `( ... )` из потока байт
//! - [`protocol`] — разбор кадра в запрос и команду
//! - [`types`] — доменные типы (котировка, курс)
//! - [`wire`] — форматирование ответов в association list
//! - [`error`] — типы ошибок, которые возвращают компоненты `fq-core`
//!
//! ## Пример: разбор запроса
//!
//! ```rust
//! use fq_core::protocol::{parse_command, Command};
//!
//! let cmd = parse_command(r#"(currency "USD" "EUR")"#).unwrap();
//! assert_eq!(
//!     cmd,
//!     Command::Currency { to: "USD".to_string(), from: "EUR".to_string() }
//! );
//! ```
//!
//! ## Пример: чтение кадров из потока
//!
//! ```rust
//! use fq_core::frame::FrameReader;
//! use std::io::Cursor;
//!
//! let mut reader = FrameReader::new(Cursor::new(r#"(alphavantage "VOO""VUSA.AS")"#));
//! let frame = reader.next_frame().unwrap().unwrap();
//! assert_eq!(frame.as_str(), r#"(alphavantage "VOO""VUSA.AS")"#);
//! assert!(reader.next_frame().unwrap().is_none());
//! ```
//!
//! ## Дизайн
//!
//! Здесь только чистые типы, разбор и форматирование, без сети и без
//! runtime. Всё, что ходит к провайдеру, живёт в `fq-bridge`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Сборка кадров из входного потока.
pub mod frame;

/// Разбор кадра: метод + аргументы, затем типизированная команда.
pub mod protocol;

/// Доменные типы (котировка, курс валют).
pub mod types;

/// Форматирование ответов хосту.
pub mod wire;

/// Ошибки `fq-core`.
pub mod error;

/// Константы протокола
mod constants;
pub use constants::{DEFAULT_CURRENCY, METHOD_CURRENCY, METHOD_QUOTES};

// --- Re-exports (публичный фасад API) ---

pub use crate::error::{MalformedReason, ProtocolError, QuoteCoreError};
pub use crate::frame::{Frame, FrameReader};
pub use crate::protocol::{Command, Request};
pub use crate::types::{ExchangeRate, Quote};
