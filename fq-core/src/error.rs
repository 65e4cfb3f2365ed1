use thiserror::Error;

/// Верхнеуровневый тип ошибок крейта
#[derive(Debug, Error)]
pub enum QuoteCoreError {
    /// Ошибки протокола
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Ошибка чтения входного потока
    #[error("input stream error: {0}")]
    Io(#[from] std::io::Error),
}

/// Почему запрос признан некорректным
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// Текст не соответствует грамматике запроса
    Grammar,
    /// Поток закончился посреди запроса
    Unterminated,
    /// Байты запроса не являются UTF-8
    NotUtf8,
    /// Неверное число аргументов для метода
    Arity,
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MalformedReason::Grammar => "does not match request grammar",
            MalformedReason::Unterminated => "unterminated frame at end of stream",
            MalformedReason::NotUtf8 => "frame is not valid UTF-8",
            MalformedReason::Arity => "wrong number of arguments",
        };
        f.write_str(s)
    }
}

/// Ошибки протокола
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Запрос не разобран; `text` - исходный текст кадра
    #[error("malformed request ({reason}): {text:?}")]
    MalformedRequest {
        /// причина
        reason: MalformedReason,
        /// текст кадра как есть
        text: String,
    },

    /// Неизвестный метод
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
}

impl ProtocolError {
    pub(crate) fn malformed(reason: MalformedReason, text: impl Into<String>) -> Self {
        ProtocolError::MalformedRequest {
            reason,
            text: text.into(),
        }
    }
}
