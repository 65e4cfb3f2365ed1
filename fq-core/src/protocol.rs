use std::fmt;

use crate::constants::{METHOD_CURRENCY, METHOD_QUOTES};
use crate::error::{MalformedReason, ProtocolError};

/// Разобранный кадр: имя метода и аргументы по порядку
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// метод, например `alphavantage`
    pub method: String,
    /// аргументы без кавычек, всегда хотя бы один
    pub arguments: Vec<String>,
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.method)?;
        for arg in &self.arguments {
            write!(f, " \"{arg}\"")?;
        }
        f.write_str(")")
    }
}

/// Что именно просит хост
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `(alphavantage "SYM1" "SYM2" ...)`
    Quotes {
        /// тикеры в порядке запроса
        symbols: Vec<String>,
    },
    /// `(currency "TO" "FROM")`
    Currency {
        /// во что переводим
        to: String,
        /// из чего переводим
        from: String,
    },
}

impl TryFrom<Request> for Command {
    type Error = ProtocolError;

    fn try_from(req: Request) -> Result<Self, Self::Error> {
        match req.method.as_str() {
            METHOD_QUOTES => Ok(Command::Quotes {
                symbols: req.arguments,
            }),
            METHOD_CURRENCY => {
                let text = req.to_string();
                let [to, from] = <[String; 2]>::try_from(req.arguments)
                    .map_err(|_| ProtocolError::malformed(MalformedReason::Arity, text))?;
                Ok(Command::Currency { to, from })
            }
            _ => Err(ProtocolError::UnsupportedMethod(req.method)),
        }
    }
}

/// Разбирает кадр вида:
/// `(method "arg1" "arg2" ...)`
///
/// Между токенами допускаются пробелы, после метода пробел обязателен.
/// Аргумент не может быть пустым и не может содержать `"`.
pub fn parse_request(frame: &str) -> Result<Request, ProtocolError> {
    let bad = || ProtocolError::malformed(MalformedReason::Grammar, frame);

    let body = frame
        .trim_start()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(bad)?
        .trim_start();

    let method_end = body.find(char::is_whitespace).ok_or_else(bad)?;
    let (method, mut rest) = body.split_at(method_end);
    if method.is_empty() || method.contains(['"', '(', ')']) {
        return Err(bad());
    }

    let mut arguments = Vec::new();
    rest = rest.trim_start();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('"').ok_or_else(bad)?;
        let close = inner.find('"').ok_or_else(bad)?;
        let arg = &inner[..close];
        if arg.is_empty() {
            return Err(bad());
        }
        arguments.push(arg.to_string());
        rest = inner[close + 1..].trim_start();
    }

    if arguments.is_empty() {
        return Err(bad());
    }

    Ok(Request {
        method: method.to_string(),
        arguments,
    })
}

/// Разбор кадра сразу в [`Command`]
pub fn parse_command(frame: &str) -> Result<Command, ProtocolError> {
    parse_request(frame)?.try_into()
}
