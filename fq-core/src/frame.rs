use std::fmt;
use std::io::{self, Read};

use crate::constants::{FRAME_CLOSE, FRAME_OPEN};
use crate::error::{MalformedReason, ProtocolError, QuoteCoreError};

/// Один полный кадр запроса: от `(` до первой `)` включительно
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(String);

impl Frame {
    /// Текст кадра
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Результат подачи очередного байта в [`FrameDecoder`]
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    /// кадр ещё не закончен
    Incomplete,
    /// кадр закончен, буфер сброшен
    Complete(Frame),
    /// кадр уже не может стать корректным
    Invalid(ProtocolError),
}

/// Инкрементальный сборщик кадров.
///
/// Кадр завершается в момент прочтения `)`, без заглядывания вперёд.
/// Пробелы между кадрами пропускаются. Ошибку сообщаем сразу, как только
/// скобки уже не могут сойтись: мусор до `(` или вторая `(` вне кавычек.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    opened: bool,
    in_quotes: bool,
}

impl FrameDecoder {
    /// Пустой декодер
    pub fn new() -> Self {
        Self::default()
    }

    /// Подать следующий байт потока
    pub fn push(&mut self, byte: u8) -> Decoded {
        if !self.opened {
            if byte.is_ascii_whitespace() {
                return Decoded::Incomplete;
            }
            self.buf.push(byte);
            if byte != FRAME_OPEN {
                return self.reject(MalformedReason::Grammar);
            }
            self.opened = true;
            return Decoded::Incomplete;
        }

        self.buf.push(byte);

        match byte {
            FRAME_CLOSE => {
                let bytes = self.take();
                match String::from_utf8(bytes) {
                    Ok(text) => Decoded::Complete(Frame(text)),
                    Err(e) => Decoded::Invalid(ProtocolError::malformed(
                        MalformedReason::NotUtf8,
                        String::from_utf8_lossy(e.as_bytes()),
                    )),
                }
            }
            b'"' => {
                self.in_quotes = !self.in_quotes;
                Decoded::Incomplete
            }
            FRAME_OPEN if !self.in_quotes => self.reject(MalformedReason::Grammar),
            _ => Decoded::Incomplete,
        }
    }

    /// Конец потока: недочитанный кадр - ошибка, а не тихий сброс
    pub fn finish(&mut self) -> Result<(), ProtocolError> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let bytes = self.take();
        Err(ProtocolError::malformed(
            MalformedReason::Unterminated,
            String::from_utf8_lossy(&bytes),
        ))
    }

    fn reject(&mut self, reason: MalformedReason) -> Decoded {
        let bytes = self.take();
        Decoded::Invalid(ProtocolError::malformed(
            reason,
            String::from_utf8_lossy(&bytes),
        ))
    }

    fn take(&mut self) -> Vec<u8> {
        self.opened = false;
        self.in_quotes = false;
        std::mem::take(&mut self.buf)
    }
}

/// Читает кадры из потока по одному байту
pub struct FrameReader<R: Read> {
    bytes: io::Bytes<R>,
    decoder: FrameDecoder,
}

impl<R: Read> FrameReader<R> {
    /// Обернуть поток (обычно `BufReader<Stdin>`)
    pub fn new(reader: R) -> Self {
        Self {
            bytes: reader.bytes(),
            decoder: FrameDecoder::new(),
        }
    }

    /// Следующий кадр.
    ///
    /// `Ok(None)` - поток закрыт чисто, между кадрами.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, QuoteCoreError> {
        loop {
            let byte = match self.bytes.next() {
                Some(b) => b?,
                None => {
                    self.decoder.finish()?;
                    return Ok(None);
                }
            };

            match self.decoder.push(byte) {
                Decoded::Incomplete => {}
                Decoded::Complete(frame) => return Ok(Some(frame)),
                Decoded::Invalid(e) => return Err(e.into()),
            }
        }
    }
}
