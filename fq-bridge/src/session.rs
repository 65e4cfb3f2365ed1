use std::io::{Read, Write};

use fq_core::FrameReader;
use fq_core::protocol::parse_command;
use log::{debug, info};

use crate::dispatch::{BridgeError, Dispatcher};
use crate::provider::Provider;

/// Цикл сессии: кадр -> разбор -> провайдер -> ответ -> следующий кадр.
///
/// Запросы строго по одному. Любая ошибка обрывает сессию: ответа с ошибкой
/// в протоколе нет, хост увидит закрытый поток и ненулевой код выхода.
/// Возвращает число обслуженных запросов, если вход закрылся чисто.
pub(crate) fn run_session<R, W, C>(
    input: R,
    mut output: W,
    dispatcher: &mut Dispatcher<C>,
) -> Result<usize, BridgeError>
where
    R: Read,
    W: Write,
    C: Provider,
{
    let mut frames = FrameReader::new(input);
    let mut served = 0;

    while let Some(frame) = frames.next_frame()? {
        info!("Query: {frame}");

        let cmd = parse_command(frame.as_str())?;
        let response = dispatcher.dispatch(cmd)?;
        let text = response.render();
        debug!("Reply: {text}");

        output
            .write_all(text.as_bytes())
            .and_then(|()| output.flush())
            .map_err(BridgeError::Output)?;
        served += 1;
    }

    info!("input closed after {served} request(s)");
    Ok(served)
}
