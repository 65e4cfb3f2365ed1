//! Процесс целиком: stdin -> fq-bridge -> stdout, провайдер - локальный HTTP-сервер.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

/// Поднимает HTTP-сервер, который отвечает по очереди заданными телами.
/// Возвращает базовый URL и поток, отдающий стартовые строки запросов.
fn serve(replies: Vec<&'static str>) -> (String, thread::JoinHandle<Vec<String>>) {
    serve_with_status("200 OK", replies)
}

/// То же, но со своей статусной строкой на все ответы
fn serve_with_status(
    status: &'static str,
    replies: Vec<&'static str>,
) -> (String, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/query", listener.local_addr().unwrap());

    let h = thread::spawn(move || {
        let mut request_lines = Vec::new();
        for body in replies {
            let (mut stream, _) = listener.accept().unwrap();

            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let head = String::from_utf8_lossy(&buf);
            request_lines.push(head.lines().next().unwrap_or_default().to_string());

            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();
        }
        request_lines
    });

    (url, h)
}

fn bridge(alphavantage_url: &str) -> Command {
    let mut cmd = Command::cargo_bin("fq-bridge").unwrap();
    cmd.env("ALPHAVANTAGE_API_KEY", "test-key")
        .env("RUST_LOG", "info")
        .args(["--alphavantage-url", alphavantage_url]);
    cmd
}

// порт discard: соединение не установится
const NOWHERE: &str = "http://127.0.0.1:9/query";

#[test]
fn empty_input_exits_cleanly() {
    bridge(NOWHERE)
        .write_stdin("")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn answers_quote_batch_and_currency_in_order() {
    let (url, server) = serve(vec![
        r#"{"Global Quote": {"01. symbol": "VOO", "05. price": "432.1000", "07. latest trading day": "2024-01-05"}}"#,
        r#"{"Global Quote": {"01. symbol": "VUSA.AS", "05. price": "85.12", "07. latest trading day": "2024-01-04"}}"#,
        r#"{"Realtime Currency Exchange Rate": {"5. Exchange Rate": "1.08", "6. Last Refreshed": "2024-01-01 00:00:00"}}"#,
    ]);

    bridge(&url)
        .write_stdin(r#"(alphavantage "VOO""VUSA.AS")(currency "USD""EUR")"#)
        .assert()
        .success()
        .stdout(concat!(
            r#"(("VOO" (symbol . "VOO") (gnc:time-no-zone . "2024-01-05 12:00:00") (last . 432.1000) (currency . "USD"))"#,
            r#" ("VUSA.AS" (symbol . "VUSA.AS") (gnc:time-no-zone . "2024-01-04 12:00:00") (last . 85.12) (currency . "EUR")))"#,
            r#"(("EUR" (symbol . "EUR") (gnc:time-no-zone . "2024-01-01T00:00:00") (last . 1.08) (currency . "USD")))"#,
        ))
        // ключ в диагностике не светится
        .stderr(predicate::str::contains("apikey=***"))
        .stderr(predicate::str::contains("test-key").not());

    let requests = server.join().unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].contains("symbol=VOO"), "{requests:?}");
    assert!(requests[0].contains("apikey=test-key"), "{requests:?}");
    assert!(requests[1].contains("symbol=VUSA.AS"), "{requests:?}");
    assert!(requests[2].contains("function=CURRENCY_EXCHANGE_RATE"), "{requests:?}");
}

#[test]
fn unterminated_trailing_frame_fails_the_session() {
    let (url, server) = serve(vec![
        r#"{"Global Quote": {"05. price": "432.10", "07. latest trading day": "2024-01-05"}}"#,
    ]);

    bridge(&url)
        .write_stdin(r#"(alphavantage "VOO")("#)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::starts_with(r#"(("VOO""#))
        .stderr(predicate::str::contains("unterminated"));

    server.join().unwrap();
}

#[test]
fn http_error_status_is_fatal_without_retry() {
    let (url, server) = serve_with_status("503 Service Unavailable", vec!["{}"]);

    bridge(&url)
        .write_stdin(r#"(alphavantage "VOO")"#)
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("http status 503"));

    // 503 - не троттлинг, повторного запроса нет
    let requests = server.join().unwrap();
    assert_eq!(requests.len(), 1, "{requests:?}");
}

#[test]
fn unreachable_provider_is_fatal() {
    bridge(NOWHERE)
        .write_stdin(r#"(currency "USD" "EUR")"#)
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("http transport error"));
}

#[test]
fn unsupported_method_fails_without_output() {
    bridge(NOWHERE)
        .write_stdin(r#"(yahoo "VOO")"#)
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("unsupported method: yahoo"));
}

#[test]
fn garbage_input_fails_without_output() {
    bridge(NOWHERE)
        .write_stdin("hello\n")
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("malformed request"));
}

#[test]
fn missing_api_key_is_rejected_at_startup() {
    Command::cargo_bin("fq-bridge")
        .unwrap()
        .env_remove("ALPHAVANTAGE_API_KEY")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("alphavantage-api-key"));
}
