//! HTTP-сервер подсказок.
//!
//! Разбор HTTP/1.x, keep-alive и закрытие соединений выполняет `tiny_http`;
//! здесь — цикл приёма запросов, отдельный поток на каждый запрос и запись
//! ответа. Ответ пишется вручную: `tiny_http` переходит на chunked для
//! больших тел и не даёт выставить `Connection`.

use std::{
    io::{self, Read, Write},
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use tiny_http::{HTTPVersion, Request, StatusCode};
use tracing::{debug, error, info, warn};

use crate::{
    handler::{self, Reply},
    index::SuggestionIndex,
};

/// Значение заголовка `Server` во всех ответах.
pub const SERVER_NAME: &str = concat!("suggestion_server/", env!("CARGO_PKG_VERSION"));

/// Ошибки запуска сервера.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Сервер, отвечающий на `/v1/api/suggest` по данным общего индекса.
///
/// # Примеры
///
/// ```no_run
/// use std::sync::Arc;
///
/// use suggest_server::{index::SuggestionIndex, server::SuggestServer};
///
/// let index = Arc::new(SuggestionIndex::new());
/// let server = SuggestServer::bind("127.0.0.1:8080".parse().unwrap(), index).unwrap();
/// server.run();
/// ```
pub struct SuggestServer {
    http: Arc<tiny_http::Server>,
    index: Arc<SuggestionIndex>,
    shutdown: Arc<AtomicBool>,
}

impl SuggestServer {
    /// Открывает слушающий сокет; порт `0` выбирает свободный порт.
    pub fn bind(addr: SocketAddr, index: Arc<SuggestionIndex>) -> Result<Self, ServerError> {
        let http = tiny_http::Server::http(addr).map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self { http: Arc::new(http), index, shutdown: Arc::new(AtomicBool::new(false)) })
    }

    /// Фактический адрес слушающего сокета.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.server_addr().to_ip()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle { http: Arc::clone(&self.http), shutdown: Arc::clone(&self.shutdown) }
    }

    /// Принимает запросы, пока не вызван [`ShutdownHandle::shutdown`].
    ///
    /// Каждый запрос обрабатывается в своём потоке; ошибки отдельных
    /// соединений только логируются.
    pub fn run(&self) {
        if let Some(addr) = self.local_addr() {
            info!(%addr, "HTTP listener started");
        }

        while !self.shutdown.load(Ordering::Acquire) {
            match self.http.recv() {
                Ok(request) => {
                    let index = Arc::clone(&self.index);
                    let spawned = thread::Builder::new()
                        .name("request".into())
                        .spawn(move || serve(&index, request));
                    if let Err(e) = spawned {
                        error!(%e, "failed to spawn request thread");
                    }
                }
                Err(_) if self.shutdown.load(Ordering::Acquire) => break,
                Err(e) => warn!(%e, "failed to receive request"),
            }
        }

        info!("HTTP listener stopped");
    }
}

/// Дескриптор для остановки [`SuggestServer::run`] из другого потока.
#[derive(Clone)]
pub struct ShutdownHandle {
    http: Arc<tiny_http::Server>,
    shutdown: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.http.unblock();
    }
}

fn serve(index: &SuggestionIndex, mut request: Request) {
    let peer = request.remote_addr().copied();

    let mut body = Vec::new();
    if let Err(e) = request.as_reader().read_to_end(&mut body) {
        warn!(?peer, %e, "failed to read request body");
        return;
    }

    let reply = handler::handle(index, request.method(), request.url(), &body);
    let version = request.http_version().clone();
    let keep_alive = keep_alive(&request);
    debug!(?peer, method = %request.method(), url = request.url(), status = reply.status, keep_alive, "request handled");

    let mut writer = request.into_writer();
    if let Err(e) = write_reply(&mut writer, &version, keep_alive, &reply) {
        warn!(?peer, %e, "failed to write response");
    }
}

/// Решение клиента о keep-alive: `close` в `Connection` закрывает
/// соединение, `keep-alive` оставляет, без заголовка — по версии протокола.
fn keep_alive(request: &Request) -> bool {
    let connection = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Connection"))
        .map(|h| h.value.as_str().to_ascii_lowercase());
    wants_keep_alive(request.http_version(), connection.as_deref())
}

fn wants_keep_alive(version: &HTTPVersion, connection: Option<&str>) -> bool {
    match connection {
        Some(value) if value.contains("close") || value.contains("upgrade") => false,
        Some(value) if value.contains("keep-alive") => true,
        _ => *version >= HTTPVersion(1, 1),
    }
}

/// Пишет строку статуса, заголовки и (кроме HEAD) тело.
///
/// `Content-Length` указывается всегда, в том числе для HEAD.
fn write_reply<W: Write + ?Sized>(
    out: &mut W,
    version: &HTTPVersion,
    keep_alive: bool,
    reply: &Reply,
) -> io::Result<()> {
    let HTTPVersion(major, minor) = *version;
    let reason = StatusCode(reply.status).default_reason_phrase();
    let connection = if keep_alive { "keep-alive" } else { "close" };

    write!(out, "HTTP/{major}.{minor} {} {reason}\r\n", reply.status)?;
    write!(out, "Server: {SERVER_NAME}\r\n")?;
    write!(out, "Content-Type: {}\r\n", reply.content_type)?;
    write!(out, "Content-Length: {}\r\n", reply.body.len())?;
    write!(out, "Connection: {connection}\r\n\r\n")?;
    if reply.send_body {
        out.write_all(reply.body.as_bytes())?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(body: &str, send_body: bool) -> Reply {
        Reply { status: 200, content_type: "application/json", body: body.into(), send_body }
    }

    fn written(version: HTTPVersion, keep_alive: bool, reply: &Reply) -> String {
        let mut out = Vec::new();
        write_reply(&mut out, &version, keep_alive, reply).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn reply_carries_all_headers() {
        let text = written(HTTPVersion(1, 1), true, &reply("No suggestions", true));

        assert_eq!(
            text,
            format!(
                "HTTP/1.1 200 OK\r\nServer: {SERVER_NAME}\r\nContent-Type: application/json\r\n\
                 Content-Length: 14\r\nConnection: keep-alive\r\n\r\nNo suggestions"
            )
        );
    }

    #[test]
    fn head_reply_keeps_length_without_body() {
        let text = written(HTTPVersion(1, 1), false, &reply(r#"{"suggestions":[]}"#, false));

        assert!(text.contains("Content-Length: 18\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn large_reply_is_not_chunked() {
        let body = "x".repeat(100_000);
        let text = written(HTTPVersion(1, 1), true, &reply(&body, false));

        assert!(text.contains("Content-Length: 100000\r\n"));
        assert!(!text.contains("Transfer-Encoding"));
    }

    #[test]
    fn status_line_follows_request_version_and_status() {
        let not_found = Reply { status: 404, content_type: "text/html", body: "x".into(), send_body: true };
        assert!(written(HTTPVersion(1, 0), false, &not_found).starts_with("HTTP/1.0 404 Not Found\r\n"));
    }

    #[test]
    fn keep_alive_follows_connection_header() {
        let http10 = HTTPVersion(1, 0);
        let http11 = HTTPVersion(1, 1);

        assert!(wants_keep_alive(&http11, None));
        assert!(!wants_keep_alive(&http11, Some("close")));
        assert!(!wants_keep_alive(&http10, None));
        assert!(wants_keep_alive(&http10, Some("keep-alive")));
        assert!(!wants_keep_alive(&http10, Some("close")));
        assert!(!wants_keep_alive(&http11, Some("upgrade")));
    }

    #[test]
    fn bind_reports_address_in_use() {
        let index = Arc::new(SuggestionIndex::new());
        let first = SuggestServer::bind("127.0.0.1:0".parse().unwrap(), Arc::clone(&index)).unwrap();
        let addr = first.local_addr().unwrap();

        let err = SuggestServer::bind(addr, index).err().unwrap();
        assert!(err.to_string().contains(&addr.to_string()));
    }

    #[test]
    fn shutdown_stops_run_loop() {
        let server =
            SuggestServer::bind("127.0.0.1:0".parse().unwrap(), Arc::new(SuggestionIndex::new()))
                .unwrap();
        let handle = server.shutdown_handle();

        let runner = thread::spawn(move || server.run());
        handle.shutdown();
        runner.join().unwrap();
    }
}
