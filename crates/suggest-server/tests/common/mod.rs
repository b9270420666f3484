//! Общие помощники интеграционных тестов: минимальный HTTP/1.1-клиент
//! поверх `TcpStream`.

#![allow(dead_code)]

use std::{
    io::{BufRead, BufReader, Read, Write},
    net::{SocketAddr, TcpStream},
    time::Duration,
};

/// Разобранный HTTP-ответ.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

pub fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect_timeout(&addr, Duration::from_secs(5)).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream
}

/// Пишет запрос HTTP/1.1 в поток; `close` добавляет `Connection: close`.
pub fn send(stream: &mut TcpStream, method: &str, path: &str, body: &str, close: bool) {
    send_with(stream, "HTTP/1.1", method, path, body, close.then_some("close"));
}

/// Пишет запрос с заданной версией протокола и заголовком `Connection`.
pub fn send_with(
    stream: &mut TcpStream,
    version: &str,
    method: &str,
    path: &str,
    body: &str,
    connection: Option<&str>,
) {
    let connection = connection.map(|value| format!("Connection: {value}\r\n")).unwrap_or_default();
    let request = format!(
        "{method} {path} {version}\r\nHost: localhost\r\nContent-Type: application/json\r\n\
         Content-Length: {}\r\n{connection}\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).unwrap();
}

/// Читает один ответ; для ответа на HEAD тело не читается.
pub fn read_response(reader: &mut BufReader<TcpStream>, expect_body: bool) -> HttpResponse {
    let mut status_line = String::new();
    reader.read_line(&mut status_line).unwrap();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or_else(|| panic!("bad status line: {status_line:?}"));

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let mut response = HttpResponse { status, headers, body: String::new() };
    if expect_body {
        let length: usize = response.header("Content-Length").and_then(|v| v.parse().ok()).unwrap_or(0);
        let mut body = vec![0u8; length];
        reader.read_exact(&mut body).unwrap();
        response.body = String::from_utf8(body).unwrap();
    }
    response
}

/// Один запрос на отдельном соединении.
pub fn request(addr: SocketAddr, method: &str, path: &str, body: &str) -> HttpResponse {
    let mut stream = connect(addr);
    send(&mut stream, method, path, body, true);
    let mut reader = BufReader::new(stream);
    read_response(&mut reader, method != "HEAD")
}
