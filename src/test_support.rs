//! 测试用的最小 HTTP 桩服务器。
//!
//! 每个连线只处理一个请求并以 `Connection: close` 结束，
//! responder 依 (路径, 连线序号) 决定状态码与正文。

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

pub(crate) fn serve_http(
    max_conns: usize,
    responder: impl Fn(&str, usize) -> (u16, Vec<u8>) + Send + 'static,
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    thread::spawn(move || {
        for conn in 0..max_conns {
            let Ok((mut stream, _)) = listener.accept() else {
                break;
            };

            let head = read_head(&mut stream);
            let path = head
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or("/")
                .to_string();
            consume_body(&mut stream, &head);

            let (status, body) = responder(&path, conn);
            let reason = match status {
                200 => "OK",
                403 => "Forbidden",
                404 => "Not Found",
                500 => "Internal Server Error",
                503 => "Service Unavailable",
                _ => "Stub",
            };
            let header = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(&body);
        }
    });

    base
}

fn read_head(stream: &mut impl Read) -> String {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    while !buf.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte) {
            Ok(1) => buf.push(byte[0]),
            _ => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn consume_body(stream: &mut impl Read, head: &str) {
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);
    if content_length > 0 {
        let mut body = vec![0u8; content_length];
        let _ = stream.read_exact(&mut body);
    }
}
