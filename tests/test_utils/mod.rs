//! Loopback collectors shared by the delivery tests.

#![allow(dead_code)]

use std::{
    io::{BufRead, BufReader, Read, Write},
    net::{SocketAddr, TcpListener, UdpSocket},
    sync::mpsc,
    thread,
    time::Duration,
};

use femtogelf::{EncoderConfig, GelfAppender, GelfEncoder, GelfSender};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Build an appender whose messages always report `origin` as host.
pub fn appender_with<S: GelfSender>(origin: &str, sender: S) -> GelfAppender<S> {
    let encoder = GelfEncoder::new(EncoderConfig {
        origin_host: Some(origin.into()),
        include_level_name: true,
        ..EncoderConfig::default()
    })
    .expect("valid encoder");
    GelfAppender::new(encoder, sender).expect("valid appender")
}

/// A UDP socket bound to an ephemeral loopback port.
pub fn udp_collector() -> (SocketAddr, UdpSocket) {
    let socket = UdpSocket::bind(("127.0.0.1", 0)).expect("bind UDP collector");
    socket
        .set_read_timeout(Some(RECV_TIMEOUT))
        .expect("set read timeout");
    (socket.local_addr().expect("local address"), socket)
}

/// Receive `count` datagrams.
pub fn recv_datagrams(socket: &UdpSocket, count: usize) -> Vec<Vec<u8>> {
    let mut buf = vec![0u8; 65_535];
    (0..count)
        .map(|_| {
            let (len, _) = socket.recv_from(&mut buf).expect("datagram");
            buf[..len].to_vec()
        })
        .collect()
}

/// Accept one TCP peer and forward its null-terminated frames.
pub fn tcp_collector() -> (SocketAddr, mpsc::Receiver<Vec<u8>>) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind TCP collector");
    let addr = listener.local_addr().expect("local address");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let Ok((stream, _)) = listener.accept() else {
            return;
        };
        let mut reader = BufReader::new(stream);
        loop {
            let mut frame = Vec::new();
            match reader.read_until(0, &mut frame) {
                Ok(0) | Err(_) => return,
                Ok(_) => {
                    frame.pop();
                    if tx.send(frame).is_err() {
                        return;
                    }
                }
            }
        }
    });
    (addr, rx)
}

/// A captured HTTP request: lower-cased headers and raw body.
pub struct CapturedRequest {
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Answer one HTTP request with `202 Accepted` and forward it.
pub fn http_collector() -> (SocketAddr, mpsc::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind HTTP collector");
    let addr = listener.local_addr().expect("local address");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut line = String::new();
        reader.read_line(&mut line).expect("request line");
        let mut headers = Vec::new();
        let mut content_length = 0;
        loop {
            line.clear();
            reader.read_line(&mut line).expect("header line");
            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }
            if let Some((key, value)) = trimmed.split_once(':') {
                let key = key.trim().to_lowercase();
                let value = value.trim().to_owned();
                if key == "content-length" {
                    content_length = value.parse().unwrap_or(0);
                }
                headers.push((key, value));
            }
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).expect("body");
        let _ = stream
            .write_all(b"HTTP/1.1 202 Accepted\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let _ = tx.send(CapturedRequest { headers, body });
    });
    (addr, rx)
}
