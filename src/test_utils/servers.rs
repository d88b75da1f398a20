//! Loopback GELF TCP servers for transport tests.

use std::{
    io::{BufRead, BufReader, Read},
    net::{SocketAddr, TcpListener},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
        mpsc,
    },
    thread,
};

use openssl::ssl::{SslAcceptor, SslMethod};

use super::certs::Identity;

/// Read null-terminated frames until the peer hangs up.
fn forward_frames(stream: impl Read, tx: &mpsc::Sender<Vec<u8>>) {
    let mut reader = BufReader::new(stream);
    loop {
        let mut frame = Vec::new();
        match reader.read_until(0, &mut frame) {
            Ok(0) | Err(_) => return,
            Ok(_) => {
                if frame.pop() != Some(0) {
                    return;
                }
                if tx.send(frame).is_err() {
                    return;
                }
            }
        }
    }
}

/// Accept `connections` plain TCP peers in turn and forward their frames.
pub fn spawn_frame_server(
    listener: TcpListener,
    connections: usize,
) -> (SocketAddr, mpsc::Receiver<Vec<u8>>) {
    let addr = listener.local_addr().expect("listener has address");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for _ in 0..connections {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            forward_frames(stream, &tx);
        }
    });
    (addr, rx)
}

/// Accept a peer, forward its first frame and hang up on it; then accept
/// a second peer and forward all of its frames. The counter tracks accepted
/// connections.
pub fn spawn_hangup_frame_server(
    listener: TcpListener,
) -> (SocketAddr, mpsc::Receiver<Vec<u8>>, Arc<AtomicUsize>) {
    let addr = listener.local_addr().expect("listener has address");
    let (tx, rx) = mpsc::channel();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    thread::spawn(move || {
        let Ok((first, _)) = listener.accept() else {
            return;
        };
        counter.fetch_add(1, Ordering::SeqCst);
        let mut reader = BufReader::new(first);
        let mut frame = Vec::new();
        if reader.read_until(0, &mut frame).is_err() || frame.pop() != Some(0) {
            return;
        }
        drop(reader);
        if tx.send(frame).is_err() {
            return;
        }
        let Ok((second, _)) = listener.accept() else {
            return;
        };
        counter.fetch_add(1, Ordering::SeqCst);
        forward_frames(second, &tx);
    });
    (addr, rx, accepted)
}

/// Accept one TLS peer presenting `identity` and forward its frames.
/// Failed handshakes end the server quietly.
pub fn spawn_tls_frame_server(
    listener: TcpListener,
    identity: &Identity,
) -> (SocketAddr, mpsc::Receiver<Vec<u8>>) {
    let addr = listener.local_addr().expect("listener has address");
    let mut builder =
        SslAcceptor::mozilla_intermediate_v5(SslMethod::tls_server()).expect("acceptor");
    builder.set_private_key(&identity.key).expect("private key");
    builder.set_certificate(&identity.cert).expect("certificate");
    builder.check_private_key().expect("matching key");
    let acceptor = builder.build();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let Ok((stream, _)) = listener.accept() else {
            return;
        };
        if let Ok(tls) = acceptor.accept(stream) {
            forward_frames(tls, &tx);
        }
    });
    (addr, rx)
}
