//! Datagram socket that reopens itself until explicitly closed.

use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket},
};

use log::debug;
use parking_lot::Mutex;

use crate::sender::SendError;

#[derive(Debug)]
enum ChannelState {
    /// Socket is bound lazily and dropped after a send failure.
    Open(Option<UdpSocket>),
    Closed,
}

/// UDP socket guarded by an explicit `{Open, Closed}` state.
///
/// A failed send discards the socket so the next send binds a fresh one.
/// Once [`close`](Self::close) is called no socket is ever bound again.
#[derive(Debug)]
pub struct GuardedChannel {
    state: Mutex<ChannelState>,
}

impl Default for GuardedChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl GuardedChannel {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChannelState::Open(None)),
        }
    }

    /// Send one datagram to `target`.
    pub fn send(&self, datagram: &[u8], target: SocketAddr) -> Result<(), SendError> {
        let mut state = self.state.lock();
        let slot = match &mut *state {
            ChannelState::Open(slot) => slot,
            ChannelState::Closed => return Err(SendError::Closed),
        };
        let socket = match slot.take() {
            Some(socket) => socket,
            None => bind_for(target)?,
        };
        match socket.send_to(datagram, target) {
            Ok(sent) => {
                *slot = Some(socket);
                if sent == datagram.len() {
                    Ok(())
                } else {
                    Err(SendError::Io(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("sent {sent} of {} datagram bytes", datagram.len()),
                    )))
                }
            }
            Err(err) => {
                debug!("discarding UDP socket after send failure: {err}");
                Err(SendError::Io(err))
            }
        }
    }

    /// Close the socket. Idempotent.
    pub fn close(&self) {
        *self.state.lock() = ChannelState::Closed;
    }

    pub fn is_closed(&self) -> bool {
        matches!(*self.state.lock(), ChannelState::Closed)
    }
}

fn bind_for(target: SocketAddr) -> io::Result<UdpSocket> {
    match target {
        SocketAddr::V4(_) => UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)),
        SocketAddr::V6(_) => UdpSocket::bind((Ipv6Addr::UNSPECIFIED, 0)),
    }
}
