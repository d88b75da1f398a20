//! A single lazily established GELF TCP connection.

use std::{
    fmt,
    io::{self, Write},
    net::TcpStream,
    sync::Arc,
    time::Duration,
};

use log::debug;
use openssl::ssl::SslStream;

use crate::{resolver::AddressResolver, sender::SendError, tls::TlsConnector};

/// GELF TCP frames are terminated by a single null byte.
pub const FRAME_DELIMITER: u8 = 0x00;

/// Socket options shared by every connection of a sender.
#[derive(Clone, Debug)]
pub struct ConnectionSettings {
    pub connect_timeout: Duration,
    /// Read and write timeout once connected.
    pub socket_timeout: Duration,
    pub tls: Option<TlsConnector>,
}

enum ActiveConnection {
    PlainTcp(TcpStream),
    Tls(Box<SslStream<TcpStream>>),
}

impl ActiveConnection {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.write_all(buf),
            ActiveConnection::Tls(stream) => stream.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.flush(),
            ActiveConnection::Tls(stream) => stream.flush(),
        }
    }
}

/// Pooled resource owning at most one open stream.
///
/// The stream is opened on the first write and discarded after any
/// failure; the next write reconnects.
pub struct TcpConnection {
    resolver: Arc<AddressResolver>,
    settings: Arc<ConnectionSettings>,
    stream: Option<ActiveConnection>,
}

impl TcpConnection {
    pub fn new(resolver: Arc<AddressResolver>, settings: Arc<ConnectionSettings>) -> Self {
        Self {
            resolver,
            settings,
            stream: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Write one frame: the payload, the delimiter, then flush.
    pub fn write(&mut self, payload: &[u8]) -> Result<(), SendError> {
        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.connect()?,
        };
        stream.write_all(payload)?;
        stream.write_all(&[FRAME_DELIMITER])?;
        stream.flush()?;
        self.stream = Some(stream);
        Ok(())
    }

    fn connect(&self) -> Result<ActiveConnection, SendError> {
        let addr = self.resolver.resolve()?;
        let stream = TcpStream::connect_timeout(&addr, self.settings.connect_timeout)?;
        stream.set_read_timeout(Some(self.settings.socket_timeout))?;
        stream.set_write_timeout(Some(self.settings.socket_timeout))?;
        let connection = match &self.settings.tls {
            Some(connector) => {
                let tls = connector.connect(self.resolver.host(), stream)?;
                ActiveConnection::Tls(Box::new(tls))
            }
            None => ActiveConnection::PlainTcp(stream),
        };
        debug!("connected to GELF input at {addr}");
        Ok(connection)
    }
}

impl fmt::Debug for TcpConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpConnection")
            .field("host", &self.resolver.host())
            .field("port", &self.resolver.port())
            .field("connected", &self.is_connected())
            .finish()
    }
}
