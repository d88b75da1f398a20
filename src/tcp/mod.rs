//! GELF over TCP, optionally wrapped in TLS.

mod connection;
mod sender;


pub use connection::{ConnectionSettings, FRAME_DELIMITER, TcpConnection};
pub use sender::GelfTcpSender;
