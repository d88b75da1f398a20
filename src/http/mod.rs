//! GELF HTTP transport.

mod sender;


pub use sender::{GelfHttpSender, HttpAuth, HttpSenderConfig};
