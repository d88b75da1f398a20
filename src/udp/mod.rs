//! GELF over UDP: chunking, message ids and the datagram sender.

mod channel;
pub mod chunker;
pub mod message_id;
mod sender;

pub use channel::GuardedChannel;
pub use chunker::{Chunks, DEFAULT_MAX_CHUNK_SIZE, GelfUdpChunker};
pub use message_id::{MessageIdSupplier, RandomMessageIdSupplier};
pub use sender::GelfUdpSender;
