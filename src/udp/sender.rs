//! UDP transport.

use crate::{
    compression::Compression,
    resolver::AddressResolver,
    sender::{GelfSender, SendError},
};

use super::{channel::GuardedChannel, chunker::GelfUdpChunker};

/// Sends compressed, chunked GELF payloads as datagrams.
///
/// Constructed through [`UdpSenderBuilder`](crate::builders::UdpSenderBuilder).
#[derive(Debug)]
pub struct GelfUdpSender {
    resolver: AddressResolver,
    chunker: GelfUdpChunker,
    compression: Compression,
    channel: GuardedChannel,
}

impl GelfUdpSender {
    pub(crate) fn new(
        resolver: AddressResolver,
        chunker: GelfUdpChunker,
        compression: Compression,
    ) -> Self {
        Self {
            resolver,
            chunker,
            compression,
            channel: GuardedChannel::new(),
        }
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }
}

impl GelfSender for GelfUdpSender {
    fn send(&self, payload: &[u8]) -> Result<(), SendError> {
        if self.channel.is_closed() {
            return Err(SendError::Closed);
        }
        let compressed = self
            .compression
            .compress(payload)
            .map_err(SendError::Compression)?;
        let target = self.resolver.resolve()?;
        for datagram in self.chunker.chunks(&compressed)? {
            self.channel.send(&datagram, target)?;
        }
        Ok(())
    }

    fn close(&self) {
        self.channel.close();
    }
}
