//! GELF UDP chunking.
//!
//! Payloads that do not fit one datagram are split into at most 128
//! chunks. Each chunk starts with a 12-byte header: the magic bytes
//! `0x1e 0x0f`, the 8-byte message id, the sequence number and the total
//! chunk count.

use std::sync::Arc;

use log::trace;

use crate::{builders::ConfigError, sender::SendError};

use super::message_id::{MessageIdSupplier, RandomMessageIdSupplier};

pub const GELF_MAGIC_BYTES: [u8; 2] = [0x1e, 0x0f];
pub const GELF_CHUNK_HEADER_LENGTH: usize = 12;
pub const GELF_MAX_TOTAL_CHUNKS: usize = 128;
/// Keeps datagrams below the minimum IPv4 reassembly buffer.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 508;
/// Largest UDP payload over IPv4 (65 507) less the IP options margin.
pub const MAX_CHUNK_SIZE_LIMIT: usize = 65_467;
const MIN_CHUNK_SIZE: usize = GELF_CHUNK_HEADER_LENGTH + 1;

/// Splits payloads into GELF chunks.
#[derive(Clone)]
pub struct GelfUdpChunker {
    max_chunk_size: usize,
    id_supplier: Arc<dyn MessageIdSupplier>,
}

impl GelfUdpChunker {
    /// Create a chunker with the random id supplier. `None` selects the
    /// default chunk size of 508 bytes.
    pub fn new(max_chunk_size: Option<usize>) -> Result<Self, ConfigError> {
        Self::with_id_supplier(max_chunk_size, Arc::new(RandomMessageIdSupplier::new()))
    }

    pub fn with_id_supplier(
        max_chunk_size: Option<usize>,
        id_supplier: Arc<dyn MessageIdSupplier>,
    ) -> Result<Self, ConfigError> {
        let max_chunk_size = max_chunk_size.unwrap_or(DEFAULT_MAX_CHUNK_SIZE);
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE_LIMIT).contains(&max_chunk_size) {
            return Err(ConfigError::InvalidConfig(format!(
                "max_chunk_size must be within {MIN_CHUNK_SIZE}..={MAX_CHUNK_SIZE_LIMIT}, got {max_chunk_size}"
            )));
        }
        Ok(Self {
            max_chunk_size,
            id_supplier,
        })
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Payload bytes carried by one chunk.
    pub fn capacity(&self) -> usize {
        self.max_chunk_size - GELF_CHUNK_HEADER_LENGTH
    }

    /// Split `payload` into datagrams.
    ///
    /// Fails before producing anything when more than 128 chunks would be
    /// needed.
    pub fn chunks<'a>(&self, payload: &'a [u8]) -> Result<Chunks<'a>, SendError> {
        let capacity = self.capacity();
        if payload.len() <= capacity {
            return Ok(Chunks::single(payload));
        }
        let count = payload.len().div_ceil(capacity);
        if count > GELF_MAX_TOTAL_CHUNKS {
            return Err(SendError::TooManyChunks {
                count,
                max: GELF_MAX_TOTAL_CHUNKS,
            });
        }
        let message_id = self.id_supplier.next_id();
        trace!("splitting {} bytes into {count} GELF chunks (id {message_id:016x})", payload.len());
        Ok(Chunks {
            payload,
            capacity,
            message_id,
            count,
            next: 0,
            headered: true,
        })
    }
}

impl std::fmt::Debug for GelfUdpChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GelfUdpChunker")
            .field("max_chunk_size", &self.max_chunk_size)
            .finish_non_exhaustive()
    }
}

/// Iterator over the datagrams of one message, in sequence order.
#[derive(Debug)]
pub struct Chunks<'a> {
    payload: &'a [u8],
    capacity: usize,
    message_id: u64,
    count: usize,
    next: usize,
    headered: bool,
}

impl<'a> Chunks<'a> {
    fn single(payload: &'a [u8]) -> Self {
        Self {
            payload,
            capacity: payload.len(),
            message_id: 0,
            count: 1,
            next: 0,
            headered: false,
        }
    }
}

impl Iterator for Chunks<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let seq = self.next;
        self.next += 1;
        if !self.headered {
            return Some(self.payload.to_vec());
        }
        let start = seq * self.capacity;
        let end = (start + self.capacity).min(self.payload.len());
        let slice = &self.payload[start..end];
        let mut chunk = Vec::with_capacity(GELF_CHUNK_HEADER_LENGTH + slice.len());
        chunk.extend_from_slice(&GELF_MAGIC_BYTES);
        chunk.extend_from_slice(&self.message_id.to_be_bytes());
        // Both values are below GELF_MAX_TOTAL_CHUNKS.
        chunk.push(seq as u8);
        chunk.push(self.count as u8);
        chunk.extend_from_slice(slice);
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks<'_> {}
