//! Message ids shared by all chunks of one UDP message.

use std::time::{SystemTime, UNIX_EPOCH};

/// Produces the 8-byte id written into every chunk header.
pub trait MessageIdSupplier: Send + Sync {
    fn next_id(&self) -> u64;
}

impl<F> MessageIdSupplier for F
where
    F: Fn() -> u64 + Send + Sync,
{
    fn next_id(&self) -> u64 {
        self()
    }
}

/// Number of low-order bits taken from the millisecond clock. The clock
/// component wraps after ~65 s, well beyond the collector's 5 s chunk
/// reassembly expiry.
const CLOCK_BITS: u32 = 16;
const CLOCK_MASK: u64 = (1 << CLOCK_BITS) - 1;

/// Random 48 bits combined with the low 16 bits of the epoch millis.
///
/// Two ids generated inside one reassembly window only collide when they
/// share the same millisecond and the same 48 random bits.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomMessageIdSupplier;

impl RandomMessageIdSupplier {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn combine(random: u64, epoch_millis: u64) -> u64 {
        (random & !CLOCK_MASK) | (epoch_millis & CLOCK_MASK)
    }
}

impl MessageIdSupplier for RandomMessageIdSupplier {
    fn next_id(&self) -> u64 {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self::combine(rand::random(), millis)
    }
}
