//! The never-failing entry point: encode an event and hand it to a sender.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, warn};

use crate::{
    builders::ConfigError,
    encoder::GelfEncoder,
    event::GelfEvent,
    rate_limited_warner::RateLimitedWarner,
    sender::GelfSender,
};

/// Couples a [`GelfEncoder`] with a transport.
///
/// `append` swallows every delivery failure so the application's logging
/// call never fails; failures are reported through the `log` facade and
/// summarised by a rate-limited drop counter.
pub struct GelfAppender<S = Box<dyn GelfSender>> {
    encoder: GelfEncoder,
    sender: S,
    warner: RateLimitedWarner,
    closed: AtomicBool,
}

impl<S: GelfSender> GelfAppender<S> {
    /// Fails if the encoder appends newlines, which would corrupt network
    /// framing.
    pub fn new(encoder: GelfEncoder, sender: S) -> Result<Self, ConfigError> {
        if encoder.appends_newline() {
            return Err(ConfigError::InvalidConfig(
                "append_newline must be disabled for network senders".into(),
            ));
        }
        Ok(Self {
            encoder,
            sender,
            warner: RateLimitedWarner::default(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn encoder(&self) -> &GelfEncoder {
        &self.encoder
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Messages dropped since the last drop warning.
    pub fn pending_drops(&self) -> u64 {
        self.warner.pending()
    }

    /// Encode and send `event`. Never fails.
    pub fn append(&self, event: &GelfEvent) {
        if self.is_closed() {
            self.record_drop();
            return;
        }
        let payload = match self.encoder.encode(event) {
            Ok(payload) => payload,
            Err(err) => {
                error!("Error encoding GELF message: {err}");
                self.record_drop();
                return;
            }
        };
        if let Err(err) = self.sender.send(&payload) {
            error!("Error sending GELF message: {err}");
            self.record_drop();
        }
    }

    /// Close the sender. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.sender.close();
        self.warner.flush(|count| {
            warn!("GelfAppender dropped {count} messages before closing");
        });
    }

    fn record_drop(&self) {
        self.warner.record_drop();
        self.warner.warn_if_due(|count| {
            warn!("GelfAppender dropped {count} messages");
        });
    }
}

impl<S> std::fmt::Debug for GelfAppender<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GelfAppender")
            .field("encoder", &self.encoder)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
