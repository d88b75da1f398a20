//! Builder for [`GelfUdpSender`](crate::udp::GelfUdpSender).

use std::{fmt, sync::Arc};

use crate::{
    compression::Compression,
    resolver::AddressResolver,
    udp::{GelfUdpChunker, GelfUdpSender, MessageIdSupplier},
};

use super::{
    ConfigError, DEFAULT_GELF_PORT, SenderBuilderTrait, ensure_positive, option_setter,
    require_host,
};

/// Builder for constructing [`GelfUdpSender`] instances.
#[derive(Clone, Default)]
pub struct UdpSenderBuilder {
    host: Option<String>,
    port: Option<u16>,
    max_chunk_size: Option<usize>,
    compression: Option<Compression>,
    id_supplier: Option<Arc<dyn MessageIdSupplier>>,
}

impl UdpSenderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector host name or address. Required.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    option_setter!(
        #[doc = "Collector port; defaults to 12201."]
        with_port,
        port,
        u16
    );
    option_setter!(
        #[doc = "Largest datagram, header included; defaults to 508."]
        with_max_chunk_size,
        max_chunk_size,
        usize
    );
    option_setter!(
        #[doc = "Payload compression; defaults to GZIP."]
        with_compression,
        compression,
        Compression
    );
    option_setter!(with_message_id_supplier, id_supplier, Arc<dyn MessageIdSupplier>);

    fn build_chunker(&self) -> Result<GelfUdpChunker, ConfigError> {
        match &self.id_supplier {
            Some(supplier) => {
                GelfUdpChunker::with_id_supplier(self.max_chunk_size, Arc::clone(supplier))
            }
            None => GelfUdpChunker::new(self.max_chunk_size),
        }
    }
}

impl fmt::Debug for UdpSenderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UdpSenderBuilder")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("max_chunk_size", &self.max_chunk_size)
            .field("compression", &self.compression)
            .field("custom_id_supplier", &self.id_supplier.is_some())
            .finish()
    }
}

impl SenderBuilderTrait for UdpSenderBuilder {
    type Sender = GelfUdpSender;

    fn build_inner(&self) -> Result<Self::Sender, ConfigError> {
        let host = require_host(self.host.as_deref())?;
        let port = ensure_positive!(self.port.unwrap_or(DEFAULT_GELF_PORT), "port")?;
        let chunker = self.build_chunker()?;
        Ok(GelfUdpSender::new(
            AddressResolver::new(host, port),
            chunker,
            self.compression.unwrap_or_default(),
        ))
    }
}
