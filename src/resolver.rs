//! Round-robin DNS resolution for collector hosts.

use std::{
    fmt, io,
    net::{SocketAddr, ToSocketAddrs},
    sync::atomic::{AtomicUsize, Ordering},
};

type Lookup = Box<dyn Fn(&str, u16) -> io::Result<Vec<SocketAddr>> + Send + Sync>;

/// Resolves a host on every call and rotates through its addresses, so a
/// collector cluster behind one DNS name receives traffic on all nodes.
pub struct AddressResolver {
    host: String,
    port: u16,
    counter: AtomicUsize,
    lookup: Lookup,
}

impl AddressResolver {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_lookup(host, port, 0, Box::new(system_lookup))
    }

    pub(crate) fn with_lookup(host: impl Into<String>, port: u16, start: usize, lookup: Lookup) -> Self {
        Self {
            host: host.into(),
            port,
            counter: AtomicUsize::new(start),
            lookup,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolve the host and pick the next address in rotation.
    pub fn resolve(&self) -> io::Result<SocketAddr> {
        let addrs = (self.lookup)(&self.host, self.port)?;
        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses found for {}", self.host),
            ));
        }
        let idx = self.counter.fetch_add(1, Ordering::Relaxed) % addrs.len();
        Ok(addrs[idx])
    }
}

impl fmt::Debug for AddressResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressResolver")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

fn system_lookup(host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
    (host, port).to_socket_addrs().map(Iterator::collect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_through_addresses_and_wraps() {
        let resolver = AddressResolver::with_lookup(
            "collector",
            12201,
            usize::MAX,
            Box::new(|_, port| {
                Ok(vec![
                    SocketAddr::from(([127, 0, 0, 1], port)),
                    SocketAddr::from(([8, 8, 8, 8], port)),
                ])
            }),
        );
        let picks: Vec<String> = (0..3)
            .map(|_| resolver.resolve().expect("resolve").ip().to_string())
            .collect();
        assert_eq!(picks, ["8.8.8.8", "127.0.0.1", "8.8.8.8"]);
    }

    #[test]
    fn empty_lookup_is_an_error() {
        let resolver = AddressResolver::with_lookup("nowhere", 1, 0, Box::new(|_, _| Ok(Vec::new())));
        assert_eq!(resolver.resolve().expect_err("empty").kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn resolves_loopback_literal() {
        let addr = AddressResolver::new("127.0.0.1", 12201).resolve().expect("resolve");
        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 12201)));
    }
}
