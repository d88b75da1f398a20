//! Hostname matching for server certificates (RFC 6125 subset).

/// Returns true when `certname` (a DNS SAN or CN) covers `hostname`.
///
/// Names compare ASCII case-insensitively. A wildcard is only honoured as
/// the complete left-most label (`*.example.com`) and only when at least
/// two labels follow it; it matches exactly one label of the hostname.
pub fn verify_hostname(hostname: &str, certname: &str) -> bool {
    let host = hostname.to_ascii_lowercase();
    let cert = certname.to_ascii_lowercase();

    if let Some(cert_suffix) = cert.strip_prefix("*.") {
        if !cert_suffix.contains('.') {
            return false;
        }
        let host_suffix = host.split_once('.').map_or(host.as_str(), |(_, rest)| rest);
        return cert_suffix == host_suffix;
    }

    !host.is_empty() && host == cert
}
