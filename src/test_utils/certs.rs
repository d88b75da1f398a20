//! Throwaway certificates for TLS tests.
//!
//! Everything here is generated at runtime with OpenSSL, so tests never
//! depend on fixtures that could expire on disk.

use std::time::{SystemTime, UNIX_EPOCH};

use openssl::{
    asn1::Asn1Time,
    bn::BigNum,
    hash::MessageDigest,
    nid::Nid,
    pkey::{PKey, Private},
    rsa::Rsa,
    x509::{
        X509, X509Builder, X509Name, X509NameBuilder,
        extension::{BasicConstraints, SubjectAlternativeName},
    },
};

pub const TEST_HOSTNAME: &str = "graylog.foo.bar";

/// A certificate together with its private key.
pub struct Identity {
    pub cert: X509,
    pub key: PKey<Private>,
}

/// How a leaf certificate should be issued.
pub struct LeafProfile<'a> {
    pub common_name: Option<&'a str>,
    pub dns_names: &'a [&'a str],
    pub expired: bool,
}

impl Default for LeafProfile<'_> {
    fn default() -> Self {
        Self {
            common_name: Some(TEST_HOSTNAME),
            dns_names: &[],
            expired: false,
        }
    }
}

fn new_key() -> PKey<Private> {
    let rsa = Rsa::generate(2048).expect("generate RSA key");
    PKey::from_rsa(rsa).expect("wrap RSA key")
}

fn name(common_name: Option<&str>) -> X509Name {
    let mut builder = X509NameBuilder::new().expect("name builder");
    builder
        .append_entry_by_nid(Nid::ORGANIZATIONNAME, "femtogelf tests")
        .expect("organisation");
    if let Some(cn) = common_name {
        builder
            .append_entry_by_nid(Nid::COMMONNAME, cn)
            .expect("common name");
    }
    builder.build()
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs() as i64
}

fn base_builder(subject: &X509Name, key: &PKey<Private>, serial: u32, expired: bool) -> X509Builder {
    const DAY: i64 = 86_400;
    let now = unix_now();
    let (not_before, not_after) = if expired {
        (now - 10 * DAY, now - DAY)
    } else {
        (now - DAY, now + 30 * DAY)
    };
    let mut builder = X509Builder::new().expect("x509 builder");
    builder.set_version(2).expect("version");
    let serial = BigNum::from_u32(serial)
        .and_then(|bn| bn.to_asn1_integer())
        .expect("serial");
    builder.set_serial_number(&serial).expect("set serial");
    builder.set_subject_name(subject).expect("subject");
    builder.set_pubkey(key).expect("pubkey");
    builder
        .set_not_before(&Asn1Time::from_unix(not_before).expect("not before"))
        .expect("set not before");
    builder
        .set_not_after(&Asn1Time::from_unix(not_after).expect("not after"))
        .expect("set not after");
    builder
}

/// A self-signed certificate authority.
pub fn certificate_authority() -> Identity {
    let key = new_key();
    let subject = name(Some("femtogelf test CA"));
    let mut builder = base_builder(&subject, &key, 1, false);
    builder.set_issuer_name(&subject).expect("issuer");
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().expect("ca"))
        .expect("basic constraints");
    builder.sign(&key, MessageDigest::sha256()).expect("sign CA");
    Identity {
        cert: builder.build(),
        key,
    }
}

/// A leaf certificate issued by `issuer`, or self-signed when `issuer` is
/// `None`.
pub fn leaf(profile: &LeafProfile<'_>, issuer: Option<&Identity>) -> Identity {
    let key = new_key();
    let subject = name(profile.common_name);
    let mut builder = base_builder(&subject, &key, 2, profile.expired);
    let issuer_name = issuer.map_or(&*subject, |ca| ca.cert.subject_name());
    builder.set_issuer_name(issuer_name).expect("issuer");
    if !profile.dns_names.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for dns in profile.dns_names {
            san.dns(dns);
        }
        let context = builder.x509v3_context(issuer.map(|ca| &*ca.cert), None);
        let extension = san.build(&context).expect("subject alternative names");
        builder.append_extension(extension).expect("append SAN");
    }
    let signing_key = issuer.map_or(&key, |ca| &ca.key);
    builder
        .sign(signing_key, MessageDigest::sha256())
        .expect("sign leaf");
    Identity {
        cert: builder.build(),
        key,
    }
}
