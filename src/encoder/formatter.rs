//! `serde_json` formatter applying the GELF string escaping rules.
//!
//! Output is compact JSON. Two deviations from `serde_json`'s defaults:
//! `/` is escaped, and carriage returns are dropped because Graylog rejects
//! them inside field values.

use std::io;

use serde::Serialize;
use serde_json::ser::{CharEscape, CompactFormatter, Formatter, Serializer};

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct GelfFormatter;

impl Formatter for GelfFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut parts = fragment.split('/');
        if let Some(first) = parts.next() {
            writer.write_all(first.as_bytes())?;
        }
        for part in parts {
            writer.write_all(b"\\/")?;
            writer.write_all(part.as_bytes())?;
        }
        Ok(())
    }

    fn write_char_escape<W>(&mut self, writer: &mut W, char_escape: CharEscape) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        match char_escape {
            CharEscape::CarriageReturn => Ok(()),
            other => CompactFormatter.write_char_escape(writer, other),
        }
    }
}

/// Serialize `value` with [`GelfFormatter`].
pub(crate) fn to_gelf_json<T>(value: &T, capacity: usize) -> serde_json::Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut buf = Vec::with_capacity(capacity);
    value.serialize(&mut Serializer::with_formatter(&mut buf, GelfFormatter))?;
    Ok(buf)
}
