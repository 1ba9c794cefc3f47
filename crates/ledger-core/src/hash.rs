//! Canonical serialization and SHA-256 digests.
//!
//! The canonical form is the JSON text other nodes produce for the same
//! record: object keys sorted at every level, `", "` and `": "` separators,
//! and every character outside printable ASCII escaped as `\uXXXX`. Digests
//! are the lowercase hex SHA-256 of that text, so `previous_hash` links agree
//! across processes regardless of how a record was laid out in memory.

use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::{self, Write};

/// Records that have a canonical JSON representation.
pub trait Canonical {
    fn canonical_value(&self) -> Value;
}

impl Canonical for Value {
    fn canonical_value(&self) -> Value {
        self.clone()
    }
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Digest of a record's canonical form.
pub fn digest<T: Canonical + ?Sized>(item: &T) -> String {
    sha256_hex(&canonical_bytes(item))
}

/// Render `value` in canonical form.
pub fn canonical_json(value: &Value) -> String {
    // Only ASCII is ever emitted.
    String::from_utf8_lossy(&canonical_bytes(value)).into_owned()
}

/// Canonical JSON text of a record, as bytes.
pub fn canonical_bytes<T: Canonical + ?Sized>(item: &T) -> Vec<u8> {
    let mut value = item.canonical_value();
    value.sort_all_objects();
    let mut out = Vec::with_capacity(128);
    let mut ser = Serializer::with_formatter(&mut out, CanonicalFormatter);
    // A `Value` has string keys only and a `Vec` sink never fails.
    serde::Serialize::serialize(&value, &mut ser)
        .expect("serializing a JSON value into memory is infallible");
    out
}

/// `serde_json` formatter producing the canonical text: spaced separators,
/// ASCII-only strings and shortest round-trip floats in `repr` layout.
#[derive(Clone, Copy, Debug, Default)]
pub struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn write_f64<W: ?Sized + Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(format_float(value).as_bytes())
    }

    fn write_f32<W: ?Sized + Write>(&mut self, writer: &mut W, value: f32) -> io::Result<()> {
        self.write_f64(writer, f64::from(value))
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    writer.write_all(format!("\\u{unit:04x}").as_bytes())?;
                }
            }
        }
        Ok(())
    }

    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// Shortest round-trip digits of `value`, laid out as a float `repr`:
/// positional between `1e-4` and `1e16` (always with a fraction), scientific
/// with a signed two-digit exponent otherwise.
pub fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return "null".to_string();
    }
    let sci = format!("{value:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let point = exp + 1;

    if point <= -4 || point > 16 {
        let sign_exp = if exp < 0 { '-' } else { '+' };
        return format!("{sign}{mantissa}e{sign_exp}{:02}", exp.unsigned_abs());
    }
    if exp < 0 {
        let zeros = "0".repeat(exp.unsigned_abs() as usize - 1);
        return format!("{sign}0.{zeros}{digits}");
    }
    let point = point as usize;
    if point >= digits.len() {
        let zeros = "0".repeat(point - digits.len());
        format!("{sign}{digits}{zeros}.0")
    } else {
        format!("{sign}{}.{}", &digits[..point], &digits[point..])
    }
}
