//! Canonical CBOR encoding for deterministic serialization.
//!
//! This module implements RFC 8949 Core Deterministic Encoding with the
//! numeric reduction envelopes need:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - Integral floats encode as integers, NaN has a single encoding, other
//!   floats use the shortest of f32/f64 that preserves the value
//!
//! Leaf digests are computed over these bytes, so two platforms that agree
//! on a value always agree on its digest.

use ciborium::value::Value;

use crate::error::{CoreError, Result};

/// Encode a CBOR value to canonical bytes.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Decode canonical bytes into a value.
///
/// Rejects anything whose canonical re-encoding is not byte-identical to the
/// input: unsorted or duplicate map keys, overlong integer heads, indefinite
/// lengths, reducible floats, trailing bytes.
pub fn decode_value(bytes: &[u8]) -> Result<Value> {
    let value = decode_value_relaxed(bytes)?;
    check_unique_keys(&value)?;

    let reencoded = canonical_bytes(&value);
    if reencoded != bytes {
        return Err(CoreError::NonCanonical(format!(
            "{} input bytes re-encode to {} bytes",
            bytes.len(),
            reencoded.len()
        )));
    }
    Ok(value)
}

/// Decode any well-formed CBOR item without the canonical check.
pub fn decode_value_relaxed(bytes: &[u8]) -> Result<Value> {
    ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            encode_integer(buf, *i);
        }
        Value::Bytes(b) => {
            encode_bytes(buf, b);
        }
        Value::Text(s) => {
            encode_text(buf, s);
        }
        Value::Array(arr) => {
            encode_array(buf, arr);
        }
        Value::Map(entries) => {
            encode_map_canonical(buf, entries);
        }
        Value::Tag(tag, inner) => {
            encode_uint(buf, 6, *tag);
            encode_value_to(buf, inner);
        }
        Value::Bool(b) => {
            buf.push(if *b { 0xf5 } else { 0xf4 });
        }
        Value::Null => {
            buf.push(0xf6);
        }
        Value::Float(f) => {
            encode_float(buf, *f);
        }
        // `Value` is non-exhaustive; every variant ciborium 0.2 defines is
        // matched above.
        _ => unreachable!("unsupported CBOR value type"),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        // Major type 0: unsigned integer
        encode_uint(buf, 0, n as u64);
    } else {
        // Major type 1: -1 encodes as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode a float with numeric reduction.
fn encode_float(buf: &mut Vec<u8>, f: f64) {
    const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

    if f.is_nan() {
        buf.extend_from_slice(&[0xf9, 0x7e, 0x00]);
        return;
    }

    if f.fract() == 0.0 && f > -TWO_POW_64 && f < TWO_POW_64 {
        if f >= 0.0 {
            encode_uint(buf, 0, f as u64);
        } else {
            encode_uint(buf, 1, (-1.0 - f) as u64);
        }
        return;
    }

    let single = f as f32;
    if single as f64 == f {
        buf.push(0xfa);
        buf.extend_from_slice(&single.to_be_bytes());
    } else {
        buf.push(0xfb);
        buf.extend_from_slice(&f.to_be_bytes());
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4).
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item);
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| (canonical_bytes(k), v))
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);

    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}

/// Reject maps with two keys that encode identically.
fn check_unique_keys(value: &Value) -> Result<()> {
    match value {
        Value::Map(entries) => {
            let mut keys: Vec<Vec<u8>> = entries.iter().map(|(k, _)| canonical_bytes(k)).collect();
            keys.sort();
            if keys.windows(2).any(|w| w[0] == w[1]) {
                return Err(CoreError::NonCanonical("duplicate map key".into()));
            }
            for (k, v) in entries {
                check_unique_keys(k)?;
                check_unique_keys(v)?;
            }
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(check_unique_keys),
        Value::Tag(_, inner) => check_unique_keys(inner),
        _ => Ok(()),
    }
}
