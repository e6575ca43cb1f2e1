//! Canonical CBOR encoding, parameterized by signature level.
//!
//! Every signable structure declares each of its fields at a level. The
//! bytes for level `L` contain exactly the fields declared at or below `L`,
//! encoded per RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//!
//! Signature fields are declared above every level any co-signer signs, so no
//! signature ever covers another signer's raw signature bytes unless that is
//! the intent (the linker signs the six merger signatures of a linkage).
//!
//! Signed messages are `SIGN_DOMAIN || level (u32 BE) || canonical map`, so a
//! signature produced at one level never verifies at another.

use ciborium::value::{Integer, Value as Cbor};

use crate::crypto::{PublicKey, Signature};

/// Domain separator prepended to every signed message.
pub const SIGN_DOMAIN: &[u8] = b"ledger-link-sig-v0:";

/// Level signed by a proof's own signer.
pub const DEFAULT_SIGNATURE_LEVEL: u32 = 1;

/// Merger `i` signs an evidence at `EVIDENCE_BASE_LEVEL + i`.
pub const EVIDENCE_BASE_LEVEL: u32 = DEFAULT_SIGNATURE_LEVEL + 1;

/// Level signed by the linker over a fully populated linkage.
pub const LINKER_SIGNATURE_LEVEL: u32 = DEFAULT_SIGNATURE_LEVEL + 10;

/// Level at which every field, signatures included, is present.
pub const FULL_LEVEL: u32 = u32::MAX;

/// Entity tags, stored under key 0 of every top-level map.
pub mod tags {
    pub const CREDIT: u64 = 1;
    pub const VALUE: u64 = 2;
    pub const VALUE_PROOF: u64 = 3;
    pub const SIGNER_PROOF: u64 = 4;
    pub const CREDENTIAL_PROOF: u64 = 5;
    pub const CONTRACT: u64 = 6;
    pub const PROOF_EVIDENCE: u64 = 7;
    pub const LINKED_EVIDENCE: u64 = 8;
    pub const LINKAGE: u64 = 9;
    pub const OWNER_TOKEN: u64 = 10;
}

/// Key of the entity tag in every map.
pub const TAG_KEY: u64 = 0;

/// Collects the fields of one map, dropping those above the target level.
#[derive(Debug)]
pub struct FieldWriter {
    level: u32,
    entries: Vec<(Cbor, Cbor)>,
}

impl FieldWriter {
    pub fn new(level: u32) -> Self {
        Self {
            level,
            entries: Vec::new(),
        }
    }

    /// The level being written.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Write the entity tag (always present).
    pub fn tag(&mut self, tag: u64) {
        self.entries.push((uint(TAG_KEY), uint(tag)));
    }

    /// Write a field declared at `declared`; skipped when above the level.
    pub fn put(&mut self, key: u64, declared: u32, value: Cbor) {
        if declared <= self.level {
            self.entries.push((uint(key), value));
        }
    }

    /// Like [`put`](Self::put), building the value only when it is included.
    pub fn put_with(&mut self, key: u64, declared: u32, value: impl FnOnce() -> Cbor) {
        if declared <= self.level {
            self.entries.push((uint(key), value()));
        }
    }

    pub fn into_value(self) -> Cbor {
        Cbor::Map(self.entries)
    }
}

/// A structure with a level-parameterized canonical encoding.
pub trait Canonical {
    /// Write this structure's fields; the writer filters by level.
    fn write_fields(&self, writer: &mut FieldWriter);

    /// The canonical CBOR value at `level`.
    fn to_cbor(&self, level: u32) -> Cbor {
        let mut writer = FieldWriter::new(level);
        self.write_fields(&mut writer);
        writer.into_value()
    }

    /// The canonical bytes at `level`.
    fn canonical_bytes(&self, level: u32) -> Vec<u8> {
        encode_canonical(&self.to_cbor(level))
    }

    /// The message a signer at `level` signs.
    fn signing_bytes(&self, level: u32) -> Vec<u8> {
        signed_message(level, &self.to_cbor(level))
    }
}

/// `SIGN_DOMAIN || level || canonical(value)`.
pub fn signed_message(level: u32, value: &Cbor) -> Vec<u8> {
    let body = encode_canonical(value);
    let mut buf = Vec::with_capacity(SIGN_DOMAIN.len() + 4 + body.len());
    buf.extend_from_slice(SIGN_DOMAIN);
    buf.extend_from_slice(&level.to_be_bytes());
    buf.extend_from_slice(&body);
    buf
}

pub fn uint(n: u64) -> Cbor {
    Cbor::Integer(n.into())
}

pub fn int(n: i64) -> Cbor {
    Cbor::Integer(n.into())
}

pub fn key(pk: &PublicKey) -> Cbor {
    Cbor::Bytes(pk.0.to_vec())
}

pub fn bytes(b: &[u8]) -> Cbor {
    Cbor::Bytes(b.to_vec())
}

/// An optional signature: bytes, or null when absent.
pub fn signature(sig: Option<&Signature>) -> Cbor {
    match sig {
        Some(s) => Cbor::Bytes(s.0.to_vec()),
        None => Cbor::Null,
    }
}

/// Encode a CBOR value to canonical bytes.
pub fn encode_canonical(value: &Cbor) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

fn encode_value_to(buf: &mut Vec<u8>, value: &Cbor) {
    match value {
        Cbor::Integer(i) => encode_integer(buf, *i),
        Cbor::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Cbor::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Cbor::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item);
            }
        }
        Cbor::Map(entries) => encode_map_canonical(buf, entries),
        Cbor::Tag(tag, inner) => {
            encode_uint(buf, 6, *tag);
            encode_value_to(buf, inner);
        }
        Cbor::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Cbor::Null => buf.push(0xf6),
        Cbor::Float(f) => {
            // Never produced by FieldWriter users; encoded at full width.
            buf.push(0xfb);
            buf.extend_from_slice(&f.to_be_bytes());
        }
        _ => buf.push(0xf7),
    }
}

fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
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

/// Encode a map with keys sorted by their encoded bytes.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Cbor, Cbor)]) {
    let mut pairs: Vec<(Vec<u8>, &Cbor)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
