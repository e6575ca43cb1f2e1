//! Storage encoding: serde over CBOR, plus tagged base64url text blobs.
//!
//! This is the persistence form handed to storage and transport. It carries
//! every field, signatures included. Signed messages use
//! [`canonical`](crate::canonical) instead.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreError;

/// Round-trip through CBOR bytes.
///
/// Decoding re-checks structural invariants of the decoded type.
pub trait Codec: Serialize + DeserializeOwned {
    fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}

/// Text form `TAG || base64url(to_bytes())`.
pub trait TaggedText: Codec {
    const TAG: char;

    fn to_tagged_string(&self) -> Result<String, CoreError> {
        let bytes = self.to_bytes()?;
        let mut out = String::with_capacity(1 + bytes.len() * 4 / 3 + 4);
        out.push(Self::TAG);
        URL_SAFE_NO_PAD.encode_string(&bytes, &mut out);
        Ok(out)
    }

    fn from_tagged_str(s: &str) -> Result<Self, CoreError> {
        let body = s
            .strip_prefix(Self::TAG)
            .ok_or_else(|| CoreError::InvalidText(format!("expected tag '{}'", Self::TAG)))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|e| CoreError::InvalidText(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}
