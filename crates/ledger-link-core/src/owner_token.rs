//! Session-bound ownership tokens.
//!
//! An [`OwnerToken`] proves control of a key to the peer on one transport
//! connection. The signed message includes a connection context chosen by
//! the transport (for instance a channel-binding value), which is not stored
//! in the token. Replaying the token on another connection fails
//! [`OwnerToken::verify`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::canonical::{
    bytes, int, key, signature, signed_message, tags, uint, Canonical, FieldWriter,
    DEFAULT_SIGNATURE_LEVEL, FULL_LEVEL,
};
use crate::codec::{Codec, TaggedText};
use crate::credit::Credit;
use crate::crypto::{Keypair, PublicKey, Signature};
use crate::error::{CoreError, ValidationError};
use crate::time::now_mics;

mod keys {
    pub const PUBLIC_KEY: u64 = 1;
    pub const SIGNED_MICS: u64 = 2;
    pub const SALT: u64 = 3;
    pub const CREDIT: u64 = 4;
    pub const CONNECTION_CONTEXT: u64 = 5;
    pub const SIGNATURE: u64 = 15;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerToken {
    pub public_key: PublicKey,
    pub signature: Signature,
    pub signed_mics: i64,
    pub salt: u64,
    pub credit: Option<Credit>,
}

impl OwnerToken {
    /// Sign a fresh token for the connection identified by `connection_context`.
    pub fn create_and_sign(
        keypair: &Keypair,
        connection_context: &[u8],
        credit: Option<Credit>,
    ) -> Self {
        Self::create_and_sign_at(keypair, connection_context, credit, now_mics())
    }

    pub fn create_and_sign_at(
        keypair: &Keypair,
        connection_context: &[u8],
        credit: Option<Credit>,
        now: i64,
    ) -> Self {
        let mut token = Self {
            public_key: keypair.public_key(),
            signature: Signature::from_bytes([0; Signature::LENGTH]),
            signed_mics: now,
            salt: rand::random(),
            credit,
        };
        token.signature = keypair.sign(&token.signing_bytes(connection_context));
        token
    }

    /// The message signed for `connection_context`.
    pub fn signing_bytes(&self, connection_context: &[u8]) -> Vec<u8> {
        let mut w = FieldWriter::new(DEFAULT_SIGNATURE_LEVEL);
        self.write_fields(&mut w);
        w.put(
            keys::CONNECTION_CONTEXT,
            DEFAULT_SIGNATURE_LEVEL,
            bytes(connection_context),
        );
        signed_message(DEFAULT_SIGNATURE_LEVEL, &w.into_value())
    }

    /// Structural check only; does not look at the signature.
    pub fn validate(&self) -> bool {
        self.signed_mics != 0
    }

    pub fn check(&self, connection_context: &[u8]) -> Result<(), ValidationError> {
        if !self.validate() {
            return Err(ValidationError::Unsigned);
        }
        self.public_key
            .verify(&self.signing_bytes(connection_context), &self.signature)
            .map_err(|_| ValidationError::SignatureFailed)
    }

    /// Check the signature as bound to `connection_context`.
    pub fn verify(&self, connection_context: &[u8]) -> bool {
        self.check(connection_context).is_ok()
    }
}

impl Canonical for OwnerToken {
    fn write_fields(&self, w: &mut FieldWriter) {
        w.tag(tags::OWNER_TOKEN);
        w.put(keys::PUBLIC_KEY, DEFAULT_SIGNATURE_LEVEL, key(&self.public_key));
        w.put(keys::SIGNED_MICS, DEFAULT_SIGNATURE_LEVEL, int(self.signed_mics));
        w.put(keys::SALT, DEFAULT_SIGNATURE_LEVEL, uint(self.salt));
        if let Some(credit) = &self.credit {
            w.put_with(keys::CREDIT, DEFAULT_SIGNATURE_LEVEL, || {
                credit.to_cbor(FULL_LEVEL)
            });
        }
        w.put(keys::SIGNATURE, FULL_LEVEL, signature(Some(&self.signature)));
    }
}

impl Codec for OwnerToken {}

impl TaggedText for OwnerToken {
    const TAG: char = 'O';
}

impl fmt::Display for OwnerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_tagged_string().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl FromStr for OwnerToken {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tagged_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000_000_000;

    fn credit() -> Credit {
        let o = Keypair::from_seed(&[1; 32]).public_key();
        let m = Keypair::from_seed(&[2; 32]).public_key();
        Credit::try_new(o, vec![m]).unwrap()
    }

    #[test]
    fn test_token_is_bound_to_connection() {
        let kp = Keypair::from_seed(&[5; 32]);
        let token = OwnerToken::create_and_sign_at(&kp, b"conn-a", Some(credit()), NOW);

        assert!(token.validate());
        assert!(token.verify(b"conn-a"));
        assert!(!token.verify(b"conn-b"));
        assert!(!token.verify(b""));
    }

    #[test]
    fn test_tampered_token_fails() {
        let kp = Keypair::from_seed(&[5; 32]);
        let token = OwnerToken::create_and_sign_at(&kp, b"ctx", None, NOW);

        let mut salted = token.clone();
        salted.salt = salted.salt.wrapping_add(1);
        assert!(!salted.verify(b"ctx"));

        let mut credited = token.clone();
        credited.credit = Some(credit());
        assert!(!credited.verify(b"ctx"));

        let mut other_key = token.clone();
        other_key.public_key = Keypair::from_seed(&[6; 32]).public_key();
        assert!(!other_key.verify(b"ctx"));
    }

    #[test]
    fn test_zero_time_is_invalid() {
        let kp = Keypair::from_seed(&[5; 32]);
        let token = OwnerToken::create_and_sign_at(&kp, b"ctx", None, 0);
        assert!(!token.validate());
        assert_eq!(token.check(b"ctx"), Err(ValidationError::Unsigned));
    }

    #[test]
    fn test_salts_differ() {
        let kp = Keypair::from_seed(&[5; 32]);
        let a = OwnerToken::create_and_sign_at(&kp, b"ctx", None, NOW);
        let b = OwnerToken::create_and_sign_at(&kp, b"ctx", None, NOW);
        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn test_text_roundtrip() {
        let kp = Keypair::from_seed(&[5; 32]);
        let token = OwnerToken::create_and_sign(&kp, b"ctx", Some(credit()));
        let text = token.to_string();
        assert!(text.starts_with('O'));

        let back: OwnerToken = text.parse().unwrap();
        assert_eq!(back, token);
        assert!(back.verify(b"ctx"));
        assert!("Xabc".parse::<OwnerToken>().is_err());
    }
}
