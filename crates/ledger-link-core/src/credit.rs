//! Credit: the addressing namespace of an account.
//!
//! A credit is an originator key plus one to three merger keys. Mergers are
//! order-significant: merger `i` co-signs evidence at level
//! `EVIDENCE_BASE_LEVEL + i`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::canonical::{key, tags, Canonical, FieldWriter, DEFAULT_SIGNATURE_LEVEL};
use crate::codec::Codec;
use crate::crypto::PublicKey;
use crate::error::CoreError;

/// Maximum number of mergers on a credit.
pub const MAX_MERGERS: usize = 3;

mod keys {
    pub const ORIGINATOR: u64 = 1;
    pub const MERGERS: u64 = 2;
}

/// An originator key plus 1..=3 merger keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "CreditRepr", into = "CreditRepr")]
pub struct Credit {
    originator: PublicKey,
    mergers: Vec<PublicKey>,
}

#[derive(Serialize, Deserialize)]
struct CreditRepr {
    originator: PublicKey,
    mergers: Vec<PublicKey>,
}

impl TryFrom<CreditRepr> for Credit {
    type Error = CoreError;

    fn try_from(repr: CreditRepr) -> Result<Self, Self::Error> {
        Credit::try_new(repr.originator, repr.mergers)
    }
}

impl From<Credit> for CreditRepr {
    fn from(credit: Credit) -> Self {
        Self {
            originator: credit.originator,
            mergers: credit.mergers,
        }
    }
}

impl Credit {
    /// Create a credit, checking the merger count and every key.
    pub fn try_new(originator: PublicKey, mergers: Vec<PublicKey>) -> Result<Self, CoreError> {
        if mergers.is_empty() || mergers.len() > MAX_MERGERS {
            return Err(CoreError::InvalidMergerCount(mergers.len()));
        }
        if !originator.is_valid() || mergers.iter().any(|m| !m.is_valid()) {
            return Err(CoreError::InvalidPublicKey);
        }
        Ok(Self {
            originator,
            mergers,
        })
    }

    pub fn originator(&self) -> &PublicKey {
        &self.originator
    }

    pub fn mergers(&self) -> &[PublicKey] {
        &self.mergers
    }

    pub fn merger_count(&self) -> usize {
        self.mergers.len()
    }

    pub fn merger(&self, index: usize) -> Option<&PublicKey> {
        self.mergers.get(index)
    }

    /// Position of `key` among the mergers.
    pub fn merger_index_of(&self, key: &PublicKey) -> Option<usize> {
        self.mergers.iter().position(|m| m == key)
    }

    /// Re-check the construction invariants.
    pub fn is_valid(&self) -> bool {
        (1..=MAX_MERGERS).contains(&self.mergers.len())
            && self.originator.is_valid()
            && self.mergers.iter().all(PublicKey::is_valid)
    }
}

impl Canonical for Credit {
    fn write_fields(&self, w: &mut FieldWriter) {
        w.tag(tags::CREDIT);
        w.put(keys::ORIGINATOR, DEFAULT_SIGNATURE_LEVEL, key(&self.originator));
        w.put_with(keys::MERGERS, DEFAULT_SIGNATURE_LEVEL, || {
            ciborium::value::Value::Array(self.mergers.iter().map(key).collect())
        });
    }
}

impl Codec for Credit {}

impl fmt::Display for Credit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}/", self.originator)?;
        for (i, merger) in self.mergers.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{}", merger)?;
        }
        Ok(())
    }
}

impl FromStr for Credit {
    type Err = CoreError;

    /// Parse `@Originator/M1+M2+M3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix('@')
            .ok_or_else(|| CoreError::InvalidText("credit must start with '@'".into()))?;
        let (originator, mergers) = body
            .split_once('/')
            .ok_or_else(|| CoreError::InvalidText("credit is missing '/'".into()))?;

        let originator = originator.parse::<PublicKey>()?;
        let mergers = mergers
            .split('+')
            .map(str::parse::<PublicKey>)
            .collect::<Result<Vec<_>, _>>()?;

        Credit::try_new(originator, mergers)
    }
}
