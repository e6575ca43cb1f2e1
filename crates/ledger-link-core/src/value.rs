//! Value: an owner holding an amount of a credit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::canonical::{int, key, tags, Canonical, FieldWriter, DEFAULT_SIGNATURE_LEVEL, FULL_LEVEL};
use crate::codec::Codec;
use crate::credit::Credit;
use crate::crypto::PublicKey;
use crate::error::CoreError;

/// The ledger's fixed amount type.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Point(pub i64);

impl Point {
    pub const MAX: Point = Point(999_999_999_999_999_999);
    pub const MIN: Point = Point(-999_999_999_999_999_999);
    pub const ZERO: Point = Point(0);

    /// Whether the amount lies in `[MIN, MAX]`.
    pub fn is_valid(self) -> bool {
        Self::MIN <= self && self <= Self::MAX
    }

    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Point {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(Point)
            .map_err(|e| CoreError::InvalidText(format!("point: {}", e)))
    }
}

impl From<i64> for Point {
    fn from(n: i64) -> Self {
        Point(n)
    }
}

mod keys {
    pub const OWNER: u64 = 1;
    pub const POINT: u64 = 2;
    pub const CREDIT: u64 = 3;
}

/// Owner + point + credit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ValueRepr", into = "ValueRepr")]
pub struct Value {
    owner: PublicKey,
    point: Point,
    credit: Credit,
}

#[derive(Serialize, Deserialize)]
struct ValueRepr {
    owner: PublicKey,
    point: Point,
    credit: Credit,
}

impl TryFrom<ValueRepr> for Value {
    type Error = CoreError;

    fn try_from(repr: ValueRepr) -> Result<Self, Self::Error> {
        Value::try_new(repr.owner, repr.point, repr.credit)
    }
}

impl From<Value> for ValueRepr {
    fn from(value: Value) -> Self {
        Self {
            owner: value.owner,
            point: value.point,
            credit: value.credit,
        }
    }
}

impl Value {
    pub fn try_new(owner: PublicKey, point: Point, credit: Credit) -> Result<Self, CoreError> {
        if !point.is_valid() {
            return Err(CoreError::PointOutOfRange(point.0));
        }
        if !owner.is_valid() || !credit.is_valid() {
            return Err(CoreError::InvalidPublicKey);
        }
        Ok(Self {
            owner,
            point,
            credit,
        })
    }

    pub fn owner(&self) -> &PublicKey {
        &self.owner
    }

    pub fn point(&self) -> Point {
        self.point
    }

    pub fn credit(&self) -> &Credit {
        &self.credit
    }
}

impl Canonical for Value {
    fn write_fields(&self, w: &mut FieldWriter) {
        w.tag(tags::VALUE);
        w.put(keys::OWNER, DEFAULT_SIGNATURE_LEVEL, key(&self.owner));
        w.put(keys::POINT, DEFAULT_SIGNATURE_LEVEL, int(self.point.0));
        w.put_with(keys::CREDIT, DEFAULT_SIGNATURE_LEVEL, || {
            self.credit.to_cbor(FULL_LEVEL)
        });
    }
}

impl Codec for Value {}

impl fmt::Display for Value {
    /// `Owner#Point@Originator/M1+M2`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}{}", self.owner, self.point, self.credit)
    }
}

impl FromStr for Value {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, rest) = s
            .split_once('#')
            .ok_or_else(|| CoreError::InvalidText("value is missing '#'".into()))?;
        let at = rest
            .find('@')
            .ok_or_else(|| CoreError::InvalidText("value is missing credit".into()))?;
        let (point, credit) = rest.split_at(at);

        Value::try_new(owner.parse()?, point.parse()?, credit.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    fn credit() -> Credit {
        let o = Keypair::from_seed(&[1; 32]).public_key();
        let m = Keypair::from_seed(&[2; 32]).public_key();
        Credit::try_new(o, vec![m]).unwrap()
    }

    #[test]
    fn test_point_range() {
        let owner = Keypair::from_seed(&[3; 32]).public_key();
        assert!(Value::try_new(owner, Point::MAX, credit()).is_ok());
        assert!(Value::try_new(owner, Point::MIN, credit()).is_ok());
        assert!(matches!(
            Value::try_new(owner, Point(Point::MAX.0 + 1), credit()),
            Err(CoreError::PointOutOfRange(_))
        ));
        assert!(Value::try_new(owner, Point(i64::MIN), credit()).is_err());
    }

    #[test]
    fn test_text_roundtrip() {
        let owner = Keypair::from_seed(&[3; 32]).public_key();
        for point in [Point(100), Point(-5), Point::ZERO] {
            let value = Value::try_new(owner, point, credit()).unwrap();
            let text = value.to_string();
            assert!(text.contains(&format!("#{}@", point)));
            assert_eq!(text.parse::<Value>().unwrap(), value);
        }
    }

    #[test]
    fn test_text_rejects_malformed() {
        let owner = Keypair::from_seed(&[3; 32]).public_key();
        assert!(format!("{}#abc{}", owner, credit()).parse::<Value>().is_err());
        assert!(format!("{}#100", owner).parse::<Value>().is_err());
        assert!(format!("{}100{}", owner, credit()).parse::<Value>().is_err());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let owner = Keypair::from_seed(&[3; 32]).public_key();
        let value = Value::try_new(owner, Point(42), credit()).unwrap();
        let bytes = value.to_bytes().unwrap();
        assert_eq!(Value::from_bytes(&bytes).unwrap(), value);
    }
}
