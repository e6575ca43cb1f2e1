//! Deterministic test vectors.
//!
//! Ed25519 signatures are deterministic, so a vector pins every byte of a
//! signed linkage. The digest of its full canonical encoding can be compared
//! across implementations.

use ledger_link_core::{Canonical, Identifier, Linkage, ProofLinkage, FULL_LEVEL};

use crate::fixtures::SettlementFixture;

/// A settlement test vector.
#[derive(Debug, Clone)]
pub struct LinkageVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Mergers on the payer's credit.
    pub payer_mergers: usize,
    /// Mergers on the payee's credit.
    pub payee_mergers: usize,
    /// Amount transferred.
    pub point: i64,
    /// Expected BLAKE3 digest of the full linkage encoding (hex).
    pub expected_digest: &'static str,
}

/// Get all linkage vectors.
pub fn all_vectors() -> Vec<LinkageVector> {
    vec![
        LinkageVector {
            name: "single merger on each side",
            payer_mergers: 1,
            payee_mergers: 1,
            point: 100,
            expected_digest:
                "5c7cdfeaf85dde8f6c12a8ea6f50fe2854ebd55f05f635d357d438f19ddb373a",
        },
        LinkageVector {
            name: "full merger sets",
            payer_mergers: 3,
            payee_mergers: 3,
            point: 999_999_999_999_999_999,
            expected_digest:
                "df18bf61cc88cfbdb05d87098947fc9cc4f0df452313e7a0bec500c9194b2cb3",
        },
        LinkageVector {
            name: "zero amount",
            payer_mergers: 2,
            payee_mergers: 1,
            point: 0,
            expected_digest:
                "0baf6b5c60f94717d1851d09a65c2af779bf41ca73c25e326090658e1df9b2fb",
        },
    ]
}

/// Build the signed linkage a vector describes.
pub fn linkage_from_vector(vector: &LinkageVector) -> ProofLinkage {
    let fixture = SettlementFixture::with_mergers(vector.payer_mergers, vector.payee_mergers);
    let (primary, secondary) = fixture.linkable_pair(vector.point);
    let mut linkage = Linkage::try_create(&primary, &secondary, &fixture.options())
        .expect("fixture evidences link");
    linkage
        .sign(&fixture.linker)
        .expect("fixture linker signs");
    linkage
}

/// Digest of a linkage's full canonical encoding.
pub fn linkage_digest(linkage: &ProofLinkage) -> Identifier {
    Identifier::hash(&linkage.canonical_bytes(FULL_LEVEL))
}

/// Check every vector against its pinned digest.
///
/// Returns `(name, matches, digest_hex)`.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let digest = linkage_digest(&linkage_from_vector(v)).to_hex();
            let matches = digest == v.expected_digest;
            (v.name.to_string(), matches, digest)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_are_deterministic() {
        for vector in all_vectors() {
            let l1 = linkage_from_vector(&vector);
            let l2 = linkage_from_vector(&vector);

            assert_eq!(
                l1, l2,
                "Vector '{}' produced different linkages on regeneration",
                vector.name
            );
            assert_eq!(linkage_digest(&l1), linkage_digest(&l2));
        }
    }

    #[test]
    fn test_vectors_verify() {
        for vector in all_vectors() {
            let linkage = linkage_from_vector(&vector);
            let fixture =
                SettlementFixture::with_mergers(vector.payer_mergers, vector.payee_mergers);
            assert!(linkage.validate_and_verify(&fixture.options()), "{}", vector.name);
        }
    }

    #[test]
    fn test_vectors_match_pinned_digests() {
        for (name, matches, digest) in verify_all_vectors() {
            assert!(matches, "Vector '{}' digest changed: {}", name, digest);
        }
    }

    #[test]
    fn test_different_vectors_different_digests() {
        let digests: Vec<_> = all_vectors()
            .iter()
            .map(|v| linkage_digest(&linkage_from_vector(v)))
            .collect();
        assert_ne!(digests[0], digests[1]);
        assert_ne!(digests[1], digests[2]);
    }
}
