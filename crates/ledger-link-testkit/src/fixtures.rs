//! Test fixtures and helpers.
//!
//! Common setup code for settlement scenarios: parties with deterministic
//! keys, signed proofs and fully co-signed evidence pairs.

use ledger_link_core::{
    ContractableEvidence, Credit, Evidence, Keypair, LinkableEvidence, Point, Proof,
    ProtocolConfig, PublicKey, ValidationOptions, Value,
};

/// Fixed instant fixtures sign at.
pub const FIXTURE_NOW: i64 = 1_760_000_000_000_000;

/// Validity window of fixture proofs (one hour).
pub const FIXTURE_WINDOW_MICS: i64 = 3_600_000_000;

/// An account holder: an owner key plus the mergers of its credit.
pub struct Party {
    pub owner: Keypair,
    pub mergers: Vec<Keypair>,
    pub credit: Credit,
}

impl Party {
    /// Deterministic keys derived from `seed`, with `merger_count` mergers (1..=3).
    pub fn with_seed(seed: u8, merger_count: usize) -> Self {
        let owner = Keypair::from_seed(&seed_bytes(seed, 0));
        let mergers: Vec<Keypair> = (1..=merger_count as u8)
            .map(|i| Keypair::from_seed(&seed_bytes(seed, i)))
            .collect();
        let credit = Credit::try_new(
            owner.public_key(),
            mergers.iter().map(Keypair::public_key).collect(),
        )
        .expect("fixture credit has 1..=3 valid mergers");
        Self {
            owner,
            mergers,
            credit,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.owner.public_key()
    }

    pub fn value(&self, point: i64) -> Value {
        Value::try_new(self.owner.public_key(), Point(point), self.credit.clone())
            .expect("fixture point is in range")
    }

    /// An owner-signed value proof addressed to `linker`.
    pub fn signed_proof(&self, point: i64, linker: &PublicKey, now: i64) -> Proof {
        let mut proof = Proof::for_value(self.value(point), *linker);
        proof
            .sign_at(
                &self.owner,
                FIXTURE_WINDOW_MICS,
                &ProtocolConfig::default(),
                now,
            )
            .expect("owner may sign a value proof");
        proof
    }

    /// Co-sign `evidence` with the first `count` mergers.
    pub fn cosign<E: Evidence>(&self, evidence: &mut E, count: usize) {
        for (i, merger) in self.mergers.iter().take(count).enumerate() {
            evidence
                .sign_merger(i, merger)
                .expect("fixture merger signs its own slot");
        }
    }
}

fn seed_bytes(seed: u8, index: u8) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes[0] = seed;
    bytes[1] = index;
    bytes
}

/// A two-party settlement through one linker.
pub struct SettlementFixture {
    pub linker: Keypair,
    pub payer: Party,
    pub payee: Party,
    pub now: i64,
}

impl SettlementFixture {
    /// Payer with two mergers, payee with one.
    pub fn new() -> Self {
        Self::with_mergers(2, 1)
    }

    pub fn with_mergers(payer: usize, payee: usize) -> Self {
        Self {
            linker: Keypair::from_seed(&seed_bytes(0xff, 0)),
            payer: Party::with_seed(1, payer),
            payee: Party::with_seed(2, payee),
            now: FIXTURE_NOW,
        }
    }

    /// Both parties' signed proofs over `point`.
    pub fn proofs(&self, point: i64) -> (Proof, Proof) {
        let linker = self.linker.public_key();
        (
            self.payer.signed_proof(point, &linker, self.now),
            self.payee.signed_proof(point, &linker, self.now),
        )
    }

    /// Primary (payer) and secondary (payee) evidences, fully co-signed.
    pub fn linkable_pair(&self, point: i64) -> (LinkableEvidence, LinkableEvidence) {
        let (p1, p2) = self.proofs(point);
        let mut primary = LinkableEvidence::new(true, self.now, p1.clone(), p2.clone());
        let mut secondary = LinkableEvidence::new(false, self.now, p1, p2);
        self.payer.cosign(&mut primary, self.payer.mergers.len());
        self.payee.cosign(&mut secondary, self.payee.mergers.len());
        (primary, secondary)
    }

    /// Like [`linkable_pair`](Self::linkable_pair) over whole-value contracts.
    pub fn contractable_pair(&self, point: i64) -> (ContractableEvidence, ContractableEvidence) {
        let (p1, p2) = self.proofs(point);
        let mut primary = ContractableEvidence::from_proofs(true, self.now, p1.clone(), p2.clone());
        let mut secondary = ContractableEvidence::from_proofs(false, self.now, p1, p2);
        self.payer.cosign(&mut primary, self.payer.mergers.len());
        self.payee.cosign(&mut secondary, self.payee.mergers.len());
        (primary, secondary)
    }

    /// Validation options evaluated at the fixture's instant.
    pub fn options(&self) -> ValidationOptions {
        ProtocolConfig::default().validation_options().at(self.now)
    }
}

impl Default for SettlementFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple parties for multi-party tests.
pub fn multi_party_fixtures(count: usize) -> Vec<Party> {
    (0..count)
        .map(|i| Party::with_seed(i as u8 + 10, 1 + i % 3))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_link_core::Linkage;

    #[test]
    fn test_fixture_pair_links() {
        let fixture = SettlementFixture::new();
        let (primary, secondary) = fixture.linkable_pair(100);

        assert!(primary.validate_and_verify(3, &fixture.options()));
        assert!(secondary.validate_and_verify(3, &fixture.options()));
        let mut linkage = Linkage::try_create(&primary, &secondary, &fixture.options()).unwrap();
        linkage.sign(&fixture.linker).unwrap();
        assert!(linkage.validate_and_verify(&fixture.options()));
    }

    #[test]
    fn test_fixture_is_deterministic() {
        let a = SettlementFixture::new().linkable_pair(7);
        let b = SettlementFixture::new().linkable_pair(7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_multi_party() {
        let parties = multi_party_fixtures(3);

        // Each party has unique keys
        let pks: Vec<_> = parties.iter().map(Party::public_key).collect();
        assert_ne!(pks[0], pks[1]);
        assert_ne!(pks[1], pks[2]);
        assert_ne!(pks[0], pks[2]);
        assert_eq!(parties[2].credit.merger_count(), 3);
    }
}
