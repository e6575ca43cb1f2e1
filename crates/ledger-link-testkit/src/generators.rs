//! Proptest generators for property-based testing.

use proptest::prelude::*;

use ledger_link_core::{Credit, Keypair, Point, PublicKey, Value, MAX_MERGERS};

use crate::fixtures::SettlementFixture;

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random valid public key.
pub fn public_key() -> impl Strategy<Value = PublicKey> {
    keypair().prop_map(|kp| kp.public_key())
}

/// Generate an in-range point.
pub fn point() -> impl Strategy<Value = Point> {
    (Point::MIN.0..=Point::MAX.0).prop_map(Point)
}

/// Generate a credit with 1..=3 mergers.
pub fn credit() -> impl Strategy<Value = Credit> {
    (
        public_key(),
        prop::collection::vec(public_key(), 1..=MAX_MERGERS),
    )
        .prop_map(|(originator, mergers)| {
            Credit::try_new(originator, mergers).expect("generated keys are valid")
        })
}

/// Generate a value owned by a random key.
pub fn value() -> impl Strategy<Value = Value> {
    (public_key(), point(), credit()).prop_map(|(owner, point, credit)| {
        Value::try_new(owner, point, credit).expect("generated point is in range")
    })
}

/// Parameters for generating a settlement.
#[derive(Debug, Clone)]
pub struct SettlementParams {
    pub payer_mergers: usize,
    pub payee_mergers: usize,
    pub point: i64,
    /// Merger signatures required on each evidence.
    pub merger_index_cap: usize,
}

impl Arbitrary for SettlementParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            1..=MAX_MERGERS,
            1..=MAX_MERGERS,
            0i64..=1_000_000_000,
            0..=MAX_MERGERS,
        )
            .prop_map(|(payer_mergers, payee_mergers, point, cap)| SettlementParams {
                payer_mergers,
                payee_mergers,
                point,
                merger_index_cap: cap,
            })
            .boxed()
    }
}

/// A settlement fixture shaped by `params`.
pub fn fixture_from_params(params: &SettlementParams) -> SettlementFixture {
    SettlementFixture::with_mergers(params.payer_mergers, params.payee_mergers)
}
