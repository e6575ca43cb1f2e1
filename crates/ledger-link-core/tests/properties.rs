//! Property tests over the public protocol surface.

use ledger_link_core::{
    Canonical, Codec, Contract, Credit, Evidence, Keypair, LinkableEvidence, Linkage, Point,
    Proof, ProofEvidence, ProofKind, ProofLinkage, ProtocolConfig, ValidationOptions, Value,
    DEFAULT_SIGNATURE_LEVEL,
};
use proptest::prelude::*;

const NOW: i64 = 1_760_000_000_000_000;

fn keypair(seed: u8) -> Keypair {
    Keypair::from_seed(&[seed; 32])
}

fn arb_point() -> impl Strategy<Value = Point> {
    (Point::MIN.0..=Point::MAX.0).prop_map(Point)
}

/// (owner seed, merger seeds) with 1..=3 distinct mergers.
fn arb_parties() -> impl Strategy<Value = (u8, Vec<u8>)> {
    (1u8..=50, proptest::collection::btree_set(51u8..=200, 1..=3))
        .prop_map(|(o, ms)| (o, ms.into_iter().collect()))
}

fn credit_for(owner: u8, mergers: &[u8]) -> Credit {
    Credit::try_new(
        keypair(owner).public_key(),
        mergers.iter().map(|&m| keypair(m).public_key()).collect(),
    )
    .unwrap()
}

fn options() -> ValidationOptions {
    ProtocolConfig::default().validation_options().at(NOW)
}

/// A one-hour value proof owned by `owner`, with a single merger, linked by 250.
fn signed_value_proof(owner: u8, merger: u8, point: i64) -> Proof {
    let value = Value::try_new(
        keypair(owner).public_key(),
        Point(point),
        credit_for(owner, &[merger]),
    )
    .unwrap();
    let mut proof = Proof::for_value(value, keypair(250).public_key());
    proof
        .sign_at(&keypair(owner), 3_600_000_000, &ProtocolConfig::default(), NOW)
        .unwrap();
    proof
}

/// Fields covered by a value proof's signature.
#[derive(Debug, Clone, Copy)]
enum SignedField {
    SignedMics,
    ExpirationMics,
    Point,
    MergerKey,
    Linker,
}

fn arb_signed_field() -> impl Strategy<Value = SignedField> {
    prop_oneof![
        Just(SignedField::SignedMics),
        Just(SignedField::ExpirationMics),
        Just(SignedField::Point),
        Just(SignedField::MergerKey),
        Just(SignedField::Linker),
    ]
}

/// Change one signed field without re-signing.
fn tamper(proof: &Proof, field: SignedField, delta: i64) -> Proof {
    let mut out = proof.clone();
    match field {
        SignedField::SignedMics => out.signed_mics += delta,
        SignedField::ExpirationMics => out.expiration_mics -= delta,
        SignedField::Point | SignedField::MergerKey | SignedField::Linker => {
            let p = match &mut out.kind {
                ProofKind::Value(p) => p,
                other => panic!("expected a value proof, got {:?}", other),
            };
            let (owner, point, credit) = (*p.value.owner(), p.value.point(), p.value.credit().clone());
            match field {
                SignedField::Point => {
                    p.value = Value::try_new(owner, Point(point.0 + delta), credit).unwrap();
                }
                SignedField::MergerKey => {
                    let credit =
                        Credit::try_new(*credit.originator(), vec![keypair(199).public_key()])
                            .unwrap();
                    p.value = Value::try_new(owner, point, credit).unwrap();
                }
                _ => p.linker_public_key = keypair(251).public_key(),
            }
        }
    }
    out
}

/// Payer (owner 1, merger 60) and payee (owner 2, merger 61) evidences, co-signed.
fn cosigned_pair() -> (LinkableEvidence, LinkableEvidence) {
    let (payer, payee) = (signed_value_proof(1, 60, 5), signed_value_proof(2, 61, 5));
    let mut primary = LinkableEvidence::new(true, NOW, payer.clone(), payee.clone());
    let mut secondary = LinkableEvidence::new(false, NOW, payer, payee);
    primary.sign_merger(0, &keypair(60)).unwrap();
    secondary.sign_merger(0, &keypair(61)).unwrap();
    (primary, secondary)
}

fn signed_linkage() -> ProofLinkage {
    let (primary, secondary) = cosigned_pair();
    let mut linkage = Linkage::try_create(&primary, &secondary, &options()).unwrap();
    linkage.sign(&keypair(250)).unwrap();
    linkage
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn value_text_roundtrip((owner, mergers) in arb_parties(), point in arb_point()) {
        let value = Value::try_new(keypair(owner).public_key(), point, credit_for(owner, &mergers))
            .unwrap();
        let parsed: Value = value.to_string().parse().unwrap();
        prop_assert_eq!(&parsed, &value);
        prop_assert_eq!(Value::from_bytes(&value.to_bytes().unwrap()).unwrap(), value);
    }

    #[test]
    fn out_of_range_points_rejected(excess in 1i64..1_000_000) {
        let credit = credit_for(1, &[60]);
        let owner = keypair(1).public_key();
        prop_assert!(Value::try_new(owner, Point(Point::MAX.0 + excess), credit.clone()).is_err());
        prop_assert!(Value::try_new(owner, Point(Point::MIN.0 - excess), credit).is_err());
    }

    #[test]
    fn unrelated_key_never_signs((owner, mergers) in arb_parties(), stranger in 201u8..=255) {
        let value = Value::try_new(keypair(owner).public_key(), Point(1), credit_for(owner, &mergers))
            .unwrap();
        let mut proof = Proof::with_signer(value, keypair(250).public_key());
        prop_assert!(proof
            .sign_at(&keypair(stranger), 0, &ProtocolConfig::default(), NOW)
            .is_err());
    }

    #[test]
    fn window_is_bounded(requested in any::<i64>()) {
        let config = ProtocolConfig::default();
        let value = Value::try_new(keypair(1).public_key(), Point(1), credit_for(1, &[60])).unwrap();
        let mut proof = Proof::for_value(value, keypair(250).public_key());
        proof.sign_at(&keypair(1), requested, &config, NOW).unwrap();

        let window = proof.expiration_mics - proof.signed_mics;
        prop_assert!(window > 0 && window <= config.max_valid_mics);
        prop_assert!(proof.validate_and_verify(&config.validation_options().at(NOW)));
    }

    #[test]
    fn merger_cap_requires_prefix(
        (owner, mergers) in arb_parties(),
        signed in 0usize..=3,
        cap in 0usize..=3,
    ) {
        let credit = credit_for(owner, &mergers);
        let value = Value::try_new(keypair(owner).public_key(), Point(9), credit).unwrap();
        let mut proof = Proof::for_value(value, keypair(250).public_key());
        proof.sign_at(&keypair(owner), 60_000_000, &ProtocolConfig::default(), NOW).unwrap();

        let signed = signed.min(mergers.len());
        let mut evidence = ProofEvidence::new(proof);
        for (i, &m) in mergers.iter().take(signed).enumerate() {
            evidence.sign_merger(i, &keypair(m)).unwrap();
        }

        let required = cap.min(mergers.len());
        let opts = ProtocolConfig::default().validation_options().at(NOW);
        prop_assert_eq!(evidence.validate_and_verify(cap, &opts), signed >= required);
    }

    #[test]
    fn contract_hash_survives_strip(partial in 0i64..1000, extra in 0i64..1000) {
        let value = Value::try_new(keypair(1).public_key(), Point(2000), credit_for(1, &[60])).unwrap();
        let mut proof = Proof::for_value(value, keypair(250).public_key());
        proof.sign_at(&keypair(1), 60_000_000, &ProtocolConfig::default(), NOW).unwrap();

        let contract = Contract::new(proof, Point(partial), Point(partial + extra));
        let stripped = contract.strip_proof();
        prop_assert_eq!(contract.hash(), stripped.hash());
        prop_assert_eq!(
            contract.canonical_bytes(DEFAULT_SIGNATURE_LEVEL),
            stripped.canonical_bytes(DEFAULT_SIGNATURE_LEVEL)
        );
    }

    #[test]
    fn signature_bit_flip_fails(offset in any::<prop::sample::Index>(), bit in 0u8..8) {
        let value = Value::try_new(keypair(1).public_key(), Point(5), credit_for(1, &[60])).unwrap();
        let mut proof = Proof::for_value(value, keypair(250).public_key());
        proof.sign_at(&keypair(1), 60_000_000, &ProtocolConfig::default(), NOW).unwrap();

        let mut sig = proof.signature.unwrap();
        sig.0[offset.index(64)] ^= 1 << bit;
        proof.signature = Some(sig);
        prop_assert!(!proof.validate_and_verify(&ProtocolConfig::default().validation_options().at(NOW)));
    }

    #[test]
    fn tampered_proof_field_fails(field in arb_signed_field(), delta in 1i64..1_000) {
        let proof = signed_value_proof(1, 60, 5);
        prop_assert!(proof.validate_and_verify(&options()));
        prop_assert!(!tamper(&proof, field, delta).validate_and_verify(&options()));
    }

    #[test]
    fn tampered_evidence_fails(
        field in arb_signed_field(),
        delta in 1i64..1_000,
        on_base1 in any::<bool>(),
    ) {
        let (primary, secondary) = cosigned_pair();
        for evidence in [primary, secondary] {
            prop_assert!(evidence.validate_and_verify(3, &options()));

            let mut moved = evidence.clone();
            moved.linked_mics += delta;
            prop_assert!(!moved.validate_and_verify(3, &options()));

            let mut forged = evidence.clone();
            if on_base1 {
                forged.base1 = tamper(&forged.base1, field, delta);
            } else {
                forged.base2 = tamper(&forged.base2, field, delta);
            }
            prop_assert!(!forged.validate_and_verify(3, &options()));
        }
    }

    #[test]
    fn tampered_linkage_fails(
        field in arb_signed_field(),
        delta in 1i64..1_000,
        on_base1 in any::<bool>(),
    ) {
        let linkage = signed_linkage();
        prop_assert!(linkage.validate_and_verify(&options()));

        let mut moved = linkage.clone();
        moved.linked_mics += delta;
        prop_assert!(!moved.validate_and_verify(&options()));

        let mut forged = linkage.clone();
        let mut resigned = linkage.clone();
        if on_base1 {
            forged.base1 = tamper(&forged.base1, field, delta);
            resigned.base1 = signed_value_proof(1, 60, 5 + delta);
            prop_assert!(resigned.base1.validate_and_verify(&options()));
        } else {
            forged.base2 = tamper(&forged.base2, field, delta);
            resigned.base2 = signed_value_proof(2, 61, 5 + delta);
            prop_assert!(resigned.base2.validate_and_verify(&options()));
        }
        prop_assert!(!forged.validate_and_verify(&options()));
        // A validly signed replacement base still breaks the merger and linker signatures
        prop_assert!(!resigned.validate_and_verify(&options()));
    }
}
