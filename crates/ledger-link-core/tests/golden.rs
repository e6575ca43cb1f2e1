//! Golden bytes for the canonical signing encoding.
//!
//! Every implementation must produce these exact messages. Deterministic
//! Ed25519 also pins the signatures. Long messages are pinned by length,
//! prefix and BLAKE3 digest.

use ledger_link_core::{
    Canonical, Credit, Evidence, Identifier, Keypair, LinkableEvidence, Linkage, Point, Proof,
    ProofLinkage, ProtocolConfig, Value, FULL_LEVEL, SIGN_DOMAIN,
};

const NOW: i64 = 1_760_000_000_000_000;
const WINDOW: i64 = 3_600_000_000;

fn keypair(seed: u8, index: u8) -> Keypair {
    let mut bytes = [0u8; 32];
    bytes[0] = seed;
    bytes[1] = index;
    Keypair::from_seed(&bytes)
}

struct Golden {
    linker: Keypair,
    payer_merger: Keypair,
    payee_merger: Keypair,
    payer_proof: Proof,
    payee_proof: Proof,
}

fn signed_proof(owner: &Keypair, merger: &Keypair, linker: &Keypair) -> Proof {
    let credit = Credit::try_new(owner.public_key(), vec![merger.public_key()]).unwrap();
    let value = Value::try_new(owner.public_key(), Point(100), credit).unwrap();
    let mut proof = Proof::for_value(value, linker.public_key());
    proof
        .sign_at(owner, WINDOW, &ProtocolConfig::default(), NOW)
        .unwrap();
    proof
}

fn golden() -> Golden {
    let linker = keypair(0xff, 0);
    let (payer, payer_merger) = (keypair(1, 0), keypair(1, 1));
    let (payee, payee_merger) = (keypair(2, 0), keypair(2, 1));
    Golden {
        payer_proof: signed_proof(&payer, &payer_merger, &linker),
        payee_proof: signed_proof(&payee, &payee_merger, &linker),
        linker,
        payer_merger,
        payee_merger,
    }
}

fn digest(bytes: &[u8]) -> String {
    Identifier::hash(bytes).to_hex()
}

#[test]
fn test_sign_domain_exact_bytes() {
    assert_eq!(hex::encode(SIGN_DOMAIN), "6c65646765722d6c696e6b2d7369672d76303a");
    assert_eq!(SIGN_DOMAIN, b"ledger-link-sig-v0:");
}

#[test]
fn test_golden_keys() {
    let g = golden();
    assert_eq!(
        hex::encode(g.linker.public_key().as_bytes()),
        "dca4e78db03799dda75e8a295c0dc7216bb6bdc6967c27c1b0bb05c7549ea656"
    );
    assert_eq!(
        hex::encode(keypair(1, 0).public_key().as_bytes()),
        "cecc1507dc1ddd7295951c290888f095adb9044d1b73d696e6df065d683bd4fc"
    );
}

#[test]
fn test_golden_proof_signing_bytes() {
    let g = golden();
    let expected = concat!(
        // SIGN_DOMAIN, level 1
        "6c65646765722d6c696e6b2d7369672d76303a", "00000001",
        // {0: 3, 1: signed_mics, 2: expiration_mics,
        "a5", "0003", "011b000640b5eece0000", "021b000640b6c561a400",
        // 3: {0: 2, 1: owner, 2: 100, 3: {0: 1, 1: originator, 2: [merger]}},
        "03a4", "0002",
        "015820cecc1507dc1ddd7295951c290888f095adb9044d1b73d696e6df065d683bd4fc",
        "021864",
        "03a3", "0001",
        "015820cecc1507dc1ddd7295951c290888f095adb9044d1b73d696e6df065d683bd4fc",
        "0281", "58205ef05da6377ffdb523ea773bd94ae4096c6d7c2c07e845a27fdc961666efc775",
        // 4: linker}
        "045820dca4e78db03799dda75e8a295c0dc7216bb6bdc6967c27c1b0bb05c7549ea656",
    );
    let bytes = g.payer_proof.signing_bytes();
    assert_eq!(bytes.len(), 198);
    assert_eq!(hex::encode(&bytes), expected);

    assert_eq!(
        g.payer_proof.signature.unwrap().to_hex(),
        concat!(
            "169e7631decc5a391f994cd19f3a73c92d110f1d9bf12f5ddbe5715b0b0b4da5",
            "d546343313bc7374f1eacf946448740c0a2b1146eb5b55dad9d2ede1e7d63405",
        )
    );
}

#[test]
fn test_golden_merger_signing_bytes() {
    let g = golden();
    let evidence = LinkableEvidence::new(true, NOW, g.payer_proof, g.payee_proof);
    let bytes = evidence.merger_signing_bytes(0);

    assert_eq!(bytes.len(), 524);
    // SIGN_DOMAIN, level 2, five-entry map
    assert_eq!(
        hex::encode(&bytes[..24]),
        "6c65646765722d6c696e6b2d7369672d76303a00000002a5"
    );
    assert_eq!(
        digest(&bytes),
        "1342f9f313b60aea670ad0b1354bd22fe8150f2d6c0d1f2ed9270178c291d146"
    );
}

#[test]
fn test_golden_linkage() {
    let g = golden();
    let mut primary = LinkableEvidence::new(true, NOW, g.payer_proof.clone(), g.payee_proof.clone());
    let mut secondary = LinkableEvidence::new(false, NOW, g.payer_proof, g.payee_proof);
    primary.sign_merger(0, &g.payer_merger).unwrap();
    secondary.sign_merger(0, &g.payee_merger).unwrap();

    let options = ProtocolConfig::default().validation_options().at(NOW);
    let mut linkage: ProofLinkage = Linkage::try_create(&primary, &secondary, &options).unwrap();
    linkage.sign(&g.linker).unwrap();

    let signing = linkage.linker_signing_bytes();
    assert_eq!(signing.len(), 662);
    // SIGN_DOMAIN, level 11, six-entry map
    assert_eq!(
        hex::encode(&signing[..24]),
        "6c65646765722d6c696e6b2d7369672d76303a0000000ba6"
    );
    assert_eq!(
        digest(&signing),
        "fd1e11c7ca9b6ac43ca8ba8b2d84b13ac9cd90266ee38e4530b13e1a65cf6807"
    );
    assert_eq!(
        linkage.linker_signature.unwrap().to_hex(),
        concat!(
            "602af09351d82178c1c365ce894b47b4af3d709d5bdafe12a44db85c7078c0d4",
            "2f62e762ebd387f2d19664239fe020666a5a12f163ed75f4a30f3702ea154507",
        )
    );

    let full = linkage.canonical_bytes(FULL_LEVEL);
    assert_eq!(full.len(), 706);
    assert_eq!(
        digest(&full),
        "5c7cdfeaf85dde8f6c12a8ea6f50fe2854ebd55f05f635d357d438f19ddb373a"
    );
}
