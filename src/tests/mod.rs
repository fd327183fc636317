mod elkrem;
mod types;

use bitcoin::hashes::Hash;
use bitcoin::{OutPoint, Script, Transaction, TxIn, TxOut, Txid, Witness};
use secp256k1::{Keypair, Message, PublicKey, Secp256k1, SecretKey};

use crate::watchtower::{commit_script, p2wsh_wrap, secp256k1_instance, ChannelDescriptor};

pub fn gen_rand_secp256k1_keypair_tuple() -> (SecretKey, PublicKey) {
    let secp = Secp256k1::new();
    let key_pair = Keypair::new(&secp, &mut rand::thread_rng());
    (
        SecretKey::from_keypair(&key_pair),
        PublicKey::from_keypair(&key_pair),
    )
}

pub fn gen_rand_bytes<const N: usize>() -> [u8; N] {
    let bytes = (0..N).map(|_| rand::random::<u8>()).collect::<Vec<u8>>();
    bytes.try_into().expect("requested length")
}

pub fn gen_rand_txid() -> Txid {
    Txid::from_inner(gen_rand_bytes::<32>())
}

/// A decodable 64-byte compact signature; the tower never verifies it.
pub fn gen_compact_sig() -> [u8; 64] {
    let secp = Secp256k1::new();
    let (secret_key, _) = gen_rand_secp256k1_keypair_tuple();
    let message =
        Message::from_digest_slice(&gen_rand_bytes::<32>()).expect("32 byte digest");
    secp.sign_ecdsa(&message, &secret_key).serialize_compact()
}

pub fn mock_descriptor(elk_zero: [u8; 32]) -> ChannelDescriptor {
    let (_, adversary_base) = gen_rand_secp256k1_keypair_tuple();
    let (_, customer_base) = gen_rand_secp256k1_keypair_tuple();
    ChannelDescriptor {
        dest_pkh: gen_rand_bytes::<20>(),
        adversary_base_point: adversary_base.serialize(),
        customer_base_point: customer_base.serialize(),
        delay: 144,
        fee: 5_000,
        elk_zero,
    }
}

/// The p2wsh output script a commitment tx for this state would carry,
/// derived the same way the counterparty derives it.
pub fn state_output_script(descriptor: &ChannelDescriptor, elk_scalar: &[u8; 32]) -> Script {
    let secp = secp256k1_instance();
    let elk_point = PublicKey::from_secret_key(
        secp,
        &SecretKey::from_slice(elk_scalar).expect("valid scalar"),
    );
    let timeout_key = PublicKey::from_slice(&descriptor.adversary_base_point)
        .expect("valid base point")
        .combine(&elk_point)
        .expect("combinable points");
    let rev_key = PublicKey::from_slice(&descriptor.customer_base_point)
        .expect("valid base point")
        .combine(&elk_point)
        .expect("combinable points");
    p2wsh_wrap(&commit_script(
        &rev_key.serialize(),
        &timeout_key.serialize(),
        descriptor.delay,
    ))
}

pub fn mock_bad_tx(output_script: Script, value: u64) -> Transaction {
    Transaction {
        version: 2,
        lock_time: 0,
        input: vec![TxIn {
            previous_output: OutPoint::default(),
            script_sig: Script::new(),
            sequence: u32::MAX,
            witness: Witness::default(),
        }],
        output: vec![TxOut {
            value,
            script_pubkey: output_script,
        }],
    }
}
