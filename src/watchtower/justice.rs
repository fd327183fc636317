use bitcoin::{OutPoint, Script, Transaction, TxIn, TxOut, Witness};
use secp256k1::ecdsa::Signature;
use secp256k1::{PublicKey, SecretKey};
use tracing::debug;

use crate::errors::{Error, Result};

use super::scripts::{commit_script, p2wpkh_from_pkh, p2wsh_wrap};
use super::store::WatchtowerStore;
use super::types::{secp256k1_instance, IdxSig};

/// Sequence 1 on the sweeping input selects the revoked branch's immediate
/// spend; the delay only binds the timeout branch.
const JUSTICE_SEQUENCE: u32 = 1;

/// Rebuild the commitment output script for the hinted state, find it on the
/// offending tx, and assemble the sweep. Everything past the store read is
/// pure computation; a `ScriptMismatch` means the truncated-txid hit was
/// spurious (collision or lure) and the caller should keep watching.
pub fn build_justice_tx<S: WatchtowerStore>(
    store: &S,
    bad_tx: &Transaction,
    isig: &IdxSig,
) -> Result<Transaction> {
    let (descriptor, receiver) = store.channel_state_by_index(isig.pkh_idx)?;

    let elk_scalar = receiver.at_index(isig.state_idx)?;
    let elk_point = PublicKey::from_secret_key(
        secp256k1_instance(),
        &SecretKey::from_slice(&elk_scalar)?,
    );
    let adversary_base = PublicKey::from_slice(&descriptor.adversary_base_point)
        .map_err(|_| Error::MalformedDescriptor)?;
    let customer_base = PublicKey::from_slice(&descriptor.customer_base_point)
        .map_err(|_| Error::MalformedDescriptor)?;

    // Per-state keys: each base point shifted by the state's elkrem point.
    let timeout_key = adversary_base.combine(&elk_point)?;
    let rev_key = customer_base.combine(&elk_point)?;

    let witness_script = commit_script(
        &rev_key.serialize(),
        &timeout_key.serialize(),
        descriptor.delay,
    );
    let output_script = p2wsh_wrap(&witness_script);

    let vout = bad_tx
        .output
        .iter()
        .position(|out| out.script_pubkey == output_script)
        .ok_or(Error::ScriptMismatch)?;
    debug!(
        "matched commitment output {} of txid {}, state {}",
        vout,
        bad_tx.txid(),
        isig.state_idx
    );

    let amount = bad_tx.output[vout].value as i64 - descriptor.fee;
    if amount <= 0 {
        return Err(Error::UneconomicFee(amount));
    }

    // Expand the stored 64-byte compact signature to the DER form the
    // witness carries.
    let der_sig = Signature::from_compact(&isig.sig)
        .map_err(|_| Error::MalformedHint)?
        .serialize_der();

    Ok(Transaction {
        version: 2,
        lock_time: 0,
        input: vec![TxIn {
            previous_output: OutPoint::new(bad_tx.txid(), vout as u32),
            script_sig: Script::new(),
            sequence: JUSTICE_SEQUENCE,
            witness: Witness::from_vec(vec![vec![0x01], der_sig.to_vec()]),
        }],
        output: vec![TxOut {
            value: amount as u64,
            script_pubkey: p2wpkh_from_pkh(&descriptor.dest_pkh),
        }],
    })
}
