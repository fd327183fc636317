use bitcoin::blockdata::opcodes::all::*;
use bitcoin::blockdata::script::Builder;
use bitcoin::hashes::{sha256, Hash};
use bitcoin::Script;

/// The commitment output's witness script. Stack top 1 takes the revoked
/// branch and spends with `rev_key` immediately; 0 waits out `delay` blocks
/// and spends with `timeout_key`.
pub fn commit_script(rev_key: &[u8; 33], timeout_key: &[u8; 33], delay: u16) -> Script {
    Builder::new()
        .push_opcode(OP_IF)
        .push_slice(rev_key)
        .push_opcode(OP_ELSE)
        .push_int(delay as i64)
        .push_opcode(OP_CSV)
        .push_opcode(OP_DROP)
        .push_slice(timeout_key)
        .push_opcode(OP_ENDIF)
        .push_opcode(OP_CHECKSIG)
        .into_script()
}

/// P2WSH output script committing to `witness_script`.
pub fn p2wsh_wrap(witness_script: &Script) -> Script {
    let script_hash = sha256::Hash::hash(witness_script.as_bytes());
    Builder::new()
        .push_int(0)
        .push_slice(&script_hash[..])
        .into_script()
}

/// P2WPKH output script paying directly to a 20-byte pubkey hash.
pub fn p2wpkh_from_pkh(pkh: &[u8; 20]) -> Script {
    Builder::new().push_int(0).push_slice(pkh).into_script()
}
