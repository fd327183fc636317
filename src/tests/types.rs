use crate::errors::Error;
use crate::watchtower::{
    hint_key, ChannelDescriptor, HintMsg, IdxSig, HINT_KEY_LEN, STATIC_DESCRIPTOR_LEN,
};

use super::{gen_compact_sig, gen_rand_bytes, gen_rand_txid, mock_descriptor};

#[test]
fn test_descriptor_static_round_trip() {
    let descriptor = mock_descriptor(gen_rand_bytes::<32>());
    let bytes = descriptor.encode_static();
    assert_eq!(bytes.len(), STATIC_DESCRIPTOR_LEN);

    // equal modulo elk_zero, which the static form strips
    let decoded = ChannelDescriptor::decode_static(&bytes).unwrap();
    assert_eq!(decoded.dest_pkh, descriptor.dest_pkh);
    assert_eq!(decoded.adversary_base_point, descriptor.adversary_base_point);
    assert_eq!(decoded.customer_base_point, descriptor.customer_base_point);
    assert_eq!(decoded.delay, descriptor.delay);
    assert_eq!(decoded.fee, descriptor.fee);
    assert_eq!(decoded.elk_zero, [0u8; 32]);
}

#[test]
fn test_descriptor_wire_round_trip() {
    let descriptor = mock_descriptor(gen_rand_bytes::<32>());
    let decoded = ChannelDescriptor::from_wire_bytes(&descriptor.to_wire_bytes()).unwrap();
    assert_eq!(decoded, descriptor);
}

#[test]
fn test_descriptor_decode_rejects_wrong_length() {
    let descriptor = mock_descriptor(gen_rand_bytes::<32>());
    let bytes = descriptor.encode_static();
    assert!(matches!(
        ChannelDescriptor::decode_static(&bytes[..95]),
        Err(Error::MalformedDescriptor)
    ));
    assert!(matches!(
        ChannelDescriptor::from_wire_bytes(&bytes),
        Err(Error::MalformedDescriptor)
    ));
}

#[test]
fn test_idx_sig_round_trip() {
    let isig = IdxSig {
        pkh_idx: 7,
        state_idx: (1 << 48) - 1,
        sig: gen_compact_sig(),
    };
    let bytes = isig.encode();
    assert_eq!(IdxSig::decode(&bytes).unwrap(), isig);
    assert!(matches!(
        IdxSig::decode(&bytes[..73]),
        Err(Error::MalformedHint)
    ));
}

#[test]
fn test_hint_msg_round_trip() {
    let msg = HintMsg {
        dest_pkh: gen_rand_bytes::<20>(),
        txid: gen_rand_txid(),
        elk_scalar: gen_rand_bytes::<32>(),
        sig: gen_compact_sig(),
    };
    let bytes = msg.to_bytes();
    assert_eq!(HintMsg::from_bytes(&bytes).unwrap(), msg);
    assert!(matches!(
        HintMsg::from_bytes(&bytes[..147]),
        Err(Error::MalformedHint)
    ));
}

#[test]
fn test_hint_key_is_txid_prefix() {
    use bitcoin::hashes::Hash;

    let txid = gen_rand_txid();
    assert_eq!(hint_key(&txid).as_ref(), &txid.as_inner()[..HINT_KEY_LEN]);
}
