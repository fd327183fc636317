use bitcoin::hashes::Hash;
use bitcoin::Txid;
use once_cell::sync::OnceCell;
use secp256k1::{All, Secp256k1};

use crate::errors::{Error, Result};

pub fn secp256k1_instance() -> &'static Secp256k1<All> {
    static INSTANCE: OnceCell<Secp256k1<All>> = OnceCell::new();
    INSTANCE.get_or_init(Secp256k1::new)
}

/// On-disk static descriptor: pkh(20) || adv_base(33) || cust_base(33) || delay(2) || fee(8).
pub const STATIC_DESCRIPTOR_LEN: usize = 96;
/// Wire descriptor: the static form followed by elk_zero(32).
pub const WIRE_DESCRIPTOR_LEN: usize = STATIC_DESCRIPTOR_LEN + 32;
/// On-disk hint: pkh_idx(4) || state_idx(6) || sig(64).
pub const IDX_SIG_LEN: usize = 74;
/// Wire hint message: dest_pkh(20) || txid(32) || elk_scalar(32) || sig(64).
pub const HINT_MSG_LEN: usize = 148;
/// Hints are keyed by a txid prefix of this length.
pub const HINT_KEY_LEN: usize = 16;

/// The store key a hint lives under: the first 16 bytes of the commitment
/// txid. Truncation can collide; the reconstructor treats a mismatch as a
/// spurious hit.
pub fn hint_key(txid: &Txid) -> [u8; HINT_KEY_LEN] {
    txid.as_inner()[..HINT_KEY_LEN]
        .try_into()
        .expect("txid is at least 16 bytes")
}

/// Static parameters of one watched channel, delivered once at channel open.
/// `elk_zero` is consumed as the first revocation-tree leaf at creation time
/// and is not part of the persisted form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelDescriptor {
    /// Hash of the customer's payout pubkey; also the channel's primary key.
    pub dest_pkh: [u8; 20],
    /// The counterparty's revocation base point, compressed.
    pub adversary_base_point: [u8; 33],
    /// The customer's base point, compressed.
    pub customer_base_point: [u8; 33],
    /// Relative timelock of the commitment output, in blocks.
    pub delay: u16,
    /// Sats subtracted from the swept amount to cover the justice tx fee.
    pub fee: i64,
    /// First leaf of the channel's revocation tree.
    pub elk_zero: [u8; 32],
}

impl ChannelDescriptor {
    /// The 96-byte static form, with `elk_zero` stripped.
    pub fn encode_static(&self) -> [u8; STATIC_DESCRIPTOR_LEN] {
        let mut buf = [0u8; STATIC_DESCRIPTOR_LEN];
        buf[..20].copy_from_slice(&self.dest_pkh);
        buf[20..53].copy_from_slice(&self.adversary_base_point);
        buf[53..86].copy_from_slice(&self.customer_base_point);
        buf[86..88].copy_from_slice(&self.delay.to_be_bytes());
        buf[88..96].copy_from_slice(&self.fee.to_be_bytes());
        buf
    }

    /// Decode the 96-byte static form. `elk_zero` comes back zeroed; it
    /// only ever existed inside the revocation tree. Base points are kept
    /// as raw bytes here and parsed at reconstruction time.
    pub fn decode_static(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != STATIC_DESCRIPTOR_LEN {
            return Err(Error::MalformedDescriptor);
        }
        Ok(ChannelDescriptor {
            dest_pkh: bytes[..20].try_into().expect("20 byte pkh"),
            adversary_base_point: bytes[20..53].try_into().expect("33 byte point"),
            customer_base_point: bytes[53..86].try_into().expect("33 byte point"),
            delay: u16::from_be_bytes(bytes[86..88].try_into().expect("2 byte delay")),
            fee: i64::from_be_bytes(bytes[88..96].try_into().expect("8 byte fee")),
            elk_zero: [0u8; 32],
        })
    }

    pub fn to_wire_bytes(&self) -> [u8; WIRE_DESCRIPTOR_LEN] {
        let mut buf = [0u8; WIRE_DESCRIPTOR_LEN];
        buf[..STATIC_DESCRIPTOR_LEN].copy_from_slice(&self.encode_static());
        buf[STATIC_DESCRIPTOR_LEN..].copy_from_slice(&self.elk_zero);
        buf
    }

    pub fn from_wire_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != WIRE_DESCRIPTOR_LEN {
            return Err(Error::MalformedDescriptor);
        }
        let mut descriptor = Self::decode_static(&bytes[..STATIC_DESCRIPTOR_LEN])?;
        descriptor.elk_zero = bytes[STATIC_DESCRIPTOR_LEN..]
            .try_into()
            .expect("32 byte elk_zero");
        Ok(descriptor)
    }
}

/// One state's punishment evidence, delivered per channel update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HintMsg {
    pub dest_pkh: [u8; 20],
    /// Full txid of the commitment tx this hint punishes.
    pub txid: Txid,
    /// Next leaf of the channel's revocation tree.
    pub elk_scalar: [u8; 32],
    /// 64-byte compact signature over the justice tx spending this state.
    pub sig: [u8; 64],
}

impl HintMsg {
    pub fn to_bytes(&self) -> [u8; HINT_MSG_LEN] {
        let mut buf = [0u8; HINT_MSG_LEN];
        buf[..20].copy_from_slice(&self.dest_pkh);
        buf[20..52].copy_from_slice(self.txid.as_inner());
        buf[52..84].copy_from_slice(&self.elk_scalar);
        buf[84..148].copy_from_slice(&self.sig);
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != HINT_MSG_LEN {
            return Err(Error::MalformedHint);
        }
        Ok(HintMsg {
            dest_pkh: bytes[..20].try_into().expect("20 byte pkh"),
            txid: Txid::from_slice(&bytes[20..52]).expect("32 byte txid"),
            elk_scalar: bytes[52..84].try_into().expect("32 byte scalar"),
            sig: bytes[84..148].try_into().expect("64 byte sig"),
        })
    }
}

/// The 74-byte record stored under a truncated txid: which channel, which
/// state, and the signature that spends the revoked output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdxSig {
    /// Owning channel's local index.
    pub pkh_idx: u32,
    /// State number; persisted as 48 bits.
    pub state_idx: u64,
    pub sig: [u8; 64],
}

impl IdxSig {
    /// The caller guarantees `state_idx` fits in 48 bits; `add_hint`
    /// surfaces StateOverflow before ever constructing one that does not.
    pub fn encode(&self) -> [u8; IDX_SIG_LEN] {
        let mut buf = [0u8; IDX_SIG_LEN];
        buf[..4].copy_from_slice(&self.pkh_idx.to_be_bytes());
        buf[4..10].copy_from_slice(&self.state_idx.to_be_bytes()[2..]);
        buf[10..].copy_from_slice(&self.sig);
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != IDX_SIG_LEN {
            return Err(Error::MalformedHint);
        }
        let mut state_bytes = [0u8; 8];
        state_bytes[2..].copy_from_slice(&bytes[4..10]);
        Ok(IdxSig {
            pkh_idx: u32::from_be_bytes(bytes[..4].try_into().expect("4 byte index")),
            state_idx: u64::from_be_bytes(state_bytes),
            sig: bytes[10..].try_into().expect("64 byte sig"),
        })
    }
}
