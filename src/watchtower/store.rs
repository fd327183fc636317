use bitcoin::Txid;

use crate::elkrem::ElkremReceiver;
use crate::errors::Result;

use super::types::{ChannelDescriptor, HintMsg, IdxSig};

pub trait WatchtowerStore {
    /// Start watching a channel. Assigns and returns the channel's local
    /// index; densely increasing, never reused. The descriptor's `elk_zero`
    /// becomes the first leaf of the channel's revocation tree.
    fn add_channel(&self, descriptor: &ChannelDescriptor) -> Result<u32>;
    /// Store the punishment evidence for one new channel state: advances the
    /// channel's revocation tree by one leaf and files the hint under the
    /// truncated commitment txid, atomically.
    fn add_hint(&self, msg: &HintMsg) -> Result<()>;
    /// Check a candidate txid against the hint index. This is the hot path;
    /// it reads nothing but the hint index.
    fn lookup_hint(&self, txid: &Txid) -> Result<Option<IdxSig>>;
    /// Load the descriptor and revocation tree backing a matched hint, all
    /// from one consistent snapshot.
    fn channel_state_by_index(&self, pkh_idx: u32) -> Result<(ChannelDescriptor, ElkremReceiver)>;
    /// Accept the externally-triggered Swept transition: the channel stays
    /// on disk but refuses further hints.
    fn mark_channel_swept(&self, dest_pkh: &[u8; 20]) -> Result<()>;
    /// Every watched channel as (local index, dest pkh).
    fn watched_channels(&self) -> Result<Vec<(u32, [u8; 20])>>;
}
