mod actor;
mod justice;
mod scripts;
mod store;
mod types;

pub use actor::{WatchtowerActor, WatchtowerMessage};
pub use justice::build_justice_tx;
pub use scripts::{commit_script, p2wpkh_from_pkh, p2wsh_wrap};
pub use store::WatchtowerStore;
pub use types::{
    hint_key, secp256k1_instance, ChannelDescriptor, HintMsg, IdxSig, HINT_KEY_LEN, HINT_MSG_LEN,
    IDX_SIG_LEN, STATIC_DESCRIPTOR_LEN, WIRE_DESCRIPTOR_LEN,
};
