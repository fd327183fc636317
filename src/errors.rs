use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] rocksdb::Error),
    #[error("channel {} is already being watched", hex::encode(.0))]
    ChannelExists([u8; 20]),
    #[error("no channel watched for pkh {}", hex::encode(.0))]
    UnknownChannel([u8; 20]),
    #[error("no pkh mapped for channel index {0}")]
    UnknownIndex(u32),
    #[error("channel {} has no local index entry", hex::encode(.0))]
    MissingIndex([u8; 20]),
    #[error("malformed channel descriptor")]
    MalformedDescriptor,
    #[error("malformed hint record")]
    MalformedHint,
    #[error("malformed elkrem receiver")]
    MalformedElkrem,
    #[error("elkrem receiver rejected leaf {index}")]
    HashTreeReject { index: u64 },
    #[error("elkrem index {index} out of range, receiver up to {up_to}")]
    HashTreeOutOfRange { index: u64, up_to: u64 },
    #[error("state index {0} does not fit in 48 bits")]
    StateOverflow(u64),
    #[error("no output of the offending tx matches the reconstructed script")]
    ScriptMismatch,
    #[error("sweep amount {0} sat is not positive")]
    UneconomicFee(i64),
    #[error("channel {} is marked swept", hex::encode(.0))]
    ChannelClosed([u8; 20]),
    #[error("secp256k1: {0}")]
    Secp(#[from] secp256k1::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
