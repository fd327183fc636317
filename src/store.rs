use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use bitcoin::Txid;
use rocksdb::{prelude::*, DBCompressionType, IteratorMode, WriteBatch, DB};
use tracing::debug;

use crate::elkrem::ElkremReceiver;
use crate::errors::{Error, Result};
use crate::watchtower::{
    hint_key, ChannelDescriptor, HintMsg, IdxSig, WatchtowerStore, HINT_KEY_LEN,
    STATIC_DESCRIPTOR_LEN,
};

///
/// +--------------+---------------------------+----------------------+
/// | KeyPrefix::  | Key::                     | Value::              |
/// +--------------+---------------------------+----------------------+
/// | 0            | local_index u32 BE        | dest_pkh [20]        |
/// | 32           | dest_pkh | "sta"          | static descriptor    |
/// | 32           | dest_pkh | "elk"          | elkrem receiver      |
/// | 32           | dest_pkh | "idx"          | local_index u32 BE   |
/// | 32           | dest_pkh | "swp"          | [1] (swept marker)   |
/// | 64           | txid[0:16]                | IdxSig [74]          |
/// +--------------+---------------------------+----------------------+
///
/// The prefix-64 namespace holds one record per channel state and dominates
/// the on-disk size; the candidate-txid lookup touches nothing else.
pub const PKH_MAP_PREFIX: u8 = 0;
pub const CHANNEL_DATA_PREFIX: u8 = 32;
pub const HINT_INDEX_PREFIX: u8 = 64;

const KEY_STATIC: &[u8] = b"sta";
const KEY_ELKREM: &[u8] = b"elk";
const KEY_INDEX: &[u8] = b"idx";
const KEY_SWEPT: &[u8] = b"swp";

fn pkh_map_key(local_index: u32) -> [u8; 5] {
    let mut key = [PKH_MAP_PREFIX; 5];
    key[1..].copy_from_slice(&local_index.to_be_bytes());
    key
}

fn channel_data_key(dest_pkh: &[u8; 20], sub_key: &[u8]) -> Vec<u8> {
    [&[CHANNEL_DATA_PREFIX], dest_pkh.as_slice(), sub_key].concat()
}

fn hint_index_key(key: &[u8; HINT_KEY_LEN]) -> [u8; 1 + HINT_KEY_LEN] {
    let mut full = [HINT_INDEX_PREFIX; 1 + HINT_KEY_LEN];
    full[1..].copy_from_slice(key);
    full
}

#[derive(Clone)]
pub struct Store {
    db: Arc<DB>,
    // WriteBatch makes each commit atomic but does not serialise the
    // read-modify-write sequences around it; writers take this lock.
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut options = Options::default();
        options.create_if_missing(true);
        options.set_compression_type(DBCompressionType::Lz4);
        let db = Arc::new(DB::open(&options, path)?);
        Ok(Self {
            db,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn get<K: AsRef<[u8]>>(&self, key: K) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key.as_ref())?.map(|v| v.to_vec()))
    }

    fn batch(&self) -> Batch {
        Batch {
            db: Arc::clone(&self.db),
            wb: WriteBatch::default(),
        }
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().expect("store writer lock poisoned")
    }

    pub(crate) fn prefix_iterator<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> impl Iterator<Item = (Box<[u8]>, Box<[u8]>)> + 'a {
        self.db
            .prefix_iterator(prefix)
            .take_while(move |(col_key, _)| col_key.starts_with(prefix))
    }

    /// Largest assigned channel index, read from the tail of the pkh map.
    fn last_assigned_index(&self) -> Option<u32> {
        let mut read_options = ReadOptions::default();
        read_options.set_iterate_lower_bound([PKH_MAP_PREFIX].as_ref());
        read_options.set_iterate_upper_bound([PKH_MAP_PREFIX + 1].as_ref());
        let mut iter = self.db.get_iter(&read_options, IteratorMode::End);
        iter.next().map(|(key, _)| {
            u32::from_be_bytes(key[1..].try_into().expect("pkh map key is prefix + u32"))
        })
    }
}

pub struct Batch {
    db: Arc<DB>,
    wb: WriteBatch,
}

impl Batch {
    fn put_kv(&mut self, key_value: KeyValue) -> Result<()> {
        let (key, value) = match key_value {
            KeyValue::PkhMap(local_index, dest_pkh) => {
                (pkh_map_key(local_index).to_vec(), dest_pkh.to_vec())
            }
            KeyValue::ChannelStatic(dest_pkh, descriptor) => (
                channel_data_key(&dest_pkh, KEY_STATIC),
                descriptor.to_vec(),
            ),
            KeyValue::ChannelElkrem(dest_pkh, receiver) => {
                (channel_data_key(&dest_pkh, KEY_ELKREM), receiver)
            }
            KeyValue::ChannelIndex(dest_pkh, local_index) => (
                channel_data_key(&dest_pkh, KEY_INDEX),
                local_index.to_be_bytes().to_vec(),
            ),
            KeyValue::ChannelSwept(dest_pkh) => {
                (channel_data_key(&dest_pkh, KEY_SWEPT), vec![1])
            }
            KeyValue::Hint(key, isig) => (hint_index_key(&key).to_vec(), isig.encode().to_vec()),
        };
        self.put(key, value)
    }

    fn put<K: AsRef<[u8]>, V: AsRef<[u8]>>(&mut self, key: K, value: V) -> Result<()> {
        Ok(self.wb.put(key, value)?)
    }

    fn commit(self) -> Result<()> {
        Ok(self.db.write(&self.wb)?)
    }
}

enum KeyValue {
    PkhMap(u32, [u8; 20]),
    ChannelStatic([u8; 20], [u8; STATIC_DESCRIPTOR_LEN]),
    ChannelElkrem([u8; 20], Vec<u8>),
    ChannelIndex([u8; 20], u32),
    ChannelSwept([u8; 20]),
    Hint([u8; HINT_KEY_LEN], IdxSig),
}

impl WatchtowerStore for Store {
    fn add_channel(&self, descriptor: &ChannelDescriptor) -> Result<u32> {
        let _guard = self.lock_writer();
        let dest_pkh = descriptor.dest_pkh;
        if self.get(channel_data_key(&dest_pkh, KEY_STATIC))?.is_some() {
            return Err(Error::ChannelExists(dest_pkh));
        }
        // 4B channels forever; densely assigned, never reused.
        let local_index = match self.last_assigned_index() {
            Some(last) => last.checked_add(1).expect("channel index space exhausted"),
            None => 0,
        };

        let mut receiver = ElkremReceiver::new();
        receiver
            .add_next(&descriptor.elk_zero)
            .expect("first leaf cannot be rejected");

        let mut batch = self.batch();
        batch.put_kv(KeyValue::ChannelStatic(dest_pkh, descriptor.encode_static()))?;
        batch.put_kv(KeyValue::ChannelElkrem(dest_pkh, receiver.to_bytes()))?;
        batch.put_kv(KeyValue::ChannelIndex(dest_pkh, local_index))?;
        batch.put_kv(KeyValue::PkhMap(local_index, dest_pkh))?;
        batch.commit()?;
        debug!(
            "watching channel {} as index {}",
            hex::encode(dest_pkh),
            local_index
        );
        Ok(local_index)
    }

    fn add_hint(&self, msg: &HintMsg) -> Result<()> {
        let _guard = self.lock_writer();
        let dest_pkh = msg.dest_pkh;
        let elk_bytes = self
            .get(channel_data_key(&dest_pkh, KEY_ELKREM))?
            .ok_or(Error::UnknownChannel(dest_pkh))?;
        if self.get(channel_data_key(&dest_pkh, KEY_SWEPT))?.is_some() {
            return Err(Error::ChannelClosed(dest_pkh));
        }

        let mut receiver = ElkremReceiver::from_bytes(&elk_bytes)?;
        receiver.add_next(&msg.elk_scalar)?;
        // State number taken after the add; the record keeps 48 bits of it.
        let state_idx = receiver.up_to() - 1;
        if state_idx >> 48 != 0 {
            return Err(Error::StateOverflow(state_idx));
        }

        let idx_bytes = self
            .get(channel_data_key(&dest_pkh, KEY_INDEX))?
            .ok_or(Error::MissingIndex(dest_pkh))?;
        let pkh_idx = u32::from_be_bytes(
            idx_bytes
                .as_slice()
                .try_into()
                .map_err(|_| Error::MissingIndex(dest_pkh))?,
        );

        let isig = IdxSig {
            pkh_idx,
            state_idx,
            sig: msg.sig,
        };
        let mut batch = self.batch();
        batch.put_kv(KeyValue::ChannelElkrem(dest_pkh, receiver.to_bytes()))?;
        batch.put_kv(KeyValue::Hint(hint_key(&msg.txid), isig))?;
        batch.commit()?;
        debug!(
            "stored hint for channel index {} state {}",
            pkh_idx, state_idx
        );
        Ok(())
    }

    fn lookup_hint(&self, txid: &Txid) -> Result<Option<IdxSig>> {
        match self.get(hint_index_key(&hint_key(txid)))? {
            Some(bytes) => Ok(Some(IdxSig::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    // Three dependent reads, but every value involved is immutable or
    // append-only: the pkh map entry and the static descriptor never change,
    // and the elkrem receiver only ever advances. A reader can only observe
    // a tree at least as new as the hint that brought it here.
    fn channel_state_by_index(&self, pkh_idx: u32) -> Result<(ChannelDescriptor, ElkremReceiver)> {
        let dest_pkh: [u8; 20] = self
            .get(pkh_map_key(pkh_idx))?
            .ok_or(Error::UnknownIndex(pkh_idx))?
            .try_into()
            .expect("pkh map value is 20 bytes");
        let static_bytes = self
            .get(channel_data_key(&dest_pkh, KEY_STATIC))?
            .ok_or(Error::UnknownChannel(dest_pkh))?;
        let descriptor = ChannelDescriptor::decode_static(&static_bytes)?;
        let elk_bytes = self
            .get(channel_data_key(&dest_pkh, KEY_ELKREM))?
            .ok_or(Error::UnknownChannel(dest_pkh))?;
        let receiver = ElkremReceiver::from_bytes(&elk_bytes)?;
        Ok((descriptor, receiver))
    }

    fn mark_channel_swept(&self, dest_pkh: &[u8; 20]) -> Result<()> {
        let _guard = self.lock_writer();
        if self.get(channel_data_key(dest_pkh, KEY_STATIC))?.is_none() {
            return Err(Error::UnknownChannel(*dest_pkh));
        }
        let mut batch = self.batch();
        batch.put_kv(KeyValue::ChannelSwept(*dest_pkh))?;
        batch.commit()
    }

    fn watched_channels(&self) -> Result<Vec<(u32, [u8; 20])>> {
        let prefix = [PKH_MAP_PREFIX];
        Ok(self
            .prefix_iterator(prefix.as_ref())
            .map(|(key, value)| {
                let local_index =
                    u32::from_be_bytes(key[1..].try_into().expect("pkh map key is prefix + u32"));
                let dest_pkh: [u8; 20] = value
                    .as_ref()
                    .try_into()
                    .expect("pkh map value is 20 bytes");
                (local_index, dest_pkh)
            })
            .collect())
    }
}
