//! Elkrem revocation tree.
//!
//! An append-only hash tree in which receiving leaf `n` authorises the
//! receiver to reproduce the scalars of all leaves up to `n`. Nodes are
//! numbered post-order: a node with index `i` at height `h` has right child
//! `i - 1` and left child `i - 2^h`, both one level down. Children derive
//! from their parent as `left = sha256(parent)` and
//! `right = sha256(parent || 0x01)`, so holding a node is holding its whole
//! subtree.

use bitcoin::hashes::{sha256, Hash};

use crate::errors::{Error, Result};

/// Tree height. Indexes run 0..=MAX_INDEX, enough for 2^48 - 1 states.
const MAX_HEIGHT: u8 = 47;
pub const MAX_INDEX: u64 = (1 << 48) - 2;

const NODE_LEN: usize = 8 + 1 + 32;
const MAX_NODES: usize = 64;

fn left_child(hash: &[u8; 32]) -> [u8; 32] {
    sha256::Hash::hash(hash).into_inner()
}

fn right_child(hash: &[u8; 32]) -> [u8; 32] {
    let mut buf = [0u8; 33];
    buf[..32].copy_from_slice(hash);
    buf[32] = 0x01;
    sha256::Hash::hash(&buf).into_inner()
}

/// Walk down from the node (index, height, hash) to the node at `want`.
fn descend(want: u64, mut index: u64, mut height: u8, mut hash: [u8; 32]) -> Option<[u8; 32]> {
    while want < index {
        if height == 0 {
            break;
        }
        if want <= index - (1u64 << height) {
            hash = left_child(&hash);
            index -= 1u64 << height;
        } else {
            hash = right_child(&hash);
            index -= 1;
        }
        height -= 1;
    }
    (want == index).then_some(hash)
}

/// The sender side: derives every node from a single root.
#[derive(Clone, Debug)]
pub struct ElkremSender {
    root: [u8; 32],
}

impl ElkremSender {
    pub fn new(root: [u8; 32]) -> Self {
        ElkremSender { root }
    }

    pub fn at_index(&self, index: u64) -> Result<[u8; 32]> {
        descend(index, MAX_INDEX, MAX_HEIGHT, self.root).ok_or(Error::HashTreeOutOfRange {
            index,
            up_to: MAX_INDEX + 1,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ElkremNode {
    index: u64,
    height: u8,
    hash: [u8; 32],
}

/// The receiver side: a stack of at most 64 nodes covering every index
/// received so far. Whenever the incoming node is the parent of the two
/// nodes on top of the stack, those two collapse into it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElkremReceiver {
    stack: Vec<ElkremNode>,
}

impl ElkremReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of scalars ingested so far.
    pub fn up_to(&self) -> u64 {
        self.stack.last().map(|node| node.index + 1).unwrap_or(0)
    }

    /// Ingest the next scalar. The caller must send nodes in index order;
    /// a node that should be the parent of the two topmost stack entries
    /// but does not hash down to them is rejected.
    pub fn add_next(&mut self, hash: &[u8; 32]) -> Result<()> {
        let mut node = ElkremNode {
            index: 0,
            height: 0,
            hash: *hash,
        };
        if let Some(top) = self.stack.last() {
            node.index = top.index + 1;
        }
        let len = self.stack.len();
        if len >= 2 && self.stack[len - 2].height == self.stack[len - 1].height {
            node.height = self.stack[len - 1].height + 1;
            if left_child(hash) != self.stack[len - 2].hash
                || right_child(hash) != self.stack[len - 1].hash
            {
                return Err(Error::HashTreeReject { index: node.index });
            }
            self.stack.truncate(len - 2);
        }
        self.stack.push(node);
        Ok(())
    }

    /// Reproduce the scalar at `index`, for any index already received.
    pub fn at_index(&self, index: u64) -> Result<[u8; 32]> {
        let out_of_range = Error::HashTreeOutOfRange {
            index,
            up_to: self.up_to(),
        };
        let node = self
            .stack
            .iter()
            .find(|node| node.index >= index)
            .ok_or(out_of_range)?;
        descend(index, node.index, node.height, node.hash).ok_or(Error::HashTreeOutOfRange {
            index,
            up_to: self.up_to(),
        })
    }

    /// Node-count byte followed by 41 bytes per node.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + self.stack.len() * NODE_LEN);
        buf.push(self.stack.len() as u8);
        for node in &self.stack {
            buf.extend_from_slice(&node.index.to_be_bytes());
            buf.push(node.height);
            buf.extend_from_slice(&node.hash);
        }
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let count = *bytes.first().ok_or(Error::MalformedElkrem)? as usize;
        if count > MAX_NODES || bytes.len() != 1 + count * NODE_LEN {
            return Err(Error::MalformedElkrem);
        }
        let mut stack = Vec::with_capacity(count);
        for chunk in bytes[1..].chunks_exact(NODE_LEN) {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(&chunk[9..]);
            stack.push(ElkremNode {
                index: u64::from_be_bytes(chunk[..8].try_into().expect("8 byte index")),
                height: chunk[8],
                hash,
            });
        }
        Ok(ElkremReceiver { stack })
    }
}
