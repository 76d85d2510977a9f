//! Channel lifecycle handlers.
//!
//! Each operation is split into a `validate_*` step that only reads and a
//! `deliver_*` step that re-runs validation and then writes. A rejected
//! message never touches the store.

pub mod close;
pub mod create;
pub mod transfer;

#[cfg(test)]
pub(crate) mod test_utils;

use crate::state::{bucket::ChannelBucket, ledger::CoinMover, store::KvStore};
use crate::types::{Msg, PaychanError, UnixTime};
use ethers::types::Address;
use std::collections::BTreeSet;

/// Addresses whose signatures authenticated the current transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Auth {
    signers: BTreeSet<Address>,
}

impl Auth {
    pub fn new(signers: impl IntoIterator<Item = Address>) -> Self {
        Self {
            signers: signers.into_iter().collect(),
        }
    }

    pub fn has_address(&self, address: &Address) -> bool {
        self.signers.contains(address)
    }

    pub fn signers(&self) -> impl Iterator<Item = &Address> {
        self.signers.iter()
    }
}

impl From<Address> for Auth {
    fn from(signer: Address) -> Self {
        Self::new([signer])
    }
}

/// Block the transaction executes in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    pub chain_id: String,
    pub height: u64,
    pub time: UnixTime,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxResult {
    /// Raw output bytes; the new channel ID for a create.
    pub data: Vec<u8>,
    pub log: String,
}

pub struct ChannelHandler<M> {
    mover: M,
    bucket: ChannelBucket,
}

impl<M: CoinMover> ChannelHandler<M> {
    pub fn new(mover: M) -> Self {
        Self {
            mover,
            bucket: ChannelBucket,
        }
    }

    pub fn bucket(&self) -> &ChannelBucket {
        &self.bucket
    }

    pub fn check(
        &self,
        store: &dyn KvStore,
        block: &BlockInfo,
        auth: &Auth,
        msg: &Msg,
    ) -> Result<(), PaychanError> {
        match msg {
            Msg::Create(msg) => self.validate_create(block, auth, msg),
            Msg::Transfer(msg) => self.validate_transfer(store, block, msg).map(|_| ()),
            Msg::Close(msg) => self.validate_close(store, block, auth, msg).map(|_| ()),
        }
    }

    pub fn deliver(
        &self,
        store: &mut dyn KvStore,
        block: &BlockInfo,
        auth: &Auth,
        msg: &Msg,
    ) -> Result<TxResult, PaychanError> {
        match msg {
            Msg::Create(msg) => self.deliver_create(store, block, auth, msg),
            Msg::Transfer(msg) => self.deliver_transfer(store, block, msg),
            Msg::Close(msg) => self.deliver_close(store, block, auth, msg),
        }
    }
}
