//! Single-node transaction executor.
//!
//! Transactions are applied strictly one after another. Each delivery runs
//! inside a [`CacheWrap`], so a failing message leaves the store exactly as
//! it was.

use crate::handlers::{Auth, BlockInfo, ChannelHandler, TxResult};
use crate::state::{
    bucket::QUERY_PATH,
    ledger::Ledger,
    store::{CacheWrap, KvStore, MemStore},
};
use crate::types::{ChannelId, Coin, PaychanError, PaymentChannel, Tx, UnixTime};
use ethers::types::Address;
use tracing::debug;

fn nonce_key(signer: &Address) -> Vec<u8> {
    let mut key = b"sigs:".to_vec();
    key.extend_from_slice(signer.as_bytes());
    key
}

fn load_nonce(store: &dyn KvStore, signer: &Address) -> Result<u64, PaychanError> {
    match store.get(&nonce_key(signer))? {
        Some(raw) => Ok(serde_json::from_slice(&raw)?),
        None => Ok(0),
    }
}

fn check_nonce(store: &dyn KvStore, signer: &Address, tx: &Tx) -> Result<u64, PaychanError> {
    let expected = load_nonce(store, signer)?;
    if tx.nonce != expected {
        return Err(PaychanError::InvalidNonce {
            signer: *signer,
            expected,
            got: tx.nonce,
        });
    }
    Ok(expected)
}

pub struct Node<S = MemStore> {
    chain_id: String,
    height: u64,
    store: S,
    ledger: Ledger,
    handler: ChannelHandler<Ledger>,
}

impl Node<MemStore> {
    pub fn in_memory(chain_id: impl Into<String>) -> Self {
        Self::new(chain_id, MemStore::new())
    }
}

impl<S: KvStore> Node<S> {
    pub fn new(chain_id: impl Into<String>, store: S) -> Self {
        Self {
            chain_id: chain_id.into(),
            height: 0,
            store,
            ledger: Ledger,
            handler: ChannelHandler::new(Ledger),
        }
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    fn next_block(&self, time: UnixTime) -> BlockInfo {
        BlockInfo {
            chain_id: self.chain_id.clone(),
            height: self.height + 1,
            time,
        }
    }

    /// Validates `tx` as if it were delivered at `time`, without writing.
    pub fn check_tx(&self, signer: Address, tx: &Tx, time: UnixTime) -> Result<(), PaychanError> {
        check_nonce(&self.store, &signer, tx)?;
        self.handler
            .check(&self.store, &self.next_block(time), &Auth::from(signer), &tx.msg)
    }

    /// Executes `tx` in its own block and commits its writes on success.
    pub fn deliver_tx(
        &mut self,
        signer: Address,
        tx: &Tx,
        time: UnixTime,
    ) -> Result<TxResult, PaychanError> {
        let block = self.next_block(time);
        let auth = Auth::from(signer);

        let mut cache = CacheWrap::new(&mut self.store);
        let nonce = check_nonce(&cache, &signer, tx)?;
        cache.set(nonce_key(&signer), serde_json::to_vec(&(nonce + 1))?)?;

        match self.handler.deliver(&mut cache, &block, &auth, &tx.msg) {
            Ok(result) => {
                cache.write()?;
                self.height = block.height;
                Ok(result)
            }
            Err(err) => {
                debug!(route = tx.msg.route(), signer = ?signer, code = err.code(), "tx rejected: {}", err);
                Err(err)
            }
        }
    }

    /// Credits an account outside any transaction; used for initial balances.
    pub fn credit(&mut self, address: &Address, amount: &Coin) -> Result<(), PaychanError> {
        amount.validate()?;
        self.ledger.credit(&mut self.store, address, amount)
    }

    pub fn channel(&self, id: &ChannelId) -> Result<Option<PaymentChannel>, PaychanError> {
        self.handler.bucket().get(&self.store, id)
    }

    pub fn balance(&self, address: &Address) -> Result<Vec<Coin>, PaychanError> {
        self.ledger.balance(&self.store, address)
    }

    pub fn balance_of(&self, address: &Address, ticker: &str) -> Result<Coin, PaychanError> {
        self.ledger.balance_of(&self.store, address, ticker)
    }

    pub fn nonce(&self, signer: &Address) -> Result<u64, PaychanError> {
        load_nonce(&self.store, signer)
    }

    /// Read-only lookup by registered query path, returning JSON.
    pub fn query(&self, path: &str, key: &[u8]) -> Result<Option<Vec<u8>>, PaychanError> {
        match path {
            QUERY_PATH => {
                let id = ChannelId::try_from(key)?;
                self.channel(&id)?
                    .map(|channel| serde_json::to_vec(&channel).map_err(PaychanError::from))
                    .transpose()
            }
            _ => Ok(None),
        }
    }
}
