use crate::state::store::KvStore;
use crate::types::{Coin, PaychanError};
use ethers::types::Address;
use std::cmp::Ordering;

/// Moves balances between accounts.
///
/// A move either applies completely or returns an error before writing.
pub trait CoinMover {
    fn move_coins(
        &self,
        store: &mut dyn KvStore,
        src: Address,
        dst: Address,
        amount: &Coin,
    ) -> Result<(), PaychanError>;
}

/// Store-backed wallets, one coin per ticker.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ledger;

impl Ledger {
    fn key(address: &Address) -> Vec<u8> {
        let mut key = b"cash:".to_vec();
        key.extend_from_slice(address.as_bytes());
        key
    }

    pub fn balance(&self, store: &dyn KvStore, address: &Address) -> Result<Vec<Coin>, PaychanError> {
        match store.get(&Self::key(address))? {
            Some(raw) => Ok(serde_json::from_slice(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn balance_of(
        &self,
        store: &dyn KvStore,
        address: &Address,
        ticker: &str,
    ) -> Result<Coin, PaychanError> {
        Ok(self
            .balance(store, address)?
            .into_iter()
            .find(|coin| coin.ticker == ticker)
            .unwrap_or_else(|| Coin::zero(ticker)))
    }

    pub fn credit(
        &self,
        store: &mut dyn KvStore,
        address: &Address,
        amount: &Coin,
    ) -> Result<(), PaychanError> {
        let wallet = self.balance(store, address)?;
        let wallet = adjust(wallet, amount, Coin::checked_add)?;
        self.save_wallet(store, address, wallet)
    }

    fn save_wallet(
        &self,
        store: &mut dyn KvStore,
        address: &Address,
        wallet: Vec<Coin>,
    ) -> Result<(), PaychanError> {
        if wallet.is_empty() {
            store.delete(&Self::key(address))?;
        } else {
            store.set(Self::key(address), serde_json::to_vec(&wallet)?)?;
        }
        Ok(())
    }
}

// Applies `op` to the matching coin and drops coins that reach zero.
fn adjust(
    mut wallet: Vec<Coin>,
    amount: &Coin,
    op: fn(&Coin, &Coin) -> Result<Coin, PaychanError>,
) -> Result<Vec<Coin>, PaychanError> {
    let current = match wallet.iter().position(|coin| coin.same_type(amount)) {
        Some(index) => wallet.remove(index),
        None => Coin::zero(amount.ticker.clone()),
    };
    let updated = op(&current, amount)?;
    if !updated.is_zero() {
        wallet.push(updated);
        wallet.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    }
    Ok(wallet)
}

impl CoinMover for Ledger {
    fn move_coins(
        &self,
        store: &mut dyn KvStore,
        src: Address,
        dst: Address,
        amount: &Coin,
    ) -> Result<(), PaychanError> {
        amount.validate()?;
        if !amount.is_positive() {
            return Err(PaychanError::InvalidAmount(format!(
                "cannot move non-positive amount {}",
                amount
            )));
        }

        let available = self.balance_of(store, &src, &amount.ticker)?;
        if available.compare(amount)? == Ordering::Less {
            return Err(PaychanError::InsufficientFunds {
                address: src,
                needed: amount.clone(),
            });
        }

        // Both wallets are computed before anything is written.
        let source_wallet = adjust(self.balance(store, &src)?, amount, Coin::checked_sub)?;
        if src == dst {
            let wallet = adjust(source_wallet, amount, Coin::checked_add)?;
            return self.save_wallet(store, &src, wallet);
        }
        let destination_wallet = adjust(self.balance(store, &dst)?, amount, Coin::checked_add)?;

        self.save_wallet(store, &src, source_wallet)?;
        self.save_wallet(store, &dst, destination_wallet)
    }
}
