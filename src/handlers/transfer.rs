use crate::handlers::{BlockInfo, ChannelHandler, TxResult};
use crate::state::{ledger::CoinMover, store::KvStore};
use crate::types::{PaychanError, PaymentChannel, TransferMsg};
use crate::utils::verify_payment;
use std::cmp::Ordering;
use tracing::{debug, info};

impl<M: CoinMover> ChannelHandler<M> {
    /// Runs every transfer check in protocol order and returns the stored
    /// channel the claim applies to.
    ///
    /// Claims are cumulative, so the strict `amount > transferred` check is
    /// what rejects replayed and stale envelopes.
    pub fn validate_transfer(
        &self,
        store: &dyn KvStore,
        block: &BlockInfo,
        msg: &TransferMsg,
    ) -> Result<PaymentChannel, PaychanError> {
        msg.validate()?;
        let payment = &msg.payment;

        if payment.chain_id != block.chain_id {
            return Err(PaychanError::ChainMismatch {
                expected: block.chain_id.clone(),
                got: payment.chain_id.clone(),
            });
        }

        let channel = self.bucket.must_get(store, &payment.channel_id)?;

        verify_payment(&channel.source_pubkey, payment, &msg.signature)?;

        if !channel.total.same_type(&payment.amount) {
            return Err(PaychanError::CurrencyMismatch {
                expected: channel.total.ticker.clone(),
                got: payment.amount.ticker.clone(),
            });
        }
        if payment.amount.compare(&channel.total)? == Ordering::Greater {
            return Err(PaychanError::AmountExceedsTotal {
                claimed: payment.amount.clone(),
                total: channel.total.clone(),
            });
        }
        if payment.amount.compare(&channel.transferred)? != Ordering::Greater {
            debug!(
                channel = %channel.id,
                claimed = %payment.amount,
                transferred = %channel.transferred,
                "stale payment claim"
            );
            return Err(PaychanError::NotIncreasing {
                claimed: payment.amount.clone(),
                transferred: channel.transferred.clone(),
            });
        }

        Ok(channel)
    }

    /// Pays out the difference between the claim and what was already
    /// transferred. A claim equal to the total closes the channel.
    pub fn deliver_transfer(
        &self,
        store: &mut dyn KvStore,
        block: &BlockInfo,
        msg: &TransferMsg,
    ) -> Result<TxResult, PaychanError> {
        let channel = self.validate_transfer(store, block, msg)?;
        let payment = &msg.payment;

        let delta = payment.amount.checked_sub(&channel.transferred)?;
        self.mover
            .move_coins(store, channel.address, channel.destination, &delta)?;

        let updated = channel.with_payment(payment.amount.clone(), payment.memo.clone());
        if updated.is_exhausted() {
            self.bucket.delete(store, &updated.id)?;
            info!(channel = %updated.id, total = %updated.total, "payment channel exhausted and closed");
            return Ok(TxResult {
                data: Vec::new(),
                log: format!("channel {} fully paid out and closed", updated.id),
            });
        }

        self.bucket.save(store, &updated)?;
        debug!(
            channel = %updated.id,
            delta = %delta,
            transferred = %updated.transferred,
            "payment claim settled"
        );
        Ok(TxResult {
            data: Vec::new(),
            log: format!("channel {} transferred {}", updated.id, updated.transferred),
        })
    }
}
