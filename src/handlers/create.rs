use crate::handlers::{Auth, BlockInfo, ChannelHandler, TxResult};
use crate::state::{ledger::CoinMover, store::KvStore};
use crate::types::{Coin, CreateMsg, PaychanError, PaymentChannel};
use crate::utils::escrow_address;
use tracing::{debug, info};

impl<M: CoinMover> ChannelHandler<M> {
    pub fn validate_create(
        &self,
        block: &BlockInfo,
        auth: &Auth,
        msg: &CreateMsg,
    ) -> Result<(), PaychanError> {
        msg.validate()?;
        if msg.timeout <= block.time {
            return Err(PaychanError::TimeoutNotInFuture {
                timeout: msg.timeout,
                now: block.time,
            });
        }
        if !auth.has_address(&msg.source) {
            debug!(source = ?msg.source, "create not signed by source");
            return Err(PaychanError::Unauthorized(
                "channel source must sign the create".to_string(),
            ));
        }
        Ok(())
    }

    /// Opens a channel and escrows its total. Returns the new ID as output.
    ///
    /// The record is written before the funds move; an insufficient balance
    /// fails the whole message and the caller discards both writes.
    pub fn deliver_create(
        &self,
        store: &mut dyn KvStore,
        block: &BlockInfo,
        auth: &Auth,
        msg: &CreateMsg,
    ) -> Result<TxResult, PaychanError> {
        self.validate_create(block, auth, msg)?;
        let total = msg.total.clone().ok_or(PaychanError::MissingField("total"))?;

        let id = self.bucket.next_id(store)?;
        let channel = PaymentChannel {
            id,
            source: msg.source,
            source_pubkey: msg.source_pubkey.clone(),
            destination: msg.destination,
            transferred: Coin::zero(total.ticker.clone()),
            total,
            timeout: msg.timeout,
            memo: msg.memo.clone(),
            address: escrow_address(&id),
        };
        self.bucket.save(store, &channel)?;
        self.mover
            .move_coins(store, channel.source, channel.address, &channel.total)?;

        info!(
            channel = %id,
            source = ?channel.source,
            destination = ?channel.destination,
            total = %channel.total,
            "payment channel opened"
        );
        Ok(TxResult {
            data: id.as_bytes().to_vec(),
            log: format!("channel {} opened with {}", id, channel.total),
        })
    }
}
