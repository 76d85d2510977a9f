use crate::handlers::{Auth, BlockInfo, ChannelHandler, TxResult};
use crate::state::{ledger::CoinMover, store::KvStore};
use crate::types::{CloseMsg, PaychanError, PaymentChannel};
use tracing::{debug, info};

impl<M: CoinMover> ChannelHandler<M> {
    /// Who may close:
    /// - anyone, once nothing is left in escrow;
    /// - only the destination, before the timeout;
    /// - anyone, from the timeout on.
    pub fn validate_close(
        &self,
        store: &dyn KvStore,
        block: &BlockInfo,
        auth: &Auth,
        msg: &CloseMsg,
    ) -> Result<PaymentChannel, PaychanError> {
        msg.validate()?;
        let channel = self.bucket.must_get(store, &msg.channel_id)?;

        if channel.is_exhausted() || channel.is_expired(block.time) {
            return Ok(channel);
        }
        if !auth.has_address(&channel.destination) {
            debug!(channel = %channel.id, timeout = %channel.timeout, "early close by non-destination");
            return Err(PaychanError::Unauthorized(format!(
                "only the destination may close before timeout {}",
                channel.timeout
            )));
        }
        Ok(channel)
    }

    /// Returns whatever is left in escrow to the source and drops the record.
    pub fn deliver_close(
        &self,
        store: &mut dyn KvStore,
        block: &BlockInfo,
        auth: &Auth,
        msg: &CloseMsg,
    ) -> Result<TxResult, PaychanError> {
        let channel = self.validate_close(store, block, auth, msg)?;

        let remainder = channel.remaining()?;
        if remainder.is_positive() {
            self.mover
                .move_coins(store, channel.address, channel.source, &remainder)?;
        }
        self.bucket.delete(store, &channel.id)?;

        info!(
            channel = %channel.id,
            transferred = %channel.transferred,
            refunded = %remainder,
            "payment channel closed"
        );
        Ok(TxResult {
            data: Vec::new(),
            log: format!("channel {} closed, {} returned to source", channel.id, remainder),
        })
    }
}
