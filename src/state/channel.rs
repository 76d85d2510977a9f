use crate::config::{NodeConfig, RateLimitConfig};
use crate::handlers::TxResult;
use crate::server::TxService;
use crate::state::node::Node;
use crate::types::{AuthError, ChannelId, Coin, PaychanError, PaymentChannel, Tx, UnixTime};
use async_trait::async_trait;
use ethers::types::Address;
use std::{collections::HashMap, sync::Arc};
use tokio::{sync::RwLock, time::Instant};

/// Node shared across HTTP requests.
///
/// The write lock around the node is what serializes deliveries.
#[derive(Clone)]
pub struct ChannelState {
    pub(crate) node: Arc<RwLock<Node>>,
    chain_id: String,
    rate_limiter: Arc<RwLock<HashMap<Address, (u64, Instant)>>>,
    rate_limit: RateLimitConfig,
    max_timestamp_drift_secs: u64,
}

impl ChannelState {
    pub fn new(node: Node, config: &NodeConfig) -> Self {
        Self {
            chain_id: node.chain_id().to_string(),
            node: Arc::new(RwLock::new(node)),
            rate_limiter: Arc::new(RwLock::new(HashMap::new())),
            rate_limit: config.rate_limit.clone(),
            max_timestamp_drift_secs: config.max_timestamp_drift_secs,
        }
    }

    pub(crate) async fn enforce_rate_limit(&self, sender: Address) -> Result<(), AuthError> {
        let window = std::time::Duration::from_secs(self.rate_limit.window_secs);

        let mut rate_limits = self.rate_limiter.write().await;
        let now = Instant::now();
        rate_limits.retain(|_, (_, last_reset)| now.duration_since(*last_reset) < window);
        let (count, last_reset) = rate_limits.entry(sender).or_insert((0, now));

        if now.duration_since(*last_reset) >= window {
            *count = 1;
            *last_reset = now;
            Ok(())
        } else if *count >= self.rate_limit.max_requests {
            Err(AuthError::RateLimitExceeded)
        } else {
            *count += 1;
            Ok(())
        }
    }
}

#[async_trait]
impl TxService for ChannelState {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    fn max_timestamp_drift_secs(&self) -> u64 {
        self.max_timestamp_drift_secs
    }

    async fn check_rate_limit(&self, signer: Address) -> Result<(), AuthError> {
        self.enforce_rate_limit(signer).await
    }

    async fn deliver_tx(&self, signer: Address, tx: Tx) -> Result<TxResult, PaychanError> {
        self.node.write().await.deliver_tx(signer, &tx, UnixTime::now())
    }

    async fn check_tx(&self, signer: Address, tx: Tx) -> Result<(), PaychanError> {
        self.node.read().await.check_tx(signer, &tx, UnixTime::now())
    }

    async fn channel(&self, id: ChannelId) -> Result<Option<PaymentChannel>, PaychanError> {
        self.node.read().await.channel(&id)
    }

    async fn balance(&self, address: Address) -> Result<Vec<Coin>, PaychanError> {
        self.node.read().await.balance(&address)
    }

    async fn nonce(&self, address: Address) -> Result<u64, PaychanError> {
        self.node.read().await.nonce(&address)
    }
}
