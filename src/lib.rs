//! Unidirectional payment channels for a native-asset ledger.
//!
//! A source escrows funds in a channel, hands the destination off-chain
//! signed cumulative claims, and the chain pays out the latest claim on
//! submission. Only the open and close touch the chain when the destination
//! submits just its final claim.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod state;
pub mod types;
pub mod utils;

pub use config::NodeConfig;
pub use handlers::{Auth, BlockInfo, ChannelHandler, TxResult};
pub use state::{ChannelState, CoinMover, KvStore, Ledger, MemStore, Node};
pub use types::{
    ChannelId, CloseMsg, Coin, CreateMsg, Msg, PaychanError, Payment, PaymentChannel, PubKey,
    TransferMsg, Tx, UnixTime,
};
