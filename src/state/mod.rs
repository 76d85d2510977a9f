pub mod bucket;
pub mod channel;
pub mod ledger;
pub mod node;
pub mod store;

pub use bucket::ChannelBucket;
pub use channel::ChannelState;
pub use ledger::{CoinMover, Ledger};
pub use node::Node;
pub use store::{CacheWrap, KvStore, MemStore, StoreError};
