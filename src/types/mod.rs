pub mod channel;
pub mod coin;
pub mod error;
pub mod msg;

pub use channel::{ChannelId, Payment, PaymentChannel, PubKey, UnixTime, MAX_MEMO_LEN};
pub use coin::Coin;
pub use error::{AuthError, PaychanError};
pub use msg::{CloseMsg, CreateMsg, Msg, TransferMsg, Tx};
