pub mod condition;
pub mod crypto;

pub use condition::{escrow_address, Condition};
pub use crypto::{create_message, sign_payment, verify_payment};
