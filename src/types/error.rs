use crate::state::store::StoreError;
use crate::types::{ChannelId, Coin, UnixTime};
use axum::http::StatusCode;
use ethers::types::Address;
use thiserror::Error;

/// Every way a channel transaction can be rejected.
///
/// All variants are raised before any write is committed; `Store` and
/// `Serialization` are the only ones that do not describe the submitted
/// message itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaychanError {
    // Malformed input
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid coin: {0}")]
    InvalidCoin(String),
    #[error("memo too long: {len} bytes exceeds {max}")]
    MemoTooLong { len: usize, max: usize },
    #[error("timeout {timeout} is not after block time {now}")]
    TimeoutNotInFuture { timeout: UnixTime, now: UnixTime },
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid public key")]
    InvalidPubKey,
    #[error("invalid channel id: {0}")]
    InvalidChannelId(String),

    #[error("payment channel {0} not found")]
    NotFound(ChannelId),

    // Authorization
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("invalid signature")]
    InvalidSignature,

    #[error("currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    // Channel invariants
    #[error("claimed amount {claimed} exceeds channel total {total}")]
    AmountExceedsTotal { claimed: Coin, total: Coin },
    #[error("claimed amount {claimed} must exceed already transferred {transferred}")]
    NotIncreasing { claimed: Coin, transferred: Coin },

    #[error("chain mismatch: payment for {got}, executing on {expected}")]
    ChainMismatch { expected: String, got: String },

    #[error("insufficient funds: {address:?} cannot cover {needed}")]
    InsufficientFunds { address: Address, needed: Coin },

    #[error("invalid nonce for {signer:?}: expected {expected}, got {got}")]
    InvalidNonce { signer: Address, expected: u64, got: u64 },

    #[error("signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl PaychanError {
    /// Stable failure tag reported to submitters.
    pub fn code(&self) -> &'static str {
        match self {
            PaychanError::MissingField(_)
            | PaychanError::InvalidAmount(_)
            | PaychanError::InvalidCoin(_)
            | PaychanError::MemoTooLong { .. }
            | PaychanError::TimeoutNotInFuture { .. }
            | PaychanError::InvalidAddress(_)
            | PaychanError::InvalidPubKey
            | PaychanError::InvalidChannelId(_) => "malformed_input",
            PaychanError::NotFound(_) => "not_found",
            PaychanError::Unauthorized(_) | PaychanError::InvalidSignature => "unauthorized",
            PaychanError::CurrencyMismatch { .. } => "currency_mismatch",
            PaychanError::AmountExceedsTotal { .. } | PaychanError::NotIncreasing { .. } => {
                "invariant_violation"
            }
            PaychanError::ChainMismatch { .. } => "chain_mismatch",
            PaychanError::InsufficientFunds { .. } => "insufficient_funds",
            PaychanError::InvalidNonce { .. } => "invalid_nonce",
            PaychanError::Signing(_) | PaychanError::Store(_) | PaychanError::Serialization(_) => {
                "internal"
            }
        }
    }
}

impl From<serde_json::Error> for PaychanError {
    fn from(err: serde_json::Error) -> Self {
        PaychanError::Serialization(err.to_string())
    }
}

impl From<&PaychanError> for StatusCode {
    fn from(error: &PaychanError) -> Self {
        match error.code() {
            "malformed_input" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" | "invalid_nonce" => StatusCode::UNAUTHORIZED,
            "currency_mismatch" | "invariant_violation" | "chain_mismatch" => StatusCode::CONFLICT,
            "insufficient_funds" => StatusCode::PAYMENT_REQUIRED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Request-level authentication failures raised by the HTTP middleware.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,
    #[error("Malformed request")]
    MalformedRequest,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Request timestamp outside accepted window")]
    Expired,
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl From<AuthError> for StatusCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingCredentials => StatusCode::UNAUTHORIZED,
            AuthError::MalformedRequest => StatusCode::BAD_REQUEST,
            AuthError::InvalidSignature => StatusCode::UNAUTHORIZED,
            AuthError::Expired => StatusCode::REQUEST_TIMEOUT,
            AuthError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}
