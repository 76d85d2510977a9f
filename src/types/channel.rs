use crate::types::{Coin, PaychanError};
use crate::utils::crypto::payment_sign_bytes;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt,
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

/// Upper bound for channel and payment memos, in bytes.
pub const MAX_MEMO_LEN: usize = 128;

pub fn validate_memo(memo: &str) -> Result<(), PaychanError> {
    if memo.len() > MAX_MEMO_LEN {
        return Err(PaychanError::MemoTooLong {
            len: memo.len(),
            max: MAX_MEMO_LEN,
        });
    }
    Ok(())
}

pub fn validate_address(field: &'static str, address: &Address) -> Result<(), PaychanError> {
    if address.is_zero() {
        return Err(PaychanError::InvalidAddress(format!("{} is the zero address", field)));
    }
    Ok(())
}

/// Channel identifier handed out by the channel sequence.
///
/// Serialized as the hex encoding of its 8 big-endian bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId([u8; 8]);

impl ChannelId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn sequence(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

impl From<u64> for ChannelId {
    fn from(seq: u64) -> Self {
        Self(seq.to_be_bytes())
    }
}

impl TryFrom<&[u8]> for ChannelId {
    type Error = PaychanError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.is_empty() {
            return Err(PaychanError::MissingField("channel_id"));
        }
        let raw: [u8; 8] = bytes
            .try_into()
            .map_err(|_| PaychanError::InvalidChannelId(hex::encode(bytes)))?;
        Ok(Self(raw))
    }
}

impl FromStr for ChannelId {
    type Err = PaychanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|_| PaychanError::InvalidChannelId(s.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl TryFrom<String> for ChannelId {
    type Error = PaychanError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        hex::encode(id.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// SEC1-encoded secp256k1 public key, hex in JSON.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PubKey(Vec<u8>);

impl PubKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<String> for PubKey {
    type Error = PaychanError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let bytes = hex::decode(s.trim_start_matches("0x")).map_err(|_| PaychanError::InvalidPubKey)?;
        Ok(Self(bytes))
    }
}

impl From<PubKey> for String {
    fn from(key: PubKey) -> Self {
        hex::encode(key.0)
    }
}

impl fmt::Debug for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PubKey({})", hex::encode(&self.0))
    }
}

/// Chain time in seconds since the unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTime(pub i64);

impl UnixTime {
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        Self(secs)
    }

    pub fn add_secs(self, secs: i64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

impl fmt::Display for UnixTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentChannel {
    pub id: ChannelId,
    pub source: Address,
    pub source_pubkey: PubKey,
    pub destination: Address,
    pub total: Coin,
    pub transferred: Coin,
    pub timeout: UnixTime,
    pub memo: String,
    /// Escrow account holding `total - transferred`.
    pub address: Address,
}

impl PaymentChannel {
    /// Funds still held in escrow.
    pub fn remaining(&self) -> Result<Coin, PaychanError> {
        self.total.checked_sub(&self.transferred)
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.transferred.compare(&self.total), Ok(Ordering::Equal))
    }

    pub fn is_expired(&self, now: UnixTime) -> bool {
        now >= self.timeout
    }

    /// Record after accepting a cumulative claim of `amount`.
    pub fn with_payment(&self, amount: Coin, memo: String) -> PaymentChannel {
        PaymentChannel {
            transferred: amount,
            memo,
            ..self.clone()
        }
    }
}

/// Off-chain cumulative claim signed by the channel source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub chain_id: String,
    pub channel_id: ChannelId,
    pub amount: Coin,
    #[serde(default)]
    pub memo: String,
}

impl Payment {
    pub fn validate(&self) -> Result<(), PaychanError> {
        if self.chain_id.is_empty() {
            return Err(PaychanError::MissingField("chain_id"));
        }
        self.amount.validate()?;
        if !self.amount.is_positive() {
            return Err(PaychanError::InvalidAmount(format!(
                "payment amount {} must be positive",
                self.amount
            )));
        }
        validate_memo(&self.memo)
    }

    /// Bytes the source signs and the chain verifies.
    pub fn sign_bytes(&self) -> Vec<u8> {
        payment_sign_bytes(self)
    }
}
