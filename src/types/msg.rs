//! Transaction messages accepted by the channel handlers.

use crate::types::{
    channel::{validate_address, validate_memo},
    ChannelId, Coin, PaychanError, Payment, PubKey, UnixTime,
};
use crate::utils::crypto::parse_pubkey;
use ethers::types::{Address, Signature};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMsg {
    pub source: Address,
    pub source_pubkey: PubKey,
    pub destination: Address,
    pub total: Option<Coin>,
    pub timeout: UnixTime,
    #[serde(default)]
    pub memo: String,
}

impl CreateMsg {
    pub fn validate(&self) -> Result<(), PaychanError> {
        validate_address("source", &self.source)?;
        validate_address("destination", &self.destination)?;
        parse_pubkey(&self.source_pubkey)?;
        let total = self.total.as_ref().ok_or(PaychanError::MissingField("total"))?;
        total.validate()?;
        if !total.is_positive() {
            return Err(PaychanError::InvalidAmount(format!(
                "channel total {} must be positive",
                total
            )));
        }
        validate_memo(&self.memo)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferMsg {
    pub payment: Payment,
    pub signature: Signature,
}

impl TransferMsg {
    pub fn validate(&self) -> Result<(), PaychanError> {
        self.payment.validate()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseMsg {
    pub channel_id: ChannelId,
    #[serde(default)]
    pub memo: String,
}

impl CloseMsg {
    pub fn validate(&self) -> Result<(), PaychanError> {
        validate_memo(&self.memo)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Msg {
    Create(CreateMsg),
    Transfer(TransferMsg),
    Close(CloseMsg),
}

impl Msg {
    pub fn route(&self) -> &'static str {
        match self {
            Msg::Create(_) => "paychan/create",
            Msg::Transfer(_) => "paychan/transfer",
            Msg::Close(_) => "paychan/close",
        }
    }

    pub fn validate(&self) -> Result<(), PaychanError> {
        match self {
            Msg::Create(msg) => msg.validate(),
            Msg::Transfer(msg) => msg.validate(),
            Msg::Close(msg) => msg.validate(),
        }
    }
}

/// A message plus the submitting signer's sequence number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub nonce: u64,
    pub msg: Msg,
}
