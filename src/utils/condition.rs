//! Condition addresses: accounts no private key controls.
//!
//! A condition names the extension that owns it, a kind tag and opaque data.
//! Only the owning extension's logic moves funds in or out of the derived
//! address.

use crate::types::ChannelId;
use ethers::{types::Address, utils::keccak256};

pub const PAYCHAN_EXTENSION: &str = "paychan";
pub const CHANNEL_KIND: &str = "channel";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Condition {
    pub extension: String,
    pub kind: String,
    pub data: Vec<u8>,
}

impl Condition {
    pub fn new(extension: &str, kind: &str, data: &[u8]) -> Self {
        Self {
            extension: extension.to_string(),
            kind: kind.to_string(),
            data: data.to_vec(),
        }
    }

    /// `extension/kind/` followed by the raw data.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = format!("{}/{}/", self.extension, self.kind).into_bytes();
        bytes.extend_from_slice(&self.data);
        bytes
    }

    pub fn address(&self) -> Address {
        Address::from_slice(&keccak256(self.to_bytes())[12..])
    }
}

pub fn escrow_condition(id: &ChannelId) -> Condition {
    Condition::new(PAYCHAN_EXTENSION, CHANNEL_KIND, id.as_bytes())
}

pub fn escrow_address(id: &ChannelId) -> Address {
    escrow_condition(id).address()
}
