use crate::types::{PaychanError, Payment, PubKey};
use ethers::{
    core::k256::ecdsa::VerifyingKey,
    signers::LocalWallet,
    types::{Address, RecoveryMessage, Signature},
    utils::{hash_message, public_key_to_address},
};

/// Length-prefixed big-endian encoding used for every signed message.
pub trait SignBytesExt {
    fn put_bytes(&mut self, bytes: &[u8]);
    fn put_i64(&mut self, value: i64);
    fn put_u64(&mut self, value: u64);
}

impl SignBytesExt for Vec<u8> {
    fn put_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        self.extend_from_slice(bytes);
    }

    fn put_i64(&mut self, value: i64) {
        self.extend_from_slice(&value.to_be_bytes());
    }

    fn put_u64(&mut self, value: u64) {
        self.extend_from_slice(&value.to_be_bytes());
    }
}

pub fn payment_sign_bytes(payment: &Payment) -> Vec<u8> {
    let mut message = Vec::new();
    message.put_bytes(payment.chain_id.as_bytes());
    message.put_bytes(payment.channel_id.as_bytes());
    message.put_i64(payment.amount.whole);
    message.put_i64(payment.amount.fractional);
    message.put_bytes(payment.amount.ticker.as_bytes());
    message.put_bytes(payment.memo.as_bytes());
    message
}

/// Message a submitter signs to authenticate an HTTP transaction body.
pub fn create_message(chain_id: &str, timestamp: u64, request_data: &[u8]) -> Vec<u8> {
    let mut message = Vec::new();
    message.put_bytes(chain_id.as_bytes());
    message.put_u64(timestamp);
    message.put_bytes(request_data);
    message
}

pub fn parse_pubkey(key: &PubKey) -> Result<VerifyingKey, PaychanError> {
    VerifyingKey::from_sec1_bytes(key.as_bytes()).map_err(|_| PaychanError::InvalidPubKey)
}

pub fn pubkey_address(key: &PubKey) -> Result<Address, PaychanError> {
    Ok(public_key_to_address(&parse_pubkey(key)?))
}

pub fn wallet_pubkey(wallet: &LocalWallet) -> PubKey {
    let point = wallet.signer().verifying_key().to_encoded_point(true);
    PubKey::from_bytes(point.as_bytes())
}

pub fn recover_signer(message: &[u8], signature: &Signature) -> Result<Address, PaychanError> {
    signature
        .recover(RecoveryMessage::Data(message.to_vec()))
        .map_err(|_| PaychanError::InvalidSignature)
}

/// Checks that `signature` over the payment's sign bytes was produced by `key`.
pub fn verify_payment(
    key: &PubKey,
    payment: &Payment,
    signature: &Signature,
) -> Result<(), PaychanError> {
    let expected = pubkey_address(key)?;
    signature
        .verify(RecoveryMessage::Data(payment.sign_bytes()), expected)
        .map_err(|_| PaychanError::InvalidSignature)
}

/// Produces the detached signature a source hands to its destination.
pub fn sign_payment(wallet: &LocalWallet, payment: &Payment) -> Result<Signature, PaychanError> {
    sign_message(wallet, &payment.sign_bytes())
}

pub fn sign_message(wallet: &LocalWallet, message: &[u8]) -> Result<Signature, PaychanError> {
    wallet
        .sign_hash(hash_message(message))
        .map_err(|e| PaychanError::Signing(e.to_string()))
}
