use crate::state::store::KvStore;
use crate::types::{ChannelId, PaychanError, PaymentChannel};

pub const BUCKET_NAME: &str = "paychan";

/// Query path under which channel records are exposed to readers.
pub const QUERY_PATH: &str = "channels";

const SEQUENCE_KEY: &[u8] = b"_s.paychan";

/// Channel records keyed by ID, plus the sequence that hands out IDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChannelBucket;

impl ChannelBucket {
    fn key(id: &ChannelId) -> Vec<u8> {
        let mut key = format!("{}:", BUCKET_NAME).into_bytes();
        key.extend_from_slice(id.as_bytes());
        key
    }

    /// Allocates the next ID. The first channel gets ID 1.
    pub fn next_id(&self, store: &mut dyn KvStore) -> Result<ChannelId, PaychanError> {
        let current = match store.get(SEQUENCE_KEY)? {
            Some(raw) => {
                let raw: [u8; 8] = raw.as_slice().try_into().map_err(|_| {
                    PaychanError::Serialization("corrupt channel sequence".to_string())
                })?;
                u64::from_be_bytes(raw)
            }
            None => 0,
        };
        let next = current + 1;
        store.set(SEQUENCE_KEY.to_vec(), next.to_be_bytes().to_vec())?;
        Ok(ChannelId::from(next))
    }

    pub fn get(
        &self,
        store: &dyn KvStore,
        id: &ChannelId,
    ) -> Result<Option<PaymentChannel>, PaychanError> {
        match store.get(&Self::key(id))? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn must_get(
        &self,
        store: &dyn KvStore,
        id: &ChannelId,
    ) -> Result<PaymentChannel, PaychanError> {
        self.get(store, id)?.ok_or(PaychanError::NotFound(*id))
    }

    pub fn save(&self, store: &mut dyn KvStore, channel: &PaymentChannel) -> Result<(), PaychanError> {
        store.set(Self::key(&channel.id), serde_json::to_vec(channel)?)?;
        Ok(())
    }

    pub fn delete(&self, store: &mut dyn KvStore, id: &ChannelId) -> Result<(), PaychanError> {
        store.delete(&Self::key(id))?;
        Ok(())
    }
}
