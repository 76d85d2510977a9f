use crate::handlers::{Auth, BlockInfo, ChannelHandler};
use crate::state::{ledger::Ledger, store::MemStore};
use crate::types::{ChannelId, Coin, CreateMsg, Payment, TransferMsg, UnixTime};
use crate::utils::crypto::{sign_payment, wallet_pubkey};
use ethers::{
    signers::{LocalWallet, Signer},
    types::Address,
};
use std::str::FromStr;

pub const CHAIN_ID: &str = "test-chain";
pub const GENESIS_TIME: i64 = 1_700_000_000;
pub const ONE_HOUR: i64 = 3_600;

pub fn source_wallet() -> LocalWallet {
    LocalWallet::from_str("1234567890123456789012345678901234567890123456789012345678901234")
        .unwrap()
}

pub fn destination_wallet() -> LocalWallet {
    LocalWallet::from_str("4321432143214321432143214321432143214321432143214321432143214321")
        .unwrap()
}

pub fn doge(amount: &str) -> Coin {
    format!("{} DOGE", amount).parse().unwrap()
}

pub fn block_at(time: i64) -> BlockInfo {
    BlockInfo {
        chain_id: CHAIN_ID.to_string(),
        height: 1,
        time: UnixTime(time),
    }
}

pub struct Fixture {
    pub store: MemStore,
    pub handler: ChannelHandler<Ledger>,
    pub ledger: Ledger,
    pub source: LocalWallet,
    pub destination: LocalWallet,
}

impl Fixture {
    /// Source funded with `funds` DOGE.
    pub fn new(funds: &str) -> Self {
        let mut store = MemStore::new();
        let ledger = Ledger;
        let source = source_wallet();
        ledger.credit(&mut store, &source.address(), &doge(funds)).unwrap();
        Self {
            store,
            handler: ChannelHandler::new(Ledger),
            ledger,
            source,
            destination: destination_wallet(),
        }
    }

    pub fn create_msg(&self, total: &str) -> CreateMsg {
        CreateMsg {
            source: self.source.address(),
            source_pubkey: wallet_pubkey(&self.source),
            destination: self.destination.address(),
            total: Some(doge(total)),
            timeout: UnixTime(GENESIS_TIME + ONE_HOUR),
            memo: "test channel".to_string(),
        }
    }

    pub fn open_channel(&mut self, total: &str) -> ChannelId {
        let msg = self.create_msg(total);
        let result = self
            .handler
            .deliver_create(
                &mut self.store,
                &block_at(GENESIS_TIME),
                &Auth::from(self.source.address()),
                &msg,
            )
            .unwrap();
        ChannelId::try_from(result.data.as_slice()).unwrap()
    }

    pub fn signed_transfer(&self, id: ChannelId, amount: &str) -> TransferMsg {
        let payment = Payment {
            chain_id: CHAIN_ID.to_string(),
            channel_id: id,
            amount: doge(amount),
            memo: format!("cumulative {}", amount),
        };
        TransferMsg {
            signature: sign_payment(&self.source, &payment).unwrap(),
            payment,
        }
    }

    pub fn balance(&self, address: &Address) -> Coin {
        self.ledger.balance_of(&self.store, address, "DOGE").unwrap()
    }
}
