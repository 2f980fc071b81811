//! In-memory testing environment and test utilities.
//!
//! [`TestLedger`] plays the ledger executor and the indexing write path
//! against a [`MemoryStore`]: each trade commits a transaction with its
//! receipt, keeps the live record of limit orders up to date and maintains
//! the order table indexes and the owner key lists.
//!
//! [`TestOrder`] is the handle of a committed limit order, to trade against
//! or revoke it later.
//!
//! Lower level helpers ([`TestLedger::commit_logs`],
//! [`TestLedger::list_owner_key`], [`TestLedger::store`]) allow to plant
//! inconsistent or corrupted data.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use alloy::primitives::{hex, keccak256};
use dashmap::DashMap;

use crate::{
    Ledger,
    keys::{self, OrderKey, owner_keys},
    num,
    query::QueryEngine,
    store::MemoryStore,
    types::{
        BuyOrder, LocalOrder, OrderSide, OrderStatus, ReceiptBuyBase, ReceiptLog,
        ReceiptSellBase, SellOrder, TradeReceipt, TxHash, TxResult,
    },
};

const FIRST_HEIGHT: i64 = 100;
const GENESIS_TIME: i64 = 1_600_000_000;
const BLOCK_TIME_SEC: i64 = 5;

/// Engine reading a [`TestLedger`].
pub type TestEngine = QueryEngine<Arc<MemoryStore>, Arc<MemoryStore>, Arc<MemoryStore>>;

#[derive(Debug)]
pub struct TestLedger {
    pub ledger: Ledger,
    pub token_converter: num::Converter,
    pub coin_converter: num::Converter,
    store: Arc<MemoryStore>,
    height: AtomicI64,
    orders: DashMap<String, LocalOrder>,
}

/// Committed limit order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestOrder {
    pub key: OrderKey,
    pub tx_index: String,
}

impl TestOrder {
    /// Order ID.
    pub fn id(&self) -> String {
        self.key.to_string()
    }

    /// Hash of the creating transaction.
    pub fn tx_hash(&self) -> TxHash {
        self.key.tx_hash()
    }
}

/// Committed transaction.
#[derive(Clone, Copy, Debug)]
struct Tx {
    hash: TxHash,
    height: i64,
    block_time: i64,
}

impl Tx {
    fn hash_hex(&self) -> String {
        hex::encode_prefixed(self.hash)
    }

    fn tx_index(&self) -> String {
        format!("{:012}{:06}", self.height, 0)
    }
}

impl Default for TestLedger {
    fn default() -> Self {
        Self::new(Ledger::mainnet())
    }
}

impl TestLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            token_converter: ledger.token_converter(),
            coin_converter: ledger.coin_converter(),
            ledger,
            store: Arc::new(MemoryStore::new()),
            height: AtomicI64::new(FIRST_HEIGHT),
            orders: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Query engine over the ledger stores.
    pub fn engine(&self) -> TestEngine {
        QueryEngine::new(
            self.ledger.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
        )
    }

    /// Current index projection of an order.
    pub fn projection(&self, key: &str) -> Option<LocalOrder> {
        self.orders.get(key).map(|o| o.value().clone())
    }

    /// Places a sell limit order of `total` lots of `amount` tokens at `price`
    /// per lot.
    pub async fn sell_limit(
        &self,
        owner: &str,
        token: &str,
        amount: &str,
        price: &str,
        total: i64,
    ) -> TestOrder {
        let tx = self.next_tx();
        let key = OrderKey::Sell(tx.hash);
        let base = ReceiptSellBase {
            token_symbol: token.to_string(),
            owner: owner.to_string(),
            amount_per_boardlot: amount.to_string(),
            min_boardlot: 1,
            price_per_boardlot: price.to_string(),
            total_boardlot: total,
            sell_id: key.to_string(),
            status: OrderStatus::OnSale.name().to_string(),
            tx_hash: tx.hash_hex(),
            height: tx.height,
            asset_exec: self.ledger.asset_exec().to_string(),
            ..Default::default()
        };
        self.commit(tx, &[ReceiptLog::from_receipt(&TradeReceipt::SellLimit(base))]);

        let order = LocalOrder {
            is_sell: true,
            status: OrderStatus::OnSale.code(),
            owner: owner.to_string(),
            tx_index: tx.tx_index(),
            key: key.to_string(),
            amount_per_boardlot: self.amount(amount),
            min_boardlot: 1,
            price_per_boardlot: self.price(price),
            total_boardlot: total,
            sell_id: key.to_string(),
            tx_hash: tx.hash_hex(),
            height: tx.height,
            block_time: tx.block_time,
            ..self.pair(token)
        };
        self.put_live(&order);
        self.project(order).await;
        TestOrder {
            key,
            tx_index: tx.tx_index(),
        }
    }

    /// Places a buy limit order of `total` lots of `amount` tokens at `price`
    /// per lot.
    pub async fn buy_limit(
        &self,
        owner: &str,
        token: &str,
        amount: &str,
        price: &str,
        total: i64,
    ) -> TestOrder {
        let tx = self.next_tx();
        let key = OrderKey::Buy(tx.hash);
        let base = ReceiptBuyBase {
            token_symbol: token.to_string(),
            owner: owner.to_string(),
            amount_per_boardlot: amount.to_string(),
            min_boardlot: 1,
            price_per_boardlot: price.to_string(),
            total_boardlot: total,
            buy_id: key.to_string(),
            status: OrderStatus::OnBuy.name().to_string(),
            tx_hash: tx.hash_hex(),
            height: tx.height,
            asset_exec: self.ledger.asset_exec().to_string(),
            ..Default::default()
        };
        self.commit(tx, &[ReceiptLog::from_receipt(&TradeReceipt::BuyLimit(base))]);

        let order = LocalOrder {
            is_sell: false,
            status: OrderStatus::OnBuy.code(),
            owner: owner.to_string(),
            tx_index: tx.tx_index(),
            key: key.to_string(),
            amount_per_boardlot: self.amount(amount),
            min_boardlot: 1,
            price_per_boardlot: self.price(price),
            total_boardlot: total,
            buy_id: key.to_string(),
            tx_hash: tx.hash_hex(),
            height: tx.height,
            block_time: tx.block_time,
            ..self.pair(token)
        };
        self.put_live(&order);
        self.project(order).await;
        TestOrder {
            key,
            tx_index: tx.tx_index(),
        }
    }

    /// Buys `lots` lots out of a sell limit order, returns the market buy
    /// transaction hash.
    pub async fn buy_market(&self, owner: &str, sell: &TestOrder, lots: i64) -> TxHash {
        let maker = self.fill(sell, lots).await;
        let tx = self.next_tx();
        let base = ReceiptBuyBase {
            token_symbol: maker.asset_symbol.clone(),
            owner: owner.to_string(),
            amount_per_boardlot: self.decimal_amount(maker.amount_per_boardlot),
            min_boardlot: maker.min_boardlot,
            price_per_boardlot: self.decimal_price(maker.price_per_boardlot),
            total_boardlot: lots,
            bought_boardlot: lots,
            sell_id: sell.id(),
            status: OrderStatus::BoughtOut.name().to_string(),
            tx_hash: tx.hash_hex(),
            height: tx.height,
            asset_exec: maker.asset_exec.clone(),
            ..Default::default()
        };
        self.commit(tx, &[ReceiptLog::from_receipt(&TradeReceipt::BuyMarket(base))]);
        self.project(LocalOrder {
            is_sell: false,
            status: OrderStatus::BoughtOut.code(),
            owner: owner.to_string(),
            tx_index: tx.tx_index(),
            key: tx.hash_hex(),
            total_boardlot: lots,
            traded_boardlot: lots,
            sell_id: sell.id(),
            buy_id: String::new(),
            tx_hash: tx.hash_hex(),
            height: tx.height,
            block_time: tx.block_time,
            ..maker
        })
        .await;
        tx.hash
    }

    /// Sells `lots` lots into a buy limit order, returns the market sell
    /// transaction hash.
    pub async fn sell_market(&self, owner: &str, buy: &TestOrder, lots: i64) -> TxHash {
        let maker = self.fill(buy, lots).await;
        let tx = self.next_tx();
        let base = ReceiptSellBase {
            token_symbol: maker.asset_symbol.clone(),
            owner: owner.to_string(),
            amount_per_boardlot: self.decimal_amount(maker.amount_per_boardlot),
            min_boardlot: maker.min_boardlot,
            price_per_boardlot: self.decimal_price(maker.price_per_boardlot),
            total_boardlot: lots,
            sold_boardlot: lots,
            buy_id: buy.id(),
            status: OrderStatus::SoldOut.name().to_string(),
            tx_hash: tx.hash_hex(),
            height: tx.height,
            asset_exec: maker.asset_exec.clone(),
            ..Default::default()
        };
        self.commit(tx, &[ReceiptLog::from_receipt(&TradeReceipt::SellMarket(base))]);
        self.project(LocalOrder {
            is_sell: true,
            status: OrderStatus::SoldOut.code(),
            owner: owner.to_string(),
            tx_index: tx.tx_index(),
            key: tx.hash_hex(),
            total_boardlot: lots,
            traded_boardlot: lots,
            buy_id: buy.id(),
            sell_id: String::new(),
            tx_hash: tx.hash_hex(),
            height: tx.height,
            block_time: tx.block_time,
            ..maker
        })
        .await;
        tx.hash
    }

    /// Revokes a sell limit order, returns the revoke transaction hash.
    pub async fn sell_revoke(&self, sell: &TestOrder) -> TxHash {
        self.revoke(sell, OrderStatus::Revoked).await
    }

    /// Revokes a buy limit order, returns the revoke transaction hash.
    pub async fn buy_revoke(&self, buy: &TestOrder) -> TxHash {
        self.revoke(buy, OrderStatus::BuyRevoked).await
    }

    async fn revoke(&self, order: &TestOrder, status: OrderStatus) -> TxHash {
        let revoked = LocalOrder {
            status: status.code(),
            ..self.existing(order)
        };
        let tx = self.next_tx();
        let receipt = if revoked.is_sell {
            TradeReceipt::SellRevoke(ReceiptSellBase {
                sold_boardlot: revoked.traded_boardlot,
                sell_id: revoked.sell_id.clone(),
                ..self.sell_base(&revoked, tx)
            })
        } else {
            TradeReceipt::BuyRevoke(ReceiptBuyBase {
                bought_boardlot: revoked.traded_boardlot,
                buy_id: revoked.buy_id.clone(),
                ..self.buy_base(&revoked, tx)
            })
        };
        self.commit(tx, &[ReceiptLog::from_receipt(&receipt)]);
        self.put_live(&revoked);
        self.project(revoked).await;
        tx.hash
    }

    /// Commits a transaction with arbitrary logs.
    pub fn commit_logs(&self, logs: Vec<ReceiptLog>) -> TxHash {
        let tx = self.next_tx();
        self.commit(tx, &logs);
        tx.hash
    }

    /// Lists a raw key among the orders of an owner in a status, the way the
    /// write path lists order keys.
    pub async fn list_owner_key(&self, side: OrderSide, owner: &str, status: i32, key: &str) {
        let prefix = owner_keys::by_status(side, owner, status);
        self.store
            .put_local(owner_keys::entry(&prefix, key), key.as_bytes().to_vec())
            .await;
    }

    /// Removes the live record of a limit order.
    pub fn forget_live(&self, order: &TestOrder) {
        self.store.delete_state(order.id().as_bytes());
    }

    fn next_tx(&self) -> Tx {
        let height = self.height.fetch_add(1, Ordering::Relaxed);
        Tx {
            hash: keccak256(height.to_be_bytes()),
            height,
            block_time: GENESIS_TIME + (height - FIRST_HEIGHT) * BLOCK_TIME_SEC,
        }
    }

    fn commit(&self, tx: Tx, logs: &[ReceiptLog]) {
        self.store
            .put_tx(TxResult {
                tx_hash: tx.hash_hex(),
                height: tx.height,
                block_time: tx.block_time,
                logs: logs.to_vec(),
            })
            .expect("TestLedger: commit tx");
    }

    async fn fill(&self, order: &TestOrder, lots: i64) -> LocalOrder {
        let current = self.existing(order);
        let traded_boardlot = current.traded_boardlot + lots;
        assert!(traded_boardlot <= current.total_boardlot, "TestLedger: overfill");
        let status = match (current.is_sell, traded_boardlot == current.total_boardlot) {
            (true, true) => OrderStatus::SoldOut.code(),
            (false, true) => OrderStatus::BoughtOut.code(),
            (_, false) => current.status,
        };
        let filled = LocalOrder {
            traded_boardlot,
            status,
            ..current
        };
        self.put_live(&filled);
        self.project(filled.clone()).await;
        filled
    }

    fn existing(&self, order: &TestOrder) -> LocalOrder {
        self.projection(&order.id())
            .expect("TestLedger: order was not placed")
    }

    /// Live record of a limit order projection.
    fn put_live(&self, order: &LocalOrder) {
        let value = if order.is_sell {
            serde_json::to_vec(&SellOrder {
                token_symbol: order.asset_symbol.clone(),
                address: order.owner.clone(),
                amount_per_boardlot: order.amount_per_boardlot,
                min_boardlot: order.min_boardlot,
                price_per_boardlot: order.price_per_boardlot,
                total_boardlot: order.total_boardlot,
                sold_boardlot: order.traded_boardlot,
                sell_id: order.sell_id.clone(),
                status: order.status,
                height: order.height,
                asset_exec: order.asset_exec.clone(),
                ..Default::default()
            })
        } else {
            serde_json::to_vec(&BuyOrder {
                token_symbol: order.asset_symbol.clone(),
                address: order.owner.clone(),
                amount_per_boardlot: order.amount_per_boardlot,
                min_boardlot: order.min_boardlot,
                price_per_boardlot: order.price_per_boardlot,
                total_boardlot: order.total_boardlot,
                bought_boardlot: order.traded_boardlot,
                buy_id: order.buy_id.clone(),
                status: order.status,
                height: order.height,
                asset_exec: order.asset_exec.clone(),
            })
        };
        self.store.put_state(
            order.key.clone().into_bytes(),
            value.expect("TestLedger: encode live order"),
        );
    }

    /// Replaces the projection of an order in the order table, its indexes
    /// and the owner key lists.
    async fn project(&self, order: LocalOrder) {
        let side = order.side();
        if let Some(previous) = self.orders.get(&order.key).map(|o| o.value().clone()) {
            for index in keys::ORDER_INDEXES {
                self.store.delete_local(&index.key(&previous)).await;
            }
            let prefix = owner_keys::by_status(side, &previous.owner, previous.status);
            self.store
                .delete_local(&owner_keys::entry(&prefix, &previous.key))
                .await;
        }

        let row = serde_json::to_vec(&order).expect("TestLedger: encode order row");
        self.store
            .put_local(keys::primary_key(&order.tx_index), row.clone())
            .await;
        for index in keys::ORDER_INDEXES {
            self.store.put_local(index.key(&order), row.clone()).await;
        }
        for prefix in [
            owner_keys::by_addr(side, &order.owner),
            owner_keys::by_token(side, &order.owner, &order.asset_symbol),
            owner_keys::by_status(side, &order.owner, order.status),
        ] {
            self.store
                .put_local(
                    owner_keys::entry(&prefix, &order.key),
                    order.key.clone().into_bytes(),
                )
                .await;
        }
        self.orders.insert(order.key.clone(), order);
    }

    fn pair(&self, token: &str) -> LocalOrder {
        LocalOrder {
            asset_symbol: token.to_string(),
            asset_exec: self.ledger.asset_exec().to_string(),
            price_symbol: self.ledger.coin_symbol().to_string(),
            price_exec: self.ledger.price_exec().to_string(),
            ..Default::default()
        }
    }

    fn sell_base(&self, order: &LocalOrder, tx: Tx) -> ReceiptSellBase {
        ReceiptSellBase {
            token_symbol: order.asset_symbol.clone(),
            owner: order.owner.clone(),
            amount_per_boardlot: self.decimal_amount(order.amount_per_boardlot),
            min_boardlot: order.min_boardlot,
            price_per_boardlot: self.decimal_price(order.price_per_boardlot),
            total_boardlot: order.total_boardlot,
            status: self.status_name(order.status),
            tx_hash: tx.hash_hex(),
            height: tx.height,
            asset_exec: order.asset_exec.clone(),
            ..Default::default()
        }
    }

    fn buy_base(&self, order: &LocalOrder, tx: Tx) -> ReceiptBuyBase {
        ReceiptBuyBase {
            token_symbol: order.asset_symbol.clone(),
            owner: order.owner.clone(),
            amount_per_boardlot: self.decimal_amount(order.amount_per_boardlot),
            min_boardlot: order.min_boardlot,
            price_per_boardlot: self.decimal_price(order.price_per_boardlot),
            total_boardlot: order.total_boardlot,
            status: self.status_name(order.status),
            tx_hash: tx.hash_hex(),
            height: tx.height,
            asset_exec: order.asset_exec.clone(),
            ..Default::default()
        }
    }

    fn status_name(&self, code: i32) -> String {
        OrderStatus::from_code(code)
            .map(|s| s.name().to_string())
            .unwrap_or_default()
    }

    fn amount(&self, value: &str) -> i64 {
        self.token_converter
            .normalize(value)
            .expect("TestLedger: amount")
    }

    fn price(&self, value: &str) -> i64 {
        self.coin_converter.normalize(value).expect("TestLedger: price")
    }

    fn decimal_amount(&self, value: i64) -> String {
        self.token_converter.to_decimal(value).to_string()
    }

    fn decimal_price(&self, value: i64) -> String {
        self.coin_converter.to_decimal(value).to_string()
    }
}
