//! Key codec.
//!
//! Two key families are interpreted here:
//!
//! * Order keys, stored as index values and used as order table primary keys.
//!   A limit order is known by its ID, the creating transaction hash with the
//!   `0x` prefix replaced by a side tag; other orders are known by the bare
//!   transaction hash. [`OrderKey`] is the decoded form.
//!
//! * Local database keys of the order table, its indexes ([`IndexDef`]) and
//!   the owner key lists ([`owner_keys`]).

use std::{fmt, marker::PhantomData};

use alloy::primitives::hex;
use itertools::Itertools;

use crate::{
    error::{QueryError, QueryResult},
    types::{LocalOrder, OrderSide, TxHash},
};

/// Tag of sell order IDs.
pub const SELL_ID_PREFIX: &str = "mavl-trade-sell-";

/// Tag of buy order IDs.
pub const BUY_ID_PREFIX: &str = "mavl-trade-buy-";

const HASH_PREFIX: &str = "0x";

const ORDER_TABLE: &str = "LODB-trade-order";

/// Decoded order key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderKey {
    /// Sell limit order ID, with the hash of the transaction that created it.
    Sell(TxHash),

    /// Buy limit order ID, with the hash of the transaction that created it.
    Buy(TxHash),

    /// Bare transaction hash of an order without live record.
    RawTx(TxHash),
}

impl OrderKey {
    /// Classifies a raw key by its tag.
    pub fn parse(key: &[u8]) -> QueryResult<Self> {
        let text = std::str::from_utf8(key)
            .map_err(|_| QueryError::Decode(format!("order key {}", hex::encode(key))))?;
        if let Some(hash) = text.strip_prefix(SELL_ID_PREFIX) {
            Ok(OrderKey::Sell(parse_hash(text, hash)?))
        } else if let Some(hash) = text.strip_prefix(BUY_ID_PREFIX) {
            Ok(OrderKey::Buy(parse_hash(text, hash)?))
        } else if let Some(hash) = text.strip_prefix(HASH_PREFIX) {
            Ok(OrderKey::RawTx(parse_hash(text, hash)?))
        } else {
            Err(QueryError::Decode(format!("order key {text:?}")))
        }
    }

    /// ID of a sell limit order created by the transaction.
    pub fn sell_id(tx_hash: TxHash) -> String {
        format!("{SELL_ID_PREFIX}{}", hex::encode(tx_hash))
    }

    /// ID of a buy limit order created by the transaction.
    pub fn buy_id(tx_hash: TxHash) -> String {
        format!("{BUY_ID_PREFIX}{}", hex::encode(tx_hash))
    }

    /// Side of a tagged key, `None` for bare hashes.
    pub fn side(&self) -> Option<OrderSide> {
        match self {
            OrderKey::Sell(_) => Some(OrderSide::Sell),
            OrderKey::Buy(_) => Some(OrderSide::Buy),
            OrderKey::RawTx(_) => None,
        }
    }

    /// Hash of the transaction the key refers to.
    pub fn tx_hash(&self) -> TxHash {
        match self {
            OrderKey::Sell(h) | OrderKey::Buy(h) | OrderKey::RawTx(h) => *h,
        }
    }

    /// `0x`-prefixed text of [`Self::tx_hash`].
    pub fn tx_hash_hex(&self) -> String {
        hex::encode_prefixed(self.tx_hash())
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKey::Sell(h) => f.write_str(&Self::sell_id(*h)),
            OrderKey::Buy(h) => f.write_str(&Self::buy_id(*h)),
            OrderKey::RawTx(h) => f.write_str(&hex::encode_prefixed(h)),
        }
    }
}

fn parse_hash(key: &str, hash: &str) -> QueryResult<TxHash> {
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(hash, &mut bytes)
        .map_err(|e| QueryError::Decode(format!("order key {key:?}: {e}")))?;
    Ok(TxHash::from(bytes))
}

/// Column of an order table index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    /// Traded asset and the asset it is priced in.
    Pair,
    Owner,
    Side,
    Status,
    /// Price per lot, zero-padded so that keys sort by ascending price.
    Price,
}

impl Column {
    fn value(&self, order: &LocalOrder) -> String {
        match self {
            Column::Pair => order.pair(),
            Column::Owner => order.owner.clone(),
            Column::Side => (order.is_sell as u8).to_string(),
            Column::Status => order.status.to_string(),
            Column::Price => format!("{:020}", order.price_per_boardlot.max(0)),
        }
    }
}

/// Secondary index of the order table, with rows decoding into `R`.
///
/// Keys are `<table>-<name>:<column>:...:<primary>`, the primary being the
/// order's [`LocalOrder::tx_index`]. The first `prefix_len` columns are fixed
/// by the query template, the remaining ones and the primary define the scan
/// order.
#[derive(Debug)]
pub struct IndexDef<R> {
    name: &'static str,
    columns: &'static [Column],
    prefix_len: usize,
    row: PhantomData<fn() -> R>,
}

impl<R> Clone for IndexDef<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for IndexDef<R> {}

/// Open/closed orders of a pair per side and status, by price.
pub const ASSET_SIDE_STATUS_PRICE: IndexDef<LocalOrder> = IndexDef::new(
    "asset_isSell_status_price",
    &[Column::Pair, Column::Side, Column::Status, Column::Price],
    3,
);

/// All orders of an owner per side.
pub const OWNER_SIDE: IndexDef<LocalOrder> =
    IndexDef::new("owner_isSell", &[Column::Owner, Column::Side], 2);

/// Orders of an owner per pair and side.
pub const OWNER_ASSET_SIDE: IndexDef<LocalOrder> = IndexDef::new(
    "owner_asset_isSell",
    &[Column::Owner, Column::Pair, Column::Side],
    3,
);

/// Orders of an owner per status, both sides.
pub const OWNER_STATUS: IndexDef<LocalOrder> =
    IndexDef::new("owner_status", &[Column::Owner, Column::Status], 2);

/// Every index of the order table, maintained together by the write path.
pub const ORDER_INDEXES: [IndexDef<LocalOrder>; 4] =
    [ASSET_SIDE_STATUS_PRICE, OWNER_SIDE, OWNER_ASSET_SIDE, OWNER_STATUS];

impl<R> IndexDef<R> {
    pub const fn new(name: &'static str, columns: &'static [Column], prefix_len: usize) -> Self {
        Self {
            name,
            columns,
            prefix_len,
            row: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<R> IndexDef<R> {
    /// Prefix shared by all rows matching the template.
    pub fn prefix(&self, template: &LocalOrder) -> Vec<u8> {
        let columns = self.columns[..self.prefix_len]
            .iter()
            .map(|c| c.value(template))
            .join(":");
        format!("{ORDER_TABLE}-{}:{columns}:", self.name).into_bytes()
    }

    /// Full key of the row of an order.
    pub fn key(&self, order: &LocalOrder) -> Vec<u8> {
        let columns = self.columns.iter().map(|c| c.value(order)).join(":");
        format!("{ORDER_TABLE}-{}:{columns}:{}", self.name, order.tx_index).into_bytes()
    }
}

/// Key of the primary row of the order at `tx_index`.
pub fn primary_key(tx_index: &str) -> Vec<u8> {
    format!("{ORDER_TABLE}-primary:{tx_index}").into_bytes()
}

/// Owner scoped lists of order keys.
///
/// Each list entry is stored under `<prefix><order key>` with the order key as
/// value.
pub mod owner_keys {
    use crate::types::OrderSide;

    fn list(side: OrderSide) -> &'static str {
        match side {
            OrderSide::Sell => "LODB-trade-seller",
            OrderSide::Buy => "LODB-trade-buyer",
        }
    }

    /// All orders of an owner on one side.
    pub fn by_addr(side: OrderSide, addr: &str) -> Vec<u8> {
        format!("{}-addr:{addr}:", list(side)).into_bytes()
    }

    /// Orders of an owner on one side for one token.
    pub fn by_token(side: OrderSide, addr: &str, token: &str) -> Vec<u8> {
        format!("{}-atss:{addr}:{token}:", list(side)).into_bytes()
    }

    /// Orders of an owner on one side in one status.
    pub fn by_status(side: OrderSide, addr: &str, status: i32) -> Vec<u8> {
        format!("{}-asts:{addr}:{status}:", list(side)).into_bytes()
    }

    /// Key of the list entry for an order.
    pub fn entry(prefix: &[u8], order_key: &str) -> Vec<u8> {
        let mut key = prefix.to_vec();
        key.extend_from_slice(order_key.as_bytes());
        key
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::b256;

    use super::*;

    const HASH: TxHash =
        b256!("0x2cbe1b7bd2e04ef3cb17cc1cd4b1bf91b99d7e7a3e82f1c8f3f8e3b5a8e0c111");

    #[test]
    fn test_parse_sell_tagged_key() {
        let id = format!("{SELL_ID_PREFIX}{}", hex::encode(HASH));
        let key = OrderKey::parse(id.as_bytes()).unwrap();
        assert_eq!(key, OrderKey::Sell(HASH));
        assert_eq!(key.side(), Some(OrderSide::Sell));
        assert_eq!(
            key.tx_hash_hex(),
            "0x2cbe1b7bd2e04ef3cb17cc1cd4b1bf91b99d7e7a3e82f1c8f3f8e3b5a8e0c111"
        );
        assert_eq!(key.to_string(), id);
    }

    #[test]
    fn test_parse_buy_tagged_key() {
        let id = OrderKey::buy_id(HASH);
        assert!(id.starts_with("mavl-trade-buy-2cbe"));
        assert_eq!(OrderKey::parse(id.as_bytes()), Ok(OrderKey::Buy(HASH)));
    }

    #[test]
    fn test_parse_bare_hash_key() {
        let raw = "0x2cbe1b7bd2e04ef3cb17cc1cd4b1bf91b99d7e7a3e82f1c8f3f8e3b5a8e0c111";
        let key = OrderKey::parse(raw.as_bytes()).unwrap();
        assert_eq!(key, OrderKey::RawTx(HASH));
        assert_eq!(key.side(), None);
        assert_eq!(key.tx_hash_hex(), raw);
        assert_eq!(key.to_string(), raw);
    }

    #[test]
    fn test_parse_malformed_keys() {
        for raw in [
            &b"mavl-trade-sell-zz"[..],
            b"0x1234",
            b"mavl-token-2cbe1b7bd2e04ef3cb17cc1cd4b1bf91b99d7e7a3e82f1c8f3f8e3b5a8e0c111",
            b"",
            &[0xff, 0xfe],
        ] {
            assert!(matches!(OrderKey::parse(raw), Err(QueryError::Decode(_))));
        }
    }

    fn order(price: i64, tx_index: &str) -> LocalOrder {
        LocalOrder {
            asset_symbol: "BTY".to_string(),
            asset_exec: "token".to_string(),
            price_symbol: "bty".to_string(),
            price_exec: "coins".to_string(),
            is_sell: true,
            status: 1,
            owner: "1Alice".to_string(),
            tx_index: tx_index.to_string(),
            key: format!("key-{tx_index}"),
            price_per_boardlot: price,
            ..Default::default()
        }
    }

    #[test]
    fn test_index_keys_sort_by_price() {
        let cheap = ASSET_SIDE_STATUS_PRICE.key(&order(9, "000002"));
        let pricy = ASSET_SIDE_STATUS_PRICE.key(&order(10, "000001"));
        assert!(cheap < pricy);

        let prefix = ASSET_SIDE_STATUS_PRICE.prefix(&order(0, ""));
        assert_eq!(prefix, b"LODB-trade-order-asset_isSell_status_price:token.BTY_coins.bty:1:1:");
        assert!(cheap.starts_with(&prefix));
        assert!(pricy.starts_with(&prefix));
    }

    #[test]
    fn test_index_prefix_separates_statuses() {
        let mut on_sale = order(1, "000001");
        on_sale.status = 1;
        let mut template = order(0, "");
        template.status = 10;
        let prefix = ASSET_SIDE_STATUS_PRICE.prefix(&template);
        assert!(!ASSET_SIDE_STATUS_PRICE.key(&on_sale).starts_with(&prefix));
    }

    #[test]
    fn test_owner_index_keys() {
        let o = order(5, "000007");
        assert_eq!(
            OWNER_SIDE.key(&o),
            b"LODB-trade-order-owner_isSell:1Alice:1:000007".to_vec()
        );
        assert_eq!(OWNER_STATUS.prefix(&o), b"LODB-trade-order-owner_status:1Alice:1:".to_vec());
        assert_eq!(primary_key("abc"), b"LODB-trade-order-primary:abc".to_vec());
    }

    #[test]
    fn test_owner_key_lists() {
        assert_eq!(
            owner_keys::by_token(OrderSide::Buy, "1Bob", "BTY"),
            b"LODB-trade-buyer-atss:1Bob:BTY:".to_vec()
        );
        let prefix = owner_keys::by_status(OrderSide::Sell, "1Bob", 3);
        assert_eq!(prefix, b"LODB-trade-seller-asts:1Bob:3:".to_vec());
        assert_eq!(
            owner_keys::entry(&prefix, "0xab"),
            b"LODB-trade-seller-asts:1Bob:3:0xab".to_vec()
        );
    }
}
