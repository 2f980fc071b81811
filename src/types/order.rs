use serde::{Deserialize, Serialize};

use super::{Address, Height};

/// Side of the order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Sell,
    Buy,
}

impl OrderSide {
    pub fn is_sell(&self) -> bool {
        matches!(self, OrderSide::Sell)
    }
}

impl From<bool> for OrderSide {
    fn from(is_sell: bool) -> Self {
        if is_sell { OrderSide::Sell } else { OrderSide::Buy }
    }
}

/// Index projection of an order, as maintained by the indexing write path.
///
/// Index rows carry a complete projection with amounts and prices already in
/// fixed-point. As a query template only the fields of the scanned index have
/// to be populated, plus [`Self::tx_index`] as the page cursor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalOrder {
    pub asset_symbol: String,
    pub asset_exec: String,
    pub price_symbol: String,
    pub price_exec: String,
    pub is_sell: bool,
    pub status: i32,
    pub owner: Address,

    /// Zero-padded position of the creating transaction in the ledger.
    /// Primary key of the order table, and the page cursor: in a template,
    /// the `tx_index` of the last row seen, scanning resumes after it.
    pub tx_index: String,

    /// Order ID of limit orders, transaction hash of the rest.
    pub key: String,

    pub amount_per_boardlot: i64,
    pub min_boardlot: i64,
    pub price_per_boardlot: i64,
    pub total_boardlot: i64,
    pub traded_boardlot: i64,
    pub buy_id: String,
    pub sell_id: String,
    pub tx_hash: String,
    pub height: Height,
    pub block_time: i64,
}

impl LocalOrder {
    pub fn side(&self) -> OrderSide {
        self.is_sell.into()
    }

    /// `exec.symbol` of the traded asset.
    pub fn asset(&self) -> String {
        format!("{}.{}", self.asset_exec, self.asset_symbol)
    }

    /// `asset_price` pair the order is quoted in.
    pub fn pair(&self) -> String {
        format!("{}_{}.{}", self.asset(), self.price_exec, self.price_symbol)
    }
}

/// Live sell limit order, as persisted in the state store under its
/// [`Self::sell_id`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SellOrder {
    pub token_symbol: String,
    pub address: Address,
    pub amount_per_boardlot: i64,
    pub min_boardlot: i64,
    pub price_per_boardlot: i64,
    pub total_boardlot: i64,
    pub sold_boardlot: i64,
    pub starttime: i64,
    pub stoptime: i64,
    pub crowdfund: bool,
    pub sell_id: String,
    pub status: i32,
    pub height: Height,
    pub asset_exec: String,
}

/// Live buy limit order, as persisted in the state store under its
/// [`Self::buy_id`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuyOrder {
    pub token_symbol: String,
    pub address: Address,
    pub amount_per_boardlot: i64,
    pub min_boardlot: i64,
    pub price_per_boardlot: i64,
    pub total_boardlot: i64,
    pub bought_boardlot: i64,
    pub buy_id: String,
    pub status: i32,
    pub height: Height,
    pub asset_exec: String,
}
