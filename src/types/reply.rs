use serde::{Deserialize, Serialize};

use super::{Address, Height, LocalOrder};

/// Canonical view of an order of either side.
///
/// Amounts are scaled by the token precision and prices by the coin
/// precision. [`Self::key`] is the order ID when the order has one, the
/// transaction hash otherwise, and can always be looked up again with
/// [`crate::query::QueryEngine::trade_order`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTradeOrder {
    pub token_symbol: String,
    pub owner: Address,
    pub amount_per_boardlot: i64,
    pub min_boardlot: i64,
    pub price_per_boardlot: i64,
    pub total_boardlot: i64,
    pub traded_boardlot: i64,
    pub buy_id: String,
    pub status: i32,
    pub sell_id: String,
    pub tx_hash: String,
    pub height: Height,
    pub key: String,
    pub block_time: i64,
    pub is_sell: bool,
    pub asset_exec: String,

    /// Page cursor of the order, empty for orders not read from an index.
    pub tx_index: String,
}

impl From<&LocalOrder> for ReplyTradeOrder {
    fn from(order: &LocalOrder) -> Self {
        Self {
            token_symbol: order.asset_symbol.clone(),
            owner: order.owner.clone(),
            amount_per_boardlot: order.amount_per_boardlot,
            min_boardlot: order.min_boardlot,
            price_per_boardlot: order.price_per_boardlot,
            total_boardlot: order.total_boardlot,
            traded_boardlot: order.traded_boardlot,
            buy_id: order.buy_id.clone(),
            status: order.status,
            sell_id: order.sell_id.clone(),
            tx_hash: order.tx_hash.clone(),
            height: order.height,
            key: order.key.clone(),
            block_time: order.block_time,
            is_sell: order.is_sell,
            asset_exec: order.asset_exec.clone(),
            tx_index: order.tx_index.clone(),
        }
    }
}

/// Sell-side view of an order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySellOrder {
    pub token_symbol: String,
    pub owner: Address,
    pub amount_per_boardlot: i64,
    pub min_boardlot: i64,
    pub price_per_boardlot: i64,
    pub total_boardlot: i64,
    pub sold_boardlot: i64,
    pub buy_id: String,
    pub status: i32,
    pub sell_id: String,
    pub tx_hash: String,
    pub height: Height,
    pub key: String,

    /// Zero when only the live record was available.
    pub block_time: i64,
    pub asset_exec: String,
}

/// Buy-side view of an order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyBuyOrder {
    pub token_symbol: String,
    pub owner: Address,
    pub amount_per_boardlot: i64,
    pub min_boardlot: i64,
    pub price_per_boardlot: i64,
    pub total_boardlot: i64,
    pub bought_boardlot: i64,
    pub buy_id: String,
    pub status: i32,
    pub sell_id: String,
    pub tx_hash: String,
    pub height: Height,
    pub key: String,

    /// Zero when only the live record was available.
    pub block_time: i64,
    pub asset_exec: String,
}

impl From<ReplyTradeOrder> for ReplySellOrder {
    fn from(order: ReplyTradeOrder) -> Self {
        Self {
            token_symbol: order.token_symbol,
            owner: order.owner,
            amount_per_boardlot: order.amount_per_boardlot,
            min_boardlot: order.min_boardlot,
            price_per_boardlot: order.price_per_boardlot,
            total_boardlot: order.total_boardlot,
            sold_boardlot: order.traded_boardlot,
            buy_id: order.buy_id,
            status: order.status,
            sell_id: order.sell_id,
            tx_hash: order.tx_hash,
            height: order.height,
            key: order.key,
            block_time: order.block_time,
            asset_exec: order.asset_exec,
        }
    }
}

impl From<ReplyTradeOrder> for ReplyBuyOrder {
    fn from(order: ReplyTradeOrder) -> Self {
        Self {
            token_symbol: order.token_symbol,
            owner: order.owner,
            amount_per_boardlot: order.amount_per_boardlot,
            min_boardlot: order.min_boardlot,
            price_per_boardlot: order.price_per_boardlot,
            total_boardlot: order.total_boardlot,
            bought_boardlot: order.traded_boardlot,
            buy_id: order.buy_id,
            status: order.status,
            sell_id: order.sell_id,
            tx_hash: order.tx_hash,
            height: order.height,
            key: order.key,
            block_time: order.block_time,
            asset_exec: order.asset_exec,
        }
    }
}
