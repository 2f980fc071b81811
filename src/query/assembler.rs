use tracing::{Span, warn};

use super::Replayed;
use crate::{
    error::QueryResult,
    keys::OrderKey,
    num::Converter,
    types::{BuyOrder, OrderStatus, ReceiptBase, ReplyTradeOrder, SellOrder},
};

/// Builds canonical replies out of receipts and live records.
///
/// Every reply is first assembled as a [`ReplyTradeOrder`], the side-specific
/// shapes are converted from it.
#[derive(Debug)]
pub struct ReplyAssembler {
    token: Converter,
    coin: Converter,
    span: Span,
}

impl ReplyAssembler {
    /// `token` scales amounts, `coin` scales prices.
    pub fn new(token: Converter, coin: Converter, span: Span) -> Self {
        Self { token, coin, span }
    }

    /// Order as of the receipt snapshot.
    ///
    /// Fails as a whole when either the amount or the price does not
    /// normalize.
    pub fn from_receipt(&self, replayed: &Replayed) -> QueryResult<ReplyTradeOrder> {
        let reply = match replayed.receipt.base() {
            ReceiptBase::Sell(base) => ReplyTradeOrder {
                token_symbol: base.token_symbol.clone(),
                owner: base.owner.clone(),
                amount_per_boardlot: self.amount(&base.amount_per_boardlot, replayed)?,
                min_boardlot: base.min_boardlot,
                price_per_boardlot: self.price(&base.price_per_boardlot, replayed)?,
                total_boardlot: base.total_boardlot,
                traded_boardlot: base.sold_boardlot,
                buy_id: base.buy_id.clone(),
                status: OrderStatus::code_of(&base.status),
                sell_id: base.sell_id.clone(),
                tx_hash: replayed.tx_hash.clone(),
                height: base.height,
                key: own_key(&base.sell_id, &replayed.tx_hash),
                block_time: replayed.block_time,
                is_sell: true,
                asset_exec: base.asset_exec.clone(),
                tx_index: String::new(),
            },
            ReceiptBase::Buy(base) => ReplyTradeOrder {
                token_symbol: base.token_symbol.clone(),
                owner: base.owner.clone(),
                amount_per_boardlot: self.amount(&base.amount_per_boardlot, replayed)?,
                min_boardlot: base.min_boardlot,
                price_per_boardlot: self.price(&base.price_per_boardlot, replayed)?,
                total_boardlot: base.total_boardlot,
                traded_boardlot: base.bought_boardlot,
                buy_id: base.buy_id.clone(),
                status: OrderStatus::code_of(&base.status),
                sell_id: base.sell_id.clone(),
                tx_hash: replayed.tx_hash.clone(),
                height: base.height,
                key: own_key(&base.buy_id, &replayed.tx_hash),
                block_time: replayed.block_time,
                is_sell: false,
                asset_exec: base.asset_exec.clone(),
                tx_index: String::new(),
            },
        };
        Ok(reply)
    }

    /// Order as of its live sell record, amounts already fixed-point.
    ///
    /// The block time is unknown without the transaction and left zero.
    pub fn from_sell_order(&self, key: &OrderKey, order: &SellOrder) -> ReplyTradeOrder {
        ReplyTradeOrder {
            token_symbol: order.token_symbol.clone(),
            owner: order.address.clone(),
            amount_per_boardlot: order.amount_per_boardlot,
            min_boardlot: order.min_boardlot,
            price_per_boardlot: order.price_per_boardlot,
            total_boardlot: order.total_boardlot,
            traded_boardlot: order.sold_boardlot,
            status: order.status,
            sell_id: order.sell_id.clone(),
            tx_hash: key.tx_hash_hex(),
            height: order.height,
            key: key.to_string(),
            is_sell: true,
            asset_exec: order.asset_exec.clone(),
            ..Default::default()
        }
    }

    /// Order as of its live buy record, amounts already fixed-point.
    pub fn from_buy_order(&self, key: &OrderKey, order: &BuyOrder) -> ReplyTradeOrder {
        ReplyTradeOrder {
            token_symbol: order.token_symbol.clone(),
            owner: order.address.clone(),
            amount_per_boardlot: order.amount_per_boardlot,
            min_boardlot: order.min_boardlot,
            price_per_boardlot: order.price_per_boardlot,
            total_boardlot: order.total_boardlot,
            traded_boardlot: order.bought_boardlot,
            buy_id: order.buy_id.clone(),
            status: order.status,
            tx_hash: key.tx_hash_hex(),
            height: order.height,
            key: key.to_string(),
            is_sell: false,
            asset_exec: order.asset_exec.clone(),
            ..Default::default()
        }
    }

    /// Replaces the receipt snapshot fill progress with the live one.
    pub fn with_sell_progress(&self, reply: ReplyTradeOrder, live: &SellOrder) -> ReplyTradeOrder {
        ReplyTradeOrder {
            traded_boardlot: live.sold_boardlot,
            status: live.status,
            ..reply
        }
    }

    pub fn with_buy_progress(&self, reply: ReplyTradeOrder, live: &BuyOrder) -> ReplyTradeOrder {
        ReplyTradeOrder {
            traded_boardlot: live.bought_boardlot,
            status: live.status,
            ..reply
        }
    }

    fn amount(&self, value: &str, replayed: &Replayed) -> QueryResult<i64> {
        self.token.normalize(value).map_err(|e| {
            warn!(parent: &self.span, tx_hash = %replayed.tx_hash, %e, "Bad receipt amount");
            e.into()
        })
    }

    fn price(&self, value: &str, replayed: &Replayed) -> QueryResult<i64> {
        self.coin.normalize(value).map_err(|e| {
            warn!(parent: &self.span, tx_hash = %replayed.tx_hash, %e, "Bad receipt price");
            e.into()
        })
    }
}

/// Own-side order ID when there is one, the transaction hash otherwise.
fn own_key(id: &str, tx_hash: &str) -> String {
    let key = if id.is_empty() { tx_hash } else { id };
    key.to_string()
}
