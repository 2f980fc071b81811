use serde::{Deserialize, Serialize};

use super::{Address, ReplyBuyOrder, ReplySellOrder, ReplyTradeOrder};

/// Paginated request for the orders of one token in one status, sorted by
/// price.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenOrdersRequest {
    pub token_symbol: String,

    /// `tx_index` of the last order of the previous page, empty for the first
    /// page.
    pub from_key: String,

    /// Page size, must be positive.
    pub count: i32,

    /// `0` ascending, `1` descending.
    pub direction: i32,
    pub status: i32,
}

/// Unpaginated request for the orders of one owner, optionally restricted
/// to a list of tokens or to a status.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnerAssetsRequest {
    pub addr: Address,
    pub token: Vec<String>,
    pub status: i32,
}

/// Paginated request for the orders of one owner in one status, both sides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnerStatusPageRequest {
    pub addr: Address,
    pub status: i32,
    pub from_key: String,
    pub count: i32,
    pub direction: i32,
}

/// Direct lookup of a single order by its key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderKeyRequest {
    pub key: String,
}

/// Query as routed by the host, named after the ledger query functions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "func_name", content = "payload")]
pub enum QueryRequest {
    GetTokenSellOrderByStatus(TokenOrdersRequest),
    GetTokenBuyOrderByStatus(TokenOrdersRequest),
    GetOnesSellOrder(OwnerAssetsRequest),
    GetOnesBuyOrder(OwnerAssetsRequest),
    GetOnesSellOrderWithStatus(OwnerAssetsRequest),
    GetOnesBuyOrderWithStatus(OwnerAssetsRequest),
    GetOnesOrderWithStatus(OwnerStatusPageRequest),
    GetTradeOrder(OrderKeyRequest),
    GetSellOrder(OrderKeyRequest),
    GetBuyOrder(OrderKeyRequest),
}

/// Reply to a [`QueryRequest`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryReply {
    TradeOrders { orders: Vec<ReplyTradeOrder> },
    TradeOrder(ReplyTradeOrder),
    SellOrder(ReplySellOrder),
    BuyOrder(ReplyBuyOrder),
}
