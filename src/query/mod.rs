//! Order queries.
//!
//! [`QueryEngine`] answers the exchange queries on top of four components:
//!
//! * [`IndexScanner`] reads the order table indexes and the owner key lists;
//! * [`OrderMaterializer`] reads live limit orders from the state store;
//! * [`EventLogReplayer`] recovers trade receipts from committed transactions;
//! * [`ReplyAssembler`] turns both into canonical replies.
//!
//! Index rows already carry the order as last projected by the write path.
//! Key lists only carry [`OrderKey`]s, each of which is reconstructed: limit
//! orders from their creation receipt with the fill progress of the live
//! record, every other order from the receipt of its own transaction.
//!
//! Multi-order results are best-effort: an order that cannot be found or
//! decoded is logged and left out, the rest of the result is kept. Store
//! failures and corrupted index rows abort the query.

mod assembler;
mod materializer;
mod replayer;
mod scanner;


pub use assembler::*;
pub use materializer::*;
pub use replayer::*;
pub use scanner::*;

use tracing::{Span, debug, debug_span, info_span, warn};

use crate::{
    Ledger,
    error::{QueryError, QueryResult},
    keys::{self, OrderKey, owner_keys},
    store::{LocalDb, StateDb, TxResults},
    types::{
        Direction, LocalOrder, LogType, OrderKeyRequest, OrderSide, OrderStatus,
        OwnerAssetsRequest, OwnerStatusPageRequest, QueryReply, QueryRequest, ReplyBuyOrder,
        ReplySellOrder, ReplyTradeOrder, TokenOrdersRequest, TxHash,
    },
};

/// Read-only query engine over the trade stores.
///
/// `L` is the local database holding the indexes, `S` the state store holding
/// live limit orders and `T` the source of transaction results. The engine
/// keeps no state between calls and runs every request sequentially.
#[derive(derive_more::Debug)]
pub struct QueryEngine<L, S, T> {
    ledger: Ledger,
    scanner: IndexScanner<L>,
    materializer: OrderMaterializer<S>,
    replayer: EventLogReplayer<T>,
    assembler: ReplyAssembler,
    span: Span,
}

impl<L, S, T> QueryEngine<L, S, T>
where
    L: LocalDb + Send + Sync,
    S: StateDb + Send + Sync,
    T: TxResults + Send + Sync,
{
    /// Creates an engine logging under a `trade_query` span.
    pub fn new(ledger: Ledger, local: L, state: S, txs: T) -> Self {
        Self::with_span(ledger, local, state, txs, info_span!("trade_query"))
    }

    /// Creates an engine logging under the given span, components log under
    /// child spans of it.
    pub fn with_span(ledger: Ledger, local: L, state: S, txs: T, span: Span) -> Self {
        Self {
            scanner: IndexScanner::new(local, debug_span!(parent: &span, "scanner")),
            materializer: OrderMaterializer::new(state, debug_span!(parent: &span, "materializer")),
            replayer: EventLogReplayer::new(txs, debug_span!(parent: &span, "replayer")),
            assembler: ReplyAssembler::new(
                ledger.token_converter(),
                ledger.coin_converter(),
                debug_span!(parent: &span, "assembler"),
            ),
            ledger,
            span,
        }
    }

    /// Ledger the engine was configured for.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Page of the sell orders of a token in a status, by ascending price for
    /// direction `0`.
    pub async fn token_sell_orders_by_status(
        &self,
        req: &TokenOrdersRequest,
    ) -> QueryResult<Vec<ReplyTradeOrder>> {
        self.token_orders(OrderSide::Sell, req, req.status, req.direction)
            .await
    }

    /// Page of the buy orders of a token in a status, [`OrderStatus::OnBuy`]
    /// when none is given.
    ///
    /// The requested direction is inverted, so that direction `0` lists the
    /// highest bids first.
    pub async fn token_buy_orders_by_status(
        &self,
        req: &TokenOrdersRequest,
    ) -> QueryResult<Vec<ReplyTradeOrder>> {
        let status = match req.status {
            0 => OrderStatus::OnBuy.code(),
            status => status,
        };
        let direction = Direction::try_from(req.direction)?.inverted();
        self.token_orders(OrderSide::Buy, req, status, direction.into())
            .await
    }

    async fn token_orders(
        &self,
        side: OrderSide,
        req: &TokenOrdersRequest,
        status: i32,
        direction: i32,
    ) -> QueryResult<Vec<ReplyTradeOrder>> {
        let template = LocalOrder {
            is_sell: side.is_sell(),
            status,
            tx_index: req.from_key.clone(),
            ..self.pair_template(&req.token_symbol)
        };
        let rows = self
            .scanner
            .page(keys::ASSET_SIDE_STATUS_PRICE, &template, req.count, direction)
            .await;
        Ok(not_found_as_empty(rows)?.iter().map(ReplyTradeOrder::from).collect())
    }

    /// All sell orders of an owner, for the listed tokens only when any.
    ///
    /// Tokens without orders are skipped.
    pub async fn owner_sell_orders(
        &self,
        req: &OwnerAssetsRequest,
    ) -> QueryResult<Vec<ReplyTradeOrder>> {
        let template = LocalOrder {
            owner: req.addr.clone(),
            is_sell: true,
            ..Default::default()
        };
        if req.token.is_empty() {
            let rows = self.scanner.all(keys::OWNER_SIDE, &template).await;
            return Ok(not_found_as_empty(rows)?.iter().map(ReplyTradeOrder::from).collect());
        }

        let mut orders = Vec::new();
        for token in req.token.iter().filter(|t| !t.is_empty()) {
            let template = LocalOrder {
                owner: req.addr.clone(),
                is_sell: true,
                ..self.pair_template(token)
            };
            let rows = not_found_as_empty(self.scanner.all(keys::OWNER_ASSET_SIDE, &template).await)?;
            debug!(parent: &self.span, %token, orders = rows.len(), "Owner sell orders");
            orders.extend(rows.iter().map(ReplyTradeOrder::from));
        }
        Ok(orders)
    }

    /// All buy orders of an owner, for the listed tokens only when any.
    pub async fn owner_buy_orders(
        &self,
        req: &OwnerAssetsRequest,
    ) -> QueryResult<Vec<ReplyTradeOrder>> {
        let mut order_keys = Vec::new();
        if req.token.is_empty() {
            let prefix = owner_keys::by_addr(OrderSide::Buy, &req.addr);
            order_keys.extend(not_found_as_empty(self.scanner.keys(&prefix).await)?);
        } else {
            for token in req.token.iter().filter(|t| !t.is_empty()) {
                let prefix = owner_keys::by_token(OrderSide::Buy, &req.addr, token);
                let found = not_found_as_empty(self.scanner.keys(&prefix).await)?;
                debug!(parent: &self.span, %token, keys = found.len(), "Owner buy keys");
                order_keys.extend(found);
            }
        }
        self.trade_orders(&order_keys).await
    }

    /// All sell orders of an owner in a status.
    pub async fn owner_sell_orders_by_status(
        &self,
        req: &OwnerAssetsRequest,
    ) -> QueryResult<Vec<ReplyTradeOrder>> {
        self.owner_orders_in_status(OrderSide::Sell, req).await
    }

    /// All buy orders of an owner in a status.
    pub async fn owner_buy_orders_by_status(
        &self,
        req: &OwnerAssetsRequest,
    ) -> QueryResult<Vec<ReplyTradeOrder>> {
        self.owner_orders_in_status(OrderSide::Buy, req).await
    }

    async fn owner_orders_in_status(
        &self,
        side: OrderSide,
        req: &OwnerAssetsRequest,
    ) -> QueryResult<Vec<ReplyTradeOrder>> {
        let prefix = owner_keys::by_status(side, &req.addr, req.status);
        let order_keys = not_found_as_empty(self.scanner.keys(&prefix).await)?;
        self.trade_orders(&order_keys).await
    }

    /// Page of the orders of an owner in a status, both sides, in ledger
    /// order.
    pub async fn owner_orders_by_status(
        &self,
        req: &OwnerStatusPageRequest,
    ) -> QueryResult<Vec<ReplyTradeOrder>> {
        let template = LocalOrder {
            owner: req.addr.clone(),
            status: req.status,
            tx_index: req.from_key.clone(),
            ..Default::default()
        };
        let rows = self
            .scanner
            .page(keys::OWNER_STATUS, &template, req.count, req.direction)
            .await;
        Ok(not_found_as_empty(rows)?.iter().map(ReplyTradeOrder::from).collect())
    }

    /// Order of either side by its key.
    pub async fn trade_order(&self, key: &str) -> QueryResult<ReplyTradeOrder> {
        self.reconstruct(&parse_request_key(key)?).await
    }

    /// Sell order by its ID, or by the hash of a market sell transaction.
    pub async fn sell_order(&self, key: &str) -> QueryResult<ReplySellOrder> {
        let key = parse_request_key(key)?;
        let reply = match key {
            OrderKey::Sell(hash) => match self.live(self.materializer.sell_order(hash).await)? {
                Some(live) => self.assembler.from_sell_order(&key, &live),
                None => self.from_receipt(hash, &[LogType::SellLimit]).await?,
            },
            OrderKey::RawTx(hash) => self.from_receipt(hash, &[LogType::SellMarket]).await?,
            OrderKey::Buy(_) => {
                return Err(QueryError::InvalidParam(format!("{key} is not a sell order")));
            }
        };
        Ok(reply.into())
    }

    /// Buy order by its ID, or by the hash of a market buy transaction.
    pub async fn buy_order(&self, key: &str) -> QueryResult<ReplyBuyOrder> {
        let key = parse_request_key(key)?;
        let reply = match key {
            OrderKey::Buy(hash) => match self.live(self.materializer.buy_order(hash).await)? {
                Some(live) => self.assembler.from_buy_order(&key, &live),
                None => self.from_receipt(hash, &[LogType::BuyLimit]).await?,
            },
            OrderKey::RawTx(hash) => self.from_receipt(hash, &[LogType::BuyMarket]).await?,
            OrderKey::Sell(_) => {
                return Err(QueryError::InvalidParam(format!("{key} is not a buy order")));
            }
        };
        Ok(reply.into())
    }

    /// Runs a routed query.
    pub async fn execute(&self, request: &QueryRequest) -> QueryResult<QueryReply> {
        debug!(parent: &self.span, ?request, "Executing query");
        let orders = match request {
            QueryRequest::GetTokenSellOrderByStatus(req) => {
                self.token_sell_orders_by_status(req).await?
            }
            QueryRequest::GetTokenBuyOrderByStatus(req) => {
                self.token_buy_orders_by_status(req).await?
            }
            QueryRequest::GetOnesSellOrder(req) => self.owner_sell_orders(req).await?,
            QueryRequest::GetOnesBuyOrder(req) => self.owner_buy_orders(req).await?,
            QueryRequest::GetOnesSellOrderWithStatus(req) => {
                self.owner_sell_orders_by_status(req).await?
            }
            QueryRequest::GetOnesBuyOrderWithStatus(req) => {
                self.owner_buy_orders_by_status(req).await?
            }
            QueryRequest::GetOnesOrderWithStatus(req) => self.owner_orders_by_status(req).await?,
            QueryRequest::GetTradeOrder(OrderKeyRequest { key }) => {
                return Ok(QueryReply::TradeOrder(self.trade_order(key).await?));
            }
            QueryRequest::GetSellOrder(OrderKeyRequest { key }) => {
                return Ok(QueryReply::SellOrder(self.sell_order(key).await?));
            }
            QueryRequest::GetBuyOrder(OrderKeyRequest { key }) => {
                return Ok(QueryReply::BuyOrder(self.buy_order(key).await?));
            }
        };
        Ok(QueryReply::TradeOrders { orders })
    }

    /// Reconstructs every key, leaving out the orders that cannot be.
    async fn trade_orders(&self, order_keys: &[OrderKey]) -> QueryResult<Vec<ReplyTradeOrder>> {
        let mut orders = Vec::with_capacity(order_keys.len());
        for key in order_keys {
            match self.reconstruct(key).await {
                Ok(order) => orders.push(order),
                Err(e @ (QueryError::NotFound | QueryError::Decode(_))) => {
                    warn!(parent: &self.span, %key, %e, "Skipping order");
                }
                Err(e) => return Err(e),
            }
        }
        debug!(parent: &self.span, keys = order_keys.len(), orders = orders.len(), "Reconstructed");
        Ok(orders)
    }

    /// Canonical trade view of the order behind a key.
    ///
    /// Limit orders combine the creation receipt with the live fill progress.
    /// Either source alone is enough: without live record the receipt snapshot
    /// is served, without transaction the live record is.
    async fn reconstruct(&self, key: &OrderKey) -> QueryResult<ReplyTradeOrder> {
        match *key {
            OrderKey::Sell(hash) => {
                let receipt = self.limit_receipt(hash).await?;
                let live = self.live(self.materializer.sell_order(hash).await)?;
                match (receipt, live) {
                    (Some(reply), Some(live)) => Ok(self.assembler.with_sell_progress(reply, &live)),
                    (Some(reply), None) => Ok(reply),
                    (None, Some(live)) => Ok(self.assembler.from_sell_order(key, &live)),
                    (None, None) => Err(QueryError::NotFound),
                }
            }
            OrderKey::Buy(hash) => {
                let receipt = self.limit_receipt(hash).await?;
                let live = self.live(self.materializer.buy_order(hash).await)?;
                match (receipt, live) {
                    (Some(reply), Some(live)) => Ok(self.assembler.with_buy_progress(reply, &live)),
                    (Some(reply), None) => Ok(reply),
                    (None, Some(live)) => Ok(self.assembler.from_buy_order(key, &live)),
                    (None, None) => Err(QueryError::NotFound),
                }
            }
            OrderKey::RawTx(hash) => self.from_receipt(hash, LogType::UNMATERIALIZED).await,
        }
    }

    /// Creation receipt of a limit order, `None` when the transaction or the
    /// receipt is missing or does not normalize.
    async fn limit_receipt(&self, hash: TxHash) -> QueryResult<Option<ReplyTradeOrder>> {
        match self.from_receipt(hash, LogType::LIMIT).await {
            Ok(reply) => Ok(Some(reply)),
            Err(QueryError::NotFound) => Ok(None),
            Err(QueryError::Decode(e)) => {
                warn!(parent: &self.span, %hash, %e, "Ignoring invalid limit receipt");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn from_receipt(
        &self,
        hash: TxHash,
        wanted: &[LogType],
    ) -> QueryResult<ReplyTradeOrder> {
        let replayed = self.replayer.replay(hash, wanted).await?;
        self.assembler.from_receipt(&replayed)
    }

    /// Live record lookup result with missing and undecodable records as
    /// `None`.
    fn live<R>(&self, result: QueryResult<R>) -> QueryResult<Option<R>> {
        match result {
            Ok(live) => Ok(Some(live)),
            Err(QueryError::NotFound) => Ok(None),
            Err(QueryError::Decode(e)) => {
                warn!(parent: &self.span, %e, "Ignoring undecodable live order");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Template with the pair of `token` priced in the ledger coin.
    fn pair_template(&self, token: &str) -> LocalOrder {
        LocalOrder {
            asset_symbol: token.to_string(),
            asset_exec: self.ledger.asset_exec().to_string(),
            price_symbol: self.ledger.coin_symbol().to_string(),
            price_exec: self.ledger.price_exec().to_string(),
            ..Default::default()
        }
    }
}

/// Turns a missing prefix into an empty result.
fn not_found_as_empty<R>(result: QueryResult<Vec<R>>) -> QueryResult<Vec<R>> {
    match result {
        Err(QueryError::NotFound) => Ok(Vec::new()),
        result => result,
    }
}

fn parse_request_key(key: &str) -> QueryResult<OrderKey> {
    OrderKey::parse(key.as_bytes()).map_err(|e| QueryError::InvalidParam(e.to_string()))
}
