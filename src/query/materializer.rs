use serde::de::DeserializeOwned;
use tracing::{Span, debug};

use crate::{
    error::{QueryError, QueryResult, StoreError},
    keys::OrderKey,
    store::StateDb,
    types::{BuyOrder, SellOrder, TxHash},
};

/// Point lookups of live limit orders.
#[derive(derive_more::Debug)]
pub struct OrderMaterializer<S> {
    #[debug(skip)]
    db: S,
    span: Span,
}

impl<S: StateDb> OrderMaterializer<S> {
    pub fn new(db: S, span: Span) -> Self {
        Self { db, span }
    }

    /// Live record of the sell limit order created by the transaction.
    ///
    /// [`QueryError::NotFound`] is the regular outcome for orders that never
    /// had a live record, callers fall back to replaying the transaction.
    pub async fn sell_order(&self, tx_hash: TxHash) -> QueryResult<SellOrder> {
        self.load(&OrderKey::sell_id(tx_hash)).await
    }

    /// Live record of the buy limit order created by the transaction.
    pub async fn buy_order(&self, tx_hash: TxHash) -> QueryResult<BuyOrder> {
        self.load(&OrderKey::buy_id(tx_hash)).await
    }

    async fn load<E: DeserializeOwned>(&self, id: &str) -> QueryResult<E> {
        match StateDb::get(&self.db, id.as_bytes()).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(StoreError::NotFound) => {
                debug!(parent: &self.span, id, "No live order");
                Err(QueryError::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy::primitives::b256;
    use tokio_test::assert_ok;

    use super::*;
    use crate::store::MemoryStore;

    const HASH: TxHash =
        b256!("0x2cbe1b7bd2e04ef3cb17cc1cd4b1bf91b99d7e7a3e82f1c8f3f8e3b5a8e0c111");

    #[tokio::test]
    async fn test_load_live_orders() {
        let store = Arc::new(MemoryStore::new());
        let order = SellOrder {
            token_symbol: "BTY".to_string(),
            sell_id: OrderKey::sell_id(HASH),
            sold_boardlot: 3,
            status: 1,
            ..Default::default()
        };
        store.put_state(
            OrderKey::sell_id(HASH).into_bytes(),
            serde_json::to_vec(&order).unwrap(),
        );
        let materializer = OrderMaterializer::new(store.clone(), Span::none());

        assert_eq!(assert_ok!(materializer.sell_order(HASH).await), order);
        assert_eq!(materializer.buy_order(HASH).await, Err(QueryError::NotFound));

        store.put_state(OrderKey::buy_id(HASH).into_bytes(), b"[1,2]".to_vec());
        assert!(matches!(
            materializer.buy_order(HASH).await,
            Err(QueryError::Decode(_))
        ));

        store.set_failing(true);
        assert!(matches!(
            materializer.sell_order(HASH).await,
            Err(QueryError::Store(_))
        ));
    }
}
