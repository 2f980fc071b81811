use std::sync::Arc;

use tokio_test::assert_ok;
use trade_query::{
    Ledger,
    query::QueryEngine,
    store::{MemoryStore, StoreSnapshot},
    testing::TestLedger,
    types::{
        OrderKeyRequest, OwnerAssetsRequest, OwnerStatusPageRequest, QueryReply, QueryRequest,
        TokenOrdersRequest,
    },
};

fn hex(hash: trade_query::types::TxHash) -> String {
    alloy::primitives::hex::encode_prefixed(hash)
}

fn token_page(token: &str, status: i32) -> TokenOrdersRequest {
    TokenOrdersRequest {
        token_symbol: token.to_string(),
        count: 20,
        status,
        ..Default::default()
    }
}

/// Follows a sell order from placement to sold out through the queries of
/// every participant.
#[tokio::test]
async fn test_order_lifecycle() {
    let ledger = TestLedger::default();
    let ask = ledger.sell_limit("1Alice", "BTY", "1", "2.5", 10).await;
    let bob = ledger.buy_market("1Bob", &ask, 4).await;
    let engine = ledger.engine();

    let on_sale = assert_ok!(engine.token_sell_orders_by_status(&token_page("BTY", 1)).await);
    assert_eq!(on_sale.len(), 1);
    assert_eq!(on_sale[0].traded_boardlot, 4);
    assert_eq!(on_sale[0].price_per_boardlot, 250_000_000);

    let carol = ledger.buy_market("1Carol", &ask, 6).await;
    let engine = ledger.engine();

    let on_sale = assert_ok!(engine.token_sell_orders_by_status(&token_page("BTY", 1)).await);
    assert!(on_sale.is_empty());
    let sold_out = assert_ok!(engine.token_sell_orders_by_status(&token_page("BTY", 2)).await);
    assert_eq!(sold_out.len(), 1);
    assert_eq!(sold_out[0].key, ask.id());
    assert_eq!(sold_out[0].traded_boardlot, 10);

    for (owner, hash, lots) in [("1Bob", bob, 4), ("1Carol", carol, 6)] {
        let bought = assert_ok!(
            engine
                .owner_buy_orders(&OwnerAssetsRequest {
                    addr: owner.to_string(),
                    ..Default::default()
                })
                .await
        );
        assert_eq!(bought.len(), 1);
        assert_eq!(bought[0].key, hex(hash));
        assert_eq!(bought[0].traded_boardlot, lots);
        assert_eq!(bought[0].sell_id, ask.id());
        assert_eq!(bought[0].price_per_boardlot, 250_000_000);
    }

    let alice = assert_ok!(
        engine
            .owner_sell_orders_by_status(&OwnerAssetsRequest {
                addr: "1Alice".to_string(),
                status: 2,
                ..Default::default()
            })
            .await
    );
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].traded_boardlot, 10);
    assert_eq!(alice[0].tx_hash, ask.key.tx_hash_hex());
}

/// Amounts and prices follow the precision of the configured ledger.
#[tokio::test]
async fn test_custom_ledger_precision() {
    let ledger = TestLedger::new(Ledger::custom("ycc", "token", "paracross", 4, 2));
    let bid = ledger.buy_limit("1Alice", "BTY", "1.2345", "0.5", 3).await;
    ledger.buy_limit("1Alice", "BTY", "1", "0.75", 3).await;
    let engine = ledger.engine();

    let bids = assert_ok!(engine.token_buy_orders_by_status(&token_page("BTY", 0)).await);
    assert_eq!(
        bids.iter().map(|o| o.price_per_boardlot).collect::<Vec<_>>(),
        vec![75, 50]
    );

    let direct = assert_ok!(engine.buy_order(&bid.id()).await);
    assert_eq!(direct.amount_per_boardlot, 12_345);
    assert_eq!(direct.price_per_boardlot, 50);

    let traded = assert_ok!(engine.trade_order(&bid.id()).await);
    assert_eq!(traded.amount_per_boardlot, 12_345);
    assert!(traded.block_time > 0);

    // Same token on the mainnet ledger is a different pair.
    let mainnet = QueryEngine::new(
        Ledger::mainnet(),
        ledger.store().clone(),
        ledger.store().clone(),
        ledger.store().clone(),
    );
    let none = assert_ok!(mainnet.token_buy_orders_by_status(&token_page("BTY", 0)).await);
    assert!(none.is_empty());
}

/// A store reloaded from its JSON snapshot answers every query the same way.
#[tokio::test]
async fn test_snapshot_reload_answers_alike() {
    let ledger = TestLedger::default();
    let ask = ledger.sell_limit("1Alice", "BTY", "1", "3", 5).await;
    let bid = ledger.buy_limit("1Bob", "BTY", "1", "2", 5).await;
    ledger.buy_market("1Bob", &ask, 2).await;
    let market = ledger.sell_market("1Alice", &bid, 5).await;
    ledger.sell_revoke(&ask).await;

    let snapshot = ledger.store().snapshot().await;
    let json = serde_json::to_string(&snapshot).unwrap();
    let reloaded: StoreSnapshot = serde_json::from_str(&json).unwrap();
    let store = Arc::new(assert_ok!(MemoryStore::from_snapshot(reloaded).await));
    let engine = QueryEngine::new(Ledger::mainnet(), store.clone(), store.clone(), store);
    let original = ledger.engine();

    let requests = [
        QueryRequest::GetTokenSellOrderByStatus(token_page("BTY", 3)),
        QueryRequest::GetTokenBuyOrderByStatus(token_page("BTY", 6)),
        QueryRequest::GetOnesSellOrder(OwnerAssetsRequest {
            addr: "1Alice".to_string(),
            ..Default::default()
        }),
        QueryRequest::GetOnesBuyOrder(OwnerAssetsRequest {
            addr: "1Bob".to_string(),
            token: vec!["BTY".to_string()],
            ..Default::default()
        }),
        QueryRequest::GetOnesSellOrderWithStatus(OwnerAssetsRequest {
            addr: "1Alice".to_string(),
            status: 2,
            ..Default::default()
        }),
        QueryRequest::GetOnesBuyOrderWithStatus(OwnerAssetsRequest {
            addr: "1Bob".to_string(),
            status: 6,
            ..Default::default()
        }),
        QueryRequest::GetOnesOrderWithStatus(OwnerStatusPageRequest {
            addr: "1Alice".to_string(),
            status: 2,
            count: 5,
            ..Default::default()
        }),
        QueryRequest::GetTradeOrder(OrderKeyRequest { key: hex(market) }),
        QueryRequest::GetSellOrder(OrderKeyRequest { key: ask.id() }),
        QueryRequest::GetBuyOrder(OrderKeyRequest { key: bid.id() }),
    ];
    for request in &requests {
        let expected = assert_ok!(original.execute(request).await);
        let actual = assert_ok!(engine.execute(request).await);
        assert_eq!(actual, expected, "{request:?}");
        if let QueryReply::TradeOrders { orders } = &actual {
            assert!(!orders.is_empty(), "{request:?}");
        }
    }
}

/// Replies serialize to the shape the host forwards to clients.
#[tokio::test]
async fn test_reply_json() {
    let ledger = TestLedger::default();
    let ask = ledger.sell_limit("1Alice", "BTY", "1", "3", 5).await;
    let engine = ledger.engine();

    let reply = assert_ok!(
        engine
            .execute(&QueryRequest::GetTradeOrder(OrderKeyRequest { key: ask.id() }))
            .await
    );
    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["key"], ask.id());
    assert_eq!(json["is_sell"], true);
    assert_eq!(json["price_per_boardlot"], 300_000_000);
    assert_eq!(json["status"], 1);

    let reply = assert_ok!(
        engine
            .execute(&QueryRequest::GetTokenSellOrderByStatus(token_page("BTY", 1)))
            .await
    );
    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["orders"][0]["key"], ask.id());
    assert_eq!(json["orders"][0]["tx_index"], ask.tx_index);
}
