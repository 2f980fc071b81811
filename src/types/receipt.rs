use serde::{Deserialize, Serialize};

use super::{Address, Height, OrderSide};
use crate::error::QueryResult;

/// Trade receipt log types emitted by the ledger executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogType {
    SellLimit,
    BuyMarket,
    SellRevoke,
    SellMarket,
    BuyLimit,
    BuyRevoke,
}

impl LogType {
    /// Receipts of orders with a live record in the state store.
    pub const LIMIT: &'static [LogType] = &[LogType::SellLimit, LogType::BuyLimit];

    /// Receipts of orders that exist only in the event log.
    pub const UNMATERIALIZED: &'static [LogType] = &[
        LogType::BuyMarket,
        LogType::BuyRevoke,
        LogType::SellRevoke,
        LogType::SellMarket,
    ];

    pub fn code(&self) -> i32 {
        match self {
            LogType::SellLimit => 310,
            LogType::BuyMarket => 311,
            LogType::SellRevoke => 312,
            LogType::SellMarket => 330,
            LogType::BuyLimit => 331,
            LogType::BuyRevoke => 332,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            310 => Some(LogType::SellLimit),
            311 => Some(LogType::BuyMarket),
            312 => Some(LogType::SellRevoke),
            330 => Some(LogType::SellMarket),
            331 => Some(LogType::BuyLimit),
            332 => Some(LogType::BuyRevoke),
            _ => None,
        }
    }

    /// Side of the order the receipt describes.
    pub fn side(&self) -> OrderSide {
        match self {
            LogType::SellLimit | LogType::SellRevoke | LogType::SellMarket => OrderSide::Sell,
            LogType::BuyLimit | LogType::BuyRevoke | LogType::BuyMarket => OrderSide::Buy,
        }
    }
}

/// Single typed entry of a transaction's execution log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLog {
    /// Log type code, not necessarily a trade one.
    pub ty: i32,

    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
}

impl ReceiptLog {
    pub fn new(ty: i32, payload: Vec<u8>) -> Self {
        Self { ty, payload }
    }

    /// Encodes a trade receipt into its log entry.
    pub fn from_receipt(receipt: &TradeReceipt) -> Self {
        let payload = match receipt.base() {
            ReceiptBase::Sell(base) => serde_json::to_vec(base),
            ReceiptBase::Buy(base) => serde_json::to_vec(base),
        }
        .expect("ReceiptLog: encode receipt");
        Self::new(receipt.log_type().code(), payload)
    }
}

/// Execution result of a committed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    /// `0x`-prefixed transaction hash.
    pub tx_hash: String,
    pub height: Height,
    pub block_time: i64,
    pub logs: Vec<ReceiptLog>,
}

/// Sell side part of a trade receipt, amounts and prices as decimal strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptSellBase {
    pub token_symbol: String,
    pub owner: Address,
    pub amount_per_boardlot: String,
    pub min_boardlot: i64,
    pub price_per_boardlot: String,
    pub total_boardlot: i64,
    pub sold_boardlot: i64,
    pub starttime: i64,
    pub stoptime: i64,
    pub crowdfund: bool,
    pub sell_id: String,
    pub status: String,
    pub buy_id: String,
    pub tx_hash: String,
    pub height: Height,
    pub asset_exec: String,
}

/// Buy side part of a trade receipt, amounts and prices as decimal strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptBuyBase {
    pub token_symbol: String,
    pub owner: Address,
    pub amount_per_boardlot: String,
    pub min_boardlot: i64,
    pub price_per_boardlot: String,
    pub total_boardlot: i64,
    pub bought_boardlot: i64,
    pub buy_id: String,
    pub status: String,
    pub sell_id: String,
    pub tx_hash: String,
    pub height: Height,
    pub asset_exec: String,
}

/// Decoded trade receipt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TradeReceipt {
    SellLimit(ReceiptSellBase),
    BuyMarket(ReceiptBuyBase),
    SellRevoke(ReceiptSellBase),
    SellMarket(ReceiptSellBase),
    BuyLimit(ReceiptBuyBase),
    BuyRevoke(ReceiptBuyBase),
}

/// Side-specific view over the base of a [`TradeReceipt`].
#[derive(Clone, Copy, Debug)]
pub enum ReceiptBase<'a> {
    Sell(&'a ReceiptSellBase),
    Buy(&'a ReceiptBuyBase),
}

impl TradeReceipt {
    /// Decodes the payload of a log entry of the given type.
    pub fn decode(ty: LogType, payload: &[u8]) -> QueryResult<Self> {
        let sell = || serde_json::from_slice::<ReceiptSellBase>(payload);
        let buy = || serde_json::from_slice::<ReceiptBuyBase>(payload);
        let receipt = match ty {
            LogType::SellLimit => TradeReceipt::SellLimit(sell()?),
            LogType::SellRevoke => TradeReceipt::SellRevoke(sell()?),
            LogType::SellMarket => TradeReceipt::SellMarket(sell()?),
            LogType::BuyLimit => TradeReceipt::BuyLimit(buy()?),
            LogType::BuyRevoke => TradeReceipt::BuyRevoke(buy()?),
            LogType::BuyMarket => TradeReceipt::BuyMarket(buy()?),
        };
        Ok(receipt)
    }

    pub fn log_type(&self) -> LogType {
        match self {
            TradeReceipt::SellLimit(_) => LogType::SellLimit,
            TradeReceipt::BuyMarket(_) => LogType::BuyMarket,
            TradeReceipt::SellRevoke(_) => LogType::SellRevoke,
            TradeReceipt::SellMarket(_) => LogType::SellMarket,
            TradeReceipt::BuyLimit(_) => LogType::BuyLimit,
            TradeReceipt::BuyRevoke(_) => LogType::BuyRevoke,
        }
    }

    pub fn base(&self) -> ReceiptBase<'_> {
        match self {
            TradeReceipt::SellLimit(b) | TradeReceipt::SellRevoke(b) | TradeReceipt::SellMarket(b) => {
                ReceiptBase::Sell(b)
            }
            TradeReceipt::BuyLimit(b) | TradeReceipt::BuyRevoke(b) | TradeReceipt::BuyMarket(b) => {
                ReceiptBase::Buy(b)
            }
        }
    }
}

mod hex_bytes {
    use alloy::primitives::hex;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode_prefixed(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;

    #[test]
    fn test_log_type_codes() {
        for ty in LogType::LIMIT.iter().chain(LogType::UNMATERIALIZED) {
            assert_eq!(LogType::from_code(ty.code()), Some(*ty));
        }
        assert_eq!(LogType::from_code(2), None);
        assert_eq!(LogType::SellMarket.side(), OrderSide::Sell);
        assert_eq!(LogType::BuyRevoke.side(), OrderSide::Buy);
    }

    #[test]
    fn test_receipt_log_payload() {
        let receipt = TradeReceipt::BuyMarket(ReceiptBuyBase {
            token_symbol: "BTY".to_string(),
            amount_per_boardlot: "1".to_string(),
            price_per_boardlot: "0.5".to_string(),
            status: "boughtout".to_string(),
            ..Default::default()
        });
        let log = ReceiptLog::from_receipt(&receipt);
        assert_eq!(log.ty, 311);
        assert_eq!(
            TradeReceipt::decode(LogType::BuyMarket, &log.payload),
            Ok(receipt)
        );

        let json = serde_json::to_string(&log).unwrap();
        assert!(json.contains("\"payload\":\"0x"));
        assert_eq!(serde_json::from_str::<ReceiptLog>(&json).unwrap(), log);
    }

    #[test]
    fn test_every_receipt_encodes() {
        let sell = ReceiptSellBase {
            sell_id: "mavl-trade-sell-01".to_string(),
            ..Default::default()
        };
        let buy = ReceiptBuyBase {
            buy_id: "mavl-trade-buy-01".to_string(),
            ..Default::default()
        };
        for receipt in [
            TradeReceipt::SellLimit(sell.clone()),
            TradeReceipt::SellMarket(sell.clone()),
            TradeReceipt::SellRevoke(sell),
            TradeReceipt::BuyLimit(buy.clone()),
            TradeReceipt::BuyMarket(buy.clone()),
            TradeReceipt::BuyRevoke(buy),
        ] {
            let log = ReceiptLog::from_receipt(&receipt);
            assert!(!log.payload.is_empty(), "{receipt:?}");
            assert_eq!(
                TradeReceipt::decode(receipt.log_type(), &log.payload),
                Ok(receipt)
            );
        }
    }

    #[test]
    fn test_decode_garbage_payload() {
        assert!(matches!(
            TradeReceipt::decode(LogType::SellLimit, b"not json"),
            Err(QueryError::Decode(_))
        ));
    }
}
