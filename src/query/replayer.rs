use tracing::{Span, debug, warn};

use crate::{
    error::{QueryError, QueryResult, StoreError},
    store::TxResults,
    types::{LogType, TradeReceipt, TxHash, TxResult},
};

/// Trade receipt recovered from a committed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replayed {
    pub receipt: TradeReceipt,

    /// `0x`-prefixed hash of the transaction.
    pub tx_hash: String,
    pub block_time: i64,
}

/// Reconstruction of orders from transaction receipts.
#[derive(derive_more::Debug)]
pub struct EventLogReplayer<T> {
    #[debug(skip)]
    source: T,
    span: Span,
}

impl<T: TxResults> EventLogReplayer<T> {
    pub fn new(source: T, span: Span) -> Self {
        Self { source, span }
    }

    /// Execution result of the transaction.
    pub async fn tx_result(&self, hash: TxHash) -> QueryResult<TxResult> {
        match self.source.tx_result(hash).await {
            Ok(result) => Ok(result),
            Err(StoreError::NotFound) => {
                debug!(parent: &self.span, %hash, "No transaction");
                Err(QueryError::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// First receipt of the result whose type is among `wanted`.
    ///
    /// Only the first matching entry is considered: if its payload does not
    /// decode, there is no receipt.
    pub fn extract(&self, result: &TxResult, wanted: &[LogType]) -> Option<TradeReceipt> {
        let (ty, log) = result.logs.iter().find_map(|log| {
            LogType::from_code(log.ty)
                .filter(|ty| wanted.contains(ty))
                .map(|ty| (ty, log))
        })?;
        match TradeReceipt::decode(ty, &log.payload) {
            Ok(receipt) => Some(receipt),
            Err(e) => {
                warn!(parent: &self.span, tx_hash = %result.tx_hash, ?ty, %e, "Undecodable receipt");
                None
            }
        }
    }

    /// Fetches the transaction and extracts its receipt.
    ///
    /// Fails with [`QueryError::NotFound`] when the transaction is unknown or
    /// carries none of the `wanted` receipts.
    pub async fn replay(&self, hash: TxHash, wanted: &[LogType]) -> QueryResult<Replayed> {
        let result = self.tx_result(hash).await?;
        let Some(receipt) = self.extract(&result, wanted) else {
            debug!(parent: &self.span, %hash, ?wanted, "No matching receipt");
            return Err(QueryError::NotFound);
        };
        Ok(Replayed {
            receipt,
            tx_hash: result.tx_hash,
            block_time: result.block_time,
        })
    }
}
