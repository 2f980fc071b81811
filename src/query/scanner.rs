use serde::de::DeserializeOwned;
use tracing::{Span, debug, warn};

use crate::{
    error::{QueryError, QueryResult, StoreError},
    keys::{IndexDef, OrderKey, primary_key},
    store::{KvPair, LocalDb},
    types::{Direction, LocalOrder},
};

/// Range scans over the order table indexes and the owner key lists.
#[derive(derive_more::Debug)]
pub struct IndexScanner<L> {
    #[debug(skip)]
    db: L,
    span: Span,
}

impl<L: LocalDb> IndexScanner<L> {
    pub fn new(db: L, span: Span) -> Self {
        Self { db, span }
    }

    /// Up to `count` rows of the index matching the template.
    ///
    /// `count` must be positive and `direction` `0` or `1`, both are checked
    /// before the store is touched. A non-empty `template.tx_index` is an
    /// exclusive cursor. Fails with [`QueryError::NotFound`] when nothing
    /// matches, and with [`QueryError::TypeMismatch`] as soon as a row does not
    /// decode into `R`.
    pub async fn page<R: DeserializeOwned>(
        &self,
        index: IndexDef<R>,
        template: &LocalOrder,
        count: i32,
        direction: i32,
    ) -> QueryResult<Vec<R>> {
        if count <= 0 {
            return Err(QueryError::InvalidParam(format!("count {count}")));
        }
        let direction = Direction::try_from(direction)?;

        let start = match template.tx_index.as_str() {
            "" => None,
            cursor => Some(self.cursor(index, cursor).await?),
        };
        let rows = self
            .db
            .list(&index.prefix(template), start.as_deref(), count as usize, direction)
            .await?;
        debug!(
            parent: &self.span,
            index = index.name(),
            cursor = %template.tx_index,
            ?direction,
            rows = rows.len(),
            "Index page"
        );
        Self::decode(index, rows)
    }

    /// Every row of the index matching the template, in index order.
    pub async fn all<R: DeserializeOwned>(
        &self,
        index: IndexDef<R>,
        template: &LocalOrder,
    ) -> QueryResult<Vec<R>> {
        let rows = self
            .db
            .list(&index.prefix(template), None, 0, Direction::Ascending)
            .await?;
        debug!(parent: &self.span, index = index.name(), rows = rows.len(), "Index rows");
        Self::decode(index, rows)
    }

    /// Order keys listed under a raw prefix.
    ///
    /// Values that are not order keys are skipped one by one.
    pub async fn keys(&self, prefix: &[u8]) -> QueryResult<Vec<OrderKey>> {
        let values = self.db.list(prefix, None, 0, Direction::Ascending).await?;
        debug!(
            parent: &self.span,
            prefix = %String::from_utf8_lossy(prefix),
            values = values.len(),
            "Order keys"
        );
        Ok(values
            .into_iter()
            .filter_map(|(_, value)| match OrderKey::parse(&value) {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(parent: &self.span, %e, "Skipping undecodable order key");
                    None
                }
            })
            .collect())
    }

    /// Index key of the order at the `tx_index` cursor.
    async fn cursor<R>(&self, index: IndexDef<R>, tx_index: &str) -> QueryResult<Vec<u8>> {
        let raw = match LocalDb::get(&self.db, &primary_key(tx_index)).await {
            Ok(raw) => raw,
            Err(StoreError::NotFound) => {
                return Err(QueryError::InvalidParam(format!("unknown cursor {tx_index:?}")));
            }
            Err(e) => return Err(e.into()),
        };
        let order: LocalOrder =
            serde_json::from_slice(&raw).map_err(|_| QueryError::TypeMismatch {
                index: "primary",
                key: tx_index.to_string(),
                expected: "LocalOrder",
            })?;
        Ok(index.key(&order))
    }

    fn decode<R: DeserializeOwned>(
        index: IndexDef<R>,
        rows: Vec<KvPair>,
    ) -> QueryResult<Vec<R>> {
        rows.into_iter()
            .map(|(key, value)| {
                serde_json::from_slice(&value).map_err(|_| QueryError::TypeMismatch {
                    index: index.name(),
                    key: String::from_utf8_lossy(&key).into_owned(),
                    expected: short_type_name::<R>(),
                })
            })
            .collect()
    }
}

fn short_type_name<R>() -> &'static str {
    let name = std::any::type_name::<R>();
    name.rsplit("::").next().unwrap_or(name)
}
