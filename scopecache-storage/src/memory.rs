//! In-memory store gateway.
//!
//! Rows live in an id-ordered map and are handed out as fresh handles on
//! every load, the way a database driver would. `Criteria` filters and
//! ordering are evaluated against each row's JSON form. Projection,
//! includes and lock modes are accepted and ignored.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use scopecache_core::filter::compare;
use scopecache_core::{
    CacheError, CacheResult, Criteria, Model, ModelHandle, ModelId, ModelKind, OrderBy, SortDirection,
    StorageError, StoreConfig,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::cache::TransactionHandle;
use crate::gateway::StoreGateway;

/// Gateway operation, as recorded in the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Load,
    LoadMany,
    Persist(ModelId),
}

/// One recorded gateway call and the transaction it joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub transaction: Option<Uuid>,
}

/// Reference [`StoreGateway`] over an in-process table of one kind.
pub struct InMemoryStore<M> {
    config: StoreConfig,
    kind: ModelKind,
    rows: RwLock<BTreeMap<ModelId, M>>,
    calls: Mutex<Vec<StoreCall>>,
}

impl<M> InMemoryStore<M>
where
    M: Model + Clone + Serialize,
{
    /// Create an empty table for `kind`. Fails if `config` does not validate.
    pub fn new(config: StoreConfig, kind: ModelKind) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            kind,
            rows: RwLock::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Insert or replace rows directly, bypassing the call log.
    pub async fn seed<I>(&self, models: I)
    where
        I: IntoIterator<Item = M>,
    {
        let mut rows = self.rows.write().await;
        for model in models {
            rows.insert(model.id(), model);
        }
    }

    /// Stored row for `id`, as last persisted.
    pub async fn row(&self, id: ModelId) -> Option<M> {
        self.rows.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Every gateway call so far, oldest first.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, op: StoreOp, tx: Option<&TransactionHandle>) {
        self.calls.lock().await.push(StoreCall {
            op,
            transaction: tx.map(TransactionHandle::id),
        });
    }

    /// Row locks are bounded by `query_timeout` for reads and writes alike.
    async fn read_rows(&self) -> CacheResult<RwLockReadGuard<'_, BTreeMap<ModelId, M>>> {
        tokio::time::timeout(self.config.query_timeout, self.rows.read())
            .await
            .map_err(|_| self.timed_out())
    }

    async fn write_rows(&self) -> CacheResult<RwLockWriteGuard<'_, BTreeMap<ModelId, M>>> {
        tokio::time::timeout(self.config.query_timeout, self.rows.write())
            .await
            .map_err(|_| self.timed_out())
    }

    fn timed_out(&self) -> CacheError {
        StorageError::Unavailable {
            reason: format!("query timed out after {:?}", self.config.query_timeout),
        }
        .into()
    }

    fn select(&self, rows: &BTreeMap<ModelId, M>, criteria: &Criteria, limit: Option<usize>) -> CacheResult<Vec<M>> {
        let mut matched = Vec::new();
        for model in rows.values() {
            let doc = serde_json::to_value(model).map_err(|e| StorageError::LoadFailed {
                kind: self.kind,
                reason: e.to_string(),
            })?;
            if criteria.filter.iter().all(|expr| expr.matches(&doc)) {
                matched.push((doc, model));
            }
        }

        if !criteria.order.is_empty() {
            matched.sort_by(|(a, _), (b, _)| order_docs(a, b, &criteria.order));
        }

        Ok(matched
            .into_iter()
            .skip(criteria.offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(_, model)| model.clone())
            .collect())
    }
}

fn order_docs(a: &Value, b: &Value, order: &[OrderBy]) -> Ordering {
    for term in order {
        let left = a.get(term.field.as_str()).unwrap_or(&Value::Null);
        let right = b.get(term.field.as_str()).unwrap_or(&Value::Null);
        let ordering = compare(left, right).unwrap_or(Ordering::Equal);
        let ordering = match term.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl<M> StoreGateway<M> for InMemoryStore<M>
where
    M: Model + Clone + Serialize,
{
    async fn load(
        &self,
        criteria: &Criteria,
        tx: Option<&TransactionHandle>,
    ) -> CacheResult<Option<ModelHandle<M>>> {
        self.record(StoreOp::Load, tx).await;
        let rows = self.read_rows().await?;
        let found = self.select(&rows, criteria, Some(1))?;
        Ok(found.into_iter().next().map(ModelHandle::new))
    }

    async fn load_many(
        &self,
        criteria: &Criteria,
        tx: Option<&TransactionHandle>,
    ) -> CacheResult<Vec<ModelHandle<M>>> {
        self.record(StoreOp::LoadMany, tx).await;
        let rows = self.read_rows().await?;
        let limit = criteria.limit.or(self.config.max_rows);
        let found = self.select(&rows, criteria, limit)?;
        Ok(found.into_iter().map(ModelHandle::new).collect())
    }

    async fn persist(&self, model: &ModelHandle<M>, tx: Option<&TransactionHandle>) -> CacheResult<()> {
        self.record(StoreOp::Persist(model.id()), tx).await;
        if model.kind() != self.kind {
            return Err(StorageError::PersistFailed {
                kind: model.kind(),
                id: model.id(),
                reason: format!("table holds {}", self.kind),
            }
            .into());
        }

        let row = model.snapshot()?;
        if row.id() != model.id() {
            return Err(StorageError::PersistFailed {
                kind: self.kind,
                id: model.id(),
                reason: format!("row id changed to {}", row.id()),
            }
            .into());
        }

        self.write_rows().await?.insert(model.id(), row);
        Ok(())
    }
}
