//! Document-store seam. The production system talks to a hosted document
//! database; this crate injects an explicit `Store` handle into every
//! component instead of a module-level singleton, backed in-process by
//! keyed collections with per-document atomic updates and a serializable
//! multi-document transaction primitive.

use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::models::courier::{Courier, EarningsEntry};
use crate::models::order::Order;
use crate::models::restaurant::Restaurant;

/// A keyed collection of documents. `try_update` runs under the document's
/// entry lock, so single-document read-modify-write is atomic.
pub struct Collection<T> {
    name: &'static str,
    docs: DashMap<String, T>,
}

impl<T: Clone> Collection<T> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            docs: DashMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Result<T, AppError> {
        self.find(id)
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", self.name, id)))
    }

    pub fn find(&self, id: &str) -> Option<T> {
        self.docs.get(id).map(|doc| doc.value().clone())
    }

    pub fn insert(&self, id: impl Into<String>, doc: T) {
        self.docs.insert(id.into(), doc);
    }

    /// Atomic read-modify-write of one document. `f` may reject without
    /// mutating; callers validate before touching fields.
    pub fn try_update(
        &self,
        id: &str,
        f: impl FnOnce(&mut T) -> Result<(), AppError>,
    ) -> Result<(), AppError> {
        match self.docs.get_mut(id) {
            Some(mut doc) => f(doc.value_mut()),
            None => Err(AppError::NotFound(format!("{} {} not found", self.name, id))),
        }
    }

    /// Infallible variant for transaction write sets; a missing document is
    /// a no-op (documents are never deleted, and staged writes only target
    /// documents read earlier in the same transaction).
    pub fn update(&self, id: &str, f: impl FnOnce(&mut T)) {
        if let Some(mut doc) = self.docs.get_mut(id) {
            f(doc.value_mut());
        }
    }

    /// Point-in-time snapshot query; equality and range filters are
    /// expressed as predicates.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.docs
            .iter()
            .filter(|entry| pred(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }
}

pub struct Store {
    pub orders: Collection<Order>,
    pub couriers: Collection<Courier>,
    pub restaurants: Collection<Restaurant>,
    pub earnings: Collection<EarningsEntry>,
    txn_lock: Mutex<()>,
    txn_timeout: Duration,
}

/// An in-flight transaction: reads go against committed state (serialized
/// by the store-wide transaction lock), writes are staged and applied only
/// on commit. Reads precede writes, as in the hosted store's transaction
/// model.
pub struct Txn<'s> {
    store: &'s Store,
    writes: Vec<Box<dyn FnOnce(&Store) + Send>>,
}

impl Txn<'_> {
    pub fn store(&self) -> &Store {
        self.store
    }

    pub fn stage(&mut self, write: impl FnOnce(&Store) + Send + 'static) {
        self.writes.push(Box::new(write));
    }
}

impl Store {
    pub fn new(txn_timeout: Duration) -> Self {
        Self {
            orders: Collection::new("order"),
            couriers: Collection::new("courier"),
            restaurants: Collection::new("restaurant"),
            earnings: Collection::new("earnings entry"),
            txn_lock: Mutex::new(()),
            txn_timeout,
        }
    }

    /// Runs `work` as one atomic unit. The transaction lock serializes the
    /// whole read-check-write sequence against every other transaction;
    /// staged writes apply on `Ok` and are discarded on any `Err`. Failing
    /// to acquire the lock within the budget surfaces `TransactionAborted`,
    /// the one retryable error kind.
    pub async fn with_transaction<R>(
        &self,
        work: impl FnOnce(&mut Txn<'_>) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let _guard = tokio::time::timeout(self.txn_timeout, self.txn_lock.lock())
            .await
            .map_err(|_| AppError::TransactionAborted)?;

        let mut txn = Txn {
            store: self,
            writes: Vec::new(),
        };
        let out = work(&mut txn)?;

        for write in txn.writes {
            write(self);
        }

        Ok(out)
    }
}
