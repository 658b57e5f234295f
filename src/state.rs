use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenDirectory;
use crate::engine::dispatch::DispatchCoordinator;
use crate::engine::ledger::OrderLedger;
use crate::engine::registry::CourierRegistry;
use crate::engine::stats::StatisticsAggregator;
use crate::observability::metrics::Metrics;
use crate::store::Store;

/// Everything a request handler needs. The store and identity directory
/// are injected handles, not module-level singletons; every component gets
/// its own reference to the same store.
pub struct AppState {
    pub store: Arc<Store>,
    pub identity: Arc<TokenDirectory>,
    pub ledger: OrderLedger,
    pub registry: CourierRegistry,
    pub dispatch: DispatchCoordinator,
    pub stats: StatisticsAggregator,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(txn_timeout: Duration) -> Self {
        let store = Arc::new(Store::new(txn_timeout));
        let identity = Arc::new(TokenDirectory::new());
        let metrics = Metrics::new();

        Self {
            ledger: OrderLedger::new(store.clone()),
            registry: CourierRegistry::new(store.clone()),
            dispatch: DispatchCoordinator::new(store.clone(), metrics.clone()),
            stats: StatisticsAggregator::new(store.clone()),
            store,
            identity,
            metrics,
        }
    }
}
