pub mod dispatch;
pub mod ledger;
pub mod registry;
pub mod stats;
