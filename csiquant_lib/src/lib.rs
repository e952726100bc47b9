//! Library layer for the CSI 500 toolkit: flat-file cache store, incremental
//! daily-bar synchronization, quarterly statement consolidation, and price
//! screeners on top of the `baostock_api` gateway client.

pub mod error;
pub mod metrics;
pub mod screen;
pub mod statements;
pub mod store;
pub mod sync;
pub mod table;
pub mod universe;
pub mod validation;

pub use baostock_api;
pub use baostock_api::types;

pub use error::CsiQuantError;
pub use statements::{ConsolidationSummary, Quarter};
pub use store::CacheStore;
pub use sync::{DownloadSummary, SyncOutcome, SyncSummary};
pub use table::Table;
pub use universe::Universe;
