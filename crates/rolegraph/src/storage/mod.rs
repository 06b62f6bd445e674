//! Storage layer for the ledger event log.
//!
//! # Directory layout
//!
//! By convention the default root is `~/.rolegraph/`:
//!
//! ```text
//! ~/.rolegraph/
//! ├── events/
//! │   └── {seq}.json
//! └── labels.json
//! ```
//!
//! # Modules
//!
//! - [`event_store`] — append/load for [`LedgerEvent`](crate::ledger::LedgerEvent) records.

pub mod event_store;

pub use event_store::EventStore;
