//! ParcelVault persistence.
//!
//! All durable portal state (access codes, parcels, the download log and pending
//! access requests) lives in one [`Snapshot`]. A [`Store`] hands out cheap read
//! snapshots and applies every mutation as a read-modify-write under a single writer
//! lock, persisting through a swappable [`DataStore`] backend. Repositories expose
//! the domain operations on top of it.

pub mod repositories;
pub mod store;

pub use repositories::{
    AccessCodeRepository, AccessRequestRepository, DownloadLogRepository, ParcelRepository,
};
pub use store::{
    create_data_store, DataStore, InMemoryStore, JsonFileStore, Snapshot, Store, StoreError,
    StoreResult,
};
