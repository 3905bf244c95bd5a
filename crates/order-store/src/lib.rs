//! Order aggregate store.
//!
//! The [`OrderStore`] trait covers the whole persistence surface: atomic
//! aggregate creation, lookup, listing, idempotent deletion, partial status
//! updates, submission-status bookkeeping, and cancellation tokens. Two
//! implementations exist: [`PostgresOrderStore`] for production and
//! [`InMemoryOrderStore`] for tests.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod token;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use store::{OrderStore, StatusUpdate};
