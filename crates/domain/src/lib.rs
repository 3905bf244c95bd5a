//! Domain types for the bookstore order service.
//!
//! The central concept is the order aggregate: a header row owning a list of
//! line items and a list of free-form extra attributes, treated as one
//! consistency unit. This crate also carries the lifecycle status state
//! machine, the lenient numeric coercion used for client and wholesaler
//! input, and the static product catalog.

pub mod catalog;
pub mod coerce;
pub mod order;
pub mod status;

pub use catalog::{Catalog, CatalogEntry, CatalogError};
pub use order::{
    DeliveryAddress, ExtraAttribute, LineItem, NewExtra, NewLineItem, NewOrder, Order,
    OrderAggregate,
};
pub use status::{OrderStatus, StatusParseError};
