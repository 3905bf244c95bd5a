//! The `OrderStore` trait.

use async_trait::async_trait;
use domain::{NewOrder, Order, OrderAggregate, OrderStatus};

use crate::error::Result;

/// Partial status update. Each field only replaces the stored value when
/// supplied; the ship date is stamped unconditionally.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub status: Option<OrderStatus>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
}

/// Persistence surface for the order aggregate.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new aggregate in one transaction: header first, then every
    /// line item and extra attribute referencing the generated id. All or
    /// nothing; on failure no partial aggregate remains visible.
    async fn create(&self, order: NewOrder) -> Result<i64>;

    /// Loads the header plus its full child collections.
    async fn get(&self, order_id: i64) -> Result<OrderAggregate>;

    /// Returns all headers, children excluded.
    async fn list_all(&self) -> Result<Vec<Order>>;

    /// Deletes the header; cascade rules remove the children. Succeeds even
    /// when the id does not exist.
    async fn delete(&self, order_id: i64) -> Result<()>;

    /// Applies a partial status update and returns the updated header.
    /// A supplied status must be reachable from the current one.
    async fn update_status(&self, order_id: i64, update: StatusUpdate) -> Result<Order>;

    /// Records the outcome of an export attempt on the header.
    async fn record_submission(&self, order_id: i64, status: &str) -> Result<()>;

    /// Issues a fresh cancellation token for the order. Tokens carry an
    /// expiry timestamp and are single-use.
    async fn issue_cancel_token(&self, order_id: i64) -> Result<String>;

    /// Validates a token (exists, unexpired, unused), marks it consumed, and
    /// returns the order id it is bound to.
    async fn redeem_cancel_token(&self, token: &str) -> Result<i64>;

    /// Redeems a token and cancels its order in one step: the token is only
    /// consumed when the order actually reaches `Cancelled`. A refused
    /// cancellation (already shipped, for example) leaves the token
    /// redeemable so the caller sees the real reason on retry.
    async fn cancel_order(&self, token: &str) -> Result<Order>;
}
