use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use domain::{ExtraAttribute, LineItem, NewOrder, Order, OrderAggregate, OrderStatus};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{OrderStore, StatusUpdate},
    token,
};

#[derive(Debug, Clone)]
struct TokenRow {
    order_id: i64,
    expires: DateTime<Utc>,
    consumed: bool,
}

#[derive(Default)]
struct Inner {
    orders: BTreeMap<i64, OrderAggregate>,
    tokens: HashMap<String, TokenRow>,
    next_order_id: i64,
    next_item_id: i64,
    next_extra_id: i64,
}

/// In-memory order store for testing.
///
/// Mirrors the semantics of the PostgreSQL implementation: ids are assigned
/// in insertion order, deletes cascade, creation is all-or-nothing.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    /// Force-expires a token, for expiry tests.
    pub async fn expire_token(&self, token: &str) {
        if let Some(row) = self.inner.write().await.tokens.get_mut(token) {
            row.expires = Utc::now() - Duration::seconds(1);
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: NewOrder) -> Result<i64> {
        // Validate up front so a rejected aggregate leaves nothing behind,
        // matching the transactional rollback of the Postgres store.
        if let Some(bad) = order.line_items.iter().find(|i| i.quantity < 0) {
            return Err(StoreError::InvalidQuantity(bad.quantity));
        }

        let mut inner = self.inner.write().await;
        inner.next_order_id += 1;
        let order_id = inner.next_order_id;

        let mut line_items = Vec::with_capacity(order.line_items.len());
        for item in &order.line_items {
            inner.next_item_id += 1;
            line_items.push(LineItem {
                id: inner.next_item_id,
                order_id,
                ean: item.ean.clone(),
                description: item.description.clone(),
                quantity: item.quantity,
                net_cost: item.net_cost,
                gross_price: item.gross_price,
                reference: item.reference.clone(),
            });
        }

        let mut extras = Vec::with_capacity(order.extras.len());
        for extra in &order.extras {
            inner.next_extra_id += 1;
            extras.push(ExtraAttribute {
                id: inner.next_extra_id,
                order_id,
                kind: extra.kind.clone(),
                value: extra.value.clone(),
            });
        }

        let header = Order {
            id: order_id,
            customer_ref: order.customer_ref,
            billing_address_ref: order.billing_address_ref,
            payment_method_ref: order.payment_method_ref,
            order_date: order.order_date,
            order_reference: order.order_reference,
            storefront_page: order.storefront_page,
            release_flag: order.release_flag,
            sales_channel_ref: order.sales_channel_ref,
            shipping_config_ref: order.shipping_config_ref,
            email: order.email,
            delivery_address: order.delivery_address,
            status: OrderStatus::New,
            tracking_number: None,
            carrier: None,
            shipped_at: None,
            submission_status: None,
        };

        inner.orders.insert(
            order_id,
            OrderAggregate {
                header,
                line_items,
                extras,
            },
        );

        Ok(order_id)
    }

    async fn get(&self, order_id: i64) -> Result<OrderAggregate> {
        self.inner
            .read()
            .await
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(StoreError::OrderNotFound(order_id))
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        Ok(self
            .inner
            .read()
            .await
            .orders
            .values()
            .map(|a| a.header.clone())
            .collect())
    }

    async fn delete(&self, order_id: i64) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.orders.remove(&order_id);
        inner.tokens.retain(|_, row| row.order_id != order_id);
        Ok(())
    }

    async fn update_status(&self, order_id: i64, update: StatusUpdate) -> Result<Order> {
        let mut inner = self.inner.write().await;
        let aggregate = inner
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;

        let current = aggregate.header.status;
        let next = update.status.unwrap_or(current);
        if !current.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        aggregate.header.status = next;
        if let Some(tracking) = update.tracking_number {
            aggregate.header.tracking_number = Some(tracking);
        }
        if let Some(carrier) = update.carrier {
            aggregate.header.carrier = Some(carrier);
        }
        aggregate.header.shipped_at = Some(Utc::now());

        Ok(aggregate.header.clone())
    }

    async fn record_submission(&self, order_id: i64, status: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let aggregate = inner
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        aggregate.header.submission_status = Some(status.to_string());
        Ok(())
    }

    async fn issue_cancel_token(&self, order_id: i64) -> Result<String> {
        let mut inner = self.inner.write().await;
        if !inner.orders.contains_key(&order_id) {
            return Err(StoreError::OrderNotFound(order_id));
        }

        let value = token::generate();
        inner.tokens.insert(
            value.clone(),
            TokenRow {
                order_id,
                expires: Utc::now() + Duration::days(token::CANCEL_TOKEN_TTL_DAYS),
                consumed: false,
            },
        );
        Ok(value)
    }

    async fn redeem_cancel_token(&self, token: &str) -> Result<i64> {
        let mut inner = self.inner.write().await;
        let row = inner
            .tokens
            .get_mut(token)
            .ok_or(StoreError::TokenNotFound)?;

        if row.consumed {
            return Err(StoreError::TokenConsumed);
        }
        if row.expires < Utc::now() {
            return Err(StoreError::TokenExpired);
        }

        row.consumed = true;
        Ok(row.order_id)
    }

    async fn cancel_order(&self, token: &str) -> Result<Order> {
        let mut inner = self.inner.write().await;
        let inner = &mut *inner;

        let row = inner
            .tokens
            .get_mut(token)
            .ok_or(StoreError::TokenNotFound)?;
        if row.consumed {
            return Err(StoreError::TokenConsumed);
        }
        if row.expires < Utc::now() {
            return Err(StoreError::TokenExpired);
        }

        let aggregate = inner
            .orders
            .get_mut(&row.order_id)
            .ok_or(StoreError::OrderNotFound(row.order_id))?;

        let current = aggregate.header.status;
        if !current.can_transition_to(OrderStatus::Cancelled) {
            // Token stays redeemable so a retry reports the same reason.
            return Err(StoreError::InvalidTransition {
                from: current,
                to: OrderStatus::Cancelled,
            });
        }

        aggregate.header.status = OrderStatus::Cancelled;
        aggregate.header.shipped_at = Some(Utc::now());
        row.consumed = true;

        Ok(aggregate.header.clone())
    }
}
