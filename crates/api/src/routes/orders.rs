//! Order CRUD, status update, export, and cancellation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::{Catalog, NewOrder, Order, OrderAggregate, OrderStatus};
use order_store::{OrderStore, StatusUpdate};
use serde::{Deserialize, Serialize};
use wholesaler::WholesalerClient;

use crate::error::ApiError;
use crate::mail::{MailAttachment, Mailer, OutgoingMail};

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore> {
    pub store: S,
    pub wholesaler: WholesalerClient,
    pub catalog: Catalog,
    pub mailer: Mailer,
    /// External base URL used to build self-service cancellation links.
    pub public_base_url: String,
}

// -- Request types --

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
    #[serde(rename = "tracking_nummer", default)]
    pub tracking_number: Option<String>,
    #[serde(rename = "versand_dienstleister", default)]
    pub carrier: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub success: bool,
    #[serde(rename = "bestellId")]
    pub order_id: i64,
    #[serde(rename = "stornoToken")]
    pub cancel_token: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Serialize)]
pub struct ExportResponse {
    pub status: &'static str,
    pub moluna_response: serde_json::Value,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub success: bool,
    #[serde(rename = "bestellId")]
    pub order_id: i64,
}

// -- Handlers --

/// POST /bestellung — persist a new order aggregate atomically, then issue
/// a cancellation token and queue the confirmation mail when the customer
/// left an email address. Mail problems never fail the response.
#[tracing::instrument(skip(state, order))]
pub async fn create<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(order): Json<NewOrder>,
) -> Result<Json<OrderCreatedResponse>, ApiError> {
    let email = order.email.clone();
    let invoice_file = order.invoice_file.clone();

    let order_id = state.store.create(order).await?;

    let mut cancel_token = None;
    if let Some(email) = email {
        match state.store.issue_cancel_token(order_id).await {
            Ok(token) => {
                let cancel_link = format!("{}/storno/{}", state.public_base_url, token);

                let attachment = match &invoice_file {
                    Some(filename) => state
                        .wholesaler
                        .fetch_invoice(filename)
                        .await
                        .map(|content| MailAttachment {
                            filename: "Rechnung.pdf".to_string(),
                            content,
                        }),
                    None => None,
                };

                state.mailer.enqueue(OutgoingMail {
                    subject: "Ihre Bestellung".to_string(),
                    body: format!(
                        "Vielen Dank für Ihre Bestellung!\n\n\
                         Bestellnummer: {order_id}\n\n\
                         Stornieren Sie hier:\n{cancel_link}"
                    ),
                    recipient: Some(email),
                    attachment,
                });
                cancel_token = Some(token);
            }
            Err(err) => {
                // The order itself is committed; losing the token only
                // costs the customer the self-service link.
                tracing::error!(order_id, error = %err, "cancel token issuance failed");
            }
        }
    }

    Ok(Json(OrderCreatedResponse {
        success: true,
        order_id,
        cancel_token,
    }))
}

/// GET /bestellungen — list all order headers.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.store.list_all().await?))
}

/// GET /bestellung/:id — full aggregate including line items and extras.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderAggregate>, ApiError> {
    Ok(Json(state.store.get(id).await?))
}

/// DELETE /bestellung/:id — idempotent delete, cascades to children.
#[tracing::instrument(skip(state))]
pub async fn delete<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.store.delete(id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

/// POST /bestellung/:id/status — partial status update.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Order>, ApiError> {
    let status = match req.status.as_deref() {
        Some(raw) => Some(
            raw.parse::<OrderStatus>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        ),
        None => None,
    };

    let updated = state
        .store
        .update_status(
            id,
            StatusUpdate {
                status,
                tracking_number: req.tracking_number,
                carrier: req.carrier,
            },
        )
        .await?;

    Ok(Json(updated))
}

/// POST /bestellung/:id/export — build the wholesaler ORDER payload and
/// submit it (sandbox-gated), recording the outcome on the header.
#[tracing::instrument(skip(state))]
pub async fn export<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<ExportResponse>, ApiError> {
    let aggregate = state.store.get(id).await?;

    let payload = state.wholesaler.build_order_payload(&aggregate);
    let response = state.wholesaler.submit_order(&payload).await?;

    let outcome = if state.wholesaler.sandbox() {
        "sandbox"
    } else {
        "uebermittelt"
    };
    state.store.record_submission(id, outcome).await?;

    Ok(Json(ExportResponse {
        status: "ok",
        moluna_response: response,
    }))
}

/// POST /storno/:token — redeem a cancellation token and cancel the order.
/// The store only consumes the token when the cancellation goes through.
#[tracing::instrument(skip(state, token))]
pub async fn cancel<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(token): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let header = state.store.cancel_order(&token).await?;

    Ok(Json(CancelResponse {
        success: true,
        order_id: header.id,
    }))
}
