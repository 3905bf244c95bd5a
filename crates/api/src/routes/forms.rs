//! Newsletter and contact form endpoints.
//!
//! Both only validate and enqueue an internal notification mail; there is
//! no subscriber storage.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use order_store::OrderStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::mail::OutgoingMail;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct NewsletterRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "nachricht", default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct FormResponse {
    pub success: bool,
}

fn required(value: &Option<String>, field: &str) -> Result<String, ApiError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApiError::BadRequest(format!("missing field: {field}"))),
    }
}

/// POST /newsletter — notify the shop owner of a sign-up.
#[tracing::instrument(skip(state, req))]
pub async fn newsletter<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<NewsletterRequest>,
) -> Result<Json<FormResponse>, ApiError> {
    let email = required(&req.email, "email")?;

    state.mailer.enqueue(OutgoingMail {
        subject: "Neue Newsletter-Anmeldung".to_string(),
        body: format!("Neue Anmeldung zum Newsletter:\n\n{email}"),
        recipient: None,
        attachment: None,
    });

    Ok(Json(FormResponse { success: true }))
}

/// POST /kontakt — forward a contact message to the shop owner.
#[tracing::instrument(skip(state, req))]
pub async fn contact<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<ContactRequest>,
) -> Result<Json<FormResponse>, ApiError> {
    let email = required(&req.email, "email")?;
    let message = required(&req.message, "nachricht")?;
    let name = req.name.unwrap_or_default();

    state.mailer.enqueue(OutgoingMail {
        subject: format!("Kontaktanfrage von {email}"),
        body: format!("Name: {name}\nEmail: {email}\n\n{message}"),
        recipient: None,
        attachment: None,
    });

    Ok(Json(FormResponse { success: true }))
}
