//! The order aggregate: header, line items, and extra attributes.
//!
//! Wire and storage field names stay German because both the storefront
//! clients and the wholesaler ORDER endpoint speak that contract
//! (`mol_kunde_id`, `lieferadresse`, `auftrag_position`, ...). Rust field
//! names are English; serde renames bridge the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coerce;
use crate::status::OrderStatus;

/// Delivery address block attached to an order header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    #[serde(rename = "anrede", default)]
    pub salutation: String,
    #[serde(rename = "vorname", default)]
    pub first_name: String,
    #[serde(rename = "nachname", default)]
    pub last_name: String,
    #[serde(rename = "zusatz", default)]
    pub addition: String,
    #[serde(rename = "strasse", default)]
    pub street: String,
    #[serde(rename = "hausnummer", default)]
    pub house_number: String,
    #[serde(rename = "adresszeile_1", default)]
    pub line_1: String,
    #[serde(rename = "adresszeile_2", default)]
    pub line_2: String,
    #[serde(rename = "adresszeile_3", default)]
    pub line_3: String,
    #[serde(rename = "plz", default)]
    pub postal_code: String,
    #[serde(rename = "ort", default)]
    pub city: String,
    #[serde(rename = "land", default)]
    pub country: String,
    #[serde(rename = "land_iso", default)]
    pub country_iso: String,
    #[serde(rename = "tel", default)]
    pub phone: String,
}

/// Stored order header.
///
/// The id is assigned by the store exactly once, at insert time, and is
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(rename = "mol_kunde_id")]
    pub customer_ref: Option<i64>,
    #[serde(rename = "rechnungsadresse_id")]
    pub billing_address_ref: Option<i64>,
    #[serde(rename = "mol_zahlart_id")]
    pub payment_method_ref: Option<i64>,
    #[serde(rename = "bestelldatum")]
    pub order_date: Option<String>,
    #[serde(rename = "bestellreferenz")]
    pub order_reference: Option<String>,
    #[serde(rename = "seite")]
    pub storefront_page: Option<String>,
    #[serde(rename = "bestellfreigabe")]
    pub release_flag: Option<i32>,
    #[serde(rename = "mol_verkaufskanal_id")]
    pub sales_channel_ref: Option<i64>,
    #[serde(rename = "versand_einstellung_id")]
    pub shipping_config_ref: Option<i64>,
    pub email: Option<String>,
    #[serde(rename = "lieferadresse")]
    pub delivery_address: DeliveryAddress,
    pub status: OrderStatus,
    #[serde(rename = "tracking_nummer")]
    pub tracking_number: Option<String>,
    #[serde(rename = "versand_dienstleister")]
    pub carrier: Option<String>,
    #[serde(rename = "versand_datum")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(rename = "uebermittlung_status")]
    pub submission_status: Option<String>,
}

/// Stored line item. Cannot outlive its parent order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    #[serde(rename = "bestell_id")]
    pub order_id: i64,
    pub ean: String,
    #[serde(rename = "bezeichnung")]
    pub description: String,
    #[serde(rename = "menge")]
    pub quantity: i32,
    #[serde(rename = "ek_netto")]
    pub net_cost: f64,
    #[serde(rename = "vk_brutto")]
    pub gross_price: f64,
    #[serde(rename = "referenz")]
    pub reference: Option<String>,
}

impl LineItem {
    /// Returns the export reference: the stored reference when non-empty,
    /// otherwise the `{order_id}-{item_id}` fallback.
    pub fn export_reference(&self) -> String {
        match self.reference.as_deref() {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => format!("{}-{}", self.order_id, self.id),
        }
    }
}

/// Stored typed key/value pair attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraAttribute {
    pub id: i64,
    #[serde(rename = "bestell_id")]
    pub order_id: i64,
    #[serde(rename = "typ")]
    pub kind: String,
    pub value: String,
}

/// The full aggregate: header plus owned child collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAggregate {
    #[serde(rename = "bestellung")]
    pub header: Order,
    #[serde(rename = "positionen")]
    pub line_items: Vec<LineItem>,
    #[serde(rename = "zusatz")]
    pub extras: Vec<ExtraAttribute>,
}

// -- Client input shapes --

/// Incoming order as posted by the storefront.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewOrder {
    #[serde(rename = "mol_kunde_id", default)]
    pub customer_ref: Option<i64>,
    #[serde(rename = "rechnungsadresse_id", default)]
    pub billing_address_ref: Option<i64>,
    #[serde(rename = "mol_zahlart_id", default)]
    pub payment_method_ref: Option<i64>,
    #[serde(rename = "bestelldatum", default)]
    pub order_date: Option<String>,
    #[serde(rename = "bestellreferenz", default)]
    pub order_reference: Option<String>,
    #[serde(rename = "seite", default)]
    pub storefront_page: Option<String>,
    #[serde(rename = "bestellfreigabe", default)]
    pub release_flag: Option<i32>,
    #[serde(rename = "mol_verkaufskanal_id", default)]
    pub sales_channel_ref: Option<i64>,
    #[serde(rename = "versand_einstellung_id", default)]
    pub shipping_config_ref: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "rechnungsdatei", default)]
    pub invoice_file: Option<String>,
    #[serde(rename = "lieferadresse", default)]
    pub delivery_address: DeliveryAddress,
    #[serde(rename = "auftrag_position", default)]
    pub line_items: Vec<NewLineItem>,
    #[serde(rename = "auftrag_zusatz", default)]
    pub extras: Vec<NewExtra>,
}

/// Incoming line item. Numeric fields coerce leniently so one malformed
/// quantity or price never aborts the surrounding order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLineItem {
    #[serde(default)]
    pub ean: String,
    #[serde(rename = "pos_bezeichnung", default)]
    pub description: String,
    #[serde(rename = "menge", default, deserialize_with = "coerce::lenient_i32")]
    pub quantity: i32,
    #[serde(rename = "ek_netto", default, deserialize_with = "coerce::lenient_f64")]
    pub net_cost: f64,
    #[serde(rename = "vk_brutto", default, deserialize_with = "coerce::lenient_f64")]
    pub gross_price: f64,
    #[serde(rename = "pos_referenz", default)]
    pub reference: Option<String>,
}

/// Incoming extra attribute.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewExtra {
    #[serde(rename = "typ", default)]
    pub kind: String,
    #[serde(default)]
    pub value: String,
}
