//! Order export: mapping a stored aggregate into the ORDER payload shape.

use domain::OrderAggregate;
use serde::Serialize;
use uuid::Uuid;

/// Extra type the wholesaler requires on every submission.
pub const COLLECTKEY_TYPE: &str = "collectkey";

/// The complete ORDER submission payload.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSubmission {
    pub username: String,
    pub passwort: String,
    pub auftrag_kopf: OrderHead,
    pub lieferadresse: DeliveryAddressPayload,
    pub auftrag_position: Vec<PositionPayload>,
    pub auftrag_zusatz: Vec<ExtraPayload>,
}

/// Order header sub-object, copied verbatim from the stored header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderHead {
    pub mol_kunde_id: Option<i64>,
    pub rechnungsadresse_id: Option<i64>,
    pub mol_zahlart_id: Option<i64>,
    pub bestelldatum: Option<String>,
    pub bestellreferenz: Option<String>,
    pub seite: Option<String>,
    pub bestellfreigabe: Option<i32>,
    pub mol_verkaufskanal_id: Option<i64>,
}

/// Delivery address sub-object. The ORDER endpoint takes the ISO country
/// code only, not the free-text country name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryAddressPayload {
    pub anrede: String,
    pub vorname: String,
    pub nachname: String,
    pub zusatz: String,
    pub strasse: String,
    pub hausnummer: String,
    pub adresszeile_1: String,
    pub adresszeile_2: String,
    pub adresszeile_3: String,
    pub plz: String,
    pub ort: String,
    pub land_iso: String,
    pub tel: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionPayload {
    pub ean: String,
    pub pos_bezeichnung: String,
    pub menge: i32,
    pub ek_netto: f64,
    pub vk_brutto: f64,
    pub pos_referenz: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtraPayload {
    pub typ: String,
    pub value: String,
}

/// Builds the ORDER payload from a stored aggregate.
///
/// Header and address fields are copied verbatim. Each position gets the
/// stored reference, or the `{order_id}-{item_id}` fallback when empty. The
/// extras always start with a freshly generated collectkey, so re-exporting
/// the same order yields a new correlation identifier every time.
pub fn build_payload(
    aggregate: &OrderAggregate,
    username: &str,
    password: &str,
) -> OrderSubmission {
    let header = &aggregate.header;
    let addr = &header.delivery_address;

    let mut auftrag_zusatz = vec![ExtraPayload {
        typ: COLLECTKEY_TYPE.to_string(),
        value: Uuid::new_v4().to_string(),
    }];
    auftrag_zusatz.extend(aggregate.extras.iter().map(|extra| ExtraPayload {
        typ: extra.kind.clone(),
        value: extra.value.clone(),
    }));

    OrderSubmission {
        username: username.to_string(),
        passwort: password.to_string(),
        auftrag_kopf: OrderHead {
            mol_kunde_id: header.customer_ref,
            rechnungsadresse_id: header.billing_address_ref,
            mol_zahlart_id: header.payment_method_ref,
            bestelldatum: header.order_date.clone(),
            bestellreferenz: header.order_reference.clone(),
            seite: header.storefront_page.clone(),
            bestellfreigabe: header.release_flag,
            mol_verkaufskanal_id: header.sales_channel_ref,
        },
        lieferadresse: DeliveryAddressPayload {
            anrede: addr.salutation.clone(),
            vorname: addr.first_name.clone(),
            nachname: addr.last_name.clone(),
            zusatz: addr.addition.clone(),
            strasse: addr.street.clone(),
            hausnummer: addr.house_number.clone(),
            adresszeile_1: addr.line_1.clone(),
            adresszeile_2: addr.line_2.clone(),
            adresszeile_3: addr.line_3.clone(),
            plz: addr.postal_code.clone(),
            ort: addr.city.clone(),
            land_iso: addr.country_iso.clone(),
            tel: addr.phone.clone(),
        },
        auftrag_position: aggregate
            .line_items
            .iter()
            .map(|item| PositionPayload {
                ean: item.ean.clone(),
                pos_bezeichnung: item.description.clone(),
                menge: item.quantity,
                ek_netto: item.net_cost,
                vk_brutto: item.gross_price,
                pos_referenz: item.export_reference(),
            })
            .collect(),
        auftrag_zusatz,
    }
}

impl OrderSubmission {
    /// Returns the collectkey generated for this payload.
    pub fn collectkey(&self) -> Option<&str> {
        self.auftrag_zusatz
            .iter()
            .find(|e| e.typ == COLLECTKEY_TYPE)
            .map(|e| e.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{DeliveryAddress, ExtraAttribute, LineItem, Order, OrderStatus};

    fn sample_aggregate() -> OrderAggregate {
        OrderAggregate {
            header: Order {
                id: 12,
                customer_ref: Some(4711),
                billing_address_ref: Some(8),
                payment_method_ref: Some(2),
                order_date: Some("2026-08-20".into()),
                order_reference: Some("WEB-1001".into()),
                storefront_page: Some("kinderbuchladen".into()),
                release_flag: Some(1),
                sales_channel_ref: Some(3),
                shipping_config_ref: None,
                email: Some("kunde@example.org".into()),
                delivery_address: DeliveryAddress {
                    salutation: "Frau".into(),
                    first_name: "Erika".into(),
                    last_name: "Muster".into(),
                    street: "Lindenweg".into(),
                    house_number: "5".into(),
                    postal_code: "10115".into(),
                    city: "Berlin".into(),
                    country: "Deutschland".into(),
                    country_iso: "DE".into(),
                    ..DeliveryAddress::default()
                },
                status: OrderStatus::New,
                tracking_number: None,
                carrier: None,
                shipped_at: None,
                submission_status: None,
            },
            line_items: vec![
                LineItem {
                    id: 31,
                    order_id: 12,
                    ean: "9783314104704".into(),
                    description: "Jacominus".into(),
                    quantity: 2,
                    net_cost: 8.4,
                    gross_price: 14.0,
                    reference: None,
                },
                LineItem {
                    id: 32,
                    order_id: 12,
                    ean: "9783000000001".into(),
                    description: "Monster".into(),
                    quantity: 1,
                    net_cost: 5.0,
                    gross_price: 12.5,
                    reference: Some("KUNDEN-REF".into()),
                },
            ],
            extras: vec![ExtraAttribute {
                id: 9,
                order_id: 12,
                kind: "geschenk".into(),
                value: "ja".into(),
            }],
        }
    }

    #[test]
    fn test_header_and_address_copied_verbatim() {
        let payload = build_payload(&sample_aggregate(), "shop", "geheim");

        assert_eq!(payload.username, "shop");
        assert_eq!(payload.passwort, "geheim");
        assert_eq!(payload.auftrag_kopf.mol_kunde_id, Some(4711));
        assert_eq!(payload.auftrag_kopf.bestelldatum.as_deref(), Some("2026-08-20"));
        assert_eq!(payload.lieferadresse.ort, "Berlin");
        assert_eq!(payload.lieferadresse.land_iso, "DE");
    }

    #[test]
    fn test_position_reference_fallback() {
        let payload = build_payload(&sample_aggregate(), "shop", "geheim");

        assert_eq!(payload.auftrag_position.len(), 2);
        assert_eq!(payload.auftrag_position[0].pos_referenz, "12-31");
        assert_eq!(payload.auftrag_position[1].pos_referenz, "KUNDEN-REF");
        assert_eq!(payload.auftrag_position[0].menge, 2);
        assert_eq!(payload.auftrag_position[0].ek_netto, 8.4);
        assert_eq!(payload.auftrag_position[0].vk_brutto, 14.0);
    }

    #[test]
    fn test_collectkey_is_fresh_per_build() {
        let aggregate = sample_aggregate();
        let first = build_payload(&aggregate, "shop", "geheim");
        let second = build_payload(&aggregate, "shop", "geheim");

        let key_a = first.collectkey().unwrap().to_string();
        let key_b = second.collectkey().unwrap().to_string();
        assert_ne!(key_a, key_b);

        // Everything except the collectkey is deterministic.
        assert_eq!(first.auftrag_kopf, second.auftrag_kopf);
        assert_eq!(first.lieferadresse, second.lieferadresse);
        assert_eq!(first.auftrag_position, second.auftrag_position);
    }

    #[test]
    fn test_stored_extras_follow_the_collectkey() {
        let payload = build_payload(&sample_aggregate(), "shop", "geheim");
        assert_eq!(payload.auftrag_zusatz.len(), 2);
        assert_eq!(payload.auftrag_zusatz[0].typ, COLLECTKEY_TYPE);
        assert_eq!(payload.auftrag_zusatz[1].typ, "geschenk");
        assert_eq!(payload.auftrag_zusatz[1].value, "ja");
    }

    #[test]
    fn test_wire_shape() {
        let payload = build_payload(&sample_aggregate(), "shop", "geheim");
        let value = serde_json::to_value(&payload).unwrap();

        assert!(value.get("username").is_some());
        assert!(value.get("passwort").is_some());
        assert!(value.get("auftrag_kopf").is_some());
        assert!(value.get("lieferadresse").is_some());
        assert_eq!(value["auftrag_position"][0]["pos_bezeichnung"], "Jacominus");
        assert_eq!(value["auftrag_zusatz"][0]["typ"], "collectkey");
        // The ORDER endpoint takes land_iso only.
        assert!(value["lieferadresse"].get("land").is_none());
    }
}
