//! Normalization of MOVEMENT responses into stock/price data.

use domain::coerce;
use serde::Serialize;
use serde_json::Value;

/// Stock and price data extracted from a MOVEMENT response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Availability {
    #[serde(rename = "bestand")]
    pub stock: i64,
    #[serde(rename = "preis")]
    pub price: f64,
    #[serde(rename = "erfuellungsrate")]
    pub fulfillment_rate: String,
    #[serde(rename = "handling_zeit")]
    pub handling_days: String,
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Builds an [`Availability`] from an unwrapped MOVEMENT envelope.
///
/// The endpoint sometimes wraps the record in a one-element array; that
/// case is unwrapped here, and an empty array counts as "no data".
pub fn parse_availability(envelope: &Value) -> Option<Availability> {
    let record = match envelope {
        Value::Array(items) => items.first()?,
        other => other,
    };
    let obj = record.as_object()?;
    if obj.is_empty() {
        return None;
    }

    Some(Availability {
        stock: coerce::to_i64(obj.get("Bestand").unwrap_or(&Value::Null)),
        price: coerce::to_f64(obj.get("Preis").unwrap_or(&Value::Null)),
        fulfillment_rate: obj
            .get("Erfuellungsrate")
            .map(value_to_string)
            .unwrap_or_default(),
        handling_days: obj
            .get("Handling_Zeit_in_Werktagen")
            .map(value_to_string)
            .unwrap_or_default(),
    })
}
