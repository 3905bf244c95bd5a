//! Normalization of CONTENT responses into the local product shape.

use domain::coerce;
use serde::Serialize;
use serde_json::{Map, Value};

/// Descriptive product data extracted from a CONTENT response.
///
/// Every attribute is always present; missing upstream fields become empty
/// strings (or zero for the numeric ones). Serialized field names match the
/// storefront's product JSON so the data can overlay a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductContent {
    pub id: i64,
    pub name: String,
    #[serde(rename = "autor")]
    pub author: String,
    #[serde(rename = "preis")]
    pub price: f64,
    pub isbn: String,
    #[serde(rename = "seiten")]
    pub pages: String,
    pub format: String,
    #[serde(rename = "sprache")]
    pub language: String,
    #[serde(rename = "verlag")]
    pub publisher: String,
    #[serde(rename = "erscheinungsjahr")]
    pub publication_year: String,
    #[serde(rename = "erscheinungsdatum")]
    pub publication_date: String,
    #[serde(rename = "alter_von")]
    pub age_from: String,
    #[serde(rename = "alter_bis")]
    pub age_to: String,
    #[serde(rename = "lesealter")]
    pub reading_age: String,
    #[serde(rename = "gewicht")]
    pub weight: String,
    #[serde(rename = "laenge")]
    pub length: String,
    #[serde(rename = "breite")]
    pub width: String,
    #[serde(rename = "hoehe")]
    pub height: String,
    /// The raw attribute map, for fields the fixed set does not cover.
    pub extra: Map<String, Value>,
}

/// Unwraps the `response` envelope common to all wholesaler endpoints.
/// Missing key, null, or an empty object/array all count as "no data".
pub(crate) fn unwrap_envelope(body: &Value) -> Option<&Value> {
    let response = body.get("response")?;
    match response {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        Value::Array(items) if items.is_empty() => None,
        _ => Some(response),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Reads the `Wert` sub-key of one named article attribute, defaulting to
/// an empty string.
fn attr(attrs: &Map<String, Value>, key: &str) -> String {
    attrs
        .get(key)
        .and_then(|entry| entry.get("Wert"))
        .map(value_to_string)
        .unwrap_or_default()
}

/// Builds a [`ProductContent`] from an unwrapped CONTENT envelope.
///
/// Returns `None` when the envelope is not a non-empty object; otherwise
/// every declared field is populated, defaults included.
pub fn parse_content(envelope: &Value) -> Option<ProductContent> {
    let obj = envelope.as_object()?;
    if obj.is_empty() {
        return None;
    }

    let attrs = obj
        .get("Artikelattribute")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    Some(ProductContent {
        id: coerce::to_i64(obj.get("pim_artikel_id").unwrap_or(&Value::Null)),
        name: obj
            .get("bezeichnung")
            .map(value_to_string)
            .unwrap_or_default(),
        author: attr(&attrs, "Autor"),
        price: coerce::to_f64(obj.get("vk_brutto").unwrap_or(&Value::Null)),
        isbn: attr(&attrs, "ISBN_13"),
        pages: attr(&attrs, "Seiten"),
        format: attr(&attrs, "Buchtyp"),
        language: attr(&attrs, "Sprache"),
        publisher: attr(&attrs, "Verlag"),
        publication_year: attr(&attrs, "Erscheinungsjahr"),
        publication_date: attr(&attrs, "Erscheinungsdatum"),
        age_from: attr(&attrs, "Altersempfehlung_von"),
        age_to: attr(&attrs, "Altersempfehlung_bis"),
        reading_age: attr(&attrs, "Lesealter"),
        weight: attr(&attrs, "Gewicht"),
        length: attr(&attrs, "Laenge"),
        width: attr(&attrs, "Breite"),
        height: attr(&attrs, "Hoehe"),
        extra: attrs,
    })
}
