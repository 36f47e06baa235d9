pub mod fields;
pub mod product;

use serde_json::{Map, Value};
use tracing::warn;

use crate::models::ParsedSubmission;
use crate::utils::error::AppError;
use fields::{extract_fields, first_non_empty, FORM_ID_KEYS, PRODUCT_KEYS};
use product::parse_product;

/// The two webhook envelope shapes the form provider delivers. Everything
/// else is treated as flat and left to the extractor's fallbacks.
#[derive(Debug)]
enum Envelope {
    /// Field data nested as a JSON-encoded string under `rawRequest`.
    Nested(Map<String, Value>),
    /// Field data inline at the top level.
    Flat(Map<String, Value>),
}

fn classify(payload: &Map<String, Value>) -> Envelope {
    if let Some(Value::String(raw)) = payload.get("rawRequest") {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(inner)) => return Envelope::Nested(inner),
            Ok(_) => {
                warn!("rawRequest decoded to a non-object, treating payload as flat");
            }
            Err(err) => {
                warn!(error = %err, "rawRequest is not valid JSON, treating payload as flat");
            }
        }
    }
    Envelope::Flat(payload.clone())
}

/// Normalize an arbitrary webhook payload into one canonical submission.
///
/// Total over any JSON object: template differences, garbled sub-JSON and
/// missing optional fields all degrade rather than fail. The only rejected
/// input is a payload that is not a key-value mapping at all. Required
/// fields may come back empty; the caller validates them.
pub fn normalize(payload: &Value) -> Result<ParsedSubmission, AppError> {
    let Value::Object(outer) = payload else {
        return Err(AppError::ValidationError(
            "Webhook payload must be a JSON object".to_string(),
        ));
    };

    // The outer envelope's form identifier wins over anything nested.
    let outer_form_id = first_non_empty(outer, FORM_ID_KEYS);

    let mapping = match classify(outer) {
        Envelope::Nested(inner) => inner,
        Envelope::Flat(flat) => flat,
    };

    let extracted = extract_fields(&mapping);
    let product = parse_product(probe(&mapping, PRODUCT_KEYS));

    let form_id = if outer_form_id.is_empty() {
        extracted.form_id
    } else {
        outer_form_id
    };

    Ok(ParsedSubmission {
        email: extracted.email,
        name: extracted.name,
        invoice_no: extracted.invoice_no,
        form_id,
        phone: extracted.phone,
        church: extracted.church,
        youth_ministry: extracted.youth_ministry,
        event_name: extracted.event_name,
        event_date: extracted.event_date,
        quantity: product.quantity,
        product_details: product.product_details,
        total_amount: product.total_amount,
    })
}

fn probe<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| fields.get(*key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    fn stadium_fields() -> Value {
        json!({
            "q3_name3": { "first": "Jane", "last": "Doe" },
            "q4_email4": "jane@example.org",
            "q5_phoneNumber5": { "full": "+61 400 111 222" },
            "q6_church6": "Hillcrest",
            "q7_youthMinistry7": "Ignite",
            "q10_invoiceId10": "# INV-2041",
            "q11_myProducts11": "General Admission (Amount: 5.00 AUD, Quantity: 15)",
        })
    }

    #[test]
    fn nested_and_flat_envelopes_normalize_identically() {
        let fields = stadium_fields();

        let mut flat = fields.as_object().unwrap().clone();
        flat.insert("formID".to_string(), json!("230451"));
        let flat_parsed = normalize(&Value::Object(flat)).unwrap();

        let nested = json!({
            "formID": "230451",
            "rawRequest": serde_json::to_string(&fields).unwrap(),
        });
        let nested_parsed = normalize(&nested).unwrap();

        assert_eq!(flat_parsed, nested_parsed);
        assert_eq!(nested_parsed.email, "jane@example.org");
        assert_eq!(nested_parsed.name, "Jane Doe");
        assert_eq!(nested_parsed.invoice_no, "2041");
        assert_eq!(nested_parsed.form_id, "230451");
        assert_eq!(nested_parsed.quantity, 15);
        assert_eq!(nested_parsed.total_amount, Decimal::from_str("75.00").unwrap());
    }

    #[test]
    fn outer_form_id_overrides_nested_value() {
        let inner = json!({ "email": "jane@example.org", "formId": "999999" });
        let payload = json!({
            "formID": "230451",
            "rawRequest": serde_json::to_string(&inner).unwrap(),
        });
        assert_eq!(normalize(&payload).unwrap().form_id, "230451");
    }

    #[test]
    fn form_id_aliases_resolve_in_order() {
        let parsed = normalize(&json!({ "form_id": "111", "formId": "222" })).unwrap();
        assert_eq!(parsed.form_id, "111");
    }

    #[test]
    fn invalid_raw_request_falls_back_to_flat_fields() {
        let payload = json!({
            "formID": "230451",
            "rawRequest": "{definitely not json",
            "email": "fallback@example.org",
        });
        let parsed = normalize(&payload).unwrap();
        assert_eq!(parsed.email, "fallback@example.org");
        assert_eq!(parsed.form_id, "230451");
    }

    #[test]
    fn non_object_payloads_are_rejected() {
        for payload in [json!("text"), json!(17), json!(["a"]), json!(null)] {
            assert!(matches!(
                normalize(&payload),
                Err(AppError::ValidationError(_))
            ));
        }
    }

    #[test]
    fn empty_object_normalizes_with_empty_required_fields() {
        let parsed = normalize(&json!({})).unwrap();
        assert_eq!(parsed.email, "");
        assert_eq!(parsed.form_id, "");
        assert!(parsed.invoice_no.starts_with("INV-"));
        assert_eq!(parsed.quantity, 1);
    }

    #[test]
    fn hall_template_aliases_are_recognized() {
        let parsed = normalize(&json!({
            "q4_name": "Sam Park",
            "q5_email": "sam@example.org",
            "q11_invoiceId": "INV-88",
            "q12_myProducts": { "1": "{\"name\":\"Day Pass\",\"quantity\":2,\"price\":7.00}" },
        }))
        .unwrap();
        assert_eq!(parsed.name, "Sam Park");
        assert_eq!(parsed.email, "sam@example.org");
        assert_eq!(parsed.invoice_no, "88");
        assert_eq!(parsed.quantity, 2);
        assert_eq!(parsed.product_details, "Day Pass (Quantity: 2)");
        assert_eq!(parsed.total_amount, Decimal::from_str("14.00").unwrap());
    }
}
