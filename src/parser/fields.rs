use chrono::Utc;
use serde_json::{Map, Value};

/// Flat field set extracted from one submission mapping, before product
/// parsing and envelope metadata are merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalFields {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub church: String,
    pub youth_ministry: String,
    pub event_name: String,
    pub event_date: String,
    pub invoice_no: String,
    pub form_id: String,
}

/// Ordered alias tables, one per canonical field. The first two entries of
/// each table follow the two known form templates ("stadium" registration
/// forms use suffix-numbered keys, "hall" forms plain numbered keys); the
/// rest are generic fallbacks. First present, non-empty value wins.
const EMAIL_KEYS: &[&str] = &["q4_email4", "q5_email", "q4_email", "email"];
const NAME_KEYS: &[&str] = &["q3_name3", "q4_name", "q3_name", "name", "fullName"];
const PHONE_KEYS: &[&str] = &["q5_phoneNumber5", "q6_phoneNumber", "phoneNumber", "phone"];
const CHURCH_KEYS: &[&str] = &["q6_church6", "q7_church", "church", "churchName"];
const YOUTH_MINISTRY_KEYS: &[&str] = &[
    "q7_youthMinistry7",
    "q8_youthMinistry",
    "youthMinistry",
    "youth_ministry",
];
const EVENT_NAME_KEYS: &[&str] = &["q8_eventName8", "q9_eventName", "eventName", "event_name"];
const EVENT_DATE_KEYS: &[&str] = &["q9_eventDate9", "q10_eventDate", "eventDate", "event_date"];
const INVOICE_KEYS: &[&str] = &[
    "q10_invoiceId10",
    "q11_invoiceId",
    "invoiceId",
    "invoice_no",
    "invoiceNumber",
];
pub const FORM_ID_KEYS: &[&str] = &["formID", "form_id", "formId"];
pub const PRODUCT_KEYS: &[&str] = &["q11_myProducts11", "q12_myProducts", "myProducts", "products"];

/// Probe the alias table in order and return the first present,
/// non-empty value, flattened to a plain string.
pub fn first_non_empty(fields: &Map<String, Value>, keys: &[&str]) -> String {
    for key in keys {
        if let Some(value) = fields.get(*key) {
            let flat = flatten(value);
            if !flat.is_empty() {
                return flat;
            }
        }
    }
    String::new()
}

/// Flatten a field value to a display string. Name and phone controls may
/// deliver structured objects instead of plain text: `{first, last}` pairs
/// are joined, and a `full` property is preferred whenever present.
fn flatten(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(obj) => {
            if let Some(full) = obj.get("full") {
                let flat = flatten(full);
                if !flat.is_empty() {
                    return flat;
                }
            }
            let first = obj.get("first").map(flatten).unwrap_or_default();
            let last = obj.get("last").map(flatten).unwrap_or_default();
            format!("{} {}", first, last).trim().to_string()
        }
        _ => String::new(),
    }
}

/// Strip at most one known textual prefix from an invoice value.
/// `"# INV-123"`, `"# 123"` and `"INV-123"` all reduce to `"123"`;
/// already-bare values pass through unchanged.
pub fn strip_invoice_prefix(raw: &str) -> &str {
    for prefix in ["# INV-", "# ", "INV-"] {
        if let Some(rest) = raw.strip_prefix(prefix) {
            return rest;
        }
    }
    raw
}

/// Extract the canonical fields from one flat submission mapping.
///
/// A missing invoice number falls back to a timestamp-derived placeholder
/// so downstream idempotency still has a key. Missing email or form id
/// come back as empty strings; validating them is the caller's job.
pub fn extract_fields(fields: &Map<String, Value>) -> CanonicalFields {
    let raw_invoice = first_non_empty(fields, INVOICE_KEYS);
    let invoice_no = if raw_invoice.is_empty() {
        format!("INV-{}", Utc::now().timestamp_millis())
    } else {
        strip_invoice_prefix(&raw_invoice).to_string()
    };

    CanonicalFields {
        email: first_non_empty(fields, EMAIL_KEYS),
        name: first_non_empty(fields, NAME_KEYS),
        phone: first_non_empty(fields, PHONE_KEYS),
        church: first_non_empty(fields, CHURCH_KEYS),
        youth_ministry: first_non_empty(fields, YOUTH_MINISTRY_KEYS),
        event_name: first_non_empty(fields, EVENT_NAME_KEYS),
        event_date: first_non_empty(fields, EVENT_DATE_KEYS),
        invoice_no,
        form_id: first_non_empty(fields, FORM_ID_KEYS),
    }
}
