use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

static QUANTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Quantity:\s*(\d+)").expect("quantity pattern is valid"));
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Amount:\s*([\d.]+)").expect("amount pattern is valid"));

/// What a "products purchased" field boils down to.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInfo {
    pub quantity: i32,
    pub product_details: String,
    pub total_amount: Decimal,
}

impl Default for ProductInfo {
    fn default() -> Self {
        Self {
            quantity: 1,
            product_details: String::new(),
            total_amount: Decimal::ZERO,
        }
    }
}

/// Why a product field could not be interpreted. Absorbed into defaults at
/// the parse boundary; never propagated past it.
#[derive(Debug, Error)]
pub enum MalformedProduct {
    #[error("embedded product JSON is invalid: {0}")]
    BadJson(#[source] serde_json::Error),
    #[error("product field has an unrecognized shape")]
    UnsupportedShape,
}

/// Parse a "products purchased" field into quantity, description and total.
///
/// Product-detail ambiguity must never fail the whole submission: an absent
/// or unparseable field degrades to `{quantity: 1, details: "", total: 0}`
/// with only a logged warning.
pub fn parse_product(field: Option<&Value>) -> ProductInfo {
    let Some(value) = field else {
        return ProductInfo::default();
    };
    match try_parse(value) {
        Ok(info) => info,
        Err(err) => {
            warn!(error = %err, "unparseable product field, using defaults");
            ProductInfo::default()
        }
    }
}

fn try_parse(value: &Value) -> Result<ProductInfo, MalformedProduct> {
    match value {
        Value::Object(obj) if obj.contains_key("paymentArray") => {
            parse_payment_array(obj.get("paymentArray").unwrap_or(&Value::Null))
        }
        Value::Object(obj) if obj.contains_key("1") => {
            parse_line_item(obj.get("1").unwrap_or(&Value::Null))
        }
        Value::String(text) => Ok(parse_summary_line(text)),
        _ => Err(MalformedProduct::UnsupportedShape),
    }
}

/// Payment-processor shape: a JSON-encoded string with a `product` array of
/// human-readable lines and a `total`.
fn parse_payment_array(raw: &Value) -> Result<ProductInfo, MalformedProduct> {
    let Value::String(encoded) = raw else {
        return Err(MalformedProduct::UnsupportedShape);
    };
    let payment: Value = serde_json::from_str(encoded).map_err(MalformedProduct::BadJson)?;

    let mut info = ProductInfo::default();
    if let Some(line) = payment
        .get("product")
        .and_then(Value::as_array)
        .and_then(|products| products.first())
        .and_then(Value::as_str)
    {
        info.quantity = captured_quantity(line);
        info.product_details = line.to_string();
    }
    if let Some(total) = payment.get("total") {
        info.total_amount = decimal_value(total).unwrap_or(Decimal::ZERO);
    }
    Ok(info)
}

/// Line-item shape: a numeric-string key holding JSON text describing
/// `{name, quantity, price}`.
fn parse_line_item(raw: &Value) -> Result<ProductInfo, MalformedProduct> {
    let Value::String(encoded) = raw else {
        return Err(MalformedProduct::UnsupportedShape);
    };
    let item: Value = serde_json::from_str(encoded).map_err(MalformedProduct::BadJson)?;

    let name = item.get("name").and_then(Value::as_str).unwrap_or_default();
    let quantity = item
        .get("quantity")
        .and_then(integer_value)
        .unwrap_or(1)
        .max(1);
    let price = item
        .get("price")
        .and_then(decimal_value)
        .unwrap_or(Decimal::ZERO);

    Ok(ProductInfo {
        quantity,
        product_details: format!("{} (Quantity: {})", name, quantity),
        total_amount: price * Decimal::from(quantity),
    })
}

/// Human-readable shape, e.g.
/// `"General Admission (Amount: 5.00 AUD, Quantity: 15)"` — the amount is a
/// unit price, so the total multiplies it out.
fn parse_summary_line(text: &str) -> ProductInfo {
    let quantity = captured_quantity(text);
    let unit_price = AMOUNT_RE
        .captures(text)
        .and_then(|caps| Decimal::from_str(&caps[1]).ok())
        .unwrap_or(Decimal::ZERO);

    ProductInfo {
        quantity,
        product_details: text.to_string(),
        total_amount: unit_price * Decimal::from(quantity),
    }
}

fn captured_quantity(text: &str) -> i32 {
    QUANTITY_RE
        .captures(text)
        .and_then(|caps| caps[1].parse::<i32>().ok())
        .unwrap_or(1)
        .max(1)
}

/// Providers deliver numbers both as JSON numbers and as quoted strings.
fn decimal_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn integer_value(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}
