//! The order aggregate: an order root with its delivery, payment, and items.
//!
//! The same JSON shape is used on the message stream, in the cache, and in
//! HTTP responses. Field names follow the upstream producer:
//!
//! ```json
//! {
//!   "order_uid": "b563feb7b2b84b6test",
//!   "track_number": "WBILMTESTTRACK",
//!   "entry": "WBIL",
//!   "delivery": { "name": "Test Testov", "phone": "+9720000000", "zip": "2639809",
//!                 "city": "Kiryat Mozkin", "address": "Ploshad Mira 15",
//!                 "region": "Kraiot", "email": "test@gmail.com" },
//!   "payment": { "transaction": "b563feb7b2b84b6test", "request_id": "",
//!                "currency": "USD", "provider": "wbpay", "amount": 1817,
//!                "payment_dt": 1637907727, "bank": "alpha", "delivery_cost": 1500,
//!                "goods_total": 317, "custom_fee": 0 },
//!   "items": [ { "chrt_id": 9934930, "track_number": "WBILMTESTTRACK", "price": 453,
//!                "rid": "ab4219087a764ae0btest", "name": "Mascaras", "sale": 30,
//!                "size": "0", "total_price": 317, "nm_id": 2389212,
//!                "brand": "Vivienne Sabo", "status": 202 } ],
//!   "locale": "en",
//!   "internal_signature": "",
//!   "customer_id": "test",
//!   "delivery_service": "meest",
//!   "shardkey": "9",
//!   "sm_id": 99,
//!   "date_created": "2021-11-26T06:22:19Z",
//!   "oof_shard": "1"
//! }
//! ```
//!
//! Monetary values are exact decimals; they decode from JSON numbers or
//! numeric strings and encode as JSON numbers carrying every digit, so no
//! amount passes through `f64`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::OrderUid;
use super::validation::ValidationError;

/// Errors that can occur when turning a raw payload into an [`Order`].
#[derive(thiserror::Error, Debug)]
pub enum PayloadError {
    /// The payload is not a JSON document of the order shape.
    #[error("malformed order payload: {0}")]
    Decode(#[from] serde_json::Error),
    /// The payload decoded but violates an aggregate invariant.
    #[error("invalid order: {0}")]
    Invalid(#[from] ValidationError),
}

/// Order aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier, primary key of the aggregate.
    #[serde(default)]
    pub order_uid: OrderUid,
    /// Shipment tracking number.
    #[serde(default)]
    pub track_number: String,
    /// Entry channel code (e.g. `WBIL`).
    #[serde(default)]
    pub entry: String,
    /// Recipient details.
    #[serde(default)]
    pub delivery: Delivery,
    /// Payment details.
    #[serde(default)]
    pub payment: Payment,
    /// Line items.
    #[serde(default)]
    pub items: Vec<Item>,
    /// Customer locale.
    #[serde(default)]
    pub locale: String,
    /// Internal signature.
    #[serde(default)]
    pub internal_signature: String,
    /// Customer identifier.
    #[serde(default)]
    pub customer_id: String,
    /// Delivery service name.
    #[serde(default)]
    pub delivery_service: String,
    /// Shard key.
    #[serde(default)]
    pub shardkey: String,
    /// Shipment method id.
    #[serde(default)]
    pub sm_id: i32,
    /// Creation time. A payload without one decodes as the Unix epoch, so a
    /// redelivered message always yields the same value.
    #[serde(default, with = "crate::types::timestamp")]
    pub date_created: DateTime<Utc>,
    /// Out-of-shard code.
    #[serde(default)]
    pub oof_shard: String,
}

/// Delivery recipient, 1:1 with its order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

/// Payment record, 1:1 with its order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    /// Transaction id. Usually equal to the order uid but stored separately.
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    /// Payment time in Unix seconds.
    pub payment_dt: i64,
    pub bank: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub delivery_cost: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub goods_total: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub custom_fee: Decimal,
}

/// A single line item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    /// Catalog id, non-zero for a valid item.
    pub chrt_id: i64,
    pub track_number: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
    /// Row id.
    pub rid: String,
    pub name: String,
    /// Sale percentage.
    pub sale: i32,
    pub size: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_price: Decimal,
    /// Numeric model id.
    pub nm_id: i64,
    pub brand: String,
    pub status: i32,
}

impl Order {
    /// Decode an order from a JSON payload without validating it.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the bytes are not an order document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Decode and validate an order from a raw stream payload.
    ///
    /// Decoding happens first, so a malformed payload is always reported as
    /// [`PayloadError::Decode`] regardless of its content.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Decode`] for malformed JSON and
    /// [`PayloadError::Invalid`] when an invariant is violated.
    pub fn parse_payload(bytes: &[u8]) -> Result<Self, PayloadError> {
        let order = Self::from_json(bytes)?;
        order.validate()?;
        Ok(order)
    }

    /// Encode the order as JSON.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
