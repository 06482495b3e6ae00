//! Sample aggregates for tests in this and downstream crates.
//!
//! Enabled with the `testing` feature.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use crate::types::{Delivery, Item, Order, OrderUid, Payment};

/// A fully populated, valid order with one item.
#[must_use]
pub fn sample_order(uid: &str) -> Order {
    Order {
        order_uid: OrderUid::new(uid),
        track_number: "WBILMTESTTRACK".to_owned(),
        entry: "WBIL".to_owned(),
        delivery: Delivery {
            name: "Test Testov".to_owned(),
            phone: "+9720000000".to_owned(),
            zip: "2639809".to_owned(),
            city: "Kiryat Mozkin".to_owned(),
            address: "Ploshad Mira 15".to_owned(),
            region: "Kraiot".to_owned(),
            email: "test@gmail.com".to_owned(),
        },
        payment: Payment {
            transaction: uid.to_owned(),
            request_id: String::new(),
            currency: "USD".to_owned(),
            provider: "wbpay".to_owned(),
            amount: Decimal::new(1817, 0),
            payment_dt: 1_637_907_727,
            bank: "alpha".to_owned(),
            delivery_cost: Decimal::new(1500, 0),
            goods_total: Decimal::new(317, 0),
            custom_fee: Decimal::ZERO,
        },
        items: vec![Item {
            chrt_id: 9_934_930,
            track_number: "WBILMTESTTRACK".to_owned(),
            price: Decimal::new(4535, 1),
            rid: "ab4219087a764ae0btest".to_owned(),
            name: "Mascaras".to_owned(),
            sale: 30,
            size: "0".to_owned(),
            total_price: Decimal::new(317, 0),
            nm_id: 2_389_212,
            brand: "Vivienne Sabo".to_owned(),
            status: 202,
        }],
        locale: "en".to_owned(),
        internal_signature: String::new(),
        customer_id: "test".to_owned(),
        delivery_service: "meest".to_owned(),
        shardkey: "9".to_owned(),
        sm_id: 99,
        date_created: Utc
            .with_ymd_and_hms(2021, 11, 26, 6, 22, 19)
            .single()
            .unwrap_or_default(),
        oof_shard: "1".to_owned(),
    }
}

/// A sample order created `offset_secs` after the base sample's timestamp.
///
/// Useful for checking newest-first ordering.
#[must_use]
pub fn sample_order_at(uid: &str, offset_secs: i64) -> Order {
    let mut order = sample_order(uid);
    order.date_created += chrono::Duration::seconds(offset_secs);
    order
}
