//! Synthetic order producer.
//!
//! # Usage
//!
//! ```bash
//! # Publish 10 orders, one every 500ms
//! orderflow-cli produce --count 10 --interval-ms 500
//! ```
//!
//! # Environment Variables
//!
//! - `KAFKA_BROKERS` - Comma-separated bootstrap servers
//! - `KAFKA_TOPIC` - Destination topic

use std::time::Duration;

use chrono::{SubsecRound, Utc};
use orderflow_core::types::timestamp::PRECISION_DIGITS;
use orderflow_core::{Delivery, Item, Order, OrderUid, Payment};
use rand::Rng;
use rand::seq::IndexedRandom;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::{MissingEnvVar, required_env};

const NAMES: &[&str] = &[
    "Ivan Ivanov",
    "Petr Petrov",
    "Sergey Sidorov",
    "Anna Smirnova",
    "Test Testov",
];
const PRODUCTS: &[&str] = &["Sneakers", "T-Shirt", "Jeans", "Hat", "Backpack", "Mascaras"];
const BRANDS: &[&str] = &["Nike", "Adidas", "Puma", "Reebok", "NewBalance"];

/// Delivery wait per message.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur while producing.
#[derive(Debug, Error)]
pub enum ProduceError {
    #[error(transparent)]
    Env(#[from] MissingEnvVar),

    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),

    #[error("Failed to encode order: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Publish `count` synthetic orders keyed by `order_uid`.
pub async fn run(count: u32, interval: Duration) -> Result<(), ProduceError> {
    let brokers = required_env(&["KAFKA_BROKERS"])?;
    let topic = required_env(&["KAFKA_TOPIC"])?;

    let producer: FutureProducer = ClientConfig::new()
        .set("bootstrap.servers", &brokers)
        .set("message.timeout.ms", "5000")
        .create()?;

    tracing::info!("Producing {} orders to {} via {}", count, topic, brokers);

    for n in 1..=count {
        let order = synthetic_order();
        let payload = order.to_json()?;
        let record = FutureRecord::to(&topic)
            .key(order.order_uid.as_str())
            .payload(&payload);

        let delivery = producer
            .send(record, SEND_TIMEOUT)
            .await
            .map_err(|(e, _)| e)?;
        tracing::info!(order_uid = %order.order_uid, ?delivery, "Sent order {}/{}", n, count);

        if n < count && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }

    Ok(())
}

fn pick(options: &'static [&'static str]) -> String {
    options
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or_default()
        .to_owned()
}

/// A random order that passes validation.
#[must_use]
pub fn synthetic_order() -> Order {
    let mut rng = rand::rng();
    let now = Utc::now().trunc_subsecs(PRECISION_DIGITS);
    let uid = Uuid::new_v4().to_string();

    Order {
        order_uid: OrderUid::new(uid.clone()),
        track_number: format!("TRACK-{}", rng.random_range(0..100_000)),
        entry: "WBIL".to_owned(),
        delivery: Delivery {
            name: pick(NAMES),
            phone: format!("+97200{}", rng.random_range(0..9_999_999)),
            zip: format!("{:06}", rng.random_range(0..999_999)),
            city: "Kiryat Mozkin".to_owned(),
            address: format!(
                "Street {}, House {}",
                rng.random_range(0..50),
                rng.random_range(0..100)
            ),
            region: "Kraiot".to_owned(),
            email: "test@gmail.com".to_owned(),
        },
        payment: Payment {
            transaction: uid,
            request_id: String::new(),
            currency: "USD".to_owned(),
            provider: "wbpay".to_owned(),
            amount: Decimal::from(rng.random_range(500..5_500)),
            payment_dt: now.timestamp(),
            bank: "alpha".to_owned(),
            delivery_cost: Decimal::from(1_500),
            goods_total: Decimal::from(rng.random_range(100..2_100)),
            custom_fee: Decimal::ZERO,
        },
        items: vec![Item {
            chrt_id: rng.random_range(1..10_000_000),
            track_number: format!("TRACK-{}", rng.random_range(0..100_000)),
            price: Decimal::from(rng.random_range(100..1_100)),
            rid: Uuid::new_v4().to_string(),
            name: pick(PRODUCTS),
            sale: rng.random_range(0..50),
            size: rng.random_range(0..5).to_string(),
            total_price: Decimal::from(rng.random_range(100..2_100)),
            nm_id: rng.random_range(1..10_000_000),
            brand: pick(BRANDS),
            status: 202,
        }],
        locale: "ru".to_owned(),
        internal_signature: String::new(),
        customer_id: "test".to_owned(),
        delivery_service: "meest".to_owned(),
        shardkey: rng.random_range(0..10).to_string(),
        sm_id: rng.random_range(0..100),
        date_created: now,
        oof_shard: rng.random_range(0..5).to_string(),
    }
}
