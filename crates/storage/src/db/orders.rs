//! Order aggregate repository.
//!
//! Reads join `orders`, `deliveries`, and `payments` by `order_uid`, then load
//! the item rows. Writes insert all four tables inside one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use orderflow_core::{Delivery, Item, Order, OrderUid, Payment};

use crate::store::{OrderStore, SaveOutcome, StoreError};

const SELECT_ORDER: &str = r"
    SELECT o.order_uid, o.track_number, o.entry, o.locale, o.internal_signature,
           o.customer_id, o.delivery_service, o.shardkey, o.sm_id, o.date_created, o.oof_shard,
           d.name AS delivery_name, d.phone AS delivery_phone, d.zip AS delivery_zip,
           d.city AS delivery_city, d.address AS delivery_address,
           d.region AS delivery_region, d.email AS delivery_email,
           p.transaction AS payment_transaction, p.request_id AS payment_request_id,
           p.currency AS payment_currency, p.provider AS payment_provider,
           p.amount AS payment_amount, p.payment_dt, p.bank AS payment_bank,
           p.delivery_cost AS payment_delivery_cost, p.goods_total AS payment_goods_total,
           p.custom_fee AS payment_custom_fee
    FROM orders o
    JOIN deliveries d ON o.order_uid = d.order_uid
    JOIN payments p ON o.order_uid = p.order_uid
    WHERE o.order_uid = $1
";

const SELECT_ITEMS: &str = r"
    SELECT chrt_id, track_number, price, rid, name, sale, size, total_price, nm_id, brand, status
    FROM items
    WHERE order_uid = $1
    ORDER BY id
";

const INSERT_ORDER: &str = r"
    INSERT INTO orders (
        order_uid, track_number, entry, locale, internal_signature, customer_id,
        delivery_service, shardkey, sm_id, date_created, oof_shard
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
    ON CONFLICT (order_uid) DO NOTHING
";

const INSERT_DELIVERY: &str = r"
    INSERT INTO deliveries (order_uid, name, phone, zip, city, address, region, email)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
";

const INSERT_PAYMENT: &str = r"
    INSERT INTO payments (
        order_uid, transaction, request_id, currency, provider, amount,
        payment_dt, bank, delivery_cost, goods_total, custom_fee
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
";

const INSERT_ITEM: &str = r"
    INSERT INTO items (
        order_uid, chrt_id, track_number, price, rid, name, sale, size,
        total_price, nm_id, brand, status
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
";

/// Joined order, delivery, and payment columns for one order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_uid: OrderUid,
    track_number: String,
    entry: String,
    locale: String,
    internal_signature: String,
    customer_id: String,
    delivery_service: String,
    shardkey: String,
    sm_id: i32,
    date_created: DateTime<Utc>,
    oof_shard: String,
    delivery_name: String,
    delivery_phone: String,
    delivery_zip: String,
    delivery_city: String,
    delivery_address: String,
    delivery_region: String,
    delivery_email: String,
    payment_transaction: String,
    payment_request_id: String,
    payment_currency: String,
    payment_provider: String,
    payment_amount: Decimal,
    payment_dt: i64,
    payment_bank: String,
    payment_delivery_cost: Decimal,
    payment_goods_total: Decimal,
    payment_custom_fee: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    chrt_id: i64,
    track_number: String,
    price: Decimal,
    rid: String,
    name: String,
    sale: i32,
    size: String,
    total_price: Decimal,
    nm_id: i64,
    brand: String,
    status: i32,
}

impl OrderRow {
    fn into_order(self, items: Vec<ItemRow>) -> Order {
        Order {
            order_uid: self.order_uid,
            track_number: self.track_number,
            entry: self.entry,
            delivery: Delivery {
                name: self.delivery_name,
                phone: self.delivery_phone,
                zip: self.delivery_zip,
                city: self.delivery_city,
                address: self.delivery_address,
                region: self.delivery_region,
                email: self.delivery_email,
            },
            payment: Payment {
                transaction: self.payment_transaction,
                request_id: self.payment_request_id,
                currency: self.payment_currency,
                provider: self.payment_provider,
                amount: self.payment_amount,
                payment_dt: self.payment_dt,
                bank: self.payment_bank,
                delivery_cost: self.payment_delivery_cost,
                goods_total: self.payment_goods_total,
                custom_fee: self.payment_custom_fee,
            },
            items: items.into_iter().map(Item::from).collect(),
            locale: self.locale,
            internal_signature: self.internal_signature,
            customer_id: self.customer_id,
            delivery_service: self.delivery_service,
            shardkey: self.shardkey,
            sm_id: self.sm_id,
            date_created: self.date_created,
            oof_shard: self.oof_shard,
        }
    }
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            chrt_id: row.chrt_id,
            track_number: row.track_number,
            price: row.price,
            rid: row.rid,
            name: row.name,
            sale: row.sale,
            size: row.size,
            total_price: row.total_price,
            nm_id: row.nm_id,
            brand: row.brand,
            status: row.status,
        }
    }
}

/// Repository for order aggregates in `PostgreSQL`.
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Create a new order repository over a shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrderStore for PgOrderRepository {
    /// Get an order aggregate by its id.
    ///
    /// The item query only runs when the root row exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if either query fails.
    #[instrument(skip(self), fields(order_uid = %uid))]
    async fn get_by_id(&self, uid: &OrderUid) -> Result<Option<Order>, StoreError> {
        let Some(row) = sqlx::query_as::<_, OrderRow>(SELECT_ORDER)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?
        else {
            debug!("Order not found");
            return Ok(None);
        };

        let items = sqlx::query_as::<_, ItemRow>(SELECT_ITEMS)
            .bind(uid)
            .fetch_all(&self.pool)
            .await?;

        debug!(items = items.len(), "Loaded order");
        Ok(Some(row.into_order(items)))
    }

    /// Insert an order aggregate in a single transaction.
    ///
    /// Insert order is root, delivery, payment, then items. Any failure drops
    /// the transaction, which rolls back every row written so far.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Invalid` before touching the database if the
    /// aggregate violates an invariant, and `StoreError::Database` for any
    /// failed statement.
    #[instrument(skip(self, order), fields(order_uid = %order.order_uid, items = order.items.len()))]
    async fn save(&self, order: &Order) -> Result<SaveOutcome, StoreError> {
        order.validate()?;

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(INSERT_ORDER)
            .bind(&order.order_uid)
            .bind(&order.track_number)
            .bind(&order.entry)
            .bind(&order.locale)
            .bind(&order.internal_signature)
            .bind(&order.customer_id)
            .bind(&order.delivery_service)
            .bind(&order.shardkey)
            .bind(order.sm_id)
            .bind(order.date_created)
            .bind(&order.oof_shard)
            .execute(&mut *tx)
            .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            debug!("Order already persisted, skipping child rows");
            return Ok(SaveOutcome::AlreadyExists);
        }

        let delivery = &order.delivery;
        sqlx::query(INSERT_DELIVERY)
            .bind(&order.order_uid)
            .bind(&delivery.name)
            .bind(&delivery.phone)
            .bind(&delivery.zip)
            .bind(&delivery.city)
            .bind(&delivery.address)
            .bind(&delivery.region)
            .bind(&delivery.email)
            .execute(&mut *tx)
            .await?;

        let payment = &order.payment;
        sqlx::query(INSERT_PAYMENT)
            .bind(&order.order_uid)
            .bind(&payment.transaction)
            .bind(&payment.request_id)
            .bind(&payment.currency)
            .bind(&payment.provider)
            .bind(payment.amount)
            .bind(payment.payment_dt)
            .bind(&payment.bank)
            .bind(payment.delivery_cost)
            .bind(payment.goods_total)
            .bind(payment.custom_fee)
            .execute(&mut *tx)
            .await?;

        for item in &order.items {
            sqlx::query(INSERT_ITEM)
                .bind(&order.order_uid)
                .bind(item.chrt_id)
                .bind(&item.track_number)
                .bind(item.price)
                .bind(&item.rid)
                .bind(&item.name)
                .bind(item.sale)
                .bind(&item.size)
                .bind(item.total_price)
                .bind(item.nm_id)
                .bind(&item.brand)
                .bind(item.status)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        debug!("Order persisted");
        Ok(SaveOutcome::Created)
    }

    /// List every order id, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the query fails.
    #[instrument(skip(self))]
    async fn list_all_ids(&self) -> Result<Vec<OrderUid>, StoreError> {
        let ids = sqlx::query_scalar::<_, OrderUid>(
            "SELECT order_uid FROM orders ORDER BY date_created DESC, order_uid",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = ids.len(), "Listed order ids");
        Ok(ids)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
