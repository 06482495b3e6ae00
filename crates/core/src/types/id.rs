//! Order identifier and cache key naming.
//!
//! Orders are identified by an opaque string (`order_uid`) chosen by the
//! upstream producer. The same identifier is the primary key of the `orders`
//! table and the suffix of the order's cache key.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Namespace prefix for order entries in the cache store.
///
/// Every key this service writes has the form `order:<order_uid>`, which keeps
/// order entries apart from unrelated data sharing the same Redis database.
pub const CACHE_KEY_PREFIX: &str = "order:";

/// Unique identifier of an order aggregate.
///
/// A newtype around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use orderflow_core::OrderUid;
/// let uid = OrderUid::new("b563feb7b2b84b6test");
/// assert_eq!(uid.cache_key(), "order:b563feb7b2b84b6test");
/// assert_eq!(OrderUid::from_cache_key("order:b563feb7b2b84b6test"), Some(uid));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderUid(String);

impl OrderUid {
    /// Create a new order identifier.
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cache key under which this order is stored (`order:<order_uid>`).
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{CACHE_KEY_PREFIX}{}", self.0)
    }

    /// Recover an identifier from a cache key.
    ///
    /// Returns `None` for keys outside the order namespace.
    #[must_use]
    pub fn from_cache_key(key: &str) -> Option<Self> {
        key.strip_prefix(CACHE_KEY_PREFIX).map(Self::new)
    }
}

impl fmt::Display for OrderUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrderUid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderUid {
    fn from(uid: String) -> Self {
        Self(uid)
    }
}

impl From<&str> for OrderUid {
    fn from(uid: &str) -> Self {
        Self(uid.to_owned())
    }
}

impl From<OrderUid> for String {
    fn from(uid: OrderUid) -> Self {
        uid.0
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Type<::sqlx::Postgres> for OrderUid {
    fn type_info() -> ::sqlx::postgres::PgTypeInfo {
        <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
        <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for OrderUid {
    fn decode(
        value: ::sqlx::postgres::PgValueRef<'r>,
    ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
        let uid = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
        Ok(Self(uid))
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Encode<'_, ::sqlx::Postgres> for OrderUid {
    fn encode_by_ref(
        &self,
        buf: &mut ::sqlx::postgres::PgArgumentBuffer,
    ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
        <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
