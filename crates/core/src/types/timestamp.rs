//! Serde helpers for order creation timestamps.
//!
//! Producers send `date_created` either as an RFC 3339 string
//! (`"2021-11-26T06:22:19Z"`) or as integer Unix seconds. Both decode into a
//! `DateTime<Utc>`; encoding always emits RFC 3339.
//!
//! Decoded values are truncated to microseconds, the precision of a
//! `TIMESTAMPTZ` column, so the stored and cached copies of an order agree.

use chrono::{DateTime, SubsecRound, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Fractional-second digits kept on decode.
pub const PRECISION_DIGITS: u16 = 6;

/// Serialize a timestamp as RFC 3339.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339())
}

/// Deserialize a timestamp from RFC 3339 text or Unix seconds.
///
/// # Errors
///
/// Returns an error if the value is neither a parseable RFC 3339 string nor
/// an in-range integer.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match Value::deserialize(deserializer)? {
        Value::Number(n) => {
            let secs = n
                .as_i64()
                .ok_or_else(|| D::Error::custom(format!("timestamp is not whole seconds: {n}")))?;
            DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {secs}")))?
        }
        Value::String(text) => DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| D::Error::custom(format!("invalid timestamp {text:?}: {e}")))?,
        other => return Err(D::Error::custom(format!("invalid timestamp: {other}"))),
    };
    Ok(parsed.trunc_subsecs(PRECISION_DIGITS))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "crate::types::timestamp")]
        at: DateTime<Utc>,
    }

    #[test]
    fn test_deserialize_rfc3339() {
        let w: Wrapper = serde_json::from_str(r#"{"at":"2021-11-26T06:22:19Z"}"#).unwrap();
        assert_eq!(w.at, Utc.with_ymd_and_hms(2021, 11, 26, 6, 22, 19).unwrap());
    }

    #[test]
    fn test_deserialize_offset_is_normalized() {
        let w: Wrapper = serde_json::from_str(r#"{"at":"2021-11-26T09:22:19+03:00"}"#).unwrap();
        assert_eq!(w.at, Utc.with_ymd_and_hms(2021, 11, 26, 6, 22, 19).unwrap());
    }

    #[test]
    fn test_deserialize_unix_seconds() {
        let w: Wrapper = serde_json::from_str(r#"{"at":1637907727}"#).unwrap();
        assert_eq!(w.at.timestamp(), 1_637_907_727);
    }

    #[test]
    fn test_deserialize_truncates_to_microseconds() {
        let w: Wrapper =
            serde_json::from_str(r#"{"at":"2021-11-26T06:22:19.123456789Z"}"#).unwrap();
        assert_eq!(w.at.timestamp(), 1_637_907_739);
        assert_eq!(w.at.timestamp_subsec_nanos(), 123_456_000);
    }

    #[test]
    fn test_deserialize_fractional_seconds_rejected() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"at":1637907727.5}"#).is_err());
    }

    #[test]
    fn test_deserialize_garbage() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"at":"yesterday"}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"at":true}"#).is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let original = Wrapper {
            at: Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap()
                + chrono::Duration::microseconds(250_001),
        };
        let json = serde_json::to_string(&original).unwrap();
        let parsed: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.at, original.at);
    }
}
