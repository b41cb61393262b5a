//! Event types carried on the bus.
//!
//! Field names are the wire contract: the same names are used when an event
//! is published and when it is decoded on the relay side. Decoding is lenient
//! per field: a missing or `null` field falls back to its empty/zero default
//! instead of rejecting the whole message. Unknown fields are ignored.

use serde::{Deserialize, Deserializer, Serialize};

// ── Price feed ──────────────────────────────────────────────────────────────

/// A single price observation for one symbol.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceEvent {
    /// Ticker symbol, e.g. `"AAPL"`.
    #[serde(deserialize_with = "null_as_default")]
    pub symbol: String,
    /// Last price, rounded to two decimals.
    #[serde(deserialize_with = "null_as_default")]
    pub price: f64,
    /// Percent change produced by the tick that set `price`. Zero when the
    /// symbol was not ticked in this cycle.
    #[serde(deserialize_with = "null_as_default")]
    pub change_percent: f64,
    /// ISO-8601 UTC instant with a `Z` designator.
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
}

// ── News feed ───────────────────────────────────────────────────────────────

/// A headline emitted by the news feed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsItem {
    /// 1-based position of the headline in the pool.
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
}

/// Deserialize `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_decode_to_defaults() {
        let event: PriceEvent = serde_json::from_str(r#"{"symbol":"MSFT"}"#).unwrap();
        assert_eq!(event.symbol, "MSFT");
        assert_eq!(event.price, 0.0);
        assert_eq!(event.change_percent, 0.0);
        assert!(event.timestamp.is_empty());
    }

    #[test]
    fn test_null_fields_decode_to_defaults() {
        let event: PriceEvent = serde_json::from_str(
            r#"{"symbol":null,"price":null,"change_percent":1.5,"timestamp":null}"#,
        )
        .unwrap();
        assert_eq!(event.symbol, "");
        assert_eq!(event.price, 0.0);
        assert_eq!(event.change_percent, 1.5);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let event: PriceEvent =
            serde_json::from_str(r#"{"symbol":"TSLA","price":201.5,"venue":"XNAS"}"#).unwrap();
        assert_eq!(event.symbol, "TSLA");
        assert_eq!(event.price, 201.5);
    }

    #[test]
    fn test_wrong_field_type_is_rejected() {
        let result: Result<PriceEvent, _> = serde_json::from_str(r#"{"price":"expensive"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_news_item_wire_names() {
        let item = NewsItem {
            id: 3,
            title: "Treasury yields steady".to_string(),
            summary: "Bond market holds range.".to_string(),
            source: "WSJ".to_string(),
            timestamp: "2024-01-02T03:04:05.000000Z".to_string(),
        };
        let value = serde_json::to_value(&item).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 5);
        for key in ["id", "title", "summary", "source", "timestamp"] {
            assert!(keys.contains(&key), "missing wire field {key}");
        }
    }
}
