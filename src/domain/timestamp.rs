//! Backend timestamps are Java `LocalDateTime`s: ISO text without an offset,
//! or an array of components depending on the serializer configuration.
//! Only the text form is understood; anything else reads as missing.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

pub fn parse(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    text.parse::<DateTime<Utc>>()
        .map(|dt| dt.naive_utc())
        .or_else(|_| text.parse::<NaiveDateTime>())
        .ok()
}

pub fn to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&naive)
}

/// `#[serde(deserialize_with = "timestamp::lenient", default)]`
pub fn lenient<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| v.as_str()).and_then(parse))
}
