//! Timestamp helpers for conversation messages.
//!
//! Used as `#[serde(with = "crate::utils::time")]` so messages carry RFC 3339
//! timestamps when rendered as JSON.

use serde::{Deserialize, Deserializer, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

/// Deserialize an RFC 3339 formatted string into an OffsetDateTime
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom)
}

/// Serialize an OffsetDateTime into an RFC 3339 formatted string
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = datetime
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&s)
}

/// Wall-clock `HH:MM:SS` for display next to a message.
///
/// Falls back to UTC when the local offset cannot be determined, which is
/// the case on multi-threaded Unix processes.
pub fn clock(datetime: OffsetDateTime) -> String {
    let local = match time::UtcOffset::current_local_offset() {
        Ok(offset) => datetime.to_offset(offset),
        Err(_) => datetime,
    };
    local
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| "--:--:--".to_string())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn clock_has_three_fields() {
        let shown = clock(datetime!(2024-03-01 09:05:07 UTC));
        assert_eq!(shown.split(':').count(), 3);
        assert_eq!(shown.len(), 8);
    }
}
