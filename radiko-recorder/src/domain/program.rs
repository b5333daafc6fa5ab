//! Broadcast program value object.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::Asia::Tokyo;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Timestamp layout used by radiko for program boundaries and timefree URLs.
pub const RADIKO_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// A single scheduled broadcast.
///
/// The wire format keeps radiko's attribute names (`ft`, `to`, `dur`, `pfm`)
/// so that schedule entries and queue submissions share one shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Program {
    /// radiko program identifier.
    pub id: String,
    /// Scheduled start instant.
    #[serde(rename = "ft")]
    pub start: DateTime<FixedOffset>,
    /// Scheduled end instant.
    #[serde(rename = "to")]
    pub end: DateTime<FixedOffset>,
    /// Nominal duration in seconds.
    #[serde(rename = "dur")]
    pub duration_secs: u32,
    pub title: String,
    /// Performer name, often empty in radiko data.
    #[serde(rename = "pfm", default, skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
}

impl Program {
    /// Performer name, treating an empty string as absent.
    pub fn performer_name(&self) -> Option<&str> {
        self.performer.as_deref().filter(|p| !p.is_empty())
    }

    /// Start instant expressed in Japan time.
    pub fn start_jst(&self) -> DateTime<chrono_tz::Tz> {
        self.start.with_timezone(&Tokyo)
    }
}

/// Parse a radiko `YYYYMMDDHHMMSS` timestamp as a Japan-time instant.
pub fn parse_radiko_timestamp(value: &str) -> Result<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(value, RADIKO_TIMESTAMP_FORMAT)
        .map_err(|e| Error::validation(format!("Invalid radiko timestamp '{}': {}", value, e)))?;

    Tokyo
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| Error::validation(format!("Ambiguous radiko timestamp '{}'", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(performer: Option<&str>) -> Program {
        Program {
            id: "1".to_string(),
            start: parse_radiko_timestamp("20240520000000").unwrap(),
            end: parse_radiko_timestamp("20240520010000").unwrap(),
            duration_secs: 3600,
            title: "Title".to_string(),
            performer: performer.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_radiko_timestamp_is_japan_time() {
        let dt = parse_radiko_timestamp("20240520000000").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(dt.to_rfc3339(), "2024-05-20T00:00:00+09:00");
    }

    #[test]
    fn test_parse_radiko_timestamp_rejects_garbage() {
        assert!(parse_radiko_timestamp("2024-05-20").is_err());
    }

    #[test]
    fn test_empty_performer_is_absent() {
        assert_eq!(program(Some("")).performer_name(), None);
        assert_eq!(program(None).performer_name(), None);
        assert_eq!(program(Some("Someone")).performer_name(), Some("Someone"));
    }

    #[test]
    fn test_wire_format_uses_radiko_names() {
        let json = serde_json::to_value(program(Some("Someone"))).unwrap();
        assert_eq!(json["ft"], "2024-05-20T00:00:00+09:00");
        assert_eq!(json["to"], "2024-05-20T01:00:00+09:00");
        assert_eq!(json["dur"], 3600);
        assert_eq!(json["pfm"], "Someone");

        let without: serde_json::Value = serde_json::to_value(program(None)).unwrap();
        assert!(without.get("pfm").is_none());
    }

    #[test]
    fn test_equal_instants_in_different_offsets_are_equal() {
        let mut other = program(None);
        other.start = other.start.with_timezone(&chrono::Utc).fixed_offset();
        assert_eq!(program(None), other);
    }
}
