//! Share data model: identifiers, expiry codes and stored bundles

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Public token identifying one upload.
///
/// All 128 bits are random, so the value is not a version-4 UUID even though
/// it is stored as one. It renders as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShareId(Uuid);

impl ShareId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::from_bytes(rand::random()))
    }
}

impl fmt::Display for ShareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for ShareId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl Serialize for ShareId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ShareId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Lifetime selected by the uploader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExpiryCode {
    /// "1h"
    OneHour,
    /// "24h"
    #[default]
    OneDay,
    /// "7d"
    SevenDays,
}

impl ExpiryCode {
    /// Every selectable code, shortest first
    pub const ALL: [ExpiryCode; 3] = [Self::OneHour, Self::OneDay, Self::SevenDays];

    /// Map a client-supplied code to an expiry. Unknown codes fall back to
    /// the 24 hour default instead of failing.
    pub fn parse_lenient(code: &str) -> Self {
        match code.trim() {
            "1h" => Self::OneHour,
            "24h" => Self::OneDay,
            "7d" => Self::SevenDays,
            _ => Self::default(),
        }
    }

    /// Canonical wire form of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::OneDay => "24h",
            Self::SevenDays => "7d",
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        match self {
            Self::OneHour => 3_600,
            Self::OneDay => 86_400,
            Self::SevenDays => 604_800,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_seconds())
    }
}

impl fmt::Display for ExpiryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to [`crate::ShareRegistry::create`]
#[derive(Debug, Clone)]
pub struct NewShare {
    /// Transport-safe encoded file contents, one per file
    pub payloads: Vec<String>,
    /// Display names, index-aligned with `payloads`
    pub filenames: Vec<String>,
    pub expiry: ExpiryCode,
    /// Echoed back to the download page; the passphrase itself never reaches the server
    pub has_password: bool,
}

impl NewShare {
    /// Total encoded size of all payloads
    pub fn encoded_len(&self) -> usize {
        self.payloads.iter().map(String::len).sum()
    }
}

/// One stored upload transaction. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareBundle {
    pub id: ShareId,
    pub payloads: Vec<String>,
    pub filenames: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub has_password: bool,
}

impl ShareBundle {
    /// A bundle is dead from the instant its expiry is reached
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn file_count(&self) -> usize {
        self.payloads.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_code_table() {
        assert_eq!(ExpiryCode::parse_lenient("1h").ttl(), Duration::seconds(3600));
        assert_eq!(ExpiryCode::parse_lenient("24h").ttl(), Duration::seconds(86400));
        assert_eq!(ExpiryCode::parse_lenient("7d").ttl(), Duration::seconds(604800));
    }

    #[test]
    fn test_unknown_expiry_code_defaults_to_one_day() {
        for code in ["bogus", "", "1H", "30d", "3600"] {
            assert_eq!(ExpiryCode::parse_lenient(code), ExpiryCode::OneDay, "code {code:?}");
        }
        assert_eq!(ExpiryCode::parse_lenient(" 7d "), ExpiryCode::SevenDays);
    }

    #[test]
    fn test_share_id_text_form() {
        let id = ShareId::generate();
        let text = id.to_string();
        assert_eq!(text.len(), 32);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(text.parse::<ShareId>().unwrap(), id);

        // hyphenated form is accepted too
        let hyphenated = Uuid::parse_str(&text).unwrap().hyphenated().to_string();
        assert_eq!(hyphenated.parse::<ShareId>().unwrap(), id);

        assert!("not-an-id".parse::<ShareId>().is_err());
    }

    #[test]
    fn test_share_id_serde_round_trip() {
        let id = ShareId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        assert_eq!(serde_json::from_str::<ShareId>(&json).unwrap(), id);
        assert!(serde_json::from_str::<ShareId>("\"zzz\"").is_err());
    }

    #[test]
    fn test_bundle_expiry_boundary_is_inclusive() {
        let created_at = Utc::now();
        let bundle = ShareBundle {
            id: ShareId::generate(),
            payloads: vec!["YQ==".to_string()],
            filenames: vec!["a.txt".to_string()],
            created_at,
            expires_at: created_at + Duration::seconds(10),
            has_password: false,
        };

        assert!(!bundle.is_expired_at(created_at + Duration::seconds(9)));
        assert!(bundle.is_expired_at(created_at + Duration::seconds(10)));
        assert_eq!(bundle.file_count(), 1);
    }
}
