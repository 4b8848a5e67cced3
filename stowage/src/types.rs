//! Core stowage records: items, containers and the placement box.
//!
//! Incoming payloads are absence-tolerant: any missing or `null` field falls
//! back to a default instead of rejecting the request. Dimensions and mass default to 0,
//! `expiryDate` / `usageLimit` default to "never" / "unlimited".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::de::null_as_default;
use crate::timestamp::parse_timestamp;

/// A point inside a container, measured along its width, depth and height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(default, deserialize_with = "null_as_default")]
    pub width: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub depth: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub height: f64,
}

impl Coordinates {
    pub fn new(width: f64, depth: f64, height: f64) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }

    pub fn origin() -> Self {
        Self::default()
    }
}

/// Axis-aligned box an item occupies, as start and end corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default, deserialize_with = "null_as_default")]
    pub start: Coordinates,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub item_id: String,
    pub name: String,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub mass: f64,
    pub priority: i64,
    pub expiry_date: Option<String>,
    pub usage_limit: Option<u32>,
    pub preferred_zone: String,
    pub container_id: Option<String>,
    pub position: Option<Position>,
    pub uses: u32,
}

impl Item {
    /// Build a fresh, unplaced item with a zeroed usage counter.
    pub fn from_spec(spec: ItemSpec) -> Self {
        Self {
            item_id: spec.item_id,
            name: spec.name,
            width: spec.width,
            depth: spec.depth,
            height: spec.height,
            mass: spec.mass,
            priority: spec.priority,
            expiry_date: spec.expiry_date,
            usage_limit: spec.usage_limit,
            preferred_zone: spec.preferred_zone,
            container_id: None,
            position: None,
            uses: 0,
        }
    }

    /// Bounding-box volume, ignoring any rotation.
    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    /// Parsed expiry; `None` when absent or unparseable.
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry_date.as_deref().and_then(parse_timestamp)
    }

    /// Signed hours from `now` until expiry. Negative once expired.
    pub fn hours_until_expiry(&self, now: DateTime<Utc>) -> Option<f64> {
        self.expiry()
            .map(|expiry| (expiry - now).num_seconds() as f64 / 3600.0)
    }
}

/// Item as submitted by a client, before it has a location or usage history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemSpec {
    #[serde(deserialize_with = "null_as_default")]
    pub item_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub width: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub depth: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub height: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub mass: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub priority: i64,
    pub expiry_date: Option<String>,
    #[serde(deserialize_with = "deserialize_usage_limit")]
    pub usage_limit: Option<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub preferred_zone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Container {
    #[serde(deserialize_with = "null_as_default")]
    pub container_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub zone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub width: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub depth: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub height: f64,
}

/// Parse a usage limit as written by operators: `"5"`, `"5 uses"`, `"1 use"`.
/// Blank, `N/A` and anything without a leading integer mean unlimited.
pub fn parse_usage_limit(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn deserialize_usage_limit<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    // Fractional, negative or out-of-range counts are treated as unlimited.
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => {
            Some(n as u32)
        }
        Some(Raw::Number(_)) => None,
        Some(Raw::Text(text)) => parse_usage_limit(&text),
        None => None,
    })
}
