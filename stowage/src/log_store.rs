//! Append-only action log.
//!
//! Entries are never mutated or removed; insertion order is the only order.
//! Queries filter by an inclusive time window plus exact-match fields, all
//! conjunctive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::de::blank_as_none;
use crate::timestamp::{format_timestamp, parse_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Placement,
    Search,
    Retrieve,
    Place,
    WasteReturnPlan,
    CompleteUndocking,
    SimulateDay,
    ImportItems,
    ImportContainers,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Placement => "placement",
            ActionType::Search => "search",
            ActionType::Retrieve => "retrieve",
            ActionType::Place => "place",
            ActionType::WasteReturnPlan => "waste_return_plan",
            ActionType::CompleteUndocking => "complete_undocking",
            ActionType::SimulateDay => "simulate_day",
            ActionType::ImportItems => "import_items",
            ActionType::ImportContainers => "import_containers",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: String,
    pub action_type: ActionType,
    pub item_id: Option<String>,
    pub user_id: Option<String>,
    /// Action-specific fields (containerId, days, itemsUsed, ...).
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl LogEntry {
    pub fn new(action_type: ActionType, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: format_timestamp(&at),
            action_type,
            item_id: None,
            user_id: None,
            details: Map::new(),
        }
    }

    pub fn with_item(mut self, item_id: Option<impl Into<String>>) -> Self {
        self.item_id = item_id.map(Into::into);
        self
    }

    pub fn with_user(mut self, user_id: Option<impl Into<String>>) -> Self {
        self.user_id = user_id.map(Into::into);
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Filters for `LogStore::query`. Bounds arrive as raw strings; a bound that
/// does not parse is dropped rather than rejected. Blank values are absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogQuery {
    #[serde(deserialize_with = "blank_as_none")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub item_id: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub action_type: Option<String>,
}

#[derive(Debug, Default)]
pub struct LogStore {
    entries: Vec<LogEntry>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: LogEntry) {
        tracing::debug!(
            action = entry.action_type.as_str(),
            item_id = entry.item_id.as_deref().unwrap_or("-"),
            "log entry appended"
        );
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn query(&self, query: &LogQuery) -> Vec<LogEntry> {
        let start = query.start_date.as_deref().and_then(parse_timestamp);
        let end = query.end_date.as_deref().and_then(parse_timestamp);

        self.entries
            .iter()
            .filter(|entry| {
                if start.is_none() && end.is_none() {
                    return true;
                }
                // An entry whose own timestamp cannot be read never falls inside a window.
                let Some(at) = parse_timestamp(&entry.timestamp) else {
                    return false;
                };
                start.map_or(true, |s| at >= s) && end.map_or(true, |e| at <= e)
            })
            .filter(|entry| {
                query
                    .item_id
                    .as_deref()
                    .map_or(true, |id| entry.item_id.as_deref() == Some(id))
            })
            .filter(|entry| {
                query
                    .user_id
                    .as_deref()
                    .map_or(true, |id| entry.user_id.as_deref() == Some(id))
            })
            .filter(|entry| {
                query
                    .action_type
                    .as_deref()
                    .map_or(true, |kind| entry.action_type.as_str() == kind)
            })
            .cloned()
            .collect()
    }
}
