//! Logical clock for day simulation.
//!
//! The clock starts at wall-clock time and only moves when advanced. Waste
//! classification does not read it.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StowageError, StowageResult};
use crate::registry::ItemRegistry;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// One entry of `itemsUsed`: a bare id, or an object naming the item by id
/// and/or name. Anything else is kept as `Other` and never matches an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemUsage {
    Id(String),
    Ref {
        #[serde(rename = "itemId", default)]
        item_id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
    Other(Value),
}

impl ItemUsage {
    /// Registry id this entry refers to, if any. An explicit id is taken
    /// as-is; a name is looked up case-insensitively.
    fn resolve(&self, items: &ItemRegistry) -> Option<String> {
        match self {
            ItemUsage::Id(id) => items.get(id).map(|item| item.item_id.clone()),
            ItemUsage::Ref {
                item_id: Some(id), ..
            } => items.get(id).map(|item| item.item_id.clone()),
            ItemUsage::Ref {
                item_id: None,
                name: Some(name),
            } => items.find_by_name(name).map(|item| item.item_id.clone()),
            ItemUsage::Ref {
                item_id: None,
                name: None,
            }
            | ItemUsage::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationClock {
    current: DateTime<Utc>,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::starting_at(Utc::now())
    }
}

impl SimulationClock {
    pub fn starting_at(current: DateTime<Utc>) -> Self {
        Self { current }
    }

    pub fn current(&self) -> DateTime<Utc> {
        self.current
    }

    /// Move the clock by `days` (fractional and negative values allowed) and
    /// record one use per `items_used` entry that resolves to a registered
    /// item. Duplicate entries count once each. Returns the ids incremented.
    ///
    /// A step the calendar cannot represent fails with `OutOfRange` and leaves
    /// both the clock and the usage counters untouched.
    pub fn advance(
        &mut self,
        days: f64,
        items_used: &[ItemUsage],
        items: &mut ItemRegistry,
    ) -> StowageResult<Vec<String>> {
        self.current = self.shifted(days)?;

        let mut used = Vec::new();
        for usage in items_used {
            let Some(item_id) = usage.resolve(items) else {
                continue;
            };
            if items.increment_usage(&item_id).is_ok() {
                used.push(item_id);
            }
        }
        Ok(used)
    }

    fn shifted(&self, days: f64) -> StowageResult<DateTime<Utc>> {
        let out_of_range = || StowageError::OutOfRange(format!("cannot advance by {days} days"));

        let millis = (days * MILLIS_PER_DAY).round();
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return Err(out_of_range());
        }
        TimeDelta::try_milliseconds(millis as i64)
            .and_then(|offset| self.current.checked_add_signed(offset))
            .ok_or_else(out_of_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Item, ItemSpec};
    use chrono::{Duration, TimeZone};

    fn registry() -> ItemRegistry {
        let mut items = ItemRegistry::new();
        items.upsert(Item::from_spec(ItemSpec {
            item_id: "I1".to_string(),
            name: "Oxygen Canister".to_string(),
            ..Default::default()
        }));
        items
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn advance_moves_clock_and_uses_once_per_entry() {
        let mut items = registry();
        let mut clock = SimulationClock::starting_at(start());

        clock
            .advance(2.0, &[ItemUsage::Id("I1".to_string())], &mut items)
            .unwrap();

        assert_eq!(clock.current(), start() + Duration::days(2));
        assert_eq!(items.get("I1").unwrap().uses, 1);
    }

    #[test]
    fn duplicates_count_and_unknown_ids_are_skipped() {
        let mut items = registry();
        let mut clock = SimulationClock::starting_at(start());
        let used = clock
            .advance(
                1.0,
                &[
                    ItemUsage::Id("I1".to_string()),
                    ItemUsage::Id("ghost".to_string()),
                    ItemUsage::Id("I1".to_string()),
                ],
                &mut items,
            )
            .unwrap();

        assert_eq!(used, vec!["I1".to_string(), "I1".to_string()]);
        assert_eq!(items.get("I1").unwrap().uses, 2);
    }

    #[test]
    fn fractional_and_negative_days_are_accepted() {
        let mut items = registry();
        let mut clock = SimulationClock::starting_at(start());

        clock.advance(0.5, &[], &mut items).unwrap();
        assert_eq!(clock.current(), start() + Duration::hours(12));

        clock.advance(-1.0, &[], &mut items).unwrap();
        assert_eq!(clock.current(), start() - Duration::hours(12));
    }

    #[test]
    fn object_entries_resolve_by_id_or_name() {
        let mut items = registry();
        let mut clock = SimulationClock::starting_at(start());
        let entries: Vec<ItemUsage> = serde_json::from_value(serde_json::json!([
            {"itemId": "I1"},
            {"name": "oxygen canister"},
            {},
            42,
            null,
            {"itemId": 7}
        ]))
        .unwrap();
        assert_eq!(entries[3], ItemUsage::Other(serde_json::json!(42)));

        let used = clock.advance(1.0, &entries, &mut items).unwrap();
        assert_eq!(used.len(), 2);
        assert_eq!(items.get("I1").unwrap().uses, 2);
    }

    #[test]
    fn unrepresentable_step_leaves_state_untouched() {
        let mut items = registry();
        let mut clock = SimulationClock::starting_at(start());

        for days in [1e8, -1e8, 1e300, f64::NAN, f64::INFINITY] {
            let err = clock
                .advance(days, &[ItemUsage::Id("I1".to_string())], &mut items)
                .unwrap_err();
            assert!(matches!(err, StowageError::OutOfRange(_)), "days {days}");
        }
        assert_eq!(clock.current(), start());
        assert_eq!(items.get("I1").unwrap().uses, 0);
    }
}
