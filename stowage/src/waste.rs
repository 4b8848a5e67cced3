//! Waste classification and the undocking flow.
//!
//! An item is waste when its expiry has passed (wall-clock time, not the
//! simulation date) or its usage counter has reached its limit. When both
//! hold the usage check runs last and its reason wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::ItemRegistry;
use crate::types::{Item, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WasteReason {
    Expired,
    #[serde(rename = "Out of Uses")]
    OutOfUses,
}

impl WasteReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteReason::Expired => "Expired",
            WasteReason::OutOfUses => "Out of Uses",
        }
    }
}

pub fn classify(item: &Item, now: DateTime<Utc>) -> Option<WasteReason> {
    let mut reason = None;

    // Unparseable expiry strings count as not expired.
    if let Some(expiry) = item.expiry() {
        if expiry < now {
            reason = Some(WasteReason::Expired);
        }
    }

    if let Some(limit) = item.usage_limit {
        if item.uses >= limit {
            reason = Some(WasteReason::OutOfUses);
        }
    }

    reason
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteItem {
    pub item_id: String,
    pub name: String,
    pub reason: WasteReason,
    pub container_id: Option<String>,
    pub position: Option<Position>,
}

/// Every waste item in registry order.
pub fn identify(items: &ItemRegistry, now: DateTime<Utc>) -> Vec<WasteItem> {
    items
        .iter()
        .filter_map(|item| {
            classify(item, now).map(|reason| WasteItem {
                item_id: item.item_id.clone(),
                name: item.name.clone(),
                reason,
                container_id: item.container_id.clone(),
                position: item.position,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnStep {
    pub step: usize,
    pub item_id: String,
    pub item_name: String,
    pub from_container: Option<String>,
    pub to_container: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItem {
    pub item_id: String,
    pub name: String,
    pub reason: WasteReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnManifest {
    pub undocking_container_id: Option<String>,
    pub undocking_date: Option<String>,
    pub return_items: Vec<ReturnItem>,
    pub total_volume: f64,
    pub total_weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPlan {
    pub steps: Vec<ReturnStep>,
    pub manifest: ReturnManifest,
}

/// Plan moving every waste item to the undocking container. Nothing is moved
/// and `max_weight` is not enforced; totals cover all waste regardless.
pub fn return_plan(
    items: &ItemRegistry,
    undocking_container_id: Option<&str>,
    undocking_date: Option<&str>,
    _max_weight: Option<f64>,
    now: DateTime<Utc>,
) -> ReturnPlan {
    let mut steps = Vec::new();
    let mut return_items = Vec::new();
    let mut total_volume = 0.0;
    let mut total_weight = 0.0;

    for item in items.iter() {
        let Some(reason) = classify(item, now) else {
            continue;
        };
        steps.push(ReturnStep {
            step: steps.len() + 1,
            item_id: item.item_id.clone(),
            item_name: item.name.clone(),
            from_container: item.container_id.clone(),
            to_container: undocking_container_id.map(str::to_string),
        });
        return_items.push(ReturnItem {
            item_id: item.item_id.clone(),
            name: item.name.clone(),
            reason,
        });
        total_volume += item.volume();
        total_weight += item.mass;
    }

    ReturnPlan {
        steps,
        manifest: ReturnManifest {
            undocking_container_id: undocking_container_id.map(str::to_string),
            undocking_date: undocking_date.map(str::to_string),
            return_items,
            total_volume,
            total_weight,
        },
    }
}

/// Remove waste items already resident in the undocking container. Returns
/// the ids removed, in registry order.
pub fn complete_undocking(
    items: &mut ItemRegistry,
    undocking_container_id: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<String> {
    let doomed: Vec<String> = items
        .iter()
        .filter(|item| classify(item, now).is_some())
        .filter(|item| item.container_id.as_deref() == undocking_container_id)
        .map(|item| item.item_id.clone())
        .collect();

    for item_id in &doomed {
        items.delete(item_id);
    }
    doomed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemSpec;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn item(id: &str, expiry: Option<&str>, limit: Option<u32>, uses: u32) -> Item {
        let mut item = Item::from_spec(ItemSpec {
            item_id: id.to_string(),
            name: format!("{id}-name"),
            width: 1.0,
            depth: 2.0,
            height: 3.0,
            mass: 4.0,
            expiry_date: expiry.map(str::to_string),
            usage_limit: limit,
            ..Default::default()
        });
        item.uses = uses;
        item
    }

    #[test]
    fn unlimited_items_are_never_waste() {
        for uses in [0, 1, 1000] {
            assert_eq!(classify(&item("x", None, None, uses), now()), None);
        }
    }

    #[test]
    fn expiry_must_be_strictly_past() {
        assert_eq!(
            classify(&item("x", Some("2025-05-31T23:59:59Z"), None, 0), now()),
            Some(WasteReason::Expired)
        );
        assert_eq!(
            classify(&item("x", Some("2025-06-01T00:00:00Z"), None, 0), now()),
            None
        );
    }

    #[test]
    fn unparseable_expiry_is_not_expired() {
        assert_eq!(classify(&item("x", Some("whenever"), None, 0), now()), None);
    }

    #[test]
    fn usage_limit_reason_overrides_expiry() {
        let both = item("x", Some("2020-01-01"), Some(2), 2);
        assert_eq!(classify(&both, now()), Some(WasteReason::OutOfUses));

        let over = item("y", Some("2099-01-01"), Some(2), 5);
        assert_eq!(classify(&over, now()), Some(WasteReason::OutOfUses));

        let under = item("z", None, Some(2), 1);
        assert_eq!(classify(&under, now()), None);
    }

    #[test]
    fn reason_serializes_with_display_text() {
        assert_eq!(
            serde_json::to_value(WasteReason::OutOfUses).unwrap(),
            serde_json::json!("Out of Uses")
        );
        assert_eq!(WasteReason::Expired.as_str(), "Expired");
    }

    #[test]
    fn return_plan_numbers_steps_and_sums_totals_without_moving() {
        let mut items = ItemRegistry::new();
        let mut a = item("A", Some("2020-01-01"), None, 0);
        a.container_id = Some("C1".to_string());
        items.upsert(a);
        items.upsert(item("keep", None, None, 0));
        items.upsert(item("B", None, Some(1), 1));

        let plan = return_plan(&items, Some("UD"), Some("2025-07-01"), Some(0.1), now());

        let steps: Vec<_> = plan.steps.iter().map(|s| (s.step, s.item_id.as_str())).collect();
        assert_eq!(steps, vec![(1, "A"), (2, "B")]);
        assert_eq!(plan.steps[0].from_container.as_deref(), Some("C1"));
        assert_eq!(plan.steps[0].to_container.as_deref(), Some("UD"));
        assert_eq!(plan.manifest.total_volume, 12.0);
        assert_eq!(plan.manifest.total_weight, 8.0);
        assert_eq!(plan.manifest.return_items.len(), 2);
        assert_eq!(items.get("A").unwrap().container_id.as_deref(), Some("C1"));
    }

    #[test]
    fn complete_undocking_only_removes_waste_in_the_undocking_container() {
        let mut items = ItemRegistry::new();
        let mut staged = item("staged", Some("2020-01-01"), None, 0);
        staged.container_id = Some("UD".to_string());
        let mut elsewhere = item("elsewhere", Some("2020-01-01"), None, 0);
        elsewhere.container_id = Some("C1".to_string());
        let mut healthy = item("healthy", None, None, 0);
        healthy.container_id = Some("UD".to_string());
        items.upsert(staged);
        items.upsert(elsewhere);
        items.upsert(healthy);

        let removed = complete_undocking(&mut items, Some("UD"), now());

        assert_eq!(removed, vec!["staged".to_string()]);
        assert!(items.get("staged").is_none());
        assert!(items.get("elsewhere").is_some());
        assert!(items.get("healthy").is_some());
    }
}
