//! Application state and the operations exposed over HTTP.
//!
//! `Stowage` owns both registries, the action log and the simulation clock.
//! It is transport-agnostic and not internally synchronised; the server
//! wraps it in a single mutex so each request runs against it exclusively.

use std::io::Read;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::csv_io::{self, ImportReport};
use crate::de::{blank_as_none, null_as_default};
use crate::error::StowageResult;
use crate::log_store::{ActionType, LogEntry, LogQuery, LogStore};
use crate::placement::{self, Placement};
use crate::registry::{ContainerRegistry, ItemRegistry};
use crate::simulation::{ItemUsage, SimulationClock};
use crate::timestamp::format_timestamp;
use crate::types::{Container, Item, ItemSpec, Position};
use crate::waste::{self, ReturnManifest, ReturnStep, WasteItem};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlacementRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<ItemSpec>,
    #[serde(deserialize_with = "null_as_default")]
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementResponse {
    pub success: bool,
    pub placements: Vec<Placement>,
    /// Rearrangement planning is not implemented; always empty.
    pub rearrangements: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchQuery {
    #[serde(deserialize_with = "blank_as_none")]
    pub item_id: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub item_name: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub user_id: Option<String>,
}

/// Search hit: the stored item plus hours left before it expires.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    #[serde(flatten)]
    pub item: Item,
    pub time_left_hours: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<SearchItem>,
    pub retrieval_steps: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrieveRequest {
    pub item_id: Option<String>,
    pub user_id: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaceRequest {
    pub item_id: Option<String>,
    pub user_id: Option<String>,
    pub timestamp: Option<String>,
    pub container_id: Option<String>,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReturnPlanRequest {
    pub undocking_container_id: Option<String>,
    pub undocking_date: Option<String>,
    pub max_weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPlanResponse {
    pub success: bool,
    pub return_plan: Vec<ReturnStep>,
    pub retrieval_steps: Vec<Value>,
    pub return_manifest: ReturnManifest,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompleteUndockingRequest {
    pub undocking_container_id: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulateDayRequest {
    pub days: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub items_used: Vec<ItemUsage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationChanges {
    pub items_used: Vec<ItemUsage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateDayResponse {
    pub success: bool,
    pub new_date: String,
    pub changes: SimulationChanges,
}

#[derive(Debug, Default)]
pub struct Stowage {
    items: ItemRegistry,
    containers: ContainerRegistry,
    log: LogStore,
    clock: SimulationClock,
}

impl Stowage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: SimulationClock) -> Self {
        Self {
            clock,
            ..Self::default()
        }
    }

    pub fn items(&self) -> &ItemRegistry {
        &self.items
    }

    pub fn containers(&self) -> &ContainerRegistry {
        &self.containers
    }

    pub fn log(&self) -> &LogStore {
        &self.log
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn place_items(&mut self, request: PlacementRequest) -> PlacementResponse {
        for container in &request.containers {
            self.containers.upsert(container.clone());
        }

        let placements = placement::assign(&request.items, &request.containers);
        let now = Utc::now();
        for (spec, placed) in request.items.into_iter().zip(&placements) {
            let mut item = Item::from_spec(spec);
            item.container_id = placed.container_id.clone();
            item.position = Some(placed.position);
            self.items.upsert(item);

            self.log.append(
                LogEntry::new(ActionType::Placement, now)
                    .with_item(Some(placed.item_id.as_str()))
                    .with_detail("containerId", placed.container_id.clone()),
            );
        }

        info!(
            items = placements.len(),
            containers = request.containers.len(),
            "placement assigned"
        );
        PlacementResponse {
            success: true,
            placements,
            rearrangements: Vec::new(),
        }
    }

    pub fn search(&mut self, query: SearchQuery) -> SearchResponse {
        let now = Utc::now();
        let hit = match (&query.item_id, &query.item_name) {
            (Some(id), _) => self.items.get(id),
            (None, Some(name)) => self.items.find_by_name(name),
            (None, None) => None,
        }
        .cloned();

        let logged_id = hit
            .as_ref()
            .map(|item| item.item_id.clone())
            .or_else(|| query.item_id.clone());
        self.log.append(
            LogEntry::new(ActionType::Search, now)
                .with_item(logged_id)
                .with_user(query.user_id.clone())
                .with_detail("itemName", query.item_name.clone()),
        );

        debug!(found = hit.is_some(), "search");
        SearchResponse {
            success: true,
            found: hit.is_some(),
            item: hit.map(|item| SearchItem {
                time_left_hours: item.hours_until_expiry(now),
                item,
            }),
            retrieval_steps: Vec::new(),
        }
    }

    /// Record one use of an item. Fails with `UnknownItem` for absent ids.
    pub fn retrieve(&mut self, request: RetrieveRequest) -> StowageResult<u32> {
        let item_id = request.item_id.clone().unwrap_or_default();
        let uses = self.items.increment_usage(&item_id)?;

        self.log.append(
            LogEntry::new(ActionType::Retrieve, Utc::now())
                .with_item(Some(item_id.as_str()))
                .with_user(request.user_id)
                .with_detail("requestTimestamp", request.timestamp),
        );
        info!(item_id = %item_id, uses, "item retrieved");
        Ok(uses)
    }

    /// Manually relocate an item.
    pub fn place(&mut self, request: PlaceRequest) -> StowageResult<()> {
        let item_id = request.item_id.clone().unwrap_or_default();
        self.items
            .set_location(&item_id, request.container_id.clone(), request.position)?;

        self.log.append(
            LogEntry::new(ActionType::Place, Utc::now())
                .with_item(Some(item_id.as_str()))
                .with_user(request.user_id)
                .with_detail("containerId", request.container_id.clone())
                .with_detail("requestTimestamp", request.timestamp),
        );
        info!(
            item_id = %item_id,
            container_id = request.container_id.as_deref().unwrap_or("-"),
            "item placed"
        );
        Ok(())
    }

    pub fn identify_waste(&self) -> Vec<WasteItem> {
        waste::identify(&self.items, Utc::now())
    }

    pub fn return_plan(&mut self, request: ReturnPlanRequest) -> ReturnPlanResponse {
        let plan = waste::return_plan(
            &self.items,
            request.undocking_container_id.as_deref(),
            request.undocking_date.as_deref(),
            request.max_weight,
            Utc::now(),
        );

        self.log.append(
            LogEntry::new(ActionType::WasteReturnPlan, Utc::now())
                .with_detail("undockingContainerId", request.undocking_container_id)
                .with_detail("undockingDate", request.undocking_date)
                .with_detail("itemCount", plan.steps.len()),
        );
        info!(steps = plan.steps.len(), "return plan built");
        ReturnPlanResponse {
            success: true,
            return_plan: plan.steps,
            retrieval_steps: Vec::new(),
            return_manifest: plan.manifest,
        }
    }

    /// Drop waste already moved into the undocking container; returns how many.
    pub fn complete_undocking(&mut self, request: CompleteUndockingRequest) -> usize {
        let removed = waste::complete_undocking(
            &mut self.items,
            request.undocking_container_id.as_deref(),
            Utc::now(),
        );

        self.log.append(
            LogEntry::new(ActionType::CompleteUndocking, Utc::now())
                .with_detail("undockingContainerId", request.undocking_container_id)
                .with_detail("itemsRemoved", removed.len())
                .with_detail("requestTimestamp", request.timestamp),
        );
        info!(removed = removed.len(), "undocking completed");
        removed.len()
    }

    /// Advance the logical clock. A step too large for the calendar is
    /// rejected and nothing is logged.
    pub fn simulate_day(
        &mut self,
        request: SimulateDayRequest,
    ) -> StowageResult<SimulateDayResponse> {
        let days = request.days.unwrap_or(1.0);
        self.clock
            .advance(days, &request.items_used, &mut self.items)?;
        let new_date = format_timestamp(&self.clock.current());

        self.log.append(
            LogEntry::new(ActionType::SimulateDay, Utc::now())
                .with_detail("days", days)
                .with_detail("newDate", new_date.clone())
                .with_detail("itemsUsed", json!(request.items_used)),
        );
        info!(days, new_date = %new_date, "simulation advanced");
        Ok(SimulateDayResponse {
            success: true,
            new_date,
            changes: SimulationChanges {
                items_used: request.items_used,
            },
        })
    }

    /// Upsert every good row; the report carries the imported ids.
    pub fn import_items<R: Read>(&mut self, reader: R) -> StowageResult<ImportReport<String>> {
        let report = csv_io::import_items(reader)?.map(|item| {
            let item_id = item.item_id.clone();
            self.items.upsert(item);
            item_id
        });

        self.log.append(
            LogEntry::new(ActionType::ImportItems, Utc::now())
                .with_detail("itemsImported", report.imported())
                .with_detail("errorCount", report.errors.len()),
        );
        info!(
            imported = report.imported(),
            errors = report.errors.len(),
            "items imported"
        );
        Ok(report)
    }

    pub fn import_containers<R: Read>(
        &mut self,
        reader: R,
    ) -> StowageResult<ImportReport<String>> {
        let report = csv_io::import_containers(reader)?.map(|container| {
            let container_id = container.container_id.clone();
            self.containers.upsert(container);
            container_id
        });

        self.log.append(
            LogEntry::new(ActionType::ImportContainers, Utc::now())
                .with_detail("containersImported", report.imported())
                .with_detail("errorCount", report.errors.len()),
        );
        info!(
            imported = report.imported(),
            errors = report.errors.len(),
            "containers imported"
        );
        Ok(report)
    }

    pub fn export_arrangement(&self) -> StowageResult<String> {
        csv_io::export_arrangement(self.items.iter())
    }

    pub fn logs(&self, query: &LogQuery) -> Vec<LogEntry> {
        self.log.query(query)
    }
}
