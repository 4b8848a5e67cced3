//! CSV import of items/containers and export of the current arrangement.
//!
//! Imports are row-tolerant: a bad row is reported with its 1-based data-row
//! number and skipped, the rest still load.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{StowageError, StowageResult};
use crate::types::{parse_usage_limit, Container, Coordinates, Item, ItemSpec};

pub const ITEM_ID: &str = "Item ID";
pub const ITEM_NAME: &str = "Name";
pub const ITEM_WIDTH: &str = "Width (cm)";
pub const ITEM_DEPTH: &str = "Depth (cm)";
pub const ITEM_HEIGHT: &str = "Height (cm)";
pub const ITEM_MASS: &str = "Mass (kg)";
pub const ITEM_PRIORITY: &str = "Priority";
pub const ITEM_EXPIRY: &str = "Expiry Date (ISO Format)";
pub const ITEM_USAGE_LIMIT: &str = "Usage Limit";
pub const ITEM_ZONE: &str = "Preferred Zone";

pub const CONTAINER_ID: &str = "Container ID";
pub const CONTAINER_ZONE: &str = "Zone";
pub const CONTAINER_WIDTH: &str = "Width(cm)";
pub const CONTAINER_DEPTH: &str = "Depth(cm)";
pub const CONTAINER_HEIGHT: &str = "Height(height)";
const CONTAINER_HEIGHT_FALLBACK: &str = "Height(cm)";

pub const ARRANGEMENT_HEADER: [&str; 4] = [
    "Item ID",
    "Container ID",
    "Coordinates (W,D,H)",
    "Coordinates (W2,D2,H2)",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

/// Result of one CSV import: what loaded, and what was skipped and why.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport<T> {
    pub records: Vec<T>,
    pub errors: Vec<RowError>,
}

impl<T> ImportReport<T> {
    pub fn imported(&self) -> usize {
        self.records.len()
    }

    /// Same errors, records replaced by `f` of each.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ImportReport<U> {
        ImportReport {
            records: self.records.into_iter().map(f).collect(),
            errors: self.errors,
        }
    }
}

/// Column lookup by header name, tolerant of stray whitespace.
struct Columns {
    headers: Vec<String>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        Self {
            headers: headers.iter().map(|h| h.trim().to_string()).collect(),
        }
    }

    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.headers
            .iter()
            .position(|h| h == name)
            .and_then(|idx| record.get(idx))
            .map(str::trim)
    }

    fn text(&self, record: &StringRecord, name: &str) -> String {
        self.get(record, name).unwrap_or_default().to_string()
    }

    fn number(&self, record: &StringRecord, name: &str) -> Result<f64, String> {
        let raw = self
            .get(record, name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| format!("Missing {name}"))?;
        raw.parse::<f64>()
            .map_err(|_| format!("Invalid {name}: '{raw}'"))
    }

    fn optional(&self, record: &StringRecord, name: &str) -> Option<String> {
        self.get(record, name)
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("n/a"))
            .map(str::to_string)
    }
}

fn read_rows<R, T, F>(reader: R, mut parse: F) -> StowageResult<ImportReport<T>>
where
    R: Read,
    F: FnMut(&Columns, &StringRecord) -> Result<T, String>,
{
    let mut csv = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let columns = Columns::new(csv.headers()?);

    let mut records = Vec::new();
    let mut errors = Vec::new();
    for (idx, result) in csv.records().enumerate() {
        let row = idx + 1;
        let parsed = result
            .map_err(|e| e.to_string())
            .and_then(|record| parse(&columns, &record));
        match parsed {
            Ok(record) => records.push(record),
            Err(message) => {
                tracing::warn!(row, %message, "skipping CSV row");
                errors.push(RowError { row, message });
            }
        }
    }

    Ok(ImportReport { records, errors })
}

fn parse_item(columns: &Columns, record: &StringRecord) -> Result<Item, String> {
    let item_id = columns.text(record, ITEM_ID);
    if item_id.is_empty() {
        return Err(format!("Missing {ITEM_ID}"));
    }

    let priority = columns.number(record, ITEM_PRIORITY)?;
    let spec = ItemSpec {
        item_id,
        name: columns.text(record, ITEM_NAME),
        width: columns.number(record, ITEM_WIDTH)?,
        depth: columns.number(record, ITEM_DEPTH)?,
        height: columns.number(record, ITEM_HEIGHT)?,
        mass: columns.number(record, ITEM_MASS)?,
        priority: priority.round() as i64,
        expiry_date: columns.optional(record, ITEM_EXPIRY),
        usage_limit: columns
            .optional(record, ITEM_USAGE_LIMIT)
            .and_then(|raw| parse_usage_limit(&raw)),
        preferred_zone: columns.text(record, ITEM_ZONE),
    };
    Ok(Item::from_spec(spec))
}

fn parse_container(columns: &Columns, record: &StringRecord) -> Result<Container, String> {
    let container_id = columns.text(record, CONTAINER_ID);
    if container_id.is_empty() {
        return Err(format!("Missing {CONTAINER_ID}"));
    }

    let height = columns
        .number(record, CONTAINER_HEIGHT)
        .or_else(|_| columns.number(record, CONTAINER_HEIGHT_FALLBACK))?;

    Ok(Container {
        container_id,
        zone: columns.text(record, CONTAINER_ZONE),
        width: columns.number(record, CONTAINER_WIDTH)?,
        depth: columns.number(record, CONTAINER_DEPTH)?,
        height,
    })
}

/// Items from an item CSV. Imported items are unplaced with zero uses.
pub fn import_items<R: Read>(reader: R) -> StowageResult<ImportReport<Item>> {
    read_rows(reader, parse_item)
}

pub fn import_containers<R: Read>(reader: R) -> StowageResult<ImportReport<Container>> {
    read_rows(reader, parse_container)
}

fn format_coordinates(c: &Coordinates) -> String {
    format!("({},{},{})", c.width, c.depth, c.height)
}

/// One row per item, in registry order. Unplaced items get empty cells.
pub fn export_arrangement<'a>(
    items: impl IntoIterator<Item = &'a Item>,
) -> StowageResult<String> {
    let export_error = |e: csv::Error| StowageError::Export(e.to_string());
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(ARRANGEMENT_HEADER)
        .map_err(export_error)?;

    for item in items {
        let container = item.container_id.clone().unwrap_or_default();
        let (start, end) = item
            .position
            .map(|p| (format_coordinates(&p.start), format_coordinates(&p.end)))
            .unwrap_or_default();
        writer.write_record([
            item.item_id.as_str(),
            container.as_str(),
            start.as_str(),
            end.as_str(),
        ])
        .map_err(export_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| StowageError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| StowageError::Export(e.to_string()))
}
