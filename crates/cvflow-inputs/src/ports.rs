//! Port-table reshaping for quick actions.
//!
//! Operators maintain access-port configuration as a TSV table (one row
//! per switch port, hyphenated column names for nested fields). These
//! helpers turn the table into studio inputs: rows are nested into
//! objects, grouped per pod and switch, and patched onto the interface
//! nodes of an existing inputs document located by their tag query.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::error::{InputsError, InputsResult};

/// One TSV row: column name to cell text, empty cells as `None`.
pub type Record = BTreeMap<String, Option<String>>;

/// Leaf keys whose values are coerced to integers when nesting port rows.
pub const PORT_INT_KEYS: &[&str] = &["nativeVlan", "phoneVlan", "portChannelId"];

/// Parse TSV text with a header row into records.
///
/// Short rows leave their remaining columns `None`; blank lines are
/// skipped.
pub fn read_tsv_records(text: &str) -> Vec<Record> {
    let mut lines = text.lines();
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    let mut records = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split('\t').collect();
        let mut record = Record::new();
        for (i, column) in columns.iter().enumerate() {
            let cell = cells.get(i).map(|c| c.trim()).unwrap_or("");
            let value = if cell.is_empty() { None } else { Some(cell.to_string()) };
            record.insert(column.to_string(), value);
        }
        records.push(record);
    }
    records
}

/// Parse the text as an integer if possible, otherwise keep it a string.
pub fn coerce_int(text: &str) -> Value {
    text.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::from(text))
}

/// Convert a flat record with hyphenated keys into a nested object.
///
/// `outer-inner` keys become `{outer: {inner: value}}` (split on the first
/// hyphen only). Values whose final key is listed in `int_keys` are
/// coerced to integers; empty cells stay null.
pub fn nest_hyphenated_keys(flat: &Record, int_keys: &[&str]) -> Value {
    let mut nested = Map::new();
    for (key, value) in flat {
        match key.split_once('-') {
            Some((outer, inner)) => {
                let slot = nested
                    .entry(outer.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(sub) = slot {
                    sub.insert(inner.to_string(), leaf(value, int_keys.contains(&inner)));
                }
            }
            None => {
                nested.insert(key.clone(), leaf(value, int_keys.contains(&key.as_str())));
            }
        }
    }
    Value::Object(nested)
}

fn leaf(value: &Option<String>, as_int: bool) -> Value {
    match value {
        None => Value::Null,
        Some(text) if as_int => coerce_int(text),
        Some(text) => Value::from(text.as_str()),
    }
}

/// Group port rows into `{pod: {switch: {deviceId, interfaces: [...]}}}`.
pub fn organize_switch_ports(rows: &[Record]) -> InputsResult<Value> {
    let mut pods = Map::new();
    for (i, row) in rows.iter().enumerate() {
        let pod = require(row, "Access-Pod", i)?;
        let switch = require(row, "switch", i)?;
        let device_id = require(row, "deviceId", i)?;
        let pod_slot =
            pods.entry(pod).or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(switches) = pod_slot else { continue };
        let switch_slot = switches.entry(switch).or_insert_with(|| {
            json!({"deviceId": device_id, "interfaces": []})
        });
        if let Some(Value::Array(interfaces)) = switch_slot.get_mut("interfaces") {
            interfaces.push(json!({
                "interface": optional(row, "interface"),
                "vlan": optional(row, "vlan"),
                "description": optional(row, "description"),
                "profile": optional(row, "profile"),
            }));
        }
    }
    Ok(Value::Object(pods))
}

fn require(row: &Record, column: &str, i: usize) -> InputsResult<String> {
    row.get(column).and_then(Clone::clone).ok_or_else(|| InputsError::MissingColumn {
        column: column.to_string(),
        row: i + 1,
    })
}

fn optional(row: &Record, column: &str) -> Value {
    match row.get(column).and_then(|v| v.as_deref()) {
        Some(text) => Value::from(text),
        None => Value::Null,
    }
}

fn tag_matches(node: &Value, query: &str) -> bool {
    node.get("tags").and_then(|t| t.get("query")).and_then(Value::as_str) == Some(query)
}

/// Find the first node whose `tags.query` equals `query`, depth-first.
pub fn find_by_tag_query<'a>(doc: &'a Value, query: &str) -> Option<&'a Value> {
    if tag_matches(doc, query) {
        return Some(doc);
    }
    match doc {
        Value::Object(fields) => fields.values().find_map(|v| find_by_tag_query(v, query)),
        Value::Array(items) => items.iter().find_map(|v| find_by_tag_query(v, query)),
        _ => None,
    }
}

/// Mutable variant of [`find_by_tag_query`].
pub fn find_by_tag_query_mut<'a>(doc: &'a mut Value, query: &str) -> Option<&'a mut Value> {
    if tag_matches(doc, query) {
        return Some(doc);
    }
    match doc {
        Value::Object(fields) => {
            fields.values_mut().find_map(|v| find_by_tag_query_mut(v, query))
        }
        Value::Array(items) => items.iter_mut().find_map(|v| find_by_tag_query_mut(v, query)),
        _ => None,
    }
}

/// Look up a device serial by hostname in a `[{name, deviceId}]` list.
pub fn device_id_by_name<'a>(devices: &'a Value, name: &str) -> Option<&'a str> {
    devices.as_array()?.iter().find_map(|entry| {
        if entry.get("name").and_then(Value::as_str) == Some(name) {
            entry.get("deviceId").and_then(Value::as_str)
        } else {
            None
        }
    })
}

/// What [`apply_ports`] did and what it could not locate.
#[derive(Debug, Default)]
pub struct PortApplySummary {
    pub updated: Vec<String>,
    pub missing: Vec<String>,
}

/// Patch port rows onto the interface nodes of an inputs document.
///
/// Each row is located by the tag query
/// `interface:Ethernet<interface>@<deviceId>`; the row's nested fields are
/// shallow-merged into the node's `spineAdapterDetails` (if present) or
/// `adapterDetails`. The `switch`/`interface` bookkeeping columns are
/// dropped and `enabled` defaults to `"No"` when the row leaves it blank.
pub fn apply_ports(doc: &mut Value, rows: &[Record], devices: Option<&Value>) -> PortApplySummary {
    let mut summary = PortApplySummary::default();
    for row in rows {
        let switch = row.get("switch").and_then(|v| v.as_deref()).unwrap_or("");
        let Some(interface) = row.get("interface").and_then(|v| v.as_deref()) else {
            summary.missing.push(format!("{switch}: row without interface"));
            continue;
        };
        let device_id = row
            .get("deviceId")
            .and_then(|v| v.as_deref())
            .or_else(|| devices.and_then(|d| device_id_by_name(d, switch)));
        let Some(device_id) = device_id else {
            summary.missing.push(format!("{switch} {interface}: unknown device"));
            continue;
        };
        let query = format!("interface:Ethernet{interface}@{device_id}");
        let enabled = row.get("enabled").and_then(|v| v.as_deref()).unwrap_or("No").to_string();
        let nested = nest_hyphenated_keys(row, PORT_INT_KEYS);
        let Some(node) = find_by_tag_query_mut(doc, &query) else {
            summary.missing.push(query);
            continue;
        };
        let Some(inputs) = node.get_mut("inputs").and_then(Value::as_object_mut) else {
            summary.missing.push(format!("{query}: node without inputs"));
            continue;
        };
        let adapter_key = if inputs.contains_key("spineAdapterDetails") {
            "spineAdapterDetails"
        } else {
            "adapterDetails"
        };
        let slot = inputs
            .entry(adapter_key)
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let (Value::Object(details), Value::Object(fields)) = (slot, nested) {
            details.extend(fields);
            details.remove("switch");
            details.remove("interface");
            details.insert("enabled".to_string(), Value::from(enabled));
        }
        summary.updated.push(query);
    }
    summary
}
