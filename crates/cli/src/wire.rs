//! Conversions between engine values and the frozen wire types.
//!
//! The protocol crate stands alone; everything that knows both sides lives
//! here.

use serde::Serialize;

use valvesheet_engine::engine::SheetEngine;
use valvesheet_engine::error::EngineError;
use valvesheet_engine::param::{ParamValue, ValueType};
use valvesheet_engine::registry::ParamSpec;
use valvesheet_engine::sheet::Sheet;
use valvesheet_protocol::{ErrorResponse, ParamInfo, WireEntry, WireValue};

pub fn wire_value(value: &ParamValue) -> WireValue {
    match value {
        ParamValue::Integer(i) => WireValue::Integer(*i),
        ParamValue::Number(n) => WireValue::Number(n.into_inner()),
        ParamValue::Text(s) => WireValue::Text(s.clone()),
    }
}

pub fn param_value(value: &WireValue) -> ParamValue {
    match value {
        WireValue::Integer(i) => ParamValue::Integer(*i),
        WireValue::Number(n) => ParamValue::number(*n),
        WireValue::Text(s) => ParamValue::text(s.clone()),
    }
}

/// Parse a raw CLI string (`key=VALUE`) against the parameter's declared type.
pub fn parse_cli_value(spec: &ParamSpec, raw: &str) -> Result<ParamValue, String> {
    match &spec.value_type {
        ValueType::Enum { allowed } => {
            // Integer-coded enums parse as integers; anything else is a text code
            if allowed.iter().any(|v| matches!(v, ParamValue::Integer(_))) {
                if let Ok(i) = raw.parse::<i64>() {
                    return Ok(ParamValue::Integer(i));
                }
            }
            Ok(ParamValue::text(raw))
        }
        ValueType::Number { .. } => raw
            .parse::<f64>()
            .map(ParamValue::number)
            .map_err(|_| format!("'{}' is not a number", raw)),
        ValueType::Text => Ok(ParamValue::text(raw)),
    }
}

/// One-shot snapshot output shape (`show`, `set`, `get --set`).
#[derive(Debug, Serialize)]
pub struct SnapshotOutput {
    pub revision: u64,
    pub values: Vec<WireEntry>,
}

pub fn snapshot_output(engine: &SheetEngine, sheet: &Sheet) -> SnapshotOutput {
    SnapshotOutput {
        revision: sheet.revision(),
        values: snapshot_entries(engine, sheet),
    }
}

pub fn snapshot_entries(engine: &SheetEngine, sheet: &Sheet) -> Vec<WireEntry> {
    engine
        .snapshot(sheet)
        .into_iter()
        .map(|(key, value)| WireEntry {
            key: key.as_str().to_string(),
            value: wire_value(&value),
        })
        .collect()
}

pub fn param_info(spec: &ParamSpec) -> ParamInfo {
    ParamInfo {
        key: spec.key.as_str().to_string(),
        label: spec.label.to_string(),
        unit: spec.unit.map(str::to_string),
        role: spec.role.as_str().to_string(),
        value_type: spec.value_type.name().to_string(),
        allowed: match &spec.value_type {
            ValueType::Enum { allowed } => Some(allowed.iter().map(wire_value).collect()),
            _ => None,
        },
        dependencies: spec
            .dependencies
            .iter()
            .map(|k| k.as_str().to_string())
            .collect(),
    }
}

pub fn error_response(id: String, err: &EngineError) -> ErrorResponse {
    ErrorResponse {
        id,
        kind: err.kind().to_string(),
        key: err.key().to_string(),
        message: err.to_string(),
    }
}
