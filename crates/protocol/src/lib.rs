//! Valve Sheet Compute Protocol — v1 Frozen Wire Format
//!
//! This crate defines the canonical request/response types between a sheet
//! client (CLI, UI) and a compute service (the local engine today, a remote
//! service later). The wire format is JSONL (newline-delimited JSON).
//!
//! # Protocol Version
//!
//! This is **protocol v1** — the wire format is frozen. Changes require:
//! 1. Version bump in PROTOCOL_VERSION
//! 2. New golden vectors in `crates/cli/tests/protocol_golden/`
//! 3. Backward compatibility handling
//!
//! This crate deliberately has no engine dependency: the contract must stand
//! alone so a remote service can implement it without linking the engine.
//!
//! # Usage
//!
//! ```ignore
//! use valvesheet_protocol::{Request, Response, PROTOCOL_VERSION};
//!
//! let req = Request::Get(GetRequest { id: "1".into(), key: "face_to_face".into() });
//! let json = serde_json::to_string(&req)?;
//!
//! let resp: Response = serde_json::from_str(&line)?;
//! ```

use serde::{Deserialize, Serialize};

/// Current protocol version. Increment for breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

// =============================================================================
// Wire Values
// =============================================================================

/// A self-contained parameter value on the wire.
///
/// Integers and numbers are distinct: enum codes like pressure classes are
/// integers, physical quantities are numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

/// One `key → value` pair of a sheet snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEntry {
    pub key: String,
    pub value: WireValue,
}

// =============================================================================
// Client → Service Requests
// =============================================================================

/// Requests sent from a client to the compute service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    CreateSheet(CreateSheetRequest),
    SetInput(SetInputRequest),
    Get(GetRequest),
    Snapshot(SnapshotRequest),
    Params(ParamsRequest),
}

/// Reset the session's sheet to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSheetRequest {
    pub id: String,
}

/// Write one input parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetInputRequest {
    pub id: String,
    pub key: String,
    pub value: WireValue,
}

/// Read one parameter value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRequest {
    pub id: String,
    pub key: String,
}

/// Read the full sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRequest {
    pub id: String,
}

/// List the registered parameters and their constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsRequest {
    pub id: String,
}

// =============================================================================
// Service → Client Responses
// =============================================================================

/// Responses sent from the compute service to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Sheet(SheetResponse),
    Value(ValueResponse),
    Params(ParamsResponse),
    Error(ErrorResponse),
}

/// Full sheet snapshot, in display order.
///
/// A successful write responds with this: the updated full snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetResponse {
    pub id: String,
    pub revision: u64,
    pub values: Vec<WireEntry>,
}

/// A single parameter value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueResponse {
    pub id: String,
    pub key: String,
    pub value: WireValue,
}

/// Parameter listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsResponse {
    pub id: String,
    pub params: Vec<ParamInfo>,
}

/// Declaration of one parameter, as clients need it for rendering and
/// input widgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamInfo {
    pub key: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// `input` or `computed`.
    pub role: String,
    /// `enum`, `number`, or `text`.
    pub value_type: String,
    /// Allowed values for `enum` parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<WireValue>>,
    /// Keys this parameter is derived from. Empty for inputs.
    pub dependencies: Vec<String>,
}

/// Structured error: `{kind, key, message}` plus the request id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub id: String,
    /// Stable code: `validation`, `role`, `unknown_parameter`, `lookup`,
    /// `computation`, or the wire-level `malformed_request`.
    pub kind: String,
    /// The offending parameter key; empty for wire-level errors.
    pub key: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_tags() {
        let req = Request::SetInput(SetInputRequest {
            id: "req-1".into(),
            key: "pressure_class".into(),
            value: WireValue::Integer(300),
        });
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(
            json,
            r#"{"type":"set_input","id":"req-1","key":"pressure_class","value":300}"#
        );
    }

    #[test]
    fn test_wire_value_shapes() {
        assert_eq!(
            serde_json::to_string(&WireValue::Integer(600)).unwrap(),
            "600"
        );
        assert_eq!(
            serde_json::to_string(&WireValue::Number(295.0)).unwrap(),
            "295.0"
        );
        assert_eq!(
            serde_json::to_string(&WireValue::Text("2in".into())).unwrap(),
            "\"2in\""
        );

        // Integers stay integers through a round trip; floats stay floats
        let v: WireValue = serde_json::from_str("600").unwrap();
        assert_eq!(v, WireValue::Integer(600));
        let v: WireValue = serde_json::from_str("295.0").unwrap();
        assert_eq!(v, WireValue::Number(295.0));
        let v: WireValue = serde_json::from_str("\"2in\"").unwrap();
        assert_eq!(v, WireValue::Text("2in".into()));
    }

    #[test]
    fn test_error_response_shape() {
        let resp = Response::Error(ErrorResponse {
            id: "req-9".into(),
            kind: "validation".into(),
            key: "pressure_class".into(),
            message: "value 999 is not in the allowed set".into(),
        });
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(
            json,
            r#"{"type":"error","id":"req-9","kind":"validation","key":"pressure_class","message":"value 999 is not in the allowed set"}"#
        );
    }

    #[test]
    fn test_sheet_response_round_trip() {
        let resp = Response::Sheet(SheetResponse {
            id: "req-2".into(),
            revision: 1,
            values: vec![
                WireEntry {
                    key: "pressure_class".into(),
                    value: WireValue::Integer(300),
                },
                WireEntry {
                    key: "face_to_face".into(),
                    value: WireValue::Number(216.0),
                },
            ],
        });
        let json = serde_json::to_string(&resp).unwrap();
        let back: Response = serde_json::from_str(&json).unwrap();
        match back {
            Response::Sheet(sheet) => {
                assert_eq!(sheet.revision, 1);
                assert_eq!(sheet.values.len(), 2);
                assert_eq!(sheet.values[1].value, WireValue::Number(216.0));
            }
            other => panic!("expected sheet response, got {:?}", other),
        }
    }

    #[test]
    fn test_param_info_optional_fields_are_omitted() {
        let info = ParamInfo {
            key: "flange_ends".into(),
            label: "Flange Ends".into(),
            unit: None,
            role: "input".into(),
            value_type: "text".into(),
            allowed: None,
            dependencies: vec![],
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("unit"));
        assert!(!json.contains("allowed"));
        assert!(json.contains("\"dependencies\":[]"));
    }
}
