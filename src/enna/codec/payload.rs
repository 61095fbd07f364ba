//! The versioned document stored in the cache block
//!
//! ```json
//! {
//!   "version": "2.0.0",
//!   "table_data": {
//!     "scripts_table": {"column_names": ["Script Names"], "data": [["case.{script_index:0>3}"]]},
//!     "vars_table": {"column_names": ["x"], "data": [["1"], ["2"]]},
//!     "vals_table": {"column_names": ["name"], "data": [["'World'"]]}
//!   },
//!   "modules": [{"name": "helpers", "source": "pi = 3.14159"}],
//!   "settings": {"output_dir": "Scripts", "script_extension": ".py"}
//! }
//! ```
//!
//! Only a payload whose `version` is [`PAYLOAD_VERSION`] is trusted. Anything else (foreign
//! version, missing version, undecodable block, malformed JSON) loads as an empty payload:
//! cache corruption loses data but never fails a load.

use super::{decode, embed, CodecError};
use crate::enna::parsing::CacheRegion;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PAYLOAD_VERSION: &str = "2.0.0";

/// A table as column names plus row-major string cells
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    pub column_names: Vec<String>,
    pub data: Vec<Vec<String>>,
}

/// A named block of statements executed before rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub name: String,
    pub source: String,
}

/// Per-scenario render settings; unset fields fall back to configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_extension: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePayload {
    pub version: String,
    #[serde(default)]
    pub table_data: BTreeMap<String, TableData>,
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
    #[serde(default)]
    pub settings: Settings,
}

impl Default for CachePayload {
    fn default() -> Self {
        Self {
            version: PAYLOAD_VERSION.to_string(),
            table_data: BTreeMap::new(),
            modules: Vec::new(),
            settings: Settings::default(),
        }
    }
}

impl CachePayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a decoded payload; `None` for malformed JSON or an untrusted version
    pub fn from_json(bytes: &[u8]) -> Option<Self> {
        let value: serde_json::Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(err) => {
                warn!("cache payload is not valid JSON, ignoring it: {}", err);
                return None;
            }
        };

        match value.get("version").and_then(|v| v.as_str()) {
            Some(PAYLOAD_VERSION) => {}
            other => {
                warn!("ignoring cache payload with version {:?}", other);
                return None;
            }
        }

        match serde_json::from_value(value) {
            Ok(payload) => Some(payload),
            Err(err) => {
                warn!("cache payload has an unexpected shape, ignoring it: {}", err);
                None
            }
        }
    }

    /// The payload stored in `source`, or an empty one when it cannot be trusted
    pub fn load(source: &[u8], region: &CacheRegion) -> Self {
        if !region.found {
            return Self::default();
        }
        let decoded = match decode(&embed::read_payload(source, region)) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!("cache block could not be decoded, starting empty: {}", err);
                return Self::default();
            }
        };
        Self::from_json(&decoded).unwrap_or_default()
    }

    /// `source` with its cache block replaced by this payload
    pub fn store(
        &self,
        source: &[u8],
        region: &CacheRegion,
        width: usize,
    ) -> Result<Vec<u8>, CodecError> {
        Ok(embed::rewrite(source, region, &self.to_json()?, width))
    }

    pub fn table(&self, name: &str) -> Option<&TableData> {
        self.table_data.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enna::parsing::parse;

    fn sample() -> CachePayload {
        let mut payload = CachePayload::new();
        payload.table_data.insert(
            "vars_table".to_string(),
            TableData {
                column_names: vec!["x".to_string()],
                data: vec![vec!["1".to_string()], vec!["2".to_string()]],
            },
        );
        payload.modules.push(ModuleEntry {
            name: "helpers".to_string(),
            source: "k = 2".to_string(),
        });
        payload
    }

    #[test]
    fn test_store_and_load() {
        let source = b"$$ var_x $$\n";
        let stored = sample().store(source, &parse(source).cache, 126).unwrap();
        let loaded = CachePayload::load(&stored, &parse(&stored).cache);
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_json_is_stable() {
        let json = String::from_utf8(sample().to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"version":"2.0.0","table_data":{"vars_table":{"column_names":["x"],"data":[["1"],["2"]]}},"modules":[{"name":"helpers","source":"k = 2"}],"settings":{}}"#
        );
    }

    #[test]
    fn test_unknown_version_is_absent() {
        assert_eq!(CachePayload::from_json(br#"{"version":"1.0.0"}"#), None);
        assert_eq!(CachePayload::from_json(br#"{"table_data":{}}"#), None);
        assert_eq!(CachePayload::from_json(b"not json"), None);
    }

    #[test]
    fn test_minimal_payload() {
        let payload = CachePayload::from_json(br#"{"version":"2.0.0"}"#).unwrap();
        assert!(payload.table_data.is_empty());
        assert!(payload.modules.is_empty());
    }

    #[test]
    fn test_corrupted_block_loads_empty() {
        let source = b"R'''\n$$$\n!!!!\n$$$\n'''\n";
        let result = parse(source);
        assert!(result.cache.found);
        assert_eq!(CachePayload::load(source, &result.cache), CachePayload::default());
    }
}
