//! Static tool registry.
//!
//! The set of tools is closed: every tool is a [`ToolId`] variant, so every registered tool has a
//! backend route by construction. A tools file may override the description and input schema of
//! known tools, but cannot introduce new ones.

use crate::error::{BridgeError, Result};
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Identifier of a tool the bridge knows how to forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    RetrieveAppointment,
    ModifyAppointment,
}

impl ToolId {
    /// All known tools, in listing order.
    pub const ALL: [Self; 2] = [Self::RetrieveAppointment, Self::ModifyAppointment];

    /// Wire name of the tool (also the last segment of its backend route).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::RetrieveAppointment => "retrieveAppointment",
            Self::ModifyAppointment => "modifyAppointment",
        }
    }

    fn default_description(self) -> &'static str {
        match self {
            Self::RetrieveAppointment => "Retrieve appointment by id",
            Self::ModifyAppointment => "Modify appointment date/time",
        }
    }

    fn default_input_schema(self) -> Value {
        match self {
            Self::RetrieveAppointment => json!({
                "$schema": "http://json-schema.org/draft-07/schema#",
                "type": "object",
                "properties": {
                    "appointmentId": { "type": "string" }
                },
                "required": ["appointmentId"]
            }),
            Self::ModifyAppointment => json!({
                "$schema": "http://json-schema.org/draft-07/schema#",
                "type": "object",
                "properties": {
                    "appointmentId": { "type": "string" },
                    "appointmentDate": { "type": "string" },
                    "appointmentTime": { "type": "string" }
                },
                "required": ["appointmentId", "appointmentDate", "appointmentTime"]
            }),
        }
    }
}

impl FromStr for ToolId {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| BridgeError::UnknownTool(s.to_string()))
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Public description of a tool, as returned by `GET /tools`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    #[serde(skip)]
    pub id: ToolId,
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDescriptor {
    fn builtin(id: ToolId) -> Self {
        Self {
            id,
            name: id.name().to_string(),
            description: id.default_description().to_string(),
            input_schema: id.default_input_schema(),
        }
    }
}

/// Immutable mapping from tool name to descriptor.
///
/// Serializes as a JSON object keyed by tool name, preserving [`ToolId::ALL`] order.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

/// On-disk descriptor overrides (YAML or JSON).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ToolsFile {
    #[serde(default)]
    pub tools: HashMap<String, ToolOverride>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ToolOverride {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Option<Value>,
}

impl ToolRegistry {
    /// Registry containing every known tool with its built-in descriptor.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            tools: ToolId::ALL.into_iter().map(ToolDescriptor::builtin).collect(),
        }
    }

    /// Build the registry from built-ins plus overrides.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedTool` if an override names a tool with no backend route, and `Config`
    /// if an override is inconsistent (mismatched inner name, non-object schema).
    pub fn with_overrides(file: ToolsFile) -> Result<Self> {
        let mut registry = Self::builtin();

        for (key, ov) in file.tools {
            let Ok(id) = key.parse::<ToolId>() else {
                return Err(BridgeError::UnsupportedTool(key));
            };
            if let Some(name) = ov.name.as_deref()
                && name != key
            {
                return Err(BridgeError::Config(format!(
                    "tool entry '{key}' declares mismatched name '{name}'"
                )));
            }

            let Some(desc) = registry.tools.iter_mut().find(|t| t.id == id) else {
                continue;
            };
            if let Some(description) = ov.description {
                desc.description = description;
            }
            if let Some(schema) = ov.input_schema {
                if !schema.is_object() {
                    return Err(BridgeError::Config(format!(
                        "inputSchema for tool '{key}' must be an object"
                    )));
                }
                desc.input_schema = schema;
            }
        }

        Ok(registry)
    }

    /// Load a tools file (YAML or JSON) and apply it over the built-ins.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it fails
    /// [`ToolRegistry::with_overrides`] validation.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("failed to read tools file {}: {e}", path.display()))
        })?;
        let file: ToolsFile = serde_yaml::from_str(&raw)?;
        Self::with_overrides(file)
    }

    /// Entire registry, unfiltered.
    #[must_use]
    pub fn list_tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }
}

impl Serialize for ToolRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tools.len()))?;
        for t in &self.tools {
            map.serialize_entry(&t.name, t)?;
        }
        map.end()
    }
}
