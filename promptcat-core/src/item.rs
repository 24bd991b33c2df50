//! Item data model shared by the validator, registry merger and catalog

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Declared type of a template argument
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    #[default]
    String,
    Number,
    Boolean,
}

impl ArgumentType {
    /// JSON Schema type keyword
    pub fn schema_type(&self) -> &'static str {
        match self {
            ArgumentType::String => "string",
            ArgumentType::Number => "number",
            ArgumentType::Boolean => "boolean",
        }
    }
}

/// One named template argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    #[serde(rename = "type", default)]
    pub kind: ArgumentType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default)]
    pub required: bool,
}

/// A template source unit, parsed fresh on every scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDefinition {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub arguments: BTreeMap<String, ArgumentSpec>,
    pub template: String,
}

/// Lifecycle status declared by an item (or assigned to legacy items)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Draft,
    Stable,
    Deprecated,
    Legacy,
}

impl ItemStatus {
    /// Parse a status an item may declare for itself; `legacy` is assigned,
    /// never declared.
    pub fn parse_declared(raw: &str) -> Option<Self> {
        match raw {
            "draft" => Some(ItemStatus::Draft),
            "stable" => Some(ItemStatus::Stable),
            "deprecated" => Some(ItemStatus::Deprecated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Draft => "draft",
            ItemStatus::Stable => "stable",
            ItemStatus::Deprecated => "deprecated",
            ItemStatus::Legacy => "legacy",
        }
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "legacy" => Ok(ItemStatus::Legacy),
            other => Self::parse_declared(other).ok_or_else(|| format!("unknown status '{raw}'")),
        }
    }
}

/// Operational classification of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeState {
    Active,
    Legacy,
    Invalid,
    Disabled,
    Warning,
}

impl RuntimeState {
    pub const ALL: [RuntimeState; 5] = [
        RuntimeState::Active,
        RuntimeState::Legacy,
        RuntimeState::Invalid,
        RuntimeState::Disabled,
        RuntimeState::Warning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeState::Active => "active",
            RuntimeState::Legacy => "legacy",
            RuntimeState::Invalid => "invalid",
            RuntimeState::Disabled => "disabled",
            RuntimeState::Warning => "warning",
        }
    }
}

impl std::str::FromStr for RuntimeState {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        RuntimeState::ALL
            .into_iter()
            .find(|state| state.as_str() == raw)
            .ok_or_else(|| format!("unknown runtime state '{raw}'"))
    }
}

/// Where the effective classification came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSource {
    Embedded,
    Registry,
    Legacy,
}

impl ItemSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemSource::Embedded => "embedded",
            ItemSource::Registry => "registry",
            ItemSource::Legacy => "legacy",
        }
    }
}

/// Registry-controlled visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Internal,
}

/// Externally visible classification of one item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRuntime {
    pub id: String,
    pub title: String,
    pub version: String,
    pub status: ItemStatus,
    pub tags: Vec<String>,
    pub use_cases: Vec<String>,
    pub runtime_state: RuntimeState,
    pub source: ItemSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}
