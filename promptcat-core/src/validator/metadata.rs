//! Metadata block classification

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::LEGACY_VERSION;
use crate::item::{ItemRuntime, ItemSource, ItemStatus, RuntimeState};

static SEMVER_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("semver pattern compiles"));

/// Whether a version string has the `major.minor.patch` shape
pub fn is_semver_shaped(version: &str) -> bool {
    SEMVER_SHAPE.is_match(version)
}

/// Result of judging one metadata block
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataClassification {
    pub runtime: ItemRuntime,
    pub declared_partials: Vec<String>,
    pub issues: Vec<String>,
}

/// Classify an item from its metadata block alone
///
/// `item_id` and `item_title` come from the document itself and fill in
/// whatever the metadata does not provide.
pub fn classify_metadata(
    item_id: &str,
    item_title: &str,
    metadata: Option<&Value>,
) -> MetadataClassification {
    let Some(block) = metadata.filter(|value| !value.is_null()) else {
        return legacy(item_id, item_title);
    };

    let Some(fields) = block.as_object() else {
        return MetadataClassification {
            runtime: embedded(
                item_id,
                item_title.to_string(),
                LEGACY_VERSION.to_string(),
                ItemStatus::Draft,
                Vec::new(),
                Vec::new(),
                RuntimeState::Warning,
            ),
            declared_partials: Vec::new(),
            issues: vec!["metadata must be a mapping".to_string()],
        };
    };

    if !fields.contains_key("version") && !fields.contains_key("status") {
        return legacy(item_id, item_title);
    }

    let mut issues = Vec::new();

    let declared_id = string_field(fields, "id", &mut issues);
    let declared_title = string_field(fields, "title", &mut issues);
    let version = string_field(fields, "version", &mut issues);
    let status_raw = string_field(fields, "status", &mut issues);
    let tags = string_list(fields.get("tags"), "tags", &mut issues);
    let use_cases = string_list(fields.get("use_cases"), "use_cases", &mut issues);
    let declared_partials = dependency_partials(fields, &mut issues);

    for (name, present) in [
        ("id", declared_id.is_some()),
        ("title", declared_title.is_some()),
        ("version", version.is_some()),
        ("status", status_raw.is_some()),
    ] {
        if !present && fields.get(name).map_or(true, Value::is_null) {
            issues.push(format!("metadata is missing '{name}'"));
        }
    }

    if let Some(version) = version.as_deref() {
        if !is_semver_shaped(version) {
            issues.push(format!(
                "version '{version}' is not semantic versioning (expected e.g. 1.0.0)"
            ));
        }
    }

    let status = match status_raw.as_deref() {
        Some(raw) => ItemStatus::parse_declared(raw).unwrap_or_else(|| {
            issues.push(format!(
                "status '{raw}' is not one of draft, stable, deprecated"
            ));
            ItemStatus::Draft
        }),
        None => ItemStatus::Draft,
    };

    let id_mismatch = declared_id
        .as_deref()
        .is_some_and(|declared| declared != item_id);
    if let Some(declared) = declared_id.as_deref().filter(|_| id_mismatch) {
        issues.push(format!(
            "metadata id '{declared}' does not match document id '{item_id}'"
        ));
    }

    let runtime_state = if id_mismatch {
        RuntimeState::Invalid
    } else if issues.is_empty() {
        RuntimeState::Active
    } else {
        RuntimeState::Warning
    };

    MetadataClassification {
        runtime: embedded(
            item_id,
            declared_title.unwrap_or_else(|| item_title.to_string()),
            version.unwrap_or_else(|| LEGACY_VERSION.to_string()),
            status,
            tags,
            use_cases,
            runtime_state,
        ),
        declared_partials,
        issues,
    }
}

fn legacy(item_id: &str, item_title: &str) -> MetadataClassification {
    MetadataClassification {
        runtime: ItemRuntime {
            id: item_id.to_string(),
            title: item_title.to_string(),
            version: LEGACY_VERSION.to_string(),
            status: ItemStatus::Legacy,
            tags: Vec::new(),
            use_cases: Vec::new(),
            runtime_state: RuntimeState::Legacy,
            source: ItemSource::Legacy,
            group: None,
            visibility: None,
        },
        declared_partials: Vec::new(),
        issues: Vec::new(),
    }
}

fn embedded(
    item_id: &str,
    title: String,
    version: String,
    status: ItemStatus,
    tags: Vec<String>,
    use_cases: Vec<String>,
    runtime_state: RuntimeState,
) -> ItemRuntime {
    ItemRuntime {
        id: item_id.to_string(),
        title,
        version,
        status,
        tags,
        use_cases,
        runtime_state,
        source: ItemSource::Embedded,
        group: None,
        visibility: None,
    }
}

fn string_field(fields: &Map<String, Value>, name: &str, issues: &mut Vec<String>) -> Option<String> {
    match fields.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(value)) if !value.trim().is_empty() => Some(value.clone()),
        Some(Value::String(_)) => {
            issues.push(format!("'{name}' must not be empty"));
            None
        }
        Some(_) => {
            issues.push(format!("'{name}' must be a string"));
            None
        }
    }
}

/// Parse an ordered list of strings, keeping the well-formed members
fn string_list(value: Option<&Value>, name: &str, issues: &mut Vec<String>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let strings: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect();
            if strings.len() != items.len() {
                issues.push(format!("'{name}' must only contain strings"));
            }
            strings
        }
        Some(_) => {
            issues.push(format!("'{name}' must be a list"));
            Vec::new()
        }
    }
}

fn dependency_partials(fields: &Map<String, Value>, issues: &mut Vec<String>) -> Vec<String> {
    match fields.get("dependencies") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Object(dependencies)) => {
            string_list(dependencies.get("partials"), "dependencies.partials", issues)
        }
        Some(_) => {
            issues.push("'dependencies' must be a mapping".to_string());
            Vec::new()
        }
    }
}
