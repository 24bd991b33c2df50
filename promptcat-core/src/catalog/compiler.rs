//! Template compilation and argument schemas
//!
//! Every generation gets its own template environment. Partials are added
//! first under their file stem, so item templates can `{% include "header" %}`
//! them; items are added under `items/<id>`. Once every template is in, the
//! environment is frozen behind an `Arc` and shared by the generation's items.

use jsonschema::JSONSchema;
use minijinja::Environment;
use serde::ser::SerializeStruct;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::trace;

use crate::error::RenderError;
use crate::item::{ArgumentSpec, ItemDefinition, ItemRuntime};

/// Environment name for an item's template
pub fn item_template_name(id: &str) -> String {
    format!("items/{id}")
}

/// Build the JSON Schema object describing an item's arguments
///
/// Arguments marked `required` are listed as required unless they carry a
/// default, since defaults are applied before validation.
pub fn build_argument_schema(arguments: &BTreeMap<String, ArgumentSpec>) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for (name, spec) in arguments {
        let mut property = Map::new();
        property.insert("type".to_string(), json!(spec.kind.schema_type()));
        if let Some(description) = &spec.description {
            property.insert("description".to_string(), json!(description));
        }
        if let Some(default) = &spec.default {
            property.insert("default".to_string(), default.clone());
        }
        properties.insert(name.clone(), Value::Object(property));

        if spec.required && spec.default.is_none() {
            required.push(json!(name));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Compile an argument schema into a validator
pub(crate) fn compile_schema(schema: &Value) -> Result<JSONSchema, String> {
    JSONSchema::compile(schema).map_err(|e| e.to_string())
}

/// Collects templates for one generation before it is frozen
pub(crate) struct TemplateSetBuilder {
    env: Environment<'static>,
    partials: HashSet<String>,
}

impl TemplateSetBuilder {
    pub(crate) fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        Self {
            env,
            partials: HashSet::new(),
        }
    }

    pub(crate) fn has_partial(&self, name: &str) -> bool {
        self.partials.contains(name)
    }

    pub(crate) fn add_partial(&mut self, name: &str, source: String) -> Result<(), minijinja::Error> {
        self.env.add_template_owned(name.to_string(), source)?;
        self.partials.insert(name.to_string());
        trace!("Registered partial '{}'", name);
        Ok(())
    }

    /// Compile an item template, returning its environment name
    pub(crate) fn add_item(&mut self, id: &str, source: String) -> Result<String, minijinja::Error> {
        let name = item_template_name(id);
        self.env.add_template_owned(name.clone(), source)?;
        Ok(name)
    }

    pub(crate) fn finish(self) -> Arc<Environment<'static>> {
        Arc::new(self.env)
    }
}

/// A fully built, renderable catalog item
pub struct CompiledItem {
    pub definition: ItemDefinition,
    pub runtime: ItemRuntime,
    /// JSON Schema for the item's arguments
    pub argument_schema: Value,
    pub source_path: PathBuf,
    env: Arc<Environment<'static>>,
    template_name: String,
    validator: JSONSchema,
}

impl CompiledItem {
    pub(crate) fn new(
        definition: ItemDefinition,
        runtime: ItemRuntime,
        argument_schema: Value,
        validator: JSONSchema,
        source_path: PathBuf,
        env: Arc<Environment<'static>>,
        template_name: String,
    ) -> Self {
        Self {
            definition,
            runtime,
            argument_schema,
            source_path,
            env,
            template_name,
            validator,
        }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Render with caller arguments
    ///
    /// Defaults fill in missing arguments, then the result is validated
    /// against the argument schema before the template runs.
    pub fn render(&self, args: &Map<String, Value>) -> Result<String, RenderError> {
        let mut context = args.clone();
        for (name, spec) in &self.definition.arguments {
            if let Some(default) = &spec.default {
                context
                    .entry(name.clone())
                    .or_insert_with(|| default.clone());
            }
        }

        let instance = Value::Object(context);
        if let Err(errors) = self.validator.validate(&instance) {
            let details = errors.map(|err| err.to_string()).collect::<Vec<_>>();
            return Err(RenderError::InvalidArguments {
                id: self.id().to_string(),
                details,
            });
        }

        let template = self
            .env
            .get_template(&self.template_name)
            .map_err(|source| RenderError::Template {
                id: self.id().to_string(),
                source,
            })?;
        template
            .render(&instance)
            .map_err(|source| RenderError::Template {
                id: self.id().to_string(),
                source,
            })
    }
}

impl std::fmt::Debug for CompiledItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledItem")
            .field("id", &self.definition.id)
            .field("runtime_state", &self.runtime.runtime_state)
            .field("template_name", &self.template_name)
            .field("source_path", &self.source_path)
            .finish_non_exhaustive()
    }
}

impl Serialize for CompiledItem {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CompiledItem", 4)?;
        state.serialize_field("definition", &self.definition)?;
        state.serialize_field("runtime", &self.runtime)?;
        state.serialize_field("argument_schema", &self.argument_schema)?;
        state.serialize_field("source_path", &self.source_path)?;
        state.end()
    }
}
