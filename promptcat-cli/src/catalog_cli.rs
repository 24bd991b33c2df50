//! Catalog CLI commands
//!
//! Each command loads the content tree once, then answers from the published
//! generation, the same way a host would wire the core's operations to tools.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::debug;

use promptcat_core::catalog::{CatalogService, ListFilter, LoadReport};
use promptcat_core::config::PromptcatConfig;
use promptcat_core::item::{ArgumentType, ItemStatus, RuntimeState};
use promptcat_core::CompiledItem;

/// Where to find the content tree
#[derive(Args, Debug, Clone)]
pub struct RootArgs {
    /// Content root (defaults to catalog.content_root from config, then ".")
    #[clap(long)]
    pub root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// List catalog items
    List {
        #[clap(flatten)]
        root: RootArgs,

        /// Filter by declared status (draft, stable, deprecated, legacy)
        #[clap(long)]
        status: Option<ItemStatus>,

        /// Filter by registry group
        #[clap(long)]
        group: Option<String>,

        /// Filter by tag
        #[clap(long)]
        tag: Option<String>,

        /// Filter by runtime state (active, legacy, invalid, disabled, warning)
        #[clap(long)]
        state: Option<RuntimeState>,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show one item in detail
    Show {
        /// Item id
        id: String,

        #[clap(flatten)]
        root: RootArgs,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show per-state counts
    Stats {
        #[clap(flatten)]
        root: RootArgs,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Render an item with arguments
    Render {
        /// Item id
        id: String,

        #[clap(flatten)]
        root: RootArgs,

        /// Template argument as key=value (repeatable)
        #[clap(long = "arg", value_name = "KEY=VALUE")]
        args: Vec<String>,
    },

    /// Load the tree and report every error and warning
    Validate {
        #[clap(flatten)]
        root: RootArgs,

        /// Output the load report as JSON
        #[clap(long)]
        json: bool,
    },
}

impl CatalogCommand {
    pub async fn execute(self, config: &PromptcatConfig) -> Result<()> {
        match self {
            CatalogCommand::List {
                root,
                status,
                group,
                tag,
                state,
                json,
            } => {
                let filter = ListFilter {
                    status,
                    group,
                    tag,
                    runtime_state: state,
                };
                execute_list(config, &root, &filter, json).await
            }
            CatalogCommand::Show { id, root, json } => execute_show(config, &root, &id, json).await,
            CatalogCommand::Stats { root, json } => execute_stats(config, &root, json).await,
            CatalogCommand::Render { id, root, args } => {
                execute_render(config, &root, &id, &args).await
            }
            CatalogCommand::Validate { root, json } => execute_validate(config, &root, json).await,
        }
    }
}

fn resolve_root(config: &PromptcatConfig, root: &RootArgs) -> PathBuf {
    root.root
        .clone()
        .or_else(|| config.catalog.content_root.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

async fn load_catalog(
    config: &PromptcatConfig,
    root: &RootArgs,
) -> Result<(CatalogService, LoadReport)> {
    let root = resolve_root(config, root);
    let service = CatalogService::from_config(config).context("Failed to build listing cache")?;
    let report = service
        .load(&root)
        .await
        .with_context(|| format!("Failed to load catalog from {}", root.display()))?;
    debug!(
        "Loaded generation {} with {} items",
        report.generation, report.compiled_count
    );
    Ok((service, report))
}

/// Table row for list output
#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Group")]
    group: String,
}

async fn execute_list(
    config: &PromptcatConfig,
    root: &RootArgs,
    filter: &ListFilter,
    json: bool,
) -> Result<()> {
    let (service, _) = load_catalog(config, root).await?;
    let items = service.list(filter);

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No items match.");
        return Ok(());
    }

    let rows: Vec<ItemRow> = items
        .iter()
        .map(|runtime| ItemRow {
            id: runtime.id.clone(),
            title: runtime.title.clone(),
            version: runtime.version.clone(),
            status: runtime.status.as_str().to_string(),
            state: runtime.runtime_state.as_str().to_string(),
            source: runtime.source.as_str().to_string(),
            group: runtime.group.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("Found {} items\n", items.len());
    println!("{table}");
    Ok(())
}

async fn execute_show(config: &PromptcatConfig, root: &RootArgs, id: &str, json: bool) -> Result<()> {
    let (service, _) = load_catalog(config, root).await?;
    let item = service
        .get_by_id(id)
        .ok_or_else(|| anyhow!("Item '{}' not found in catalog", id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(item.as_ref())?);
        return Ok(());
    }

    print_item(&item);
    Ok(())
}

fn print_item(item: &CompiledItem) {
    let runtime = &item.runtime;
    println!("{} ({})", runtime.title, runtime.id);
    println!("  version:  {}", runtime.version);
    println!("  status:   {}", runtime.status.as_str());
    println!("  state:    {}", runtime.runtime_state.as_str());
    println!("  source:   {}", runtime.source.as_str());
    if let Some(group) = &runtime.group {
        println!("  group:    {group}");
    }
    if !runtime.tags.is_empty() {
        println!("  tags:     {}", runtime.tags.join(", "));
    }
    if !runtime.use_cases.is_empty() {
        println!("  use cases: {}", runtime.use_cases.join(", "));
    }
    println!("  file:     {}", item.source_path.display());
    if let Some(description) = &item.definition.description {
        println!("\n{description}");
    }

    if !item.definition.arguments.is_empty() {
        println!("\nArguments:");
        for (name, spec) in &item.definition.arguments {
            let required = if spec.required { " (required)" } else { "" };
            let default = spec
                .default
                .as_ref()
                .map(|value| format!(" [default: {value}]"))
                .unwrap_or_default();
            println!(
                "  {name}: {}{required}{default}",
                spec.kind.schema_type()
            );
        }
    }
}

/// Table row for stats output
#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "State")]
    state: &'static str,
    #[tabled(rename = "Items")]
    count: usize,
}

async fn execute_stats(config: &PromptcatConfig, root: &RootArgs, json: bool) -> Result<()> {
    let (service, _) = load_catalog(config, root).await?;
    let stats = service.stats();

    if json {
        let document = serde_json::json!({
            "catalog": stats,
            "cache": service.cache_stats(),
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    let rows: Vec<StateRow> = RuntimeState::ALL
        .into_iter()
        .map(|state| StateRow {
            state: state.as_str(),
            count: stats.count(state),
        })
        .collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();

    println!("Generation {} ({} items)\n", stats.generation, stats.total);
    println!("{table}");
    Ok(())
}

async fn execute_render(
    config: &PromptcatConfig,
    root: &RootArgs,
    id: &str,
    raw_args: &[String],
) -> Result<()> {
    let (service, _) = load_catalog(config, root).await?;
    let item = service
        .get_by_id(id)
        .ok_or_else(|| anyhow!("Item '{}' not found in catalog", id))?;

    let args = parse_render_args(&item, raw_args)?;
    let output = service.render(id, &args)?;
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Turn `key=value` pairs into typed arguments using the item's declarations
fn parse_render_args(item: &CompiledItem, raw_args: &[String]) -> Result<Map<String, Value>> {
    let mut args = Map::new();
    for raw in raw_args {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("Argument '{}' must have the form key=value", raw))?;
        let kind = item
            .definition
            .arguments
            .get(key)
            .map(|spec| spec.kind)
            .unwrap_or_default();
        args.insert(key.to_string(), coerce_value(key, value, kind)?);
    }
    Ok(args)
}

fn coerce_value(key: &str, value: &str, kind: ArgumentType) -> Result<Value> {
    match kind {
        ArgumentType::String => Ok(Value::String(value.to_string())),
        ArgumentType::Number => {
            let number: Value = serde_json::from_str(value)
                .with_context(|| format!("Argument '{key}' expects a number, got '{value}'"))?;
            if !number.is_number() {
                bail!("Argument '{key}' expects a number, got '{value}'");
            }
            Ok(number)
        }
        ArgumentType::Boolean => value
            .parse::<bool>()
            .map(Value::Bool)
            .with_context(|| format!("Argument '{key}' expects true or false, got '{value}'")),
    }
}

async fn execute_validate(config: &PromptcatConfig, root: &RootArgs, json: bool) -> Result<()> {
    let (_, report) = load_catalog(config, root).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &resolve_root(config, root));
    }

    if report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(report: &LoadReport, root: &Path) {
    println!(
        "Loaded {} items from {}",
        report.compiled_count,
        root.display()
    );

    if !report.errors.is_empty() {
        println!("\nErrors ({}):", report.errors.len());
        for error in &report.errors {
            println!("  ✗ {error}");
        }
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  ! {}: {}", warning.path.display(), warning.message);
        }
    }

    if !report.has_errors() && report.warnings.is_empty() {
        println!("\n✓ No problems found");
    }
}
