//! End-to-end catalog loading against a realistic content tree

mod common;

use anyhow::Result;
use pretty_assertions::assert_eq;
use promptcat_core::catalog::{CatalogService, ListFilter};
use promptcat_core::config::{CatalogConfig, PromptcatConfig};
use promptcat_core::item::{ItemSource, ItemStatus, RuntimeState};
use promptcat_core::RenderError;
use serde_json::json;
use tempfile::TempDir;

use common::{create_content_tree, init_test_logging, write_file};

#[tokio::test]
async fn test_content_tree_classification() -> Result<()> {
    init_test_logging();
    let temp_dir = TempDir::new()?;
    create_content_tree(temp_dir.path())?;

    let service = CatalogService::new(CatalogConfig::default());
    let report = service.load(temp_dir.path()).await?;

    assert_eq!(report.generation, 1);
    assert_eq!(report.compiled_count, 4);
    assert!(report.errors.is_empty(), "errors: {:?}", report.errors);
    assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);

    let stats = service.stats();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.active, 1);
    assert_eq!(stats.disabled, 1);
    assert_eq!(stats.warning, 1);
    assert_eq!(stats.legacy, 1);
    assert_eq!(stats.invalid, 0);

    let review = service.get_by_id("code-review").expect("code-review loaded");
    assert_eq!(review.runtime.runtime_state, RuntimeState::Active);
    assert_eq!(review.runtime.source, ItemSource::Registry);
    assert_eq!(review.runtime.group.as_deref(), Some("engineering"));
    assert_eq!(review.runtime.version, "2.1.0");
    assert_eq!(review.runtime.use_cases, vec!["pull-requests"]);
    assert_eq!(
        review.argument_schema,
        json!({
            "type": "object",
            "properties": {
                "author": { "type": "string", "default": "reviewers" },
                "diff": { "type": "string" }
            },
            "required": ["diff"]
        })
    );

    let summarize = service.get_by_id("summarize").expect("summarize loaded");
    assert_eq!(summarize.runtime.runtime_state, RuntimeState::Disabled);
    assert_eq!(summarize.runtime.source, ItemSource::Registry);

    let draft = service.get_by_id("draft-idea").expect("draft loaded");
    assert_eq!(draft.runtime.runtime_state, RuntimeState::Warning);
    assert_eq!(draft.runtime.status, ItemStatus::Draft);

    let old = service.get_by_id("old-greeting").expect("legacy loaded");
    assert_eq!(old.runtime.runtime_state, RuntimeState::Legacy);
    assert_eq!(old.runtime.status, ItemStatus::Legacy);

    assert!(service.get_by_id("hidden").is_none());
    Ok(())
}

#[tokio::test]
async fn test_list_preserves_scan_order() -> Result<()> {
    let temp_dir = TempDir::new()?;
    create_content_tree(temp_dir.path())?;

    let service = CatalogService::new(CatalogConfig::default());
    service.load(temp_dir.path()).await?;

    let ids: Vec<String> = service
        .list(&ListFilter::default())
        .into_iter()
        .map(|runtime| runtime.id)
        .collect();
    assert_eq!(
        ids,
        vec!["code-review", "summarize", "draft-idea", "old-greeting"]
    );

    let engineering = service.list(&ListFilter {
        tag: Some("engineering".to_string()),
        ..ListFilter::default()
    });
    assert_eq!(engineering.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_render_through_service() -> Result<()> {
    let temp_dir = TempDir::new()?;
    create_content_tree(temp_dir.path())?;

    let service = CatalogService::new(CatalogConfig::default());
    service.load(temp_dir.path()).await?;

    let args = json!({ "diff": "+ added line" });
    let output = service.render("code-review", args.as_object().unwrap())?;
    assert_eq!(output, "Review this diff:\n+ added line\n-- reviewers");

    let err = service
        .render("code-review", json!({}).as_object().unwrap())
        .unwrap_err();
    assert!(matches!(err, RenderError::InvalidArguments { .. }));

    let err = service
        .render("summarize", json!({}).as_object().unwrap())
        .unwrap_err();
    assert!(matches!(err, RenderError::Disabled { .. }));
    Ok(())
}

#[tokio::test]
async fn test_identical_loads_produce_identical_catalogs() -> Result<()> {
    let temp_dir = TempDir::new()?;
    create_content_tree(temp_dir.path())?;

    let service = CatalogService::new(CatalogConfig::default());
    service.load(temp_dir.path()).await?;
    let first = service.list(&ListFilter::default());
    let first_stats = service.stats();

    let report = service.load(temp_dir.path()).await?;
    let second = service.list(&ListFilter::default());
    let second_stats = service.stats();

    assert_eq!(report.generation, 2);
    assert_eq!(first, second);
    assert_eq!(first_stats.total, second_stats.total);
    assert_eq!(first_stats.active, second_stats.active);
    assert_eq!(first_stats.disabled, second_stats.disabled);

    // Second load answered directory reads from the listing cache
    assert!(service.cache_stats().hits > 0);
    Ok(())
}

#[tokio::test]
async fn test_reload_picks_up_registry_changes() -> Result<()> {
    let temp_dir = TempDir::new()?;
    create_content_tree(temp_dir.path())?;

    let service = CatalogService::new(CatalogConfig::default());
    service.load(temp_dir.path()).await?;
    assert_eq!(service.stats().disabled, 1);

    write_file(
        temp_dir.path(),
        "registry.yaml",
        "entries:\n  old-greeting:\n    deprecated: true\n    visibility: private\n",
    )?;
    service.reload(temp_dir.path()).await?;

    let stats = service.stats();
    assert_eq!(stats.generation, 2);
    assert_eq!(stats.disabled, 1);
    assert_eq!(
        service.get_by_id("summarize").unwrap().runtime.runtime_state,
        RuntimeState::Active
    );
    assert_eq!(
        service.get_by_id("old-greeting").unwrap().runtime.runtime_state,
        RuntimeState::Disabled
    );
    Ok(())
}

#[tokio::test]
async fn test_service_from_config() -> Result<()> {
    let config = PromptcatConfig::from_yaml(
        "cache:\n  provider: redis\n  max_size: 99\ncatalog:\n  scan_cache_ttl_ms: 100\n  scan_cache_max_size: 16\n",
    )?;
    let service = CatalogService::from_config(&config)?;
    assert_eq!(service.cache_stats().max_size, 16);
    service.close();

    let service = CatalogService::from_config(&PromptcatConfig::default())?;
    assert_eq!(service.cache_stats().max_size, 512);
    service.close();

    let config = PromptcatConfig::from_yaml("cache:\n  provider: memcached\n")?;
    assert!(CatalogService::from_config(&config).is_err());
    Ok(())
}
