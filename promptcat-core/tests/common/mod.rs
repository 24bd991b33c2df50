//! Test helper functions for integration tests
//!
//! Shared across test files using the tests/common/ pattern.

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::Once;

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Write a file relative to `root`, creating parent directories
pub fn write_file(root: &Path, relative: &str, content: &str) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Document with a complete metadata block
pub fn active_document(id: &str, template: &str) -> String {
    format!(
        r#"id: {id}
title: {id} title
template: {template:?}
metadata:
  id: {id}
  title: {id} title
  version: 1.0.0
  status: stable
  tags: [integration]
"#
    )
}

/// Document without any metadata block
pub fn legacy_document(id: &str, template: &str) -> String {
    format!("id: {id}\ntitle: {id} title\ntemplate: {template:?}\n")
}

/// A small content tree exercising every classification
pub fn create_content_tree(root: &Path) -> Result<()> {
    write_file(root, "partials/signature.j2", "-- {{ author }}")?;
    write_file(
        root,
        "engineering/code-review.yaml",
        r#"id: code-review
title: Code Review
description: Review a diff
arguments:
  diff:
    type: string
    required: true
  author:
    type: string
    default: reviewers
template: "Review this diff:\n{{ diff }}\n{% include 'signature' %}"
metadata:
  id: code-review
  title: Code Review
  version: 2.1.0
  status: stable
  tags: [review, engineering]
  use_cases: [pull-requests]
  dependencies:
    partials: [signature]
"#,
    )?;
    write_file(
        root,
        "engineering/summarize.yaml",
        &active_document("summarize", "Summarize: {{ text }}"),
    )?;
    write_file(
        root,
        "misc/draft.json",
        r#"{
  "id": "draft-idea",
  "template": "Idea",
  "metadata": {"id": "draft-idea", "title": "Draft", "version": "0.1", "status": "draft"}
}"#,
    )?;
    write_file(root, "misc/old.yml", &legacy_document("old-greeting", "Hello"))?;
    write_file(
        root,
        "registry.yaml",
        "entries:\n  summarize:\n    deprecated: true\n  code-review:\n    group: engineering\n",
    )?;
    write_file(root, ".drafts/hidden.yaml", &active_document("hidden", "x"))?;
    Ok(())
}
