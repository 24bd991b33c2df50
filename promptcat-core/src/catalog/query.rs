//! Query-side types: list filters and aggregate counts

use serde::{Deserialize, Serialize};

use crate::item::{ItemRuntime, ItemStatus, RuntimeState};

/// Filter for [`super::CatalogService::list`]; every set field must match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListFilter {
    #[serde(default)]
    pub status: Option<ItemStatus>,
    #[serde(default)]
    pub group: Option<String>,
    /// Matches when the item carries this tag
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub runtime_state: Option<RuntimeState>,
}

impl ListFilter {
    pub fn matches(&self, runtime: &ItemRuntime) -> bool {
        self.status.map_or(true, |status| runtime.status == status)
            && self
                .group
                .as_deref()
                .map_or(true, |group| runtime.group.as_deref() == Some(group))
            && self
                .tag
                .as_deref()
                .map_or(true, |tag| runtime.tags.iter().any(|t| t == tag))
            && self
                .runtime_state
                .map_or(true, |state| runtime.runtime_state == state)
    }
}

/// Per-state counts over one generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub generation: u64,
    pub total: usize,
    pub active: usize,
    pub legacy: usize,
    pub invalid: usize,
    pub disabled: usize,
    pub warning: usize,
}

impl CatalogStats {
    pub(crate) fn tally<'a>(
        generation: u64,
        runtimes: impl IntoIterator<Item = &'a ItemRuntime>,
    ) -> Self {
        let mut stats = CatalogStats {
            generation,
            ..CatalogStats::default()
        };
        for runtime in runtimes {
            stats.total += 1;
            match runtime.runtime_state {
                RuntimeState::Active => stats.active += 1,
                RuntimeState::Legacy => stats.legacy += 1,
                RuntimeState::Invalid => stats.invalid += 1,
                RuntimeState::Disabled => stats.disabled += 1,
                RuntimeState::Warning => stats.warning += 1,
            }
        }
        stats
    }

    pub fn count(&self, state: RuntimeState) -> usize {
        match state {
            RuntimeState::Active => self.active,
            RuntimeState::Legacy => self.legacy,
            RuntimeState::Invalid => self.invalid,
            RuntimeState::Disabled => self.disabled,
            RuntimeState::Warning => self.warning,
        }
    }
}
