//! An immutable, fully built catalog snapshot

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use super::compiler::CompiledItem;
use super::query::CatalogStats;

/// One published catalog: items in scan order, an id index and counts
#[derive(Debug)]
pub struct Generation {
    number: u64,
    items: Vec<Arc<CompiledItem>>,
    index: HashMap<String, usize>,
    stats: CatalogStats,
    built_at: DateTime<Utc>,
}

impl Generation {
    /// Generation 0, published before the first load
    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    /// Build a generation; when ids repeat, the first item keeps the id
    pub(crate) fn new(number: u64, candidates: Vec<Arc<CompiledItem>>) -> Self {
        let mut items = Vec::with_capacity(candidates.len());
        let mut index = HashMap::with_capacity(candidates.len());
        for item in candidates {
            if index.contains_key(item.id()) {
                continue;
            }
            index.insert(item.id().to_string(), items.len());
            items.push(item);
        }

        let stats = CatalogStats::tally(number, items.iter().map(|item| &item.runtime));
        Self {
            number,
            items,
            index,
            stats,
            built_at: Utc::now(),
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn get(&self, id: &str) -> Option<&Arc<CompiledItem>> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    /// Items in scan order
    pub fn items(&self) -> impl Iterator<Item = &Arc<CompiledItem>> {
        self.items.iter()
    }

    pub fn stats(&self) -> CatalogStats {
        self.stats
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::empty()
    }
}
