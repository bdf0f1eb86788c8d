//! Search-result Bundle, adapted from the FHIR `Bundle` wire shape. Carries
//! `search.mode` so `_include` results can be told apart from direct matches.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    Searchset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Match,
    Include,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleEntrySearch {
    pub mode: SearchMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleEntry {
    pub resource: Value,
    pub search: BundleEntrySearch,
}

impl BundleEntry {
    pub fn matched(resource: Value) -> Self {
        Self {
            resource,
            search: BundleEntrySearch {
                mode: SearchMode::Match,
            },
        }
    }

    pub fn included(resource: Value) -> Self {
        Self {
            resource,
            search: BundleEntrySearch {
                mode: SearchMode::Include,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    #[serde(default = "default_resource_type")]
    pub resource_type: String,
    #[serde(rename = "type")]
    pub bundle_type: BundleType,
    pub total: usize,
    pub entry: Vec<BundleEntry>,
}

fn default_resource_type() -> String {
    "Bundle".to_string()
}

impl Bundle {
    pub fn searchset(entries: Vec<BundleEntry>) -> Self {
        let total = entries.iter().filter(|e| e.search.mode == SearchMode::Match).count();
        Self {
            resource_type: default_resource_type(),
            bundle_type: BundleType::Searchset,
            total,
            entry: entries,
        }
    }
}
