//! `versions/baseline.json` of a registry checkout

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BaselineEntry {
    pub baseline: String,
    #[serde(default)]
    pub port_version: u32,
}

/// Port versions at a baseline commit, keyed by port name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineDatabase {
    #[serde(default)]
    pub default: BTreeMap<String, BaselineEntry>,
}

impl BaselineDatabase {
    pub fn get(&self, port: &str) -> Option<&BaselineEntry> {
        self.default.get(port)
    }

    pub fn insert(&mut self, port: impl Into<String>, version: impl Into<String>) {
        self.default.insert(
            port.into(),
            BaselineEntry {
                baseline: version.into(),
                port_version: 0,
            },
        );
    }
}
