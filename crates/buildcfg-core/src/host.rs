//! The host a configuration is resolved on

use buildcfg_toolchain::Host;
use std::collections::BTreeMap;

/// Host description plus a snapshot of its environment.
///
/// Resolution never reads the process environment directly; everything
/// goes through this snapshot so tests can pin it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    pub host: Host,
    pub env: BTreeMap<String, String>,
}

impl HostContext {
    pub fn current() -> Self {
        Self {
            host: Host::current(),
            env: std::env::vars().collect(),
        }
    }

    pub fn new(host: Host, env: BTreeMap<String, String>) -> Self {
        Self { host, env }
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }
}
