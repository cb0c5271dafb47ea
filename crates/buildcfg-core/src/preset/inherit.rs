//! Merging an `inherits` chain into one preset
//!
//! Parents are merged left to right, each later parent overriding the ones
//! before it, and the child is applied last. Maps merge per key; a `null`
//! value in a later layer removes the key. `name`, `hidden`, `inherits`,
//! `displayName` and `description` are never inherited.

use crate::error::ConfigurationError;
use buildcfg_meta::schema::{
    BuildPreset, Condition, ConfigurePreset, OneOrMany, PackagePreset, PresetKind, TestPreset,
};
use buildcfg_meta::{PresetEntry, PresetRegistry};
use std::collections::BTreeMap;

/// A preset kind that supports `inherits`.
pub trait Inheritable: Clone + Default {
    const KIND: PresetKind;

    fn name(&self) -> &str;
    fn hidden(&self) -> bool;
    fn inherits(&self) -> Option<&OneOrMany>;
    fn condition(&self) -> Option<&Condition>;

    /// Apply every inheritable field set in `top` over `self`.
    fn overlay(&mut self, top: &Self);

    /// Take the fields that belong to `own` alone.
    fn adopt_identity(&mut self, own: &Self);

    fn lookup<'r>(registry: &'r PresetRegistry, name: &str) -> Option<&'r PresetEntry<Self>>;

    fn parents(&self) -> Vec<String> {
        self.inherits().map(OneOrMany::to_vec).unwrap_or_default()
    }
}

fn set<T: Clone>(target: &mut Option<T>, top: &Option<T>) {
    if top.is_some() {
        target.clone_from(top);
    }
}

fn merge_map<V: Clone>(target: &mut BTreeMap<String, Option<V>>, top: &BTreeMap<String, Option<V>>) {
    for (key, value) in top {
        target.insert(key.clone(), value.clone());
    }
}

/// Merge the full chain of `name`. The returned preset still carries
/// `null` map entries; callers drop them when deriving effective values.
pub fn merge_chain<T: Inheritable>(
    registry: &PresetRegistry,
    name: &str,
) -> Result<T, ConfigurationError> {
    if T::lookup(registry, name).is_none() {
        return Err(ConfigurationError::PresetNotFound {
            kind: T::KIND,
            name: name.to_string(),
        });
    }
    let mut stack = Vec::new();
    merge_recursive(registry, name, &mut stack)
}

fn merge_recursive<T: Inheritable>(
    registry: &PresetRegistry,
    name: &str,
    stack: &mut Vec<String>,
) -> Result<T, ConfigurationError> {
    if let Some(start) = stack.iter().position(|n| n == name) {
        let mut path = stack[start..].to_vec();
        path.push(name.to_string());
        return Err(ConfigurationError::InheritanceCycle {
            kind: T::KIND,
            path,
        });
    }

    let entry = T::lookup(registry, name).ok_or_else(|| ConfigurationError::PresetNotFound {
        kind: T::KIND,
        name: name.to_string(),
    })?;
    let own = &entry.preset;

    stack.push(name.to_string());
    let mut merged = T::default();
    for parent in own.parents() {
        if T::lookup(registry, &parent).is_none() {
            return Err(ConfigurationError::ParentNotFound {
                kind: T::KIND,
                name: name.to_string(),
                parent,
            });
        }
        let resolved: T = merge_recursive(registry, &parent, stack)?;
        tracing::debug!(kind = T::KIND.as_str(), preset = name, parent = %parent, "Merging parent preset");
        merged.overlay(&resolved);
    }
    stack.pop();

    merged.overlay(own);
    merged.adopt_identity(own);
    Ok(merged)
}

impl Inheritable for ConfigurePreset {
    const KIND: PresetKind = PresetKind::Configure;

    fn name(&self) -> &str {
        &self.name
    }

    fn hidden(&self) -> bool {
        self.hidden
    }

    fn inherits(&self) -> Option<&OneOrMany> {
        self.inherits.as_ref()
    }

    fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    fn overlay(&mut self, top: &Self) {
        set(&mut self.generator, &top.generator);
        set(&mut self.binary_dir, &top.binary_dir);
        set(&mut self.install_dir, &top.install_dir);
        set(&mut self.toolchain_file, &top.toolchain_file);
        set(&mut self.condition, &top.condition);
        merge_map(&mut self.cache_variables, &top.cache_variables);
        merge_map(&mut self.environment, &top.environment);
    }

    fn adopt_identity(&mut self, own: &Self) {
        self.name.clone_from(&own.name);
        self.hidden = own.hidden;
        self.inherits.clone_from(&own.inherits);
        self.display_name.clone_from(&own.display_name);
        self.description.clone_from(&own.description);
    }

    fn lookup<'r>(registry: &'r PresetRegistry, name: &str) -> Option<&'r PresetEntry<Self>> {
        registry.configure(name)
    }
}

impl Inheritable for BuildPreset {
    const KIND: PresetKind = PresetKind::Build;

    fn name(&self) -> &str {
        &self.name
    }

    fn hidden(&self) -> bool {
        self.hidden
    }

    fn inherits(&self) -> Option<&OneOrMany> {
        self.inherits.as_ref()
    }

    fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    fn overlay(&mut self, top: &Self) {
        set(&mut self.configure_preset, &top.configure_preset);
        set(&mut self.configuration, &top.configuration);
        set(&mut self.targets, &top.targets);
        set(&mut self.jobs, &top.jobs);
        set(&mut self.clean_first, &top.clean_first);
        set(&mut self.condition, &top.condition);
        merge_map(&mut self.environment, &top.environment);
    }

    fn adopt_identity(&mut self, own: &Self) {
        self.name.clone_from(&own.name);
        self.hidden = own.hidden;
        self.inherits.clone_from(&own.inherits);
        self.display_name.clone_from(&own.display_name);
        self.description.clone_from(&own.description);
    }

    fn lookup<'r>(registry: &'r PresetRegistry, name: &str) -> Option<&'r PresetEntry<Self>> {
        registry.build(name)
    }
}

impl Inheritable for TestPreset {
    const KIND: PresetKind = PresetKind::Test;

    fn name(&self) -> &str {
        &self.name
    }

    fn hidden(&self) -> bool {
        self.hidden
    }

    fn inherits(&self) -> Option<&OneOrMany> {
        self.inherits.as_ref()
    }

    fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    fn overlay(&mut self, top: &Self) {
        set(&mut self.configure_preset, &top.configure_preset);
        set(&mut self.configuration, &top.configuration);
        set(&mut self.condition, &top.condition);
        merge_map(&mut self.environment, &top.environment);

        if let Some(top_output) = &top.output {
            let output = self.output.get_or_insert_with(Default::default);
            set(&mut output.output_on_failure, &top_output.output_on_failure);
            set(&mut output.verbosity, &top_output.verbosity);
        }
        if let Some(top_include) = top.filter.as_ref().and_then(|f| f.include.as_ref()) {
            let include = self
                .filter
                .get_or_insert_with(Default::default)
                .include
                .get_or_insert_with(Default::default);
            set(&mut include.name, &top_include.name);
            set(&mut include.label, &top_include.label);
        }
        if let Some(top_execution) = &top.execution {
            let execution = self.execution.get_or_insert_with(Default::default);
            set(&mut execution.jobs, &top_execution.jobs);
            set(&mut execution.stop_on_failure, &top_execution.stop_on_failure);
        }
    }

    fn adopt_identity(&mut self, own: &Self) {
        self.name.clone_from(&own.name);
        self.hidden = own.hidden;
        self.inherits.clone_from(&own.inherits);
        self.display_name.clone_from(&own.display_name);
        self.description.clone_from(&own.description);
    }

    fn lookup<'r>(registry: &'r PresetRegistry, name: &str) -> Option<&'r PresetEntry<Self>> {
        registry.test(name)
    }
}

impl Inheritable for PackagePreset {
    const KIND: PresetKind = PresetKind::Package;

    fn name(&self) -> &str {
        &self.name
    }

    fn hidden(&self) -> bool {
        self.hidden
    }

    fn inherits(&self) -> Option<&OneOrMany> {
        self.inherits.as_ref()
    }

    fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    fn overlay(&mut self, top: &Self) {
        set(&mut self.configure_preset, &top.configure_preset);
        set(&mut self.generators, &top.generators);
        set(&mut self.configurations, &top.configurations);
        set(&mut self.package_directory, &top.package_directory);
        set(&mut self.condition, &top.condition);
        merge_map(&mut self.environment, &top.environment);
    }

    fn adopt_identity(&mut self, own: &Self) {
        self.name.clone_from(&own.name);
        self.hidden = own.hidden;
        self.inherits.clone_from(&own.inherits);
        self.display_name.clone_from(&own.display_name);
        self.description.clone_from(&own.description);
    }

    fn lookup<'r>(registry: &'r PresetRegistry, name: &str) -> Option<&'r PresetEntry<Self>> {
        registry.package(name)
    }
}
