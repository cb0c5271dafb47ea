//! Deterministic version selection
//!
//! For every declared port the selected version is the override when one
//! exists, otherwise the larger of the baseline version and the
//! `version>=` constraint. Output is sorted by port name, so the same
//! manifest and baseline always produce the same list.

use crate::{Error, Result};
use buildcfg_meta::schema::{BaselineDatabase, DependencyManifest};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One port with its selected version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    pub port_version: u32,
    pub features: Vec<String>,
}

impl ResolvedPackage {
    /// `name@version#port_version`
    pub fn identity(&self) -> String {
        format!("{}@{}#{}", self.name, self.version, self.port_version)
    }
}

/// Compare two port versions.
///
/// Versions that parse as semver (after padding `1.2` to `1.2.0`) compare
/// as semver. Anything else compares by dotted segments, numerically where
/// both segments are numbers.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_semver(a), parse_semver(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => compare_segments(a, b),
    }
}

fn parse_semver(version: &str) -> Option<semver::Version> {
    if let Ok(parsed) = semver::Version::parse(version) {
        return Some(parsed);
    }
    let (core, rest) = match version.find(['-', '+']) {
        Some(index) => version.split_at(index),
        None => (version, ""),
    };
    let dots = core.matches('.').count();
    let padded = match dots {
        0 => format!("{core}.0.0{rest}"),
        1 => format!("{core}.0{rest}"),
        _ => return None,
    };
    semver::Version::parse(&padded).ok()
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    let mut left = a.split(['.', '-']);
    let mut right = b.split(['.', '-']);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct Requirement {
    minimum: Option<String>,
    features: Vec<String>,
}

/// Selects versions against one baseline.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    baseline_id: String,
    database: BaselineDatabase,
}

impl VersionResolver {
    pub fn new(baseline_id: impl Into<String>, database: BaselineDatabase) -> Self {
        Self {
            baseline_id: baseline_id.into(),
            database,
        }
    }

    pub fn baseline_id(&self) -> &str {
        &self.baseline_id
    }

    pub fn resolve(&self, manifest: &DependencyManifest) -> Result<Vec<ResolvedPackage>> {
        // Duplicate declarations collapse into one requirement: highest
        // minimum, union of features.
        let mut requirements: BTreeMap<String, Requirement> = BTreeMap::new();
        for dependency in &manifest.dependencies {
            let requirement = requirements.entry(dependency.name().to_string()).or_default();
            if let Some(minimum) = dependency.minimum_version() {
                let higher = requirement
                    .minimum
                    .as_deref()
                    .is_none_or(|current| compare_versions(minimum, current) == Ordering::Greater);
                if higher {
                    requirement.minimum = Some(minimum.to_string());
                }
            }
            for feature in dependency.features() {
                if !requirement.features.contains(feature) {
                    requirement.features.push(feature.clone());
                }
            }
        }

        let mut resolved = Vec::with_capacity(requirements.len());
        for (name, mut requirement) in requirements {
            requirement.features.sort();

            let overridden = manifest.overrides.iter().find(|o| o.name == name);
            let (version, port_version) = match overridden {
                Some(pin) => (pin.version.clone(), pin.port_version.unwrap_or(0)),
                None => {
                    let entry = self.database.get(&name).ok_or_else(|| Error::UnknownPackage {
                        package: name.clone(),
                        baseline: self.baseline_id.clone(),
                    })?;
                    match requirement.minimum {
                        Some(minimum)
                            if compare_versions(&minimum, &entry.baseline) == Ordering::Greater =>
                        {
                            (minimum, 0)
                        }
                        _ => (entry.baseline.clone(), entry.port_version),
                    }
                }
            };

            tracing::debug!(package = %name, %version, "Selected version");
            resolved.push(ResolvedPackage {
                name,
                version,
                port_version,
                features: requirement.features,
            });
        }

        Ok(resolved)
    }
}
