//! Cache-first dependency resolution

use crate::cache::{BinaryCache, CacheKey};
use crate::version::{ResolvedPackage, VersionResolver};
use crate::{Error, Result};
use buildcfg_fs::{NormalizedPath, io};
use buildcfg_meta::schema::DependencyManifest;
use serde::Serialize;

/// Builds one port from source into an artifact.
pub trait PortBuilder {
    fn build(&self, package: &ResolvedPackage, triplet: &str) -> Result<Vec<u8>>;
}

/// Inputs of one resolution.
#[derive(Debug, Clone)]
pub struct ResolutionInput<'a> {
    /// Raw manifest bytes, hashed into every cache key.
    pub manifest_bytes: &'a [u8],
    pub manifest: &'a DependencyManifest,
    pub triplet: &'a str,
    pub install_root: &'a NormalizedPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    /// Restored from the binary cache.
    Hit,
    /// Not cached and not built (planning only).
    Miss,
    /// Built from source, or installed by the dependency manager, and stored.
    Built,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageOutcome {
    pub package: ResolvedPackage,
    pub key: CacheKey,
    pub status: PackageStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub triplet: String,
    pub baseline: String,
    pub packages: Vec<PackageOutcome>,
}

impl ResolutionReport {
    pub fn hits(&self) -> usize {
        self.count(PackageStatus::Hit)
    }

    pub fn misses(&self) -> usize {
        self.packages.len() - self.hits()
    }

    pub fn built(&self) -> usize {
        self.count(PackageStatus::Built)
    }

    /// Fraction of packages served from the cache; `1.0` for an empty set.
    pub fn hit_rate(&self) -> f64 {
        if self.packages.is_empty() {
            return 1.0;
        }
        self.hits() as f64 / self.packages.len() as f64
    }

    fn count(&self, status: PackageStatus) -> usize {
        self.packages.iter().filter(|p| p.status == status).count()
    }
}

/// Resolves versions, serves what it can from the binary cache and builds
/// only the misses.
pub struct CachedResolver<B: PortBuilder> {
    versions: VersionResolver,
    cache: BinaryCache,
    builder: B,
}

impl<B: PortBuilder> CachedResolver<B> {
    pub fn new(versions: VersionResolver, cache: BinaryCache, builder: B) -> Self {
        Self {
            versions,
            cache,
            builder,
        }
    }

    pub fn cache(&self) -> &BinaryCache {
        &self.cache
    }

    /// Report what a resolution would do without building or restoring.
    pub fn plan(&self, input: &ResolutionInput<'_>) -> Result<ResolutionReport> {
        let mut report = self.report_for(input);
        for package in self.versions.resolve(input.manifest)? {
            let key = self.key_for(input, &package);
            let status = if self.cache.get(&key)?.is_some() {
                PackageStatus::Hit
            } else {
                PackageStatus::Miss
            };
            report.packages.push(PackageOutcome {
                package,
                key,
                status,
            });
        }
        Ok(report)
    }

    /// Resolve, restoring hits and building misses into `install_root`.
    ///
    /// Any failure aborts the whole resolution; nothing is resolved partially.
    pub fn resolve(&self, input: &ResolutionInput<'_>) -> Result<ResolutionReport> {
        let mut report = self.report_for(input);
        for package in self.versions.resolve(input.manifest)? {
            let key = self.key_for(input, &package);

            let (bytes, status) = match self.cache.get(&key)? {
                Some(artifact) => (artifact.bytes, PackageStatus::Hit),
                None => {
                    tracing::info!("Building {} for {}", package.identity(), input.triplet);
                    let bytes = self.builder.build(&package, input.triplet)?;
                    self.cache.put(&key, &package, input.triplet, &bytes)?;
                    (bytes, PackageStatus::Built)
                }
            };

            restore(input.install_root, input.triplet, &package, &bytes)?;
            report.packages.push(PackageOutcome {
                package,
                key,
                status,
            });
        }

        tracing::info!(
            "Dependencies: {} restored from cache, {} built",
            report.hits(),
            report.built()
        );
        Ok(report)
    }

    /// Store an entry for every package the cache lacks, taking each
    /// artifact from the builder. Nothing is restored into `install_root`;
    /// the packages are already installed there by another tool.
    ///
    /// Packages the cache refuses to store (read-only mode) stay misses.
    pub fn record(&self, input: &ResolutionInput<'_>) -> Result<ResolutionReport> {
        let mut report = self.report_for(input);
        for package in self.versions.resolve(input.manifest)? {
            let key = self.key_for(input, &package);
            let status = if self.cache.get(&key)?.is_some() {
                PackageStatus::Hit
            } else {
                let bytes = self.builder.build(&package, input.triplet)?;
                if self.cache.put(&key, &package, input.triplet, &bytes)? {
                    PackageStatus::Built
                } else {
                    PackageStatus::Miss
                }
            };
            report.packages.push(PackageOutcome {
                package,
                key,
                status,
            });
        }
        Ok(report)
    }

    fn report_for(&self, input: &ResolutionInput<'_>) -> ResolutionReport {
        ResolutionReport {
            triplet: input.triplet.to_string(),
            baseline: self.versions.baseline_id().to_string(),
            packages: Vec::new(),
        }
    }

    fn key_for(&self, input: &ResolutionInput<'_>, package: &ResolvedPackage) -> CacheKey {
        CacheKey::compute(
            input.manifest_bytes,
            self.versions.baseline_id(),
            input.triplet,
            package,
        )
    }
}

/// Artifact location inside an install root.
pub fn installed_artifact(
    install_root: &NormalizedPath,
    triplet: &str,
    package: &ResolvedPackage,
) -> NormalizedPath {
    install_root
        .join(triplet)
        .join("packages")
        .join(&format!("{}_{}.zip", package.name, triplet))
}

fn restore(
    install_root: &NormalizedPath,
    triplet: &str,
    package: &ResolvedPackage,
    bytes: &[u8],
) -> Result<()> {
    let target = installed_artifact(install_root, triplet, package);
    io::write_atomic(&target, bytes).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::CacheMode;
    use buildcfg_meta::schema::{BaselineDatabase, Dependency};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingBuilder {
        built: RefCell<Vec<String>>,
    }

    impl PortBuilder for CountingBuilder {
        fn build(&self, package: &ResolvedPackage, triplet: &str) -> Result<Vec<u8>> {
            self.built.borrow_mut().push(package.name.clone());
            Ok(format!("{}:{}", package.identity(), triplet).into_bytes())
        }
    }

    struct FailingBuilder;

    impl PortBuilder for FailingBuilder {
        fn build(&self, package: &ResolvedPackage, triplet: &str) -> Result<Vec<u8>> {
            Err(Error::BuildFailed {
                package: package.name.clone(),
                triplet: triplet.to_string(),
                message: "compiler crashed".to_string(),
            })
        }
    }

    fn versions() -> VersionResolver {
        let mut db = BaselineDatabase::default();
        db.insert("fmt", "10.2.1");
        db.insert("zlib", "1.3.1");
        VersionResolver::new("abc", db)
    }

    fn manifest() -> DependencyManifest {
        DependencyManifest {
            dependencies: vec![
                Dependency::Name("zlib".into()),
                Dependency::Name("fmt".into()),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn second_run_is_served_entirely_from_cache() {
        let temp = TempDir::new().unwrap();
        let cache = BinaryCache::new(NormalizedPath::new(temp.path()).join("cache"), CacheMode::ReadWrite);
        let install = NormalizedPath::new(temp.path()).join("installed");
        let manifest = manifest();
        let input = ResolutionInput {
            manifest_bytes: b"{\"dependencies\":[\"zlib\",\"fmt\"]}",
            manifest: &manifest,
            triplet: "x64-linux",
            install_root: &install,
        };
        let resolver = CachedResolver::new(versions(), cache, CountingBuilder::default());

        let first = resolver.resolve(&input).unwrap();
        let second = resolver.resolve(&input).unwrap();

        assert_eq!(first.built(), 2);
        assert_eq!(second.hit_rate(), 1.0);
        assert_eq!(second.built(), 0);
        assert_eq!(*resolver.builder.built.borrow(), vec!["fmt", "zlib"]);

        let keys = |r: &ResolutionReport| r.packages.iter().map(|p| p.key.clone()).collect::<Vec<_>>();
        assert_eq!(keys(&first), keys(&second));
    }

    #[test]
    fn plan_reports_without_building() {
        let temp = TempDir::new().unwrap();
        let cache = BinaryCache::new(NormalizedPath::new(temp.path()), CacheMode::ReadWrite);
        let install = NormalizedPath::new(temp.path()).join("installed");
        let manifest = manifest();
        let input = ResolutionInput {
            manifest_bytes: b"{}",
            manifest: &manifest,
            triplet: "x64-linux",
            install_root: &install,
        };
        let resolver = CachedResolver::new(versions(), cache, CountingBuilder::default());

        let plan = resolver.plan(&input).unwrap();

        assert_eq!(plan.misses(), 2);
        assert_eq!(plan.hit_rate(), 0.0);
        assert!(resolver.builder.built.borrow().is_empty());
        assert!(!install.exists());
    }

    #[test]
    fn restored_artifacts_land_in_install_root() {
        let temp = TempDir::new().unwrap();
        let cache = BinaryCache::new(NormalizedPath::new(temp.path()).join("cache"), CacheMode::ReadWrite);
        let install = NormalizedPath::new(temp.path()).join("installed");
        let manifest = manifest();
        let input = ResolutionInput {
            manifest_bytes: b"{}",
            manifest: &manifest,
            triplet: "x64-linux",
            install_root: &install,
        };

        let report = CachedResolver::new(versions(), cache, CountingBuilder::default())
            .resolve(&input)
            .unwrap();

        for outcome in &report.packages {
            assert!(installed_artifact(&install, "x64-linux", &outcome.package).is_file());
        }
    }

    #[test]
    fn record_stores_entries_without_touching_install_root() {
        let temp = TempDir::new().unwrap();
        let cache = BinaryCache::new(NormalizedPath::new(temp.path()).join("cache"), CacheMode::ReadWrite);
        let install = NormalizedPath::new(temp.path()).join("installed");
        let manifest = manifest();
        let input = ResolutionInput {
            manifest_bytes: b"{}",
            manifest: &manifest,
            triplet: "x64-linux",
            install_root: &install,
        };
        let resolver = CachedResolver::new(versions(), cache, CountingBuilder::default());

        let recorded = resolver.record(&input).unwrap();
        let again = resolver.record(&input).unwrap();

        assert_eq!(recorded.built(), 2);
        assert_eq!(again.hits(), 2);
        assert_eq!(resolver.plan(&input).unwrap().hit_rate(), 1.0);
        assert_eq!(*resolver.builder.built.borrow(), vec!["fmt", "zlib"]);
        assert!(!install.exists());
    }

    #[test]
    fn record_in_read_only_mode_leaves_misses() {
        let temp = TempDir::new().unwrap();
        let cache = BinaryCache::new(NormalizedPath::new(temp.path()), CacheMode::Read);
        let install = NormalizedPath::new(temp.path()).join("installed");
        let manifest = manifest();
        let input = ResolutionInput {
            manifest_bytes: b"{}",
            manifest: &manifest,
            triplet: "x64-linux",
            install_root: &install,
        };

        let report = CachedResolver::new(versions(), cache, CountingBuilder::default())
            .record(&input)
            .unwrap();

        assert_eq!(report.misses(), 2);
        assert_eq!(report.built(), 0);
    }

    #[test]
    fn build_failure_aborts_resolution() {
        let temp = TempDir::new().unwrap();
        let cache = BinaryCache::new(NormalizedPath::new(temp.path()), CacheMode::ReadWrite);
        let install = NormalizedPath::new(temp.path()).join("installed");
        let manifest = manifest();
        let input = ResolutionInput {
            manifest_bytes: b"{}",
            manifest: &manifest,
            triplet: "x64-linux",
            install_root: &install,
        };

        let err = CachedResolver::new(versions(), cache, FailingBuilder)
            .resolve(&input)
            .unwrap_err();
        assert!(matches!(err, Error::BuildFailed { ref package, .. } if package == "fmt"));
    }
}
