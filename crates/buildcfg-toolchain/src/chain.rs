//! The ordered toolchain chain-loader

use crate::provider::{ProviderReport, ToolchainContext, ToolchainProvider, is_executable};
use crate::providers::{
    ChainloadProvider, DiscoveryProvider, ExplicitProvider, SysrootProvider, TripletProvider,
};
use crate::state::{ToolchainField, ToolchainState};
use crate::{Error, Result};
use buildcfg_fs::NormalizedPath;
use serde::Serialize;

/// Result of a chain-load: the final state plus each provider's report.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedToolchain {
    pub state: ToolchainState,
    pub reports: Vec<ProviderReport>,
}

/// Runs providers in a fixed order over one [`ToolchainState`].
///
/// Each provider sees the state left by the previous ones and can only
/// fill what is still unset, so the first writer of every field wins.
pub struct ChainLoader {
    providers: Vec<Box<dyn ToolchainProvider>>,
}

impl ChainLoader {
    /// Explicit values, chain-loaded file, sysroot, discovery, triplet.
    pub fn standard() -> Self {
        Self::with_providers(vec![
            Box::new(ExplicitProvider),
            Box::new(ChainloadProvider),
            Box::new(SysrootProvider),
            Box::new(DiscoveryProvider),
            Box::new(TripletProvider),
        ])
    }

    pub fn with_providers(providers: Vec<Box<dyn ToolchainProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Load a toolchain from scratch.
    pub fn load(&self, context: &ToolchainContext) -> Result<LoadedToolchain> {
        self.load_into(ToolchainState::new(), context)
    }

    /// Run every provider over an existing state.
    ///
    /// Running over a state this loader already produced fills nothing.
    pub fn load_into(
        &self,
        mut state: ToolchainState,
        context: &ToolchainContext,
    ) -> Result<LoadedToolchain> {
        let mut reports = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let report = provider.provide(context, &mut state)?;
            tracing::debug!(
                provider = provider.id(),
                filled = report.filled.len(),
                "Toolchain provider finished"
            );
            reports.push(report);
        }

        locate_compilers(&mut state, context)?;
        check_sysroot(&state)?;
        report_status(&state);

        Ok(LoadedToolchain { state, reports })
    }
}

impl Default for ChainLoader {
    fn default() -> Self {
        Self::standard()
    }
}

const COMPILERS: [(ToolchainField, &str); 2] = [
    (ToolchainField::CCompiler, "C compiler"),
    (ToolchainField::CxxCompiler, "C++ compiler"),
];

/// Both compilers must be set and must name an executable.
///
/// Bare names are looked up in the search directories, then in the
/// context's `PATH`, and replaced by the location found. Values that
/// already carry a directory are kept as given.
fn locate_compilers(state: &mut ToolchainState, context: &ToolchainContext) -> Result<()> {
    let dirs = lookup_dirs(context);
    let searched = || dirs.iter().map(|d| d.to_string()).collect::<Vec<_>>();

    for (field, tool) in COMPILERS {
        let Some(value) = state.get(field).map(str::to_string) else {
            return Err(Error::MissingCompiler {
                tool: tool.to_string(),
                searched: searched(),
            });
        };
        if value.contains(['/', '\\']) {
            continue;
        }
        match dirs
            .iter()
            .map(|dir| dir.join(&value))
            .find(|path| is_executable(path))
        {
            Some(path) => {
                tracing::debug!(%field, name = %value, path = %path, "Located compiler");
                state.relocate(field, path.to_string());
            }
            None => {
                return Err(Error::MissingCompiler {
                    tool: format!("{tool} '{value}'"),
                    searched: searched(),
                });
            }
        }
    }
    Ok(())
}

fn lookup_dirs(context: &ToolchainContext) -> Vec<NormalizedPath> {
    let mut dirs = context.search_dirs.clone();
    if let Some(path) = context.env("PATH") {
        for dir in std::env::split_paths(path) {
            let dir = NormalizedPath::new(dir);
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
    }
    dirs
}

/// The find-root path has to contain the sysroot when both are set.
fn check_sysroot(state: &ToolchainState) -> Result<()> {
    let (Some(sysroot), Some(find_root)) = (state.sysroot(), state.get(ToolchainField::FindRootPath))
    else {
        return Ok(());
    };
    if find_root.split(';').any(|entry| entry == sysroot) {
        return Ok(());
    }
    Err(Error::InconsistentSysroot {
        sysroot: sysroot.to_string(),
        find_root_path: find_root.to_string(),
    })
}

fn report_status(state: &ToolchainState) {
    if let Some(c) = state.provided(ToolchainField::CCompiler) {
        tracing::info!("C compiler: {} (from {})", c.value, c.origin);
    }
    if let Some(cxx) = state.provided(ToolchainField::CxxCompiler) {
        tracing::info!("C++ compiler: {} (from {})", cxx.value, cxx.origin);
    }
    if let Some(system) = state.system_name() {
        tracing::info!(
            "Target system: {} {}",
            system,
            state.system_processor().unwrap_or("")
        );
    }
    if let Some(sysroot) = state.sysroot() {
        tracing::info!("Sysroot: {}", sysroot);
    }
}
