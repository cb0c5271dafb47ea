use crate::Result;
use crate::provider::{ProviderReport, ToolchainContext, ToolchainProvider, is_executable};
use crate::state::{ToolchainField, ToolchainState};
use buildcfg_fs::NormalizedPath;

/// C/C++ compiler pairs in preference order.
const COMPILER_PAIRS: [(&str, &str); 3] = [("clang", "clang++"), ("gcc", "g++"), ("cc", "c++")];

/// Fallback compiler search over fixed directories.
///
/// When the target differs from the host and the triplet has a GNU prefix,
/// only prefixed compilers (`aarch64-linux-gnu-gcc`) are considered.
#[derive(Debug, Default)]
pub struct DiscoveryProvider;

impl DiscoveryProvider {
    /// Candidate pairs for this context, in search order.
    pub fn candidates(context: &ToolchainContext, state: &ToolchainState) -> Vec<(String, String)> {
        let prefix = if is_cross(context, state) {
            context.triplet.as_ref().and_then(|t| t.gnu_prefix())
        } else {
            None
        };
        let prefix = prefix.unwrap_or_default();

        COMPILER_PAIRS
            .iter()
            .map(|(c, cxx)| (format!("{prefix}{c}"), format!("{prefix}{cxx}")))
            .collect()
    }

    fn find(dirs: &[NormalizedPath], name: &str) -> Option<NormalizedPath> {
        dirs.iter()
            .map(|dir| dir.join(name))
            .find(|path| is_executable(path))
    }
}

impl ToolchainProvider for DiscoveryProvider {
    fn id(&self) -> &str {
        "discovery"
    }

    fn provide(
        &self,
        context: &ToolchainContext,
        state: &mut ToolchainState,
    ) -> Result<ProviderReport> {
        let mut report = ProviderReport::new(self.id());
        if state.is_set(ToolchainField::CCompiler) && state.is_set(ToolchainField::CxxCompiler) {
            return Ok(report);
        }

        let candidates = Self::candidates(context, state);
        let dirs = &context.search_dirs;

        // Prefer a complete pair from one directory before mixing.
        for (c, cxx) in &candidates {
            for dir in dirs {
                let c_path = dir.join(c);
                let cxx_path = dir.join(cxx);
                if is_executable(&c_path) && is_executable(&cxx_path) {
                    report.fill(state, ToolchainField::CCompiler, c_path.as_str());
                    report.fill(state, ToolchainField::CxxCompiler, cxx_path.as_str());
                    return Ok(report);
                }
            }
        }

        for (c, cxx) in &candidates {
            if !state.is_set(ToolchainField::CCompiler) {
                if let Some(path) = Self::find(dirs, c) {
                    report.fill(state, ToolchainField::CCompiler, path.as_str());
                }
            }
            if !state.is_set(ToolchainField::CxxCompiler) {
                if let Some(path) = Self::find(dirs, cxx) {
                    report.fill(state, ToolchainField::CxxCompiler, path.as_str());
                }
            }
        }

        if report.is_empty() {
            tracing::warn!(
                dirs = ?dirs.iter().map(NormalizedPath::as_str).collect::<Vec<_>>(),
                "No compiler discovered"
            );
        }
        Ok(report)
    }
}

fn is_cross(context: &ToolchainContext, state: &ToolchainState) -> bool {
    let target_system = state
        .system_name()
        .map(str::to_string)
        .or_else(|| context.triplet.as_ref().map(|t| t.system_name.clone()));
    let target_processor = state
        .system_processor()
        .map(str::to_string)
        .or_else(|| {
            context
                .triplet
                .as_ref()
                .map(|t| t.system_processor().to_string())
        });

    let system_differs = target_system.is_some_and(|s| s != context.host.system_name);
    let processor_differs = target_processor
        .is_some_and(|p| canonical_processor(&p) != canonical_processor(&context.host.processor));
    system_differs || processor_differs
}

fn canonical_processor(processor: &str) -> &str {
    match processor {
        "amd64" | "AMD64" | "x64" => "x86_64",
        "arm64" | "ARM64" => "aarch64",
        other => other,
    }
}
