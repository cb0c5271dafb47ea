use crate::Result;
use crate::provider::{ProviderReport, ToolchainContext, ToolchainProvider};
use crate::state::{ToolchainField, ToolchainState};

/// Environment variables naming a sysroot, highest priority first.
pub const SYSROOT_ENV_VARS: [&str; 3] = ["CMAKE_SYSROOT", "SYSROOT", "TARGET_SYSROOT"];

/// Sysroot from the environment. Sets the sysroot and the find-root path
/// together. The filesystem is never probed.
#[derive(Debug, Default)]
pub struct SysrootProvider;

impl ToolchainProvider for SysrootProvider {
    fn id(&self) -> &str {
        "sysroot"
    }

    fn provide(
        &self,
        context: &ToolchainContext,
        state: &mut ToolchainState,
    ) -> Result<ProviderReport> {
        let mut report = ProviderReport::new(self.id());

        let sysroot = SYSROOT_ENV_VARS
            .iter()
            .find_map(|name| context.env(name).map(|value| (*name, value)));

        if let Some((name, value)) = sysroot {
            tracing::debug!(variable = name, sysroot = value, "Sysroot from environment");
            report.fill(state, ToolchainField::Sysroot, value);
        }

        // A sysroot from any earlier provider also roots the find path.
        if let Some(root) = state.sysroot().map(str::to_string) {
            report.fill(state, ToolchainField::FindRootPath, root);
        }

        Ok(report)
    }
}
