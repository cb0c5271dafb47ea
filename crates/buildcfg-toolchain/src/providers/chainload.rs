use crate::provider::{ProviderReport, ToolchainContext, ToolchainProvider};
use crate::script::ToolchainScript;
use crate::state::{ToolchainField, ToolchainState};
use crate::{Error, Result};

/// Values set by the chain-loaded toolchain file.
///
/// The file named by `VCPKG_CHAINLOAD_TOOLCHAIN_FILE` wins over the one an
/// overlay triplet names.
#[derive(Debug, Default)]
pub struct ChainloadProvider;

const SCRIPT_FIELDS: [ToolchainField; 6] = [
    ToolchainField::CCompiler,
    ToolchainField::CxxCompiler,
    ToolchainField::SystemName,
    ToolchainField::SystemProcessor,
    ToolchainField::Sysroot,
    ToolchainField::FindRootPath,
];

impl ToolchainProvider for ChainloadProvider {
    fn id(&self) -> &str {
        "chainload"
    }

    fn provide(
        &self,
        context: &ToolchainContext,
        state: &mut ToolchainState,
    ) -> Result<ProviderReport> {
        let path = context.chainload_toolchain_file.clone().or_else(|| {
            context
                .triplet
                .as_ref()
                .and_then(|t| t.chainload_toolchain_file.clone())
        });

        let Some(path) = path else {
            return Ok(ProviderReport::new(self.id()));
        };
        if !path.is_file() {
            return Err(Error::ChainloadNotFound {
                path: path.to_native(),
            });
        }

        let script = ToolchainScript::load(&path)?;
        let mut report = ProviderReport::new(format!("chainload:{}", path));

        for field in SCRIPT_FIELDS {
            if let Some(value) = script.get(field.cache_variable()) {
                report.fill(state, field, value);
            }
        }

        Ok(report)
    }
}
