use crate::Result;
use crate::provider::{ProviderReport, ToolchainContext, ToolchainProvider};
use crate::state::{ToolchainField, ToolchainState};

/// Values the user asked for: preset cache variables, then `CC`/`CXX`.
#[derive(Debug, Default)]
pub struct ExplicitProvider;

impl ToolchainProvider for ExplicitProvider {
    fn id(&self) -> &str {
        "explicit"
    }

    fn provide(
        &self,
        context: &ToolchainContext,
        state: &mut ToolchainState,
    ) -> Result<ProviderReport> {
        let mut report = ProviderReport::new(self.id());

        for field in ToolchainField::ALL {
            if let Some(value) = context.cache_variable(field.cache_variable()) {
                report.fill(state, field, value);
            }
        }

        if let Some(cc) = context.env("CC") {
            report.fill(state, ToolchainField::CCompiler, cc);
        }
        if let Some(cxx) = context.env("CXX") {
            report.fill(state, ToolchainField::CxxCompiler, cxx);
        }

        Ok(report)
    }
}
