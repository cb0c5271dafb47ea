use crate::Result;
use crate::provider::{ProviderReport, ToolchainContext, ToolchainProvider};
use crate::state::{ToolchainField, ToolchainState};

/// Target system from the resolved triplet.
#[derive(Debug, Default)]
pub struct TripletProvider;

impl ToolchainProvider for TripletProvider {
    fn id(&self) -> &str {
        "triplet"
    }

    fn provide(
        &self,
        context: &ToolchainContext,
        state: &mut ToolchainState,
    ) -> Result<ProviderReport> {
        let mut report = ProviderReport::new(self.id());

        if let Some(triplet) = &context.triplet {
            report.fill(state, ToolchainField::Triplet, triplet.name.clone());
            report.fill(state, ToolchainField::SystemName, triplet.system_name.clone());
            report.fill(
                state,
                ToolchainField::SystemProcessor,
                triplet.system_processor(),
            );
        }

        Ok(report)
    }
}
