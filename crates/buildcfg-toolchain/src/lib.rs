//! Toolchain selection for a resolved build configuration
//!
//! Toolchain files that used to chain-load each other are modelled as an
//! explicit ordered list of [`ToolchainProvider`]s run by a [`ChainLoader`].
//! Every provider gets the partially filled [`ToolchainState`] and may only
//! fill fields nobody set before it.

pub mod chain;
pub mod error;
pub mod host;
pub mod provider;
pub mod providers;
pub mod script;
pub mod state;
pub mod triplet;

pub use chain::{ChainLoader, LoadedToolchain};
pub use error::{Error, Result};
pub use host::Host;
pub use provider::{DEFAULT_SEARCH_DIRS, ProviderReport, ToolchainContext, ToolchainProvider};
pub use script::ToolchainScript;
pub use state::{Provided, ToolchainField, ToolchainState};
pub use triplet::{Linkage, Triplet, TripletRegistry, TripletSource};
