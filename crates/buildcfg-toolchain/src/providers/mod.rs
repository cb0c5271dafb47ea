//! The standard toolchain providers, in chain order

mod chainload;
mod discovery;
mod explicit;
mod sysroot;
mod triplet;

pub use chainload::ChainloadProvider;
pub use discovery::DiscoveryProvider;
pub use explicit::ExplicitProvider;
pub use sysroot::{SYSROOT_ENV_VARS, SysrootProvider};
pub use triplet::TripletProvider;
