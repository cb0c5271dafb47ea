//! Shared test fixtures for the buildcfg workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`project`]: [`TestProject`] builder for source trees with preset files
//! - [`tools`]: executable stand-ins for compilers and the dependency manager

pub mod project;
pub mod tools;

pub use project::{COMPILER_DIR, STANDARD_PRESETS, TestProject};
pub use tools::{fake_compiler_set, fake_executable};
