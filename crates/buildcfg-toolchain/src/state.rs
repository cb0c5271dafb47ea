//! Partially resolved toolchain values

use serde::Serialize;
use std::collections::BTreeMap;

/// A value a toolchain provider may contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolchainField {
    CCompiler,
    CxxCompiler,
    SystemName,
    SystemProcessor,
    Sysroot,
    FindRootPath,
    Triplet,
}

impl ToolchainField {
    pub const ALL: [ToolchainField; 7] = [
        Self::CCompiler,
        Self::CxxCompiler,
        Self::SystemName,
        Self::SystemProcessor,
        Self::Sysroot,
        Self::FindRootPath,
        Self::Triplet,
    ];

    /// The cache variable this field is passed to CMake as.
    pub fn cache_variable(&self) -> &'static str {
        match self {
            Self::CCompiler => "CMAKE_C_COMPILER",
            Self::CxxCompiler => "CMAKE_CXX_COMPILER",
            Self::SystemName => "CMAKE_SYSTEM_NAME",
            Self::SystemProcessor => "CMAKE_SYSTEM_PROCESSOR",
            Self::Sysroot => "CMAKE_SYSROOT",
            Self::FindRootPath => "CMAKE_FIND_ROOT_PATH",
            Self::Triplet => "VCPKG_TARGET_TRIPLET",
        }
    }
}

impl std::fmt::Display for ToolchainField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cache_variable())
    }
}

/// A filled value and the provider that filled it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provided {
    pub value: String,
    pub origin: String,
}

/// Toolchain values filled first-writer-wins.
///
/// Once a field holds a value nothing can replace it; later providers only
/// see what is still unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolchainState {
    fields: BTreeMap<ToolchainField, Provided>,
}

impl ToolchainState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` unless it already has a value. Returns whether it was set.
    ///
    /// Empty values count as unset and are ignored.
    pub fn fill(
        &mut self,
        field: ToolchainField,
        value: impl Into<String>,
        origin: impl Into<String>,
    ) -> bool {
        let value = value.into();
        if value.is_empty() || self.fields.contains_key(&field) {
            return false;
        }
        self.fields.insert(
            field,
            Provided {
                value,
                origin: origin.into(),
            },
        );
        true
    }

    /// Point a filled field at the location its value resolved to. The
    /// origin stays with the provider that filled it.
    pub(crate) fn relocate(&mut self, field: ToolchainField, value: impl Into<String>) {
        if let Some(provided) = self.fields.get_mut(&field) {
            provided.value = value.into();
        }
    }

    pub fn get(&self, field: ToolchainField) -> Option<&str> {
        self.fields.get(&field).map(|p| p.value.as_str())
    }

    pub fn provided(&self, field: ToolchainField) -> Option<&Provided> {
        self.fields.get(&field)
    }

    pub fn is_set(&self, field: ToolchainField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn c_compiler(&self) -> Option<&str> {
        self.get(ToolchainField::CCompiler)
    }

    pub fn cxx_compiler(&self) -> Option<&str> {
        self.get(ToolchainField::CxxCompiler)
    }

    pub fn system_name(&self) -> Option<&str> {
        self.get(ToolchainField::SystemName)
    }

    pub fn system_processor(&self) -> Option<&str> {
        self.get(ToolchainField::SystemProcessor)
    }

    pub fn sysroot(&self) -> Option<&str> {
        self.get(ToolchainField::Sysroot)
    }

    pub fn triplet(&self) -> Option<&str> {
        self.get(ToolchainField::Triplet)
    }

    /// Every filled field as `CMAKE_*` cache variables.
    pub fn cache_variables(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|(field, provided)| (field.cache_variable().to_string(), provided.value.clone()))
            .collect()
    }
}
