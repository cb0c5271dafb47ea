//! Top-level preset file document

use super::preset::{BuildPreset, ConfigurePreset, PackagePreset, TestPreset, WorkflowPreset};
use serde::{Deserialize, Serialize};

/// Oldest preset file version accepted.
pub const MIN_VERSION: u32 = 3;
/// Newest preset file version accepted.
pub const MAX_VERSION: u32 = 10;
/// First version that allows `include`.
pub const INCLUDE_VERSION: u32 = 4;
/// First version that allows `workflowPresets`.
pub const WORKFLOW_VERSION: u32 = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CMakeVersion {
    #[serde(default)]
    pub major: u32,
    #[serde(default)]
    pub minor: u32,
    #[serde(default)]
    pub patch: u32,
}

/// `CMakePresets.json` or `CMakeUserPresets.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetFile {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmake_minimum_required: Option<CMakeVersion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configure_presets: Vec<ConfigurePreset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_presets: Vec<BuildPreset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_presets: Vec<TestPreset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub package_presets: Vec<PackagePreset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workflow_presets: Vec<WorkflowPreset>,
    /// Opaque vendor data, preserved but never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_parses() {
        let file: PresetFile = serde_json::from_str(r#"{"version": 6}"#).unwrap();
        assert_eq!(file.version, 6);
        assert!(file.configure_presets.is_empty());
        assert!(file.include.is_empty());
    }

    #[test]
    fn vendor_section_is_preserved() {
        let json = r#"{"version": 6, "vendor": {"example.com/tool": {"flag": 1}}}"#;
        let file: PresetFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.vendor.unwrap()["example.com/tool"]["flag"], 1);
    }
}
