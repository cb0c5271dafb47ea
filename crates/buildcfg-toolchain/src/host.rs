//! Description of the machine running the resolver

use serde::Serialize;

/// CMake-style names for the host operating system and processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Host {
    /// `Linux`, `Windows` or `Darwin`, as `${hostSystemName}` expands.
    pub system_name: String,
    /// `x86_64`, `aarch64`, ...
    pub processor: String,
}

impl Host {
    pub fn current() -> Self {
        Self {
            system_name: system_name_for(std::env::consts::OS).to_string(),
            processor: std::env::consts::ARCH.to_string(),
        }
    }

    pub fn new(system_name: impl Into<String>, processor: impl Into<String>) -> Self {
        Self {
            system_name: system_name.into(),
            processor: processor.into(),
        }
    }

    /// Separator for path lists, `${pathListSep}`.
    pub fn path_list_sep(&self) -> &'static str {
        if self.system_name == "Windows" { ";" } else { ":" }
    }
}

fn system_name_for(os: &str) -> &str {
    match os {
        "linux" => "Linux",
        "windows" => "Windows",
        "macos" => "Darwin",
        "freebsd" => "FreeBSD",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_host_uses_cmake_names() {
        let host = Host::current();
        #[cfg(target_os = "linux")]
        assert_eq!(host.system_name, "Linux");
        #[cfg(target_os = "macos")]
        assert_eq!(host.system_name, "Darwin");
        assert!(!host.processor.is_empty());
    }

    #[test]
    fn path_list_separator_follows_system() {
        assert_eq!(Host::new("Windows", "x86_64").path_list_sep(), ";");
        assert_eq!(Host::new("Linux", "x86_64").path_list_sep(), ":");
    }
}
