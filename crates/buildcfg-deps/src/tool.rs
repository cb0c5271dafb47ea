//! Invocation of the external dependency manager

use crate::contract::DependencyRequest;
use crate::{Error, Result};
use buildcfg_fs::NormalizedPath;
use std::process::{Command, Stdio};

/// Something that can satisfy a [`DependencyRequest`] end to end.
pub trait ExternalResolver {
    fn install(&self, request: &DependencyRequest) -> Result<()>;
}

/// The `vcpkg` executable of a pinned checkout.
#[derive(Debug, Clone)]
pub struct VcpkgTool {
    root: NormalizedPath,
}

impl VcpkgTool {
    pub fn new(root: NormalizedPath) -> Self {
        Self { root }
    }

    pub fn executable(&self) -> NormalizedPath {
        let name = if cfg!(windows) { "vcpkg.exe" } else { "vcpkg" };
        self.root.join(name)
    }

    /// The full command line, for display and dry runs.
    pub fn command_line(&self, request: &DependencyRequest) -> Vec<String> {
        std::iter::once(self.executable().to_string())
            .chain(request.args())
            .collect()
    }
}

impl ExternalResolver for VcpkgTool {
    /// Runs the tool with stdout inherited and stderr captured, so a failure
    /// can carry the tool's own diagnostic.
    fn install(&self, request: &DependencyRequest) -> Result<()> {
        let executable = self.executable();
        if !executable.is_file() {
            return Err(Error::ToolNotFound {
                path: executable.to_native(),
            });
        }

        let command = format!("{} install", executable);
        tracing::debug!(args = ?request.args(), "Running dependency manager");

        let output = Command::new(executable.to_native())
            .args(request.args())
            .envs(request.env())
            .env("VCPKG_ROOT", self.root.to_native())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| Error::Spawn {
                command: command.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        Err(Error::ToolFailed {
            command,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        })
    }
}
