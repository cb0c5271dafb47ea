//! Executable stand-ins.
//!
//! On Unix these are `/bin/sh` scripts marked executable. Elsewhere the
//! file is only written, which is enough for tests that check presence.

use std::fs;
use std::path::{Path, PathBuf};

/// Write a shell script at `path` that prints `stderr` to standard error
/// and exits with `exit_code`.
pub fn fake_executable(path: &Path, exit_code: i32, stderr: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }

    let mut script = String::from("#!/bin/sh\n");
    if !stderr.is_empty() {
        script.push_str(&format!("echo '{}' >&2\n", stderr.replace('\'', "'\\''")));
    }
    script.push_str(&format!("exit {exit_code}\n"));
    fs::write(path, script).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    path.to_path_buf()
}

/// Create `clang`, `clang++`, `gcc`, `g++` (or the given names) in `dir`.
pub fn fake_compiler_set(dir: &Path, names: &[&str]) -> PathBuf {
    let names: &[&str] = if names.is_empty() {
        &["clang", "clang++", "gcc", "g++"]
    } else {
        names
    };
    for name in names {
        fake_executable(&dir.join(name), 0, "");
    }
    dir.to_path_buf()
}
