//! Preset macro expansion
//!
//! Supported forms: `${sourceDir}`, `${sourceParentDir}`, `${sourceDirName}`,
//! `${presetName}`, `${generator}`, `${hostSystemName}`, `${fileDir}`,
//! `${dollar}`, `${pathListSep}`, `$env{NAME}` and `$penv{NAME}`.
//! `$vendor{...}` is left untouched. A `$` that does not start one of these
//! forms is kept literally.

use crate::error::ConfigurationError;
use crate::host::HostContext;
use buildcfg_fs::NormalizedPath;
use std::collections::BTreeMap;

/// Values the macros of one preset expand to.
#[derive(Debug, Clone, Copy)]
pub struct MacroContext<'a> {
    pub source_dir: &'a NormalizedPath,
    pub file_dir: &'a NormalizedPath,
    pub preset_name: &'a str,
    pub generator: Option<&'a str>,
    pub host: &'a HostContext,
    /// The preset's expanded environment. `$env{}` looks here before the host.
    pub preset_env: Option<&'a BTreeMap<String, String>>,
}

impl<'a> MacroContext<'a> {
    pub fn with_preset_env(self, env: &'a BTreeMap<String, String>) -> Self {
        Self {
            preset_env: Some(env),
            ..self
        }
    }

    fn builtin(&self, name: &str) -> Option<String> {
        let value = match name {
            "sourceDir" => self.source_dir.to_string(),
            "sourceParentDir" => self
                .source_dir
                .parent()
                .map(|p| p.to_string())
                .unwrap_or_default(),
            "sourceDirName" => self.source_dir.file_name().unwrap_or_default().to_string(),
            "presetName" => self.preset_name.to_string(),
            "generator" => self.generator.unwrap_or_default().to_string(),
            "hostSystemName" => self.host.host.system_name.clone(),
            "fileDir" => self.file_dir.to_string(),
            "dollar" => "$".to_string(),
            "pathListSep" => self.host.host.path_list_sep().to_string(),
            _ => return None,
        };
        Some(value)
    }

    fn env(&self, name: &str) -> String {
        self.preset_env
            .and_then(|env| env.get(name))
            .or_else(|| self.host.env.get(name))
            .cloned()
            .unwrap_or_default()
    }

    fn penv(&self, name: &str) -> String {
        self.host.env.get(name).cloned().unwrap_or_default()
    }
}

/// Expand every macro in `value`.
pub fn expand(value: &str, context: &MacroContext<'_>) -> Result<String, ConfigurationError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];

        let Some(open) = tail.find('{') else {
            out.push('$');
            rest = tail;
            continue;
        };
        let namespace = &tail[..open];
        if !matches!(namespace, "" | "env" | "penv" | "vendor") {
            out.push('$');
            rest = tail;
            continue;
        }
        let Some(close) = tail[open..].find('}') else {
            out.push('$');
            rest = tail;
            continue;
        };
        let name = &tail[open + 1..open + close];
        let token = &tail[..open + close + 1];

        match namespace {
            "" => match context.builtin(name) {
                Some(expanded) => out.push_str(&expanded),
                None => {
                    return Err(ConfigurationError::UnknownMacro {
                        preset: context.preset_name.to_string(),
                        name: format!("${token}"),
                    });
                }
            },
            "env" => out.push_str(&context.env(name)),
            "penv" => out.push_str(&context.penv(name)),
            _ => {
                out.push('$');
                out.push_str(token);
            }
        }
        rest = &tail[open + close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildcfg_toolchain::Host;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn host() -> HostContext {
        HostContext::new(
            Host::new("Linux", "x86_64"),
            BTreeMap::from([
                ("HOME".to_string(), "/home/dev".to_string()),
                ("CC".to_string(), "gcc".to_string()),
            ]),
        )
    }

    fn expand_with(value: &str, preset_env: Option<&BTreeMap<String, String>>) -> Result<String, ConfigurationError> {
        let host = host();
        let source = NormalizedPath::new("/work/app");
        let file_dir = NormalizedPath::new("/work/app/presets");
        let context = MacroContext {
            source_dir: &source,
            file_dir: &file_dir,
            preset_name: "debug",
            generator: Some("Ninja"),
            host: &host,
            preset_env,
        };
        expand(value, &context)
    }

    #[rstest]
    #[case("${sourceDir}/build/${presetName}", "/work/app/build/debug")]
    #[case("${sourceParentDir}", "/work")]
    #[case("${sourceDirName}", "app")]
    #[case("${generator}", "Ninja")]
    #[case("${hostSystemName}", "Linux")]
    #[case("${fileDir}/x.cmake", "/work/app/presets/x.cmake")]
    #[case("cost: ${dollar}5", "cost: $5")]
    #[case("a${pathListSep}b", "a:b")]
    #[case("$penv{HOME}/.cache", "/home/dev/.cache")]
    #[case("$env{MISSING}", "")]
    #[case("$vendor{acme.tool}", "$vendor{acme.tool}")]
    #[case("plain $ sign", "plain $ sign")]
    fn expands_macros(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(expand_with(input, None).unwrap(), expected);
    }

    #[test]
    fn env_prefers_preset_environment() {
        let preset_env = BTreeMap::from([("CC".to_string(), "clang".to_string())]);
        assert_eq!(expand_with("$env{CC}", Some(&preset_env)).unwrap(), "clang");
        assert_eq!(expand_with("$penv{CC}", Some(&preset_env)).unwrap(), "gcc");
    }

    #[test]
    fn unknown_macro_is_rejected() {
        let err = expand_with("${sourceDirectory}", None).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::UnknownMacro { ref name, .. } if name == "${sourceDirectory}"
        ));
    }
}
