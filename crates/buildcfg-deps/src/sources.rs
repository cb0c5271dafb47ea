//! Binary source specification strings
//!
//! The format is a `;`-separated list of sources. A backtick escapes the
//! following character, so paths may contain `;` or `,`.
//!
//! ```text
//! clear;files,/cache/vcpkg,readwrite
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Access a binary source grants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    Read,
    Write,
    #[default]
    ReadWrite,
}

impl CacheMode {
    pub fn can_read(&self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    pub fn can_write(&self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::ReadWrite => "readwrite",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "read" => Some(Self::Read),
            "write" => Some(Self::Write),
            "readwrite" => Some(Self::ReadWrite),
            _ => None,
        }
    }
}

impl std::fmt::Display for CacheMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BinarySource {
    Clear,
    Default { mode: CacheMode },
    Files { path: String, mode: CacheMode },
}

/// A parsed binary source list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BinarySources {
    pub sources: Vec<BinarySource>,
}

impl BinarySources {
    /// `clear;files,<path>,<mode>`: only the given directory is consulted.
    pub fn files_only(path: &str, mode: CacheMode) -> Self {
        Self {
            sources: vec![
                BinarySource::Clear,
                BinarySource::Files {
                    path: path.to_string(),
                    mode,
                },
            ],
        }
    }

    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidBinarySource {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let mut sources = Vec::new();
        for segment in split_escaped(spec, ';').map_err(|r| invalid(&r))? {
            let fields = split_escaped(&segment, ',').map_err(|r| invalid(&r))?;
            let Some(kind) = fields.first() else {
                continue;
            };
            let mode = |index: usize| -> Result<CacheMode> {
                match fields.get(index) {
                    None => Ok(CacheMode::Read),
                    Some(value) => CacheMode::parse(value)
                        .ok_or_else(|| invalid(&format!("unknown mode '{value}'"))),
                }
            };

            let source = match kind.as_str() {
                "" if fields.len() == 1 => continue,
                "clear" if fields.len() == 1 => BinarySource::Clear,
                "clear" => return Err(invalid("'clear' takes no arguments")),
                "default" if fields.len() <= 2 => BinarySource::Default { mode: mode(1)? },
                "files" if (2..=3).contains(&fields.len()) => {
                    let path = fields[1].clone();
                    if path.is_empty() {
                        return Err(invalid("'files' needs a path"));
                    }
                    BinarySource::Files {
                        path,
                        mode: mode(2)?,
                    }
                }
                "default" | "files" => return Err(invalid("wrong number of arguments")),
                other => return Err(invalid(&format!("unknown source kind '{other}'"))),
            };
            sources.push(source);
        }

        Ok(Self { sources })
    }

    /// The effective list after the last `clear`.
    pub fn effective(&self) -> &[BinarySource] {
        match self
            .sources
            .iter()
            .rposition(|s| matches!(s, BinarySource::Clear))
        {
            Some(index) => &self.sources[index + 1..],
            None => &self.sources,
        }
    }

    /// The first files source still in effect, if any.
    pub fn files_source(&self) -> Option<(&str, CacheMode)> {
        self.effective().iter().find_map(|s| match s {
            BinarySource::Files { path, mode } => Some((path.as_str(), *mode)),
            _ => None,
        })
    }
}

impl std::fmt::Display for BinarySources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self
            .sources
            .iter()
            .map(|source| match source {
                BinarySource::Clear => "clear".to_string(),
                BinarySource::Default { mode } => format!("default,{mode}"),
                BinarySource::Files { path, mode } => format!("files,{},{mode}", escape(path)),
            })
            .collect();
        write!(f, "{}", rendered.join(";"))
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '`' | ',' | ';') {
            out.push('`');
        }
        out.push(c);
    }
    out
}

/// Split on `separator`, honouring backtick escapes. Escapes of the other
/// separator are kept so a second split still sees them.
fn split_escaped(value: &str, separator: char) -> std::result::Result<Vec<String>, String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c == '`' {
            let Some(next) = chars.next() else {
                return Err("dangling escape character".to_string());
            };
            if separator == ';' {
                current.push('`');
            }
            current.push(next);
        } else if c == separator {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    Ok(parts)
}
