//! Reader for the `set()` commands of toolchain and triplet scripts
//!
//! Chain-loaded toolchain files and overlay triplets are CMake scripts, but
//! the only thing the resolver needs from them is which variables they set.
//! Commands other than `set` and `unset` are skipped, and control flow is
//! not evaluated: every `set` is applied in file order.

use crate::{Error, Result};
use buildcfg_fs::{NormalizedPath, io};
use std::collections::BTreeMap;

/// Variables set by a script, in the state after the last command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainScript {
    path: NormalizedPath,
    variables: BTreeMap<String, String>,
}

impl ToolchainScript {
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let content = io::read_text(path)?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &NormalizedPath, content: &str) -> Result<Self> {
        let mut variables = BTreeMap::new();
        if let Some(dir) = path.parent() {
            variables.insert("CMAKE_CURRENT_LIST_DIR".to_string(), dir.to_string());
        }
        variables.insert("CMAKE_CURRENT_LIST_FILE".to_string(), path.to_string());

        let commands = Lexer::new(path, content).commands()?;
        for command in commands {
            apply(&command, &mut variables);
        }

        Ok(Self {
            path: path.clone(),
            variables,
        })
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }
}

#[derive(Debug)]
struct Command {
    name: String,
    args: Vec<Arg>,
}

#[derive(Debug)]
struct Arg {
    text: String,
}

fn apply(command: &Command, variables: &mut BTreeMap<String, String>) {
    let expanded: Vec<String> = command
        .args
        .iter()
        .map(|a| expand(&a.text, variables))
        .collect();

    match command.name.to_ascii_lowercase().as_str() {
        "set" => {
            let Some((name, rest)) = expanded.split_first() else {
                return;
            };
            let values: Vec<&str> = rest
                .iter()
                .map(String::as_str)
                .take_while(|v| *v != "CACHE" && *v != "PARENT_SCOPE")
                .collect();
            if values.is_empty() {
                variables.remove(name);
            } else {
                variables.insert(name.clone(), values.join(";"));
            }
        }
        "unset" => {
            if let Some(name) = expanded.first() {
                variables.remove(name);
            }
        }
        _ => {}
    }
}

/// Replace `${NAME}` references. Unknown names expand to nothing.
fn expand(text: &str, variables: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                if let Some(value) = variables.get(&after[..end]) {
                    out.push_str(value);
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

struct Lexer<'a> {
    path: &'a NormalizedPath,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(path: &'a NormalizedPath, content: &'a str) -> Self {
        Self {
            path,
            chars: content.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_comment(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn commands(mut self) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        while let Some(&c) = self.chars.peek() {
            if c == '#' {
                self.skip_comment();
            } else if c.is_ascii_alphabetic() || c == '_' {
                let name = self.identifier();
                self.skip_spaces();
                if self.chars.peek() == Some(&'(') {
                    let line = self.line;
                    self.bump();
                    let args = self.arguments(line)?;
                    commands.push(Command { name, args });
                }
            } else if c == ')' {
                return Err(Error::UnbalancedParens {
                    path: self.path.to_native(),
                    line: self.line,
                });
            } else {
                self.bump();
            }
        }
        Ok(commands)
    }

    fn identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        name
    }

    fn skip_spaces(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == ' ' || c == '\t' {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Read arguments up to the `)` matching the already consumed `(`.
    fn arguments(&mut self, start_line: usize) -> Result<Vec<Arg>> {
        let mut args = Vec::new();
        let mut depth = 1usize;
        loop {
            let Some(&c) = self.chars.peek() else {
                return Err(Error::UnbalancedParens {
                    path: self.path.to_native(),
                    line: start_line,
                });
            };
            match c {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '#' => self.skip_comment(),
                '(' => {
                    depth += 1;
                    self.bump();
                }
                ')' => {
                    self.bump();
                    depth -= 1;
                    if depth == 0 {
                        return Ok(args);
                    }
                }
                '"' => {
                    self.bump();
                    args.push(self.quoted()?);
                }
                _ => args.push(self.unquoted()),
            }
        }
    }

    fn quoted(&mut self) -> Result<Arg> {
        let line = self.line;
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Arg { text }),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(other) => text.push(other),
                    None => break,
                },
                Some(c) => text.push(c),
                None => break,
            }
        }
        Err(Error::UnterminatedQuote {
            path: self.path.to_native(),
            line,
        })
    }

    fn unquoted(&mut self) -> Arg {
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || c == '(' || c == ')' || c == '"' {
                break;
            }
            text.push(c);
            self.bump();
        }
        Arg { text }
    }
}
