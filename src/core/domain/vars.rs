//! Environment variable sets (`.tfvars`).
//!
//! Reads the flat `key = value` subset of HCL that environment files use:
//! quoted strings, numbers, booleans, `#` and `//` comments. List and map
//! values may span lines and are kept as raw text.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Variables for one environment, keyed by Terraform variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSet {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl VariableSet {
    /// Read and parse a `.tfvars` file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` if the file cannot be read, or
    /// `ConfigError::InvalidVariable` on a malformed line.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    /// Parse `.tfvars` text. `path` is only used in error messages.
    pub fn parse(contents: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut values = BTreeMap::new();
        let mut lines = contents.lines().enumerate();

        while let Some((index, raw)) = lines.next() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            let invalid = |reason: String| ConfigError::InvalidVariable {
                path: path.to_path_buf(),
                line: index + 1,
                reason,
            };

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| invalid(format!("expected `name = value`, got '{}'", line)))?;
            let key = key.trim();
            if !is_identifier(key) {
                return Err(invalid(format!("invalid variable name '{}'", key)).into());
            }

            let value = value.trim();
            let value = if value.starts_with('[') || value.starts_with('{') {
                // Collect continuation lines until brackets balance.
                let mut raw_value = value.to_string();
                let mut depth = bracket_depth(value);
                while depth > 0 {
                    let (_, next) = lines
                        .next()
                        .ok_or_else(|| invalid(format!("unterminated value for '{}'", key)))?;
                    let next = strip_comment(next).trim();
                    depth += bracket_depth(next);
                    raw_value.push('\n');
                    raw_value.push_str(next);
                }
                raw_value
            } else if value.starts_with('"') {
                unquote(value).ok_or_else(|| invalid(format!("unterminated string for '{}'", key)))?
            } else if value.is_empty() {
                return Err(invalid(format!("missing value for '{}'", key)).into());
            } else {
                value.to_string()
            };

            values.insert(key.to_string(), value);
        }

        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Drop a trailing `#` or `//` comment that is not inside a string.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else if b == b'"' {
            in_string = true;
        } else if b == b'#' || (b == b'/' && bytes.get(i + 1) == Some(&b'/')) {
            return &line[..i];
        }
        i += 1;
    }
    line
}

/// Net change in `[`/`{` nesting on a line, ignoring quoted text.
fn bracket_depth(line: &str) -> i32 {
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;
    for c in line.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => depth -= 1,
            _ => {}
        }
    }
    depth
}

fn unquote(value: &str) -> Option<String> {
    let inner = value.strip_prefix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                return chars.as_str().trim().is_empty().then_some(out);
            }
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                other => out.push(other),
            },
            c => out.push(c),
        }
    }
    None
}
