//! # Site Variables
//!
//! Variables live in the cloned repository as one directory per site, each
//! holding plain-text files of `;`-separated records:
//!
//! ```text
//! variables/vty_ACL/HQ/acl_ssh_dc.txt
//!
//! # DC management hosts
//! 10.0.0.1;0.0.0.7
//! 10.0.0.2;0.0.0.3
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Every other line must
//! split into exactly the number of fields the generator expects, each one
//! non-empty after trimming. A single bad line rejects the whole file; no
//! partial result is ever returned.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, Result};

/// Field separator inside a variables line.
pub const DELIMITER: char = ';';

/// One data line of a variables file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableEntry {
    /// 1-based line number in the source file.
    pub line: usize,
    pub fields: Vec<String>,
}

impl VariableEntry {
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

/// Read and validate the variables file at `path`.
///
/// A missing file is an error, not an empty result.
pub fn read_entries(path: &Path, field_count: usize) -> Result<Vec<VariableEntry>> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::Validation {
            file: path.to_path_buf(),
            message: "variables file not found".to_string(),
        },
        _ => Error::Io(e),
    })?;
    parse_entries(&content, path, field_count)
}

/// Parse variables `content`; `file` is only used in error messages.
pub fn parse_entries(content: &str, file: &Path, field_count: usize) -> Result<Vec<VariableEntry>> {
    let mut entries = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<String> = line
            .split(DELIMITER)
            .map(|field| field.trim().to_string())
            .collect();

        if fields.len() != field_count {
            return Err(Error::Validation {
                file: file.to_path_buf(),
                message: format!(
                    "line {} '{}': expected {} fields separated by '{}', found {}",
                    index + 1,
                    line,
                    field_count,
                    DELIMITER,
                    fields.len()
                ),
            });
        }
        if let Some(position) = fields.iter().position(String::is_empty) {
            return Err(Error::Validation {
                file: file.to_path_buf(),
                message: format!("line {} '{}': field {} is empty", index + 1, line, position + 1),
            });
        }

        entries.push(VariableEntry {
            line: index + 1,
            fields,
        });
    }

    Ok(entries)
}

/// Names of the site directories directly under `root`, sorted.
///
/// A missing root yields an empty set. Plain files and hidden entries are ignored.
pub fn list_sites(root: &Path) -> Result<BTreeSet<String>> {
    let read_dir = match fs::read_dir(root) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(Error::Io(e)),
    };

    let mut sites = BTreeSet::new();
    for entry in read_dir {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        sites.insert(name);
    }
    Ok(sites)
}
