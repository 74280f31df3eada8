//! Remote branch selection.
//!
//! `git branch -r --list origin/<pattern>` does the heavy lifting; this module
//! turns its output into plain branch names and re-checks every name against
//! the pattern, so the selection rules do not depend on git's own matcher.
//! Matching is case-sensitive and anchored: `candidate*` selects
//! `candidate-1` but not `release-candidate` or `CANDIDATE1`.

use glob::Pattern;

use crate::error::Result;

/// A compiled branch-name glob.
#[derive(Debug, Clone)]
pub struct BranchPattern {
    raw: String,
    pattern: Pattern,
}

impl BranchPattern {
    pub fn new(raw: &str) -> Result<Self> {
        Ok(Self {
            raw: raw.to_string(),
            pattern: Pattern::new(raw)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, branch: &str) -> bool {
        self.pattern.matches(branch)
    }
}

/// Parse `git branch -r` output into branch names under `remote`.
///
/// Entries outside `remote`, symbolic refs (`origin/HEAD -> origin/main`)
/// and names not matching `pattern` are dropped. Listing order is kept.
pub fn parse_remote_listing(output: &str, remote: &str, pattern: &BranchPattern) -> Vec<String> {
    let prefix = format!("{}/", remote);
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains(" -> "))
        .filter_map(|line| line.strip_prefix(&prefix))
        .filter(|name| pattern.matches(name))
        .map(str::to_string)
        .collect()
}
