//! Rule file input.
//!
//! Shard files and previously-retained files share one format: one rule per
//! line, blank lines and comments ignored.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::CuratorError;
use crate::rules::Rule;

/// True for AdGuard (`!`) and hosts-style (`#`) comment lines. Cosmetic
/// selectors such as `##.ad` or `#@#.ad` are rules, not comments.
pub fn is_comment(line: &str) -> bool {
    if line.starts_with('!') {
        return true;
    }
    match line.strip_prefix('#') {
        Some(rest) => !matches!(
            rest.chars().next(),
            Some('#') | Some('@') | Some('?') | Some('$') | Some('%')
        ),
        None => false,
    }
}

/// Parse rule text into a de-duplicated, ordered rule set.
pub fn parse_rules(content: &str) -> BTreeSet<Rule> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_comment(line))
        .map(str::to_string)
        .collect()
}

/// Read the shard to process. A missing shard is fatal for the round.
pub fn load_shard(path: &Path) -> Result<BTreeSet<Rule>, CuratorError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(parse_rules(&content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(CuratorError::MissingShard(path.to_path_buf()))
        }
        Err(source) => Err(CuratorError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Read the rules retained by the previous round. Missing means first round.
pub fn load_previous(path: &Path) -> Result<BTreeSet<Rule>, CuratorError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(parse_rules(&content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No previous retained file, starting fresh");
            Ok(BTreeSet::new())
        }
        Err(source) => Err(CuratorError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
