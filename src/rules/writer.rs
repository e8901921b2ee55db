//! Retained rule output.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::CuratorError;
use crate::persist::write_atomic;
use crate::rules::Rule;

/// Render the retained set, sorted, one rule per line.
pub fn render_rules(rules: &BTreeSet<Rule>) -> String {
    let mut out = String::with_capacity(rules.iter().map(|r| r.len() + 1).sum());
    for rule in rules {
        out.push_str(rule);
        out.push('\n');
    }
    out
}

/// Replace the shard's retained file.
pub fn write_retained(path: &Path, rules: &BTreeSet<Rule>) -> Result<(), CuratorError> {
    write_atomic(path, render_rules(rules).as_bytes()).map_err(|source| CuratorError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), rules = rules.len(), "Retained rules written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::source::load_previous;

    #[test]
    fn test_written_file_reads_back_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dist").join("validated_part_02.txt");
        let rules: BTreeSet<Rule> = ["||z.example.com^", "||a.example.com^"]
            .into_iter()
            .map(String::from)
            .collect();

        write_retained(&path, &rules).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "||a.example.com^\n||z.example.com^\n");
        assert_eq!(load_previous(&path).unwrap(), rules);
    }

    #[test]
    fn test_empty_set_renders_empty_file() {
        assert_eq!(render_rules(&BTreeSet::new()), "");
    }
}
