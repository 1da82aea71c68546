//! Source-line snippets for error reporting (`spec.md` §4.6, §4.7).
//!
//! The facade caches a split-into-lines view of every compiled script
//! alongside its `Block`, so that attaching a snippet to a later runtime
//! error doesn't re-scan the source from scratch.

/// Splits `source` into its lines, without trailing `\n`/`\r`. Index `i`
/// holds line `i + 1`.
pub fn split_lines(source: &str) -> Vec<String> {
    source.lines().map(str::to_string).collect()
}

/// Looks up the 1-based `line` in an already-split line table.
pub fn snippet_for(lines: &[String], line: usize) -> Option<String> {
    if line == 0 {
        return None;
    }
    lines.get(line - 1).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_one_based() {
        let lines = split_lines("a\nb\nc");
        assert_eq!(snippet_for(&lines, 1).as_deref(), Some("a"));
        assert_eq!(snippet_for(&lines, 3).as_deref(), Some("c"));
        assert_eq!(snippet_for(&lines, 0), None);
    }

    #[test]
    fn handles_crlf_uniformly() {
        let lines = split_lines("a\r\nb\r\nc");
        assert_eq!(lines, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }
}
