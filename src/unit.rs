//! Analyzed units and path normalization.

use std::path::{Component, Path};

/// Anything the dispatcher can run rules against.
///
/// The only requirement is a stable, normalized path used for config
/// resolution; rules decide what else they need from the unit.
pub trait Unit: Sync {
    fn path(&self) -> &str;
}

/// Line-list representation of a text file.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    path: String,
    text: String,
    line_starts: Vec<usize>,
}

impl SourceUnit {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = if text.is_empty() { vec![] } else { vec![0] };
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        // A trailing newline does not start another line
        if line_starts.len() > 1 && line_starts.last() == Some(&text.len()) {
            line_starts.pop();
        }
        Self {
            path: path.into(),
            text,
            line_starts,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Iterate `(line_number, line)` with 1-based numbers and the line
    /// terminator (`\n` or `\r\n`) removed.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.line_starts.iter().enumerate().map(|(idx, &start)| {
            let end = self
                .line_starts
                .get(idx + 1)
                .copied()
                .unwrap_or(self.text.len());
            let line = &self.text[start..end];
            let line = line.strip_suffix('\n').unwrap_or(line);
            let line = line.strip_suffix('\r').unwrap_or(line);
            (idx + 1, line)
        })
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

impl Unit for SourceUnit {
    fn path(&self) -> &str {
        &self.path
    }
}

/// Normalize `path` into the form selectors match against: relative to
/// `root` when it lives below it, `/`-separated, with `.` segments and
/// redundant separators removed.
pub fn normalize_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut parts: Vec<String> = Vec::new();

    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().replace('\\', "/")),
            Component::ParentDir => {
                if parts.last().is_some_and(|p| p != "..") {
                    parts.pop();
                } else {
                    parts.push("..".to_string());
                }
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_one_based_without_terminators() {
        let unit = SourceUnit::new("a.js", "one\r\ntwo\nthree\n");
        let lines: Vec<_> = unit.lines().collect();
        assert_eq!(lines, vec![(1, "one"), (2, "two"), (3, "three")]);
        assert_eq!(unit.line_count(), 3);
    }

    #[test]
    fn test_lines_without_trailing_newline() {
        let unit = SourceUnit::new("a.js", "one\ntwo");
        let lines: Vec<_> = unit.lines().collect();
        assert_eq!(lines, vec![(1, "one"), (2, "two")]);
    }

    #[test]
    fn test_empty_unit_has_no_lines() {
        let unit = SourceUnit::new("a.js", "");
        assert_eq!(unit.line_count(), 0);
        assert_eq!(unit.lines().count(), 0);
    }

    #[test]
    fn test_normalize_path_relative_to_root() {
        let root = Path::new("/repo");
        assert_eq!(
            normalize_path(root, Path::new("/repo/src/./lib/a.js")),
            "src/lib/a.js"
        );
        assert_eq!(normalize_path(root, Path::new("./test/a.js")), "test/a.js");
        assert_eq!(normalize_path(root, Path::new("src/../test/a.js")), "test/a.js");
    }

    #[test]
    fn test_normalize_path_outside_root_keeps_components() {
        let root = Path::new("/repo");
        assert_eq!(normalize_path(root, Path::new("/other/a.js")), "other/a.js");
    }
}
