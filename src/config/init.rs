//! Template generation for `--init` command

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::file::CONFIG_FILE_NAME;

/// Template lintel.toml with documentation
pub const LINTEL_TOML_TEMPLATE: &str = r#"# lintel.toml - Configuration for the lintel rule engine
#
# Layers are merged from least to most specific:
#   .editorconfig -> this file -> lintel.toml files in subdirectories -> --rule
#
# A rule setting is one of:
#   "off" | "warn" | "error"  (or 0 | 1 | 2)
#   ["error", 4]                    positional parameters
#   ["warn", { max = 100 }]         named parameters
#   { level = "warn", max = 100 }   same, as a table

[settings]
# Findings kept per rule and file before the rest are summarized.
# max-diagnostics-per-rule = 100

# Only lint files with these extensions (default: all text files).
# extensions = ["js", "mjs"]

[rules]
indent = ["error", 4]
no-trailing-spaces = "warn"
eol-last = "warn"
# max-len = ["warn", { max = 100, ignore-patterns = ["^import "] }]
# no-multiple-empty-lines = ["warn", 2]
# no-irregular-whitespace = "warn"
# no-warning-comments = ["warn", ["todo", "fixme"]]

# Overrides apply to matching files after [rules], in order.
# `*` matches within a directory, `**` across directories.
[[overrides]]
files = ["test/**"]

[overrides.rules]
no-warning-comments = "off"
"#;

/// Generate lintel.toml in the specified directory (or current directory if None).
///
/// Returns an error if lintel.toml already exists.
pub fn generate_init_file_in(dir: Option<&Path>) -> io::Result<PathBuf> {
    let path = dir.map_or_else(|| PathBuf::from(CONFIG_FILE_NAME), |d| d.join(CONFIG_FILE_NAME));

    if path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{CONFIG_FILE_NAME} already exists"),
        ));
    }

    fs::write(&path, LINTEL_TOML_TEMPLATE)?;
    Ok(path)
}

/// Generate lintel.toml in the current directory.
///
/// Returns an error if lintel.toml already exists.
pub fn generate_init_file() -> io::Result<PathBuf> {
    generate_init_file_in(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{compile, fragment_from_toml, LintelToml};
    use crate::rules::builtin;
    use tempfile::TempDir;

    #[test]
    fn test_generate_init_file_creates_file() {
        let dir = TempDir::new().unwrap();

        let result = generate_init_file_in(Some(dir.path()));
        assert!(result.is_ok());

        let path = result.unwrap();
        assert!(path.exists());
        assert_eq!(path, dir.path().join("lintel.toml"));

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[rules]"));
        assert!(content.contains("[[overrides]]"));
    }

    #[test]
    fn test_generate_init_file_fails_if_exists() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("lintel.toml");

        // Create existing file
        fs::write(&config_path, "existing").unwrap();

        let result = generate_init_file_in(Some(dir.path()));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_template_compiles_against_builtin_rules() {
        let parsed: LintelToml = toml::from_str(LINTEL_TOML_TEMPLATE).unwrap();
        let fragment = fragment_from_toml("template", "", &parsed).unwrap();
        let registry = builtin::registry().unwrap();
        assert!(compile(&[fragment], registry.catalog()).is_ok());
    }
}
