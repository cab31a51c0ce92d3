use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn lintel_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lintel"));
    cmd.current_dir(dir).arg("--no-color").arg("--no-progress");
    cmd
}

/// A project directory: `.git` stops config discovery at the temp root.
fn project(config: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();
    if !config.is_empty() {
        fs::write(dir.path().join("lintel.toml"), config).unwrap();
    }
    dir
}

fn write(dir: &TempDir, rel: &str, content: &str) {
    let path = dir.path().join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// ===========================================
// Exit codes
// ===========================================

#[test]
fn test_clean_project_exits_0() {
    let dir = project("[rules]\nno-trailing-spaces = \"error\"\neol-last = \"error\"\n");
    write(&dir, "src/a.js", "let a = 1;\n");

    let output = lintel_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
}

#[test]
fn test_errors_exit_1_and_are_reported() {
    let dir = project("[rules]\nno-trailing-spaces = \"error\"\n");
    write(&dir, "src/a.js", "let a = 1;  \n");

    let output = lintel_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let out = stdout(&output);
    assert!(out.contains("src/a.js"));
    assert!(out.contains("1:11"));
    assert!(out.contains("no-trailing-spaces"));
    assert!(out.contains("1 problem(s) (1 error(s), 0 warning(s))"));
}

#[test]
fn test_warnings_pass_unless_max_warnings_exceeded() {
    let dir = project("[rules]\neol-last = \"warn\"\n");
    write(&dir, "a.js", "let a = 1;");

    let output = lintel_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("eol-last"));

    let output = lintel_cmd(dir.path()).args(["--max-warnings", "0"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_quiet_hides_warnings() {
    let dir = project("[rules]\neol-last = \"warn\"\nno-trailing-spaces = \"error\"\n");
    write(&dir, "a.js", "let a = 1; ");

    let output = lintel_cmd(dir.path()).arg("--quiet").output().unwrap();
    let out = stdout(&output);
    assert!(out.contains("no-trailing-spaces"));
    assert!(!out.contains("eol-last"));
}

// ===========================================
// Layering
// ===========================================

#[test]
fn test_override_section_turns_rule_off() {
    let dir = project(
        r#"
[rules]
no-warning-comments = "error"

[[overrides]]
files = ["test/**"]
[overrides.rules]
no-warning-comments = "off"
"#,
    );
    write(&dir, "src/a.js", "// TODO: fix\n");
    write(&dir, "test/a.js", "// TODO: fix\n");

    let output = lintel_cmd(dir.path()).output().unwrap();
    let out = stdout(&output);
    assert_eq!(output.status.code(), Some(1));
    assert!(out.contains("src/a.js"));
    assert!(!out.contains("test/a.js"));
}

#[test]
fn test_nested_config_is_scoped_to_its_directory() {
    let dir = project("[rules]\nmax-len = [\"error\", 20]\n");
    write(&dir, "web/lintel.toml", "[rules]\nmax-len = [\"error\", 100]\n");
    let long = format!("const x = '{}';\n", "a".repeat(30));
    write(&dir, "web/a.js", &long);
    write(&dir, "lib/a.js", &long);

    let output = lintel_cmd(dir.path()).output().unwrap();
    let out = stdout(&output);
    assert!(out.contains("lib/a.js"));
    assert!(!out.contains("web/a.js"));
}

#[test]
fn test_editorconfig_is_least_specific_layer() {
    let dir = project("[rules]\nindent = \"error\"\n");
    write(&dir, ".editorconfig", "root = true\n\n[*.js]\nindent_size = 2\n");
    write(&dir, "a.js", "if (a) {\n  b();\n}\n");

    let output = lintel_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout(&output));
}

#[test]
fn test_cli_rule_overrides_config() {
    let dir = project("[rules]\nno-trailing-spaces = \"error\"\n");
    write(&dir, "a.js", "let a = 1; \n");

    let output = lintel_cmd(dir.path())
        .args(["--rule", "no-trailing-spaces=off"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_cli_rule_single_list_item() {
    let dir = project("");
    write(&dir, "a.js", "// HACK: around\n// TODO: later\n");

    let output = lintel_cmd(dir.path())
        .args(["--rule", "no-warning-comments=error:hack"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Unexpected 'hack' comment"));
    assert!(!out.contains("'todo'"));
}

#[test]
fn test_extension_filter() {
    let dir = project("[rules]\neol-last = \"error\"\n");
    write(&dir, "a.js", "x");
    write(&dir, "notes.txt", "x");

    let output = lintel_cmd(dir.path()).args(["--ext", "js"]).output().unwrap();
    let out = stdout(&output);
    assert!(out.contains("a.js"));
    assert!(!out.contains("notes.txt"));
}

#[test]
fn test_binary_files_are_skipped() {
    let dir = project("[rules]\neol-last = \"error\"\n");
    fs::write(dir.path().join("image.bin"), b"\x89PNG\x00\x00").unwrap();

    let output = lintel_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
}

// ===========================================
// Configuration errors
// ===========================================

#[test]
fn test_unknown_param_is_fatal() {
    let dir = project("[rules]\nindent = [\"error\", { width = 2 }]\n");
    write(&dir, "a.js", "x\n");

    let output = lintel_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let err = stderr(&output);
    assert!(err.contains("lintel.toml"));
    assert!(err.contains("width"));
}

#[test]
fn test_malformed_selector_is_fatal() {
    let dir = project("[[overrides]]\nfiles = [\"src/[abc\"]\n[overrides.rules]\neol-last = \"off\"\n");
    write(&dir, "a.js", "x\n");

    let output = lintel_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("src/[abc"));
}

#[test]
fn test_invalid_toml_is_fatal() {
    let dir = project("[rules\n");
    let output = lintel_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unknown_rule_is_reported_not_fatal() {
    let dir = project("[rules]\nsemi = \"error\"\n");
    write(&dir, "a.js", "x\n");

    let output = lintel_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Definition for rule 'semi' was not found"));
}

// ===========================================
// Output modes and commands
// ===========================================

#[test]
fn test_json_output() {
    let dir = project("[rules]\nno-trailing-spaces = \"warn\"\n");
    write(&dir, "a.js", "x \n");
    write(&dir, "b.js", "y\n");

    let output = lintel_cmd(dir.path()).args(["--format", "json"]).output().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(value["summary"]["warnings"], 1);
    assert_eq!(value["files"].as_array().unwrap().len(), 2);
    assert_eq!(value["files"][0]["path"], "a.js");
    let diag = &value["files"][0]["diagnostics"][0];
    assert_eq!(diag["rule"], "no-trailing-spaces");
    assert_eq!(diag["severity"], "warn");
    assert_eq!(diag["location"]["line"], 1);
    assert_eq!(diag["location"]["column"], 2);
}

#[test]
fn test_print_config() {
    let dir = project(
        "[rules]\nmax-len = { level = \"warn\", max = 100 }\n\n[[overrides]]\nfiles = [\"test/**\"]\n[overrides.rules]\nmax-len = \"off\"\n",
    );

    let output = lintel_cmd(dir.path())
        .args(["--print-config", "src/a.js"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["path"], "src/a.js");
    assert_eq!(value["rules"]["max-len"]["severity"], "warn");
    assert_eq!(value["rules"]["max-len"]["params"]["max"], 100);

    let output = lintel_cmd(dir.path())
        .args(["--print-config", "test/a.js"])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["rules"]["max-len"]["severity"], "off");
    // Severity-only setting keeps the earlier parameters
    assert_eq!(value["rules"]["max-len"]["params"]["max"], 100);
}

#[test]
fn test_list_rules() {
    let dir = project("");
    let output = lintel_cmd(dir.path()).arg("--list-rules").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    for rule in [
        "indent",
        "no-trailing-spaces",
        "eol-last",
        "max-len",
        "no-multiple-empty-lines",
        "no-irregular-whitespace",
        "no-warning-comments",
    ] {
        assert!(out.contains(rule), "missing {rule}");
    }
}

#[test]
fn test_init_creates_config_once() {
    let dir = project("");

    let output = lintel_cmd(dir.path()).arg("--init").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(dir.path().join("lintel.toml").exists());

    let output = lintel_cmd(dir.path()).arg("--init").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("already exists"));
}

#[test]
fn test_explicit_config_path() {
    let dir = project("[rules]\neol-last = \"error\"\n");
    write(&dir, "alt/strict.toml", "[rules]\neol-last = \"off\"\n");
    write(&dir, "a.js", "x");

    let output = lintel_cmd(dir.path())
        .args(["--config", "alt/strict.toml", "a.js"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout(&output));
}
