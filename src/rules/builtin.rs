//! Language-agnostic line rules over [`SourceUnit`].
//!
//! None of these need a grammar: they look at indentation, line length,
//! whitespace and marker words line by line.

use regex::Regex;

use super::{ParamKind, ParamSpec, Rule, RuleContext, RuleFault, RuleRegistry};
use crate::config::ConfigError;
use crate::unit::SourceUnit;
use crate::{Finding, Location};

/// Full-width space character (U+3000)
const FULLWIDTH_SPACE: char = '\u{3000}';

/// Zero-width characters (BOM is allowed at file start)
const ZERO_WIDTH_CHARS: &[char] = &[
    '\u{200B}', // Zero Width Space (ZWSP)
    '\u{200C}', // Zero Width Non-Joiner (ZWNJ)
    '\u{200D}', // Zero Width Joiner (ZWJ)
    '\u{200E}', // Left-to-Right Mark
    '\u{200F}', // Right-to-Left Mark
    '\u{2060}', // Word Joiner
    '\u{FEFF}', // Byte Order Mark (BOM)
];

/// Registry holding every built-in rule.
pub fn registry() -> Result<RuleRegistry, ConfigError> {
    let mut registry = RuleRegistry::new();
    register_all(&mut registry)?;
    Ok(registry)
}

pub fn register_all(registry: &mut RuleRegistry) -> Result<(), ConfigError> {
    registry.register(Indent)?;
    registry.register(NoTrailingSpaces)?;
    registry.register(EolLast)?;
    registry.register(MaxLen)?;
    registry.register(NoMultipleEmptyLines)?;
    registry.register(NoIrregularWhitespace)?;
    registry.register(NoWarningComments)?;
    Ok(())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Leading run of spaces and tabs.
fn indentation(line: &str) -> &str {
    let end = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..end]
}

pub struct Indent;

impl Rule for Indent {
    fn name(&self) -> &'static str {
        "indent"
    }

    fn description(&self) -> &'static str {
        "enforce consistent indentation width and character"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("size", ParamKind::Int, 4),
            ParamSpec::new("style", ParamKind::Str, "space"),
        ]
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleFault> {
        let size = ctx.usize_param("size")?;
        let tabs = match ctx.str_param("style")? {
            "space" => false,
            "tab" => true,
            other => {
                return Err(RuleFault::new(format!(
                    "style must be \"space\" or \"tab\", got \"{other}\""
                )))
            }
        };
        if size == 0 && !tabs {
            return Err(RuleFault::new("size must be at least 1"));
        }

        let mut findings = Vec::new();
        for (line_no, line) in unit.lines() {
            let indent = indentation(line);
            let rest = &line[indent.len()..];
            // Blank lines and block comment continuations (` * text`)
            if rest.is_empty() || rest.starts_with('*') {
                continue;
            }

            let width = indent.len();
            let location = Location::new(line_no, 1, width + 1);
            if tabs {
                if indent.contains(' ') {
                    findings.push(Finding::new(location, "Expected indentation with tabs but found spaces"));
                }
            } else if indent.contains('\t') {
                findings.push(Finding::new(location, "Expected indentation with spaces but found a tab"));
            } else if width % size != 0 {
                findings.push(Finding::new(
                    location,
                    format!("Expected indentation to be a multiple of {size} spaces but found {width}"),
                ));
            }
        }
        Ok(findings)
    }
}

pub struct NoTrailingSpaces;

impl Rule for NoTrailingSpaces {
    fn name(&self) -> &'static str {
        "no-trailing-spaces"
    }

    fn description(&self) -> &'static str {
        "disallow whitespace at the end of lines"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new("skip-blank-lines", ParamKind::Bool, false)]
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleFault> {
        let skip_blank = ctx.bool_param("skip-blank-lines")?;

        Ok(unit
            .lines()
            .filter_map(|(line_no, line)| {
                let trimmed = line.trim_end_matches([' ', '\t']);
                if trimmed.len() == line.len() || (skip_blank && trimmed.is_empty()) {
                    return None;
                }
                Some(Finding::new(
                    Location::new(line_no, char_len(trimmed) + 1, char_len(line) + 1),
                    "Trailing spaces not allowed",
                ))
            })
            .collect())
    }
}

pub struct EolLast;

impl Rule for EolLast {
    fn name(&self) -> &'static str {
        "eol-last"
    }

    fn description(&self) -> &'static str {
        "require a newline at the end of files"
    }

    fn inspect(&self, unit: &SourceUnit, _: &RuleContext<'_>) -> Result<Vec<Finding>, RuleFault> {
        let text = unit.text();
        if text.is_empty() || text.ends_with('\n') {
            return Ok(vec![]);
        }
        let (line_no, last) = unit.lines().last().unwrap_or((1, ""));
        Ok(vec![Finding::new(
            Location::at(line_no, char_len(last) + 1),
            "Newline required at end of file but not found",
        )])
    }
}

pub struct MaxLen;

impl Rule for MaxLen {
    fn name(&self) -> &'static str {
        "max-len"
    }

    fn description(&self) -> &'static str {
        "enforce a maximum line length in characters"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("max", ParamKind::Int, 80),
            ParamSpec::mergeable("ignore-patterns", vec![]),
        ]
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleFault> {
        let max = ctx.usize_param("max")?;
        let ignore = ctx
            .str_list_param("ignore-patterns")?
            .into_iter()
            .map(|p| Regex::new(p).map_err(|e| RuleFault::new(format!("invalid ignore pattern: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(unit
            .lines()
            .filter_map(|(line_no, line)| {
                let length = char_len(line);
                if length <= max || ignore.iter().any(|re| re.is_match(line)) {
                    return None;
                }
                Some(Finding::new(
                    Location::new(line_no, max + 1, length + 1),
                    format!("This line has a length of {length}. Maximum allowed is {max}"),
                ))
            })
            .collect())
    }
}

pub struct NoMultipleEmptyLines;

impl Rule for NoMultipleEmptyLines {
    fn name(&self) -> &'static str {
        "no-multiple-empty-lines"
    }

    fn description(&self) -> &'static str {
        "limit consecutive blank lines"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new("max", ParamKind::Int, 2)]
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleFault> {
        let max = ctx.usize_param("max")?;
        let mut findings = vec![];
        let mut blank_count = 0;
        let mut problem_start_line = 0;

        let report = |found: usize, line: usize, findings: &mut Vec<Finding>| {
            findings.push(Finding::new(
                Location::at(line, 1),
                format!("Too many blank lines ({found}). Maximum allowed is {max}"),
            ));
        };

        for (line_no, line) in unit.lines() {
            if line.trim().is_empty() {
                blank_count += 1;
                if blank_count == max + 1 {
                    // Record the start of excessive blank lines
                    problem_start_line = line_no;
                }
            } else {
                if blank_count > max {
                    report(blank_count, problem_start_line, &mut findings);
                }
                blank_count = 0;
            }
        }

        // Handle trailing blank lines
        if blank_count > max {
            report(blank_count, problem_start_line, &mut findings);
        }

        Ok(findings)
    }
}

pub struct NoIrregularWhitespace;

impl Rule for NoIrregularWhitespace {
    fn name(&self) -> &'static str {
        "no-irregular-whitespace"
    }

    fn description(&self) -> &'static str {
        "disallow full-width spaces and zero-width characters"
    }

    fn inspect(&self, unit: &SourceUnit, _: &RuleContext<'_>) -> Result<Vec<Finding>, RuleFault> {
        let mut findings = vec![];

        for (line_no, line) in unit.lines() {
            for (idx, ch) in line.chars().enumerate() {
                let is_bom_at_start = ch == '\u{FEFF}' && line_no == 1 && idx == 0;
                let what = if ch == FULLWIDTH_SPACE {
                    "full-width space"
                } else if ZERO_WIDTH_CHARS.contains(&ch) && !is_bom_at_start {
                    "zero-width character"
                } else {
                    continue;
                };
                findings.push(Finding::new(
                    Location::at(line_no, idx + 1),
                    format!("Irregular whitespace: {what} U+{:04X}", ch as u32),
                ));
            }
        }

        Ok(findings)
    }
}

pub struct NoWarningComments;

impl Rule for NoWarningComments {
    fn name(&self) -> &'static str {
        "no-warning-comments"
    }

    fn description(&self) -> &'static str {
        "report marker words such as TODO and FIXME"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new("terms", ParamKind::List, vec!["todo", "fixme"])]
    }

    fn inspect(&self, unit: &SourceUnit, ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleFault> {
        let terms: Vec<&str> = ctx
            .str_list_param("terms")?
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Ok(vec![]);
        }

        // A marker must be followed by a delimiter: `TODO:`, `TODO `, `TODO(x)`.
        // Only terms starting with a word character get a leading boundary.
        let alternation = terms
            .iter()
            .map(|t| {
                let boundary = if t.starts_with(is_word_char) { r"\b" } else { "" };
                format!("{boundary}{}", regex::escape(t))
            })
            .collect::<Vec<_>>()
            .join("|");
        let marker = Regex::new(&format!(r"(?i)({alternation})(?:[:(\s]|$)"))
            .map_err(|e| RuleFault::new(format!("invalid term: {e}")))?;

        Ok(unit
            .lines()
            .filter_map(|(line_no, line)| {
                let caps = marker.captures(line)?;
                let term = caps.get(1)?;
                let column = char_len(&line[..term.start()]) + 1;
                Some(Finding::new(
                    Location::new(line_no, column, column + char_len(term.as_str())),
                    format!("Unexpected '{}' comment", term.as_str().to_lowercase()),
                ))
            })
            .collect())
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParamValue;
    use crate::rules::Params;

    fn run(rule: &dyn Rule, text: &str, overrides: &[(&str, ParamValue)]) -> Result<Vec<Finding>, RuleFault> {
        let mut params: Params = rule
            .params()
            .into_iter()
            .map(|spec| (spec.name.to_string(), spec.default))
            .collect();
        for (name, value) in overrides {
            params.insert(name.to_string(), value.clone());
        }
        let unit = SourceUnit::new("test.js", text);
        rule.inspect(&unit, &RuleContext::new(&params))
    }

    fn lines_of(findings: &[Finding]) -> Vec<usize> {
        findings.iter().map(|f| f.location.line).collect()
    }

    #[test]
    fn test_registry_holds_all_builtins() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), 7);
        assert!(registry.get("indent").is_some());
        assert!(registry.get("no-warning-comments").is_some());
    }

    // ===========================================
    // indent
    // ===========================================

    #[test]
    fn test_indent_multiple_of_size() {
        let text = "function f() {\n    ok();\n   bad();\n}\n";
        let findings = run(&Indent, text, &[]).unwrap();
        assert_eq!(lines_of(&findings), vec![3]);
        assert!(findings[0].message.contains("multiple of 4 spaces but found 3"));
    }

    #[test]
    fn test_indent_tab_when_spaces_expected() {
        let findings = run(&Indent, "a\n\tb\n", &[]).unwrap();
        assert_eq!(lines_of(&findings), vec![2]);
    }

    #[test]
    fn test_indent_tab_style() {
        let text = "a\n\tb\n  c\n";
        let findings = run(&Indent, text, &[("style", "tab".into())]).unwrap();
        assert_eq!(lines_of(&findings), vec![3]);
    }

    #[test]
    fn test_indent_skips_blank_and_comment_continuation() {
        let text = "/**\n * doc\n */\n\n  \nx\n";
        assert!(run(&Indent, text, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_indent_invalid_style_faults() {
        assert!(run(&Indent, "a\n", &[("style", "mixed".into())]).is_err());
        assert!(run(&Indent, "a\n", &[("size", ParamValue::Int(0))]).is_err());
    }

    // ===========================================
    // no-trailing-spaces
    // ===========================================

    #[test]
    fn test_trailing_spaces_columns() {
        let findings = run(&NoTrailingSpaces, "ok\nhello  \t\n", &[]).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location, Location::new(2, 6, 9));
    }

    #[test]
    fn test_trailing_spaces_skip_blank_lines() {
        let text = "a\n   \nb \n";
        assert_eq!(lines_of(&run(&NoTrailingSpaces, text, &[]).unwrap()), vec![2, 3]);
        let skipping = run(&NoTrailingSpaces, text, &[("skip-blank-lines", true.into())]).unwrap();
        assert_eq!(lines_of(&skipping), vec![3]);
    }

    #[test]
    fn test_trailing_spaces_crlf_is_not_whitespace() {
        assert!(run(&NoTrailingSpaces, "a\r\nb\r\n", &[]).unwrap().is_empty());
    }

    // ===========================================
    // eol-last
    // ===========================================

    #[test]
    fn test_eol_last_missing() {
        let findings = run(&EolLast, "a\nhello", &[]).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location, Location::at(2, 6));
    }

    #[test]
    fn test_eol_last_present_or_empty() {
        assert!(run(&EolLast, "hello\n", &[]).unwrap().is_empty());
        assert!(run(&EolLast, "", &[]).unwrap().is_empty());
    }

    // ===========================================
    // max-len
    // ===========================================

    #[test]
    fn test_max_len_counts_chars() {
        let text = format!("{}\n{}\n", "a".repeat(10), "é".repeat(11));
        let findings = run(&MaxLen, &text, &[("max", ParamValue::Int(10))]).unwrap();
        assert_eq!(lines_of(&findings), vec![2]);
        assert!(findings[0].message.contains("length of 11"));
    }

    #[test]
    fn test_max_len_ignore_patterns() {
        let text = format!("import {}\nconst x = '{}';\n", "a".repeat(20), "b".repeat(20));
        let ignore = ParamValue::from(vec!["^import "]);
        let findings = run(&MaxLen, &text, &[("max", ParamValue::Int(10)), ("ignore-patterns", ignore)]).unwrap();
        assert_eq!(lines_of(&findings), vec![2]);
    }

    #[test]
    fn test_max_len_bad_regex_faults() {
        let ignore = ParamValue::from(vec!["("]);
        assert!(run(&MaxLen, "x\n", &[("ignore-patterns", ignore)]).is_err());
    }

    // ===========================================
    // no-multiple-empty-lines
    // ===========================================

    #[test]
    fn test_multiple_empty_lines() {
        let text = "a\n\n\n\nb\n\nc\n";
        let findings = run(&NoMultipleEmptyLines, text, &[("max", ParamValue::Int(2))]).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.line, 4);
        assert!(findings[0].message.contains("(3)"));
    }

    #[test]
    fn test_multiple_empty_lines_at_end() {
        let text = "a\n\n\n";
        let findings = run(&NoMultipleEmptyLines, text, &[("max", ParamValue::Int(1))]).unwrap();
        assert_eq!(lines_of(&findings), vec![3]);
    }

    #[test]
    fn test_zero_empty_lines_allowed() {
        let findings = run(&NoMultipleEmptyLines, "a\n\nb\n", &[("max", ParamValue::Int(0))]).unwrap();
        assert_eq!(lines_of(&findings), vec![2]);
    }

    // ===========================================
    // no-irregular-whitespace
    // ===========================================

    #[test]
    fn test_fullwidth_and_zero_width() {
        let text = "hello\u{3000}world\nzero\u{200B}width\n";
        let findings = run(&NoIrregularWhitespace, text, &[]).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].location, Location::at(1, 6));
        assert!(findings[0].message.contains("U+3000"));
        assert_eq!(findings[1].location, Location::at(2, 5));
    }

    #[test]
    fn test_bom_at_start_allowed() {
        assert!(run(&NoIrregularWhitespace, "\u{FEFF}hello\n", &[]).unwrap().is_empty());
        let mid = run(&NoIrregularWhitespace, "a\u{FEFF}b\n", &[]).unwrap();
        assert_eq!(mid.len(), 1);
    }

    // ===========================================
    // no-warning-comments
    // ===========================================

    #[test]
    fn test_warning_comments_default_terms() {
        let text = "// TODO: later\n// fixme now\n// todos are fine\n// nothing\n";
        let findings = run(&NoWarningComments, text, &[]).unwrap();
        assert_eq!(lines_of(&findings), vec![1, 2]);
        assert_eq!(findings[0].message, "Unexpected 'todo' comment");
        assert_eq!(findings[0].location, Location::new(1, 4, 8));
    }

    #[test]
    fn test_warning_comments_custom_terms() {
        let text = "// HACK(me) around\n// TODO: later\n";
        let findings = run(&NoWarningComments, text, &[("terms", vec!["hack"].into())]).unwrap();
        assert_eq!(lines_of(&findings), vec![1]);
    }

    #[test]
    fn test_warning_comments_marker_at_line_end() {
        let findings = run(&NoWarningComments, "x = 1 // TODO\n", &[]).unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_warning_comments_empty_terms_ignored() {
        let text = "let total = compute(x);\nreturn value;\n// todo: later\n";
        let findings = run(&NoWarningComments, text, &[("terms", vec!["todo", ""].into())]).unwrap();
        assert_eq!(lines_of(&findings), vec![3]);

        let findings = run(&NoWarningComments, text, &[("terms", vec![""].into())]).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_warning_comments_term_starting_with_symbol() {
        let text = "// @todo later\n// todo later\n";
        let findings = run(&NoWarningComments, text, &[("terms", vec!["@todo"].into())]).unwrap();
        assert_eq!(lines_of(&findings), vec![1]);
        assert_eq!(findings[0].message, "Unexpected '@todo' comment");
        assert_eq!(findings[0].location, Location::new(1, 4, 9));
    }
}
