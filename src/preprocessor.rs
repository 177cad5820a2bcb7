//! Macro preprocessor (component B): expands in-source `mcro ... endmcro`
//! definitions and replaces macro-call lines with their stored bodies.
//!
//! Macros have no parameters and no hygiene. A call is recognised only when
//! a whole (comment-stripped, trimmed) line is exactly the macro's name.

use crate::logging::Diagnostics;
use indexmap::IndexMap;

const MAX_MACRO_NAME_LENGTH: usize = 31;

fn is_macro_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    name.chars().count() <= MAX_MACRO_NAME_LENGTH && chars.as_str().chars().all(|c| c.is_ascii_alphanumeric())
}

/// Strip a `;` comment tail and surrounding whitespace, for classification.
fn classify(line: &str) -> &str {
    line.split(';').next().unwrap_or("").trim()
}

/// Expand `source` into the `.am` text, reporting preprocessor diagnostics
/// through `diagnostics`.
pub fn expand(source: &str, diagnostics: &mut Diagnostics) -> String {
    let mut macros: IndexMap<String, Vec<String>> = IndexMap::new();
    let mut output = String::new();
    let mut in_macro = false;
    let mut current: Option<String> = None;

    for (idx, raw_line) in source.lines().enumerate() {
        let line_number = idx + 1;

        if in_macro {
            if classify(raw_line) == "endmcro" {
                in_macro = false;
                current = None;
                continue;
            }
            if let Some(name) = &current {
                macros.get_mut(name).expect("macro registered before capture").push(raw_line.to_string());
            }
            continue;
        }

        let trimmed = classify(raw_line);
        if trimmed.is_empty() {
            continue;
        }

        let mut tokens = trimmed.split_whitespace();
        let first = tokens.next().unwrap_or("");

        if first == "endmcro" {
            diagnostics.error(line_number, "incorrect_definition_of_a_endmacro");
            continue;
        }

        if first == "mcro" {
            let rest: Vec<&str> = tokens.collect();
            if rest.len() != 1 || !is_macro_name(rest[0]) {
                diagnostics.error(line_number, "incorrect_definition_of_a_macro");
                continue;
            }
            let name = rest[0].to_string();
            if macros.contains_key(&name) {
                diagnostics.error(line_number, "macro_exists_already_its_redefinition");
                in_macro = true;
                current = None;
                continue;
            }
            macros.insert(name.clone(), Vec::new());
            current = Some(name);
            in_macro = true;
            continue;
        }

        if let Some(body) = macros.get(trimmed) {
            for body_line in body {
                output.push_str(body_line);
                output.push('\n');
            }
            continue;
        }

        output.push_str(trimmed);
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_ok(source: &str) -> String {
        let mut diagnostics = Diagnostics::new("prog.as");
        let out = expand(source, &mut diagnostics);
        assert!(!diagnostics.had_errors());
        out
    }

    #[test]
    fn strips_comments_and_blank_lines() {
        let out = expand_ok("  mov @r1, @r2  ; move\n\n   ; just a comment\nstop\n");
        assert_eq!(out, "mov @r1, @r2\nstop\n");
    }

    #[test]
    fn expands_macro_call_twice() {
        let out = expand_ok("mcro M\n    inc @r1\nendmcro\n    M\n    M\n");
        assert_eq!(out, "    inc @r1\n    inc @r1\n");
    }

    #[test]
    fn rejects_macro_redefinition() {
        let mut diagnostics = Diagnostics::new("prog.as");
        let out = expand(
            "mcro M\n inc @r1\nendmcro\nmcro M\n dec @r1\nendmcro\nM\n",
            &mut diagnostics,
        );
        assert!(diagnostics.had_errors());
        assert_eq!(out, " inc @r1\n");
    }

    #[test]
    fn rejects_stray_endmcro() {
        let mut diagnostics = Diagnostics::new("prog.as");
        expand("endmcro\n", &mut diagnostics);
        assert!(diagnostics.had_errors());
    }

    #[test]
    fn rejects_malformed_macro_header() {
        let mut diagnostics = Diagnostics::new("prog.as");
        expand("mcro\n", &mut diagnostics);
        assert!(diagnostics.had_errors());
    }
}
