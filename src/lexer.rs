//! Line scanner & lexer (components A, C): turns one already-macro-expanded
//! logical line into a [`ast::Line`].

pub mod ast;
pub mod operand;

use ast::{Arity, Directive, Line, LineBody, Opcode, Operand};
use operand::{parse_operand, validate_label};

/// Lines of the `.am` file past this length are rejected outright.
const MAX_LINE_LENGTH: usize = 80;

/// Lex a whole expanded source, numbering lines from 1 and dropping blanks.
pub fn lex(source: &str) -> Vec<(usize, Line)> {
    source
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, lex_line(line)))
        .filter(|(_, node)| !matches!(node, Line::Empty))
        .collect()
}

/// Lex a single logical line.
pub fn lex_line(line: &str) -> Line {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Empty;
    }
    if line.len() > MAX_LINE_LENGTH {
        return Line::SyntaxError(format!(
            "line longer than the maximum of {MAX_LINE_LENGTH} characters"
        ));
    }

    let (label, rest) = match split_label(trimmed) {
        Ok(v) => v,
        Err(message) => return Line::SyntaxError(message),
    };

    let rest = rest.trim();
    if rest.is_empty() {
        return match label {
            Some(name) => Line::SyntaxError(format!("only the label \"{name}\" in the line")),
            None => Line::Empty,
        };
    }

    let body = if rest.starts_with('.') {
        match lex_directive(rest) {
            Ok(directive) => LineBody::Directive(directive),
            Err(message) => return Line::SyntaxError(message),
        }
    } else {
        match lex_instruction(rest) {
            Ok(body) => body,
            Err(message) => return Line::SyntaxError(message),
        }
    };

    Line::Parsed { label, body }
}

/// Split off a `NAME:` label prefix, if present. At most one `:` is
/// permitted per line.
fn split_label(line: &str) -> Result<(Option<String>, &str), String> {
    let Some(colon_index) = line.find(':') else {
        return Ok((None, line));
    };
    let name = &line[..colon_index];
    let rest = &line[colon_index + 1..];
    if rest.contains(':') {
        return Err("more than one ':' in the line".to_string());
    }
    validate_label(name).map_err(|e| format!("label \"{name}\" {e}"))?;
    Ok((Some(name.to_string()), rest))
}

/// Split a comma-separated operand list, rejecting missing/extra operands
/// around the commas (an empty field between/around commas).
fn split_operands(text: &str) -> Result<Vec<&str>, String> {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    if fields.iter().any(|f| f.is_empty()) {
        return Err("missing operand around ','".to_string());
    }
    Ok(fields)
}

fn lex_instruction(rest: &str) -> Result<LineBody, String> {
    let mut parts = rest.splitn(2, char::is_whitespace);
    let mnemonic = parts.next().unwrap_or("");
    let operand_text = parts.next().unwrap_or("").trim();

    let opcode = Opcode::from_mnemonic(mnemonic)
        .ok_or_else(|| format!("unknown instruction \"{mnemonic}\""))?;

    let operands = if operand_text.is_empty() {
        Vec::new()
    } else {
        split_operands(operand_text)?
    };

    match opcode.arity() {
        Arity::Zero => {
            if !operands.is_empty() {
                return Err(format!("\"{opcode}\" takes no operands"));
            }
            Ok(LineBody::Instruction { opcode, source: Operand::None, dest: Operand::None })
        }
        Arity::One => {
            if operands.len() != 1 {
                return Err(format!("\"{opcode}\" takes exactly one operand"));
            }
            let dest = parse_operand(operands[0])?;
            if !opcode.dest_modes().admits(&dest) {
                return Err(format!("addressing mode not allowed for \"{opcode}\""));
            }
            Ok(LineBody::Instruction { opcode, source: Operand::None, dest })
        }
        Arity::Two => {
            if operands.len() != 2 {
                return Err(format!("\"{opcode}\" takes exactly two operands"));
            }
            let source = parse_operand(operands[0])?;
            let dest = parse_operand(operands[1])?;
            if !opcode.source_modes().admits(&source) {
                return Err(format!("addressing mode not allowed for source operand of \"{opcode}\""));
            }
            if !opcode.dest_modes().admits(&dest) {
                return Err(format!("addressing mode not allowed for dest operand of \"{opcode}\""));
            }
            Ok(LineBody::Instruction { opcode, source, dest })
        }
    }
}

fn lex_directive(rest: &str) -> Result<Directive, String> {
    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let payload = parts.next().unwrap_or("").trim();

    match name {
        ".data" => {
            if payload.is_empty() {
                return Err("\".data\" requires at least one value".to_string());
            }
            let mut values = Vec::new();
            for token in payload.split(',') {
                let token = token.trim();
                if token.is_empty() {
                    return Err("missing value around ',' in \".data\"".to_string());
                }
                values.push(operand::parse_ranged_number(token)?);
            }
            Ok(Directive::Data(values))
        }
        ".string" => {
            if payload.len() < 2 || !payload.starts_with('"') || !payload.ends_with('"') {
                return Err("\".string\" requires a quoted string".to_string());
            }
            let inner = &payload[1..payload.len() - 1];
            if inner.contains('"') {
                return Err("unexpected characters after closing quote in \".string\"".to_string());
            }
            Ok(Directive::Str(inner.to_string()))
        }
        ".extern" => {
            validate_label(payload).map_err(|e| format!("\"{payload}\" {e}"))?;
            Ok(Directive::Extern(payload.to_string()))
        }
        ".entry" => {
            validate_label(payload).map_err(|e| format!("\"{payload}\" {e}"))?;
            Ok(Directive::Entry(payload.to_string()))
        }
        _ => Err(format!("unknown directive \"{name}\"")),
    }
}
