//! Label/number/register validation and single-operand parsing shared by
//! the line lexer.

use super::ast::Operand;
use regex::Regex;
use std::sync::OnceLock;

pub const LABEL_MAX_LENGTH: usize = 31;
pub const IMMEDIATE_MIN: i32 = -512;
pub const IMMEDIATE_MAX: i32 = 511;

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]{0,30}$").unwrap())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelError {
    FirstCharNotLetter,
    InvalidChar,
    TooLong,
}

impl std::fmt::Display for LabelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            LabelError::FirstCharNotLetter => "first char not letter",
            LabelError::InvalidChar => "contains char that is not letter or number",
            LabelError::TooLong => "longer than maximum",
        };
        write!(f, "{msg}")
    }
}

/// Validate a label against `[A-Za-z][A-Za-z0-9]*`, length <= 31.
pub fn validate_label(name: &str) -> Result<(), LabelError> {
    if label_regex().is_match(name) {
        return Ok(());
    }
    match name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return Err(LabelError::FirstCharNotLetter),
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LabelError::InvalidChar);
    }
    Err(LabelError::TooLong)
}

/// Parse a signed base-10 integer and check it falls in `[-512, 511]`.
pub fn parse_ranged_number(token: &str) -> Result<i16, String> {
    let value: i64 = token
        .parse()
        .map_err(|_| format!("\"{token}\" is not a valid number"))?;
    if value < IMMEDIATE_MIN as i64 || value > IMMEDIATE_MAX as i64 {
        return Err(format!("\"{token}\" out of range"));
    }
    Ok(value as i16)
}

/// Parse a `@r<0..7>` register operand.
pub fn parse_register(token: &str) -> Option<u8> {
    let rest = token.strip_prefix("@r")?;
    let mut chars = rest.chars();
    let digit = chars.next()?;
    if chars.next().is_some() || !digit.is_ascii_digit() {
        return None;
    }
    let n = digit.to_digit(10).unwrap() as u8;
    (n <= 7).then_some(n)
}

/// Parse a single operand token into its addressing-mode tag.
pub fn parse_operand(token: &str) -> Result<Operand, String> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(Operand::None);
    }
    if let Some(number) = token.strip_prefix('#') {
        return parse_ranged_number(number).map(Operand::Immediate);
    }
    if token.starts_with('@') {
        return parse_register(token)
            .map(Operand::Register)
            .ok_or_else(|| format!("unknown operand \"{token}\""));
    }
    validate_label(token).map_err(|e| format!("\"{token}\" {e}"))?;
    Ok(Operand::Label(token.to_string()))
}
