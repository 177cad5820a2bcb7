//! Two-pass assembler: symbol table (component E), encoder (component D),
//! pass-1 driver (component F), pass-2 resolver (component G) and the final
//! object assembly (component H).
//!
//! ```ignore
//! let lines = lexer::lex(&expanded_source);
//! let mut diagnostics = Diagnostics::new("prog.am");
//! if let Some(object) = assembler::assemble(&lines, &mut diagnostics) {
//!     writer::write_ob("prog.ob", &object)?;
//! }
//! ```

pub mod encoder;
pub mod pass2;
pub mod symbol;

use std::fmt;

use crate::lexer::ast::{Directive, Line, LineBody, Opcode, Operand};
use crate::logging::Diagnostics;
use symbol::{EntryOutcome, ExternOutcome, SymbolKind, SymbolTable};

/// Address at which the code/data images are logically relocated on output.
pub const BASE_ADDRESS: u16 = 100;
/// Combined code + data word budget.
pub const MEMORY_CAP: u16 = 1024;

/// A code-image slot written with a placeholder in pass 1, to be patched by
/// pass 2 once its label has a final address.
#[derive(Debug, Clone)]
pub struct PendingReference {
    pub symbol_name: String,
    pub code_index: u16,
    pub source_line: usize,
}

/// One `.ext` line: a use of an external symbol and the address it was
/// encoded at.
#[derive(Debug, Clone)]
pub struct ExternUse {
    pub name: String,
    pub use_address: u16,
}

/// The finished translation of one source file, ready for the `writer`
/// module.
#[derive(Debug, Default)]
pub struct ObjectFile {
    pub code_image: Vec<u16>,
    pub data_image: Vec<u16>,
    pub ic: u16,
    pub dc: u16,
    pub symbols: SymbolTable,
    pub extern_uses: Vec<ExternUse>,
}

impl ObjectFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a code word, returning the (pre-relocation) index it landed
    /// at, or `None` if the combined `IC + DC` memory cap is already full.
    pub fn push_code_word(&mut self, word: u16) -> Option<u16> {
        if self.ic + self.dc >= MEMORY_CAP {
            return None;
        }
        let index = self.ic;
        self.code_image.push(word & encoder::WORD_MASK);
        self.ic += 1;
        Some(index)
    }

    /// Append a data word, returning `false` if the combined `IC + DC`
    /// memory cap is already full.
    fn push_data_word(&mut self, word: u16) -> bool {
        if self.ic + self.dc >= MEMORY_CAP {
            return false;
        }
        self.data_image.push(word & encoder::WORD_MASK);
        self.dc += 1;
        true
    }

    pub fn entries_count(&self) -> usize {
        self.symbols.entries_count()
    }
}

/// Every diagnosable (non-syntax) condition the pass-1/pass-2 drivers can
/// raise: one variant per condition, a manual `Display`.
#[derive(Debug)]
pub enum Error {
    LabelAlreadyDefined { name: String, previous_line: usize, previous_kind: SymbolKind },
    EntryAlreadyExtern { name: String, previous_line: usize },
    ExternConflict { name: String, previous_line: usize, previous_kind: SymbolKind },
    MemoryExhausted,
    UndefinedLabel { name: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LabelAlreadyDefined { name, previous_line, previous_kind } => write!(
                f,
                "label \"{name}\" already defined ({previous_kind}) at line {previous_line}"
            ),
            Error::EntryAlreadyExtern { name, previous_line } => {
                write!(f, "label \"{name}\" already declared \".extern\" at line {previous_line}")
            }
            Error::ExternConflict { name, previous_line, previous_kind } => write!(
                f,
                "label \"{name}\" already defined ({previous_kind}) at line {previous_line}"
            ),
            Error::MemoryExhausted => write!(f, "program exceeds the 1024-word memory limit"),
            Error::UndefinedLabel { name } => write!(f, "label \"{name}\" called but not defined"),
        }
    }
}

impl std::error::Error for Error {}

/// Run the full two-pass assembly over an already-lexed line stream.
/// Returns `None` (after reporting every diagnostic it found) if any
/// recoverable or fatal condition occurred; output is not written in that
/// case.
pub fn assemble(lines: &[(usize, Line)], diagnostics: &mut Diagnostics) -> Option<ObjectFile> {
    let mut object = ObjectFile::new();
    let mut pending = Vec::new();

    for (line_number, node) in lines {
        let line_number = *line_number;
        match node {
            Line::Empty => {}
            Line::SyntaxError(message) => diagnostics.error(line_number, message),
            Line::Parsed { label, body } => {
                if !pass1_line(&mut object, &mut pending, diagnostics, label.as_deref(), body, line_number) {
                    diagnostics.error(line_number, Error::MemoryExhausted);
                    break;
                }
            }
        }
    }

    object.symbols.finalize_data_addresses(object.ic);
    pass2::resolve(&mut object, &pending, diagnostics);

    if diagnostics.had_errors() {
        None
    } else {
        Some(object)
    }
}

/// Process one parsed line. Returns `false` the moment a word push would
/// overflow the 1024-word memory cap, signalling the caller to stop the
/// whole file immediately (spec's memory exhaustion is Fatal, not a
/// Recoverable error to report and keep going past).
fn pass1_line(
    object: &mut ObjectFile,
    pending: &mut Vec<PendingReference>,
    diagnostics: &mut Diagnostics,
    label: Option<&str>,
    body: &LineBody,
    line_number: usize,
) -> bool {
    match body {
        LineBody::Instruction { opcode, source, dest } => {
            if let Some(name) = label {
                bind_label(object, diagnostics, name, SymbolKind::Code, object.ic + BASE_ADDRESS, line_number);
            }
            encode_instruction(object, pending, *opcode, source, dest, line_number)
        }
        LineBody::Directive(Directive::Data(values)) => {
            bind_data_label(object, diagnostics, label, ".data", line_number);
            for &value in values {
                if !object.push_data_word(value as u16) {
                    return false;
                }
            }
            true
        }
        LineBody::Directive(Directive::Str(text)) => {
            bind_data_label(object, diagnostics, label, ".string", line_number);
            for c in text.chars() {
                if !object.push_data_word(c as u32 as u16) {
                    return false;
                }
            }
            object.push_data_word(0)
        }
        LineBody::Directive(Directive::Entry(name)) => {
            match object.symbols.declare_entry(name, line_number) {
                EntryOutcome::Registered | EntryOutcome::Upgraded => {}
                EntryOutcome::Redundant => {
                    diagnostics.warn(line_number, format!("\".entry\" redeclared for \"{name}\""));
                }
                EntryOutcome::ConflictsWithExtern { previous_line } => {
                    diagnostics.error(line_number, Error::EntryAlreadyExtern { name: name.clone(), previous_line });
                }
            }
            true
        }
        LineBody::Directive(Directive::Extern(name)) => {
            match object.symbols.declare_extern(name, line_number) {
                ExternOutcome::Registered => {}
                ExternOutcome::Redundant => {
                    diagnostics.warn(line_number, format!("\".extern\" redeclared for \"{name}\""));
                }
                ExternOutcome::Conflicts { previous_line, previous_kind } => {
                    diagnostics.error(
                        line_number,
                        Error::ExternConflict { name: name.clone(), previous_line, previous_kind },
                    );
                }
            }
            true
        }
    }
}

fn bind_label(
    object: &mut ObjectFile,
    diagnostics: &mut Diagnostics,
    name: &str,
    kind: SymbolKind,
    address: u16,
    line: usize,
) {
    if let Err(conflict) = object.symbols.define(name, kind, address, line) {
        diagnostics.error(
            line,
            Error::LabelAlreadyDefined {
                name: name.to_string(),
                previous_line: conflict.previous_line,
                previous_kind: conflict.previous_kind,
            },
        );
    }
}

/// `.data`/`.string` without a label is legal but suspicious (the data is
/// unreachable by name); this is a warning, not an error.
fn bind_data_label(
    object: &mut ObjectFile,
    diagnostics: &mut Diagnostics,
    label: Option<&str>,
    directive: &str,
    line: usize,
) {
    match label {
        Some(name) => bind_label(object, diagnostics, name, SymbolKind::Data, object.dc, line),
        None => diagnostics.warn(line, format!("\"{directive}\" directive without a label")),
    }
}

/// Encode one instruction. Returns `false` the moment a word push would
/// overflow the memory cap, leaving any remaining operand words unwritten.
fn encode_instruction(
    object: &mut ObjectFile,
    pending: &mut Vec<PendingReference>,
    opcode: Opcode,
    source: &Operand,
    dest: &Operand,
    line: usize,
) -> bool {
    if object.push_code_word(encoder::first_word(opcode, source, dest)).is_none() {
        return false;
    }

    if let (Operand::Register(s), Operand::Register(d)) = (source, dest) {
        return object.push_code_word(encoder::combined_register_word(*s, *d)).is_some();
    }

    for (operand, is_source) in [(source, true), (dest, false)] {
        if matches!(operand, Operand::None) {
            continue;
        }
        let encoded = encoder::encode_operand(operand, is_source, &object.symbols);
        let Some(index) = object.push_code_word(encoded.word) else {
            return false;
        };
        if encoded.pending {
            let name = match operand {
                Operand::Label(name) => name.clone(),
                _ => unreachable!("only Label operands are ever pending"),
            };
            pending.push(PendingReference { symbol_name: name, code_index: index, source_line: line });
        } else if encoded.immediate_extern_use {
            let name = match operand {
                Operand::Label(name) => name.clone(),
                _ => unreachable!("only Label operands produce extern uses"),
            };
            object.extern_uses.push(ExternUse { name, use_address: index + BASE_ADDRESS });
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;

    fn assemble_source(source: &str) -> Option<ObjectFile> {
        let lines = lexer::lex(source);
        let mut diagnostics = Diagnostics::new("prog.am");
        assemble(&lines, &mut diagnostics)
    }

    /// Scenario 1: register-register mov.
    #[test]
    fn register_register_mov() {
        let object = assemble_source("MAIN: mov @r3, @r5\n").unwrap();
        assert_eq!(object.ic, 2);
        assert_eq!(object.dc, 0);
        let first = object.code_image[0];
        assert_eq!((first >> 9) & 0b111, 5);
        assert_eq!((first >> 5) & 0b1111, 0);
        assert_eq!((first >> 2) & 0b111, 5);
        let second = object.code_image[1];
        assert_eq!((second >> 7) & 0b111, 3);
        assert_eq!((second >> 2) & 0b111, 5);
        let main = object.symbols.get("MAIN").unwrap();
        assert_eq!(main.kind, SymbolKind::Code);
        assert_eq!(main.address, 100);
    }

    /// Scenario 2: immediate + forward label reference.
    #[test]
    fn immediate_and_forward_label() {
        let source = "START: add #5, END\n       stop\nEND:   .data 7\n";
        let object = assemble_source(source).unwrap();
        assert_eq!(object.ic, 4);
        assert_eq!(object.dc, 1);
        assert!(object.extern_uses.is_empty());
        let start = object.symbols.get("START").unwrap();
        assert_eq!(start.address, 100);
        let end = object.symbols.get("END").unwrap();
        assert_eq!(end.address, 100 + object.ic);
        assert_eq!(object.code_image[1] & 0b11, encoder::ARE_ABSOLUTE);
        assert_eq!(object.code_image[2] & 0b11, encoder::ARE_RELOCATABLE);
    }

    /// Scenario 3: extern use.
    #[test]
    fn extern_reference() {
        let source = "       .extern EXT\n       jmp EXT\n";
        let object = assemble_source(source).unwrap();
        assert_eq!(object.extern_uses.len(), 1);
        assert_eq!(object.extern_uses[0].name, "EXT");
        assert_eq!(object.code_image[1] & 0b11, encoder::ARE_EXTERNAL);
        assert_eq!(object.entries_count(), 0);
    }

    /// Scenario 4: entry forward declaration upgrades to EntryData.
    #[test]
    fn entry_forward_declaration() {
        let source = "       .entry LBL\nLBL:   .data 1,2,3\n";
        let object = assemble_source(source).unwrap();
        assert_eq!(object.dc, 3);
        let lbl = object.symbols.get("LBL").unwrap();
        assert_eq!(lbl.kind, SymbolKind::EntryData);
        assert_eq!(object.entries_count(), 1);
    }

    /// Scenario 5: a second colon is a syntax error; no object produced.
    #[test]
    fn second_colon_fails_the_file() {
        assert!(assemble_source("A: B: mov @r0, @r1\n").is_none());
    }

    #[test]
    fn string_directive_emits_chars_then_terminator() {
        let object = assemble_source("STR: .string \"A\"\n").unwrap();
        assert_eq!(object.dc, 2);
        assert_eq!(object.data_image, vec!['A' as u16, 0]);
    }

    #[test]
    fn lone_rts_program() {
        let object = assemble_source("rts\n").unwrap();
        assert_eq!(object.ic, 1);
        assert_eq!(object.dc, 0);
        assert_eq!((object.code_image[0] >> 5) & 0b1111, Opcode::Rts.number() as u16);
    }

    #[test]
    fn undefined_symbol_fails_pass2() {
        assert!(assemble_source("jmp MISSING\n").is_none());
    }

    #[test]
    fn redefinition_is_fatal() {
        let source = "A: .data 1\nA: .data 2\n";
        assert!(assemble_source(source).is_none());
    }

    #[test]
    fn data_without_label_warns_but_still_assembles() {
        let object = assemble_source(".data 1,2,3\n").unwrap();
        assert_eq!(object.dc, 3);
    }

    /// A single `.data` directive whose value count alone overflows the
    /// 1024-word cap must be caught mid-directive, not just once per line.
    #[test]
    fn memory_cap_is_enforced_within_a_single_directive() {
        let values = vec![0i16; MEMORY_CAP as usize + 1];
        let lines = vec![(1usize, Line::Parsed { label: None, body: LineBody::Directive(Directive::Data(values)) })];
        let mut diagnostics = Diagnostics::new("prog.am");
        assert!(assemble(&lines, &mut diagnostics).is_none());
        assert!(diagnostics.had_errors());
    }

    /// Once the cap is tripped, assembly stops immediately instead of
    /// re-reporting the same memory-exhausted error for every later line.
    #[test]
    fn memory_cap_halts_the_rest_of_the_file() {
        let lines = vec![
            (1usize, Line::Parsed { label: None, body: LineBody::Directive(Directive::Data(vec![0i16; MEMORY_CAP as usize])) }),
            (2usize, Line::Parsed { label: None, body: LineBody::Directive(Directive::Data(vec![0i16])) }),
            (3usize, Line::Parsed { label: None, body: LineBody::Directive(Directive::Data(vec![0i16])) }),
        ];
        let mut diagnostics = Diagnostics::new("prog.am");
        assert!(assemble(&lines, &mut diagnostics).is_none());
        assert_eq!(diagnostics.error_count(), 1);
    }
}
