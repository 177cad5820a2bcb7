//! The per-line AST produced by the lexer.

use std::fmt;

/// One of the 16 mmn14 mnemonics. The discriminant is the opcode number
/// written into bits 8..5 of the first instruction word, and is also the
/// number required in `.ob` output (see the opcode table in the external
/// interfaces).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Mov = 0,
    Cmp = 1,
    Add = 2,
    Sub = 3,
    Not = 4,
    Clr = 5,
    Lea = 6,
    Inc = 7,
    Dec = 8,
    Jmp = 9,
    Bne = 10,
    Red = 11,
    Prn = 12,
    Jsr = 13,
    Rts = 14,
    Stop = 15,
}

impl Opcode {
    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        use Opcode::*;
        Some(match name {
            "mov" => Mov,
            "cmp" => Cmp,
            "add" => Add,
            "sub" => Sub,
            "not" => Not,
            "clr" => Clr,
            "lea" => Lea,
            "inc" => Inc,
            "dec" => Dec,
            "jmp" => Jmp,
            "bne" => Bne,
            "red" => Red,
            "prn" => Prn,
            "jsr" => Jsr,
            "rts" => Rts,
            "stop" => Stop,
            _ => return None,
        })
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn arity(self) -> Arity {
        use Opcode::*;
        match self {
            Mov | Cmp | Add | Sub | Lea => Arity::Two,
            Not | Clr | Inc | Dec | Jmp | Bne | Red | Prn | Jsr => Arity::One,
            Rts | Stop => Arity::Zero,
        }
    }

    /// Modes a source-position operand may take (two-operand opcodes only).
    pub fn source_modes(self) -> AllowedModes {
        use Opcode::*;
        match self {
            Mov | Add | Sub => AllowedModes::IMMEDIATE_LABEL_REGISTER,
            Cmp => AllowedModes::IMMEDIATE_LABEL_REGISTER,
            Lea => AllowedModes::LABEL_ONLY,
            _ => AllowedModes::NONE,
        }
    }

    /// Modes a dest-position operand may take (one- or two-operand opcodes).
    pub fn dest_modes(self) -> AllowedModes {
        use Opcode::*;
        match self {
            Mov | Add | Sub | Lea => AllowedModes::LABEL_REGISTER,
            Cmp => AllowedModes::IMMEDIATE_LABEL_REGISTER,
            Not | Clr | Inc | Dec | Jmp | Bne | Red | Jsr => AllowedModes::LABEL_REGISTER,
            Prn => AllowedModes::IMMEDIATE_LABEL_REGISTER,
            Rts | Stop => AllowedModes::NONE,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::Mov => "mov",
            Opcode::Cmp => "cmp",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Not => "not",
            Opcode::Clr => "clr",
            Opcode::Lea => "lea",
            Opcode::Inc => "inc",
            Opcode::Dec => "dec",
            Opcode::Jmp => "jmp",
            Opcode::Bne => "bne",
            Opcode::Red => "red",
            Opcode::Prn => "prn",
            Opcode::Jsr => "jsr",
            Opcode::Rts => "rts",
            Opcode::Stop => "stop",
        };
        write!(f, "{name}")
    }
}

/// How many operands an opcode's syntax accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Zero,
    One,
    Two,
}

/// The set of addressing modes an operand slot admits, per the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedModes {
    pub immediate: bool,
    pub label: bool,
    pub register: bool,
}

impl AllowedModes {
    pub const NONE: AllowedModes = AllowedModes { immediate: false, label: false, register: false };
    pub const LABEL_ONLY: AllowedModes = AllowedModes { immediate: false, label: true, register: false };
    pub const LABEL_REGISTER: AllowedModes = AllowedModes { immediate: false, label: true, register: true };
    pub const IMMEDIATE_LABEL_REGISTER: AllowedModes =
        AllowedModes { immediate: true, label: true, register: true };

    pub fn admits(&self, operand: &Operand) -> bool {
        match operand {
            Operand::None => true,
            Operand::Immediate(_) => self.immediate,
            Operand::Label(_) => self.label,
            Operand::Register(_) => self.register,
        }
    }
}

/// A single parsed operand. The discriminant doubles as the addressing-mode
/// tag; `mode_value` gives the 2-bit encoding written into the first word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    None,
    Immediate(i16),
    Label(String),
    Register(u8),
}

impl Operand {
    pub fn mode_value(&self) -> u8 {
        match self {
            Operand::None => 0,
            Operand::Immediate(_) => 1,
            Operand::Label(_) => 3,
            Operand::Register(_) => 5,
        }
    }
}

/// A parsed `.data`/`.string`/`.extern`/`.entry` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Data(Vec<i16>),
    Str(String),
    Extern(String),
    Entry(String),
}

/// What a non-empty, non-error logical line contains, after the label prefix
/// (if any) has been stripped off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineBody {
    Instruction { opcode: Opcode, source: Operand, dest: Operand },
    Directive(Directive),
}

/// One fully parsed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Blank or comment-only; produces no further processing.
    Empty,
    Parsed { label: Option<String>, body: LineBody },
    SyntaxError(String),
}
