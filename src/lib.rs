//! A two-pass assembler for the mmn14 12-bit instruction set, featuring:
//! - a macro preprocessor
//! - a line lexer producing a per-line AST
//! - a two-pass symbol resolver and encoder
//! - `.ob`/`.ent`/`.ext` object file writers

pub mod assembler;
pub mod lexer;
pub mod logging;
pub mod preprocessor;
pub mod writer;
