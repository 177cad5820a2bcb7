//! Object file writers (component H's external surface): `.ob`, `.ent` and
//! `.ext` text output for the finished assembly.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::assembler::ObjectFile;
use crate::assembler::symbol::SymbolKind;

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encode one 12-bit word as two Base64 characters: the high 6 bits, then
/// the low 6 bits. No padding, matching `output_section_memory`'s table
/// lookup.
fn encode_word(word: u16) -> [u8; 2] {
    let high = ((word >> 6) & 0x3F) as usize;
    let low = (word & 0x3F) as usize;
    [BASE64_ALPHABET[high], BASE64_ALPHABET[low]]
}

/// Write `<base>.ob`: a `"<IC> <DC>"` header line, then one Base64-encoded
/// word per line, code image followed by data image.
pub fn write_ob(base: &Path, object: &ObjectFile) -> io::Result<()> {
    let mut file = File::create(base.with_extension("ob"))?;
    writeln!(file, "{} {}", object.ic, object.dc)?;
    for &word in object.code_image.iter().chain(&object.data_image) {
        let chars = encode_word(word);
        writeln!(file, "{}{}", chars[0] as char, chars[1] as char)?;
    }
    Ok(())
}

/// Write `<base>.ent`, one `"<name>\t<address>"` line per entry symbol, in
/// symbol-table insertion order. Skipped entirely when there are none.
pub fn write_ent(base: &Path, object: &ObjectFile) -> io::Result<()> {
    if object.entries_count() == 0 {
        return Ok(());
    }
    let mut file = File::create(base.with_extension("ent"))?;
    for symbol in object.symbols.iter() {
        if matches!(symbol.kind, SymbolKind::EntryCode | SymbolKind::EntryData) {
            writeln!(file, "{}\t{}", symbol.name, symbol.address)?;
        }
    }
    Ok(())
}

/// Write `<base>.ext`, one `"<name>\t<use_address>"` line per extern use, in
/// the order they were recorded. Skipped entirely when there are none.
pub fn write_ext(base: &Path, object: &ObjectFile) -> io::Result<()> {
    if object.extern_uses.is_empty() {
        return Ok(());
    }
    let mut file = File::create(base.with_extension("ext"))?;
    for use_record in &object.extern_uses {
        writeln!(file, "{}\t{}", use_record.name, use_record.use_address)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_alphabet_round_trip() {
        assert_eq!(encode_word(0), *b"AA");
        assert_eq!(encode_word(0xFFF), *b"//");
        // 0b100000_000001 -> high=0b100000=32 ('g'), low=0b000001=1 ('B')
        assert_eq!(encode_word(0b1000_0000_0001), *b"gB");
    }

    #[test]
    fn ent_omitted_when_no_entries() {
        let dir = std::env::temp_dir().join("mmn14asm-writer-test-no-ent");
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("prog");
        let object = ObjectFile::new();
        write_ent(&base, &object).unwrap();
        assert!(!base.with_extension("ent").exists());
    }

    #[test]
    fn ent_written_in_insertion_order() {
        let dir = std::env::temp_dir().join("mmn14asm-writer-test-ent");
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("prog");
        let mut object = ObjectFile::new();
        object.symbols.declare_entry("FIRST", 1);
        object.symbols.define("FIRST", SymbolKind::Code, 100, 2).unwrap();
        object.symbols.declare_entry("SECOND", 3);
        object.symbols.define("SECOND", SymbolKind::Code, 101, 4).unwrap();
        write_ent(&base, &object).unwrap();
        let contents = std::fs::read_to_string(base.with_extension("ent")).unwrap();
        assert_eq!(contents, "FIRST\t100\nSECOND\t101\n");
    }
}
