//! The symbol table (component E): an insertion-ordered name -> record map
//! implementing the `kind` transition rules.

use indexmap::IndexMap;

pub type Address = u16;

/// Storage class / lifecycle state of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Extern,
    Entry,
    Code,
    Data,
    EntryCode,
    EntryData,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SymbolKind::Extern => "extern",
            SymbolKind::Entry => "entry",
            SymbolKind::Code => "code",
            SymbolKind::Data => "data",
            SymbolKind::EntryCode => "entry-code",
            SymbolKind::EntryData => "entry-data",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub address: Address,
    pub declared_line: usize,
}

/// A name was already bound to a kind that cannot be redefined.
#[derive(Debug, Clone, Copy)]
pub struct AlreadyDefined {
    pub previous_line: usize,
    pub previous_kind: SymbolKind,
}

/// Outcome of `.entry NAME` bookkeeping.
pub enum EntryOutcome {
    /// No prior declaration; registered as pending `Entry`.
    Registered,
    /// A `Code`/`Data` symbol was upgraded to `EntryCode`/`EntryData`.
    Upgraded,
    /// Already an entry symbol in some form; redundant, a warning.
    Redundant,
    /// Already declared `.extern`; illegal, a fatal error.
    ConflictsWithExtern { previous_line: usize },
}

/// Outcome of `.extern NAME` bookkeeping.
pub enum ExternOutcome {
    Registered,
    Redundant,
    Conflicts { previous_line: usize, previous_kind: SymbolKind },
}

/// Insertion-ordered symbol table. Order matters: it is observable in
/// `.ent` and (indirectly, via data-address finalisation order not
/// mattering) elsewhere.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    /// Bind `name` as `Code` or `Data` at `address`. If `name` was a
    /// pending `Entry`, upgrades it in place to `EntryCode`/`EntryData`
    /// instead. Any other pre-existing
    /// kind is an illegal redefinition.
    pub fn define(
        &mut self,
        name: &str,
        kind: SymbolKind,
        address: Address,
        line: usize,
    ) -> Result<(), AlreadyDefined> {
        debug_assert!(matches!(kind, SymbolKind::Code | SymbolKind::Data));
        if let Some(existing) = self.symbols.get_mut(name) {
            match existing.kind {
                SymbolKind::Entry => {
                    existing.kind = if kind == SymbolKind::Code {
                        SymbolKind::EntryCode
                    } else {
                        SymbolKind::EntryData
                    };
                    existing.address = address;
                    existing.declared_line = line;
                    Ok(())
                }
                other => Err(AlreadyDefined { previous_line: existing.declared_line, previous_kind: other }),
            }
        } else {
            self.symbols.insert(
                name.to_string(),
                Symbol { name: name.to_string(), kind, address, declared_line: line },
            );
            Ok(())
        }
    }

    pub fn declare_entry(&mut self, name: &str, line: usize) -> EntryOutcome {
        match self.symbols.get_mut(name) {
            None => {
                self.symbols.insert(
                    name.to_string(),
                    Symbol { name: name.to_string(), kind: SymbolKind::Entry, address: 0, declared_line: line },
                );
                EntryOutcome::Registered
            }
            Some(sym) => match sym.kind {
                SymbolKind::Entry | SymbolKind::EntryCode | SymbolKind::EntryData => EntryOutcome::Redundant,
                SymbolKind::Extern => EntryOutcome::ConflictsWithExtern { previous_line: sym.declared_line },
                SymbolKind::Code => {
                    sym.kind = SymbolKind::EntryCode;
                    EntryOutcome::Upgraded
                }
                SymbolKind::Data => {
                    sym.kind = SymbolKind::EntryData;
                    EntryOutcome::Upgraded
                }
            },
        }
    }

    pub fn declare_extern(&mut self, name: &str, line: usize) -> ExternOutcome {
        match self.symbols.get_mut(name) {
            None => {
                self.symbols.insert(
                    name.to_string(),
                    Symbol { name: name.to_string(), kind: SymbolKind::Extern, address: 0, declared_line: line },
                );
                ExternOutcome::Registered
            }
            Some(sym) => match sym.kind {
                SymbolKind::Extern => ExternOutcome::Redundant,
                other => ExternOutcome::Conflicts { previous_line: sym.declared_line, previous_kind: other },
            },
        }
    }

    /// End-of-pass-1 finalisation: every `Data`/`EntryData` symbol's address
    /// (currently a data-image offset) gets `final_ic + 100` added.
    pub fn finalize_data_addresses(&mut self, final_ic: u16) {
        for symbol in self.symbols.values_mut() {
            if matches!(symbol.kind, SymbolKind::Data | SymbolKind::EntryData) {
                symbol.address += final_ic + 100;
            }
        }
    }

    pub fn entries_count(&self) -> usize {
        self.symbols
            .values()
            .filter(|s| matches!(s.kind, SymbolKind::EntryCode | SymbolKind::EntryData))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_before_definition_upgrades_to_entry_code() {
        let mut table = SymbolTable::new();
        assert!(matches!(table.declare_entry("LBL", 1), EntryOutcome::Registered));
        table.define("LBL", SymbolKind::Code, 100, 2).unwrap();
        assert_eq!(table.get("LBL").unwrap().kind, SymbolKind::EntryCode);
    }

    #[test]
    fn redefinition_of_code_symbol_is_an_error() {
        let mut table = SymbolTable::new();
        table.define("LBL", SymbolKind::Code, 100, 1).unwrap();
        assert!(table.define("LBL", SymbolKind::Data, 0, 2).is_err());
    }

    #[test]
    fn repeated_extern_is_redundant_not_an_error() {
        let mut table = SymbolTable::new();
        assert!(matches!(table.declare_extern("EXT", 1), ExternOutcome::Registered));
        assert!(matches!(table.declare_extern("EXT", 2), ExternOutcome::Redundant));
    }

    #[test]
    fn extern_then_entry_is_a_conflict() {
        let mut table = SymbolTable::new();
        table.declare_extern("X", 1);
        assert!(matches!(table.declare_entry("X", 2), EntryOutcome::ConflictsWithExtern { .. }));
    }

    #[test]
    fn data_address_finalisation() {
        let mut table = SymbolTable::new();
        table.define("D", SymbolKind::Data, 0, 1).unwrap();
        table.define("D2", SymbolKind::Data, 3, 1).unwrap();
        table.finalize_data_addresses(5);
        assert_eq!(table.get("D").unwrap().address, 105);
        assert_eq!(table.get("D2").unwrap().address, 108);
    }
}
