//! Pass-2 resolver (component G): patches every pending reference once the
//! symbol table has final addresses.

use super::encoder::{ARE_EXTERNAL, ARE_RELOCATABLE, WORD_MASK};
use super::symbol::SymbolKind;
use super::{Error, ExternUse, ObjectFile, PendingReference};
use crate::logging::Diagnostics;

/// Walk the pending-reference queue in insertion order, patching
/// `object.code_image` and appending extern-use records as needed.
pub fn resolve(object: &mut ObjectFile, pending: &[PendingReference], diagnostics: &mut Diagnostics) {
    for reference in pending {
        let resolved = object.symbols.get(&reference.symbol_name).and_then(|symbol| {
            (symbol.kind != SymbolKind::Entry).then_some((symbol.kind, symbol.address))
        });

        match resolved {
            Some((kind, address)) => {
                let are = if kind == SymbolKind::Extern { ARE_EXTERNAL } else { ARE_RELOCATABLE };
                let word = ((address << 2) | are) & WORD_MASK;
                object.code_image[reference.code_index as usize] = word;
                if kind == SymbolKind::Extern {
                    object.extern_uses.push(ExternUse {
                        name: reference.symbol_name.clone(),
                        use_address: reference.code_index + 100 + 1,
                    });
                }
            }
            None => {
                diagnostics.error(
                    reference.source_line,
                    Error::UndefinedLabel { name: reference.symbol_name.clone() },
                );
            }
        }
    }
}
