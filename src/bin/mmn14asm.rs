use std::path::Path;
use std::{env, fs};

use mmn14asm::logging::{self, Diagnostics};
use mmn14asm::{assembler, lexer, preprocessor, writer};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <base1> [base2 ...]", args[0]);
        std::process::exit(1);
    }

    let mut any_failed = false;
    for base_name in &args[1..] {
        if !process_file(base_name) {
            any_failed = true;
        }
    }

    if any_failed {
        std::process::exit(1);
    }
}

/// Run the full pipeline for one base name: read `<base>.as`, expand
/// macros into `<base>.am`, lex, assemble, and write `.ob`/`.ent`/`.ext` on
/// success. Returns `false` if anything went wrong.
fn process_file(base_name: &str) -> bool {
    let base = Path::new(base_name);
    let source_path = base.with_extension("as");

    let source = match fs::read_to_string(&source_path) {
        Ok(source) => source,
        Err(e) => {
            logging::error(base_name, 0, format!("could not read {}: {e}", source_path.display()));
            return false;
        }
    };

    let mut diagnostics = Diagnostics::new(base_name);
    let expanded = preprocessor::expand(&source, &mut diagnostics);

    let expanded_path = base.with_extension("am");
    if let Err(e) = fs::write(&expanded_path, &expanded) {
        logging::error(base_name, 0, format!("could not write {}: {e}", expanded_path.display()));
        return false;
    }

    // Keep lexing and assembling on top of the expanded source even if the
    // preprocessor already reported an error: recoverable errors don't stop
    // the pipeline, they only block writing output (`assemble` refuses to
    // return an object once `diagnostics` has seen any error at all, so a
    // preprocessor error still fails the file).
    let lines = lexer::lex(&expanded);
    let Some(object) = assembler::assemble(&lines, &mut diagnostics) else {
        return false;
    };

    for write in [writer::write_ob, writer::write_ent, writer::write_ext] {
        if let Err(e) = write(base, &object) {
            logging::error(base_name, 0, format!("could not write output: {e}"));
            return false;
        }
    }

    true
}
