use std::fs;
use std::io;
use std::process;

use clap::Parser;

use ebnfc::Backend;

/// Compiles EBNF read from standard input into a table-driven parsing
/// specification, written as a header and implementation file pair.
#[derive(Debug, Parser)]
#[command(name = "ebnfc", version)]
struct Args {
  /// Base name for the generated output files
  #[arg(value_name = "FILE-STEM")]
  stem: Option<String>,

  /// Print the syntax tree to standard output instead of generating code
  #[arg(short = 't', long = "tree")]
  tree: bool,

  /// Emit NASM assembly sources instead of C
  #[arg(short = 'a', long = "asm")]
  asm: bool,
}

fn main() {
  if std::env::var("RUST_LOG").is_ok() {
    simple_logger::init_with_env().expect("this is the only logger");
  }

  let args = match Args::try_parse() {
    Ok(args) => args,
    Err(err) => {
      let failure = err.use_stderr();
      let _ = err.print();
      process::exit(if failure { 1 } else { 0 });
    }
  };

  if args.tree {
    let source = read_stdin();
    match ebnfc::parse(&source) {
      Ok(grammar) => {
        print!("{}", grammar.dump());
        return;
      }
      Err(err) => fail(&err.to_string()),
    }
  }

  let Some(stem) = args.stem else {
    fail("missing parameter, see --help");
  };
  let backend = if args.asm { Backend::Nasm } else { Backend::C };

  let source = read_stdin();
  match ebnfc::compile(&source, &stem, backend) {
    Ok(None) => {}
    Ok(Some(pair)) => {
      if let Err(err) = fs::write(&pair.header_name, &pair.header) {
        fail(&format!(
          "? failed to create header file '{}': {err}",
          pair.header_name
        ));
      }
      if let Err(err) = fs::write(&pair.source_name, &pair.source) {
        fail(&format!(
          "? failed to create implementation file '{}': {err}",
          pair.source_name
        ));
      }
    }
    Err(err) => fail(&err.to_string()),
  }
}

fn read_stdin() -> String {
  match io::read_to_string(io::stdin()) {
    Ok(source) => source,
    Err(err) => fail(&format!("? failed to read standard input: {err}")),
  }
}

fn fail(message: &str) -> ! {
  eprintln!("{message}");
  process::exit(1);
}
