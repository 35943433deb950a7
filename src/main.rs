use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::debug;

use um::loader::load_image_file;
use um::{IoConsole, TrailingBytes, VmError, UM};

/// Runs a program image on the virtual machine, with the program's console on stdin/stdout.
#[derive(Parser, Debug)]
#[command(name = "um", version, about)]
struct Args {
  /// Program image: big-endian 32 bit words.
  image: PathBuf,

  /// Drop a trailing partial word instead of rejecting the image.
  #[arg(long)]
  allow_partial_word: bool,

  /// Print the number of instructions executed to stderr on termination.
  #[arg(long)]
  stats: bool,
}

fn run(args: &Args) -> Result<u64, VmError> {
  let trailing =
    match args.allow_partial_word {
      true  => TrailingBytes::Discard,
      false => TrailingBytes::Reject
    };
  let program = load_image_file(&args.image, trailing)?;

  let mut machine = UM::new(program);
  let mut console = IoConsole::stdio();
  machine.run(&mut console)?;
  Ok(machine.cycles())
}

fn main() -> ExitCode {
  // Logging goes to stderr so it never mixes with the program's output.
  env_logger::init();

  let args = Args::parse();
  debug!("{:?}", args);

  match run(&args) {
    Ok(cycles) => {
      if args.stats {
        eprintln!("um: {} instructions executed", cycles);
      }
      ExitCode::SUCCESS
    }
    Err(e) => {
      eprintln!("um: {}", e);
      ExitCode::FAILURE
    }
  }
}
