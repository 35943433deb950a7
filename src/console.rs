//! The byte-at-a-time I/O boundary used by the `Input` and `Output` instructions.

use std::io::{self, BufWriter, ErrorKind, Read, Stdin, Stdout, Write};

pub trait Console {
  /// Blocks until a byte is available. `Ok(None)` means end of stream.
  fn read_byte(&mut self) -> io::Result<Option<u8>>;

  fn write_byte(&mut self, byte: u8) -> io::Result<()>;

  fn flush(&mut self) -> io::Result<()>;
}

/// A `Console` over any reader and writer.
pub struct IoConsole<R: Read, W: Write> {
  input  : R,
  output : W,
}

impl<R: Read, W: Write> IoConsole<R, W> {

  pub fn new(input: R, output: W) -> IoConsole<R, W> {
    IoConsole { input, output }
  }

  pub fn output(&self) -> &W {
    &self.output
  }

  pub fn into_output(self) -> W {
    self.output
  }
}

impl IoConsole<Stdin, BufWriter<Stdout>> {
  /// The process's standard input and a buffered standard output.
  pub fn stdio() -> Self {
    IoConsole::new(io::stdin(), BufWriter::new(io::stdout()))
  }
}

impl<R: Read, W: Write> Console for IoConsole<R, W> {

  fn read_byte(&mut self) -> io::Result<Option<u8>> {
    // Anything already written may be a prompt for the byte we are about to wait on.
    self.output.flush()?;
    let mut byte = [0u8; 1];
    loop {
      match self.input.read(&mut byte) {
        Ok(0)  => return Ok(None),
        Ok(_)  => return Ok(Some(byte[0])),
        Err(e) if e.kind() == ErrorKind::Interrupted => continue,
        Err(e) => return Err(e)
      }
    }
  }

  fn write_byte(&mut self, byte: u8) -> io::Result<()> {
    self.output.write_all(&[byte])
  }

  fn flush(&mut self) -> io::Result<()> {
    self.output.flush()
  }
}
