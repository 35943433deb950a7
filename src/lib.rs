/*!
  A virtual machine for a fourteen-instruction, 32 bit instruction set over segmented memory.

  The program image is loaded into segment 0 by `loader`, then `machine::UM` fetches, decodes
  and executes one word at a time until the program counter reaches the end of segment 0. A
  program can map and unmap further segments at run time, and can replace segment 0 with a
  copy of any other segment.
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod bitpack;
pub mod bytecode;
pub mod console;
pub mod errors;
pub mod loader;
pub mod machine;
pub mod memory;
pub mod registers;

pub use console::{Console, IoConsole};
pub use errors::VmError;
pub use loader::TrailingBytes;
pub use machine::UM;
