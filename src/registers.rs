//! The register file: eight general purpose 32 bit words, all zero at startup.

use crate::bytecode::Word;
use crate::errors::VmError;

pub const REGISTER_COUNT: usize = 8;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Registers {
  words: [Word; REGISTER_COUNT],
}

impl Registers {

  pub fn new() -> Registers {
    Registers { words: [0; REGISTER_COUNT] }
  }

  /// Returns the word in register `index`, or `VmError::InvalidRegister` if `index > 7`.
  pub fn read(&self, index: usize) -> Result<Word, VmError> {
    self.words
        .get(index)
        .copied()
        .ok_or(VmError::InvalidRegister(index))
  }

  pub fn write(&mut self, index: usize, word: Word) -> Result<(), VmError> {
    match self.words.get_mut(index) {
      Some(slot) => {
        *slot = word;
        Ok(())
      }
      None => Err(VmError::InvalidRegister(index))
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = &Word> {
    self.words.iter()
  }
}
