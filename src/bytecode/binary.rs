/*!
  This module is responsible for the encoding and decoding of binary instructions. All field
  access goes through `crate::bitpack`.
*/
use std::convert::TryFrom;

use super::{Instruction, Operation, RegisterIndex, Word};
use crate::bitpack::{get_unsigned, set_unsigned};
use crate::errors::VmError;

// If you change these you must also change the format table in `bytecode/mod.rs`.
const OPCODE_WIDTH    : u32 = 4;
const OPCODE_LSB      : u32 = 28;
const REGISTER_WIDTH  : u32 = 3;
const A_LSB           : u32 = 6;
const B_LSB           : u32 = 3;
const C_LSB           : u32 = 0;
const VALUE_A_LSB     : u32 = 25;
const VALUE_WIDTH     : u32 = 25;
const VALUE_LSB       : u32 = 0;

fn register_field(word: Word, lsb: u32) -> RegisterIndex {
  get_unsigned(word as u64, REGISTER_WIDTH, lsb) as RegisterIndex
}

/// Decodes a single instruction word. Fails with `VmError::Decode` on opcodes 14 and 15.
pub fn try_decode_instruction(word: Word) -> Result<Instruction, VmError> {
  let code = get_unsigned(word as u64, OPCODE_WIDTH, OPCODE_LSB) as u8;
  let opcode = Operation::try_from(code).map_err(|_| VmError::Decode(code as Word))?;

  let instruction =
    match opcode {
      Operation::LoadValue => {
        // [OpCode:4][A:3][Value:25]
        Instruction::LoadValue {
          a     : register_field(word, VALUE_A_LSB),
          value : get_unsigned(word as u64, VALUE_WIDTH, VALUE_LSB) as Word
        }
      }
      _ => {
        // [OpCode:4][Unused:19][A:3][B:3][C:3]
        Instruction::Standard {
          opcode,
          a: register_field(word, A_LSB),
          b: register_field(word, B_LSB),
          c: register_field(word, C_LSB)
        }
      }
    };

  Ok(instruction)
}

/**
  Encodes the instruction into a word. Fails with `VmError::Overflow` if a register index does
  not fit in three bits or a `LoadValue` literal does not fit in 25.

  A `Standard` instruction carrying `Operation::LoadValue` is encoded in the `LoadValue` format,
  taking `a` as the register and zero as the literal.
*/
pub fn encode_instruction(instruction: Instruction) -> Result<Word, VmError> {
  let word =
    match instruction {

      Instruction::Standard{opcode: Operation::LoadValue, a, ..} => {
        encode_instruction(Instruction::LoadValue { a, value: 0 })? as u64
      }

      Instruction::Standard{opcode, a, b, c} => {
        let word = set_unsigned(0,    OPCODE_WIDTH,   OPCODE_LSB, opcode.code() as u64)?;
        let word = set_unsigned(word, REGISTER_WIDTH, A_LSB,      a as u64)?;
        let word = set_unsigned(word, REGISTER_WIDTH, B_LSB,      b as u64)?;
        set_unsigned(word, REGISTER_WIDTH, C_LSB, c as u64)?
      }

      Instruction::LoadValue{a, value} => {
        let word = set_unsigned(0,    OPCODE_WIDTH,   OPCODE_LSB,  Operation::LoadValue.code() as u64)?;
        let word = set_unsigned(word, REGISTER_WIDTH, VALUE_A_LSB, a as u64)?;
        set_unsigned(word, VALUE_WIDTH, VALUE_LSB, value as u64)?
      }

    };
  Ok(word as Word)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decode_standard(){
    // Add(X[1], X[2], X[3])
    let word = 0x3000_0000 | (1 << 6) | (2 << 3) | 3;
    assert_eq!(
      try_decode_instruction(word).unwrap(),
      Instruction::Standard { opcode: Operation::Add, a: 1, b: 2, c: 3 }
    );
  }

  #[test]
  fn decode_ignores_unused_bits(){
    let word = 0x7FFF_FE00;
    assert_eq!(
      try_decode_instruction(word).unwrap(),
      Instruction::Standard { opcode: Operation::Halt, a: 0, b: 0, c: 0 }
    );
  }

  #[test]
  fn decode_load_value(){
    let word = 0xD000_0000 | (5 << 25) | 0x1AB_CDEF;
    assert_eq!(
      try_decode_instruction(word).unwrap(),
      Instruction::LoadValue { a: 5, value: 0x1AB_CDEF }
    );
  }

  #[test]
  fn decode_unknown_opcode(){
    assert!(matches!(try_decode_instruction(0xE000_0000), Err(VmError::Decode(14))));
    assert!(matches!(try_decode_instruction(0xFFFF_FFFF), Err(VmError::Decode(15))));
  }

  #[test]
  fn encode_matches_decode(){
    let instructions = [
      Instruction::Standard { opcode: Operation::SegmentStore, a: 7, b: 0, c: 4 },
      Instruction::Standard { opcode: Operation::Halt, a: 0, b: 0, c: 0 },
      Instruction::LoadValue { a: 3, value: (1 << 25) - 1 },
    ];
    for &instruction in instructions.iter() {
      let word = encode_instruction(instruction).unwrap();
      assert_eq!(try_decode_instruction(word).unwrap(), instruction);
    }
    assert_eq!(encode_instruction(Instruction::LoadValue { a: 0, value: 65 }).unwrap(), 0xD000_0041);
  }

  #[test]
  fn encode_rejects_wide_fields(){
    let bad_register = Instruction::Standard { opcode: Operation::Add, a: 8, b: 0, c: 0 };
    assert!(matches!(encode_instruction(bad_register), Err(VmError::Overflow { value: 8, width: 3 })));
    let bad_value = Instruction::LoadValue { a: 0, value: 1 << 25 };
    assert!(matches!(encode_instruction(bad_value), Err(VmError::Overflow { width: 25, .. })));
  }
}
