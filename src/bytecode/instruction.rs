
use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, EnumIter, IntoStaticStr};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use crate::bytecode::Word;

/// Index of one of the eight general purpose registers.
pub type RegisterIndex = u8;

/**
  Opcodes of the virtual machine.

  The discriminant of each variant is its opcode, so the order the opcodes are listed below is
  significant. Opcodes 14 and 15 are unassigned and fail to decode.
*/
#[derive(
StrumDisplay, IntoStaticStr, EnumIter, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq,       PartialEq,        Debug,         Hash
)]
#[repr(u8)]
pub enum Operation {
  ConditionalMove, // if X[c] != 0 { X[a] = X[b] }
  SegmentLoad,     // X[a] = M[X[b]][X[c]]
  SegmentStore,    // M[X[a]][X[b]] = X[c]
  Add,             // X[a] = X[b] + X[c]
  Multiply,        // X[a] = X[b] * X[c]
  Divide,          // X[a] = X[b] / X[c]
  Nand,            // X[a] = !(X[b] & X[c])
  Halt,
  MapSegment,      // X[b] = map(X[c] words)
  UnmapSegment,    // unmap(X[c])
  Output,          // write X[c]
  Input,           // X[c] = read
  LoadProgram,     // M[0] = copy(M[X[b]]); pc = X[c]
  // Opcode 13, the only instruction in the `LoadValue` format.
  LoadValue,       // X[a] = value
}

impl Operation {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }
}

/// Holds the unencoded components of an instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Instruction {
  /// [OpCode:4][Unused:19][A:3][B:3][C:3]
  Standard {
    opcode : Operation,
    a      : RegisterIndex,
    b      : RegisterIndex,
    c      : RegisterIndex
  },
  /// [OpCode:4][A:3][Value:25]
  LoadValue {
    a     : RegisterIndex,
    value : Word
  },
}

impl Instruction {
  pub fn opcode(&self) -> Operation {
    match self {
      Instruction::Standard{opcode, ..} => *opcode,
      Instruction::LoadValue{..}        => Operation::LoadValue,
    }
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self{

      Instruction::Standard{opcode, a, b, c} => {
        write!(f, "{}(X[{}], X[{}], X[{}])", opcode, a, b, c)
      }

      Instruction::LoadValue{a, value} => {
        write!(f, "{}(X[{}], {})", Operation::LoadValue, a, value)
      }

    }
  }
}
