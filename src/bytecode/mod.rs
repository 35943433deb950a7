/*!

  The VM uses a 32 bit word. Every instruction is exactly one word, and the opcode always lives
  in the top four bits. There are two instruction formats:

    Standard:    [OpCode:4][Unused:19][A:3][B:3][C:3]
    LoadValue:   [OpCode:4][A:3][Value:25]

  `A`, `B` and `C` are register indices. Only `LoadValue` (opcode 13) uses the second format;
  its 25 bit literal is zero-extended into register `A`.

  Like the opcode enum, the decoded `Instruction` is a small value type. Instructions in memory
  are always kept as raw words, since a program may overwrite its own code at any time through
  `LoadProgram`, and are decoded one at a time as they are fetched.

*/

mod binary;
mod instruction;

pub use binary::{encode_instruction, try_decode_instruction};
pub use instruction::{Instruction, Operation, RegisterIndex};

pub type Word = u32;
