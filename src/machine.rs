//! The machine state and its fetch-decode-execute loop.

use std::fmt::{Display, Formatter};

use log::{debug, trace};
use prettytable::{format as TableFormat, Table};

use crate::bytecode::*;
use crate::console::Console;
use crate::errors::VmError;
use crate::memory::{SegmentStore, PROGRAM_SEGMENT};
use crate::registers::Registers;

/// Whether the machine can execute another instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
  Running,
  /// The program counter has reached the end of segment 0.
  Terminated,
}

pub struct UM {

  // Memory Stores
  memory    : SegmentStore, // Segment 0 is the running program
  registers : Registers,    // General purpose registers X[0..8]

  /// Word offset into segment 0 of the next instruction.
  pc        : Word,
  /// Instructions executed so far.
  cycles    : u64,

}

impl UM {

  // region Display methods

  fn make_register_table(name: char, registers: &[Word]) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Contents"]);

    for (i, word) in registers.iter().enumerate() {
      table.add_row(
        row![r->format!("{}[{}] =", name, i), format!("{:#010x}", word)]
      );
    }
    table
  }

  fn make_segment_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Segment", ubl->"Words"]);

    for (id, length) in self.memory.mapped() {
      match id == PROGRAM_SEGMENT {

        true  => {
          table.add_row(row![r->format!("* --> M[{}]", id), length]);
        }

        false => {
          table.add_row(row![r->format!("M[{}]", id), length]);
        }

      }
    }
    table
  }

  // endregion

  /// Creates a machine whose segment 0 holds `program`, with all registers zeroed.
  pub fn new(program: Vec<Word>) -> UM {
    UM {
      memory    : SegmentStore::new(program),
      registers : Registers::new(),
      pc        : 0,
      cycles    : 0,
    }
  }

  pub fn pc(&self) -> Word {
    self.pc
  }

  pub fn cycles(&self) -> u64 {
    self.cycles
  }

  pub fn registers(&self) -> &Registers {
    &self.registers
  }

  pub fn memory(&self) -> &SegmentStore {
    &self.memory
  }

  /// The length of segment 0 is read afresh on every call, as `LoadProgram` may replace it.
  pub fn status(&self) -> Result<Status, VmError> {
    match self.pc as usize == self.memory.length_of(PROGRAM_SEGMENT)? {
      true  => Ok(Status::Terminated),
      false => Ok(Status::Running)
    }
  }

  /**
    Runs until the program counter reaches the end of segment 0 or an instruction faults.
    Console output is flushed either way.
  */
  pub fn run<C: Console>(&mut self, console: &mut C) -> Result<(), VmError> {
    let result = self.run_to_end(console);
    let flushed = console.flush().map_err(VmError::from);
    match result {
      Ok(())     => {
        debug!("terminated after {} instructions", self.cycles);
        flushed
      }
      Err(error) => {
        debug!("faulted at pc {} after {} instructions: {}", self.pc, self.cycles, error);
        Err(error)
      }
    }
  }

  fn run_to_end<C: Console>(&mut self, console: &mut C) -> Result<(), VmError> {
    // An empty program has terminated before it starts.
    let mut status = self.status()?;
    while status == Status::Running {
      status = self.step(console)?;
    }
    Ok(())
  }

  /// Fetches, decodes and executes a single instruction.
  pub fn step<C: Console>(&mut self, console: &mut C) -> Result<Status, VmError> {
    let word = self.memory.read_word(PROGRAM_SEGMENT, self.pc)?;
    let instruction = try_decode_instruction(word)?;
    trace!("{:>8}: {}", self.pc, instruction);

    self.pc = self.pc.wrapping_add(1);
    self.execute(instruction, console)?;
    self.cycles += 1;

    #[cfg(feature = "trace_computation")]
      {
        trace!("\n{}", self);
      }

    self.status()
  }

  // region Instruction semantics

  fn get(&self, register: RegisterIndex) -> Result<Word, VmError> {
    self.registers.read(register as usize)
  }

  fn set(&mut self, register: RegisterIndex, word: Word) -> Result<(), VmError> {
    self.registers.write(register as usize, word)
  }

  fn execute<C: Console>(&mut self, instruction: Instruction, console: &mut C) -> Result<(), VmError> {
    let (opcode, a, b, c) =
      match instruction {
        Instruction::LoadValue{a, value} => {
          return self.set(a, value);
        }
        Instruction::Standard{opcode, a, b, c} => (opcode, a, b, c)
      };

    match opcode {

      Operation::ConditionalMove => {
        if self.get(c)? != 0 {
          let word = self.get(b)?;
          self.set(a, word)?;
        }
      }

      Operation::SegmentLoad => {
        let word = self.memory.read_word(self.get(b)?, self.get(c)?)?;
        self.set(a, word)?;
      }

      Operation::SegmentStore => {
        let (id, offset, word) = (self.get(a)?, self.get(b)?, self.get(c)?);
        self.memory.write_word(id, offset, word)?;
      }

      Operation::Add => {
        let word = self.get(b)?.wrapping_add(self.get(c)?);
        self.set(a, word)?;
      }

      Operation::Multiply => {
        let word = self.get(b)?.wrapping_mul(self.get(c)?);
        self.set(a, word)?;
      }

      Operation::Divide => {
        let word = self.get(b)?.checked_div(self.get(c)?).ok_or(VmError::DivisionByZero)?;
        self.set(a, word)?;
      }

      Operation::Nand => {
        let word = !(self.get(b)? & self.get(c)?);
        self.set(a, word)?;
      }

      Operation::Halt => {
        self.pc = self.memory.length_of(PROGRAM_SEGMENT)? as Word;
      }

      Operation::MapSegment => {
        let num_words = self.get(c)?;
        let id = self.memory.allocate(num_words)?;
        self.set(b, id)?;
      }

      Operation::UnmapSegment => {
        let id = self.get(c)?;
        self.memory.release(id)?;
      }

      Operation::Output => {
        let word = self.get(c)?;
        if word > u8::MAX as Word {
          return Err(VmError::InvalidOutput(word));
        }
        console.write_byte(word as u8)?;
      }

      Operation::Input => {
        let word =
          match console.read_byte()? {
            Some(byte) => byte as Word,
            None       => Word::MAX
          };
        self.set(c, word)?;
      }

      Operation::LoadProgram => {
        // Validate both operands before touching segment 0.
        let (id, target) = (self.get(b)?, self.get(c)?);
        self.memory.replace_program(id)?;
        self.pc = target;
      }

      Operation::LoadValue => {
        // `try_decode_instruction` always yields `Instruction::LoadValue` for this opcode.
        return Err(VmError::Decode(opcode.code() as Word));
      }

    }
    Ok(())
  }

  // endregion
}


impl Display for UM {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let registers: Vec<Word> = self.registers.iter().copied().collect();
    let x_table = UM::make_register_table('X', &registers);
    let m_table = self.make_segment_table();

    let mut combined_table = table!([x_table, m_table]);

    combined_table.set_titles(row![ub->"Registers", ub->"Segments"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    write!(f, "PC: {}\tCycles: {}\n{}", self.pc, self.cycles, combined_table)
  }
}


lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}
