//! The single error type of the machine. Every variant is fatal: the executor stops at the
//! faulting instruction and hands the error up to whoever called `run`.

use std::path::PathBuf;

use thiserror::Error;

use crate::bytecode::Word;
use crate::memory::SegmentId;

/// Why a segment access was refused.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Fault {
  /// The id names no segment, or a segment that has been unmapped.
  Unmapped,
  /// Segment 0 holds the running program and may never be unmapped.
  UnmapProgram,
  /// The offset lies past the end of the segment.
  OutOfBounds { offset: Word, length: usize },
}

impl std::fmt::Display for Fault {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Fault::Unmapped                     => write!(f, "segment is not mapped"),
      Fault::UnmapProgram                 => write!(f, "segment 0 cannot be unmapped"),
      Fault::OutOfBounds{offset, length}  => {
        write!(f, "offset {} is out of bounds for a segment of {} words", offset, length)
      }
    }
  }
}

#[derive(Debug, Error)]
pub enum VmError {
  /// The top four bits of an instruction word name no operation.
  #[error("unknown opcode {0}")]
  Decode(Word),

  #[error("invalid register index {0}")]
  InvalidRegister(usize),

  #[error("segment fault on segment {id}: {fault}")]
  SegmentFault { id: SegmentId, fault: Fault },

  #[error("division by zero")]
  DivisionByZero,

  /// A value was too wide for the bit field it was to be packed into.
  #[error("value {value:#x} does not fit in a {width} bit field")]
  Overflow { value: u64, width: u32 },

  #[error("malformed program image: {length} bytes leaves a partial word of {trailing} bytes")]
  MalformedImage { length: usize, trailing: usize },

  #[error("could not open {} for reading: {source}", .path.display())]
  ImageUnavailable {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Output only accepts byte values.
  #[error("cannot output {0}: value is larger than 255")]
  InvalidOutput(Word),

  #[error("could not allocate a segment of {0} words")]
  AllocationFailed(Word),

  #[error("console I/O failed: {0}")]
  Io(#[from] std::io::Error),
}

impl VmError {
  pub(crate) fn segment_fault(id: SegmentId, fault: Fault) -> VmError {
    VmError::SegmentFault { id, fault }
  }
}
