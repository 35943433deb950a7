/*!
  The segmented memory store.

  Segments live in an arena indexed by `SegmentId`. An unmapped slot is `None`, so a stale id
  finds nothing rather than someone else's words; its id waits on the free list and is handed
  out again, most recently freed first, before the arena grows. Segment 0 holds the running
  program. It is always mapped and can only be replaced wholesale with `replace_program`.
*/

use log::trace;

use crate::bytecode::Word;
use crate::errors::{Fault, VmError};

pub type SegmentId = Word;

pub const PROGRAM_SEGMENT: SegmentId = 0;

#[derive(Clone, Debug)]
pub struct SegmentStore {
  /// `segments[id]` is `None` exactly when `id` is on `free`.
  segments : Vec<Option<Vec<Word>>>,
  /// Ids of unmapped slots, reused last in, first out.
  free     : Vec<SegmentId>,
}

impl SegmentStore {

  /// Creates a store whose segment 0 holds `program`.
  pub fn new(program: Vec<Word>) -> SegmentStore {
    SegmentStore {
      segments : vec![Some(program)],
      free     : vec![],
    }
  }

  fn segment(&self, id: SegmentId) -> Result<&Vec<Word>, VmError> {
    match self.segments.get(id as usize) {
      Some(Some(words)) => Ok(words),
      _                 => Err(VmError::segment_fault(id, Fault::Unmapped))
    }
  }

  fn segment_mut(&mut self, id: SegmentId) -> Result<&mut Vec<Word>, VmError> {
    match self.segments.get_mut(id as usize) {
      Some(Some(words)) => Ok(words),
      _                 => Err(VmError::segment_fault(id, Fault::Unmapped))
    }
  }

  /**
    Maps a new segment of `num_words` zeroed words and returns its id. A previously unmapped id
    is reused if one is available.

    Fails with `VmError::AllocationFailed` if the words cannot be allocated.
  */
  pub fn allocate(&mut self, num_words: Word) -> Result<SegmentId, VmError> {
    let mut words: Vec<Word> = Vec::new();
    words
      .try_reserve_exact(num_words as usize)
      .map_err(|_| VmError::AllocationFailed(num_words))?;
    words.resize(num_words as usize, 0);

    let id =
      match self.free.pop() {
        Some(id) => {
          self.segments[id as usize] = Some(words);
          id
        }
        None => {
          if self.segments.len() > SegmentId::MAX as usize {
            return Err(VmError::AllocationFailed(num_words));
          }
          self.segments.push(Some(words));
          (self.segments.len() - 1) as SegmentId
        }
      };
    trace!("mapped segment {} with {} words", id, num_words);
    Ok(id)
  }

  /// Unmaps segment `id`, making its id available to `allocate`.
  pub fn release(&mut self, id: SegmentId) -> Result<(), VmError> {
    if id == PROGRAM_SEGMENT {
      return Err(VmError::segment_fault(id, Fault::UnmapProgram));
    }
    match self.segments.get_mut(id as usize) {
      Some(slot) if slot.is_some() => {
        *slot = None;
      }
      _ => return Err(VmError::segment_fault(id, Fault::Unmapped))
    }
    self.free.push(id);
    trace!("unmapped segment {}", id);
    Ok(())
  }

  pub fn read_word(&self, id: SegmentId, offset: Word) -> Result<Word, VmError> {
    let words = self.segment(id)?;
    words
      .get(offset as usize)
      .copied()
      .ok_or_else(|| VmError::segment_fault(id, Fault::OutOfBounds { offset, length: words.len() }))
  }

  pub fn write_word(&mut self, id: SegmentId, offset: Word, value: Word) -> Result<(), VmError> {
    let words = self.segment_mut(id)?;
    let length = words.len();
    match words.get_mut(offset as usize) {
      Some(word) => {
        *word = value;
        Ok(())
      }
      None => Err(VmError::segment_fault(id, Fault::OutOfBounds { offset, length }))
    }
  }

  /**
    Replaces segment 0 with a copy of segment `id`. The source segment stays mapped and is not
    aliased by the copy. Replacing segment 0 with itself does nothing.
  */
  pub fn replace_program(&mut self, id: SegmentId) -> Result<(), VmError> {
    if id == PROGRAM_SEGMENT {
      return Ok(());
    }
    let program = self.segment(id)?.clone();
    trace!("segment {} ({} words) replaces the program", id, program.len());
    self.segments[PROGRAM_SEGMENT as usize] = Some(program);
    Ok(())
  }

  /// The number of words in segment `id`.
  pub fn length_of(&self, id: SegmentId) -> Result<usize, VmError> {
    Ok(self.segment(id)?.len())
  }

  pub fn is_mapped(&self, id: SegmentId) -> bool {
    self.segment(id).is_ok()
  }

  /// Iterates over the ids and lengths of all mapped segments, in id order.
  pub fn mapped(&self) -> impl Iterator<Item = (SegmentId, usize)> + '_ {
    self.segments
        .iter()
        .enumerate()
        .filter_map(|(id, slot)| slot.as_ref().map(|words| (id as SegmentId, words.len())))
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn allocate_zeroed(){
    let mut memory = SegmentStore::new(vec![1, 2, 3]);
    let id = memory.allocate(5).unwrap();
    assert_eq!(id, 1);
    assert_eq!(memory.length_of(id).unwrap(), 5);
    for offset in 0..5 {
      assert_eq!(memory.read_word(id, offset).unwrap(), 0);
    }
    assert_eq!(memory.length_of(PROGRAM_SEGMENT).unwrap(), 3);
  }

  #[test]
  fn allocate_empty_segment(){
    let mut memory = SegmentStore::new(vec![]);
    let id = memory.allocate(0).unwrap();
    assert!(memory.is_mapped(id));
    assert_eq!(memory.length_of(id).unwrap(), 0);
    assert!(matches!(
      memory.read_word(id, 0),
      Err(VmError::SegmentFault { fault: Fault::OutOfBounds { offset: 0, length: 0 }, .. })
    ));
  }

  #[test]
  fn write_then_read(){
    let mut memory = SegmentStore::new(vec![0]);
    let id = memory.allocate(2).unwrap();
    memory.write_word(id, 1, 0xCAFE).unwrap();
    assert_eq!(memory.read_word(id, 1).unwrap(), 0xCAFE);
    assert_eq!(memory.read_word(id, 0).unwrap(), 0);
    assert!(matches!(
      memory.write_word(id, 2, 1),
      Err(VmError::SegmentFault { id: 1, fault: Fault::OutOfBounds { offset: 2, length: 2 } })
    ));
  }

  #[test]
  fn released_segment_faults(){
    let mut memory = SegmentStore::new(vec![]);
    let id = memory.allocate(4).unwrap();
    memory.release(id).unwrap();
    assert!(!memory.is_mapped(id));
    assert!(matches!(
      memory.read_word(id, 0),
      Err(VmError::SegmentFault { fault: Fault::Unmapped, .. })
    ));
    assert!(matches!(
      memory.write_word(id, 0, 1),
      Err(VmError::SegmentFault { fault: Fault::Unmapped, .. })
    ));
    assert!(matches!(
      memory.release(id),
      Err(VmError::SegmentFault { fault: Fault::Unmapped, .. })
    ));
  }

  #[test]
  fn never_mapped_id_faults(){
    let mut memory = SegmentStore::new(vec![]);
    assert!(matches!(memory.read_word(9, 0), Err(VmError::SegmentFault { id: 9, .. })));
    assert!(matches!(memory.release(9), Err(VmError::SegmentFault { id: 9, .. })));
  }

  #[test]
  fn release_program_segment(){
    let mut memory = SegmentStore::new(vec![7]);
    assert!(matches!(
      memory.release(PROGRAM_SEGMENT),
      Err(VmError::SegmentFault { id: 0, fault: Fault::UnmapProgram })
    ));
    assert_eq!(memory.read_word(PROGRAM_SEGMENT, 0).unwrap(), 7);
  }

  #[test]
  fn reuse_is_last_in_first_out(){
    let mut memory = SegmentStore::new(vec![]);
    let first  = memory.allocate(1).unwrap();
    let second = memory.allocate(1).unwrap();
    let third  = memory.allocate(1).unwrap();
    memory.release(first).unwrap();
    memory.release(third).unwrap();

    assert_eq!(memory.allocate(3).unwrap(), third);
    assert_eq!(memory.allocate(3).unwrap(), first);
    assert_eq!(memory.allocate(3).unwrap(), 4);
    assert!(memory.is_mapped(second));
  }

  #[test]
  fn reused_segment_is_zeroed(){
    let mut memory = SegmentStore::new(vec![]);
    let id = memory.allocate(2).unwrap();
    memory.write_word(id, 0, 99).unwrap();
    memory.release(id).unwrap();
    let again = memory.allocate(3).unwrap();
    assert_eq!(again, id);
    assert_eq!(memory.length_of(again).unwrap(), 3);
    assert_eq!(memory.read_word(again, 0).unwrap(), 0);
  }

  #[test]
  fn replace_program_copies(){
    let mut memory = SegmentStore::new(vec![1, 2, 3]);
    let id = memory.allocate(2).unwrap();
    memory.write_word(id, 0, 40).unwrap();
    memory.write_word(id, 1, 41).unwrap();
    memory.replace_program(id).unwrap();

    assert_eq!(memory.length_of(PROGRAM_SEGMENT).unwrap(), 2);
    assert_eq!(memory.read_word(PROGRAM_SEGMENT, 1).unwrap(), 41);

    // The copy is independent of its source.
    memory.write_word(id, 1, 0).unwrap();
    assert_eq!(memory.read_word(PROGRAM_SEGMENT, 1).unwrap(), 41);
    assert!(memory.is_mapped(id));
  }

  #[test]
  fn replace_program_with_itself(){
    let mut memory = SegmentStore::new(vec![5, 6]);
    memory.replace_program(PROGRAM_SEGMENT).unwrap();
    assert_eq!(memory.length_of(PROGRAM_SEGMENT).unwrap(), 2);
  }

  #[test]
  fn replace_program_from_unmapped(){
    let mut memory = SegmentStore::new(vec![5, 6]);
    assert!(matches!(memory.replace_program(3), Err(VmError::SegmentFault { id: 3, .. })));
    assert_eq!(memory.length_of(PROGRAM_SEGMENT).unwrap(), 2);
  }

  #[test]
  fn mapped_lists_live_segments(){
    let mut memory = SegmentStore::new(vec![1]);
    let a = memory.allocate(2).unwrap();
    let b = memory.allocate(3).unwrap();
    memory.release(a).unwrap();
    assert_eq!(memory.mapped().collect::<Vec<_>>(), vec![(0, 1), (b, 3)]);
  }
}
