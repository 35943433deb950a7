/*!
  Builds the initial contents of segment 0 from a program image.

  An image is a sequence of 32 bit words, each stored as four bytes, most significant byte
  first. The bytes are split into groups with `nom` and each group is packed into a word with
  `bitpack::set_unsigned`.
*/

use std::fs;
use std::path::Path;

use log::{debug, warn};
use nom::{bytes::complete::take, multi::many0, IResult};

use crate::bitpack::set_unsigned;
use crate::bytecode::Word;
use crate::errors::VmError;

const WORD_BYTES: usize = 4;

/// What to do with an image whose length is not a multiple of four.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TrailingBytes {
  /// Fail with `VmError::MalformedImage`.
  Reject,
  /// Drop the partial word and load the rest.
  Discard,
}

impl Default for TrailingBytes {
  fn default() -> Self {
    TrailingBytes::Reject
  }
}

fn word_groups(input: &[u8]) -> IResult<&[u8], Vec<&[u8]>> {
  many0(take(WORD_BYTES))(input)
}

/// Packs one big-endian group of four bytes into a word.
fn pack_word(group: &[u8]) -> Result<Word, VmError> {
  let mut word: u64 = 0;
  for (i, &byte) in group.iter().enumerate() {
    let lsb = (8 * (WORD_BYTES - 1 - i)) as u32;
    word = set_unsigned(word, 8, lsb, byte as u64)?;
  }
  Ok(word as Word)
}

/// Converts a program image into the words of segment 0.
pub fn load_image(bytes: &[u8], trailing: TrailingBytes) -> Result<Vec<Word>, VmError> {
  let malformed = || VmError::MalformedImage {
    length   : bytes.len(),
    trailing : bytes.len() % WORD_BYTES,
  };

  let (rest, groups) = word_groups(bytes).map_err(|_| malformed())?;
  if !rest.is_empty() {
    match trailing {
      TrailingBytes::Reject  => return Err(malformed()),
      TrailingBytes::Discard => {
        warn!("discarding {} trailing bytes of a partial word", rest.len());
      }
    }
  }

  groups.into_iter().map(pack_word).collect()
}

/// Reads and loads the program image at `path`.
pub fn load_image_file(path: &Path, trailing: TrailingBytes) -> Result<Vec<Word>, VmError> {
  let bytes =
    fs::read(path).map_err(|source| VmError::ImageUnavailable { path: path.to_path_buf(), source })?;
  let program = load_image(&bytes, trailing)?;
  debug!("loaded {} words from {}", program.len(), path.display());
  Ok(program)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn big_endian_words(){
    let bytes = [0xD0, 0x00, 0x00, 0x41, 0x00, 0x00, 0x00, 0x01, 0xFF, 0xFE, 0xFD, 0xFC];
    assert_eq!(
      load_image(&bytes, TrailingBytes::Reject).unwrap(),
      vec![0xD000_0041, 1, 0xFFFE_FDFC]
    );
  }

  #[test]
  fn empty_image(){
    assert!(load_image(&[], TrailingBytes::Reject).unwrap().is_empty());
  }

  #[test]
  fn partial_word_rejected(){
    let bytes = [0, 0, 0, 1, 0x70];
    assert!(matches!(
      load_image(&bytes, TrailingBytes::Reject),
      Err(VmError::MalformedImage { length: 5, trailing: 1 })
    ));
    assert!(matches!(
      load_image(&bytes[..3], TrailingBytes::Reject),
      Err(VmError::MalformedImage { length: 3, trailing: 3 })
    ));
  }

  #[test]
  fn partial_word_discarded(){
    let bytes = [0, 0, 0, 1, 0x70, 0x00];
    assert_eq!(load_image(&bytes, TrailingBytes::Discard).unwrap(), vec![1]);
  }

  #[test]
  fn missing_file(){
    let path = Path::new("/nonexistent/program.um");
    assert!(matches!(
      load_image_file(path, TrailingBytes::default()),
      Err(VmError::ImageUnavailable { .. })
    ));
  }

  #[test]
  fn reads_file(){
    let path = std::env::temp_dir().join(format!("um-loader-test-{}.um", std::process::id()));
    fs::write(&path, [0x70u8, 0, 0, 0]).unwrap();
    let program = load_image_file(&path, TrailingBytes::Reject);
    fs::remove_file(&path).unwrap();
    assert_eq!(program.unwrap(), vec![0x7000_0000]);
  }
}
