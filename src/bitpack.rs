/*!
  Packing and unpacking of bit fields within a 64 bit carrier.

  A field is described by its `width` in bits and the offset of its least significant bit,
  `lsb`. Every function requires `width + lsb <= 64`; a violation is a caller bug and panics.

  Rust's `<<` and `>>` overflow when shifting by the full width of the type, so every shift in
  this module goes through `shl`, `shr` or `sra`, which define a shift by 64 as "all bits
  shifted out."
*/

use crate::errors::VmError;

const CARRIER_BITS: u32 = 64;

#[inline]
fn shl(word: u64, bits: u32) -> u64 {
  word.checked_shl(bits).unwrap_or(0)
}

#[inline]
fn shr(word: u64, bits: u32) -> u64 {
  word.checked_shr(bits).unwrap_or(0)
}

/// Arithmetic shift right. Shifting by 64 leaves only copies of the sign bit.
#[inline]
fn sra(word: u64, bits: u32) -> i64 {
  (word as i64) >> bits.min(CARRIER_BITS - 1)
}

#[inline]
fn check_field(width: u32, lsb: u32) {
  assert!(
    width <= CARRIER_BITS && lsb <= CARRIER_BITS - width,
    "bit field of width {} at lsb {} does not fit in a 64 bit word", width, lsb
  );
}

/// True iff `value` can be represented in `width` unsigned bits.
pub fn fits_unsigned(value: u64, width: u32) -> bool {
  if width >= CARRIER_BITS {
    return true;
  }
  shr(value, width) == 0
}

/// True iff `value` can be represented in `width` bits of two's complement.
pub fn fits_signed(value: i64, width: u32) -> bool {
  if width >= CARRIER_BITS {
    return true;
  }
  let narrow = sra(shl(value as u64, CARRIER_BITS - width), CARRIER_BITS - width);
  narrow == value
}

/// Extracts bits `[lsb, lsb + width)` of `word`, right justified.
pub fn get_unsigned(word: u64, width: u32, lsb: u32) -> u64 {
  check_field(width, lsb);
  let hi = lsb + width; // one beyond the most significant bit
  shr(shl(word, CARRIER_BITS - hi), CARRIER_BITS - width)
}

/// Extracts bits `[lsb, lsb + width)` of `word` as a two's complement integer.
pub fn get_signed(word: u64, width: u32, lsb: u32) -> i64 {
  check_field(width, lsb);
  // A zero-width field has no sign bit to inspect.
  if width == 0 {
    return 0;
  }
  let hi = lsb + width;
  sra(shl(word, CARRIER_BITS - hi), CARRIER_BITS - width)
}

/**
  Returns `word` with bits `[lsb, lsb + width)` replaced by `value`. Fails with
  `VmError::Overflow` if `value` does not fit in `width` unsigned bits.
*/
pub fn set_unsigned(word: u64, width: u32, lsb: u32, value: u64) -> Result<u64, VmError> {
  check_field(width, lsb);
  if !fits_unsigned(value, width) {
    return Err(VmError::Overflow { value, width });
  }
  let hi = lsb + width;
  let high_part = shl(shr(word, hi), hi);
  let low_part  = shr(shl(word, CARRIER_BITS - lsb), CARRIER_BITS - lsb);
  Ok(high_part | low_part | shl(value, lsb))
}

/// The signed counterpart of `set_unsigned`, checked with `fits_signed`.
pub fn set_signed(word: u64, width: u32, lsb: u32, value: i64) -> Result<u64, VmError> {
  if !fits_signed(value, width) {
    return Err(VmError::Overflow { value: value as u64, width });
  }
  set_unsigned(word, width, lsb, get_unsigned(value as u64, width, 0))
}
