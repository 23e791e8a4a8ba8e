//! Bit depths, packed sample access, and lossless depth changes.
//!
//! PNG rows are packed: at depths below 8 several samples share a byte, with
//! the leftmost sample in the high bits. At depth 16 each sample is two
//! big-endian bytes.
//!
//! When a sample changes depth the value is scaled with bit replication (the
//! method the PNG spec recommends for decoders), so a depth change counts as
//! lossless only when replication gives back exactly the original value.

use bitfrob::u8_replicate_bits;

use crate::{PngError, PngResult};

/// The number of bits used by each sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum BitDepth {
  /// 1 bit per sample
  One = 1,
  /// 2 bits per sample
  Two = 2,
  /// 4 bits per sample
  Four = 4,
  /// 8 bits per sample
  Eight = 8,
  /// 16 bits per sample
  Sixteen = 16,
}
impl BitDepth {
  /// Bits per sample as a number.
  #[inline]
  #[must_use]
  pub const fn bits(self) -> u8 {
    self as u8
  }

  /// The largest sample value at this depth.
  #[inline]
  #[must_use]
  pub const fn max_value(self) -> u16 {
    match self {
      Self::Sixteen => u16::MAX,
      other => (1 << other.bits()) - 1,
    }
  }
}
impl TryFrom<u8> for BitDepth {
  type Error = PngError;
  fn try_from(value: u8) -> PngResult<Self> {
    Ok(match value {
      1 => Self::One,
      2 => Self::Two,
      4 => Self::Four,
      8 => Self::Eight,
      16 => Self::Sixteen,
      _ => {
        return Err(PngError::Value(format!(
          "Invalid bit_depth {value}; must be 1, 2, 4, 8 or 16"
        )))
      }
    })
  }
}

/// Reads the `index`th sample out of a packed row.
#[inline]
#[must_use]
pub(crate) fn get_sample(row: &[u8], bits: u8, index: usize) -> u16 {
  match bits {
    16 => u16::from_be_bytes([row[index * 2], row[index * 2 + 1]]),
    8 => u16::from(row[index]),
    _ => {
      let per_byte = usize::from(8 / bits);
      let shift = 8 - bits * (index % per_byte) as u8 - bits;
      let mask = (1_u8 << bits) - 1;
      u16::from((row[index / per_byte] >> shift) & mask)
    }
  }
}

/// Writes the `index`th sample of a packed row.
///
/// The value must already fit in `bits`.
#[inline]
pub(crate) fn set_sample(row: &mut [u8], bits: u8, index: usize, value: u16) {
  match bits {
    16 => row[index * 2..index * 2 + 2].copy_from_slice(&value.to_be_bytes()),
    8 => row[index] = value as u8,
    _ => {
      let per_byte = usize::from(8 / bits);
      let shift = 8 - bits * (index % per_byte) as u8 - bits;
      let mask = ((1_u8 << bits) - 1) << shift;
      let byte = &mut row[index / per_byte];
      *byte = (*byte & !mask) | (((value as u8) << shift) & mask);
    }
  }
}

/// Scales a sample of the given depth to 8 bits.
#[inline]
#[must_use]
pub fn sample_to_u8(bits: u8, value: u16) -> u8 {
  match bits {
    16 => (value >> 8) as u8,
    8 => value as u8,
    _ => u8_replicate_bits(u32::from(bits), value as u8),
  }
}

/// Scales a sample of the given depth to 16 bits.
#[inline]
#[must_use]
pub fn sample_to_u16(bits: u8, value: u16) -> u16 {
  match bits {
    16 => value,
    _ => u16::from(sample_to_u8(bits, value)) * 257,
  }
}

/// Gives the sample re-expressed at the smaller depth `to`, but only if that
/// doesn't change what the sample means.
#[inline]
#[must_use]
pub(crate) fn reduce_sample(value: u16, from: u8, to: u8) -> Option<u16> {
  debug_assert!(to < from);
  let shifted = value >> (from - to);
  if sample_to_u16(to, shifted) == sample_to_u16(from, value) {
    Some(shifted)
  } else {
    None
  }
}

/// Lossy 16 to 8 bit conversion, rounding to the nearest value.
#[inline]
#[must_use]
pub(crate) const fn scale_16_to_8(value: u16) -> u8 {
  ((value as u32 * 255 + 32895) >> 16) as u8
}

/// Smallest depth that can index a palette of `len` entries.
#[inline]
#[must_use]
pub(crate) const fn palette_bit_depth(len: usize) -> BitDepth {
  if len <= 2 {
    BitDepth::One
  } else if len <= 4 {
    BitDepth::Two
  } else if len <= 16 {
    BitDepth::Four
  } else {
    BitDepth::Eight
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sample_round_trip_all_depths() {
    for bits in [1_u8, 2, 4, 8, 16] {
      let count = 13;
      let mut row = vec![0_u8; (count * bits as usize + 7) / 8];
      let max = BitDepth::try_from(bits).unwrap().max_value();
      for i in 0..count {
        set_sample(&mut row, bits, i, (i as u16 * 7) & max);
      }
      for i in 0..count {
        assert_eq!(get_sample(&row, bits, i), (i as u16 * 7) & max, "bits {bits} index {i}");
      }
    }
  }

  #[test]
  fn test_packing_is_msb_first() {
    let mut row = [0_u8; 1];
    set_sample(&mut row, 2, 0, 0b11);
    set_sample(&mut row, 2, 3, 0b01);
    assert_eq!(row[0], 0b1100_0001);
  }

  #[test]
  fn test_replicated_scaling() {
    assert_eq!(sample_to_u8(1, 1), 0xFF);
    assert_eq!(sample_to_u8(4, 0xA), 0xAA);
    assert_eq!(sample_to_u16(8, 0x12), 0x1212);
    assert_eq!(sample_to_u16(16, 0x1234), 0x1234);
  }

  #[test]
  fn test_reduce_sample() {
    assert_eq!(reduce_sample(0xABAB, 16, 8), Some(0xAB));
    assert_eq!(reduce_sample(0xABAC, 16, 8), None);
    assert_eq!(reduce_sample(0x77, 8, 4), Some(0x7));
    assert_eq!(reduce_sample(0x78, 8, 4), None);
    assert_eq!(reduce_sample(0xFF, 8, 1), Some(1));
    assert_eq!(reduce_sample(0x00, 8, 1), Some(0));
    assert_eq!(reduce_sample(0x55, 8, 2), Some(1));
  }

  #[test]
  fn test_scale_16_to_8_rounds() {
    assert_eq!(scale_16_to_8(0), 0);
    assert_eq!(scale_16_to_8(u16::MAX), 255);
    assert_eq!(scale_16_to_8(0x8080), 0x80);
    assert_eq!(scale_16_to_8(0x80FF), 0x80);
    assert_eq!(scale_16_to_8(0x8181), 0x81);
  }

  #[test]
  fn test_palette_bit_depth() {
    assert_eq!(palette_bit_depth(1), BitDepth::One);
    assert_eq!(palette_bit_depth(2), BitDepth::One);
    assert_eq!(palette_bit_depth(3), BitDepth::Two);
    assert_eq!(palette_bit_depth(16), BitDepth::Four);
    assert_eq!(palette_bit_depth(17), BitDepth::Eight);
    assert_eq!(palette_bit_depth(256), BitDepth::Eight);
  }
}
