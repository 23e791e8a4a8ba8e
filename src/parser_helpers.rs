//! Just has shorthands for the big-endian int parsing that PNG wants.

use crate::{PngError, PngResult};

#[inline]
pub(crate) fn try_pull_byte_array<const N: usize>(bytes: &[u8]) -> PngResult<([u8; N], &[u8])> {
  match bytes.split_first_chunk::<N>() {
    Some((head, tail)) => Ok((*head, tail)),
    None => Err(PngError::TruncatedData),
  }
}

#[inline]
pub(crate) fn try_pull_u32_be(bytes: &[u8]) -> PngResult<(u32, &[u8])> {
  let (a, tail) = try_pull_byte_array::<4>(bytes)?;
  Ok((u32::from_be_bytes(a), tail))
}

#[inline]
#[must_use]
pub(crate) fn u16_be(bytes: [u8; 2]) -> u16 {
  u16::from_be_bytes(bytes)
}

#[test]
fn test_pull_helpers() {
  let bytes = [0, 0, 1, 2, 9];
  let (v, rest) = try_pull_u32_be(&bytes).unwrap();
  assert_eq!(v, 0x0102);
  assert_eq!(rest, &[9]);
  assert!(try_pull_u32_be(rest).is_err());
  assert_eq!(u16_be([1, 0]), 256);
}
