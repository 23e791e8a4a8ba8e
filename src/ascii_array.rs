use core::fmt::Write;

use crate::{PngError, PngResult};

/// An array of bytes expected to contain ascii data.
///
/// Construction through `From<[u8; N]>` does no checking at all. The `Debug`
/// and `Display` impls will just `as` cast each byte into a character, which is
/// still safe for non-ascii data, you just might get odd characters.
///
/// PNG chunk names are the main user of this type, see [`ChunkName`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct AsciiArray<const N: usize>(pub [u8; N]);

/// The four byte type tag of a PNG chunk.
pub type ChunkName = AsciiArray<4>;

impl<const N: usize> Default for AsciiArray<N> {
  #[inline]
  fn default() -> Self {
    Self([0; N])
  }
}

impl<const N: usize> core::fmt::Debug for AsciiArray<N> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_char('\"')?;
    for ch in self.0.iter().copied().map(|u| u as char) {
      f.write_char(ch)?;
    }
    f.write_char('\"')?;
    Ok(())
  }
}
impl<const N: usize> core::fmt::Display for AsciiArray<N> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for ch in self.0.iter().copied().map(|u| u as char) {
      f.write_char(ch)?;
    }
    Ok(())
  }
}

impl<const N: usize> From<[u8; N]> for AsciiArray<N> {
  #[inline]
  fn from(array: [u8; N]) -> Self {
    Self(array)
  }
}

impl<const N: usize> AsciiArray<N> {
  /// The raw bytes.
  #[inline]
  #[must_use]
  pub const fn as_bytes(&self) -> &[u8; N] {
    &self.0
  }
}

impl AsciiArray<4> {
  /// Validates a chunk name.
  ///
  /// The name must be exactly 4 bytes, each an ascii letter.
  pub fn try_new(bytes: &[u8]) -> PngResult<Self> {
    let array: [u8; 4] = bytes.try_into().map_err(|_| {
      PngError::Value(format!(
        "Invalid chunk name {:?}; must be exactly 4 bytes long, got {}",
        String::from_utf8_lossy(bytes),
        bytes.len()
      ))
    })?;
    if !array.iter().all(u8::is_ascii_alphabetic) {
      return Err(PngError::Value(format!(
        "Invalid chunk name {:?}; must only contain ascii letters",
        String::from_utf8_lossy(bytes)
      )));
    }
    Ok(Self(array))
  }

  /// Critical chunks have an uppercase first letter.
  #[inline]
  #[must_use]
  pub const fn is_critical(&self) -> bool {
    self.0[0].is_ascii_uppercase()
  }
}

impl core::str::FromStr for AsciiArray<4> {
  type Err = PngError;
  #[inline]
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::try_new(s.as_bytes())
  }
}

#[test]
fn test_chunk_name_validation() {
  assert!(ChunkName::try_new(b"sRGB").is_ok());
  assert!(ChunkName::try_new(b"RGB").is_err());
  assert!(ChunkName::try_new(b"RGB123").is_err());
  assert!(ChunkName::try_new(b"sR1B").is_err());
  assert!(ChunkName::try_new(b"IDAT").unwrap().is_critical());
  assert!(!ChunkName::try_new(b"tEXt").unwrap().is_critical());
  assert_eq!(format!("{}", ChunkName::from(*b"pHYs")), "pHYs");
  assert_eq!(format!("{:?}", ChunkName::from(*b"pHYs")), "\"pHYs\"");
}
