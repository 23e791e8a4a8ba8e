use super::*;

/// An unparsed chunk from a PNG.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawChunk<'b> {
  pub name: ChunkName,
  pub data: &'b [u8],
  pub declared_crc: u32,
}
impl RawChunk<'_> {
  /// If the declared CRC matches the chunk's contents.
  #[inline]
  #[must_use]
  pub fn crc_is_correct(&self) -> bool {
    chunk_crc(self.name.as_bytes(), self.data) == self.declared_crc
  }
}
impl Debug for RawChunk<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawChunk")
      .field("name", &self.name)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}

/// An iterator that produces successive raw chunks from PNG bytes.
///
/// Each item is either a chunk or the reason the next chunk couldn't be
/// read. After an error the iterator is finished. Any bytes left over after
/// the last complete chunk end the iteration with `TruncatedData`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct RawChunkIter<'b>(&'b [u8]);
impl<'b> RawChunkIter<'b> {
  /// Pass the full PNG bytes, it will remove the PNG signature automatically.
  #[inline]
  #[must_use]
  pub const fn new(bytes: &'b [u8]) -> Self {
    match bytes {
      [_, _, _, _, _, _, _, _, rest @ ..] => Self(rest),
      _ => Self(&[]),
    }
  }

  fn pull(&mut self) -> PngResult<RawChunk<'b>> {
    let (chunk_len, rest) = try_pull_u32_be(self.0)?;
    if chunk_len > MAX_CHUNK_LEN {
      return Err(PngError::invalid(format!("chunk length {chunk_len} is too large")));
    }
    let (name, rest) = try_pull_byte_array::<4>(rest)?;
    let name = ChunkName::try_new(&name).map_err(|_| PngError::invalid("bad chunk name"))?;
    let chunk_len = chunk_len as usize;
    if rest.len() < chunk_len {
      return Err(PngError::TruncatedData);
    }
    let (data, rest) = rest.split_at(chunk_len);
    let (declared_crc, rest) = try_pull_u32_be(rest)?;
    self.0 = rest;
    Ok(RawChunk { name, data, declared_crc })
  }
}
impl<'b> Iterator for RawChunkIter<'b> {
  type Item = PngResult<RawChunk<'b>>;
  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    if self.0.is_empty() {
      return None;
    }
    let out = self.pull();
    if out.is_err() {
      self.0 = &[];
    }
    Some(out)
  }
}

/// Largest length a chunk is allowed to declare.
pub const MAX_CHUNK_LEN: u32 = (1 << 31) - 1;

/// Appends a complete chunk (length, name, data, CRC) to `out`.
pub(crate) fn write_chunk(out: &mut Vec<u8>, name: &[u8; 4], data: &[u8]) {
  debug_assert!(data.len() <= MAX_CHUNK_LEN as usize);
  out.reserve(12 + data.len());
  out.extend_from_slice(&(data.len() as u32).to_be_bytes());
  out.extend_from_slice(name);
  out.extend_from_slice(data);
  out.extend_from_slice(&chunk_crc(name, data).to_be_bytes());
}

#[test]
fn test_write_then_iterate() {
  let mut bytes = PNG_SIGNATURE.to_vec();
  write_chunk(&mut bytes, b"tEXt", b"hello");
  write_chunk(&mut bytes, b"IEND", &[]);
  let chunks: Vec<_> = RawChunkIter::new(&bytes).collect::<PngResult<_>>().unwrap();
  assert_eq!(chunks.len(), 2);
  assert_eq!(chunks[0].name, ChunkName::from(*b"tEXt"));
  assert_eq!(chunks[0].data, b"hello");
  assert!(chunks.iter().all(RawChunk::crc_is_correct));
  // cut into the middle of the final chunk
  let mut it = RawChunkIter::new(&bytes[..bytes.len() - 2]);
  assert!(it.next().unwrap().is_ok());
  assert!(matches!(it.next(), Some(Err(PngError::TruncatedData))));
  assert!(it.next().is_none());
}
