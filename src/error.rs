use core::num::TryFromIntError;
use std::collections::TryReserveError;

use crate::ChunkName;

/// Result alias used throughout the crate.
pub type PngResult<T> = Result<T, PngError>;

/// An error from the `pngslim` crate.
#[derive(Debug, thiserror::Error)]
pub enum PngError {
  /// The first eight bytes are not the PNG signature.
  #[error("Invalid header detected; Not a PNG file")]
  NotPng,

  /// The data ended before a complete PNG could be read.
  #[error("Missing data in the file; the file is truncated")]
  TruncatedData,

  /// The `IHDR` chunk is missing, misplaced, or describes an impossible image.
  #[error("Invalid or unsupported image header")]
  InvalidHeader,

  /// The declared CRC of a chunk doesn't match its contents.
  #[error("CRC Mismatch in {0} chunk; May be recoverable by using fix_errors")]
  CrcMismatch(ChunkName),

  /// A chunk that the image requires is absent.
  #[error("Chunk {0} missing or empty")]
  ChunkMissing(&'static str),

  /// Structurally invalid data, with a short description.
  #[error("Invalid data found: {0}")]
  InvalidData(String),

  /// The compressed image data could not be inflated.
  #[error("Failed to decompress the image data")]
  InflateFailed,

  /// A compression backend failed.
  #[error("Failed to compress the image data: {0}")]
  DeflateFailed(String),

  /// An option has a value it isn't allowed to have.
  #[error("{0}")]
  Value(String),

  /// An option has the wrong type of value.
  #[error("{0}")]
  Type(String),

  /// A numeric option doesn't fit the integer it's stored in.
  #[error("{0}")]
  Overflow(String),

  /// The allocator couldn't give us enough space.
  #[error("Allocation failed")]
  Alloc,

  /// Reading or writing a file failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

/// Broad category of a [`PngError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  /// The input is not a valid (or repairable) PNG.
  Format,
  /// An option value is semantically invalid.
  Value,
  /// An option value has the wrong type, or is out of its allowed range.
  Type,
  /// A numeric option value overflows its storage type.
  Overflow,
  /// File system failure.
  Io,
  /// A failure inside the engine itself.
  Internal,
}

impl PngError {
  /// Which category of failure this is.
  #[must_use]
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::NotPng
      | Self::TruncatedData
      | Self::InvalidHeader
      | Self::CrcMismatch(_)
      | Self::ChunkMissing(_)
      | Self::InvalidData(_)
      | Self::InflateFailed => ErrorKind::Format,
      Self::Value(_) => ErrorKind::Value,
      Self::Type(_) => ErrorKind::Type,
      Self::Overflow(_) => ErrorKind::Overflow,
      Self::Io(_) => ErrorKind::Io,
      Self::DeflateFailed(_) | Self::Alloc => ErrorKind::Internal,
    }
  }

  #[inline]
  pub(crate) fn invalid(reason: impl Into<String>) -> Self {
    Self::InvalidData(reason.into())
  }
}

impl From<TryReserveError> for PngError {
  #[inline]
  fn from(_: TryReserveError) -> Self {
    Self::Alloc
  }
}
impl From<TryFromIntError> for PngError {
  #[inline]
  fn from(e: TryFromIntError) -> Self {
    Self::Overflow(e.to_string())
  }
}
