//! The compression backends for the image data.
//!
//! Every backend writes a complete zlib stream. A [`Deflaters`] value can
//! describe several settings to try (the zlib backend takes lists), so it is
//! first expanded into single [`Effort`]s.

use core::num::{NonZeroU64, NonZeroU8};

use miniz_oxide::deflate::core::{
  compress_to_output, create_comp_flags_from_zip_params, CompressorOxide, TDEFLFlush, TDEFLStatus,
};

use crate::{Deflaters, PngError, PngResult};

/// One concrete backend setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effort {
  Libdeflater(u8),
  Zopfli(NonZeroU8),
  Zlib { level: u8, strategy: u8, window: u8 },
}

impl Deflaters {
  /// Every setting this backend description asks to try, in order.
  #[must_use]
  pub fn efforts(&self) -> Vec<Effort> {
    match self {
      Self::Libdeflater { compression } => vec![Effort::Libdeflater(*compression)],
      Self::Zopfli { iterations } => vec![Effort::Zopfli(*iterations)],
      Self::Zlib { compression, strategies, window } => compression
        .iter()
        .flat_map(|level| {
          strategies.iter().map(|strategy| Effort::Zlib { level: *level, strategy: *strategy, window: *window })
        })
        .collect(),
    }
  }
}

impl Effort {
  /// Compresses `data` into a zlib stream.
  pub fn deflate(self, data: &[u8]) -> PngResult<Vec<u8>> {
    match self {
      Self::Libdeflater(level) => libdeflate(data, level),
      Self::Zopfli(iterations) => zopfli_deflate(data, iterations),
      Self::Zlib { level, strategy, window } => miniz_deflate(data, level, strategy, window),
    }
  }
}

fn libdeflate(data: &[u8], level: u8) -> PngResult<Vec<u8>> {
  let level = libdeflater::CompressionLvl::new(i32::from(level))
    .map_err(|e| PngError::DeflateFailed(format!("{e:?}")))?;
  let mut compressor = libdeflater::Compressor::new(level);
  let mut out = Vec::new();
  out.try_reserve_exact(compressor.zlib_compress_bound(data.len()))?;
  out.resize(compressor.zlib_compress_bound(data.len()), 0);
  let len = compressor.zlib_compress(data, &mut out).map_err(|e| PngError::DeflateFailed(format!("{e:?}")))?;
  out.truncate(len);
  Ok(out)
}

fn zopfli_deflate(data: &[u8], iterations: NonZeroU8) -> PngResult<Vec<u8>> {
  let options = zopfli::Options { iteration_count: NonZeroU64::from(iterations), ..Default::default() };
  let mut out = Vec::with_capacity(data.len() / 2);
  zopfli::compress(options, zopfli::Format::Zlib, data, &mut out)
    .map_err(|e| PngError::DeflateFailed(e.to_string()))?;
  Ok(out)
}

/// The zlib style backend. The window size only affects the stream header.
fn miniz_deflate(data: &[u8], level: u8, strategy: u8, window: u8) -> PngResult<Vec<u8>> {
  let flags = create_comp_flags_from_zip_params(i32::from(level), i32::from(window), i32::from(strategy));
  let mut compressor = CompressorOxide::new(flags);
  let mut out = Vec::with_capacity(data.len() / 2);
  let (status, _) = compress_to_output(&mut compressor, data, TDEFLFlush::Finish, |bytes| {
    out.extend_from_slice(bytes);
    true
  });
  match status {
    TDEFLStatus::Done => Ok(out),
    other => Err(PngError::DeflateFailed(format!("{other:?}"))),
  }
}

/// A quick compressed size estimate, used to rank filters.
#[inline]
#[must_use]
pub(crate) fn fast_compressed_len(data: &[u8]) -> usize {
  miniz_oxide::deflate::compress_to_vec(data, 1).len()
}
