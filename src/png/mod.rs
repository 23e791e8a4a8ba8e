//! Reading and writing PNG data.
//!
//! * [Portable Network Graphics Specification (Third Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/png-3/
//!
//! The general format of a PNG is that the information is stored in "chunks".
//! There's four "critical" chunk types:
//! * **Header** (`IHDR`) - The image's dimensions, pixel format, and if the
//!   image is interlaced or not.
//! * **Palette** (`PLTE`) - If an image uses indexed color it will have a
//!   palette of what index values map to what colors.
//! * **Image Data** (`IDAT`) - One or more chunks of compressed data. All of
//!   the compressed data forms a single zlib data stream.
//! * **End** (`IEND`) - The last chunk.
//!
//! Everything else is "ancillary", and can be dropped without changing the
//! pixels (though some of them change how the pixels should be displayed).
//!
//! The image data is the pixel rows, each "filtered" with one of five
//! reversible byte transforms (to make them more compression friendly), and
//! then the whole thing compressed together. Interlaced images store seven
//! reduced images one after the other instead of the rows of the full image.
//!
//! Within this crate a decoded image is always held as a [`PngImage`]:
//! unfiltered, de-interlaced, packed rows. Interlacing is only a property of
//! how the image will be written.

use core::fmt::Debug;
use std::borrow::Cow;

use crate::{
  get_sample, set_sample, try_pull_byte_array, try_pull_u32_be, u16_be, BitDepth, ChunkName,
  ColorType, Interlacing, PngError, PngResult, RowFilter, RGB16, RGBA8,
};

mod crc32;
pub(crate) use crc32::*;

mod raw_chunk;
pub use raw_chunk::*;

mod ihdr;
pub use ihdr::*;

mod interlace;
pub use interlace::*;

mod unfilter;
pub(crate) use unfilter::*;

mod filter;
pub use filter::*;

mod decode;

mod encode;
pub(crate) use encode::*;


/// The first eight bytes of every PNG.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Where an ancillary chunk sat relative to the critical chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChunkPosition {
  /// Before `PLTE` (or before `IDAT` when there's no palette).
  BeforePlte,
  /// After `PLTE`, before `IDAT`.
  BeforeIdat,
  /// After `IDAT`.
  AfterIdat,
}

/// An ancillary chunk carried through unchanged.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Chunk {
  pub name: ChunkName,
  pub data: Vec<u8>,
  pub position: ChunkPosition,
}
impl Debug for Chunk {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Chunk")
      .field("name", &self.name)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("position", &self.position)
      .finish()
  }
}

/// A decoded image: header plus unfiltered, de-interlaced, packed rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PngImage {
  pub ihdr: IhdrData,
  pub data: Vec<u8>,
}

impl PngImage {
  /// Iterates the packed rows.
  #[inline]
  pub fn rows(&self) -> core::slice::ChunksExact<'_, u8> {
    self.data.chunks_exact(self.ihdr.stride().max(1))
  }

  /// Reads every sample, pixel by pixel, calling `op(x, y, samples)` with
  /// the raw sample values at the image's bit depth.
  pub(crate) fn for_each_pixel<F: FnMut(u32, u32, &[u16])>(&self, mut op: F) {
    let channels = usize::from(self.ihdr.color_type.channels_per_pixel());
    let bits = self.ihdr.bit_depth.bits();
    let mut samples = [0_u16; 4];
    for (y, row) in self.rows().enumerate() {
      for x in 0..self.ihdr.width as usize {
        for (c, s) in samples[..channels].iter_mut().enumerate() {
          *s = get_sample(row, bits, x * channels + c);
        }
        op(x as u32, y as u32, &samples[..channels]);
      }
    }
  }

  /// The image as RGBA with 16 bits per channel.
  ///
  /// Lower bit depths are scaled up with bit replication, palettes are
  /// resolved, and transparency keys become alpha. Two images that give the
  /// same output here look the same.
  #[must_use]
  pub fn to_rgba16(&self) -> Vec<[u16; 4]> {
    let bits = self.ihdr.bit_depth.bits();
    let scale = |v: u16| crate::sample_to_u16(bits, v);
    let mut out = Vec::with_capacity(self.ihdr.width as usize * self.ihdr.height as usize);
    self.for_each_pixel(|_, _, s| {
      let px = match &self.ihdr.color_type {
        ColorType::Grayscale { transparent_shade } => {
          let a = if *transparent_shade == Some(s[0]) { 0 } else { u16::MAX };
          [scale(s[0]), scale(s[0]), scale(s[0]), a]
        }
        ColorType::RGB { transparent_color } => {
          let a = if *transparent_color == Some(RGB16::new(s[0], s[1], s[2])) { 0 } else { u16::MAX };
          [scale(s[0]), scale(s[1]), scale(s[2]), a]
        }
        ColorType::Indexed { palette } => {
          let c = palette.get(usize::from(s[0])).copied().unwrap_or_default();
          [c.r, c.g, c.b, c.a].map(|v| u16::from(v) * 257)
        }
        ColorType::GrayscaleAlpha => [scale(s[0]), scale(s[0]), scale(s[0]), scale(s[1])],
        ColorType::RGBA => [scale(s[0]), scale(s[1]), scale(s[2]), scale(s[3])],
      };
      out.push(px);
    });
    out
  }
}

/// A parsed PNG: the decoded image, its original compressed data, and the
/// ancillary chunks in file order.
#[derive(Debug, Clone)]
pub struct PngData {
  pub raw: PngImage,
  /// Concatenated payloads of all the `IDAT` chunks.
  pub idat_data: Vec<u8>,
  pub aux_chunks: Vec<Chunk>,
}

impl PngData {
  /// Animated PNGs carry an `acTL` chunk.
  #[inline]
  #[must_use]
  pub fn is_apng(&self) -> bool {
    has_apng_chunk(&self.aux_chunks)
  }
}

#[inline]
pub(crate) fn has_apng_chunk(chunks: &[Chunk]) -> bool {
  chunks.iter().any(|c| c.name.as_bytes() == b"acTL")
}
