use log::debug;

use crate::{
  driver::optimize_png,
  png::{Chunk, ChunkPosition},
  BitDepth, ChunkName, ColorType, IhdrData, Interlacing, Options, PngError, PngImage, PngResult,
};

/// Raw pixel data that can be turned into an optimized PNG.
///
/// The pixel data is rows of packed samples, top to bottom, exactly as a
/// non-interlaced PNG would hold them after unfiltering.
#[derive(Debug, Clone)]
pub struct RawImage {
  png: PngImage,
  aux_chunks: Vec<Chunk>,
}

impl RawImage {
  /// Checks the image description against the data.
  ///
  /// ## Failure
  /// * `Value` if a dimension is 0, the bit depth isn't allowed for the color
  ///   type, a transparency value doesn't fit the bit depth, the palette
  ///   doesn't fit the bit depth, or the data is the wrong length.
  pub fn new(
    width: u32, height: u32, color_type: ColorType, bit_depth: BitDepth, data: Vec<u8>,
  ) -> PngResult<Self> {
    if width == 0 || height == 0 {
      return Err(PngError::Value(format!("Invalid image dimensions {width}x{height}")));
    }
    color_type.validate_with_depth(bit_depth)?;
    if let ColorType::Indexed { palette } = &color_type {
      if palette.is_empty() || palette.len() > 1 << bit_depth.bits() {
        return Err(PngError::Value(format!(
          "palette of {} entries does not fit in {} bits",
          palette.len(),
          bit_depth.bits()
        )));
      }
    }
    let ihdr = IhdrData { width, height, color_type, bit_depth, interlaced: Interlacing::None };
    ihdr.check_size().map_err(|e| PngError::Value(e.to_string()))?;
    let expected = ihdr.raw_data_len();
    if data.len() != expected {
      return Err(PngError::Value(format!(
        "Data length {} does not match the expected length {expected}",
        data.len()
      )));
    }
    let png = PngImage { ihdr, data };
    if let ColorType::Indexed { palette } = &png.ihdr.color_type {
      let mut out_of_range = false;
      png.for_each_pixel(|_, _, s| out_of_range |= usize::from(s[0]) >= palette.len());
      if out_of_range {
        return Err(PngError::Value("Pixel data has an index past the end of the palette".into()));
      }
    }
    Ok(Self { png, aux_chunks: Vec::new() })
  }

  /// Adds an ancillary chunk to be written with the image.
  ///
  /// The name must be 4 ascii letters, and not a critical chunk name.
  pub fn add_png_chunk(&mut self, name: &[u8], data: Vec<u8>) -> PngResult<()> {
    let name = ChunkName::try_new(name)?;
    if name.is_critical() {
      return Err(PngError::Value(format!("Cannot add critical chunk {name}")));
    }
    self.aux_chunks.push(Chunk { name, data, position: ChunkPosition::BeforeIdat });
    Ok(())
  }

  /// Adds an ICC color profile, stored as a compressed `iCCP` chunk.
  ///
  /// Any profile added earlier is replaced.
  pub fn add_icc_profile(&mut self, profile: &[u8]) {
    let mut data = b"icc\0\0".to_vec();
    data.extend(miniz_oxide::deflate::compress_to_vec_zlib(profile, 10));
    self.aux_chunks.retain(|c| c.name.as_bytes() != b"iCCP");
    debug!("Adding {} byte ICC profile", profile.len());
    self.aux_chunks.push(Chunk { name: ChunkName::from(*b"iCCP"), data, position: ChunkPosition::BeforePlte });
  }

  /// Encodes the image, running the full optimization.
  pub fn create_optimized_png(&self, opts: &Options) -> PngResult<Vec<u8>> {
    opts.validate()?;
    optimize_png(&self.png, &self.aux_chunks, None, opts)
  }

  /// The image this holds.
  #[inline]
  #[must_use]
  pub fn image(&self) -> &PngImage {
    &self.png
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ErrorKind, RGB16, RGBA8};

  #[test]
  fn test_new_validates() {
    let rgb = || ColorType::RGB { transparent_color: None };
    assert!(RawImage::new(2, 2, rgb(), BitDepth::Eight, vec![0; 12]).is_ok());
    assert!(RawImage::new(2, 2, rgb(), BitDepth::Eight, vec![0; 11]).is_err());
    assert!(RawImage::new(0, 2, rgb(), BitDepth::Eight, vec![]).is_err());
    assert!(RawImage::new(2, 2, rgb(), BitDepth::Four, vec![0; 6]).is_err());
    let keyed = ColorType::RGB { transparent_color: Some(RGB16::new(0, 300, 0)) };
    assert_eq!(RawImage::new(1, 1, keyed, BitDepth::Eight, vec![0; 3]).unwrap_err().kind(), ErrorKind::Value);
    // 1 bit rows round up to whole bytes
    let gray = ColorType::Grayscale { transparent_shade: None };
    assert!(RawImage::new(9, 2, gray, BitDepth::One, vec![0; 4]).is_ok());
  }

  #[test]
  fn test_palette_checks() {
    let three = ColorType::Indexed { palette: vec![RGBA8::default(); 3] };
    assert!(RawImage::new(1, 1, three.clone(), BitDepth::One, vec![0]).is_err());
    assert!(RawImage::new(1, 1, three.clone(), BitDepth::Two, vec![0b1100_0000]).is_err());
    assert!(RawImage::new(1, 1, three, BitDepth::Two, vec![0b1000_0000]).is_ok());
  }

  #[test]
  fn test_chunk_names() {
    let mut raw = RawImage::new(1, 1, ColorType::RGBA, BitDepth::Eight, vec![0; 4]).unwrap();
    assert!(raw.add_png_chunk(b"sRBG", vec![0]).is_ok());
    assert_eq!(raw.add_png_chunk(b"RGB", vec![]).unwrap_err().kind(), ErrorKind::Value);
    assert_eq!(raw.add_png_chunk(b"tEXt1", vec![]).unwrap_err().kind(), ErrorKind::Value);
    assert!(raw.add_png_chunk(b"IDAT", vec![]).is_err());
  }
}
