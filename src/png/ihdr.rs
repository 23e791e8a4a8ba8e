use super::*;

/// Image header, with the palette and transparency folded into the color type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IhdrData {
  /// width in pixels
  pub width: u32,
  /// height in pixels
  pub height: u32,
  /// pixel color type, along with its palette or transparency key
  pub color_type: ColorType,
  /// bits per sample
  pub bit_depth: BitDepth,
  /// how the image data is stored
  pub interlaced: Interlacing,
}

impl IhdrData {
  /// Bits used by one pixel.
  #[inline]
  #[must_use]
  pub fn bits_per_pixel(&self) -> usize {
    usize::from(self.color_type.channels_per_pixel()) * usize::from(self.bit_depth.bits())
  }

  /// Bytes in one packed row of `width` pixels, rounding up partial bytes.
  #[inline]
  #[must_use]
  pub fn row_bytes(&self, width: u32) -> usize {
    (self.bits_per_pixel() * width as usize + 7) / 8
  }

  /// Bytes in one packed row of the full image.
  #[inline]
  #[must_use]
  pub fn stride(&self) -> usize {
    self.row_bytes(self.width)
  }

  /// Bytes in the whole unfiltered, non-interlaced image.
  #[inline]
  #[must_use]
  pub fn raw_data_len(&self) -> usize {
    self.stride() * self.height as usize
  }

  /// The distance back to the "same" byte of the previous pixel when
  /// filtering. Filters work on bytes, so smaller pixels count as 1.
  #[inline]
  #[must_use]
  pub fn filter_unit(&self) -> usize {
    ((self.bits_per_pixel() + 7) / 8).max(1)
  }

  /// Length of the filtered (decompressed) stream for the interlacing
  /// recorded in this header. Each row carries one extra filter byte.
  #[must_use]
  pub fn filtered_len(&self) -> usize {
    match self.interlaced {
      Interlacing::None => (self.stride() + 1) * self.height as usize,
      Interlacing::Adam7 => pass_dimensions(self.width, self.height)
        .into_iter()
        .filter(|(w, h)| *w > 0 && *h > 0)
        .map(|(w, h)| (self.row_bytes(w) + 1) * h as usize)
        .sum(),
    }
  }

  /// Fails when the image is too big to address in memory, which also
  /// rules out overflow in the other size calculations.
  pub(crate) fn check_size(&self) -> PngResult<()> {
    let bits = u64::from(self.width)
      .checked_mul(u64::from(self.height))
      .and_then(|px| px.checked_mul(self.bits_per_pixel() as u64));
    match bits {
      Some(bits) if bits / 8 < isize::MAX as u64 / 4 => Ok(()),
      _ => Err(PngError::invalid(format!("{}x{} image is too large", self.width, self.height))),
    }
  }

  /// Serializes the 13 bytes of an `IHDR` chunk.
  #[must_use]
  pub fn to_bytes(&self) -> [u8; 13] {
    let mut out = [0_u8; 13];
    out[0..4].copy_from_slice(&self.width.to_be_bytes());
    out[4..8].copy_from_slice(&self.height.to_be_bytes());
    out[8] = self.bit_depth.bits();
    out[9] = self.color_type.png_header_code();
    // compression and filter method are both always 0
    out[12] = match self.interlaced {
      Interlacing::None => 0,
      Interlacing::Adam7 => 1,
    };
    out
  }
}

/// The fields of an `IHDR` chunk before the palette and transparency are
/// known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HeaderFields {
  pub width: u32,
  pub height: u32,
  pub bit_depth: BitDepth,
  pub color_code: u8,
  pub interlaced: Interlacing,
}
impl TryFrom<&[u8]> for HeaderFields {
  type Error = PngError;
  fn try_from(value: &[u8]) -> PngResult<Self> {
    match value {
      [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_code, compression_method, filter_method, interlace_method] =>
      {
        let width = u32::from_be_bytes([*w0, *w1, *w2, *w3]);
        let height = u32::from_be_bytes([*h0, *h1, *h2, *h3]);
        if width == 0 || height == 0 || width > MAX_CHUNK_LEN || height > MAX_CHUNK_LEN {
          return Err(PngError::InvalidHeader);
        }
        let depth_ok = match *color_code {
          0 => [1, 2, 4, 8, 16].contains(bit_depth),
          3 => [1, 2, 4, 8].contains(bit_depth),
          2 | 4 | 6 => [8, 16].contains(bit_depth),
          _ => false,
        };
        if !depth_ok || *compression_method != 0 || *filter_method != 0 {
          return Err(PngError::InvalidHeader);
        }
        Ok(Self {
          width,
          height,
          bit_depth: BitDepth::try_from(*bit_depth).map_err(|_| PngError::InvalidHeader)?,
          color_code: *color_code,
          interlaced: match interlace_method {
            0 => Interlacing::None,
            1 => Interlacing::Adam7,
            _ => return Err(PngError::InvalidHeader),
          },
        })
      }
      _ => Err(PngError::InvalidHeader),
    }
  }
}

#[test]
fn test_header_fields() {
  let ihdr = IhdrData {
    width: 3,
    height: 2,
    color_type: ColorType::RGB { transparent_color: None },
    bit_depth: BitDepth::Eight,
    interlaced: Interlacing::None,
  };
  let bytes = ihdr.to_bytes();
  let fields = HeaderFields::try_from(&bytes[..]).unwrap();
  assert_eq!((fields.width, fields.height, fields.color_code), (3, 2, 2));
  assert_eq!(ihdr.stride(), 9);
  assert_eq!(ihdr.filter_unit(), 3);
  assert_eq!(ihdr.filtered_len(), 20);

  let mut bad = bytes;
  bad[8] = 4; // rgb at 4 bits isn't allowed
  assert!(HeaderFields::try_from(&bad[..]).is_err());
  let mut bad = bytes;
  bad[12] = 2;
  assert!(HeaderFields::try_from(&bad[..]).is_err());
  let mut bad = bytes;
  bad[0..4].copy_from_slice(&[0; 4]);
  assert!(HeaderFields::try_from(&bad[..]).is_err());
  assert!(HeaderFields::try_from(&bytes[..12]).is_err());
}

#[test]
fn test_packed_geometry() {
  let ihdr = IhdrData {
    width: 9,
    height: 9,
    color_type: ColorType::Grayscale { transparent_shade: None },
    bit_depth: BitDepth::One,
    interlaced: Interlacing::Adam7,
  };
  assert_eq!(ihdr.stride(), 2);
  assert_eq!(ihdr.filter_unit(), 1);
  // pass sizes for 9x9 are 2x2, 1x2, 3x1, 2x3, 5x2, 4x5, 9x4
  assert_eq!(ihdr.filtered_len(), 2 * 2 + 2 * 2 + 2 + 3 * 2 + 2 * 2 + 5 * 2 + 4 * 3);
}
