//! Color types and the plain color structs they carry.

use bytemuck::{Pod, Zeroable};

use crate::{BitDepth, PngError, PngResult};

/// An RGB color with 16 bits per channel.
///
/// Used for the transparent color key of truecolor images, where the values
/// are stored at the image's bit depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct RGB16 {
  pub r: u16,
  pub g: u16,
  pub b: u16,
}
impl RGB16 {
  #[inline]
  #[must_use]
  pub const fn new(r: u16, g: u16, b: u16) -> Self {
    Self { r, g, b }
  }
}

/// An RGBA color with 8 bits per channel. Palette entries use this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct RGBA8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}
impl RGBA8 {
  #[inline]
  #[must_use]
  pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
    Self { r, g, b, a }
  }
}

/// The types of color that PNG supports, along with the data that goes with
/// each of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColorType {
  /// Greyscale, with an optional shade that is fully transparent.
  Grayscale { transparent_shade: Option<u16> },
  /// Red, Green, Blue, with an optional color that is fully transparent.
  RGB { transparent_color: Option<RGB16> },
  /// Index into a palette. Palette alpha is written as a `tRNS` chunk.
  Indexed { palette: Vec<RGBA8> },
  /// Greyscale + Alpha
  GrayscaleAlpha,
  /// Red, Green, Blue, Alpha
  RGBA,
}

impl ColorType {
  /// Indexed color, checking the palette size.
  pub fn indexed(palette: Vec<RGBA8>) -> PngResult<Self> {
    if palette.is_empty() || palette.len() > 256 {
      return Err(PngError::Value(
        "palette len must be greater than 0 and less than or equal to 256".into(),
      ));
    }
    Ok(Self::Indexed { palette })
  }

  /// The color type code written into the `IHDR`.
  #[inline]
  #[must_use]
  pub const fn png_header_code(&self) -> u8 {
    match self {
      Self::Grayscale { .. } => 0,
      Self::RGB { .. } => 2,
      Self::Indexed { .. } => 3,
      Self::GrayscaleAlpha => 4,
      Self::RGBA => 6,
    }
  }

  /// The number of channels in this type of color.
  #[inline]
  #[must_use]
  pub const fn channels_per_pixel(&self) -> u8 {
    match self {
      Self::Grayscale { .. } | Self::Indexed { .. } => 1,
      Self::GrayscaleAlpha => 2,
      Self::RGB { .. } => 3,
      Self::RGBA => 4,
    }
  }

  #[inline]
  #[must_use]
  pub const fn is_gray(&self) -> bool {
    matches!(self, Self::Grayscale { .. } | Self::GrayscaleAlpha)
  }

  #[inline]
  #[must_use]
  pub const fn has_alpha(&self) -> bool {
    matches!(self, Self::GrayscaleAlpha | Self::RGBA)
  }

  /// Checks that the bit depth is allowed for this color type.
  #[must_use]
  pub fn allows_depth(&self, depth: BitDepth) -> bool {
    use BitDepth::*;
    match self {
      Self::Grayscale { .. } => true,
      Self::Indexed { .. } => depth != Sixteen,
      _ => matches!(depth, Eight | Sixteen),
    }
  }

  /// Checks that any transparency key fits within the bit depth.
  pub(crate) fn validate_with_depth(&self, depth: BitDepth) -> PngResult<()> {
    if !self.allows_depth(depth) {
      return Err(PngError::Value(format!(
        "bit depth {} is not allowed for color type {}",
        depth.bits(),
        self.png_header_code()
      )));
    }
    let max = depth.max_value();
    let key_fits = match self {
      Self::Grayscale { transparent_shade: Some(shade) } => *shade <= max,
      Self::RGB { transparent_color: Some(c) } => c.r <= max && c.g <= max && c.b <= max,
      _ => true,
    };
    if key_fits {
      Ok(())
    } else {
      Err(PngError::Value(format!("transparency value does not fit in {} bits", depth.bits())))
    }
  }

  /// The palette, for indexed color.
  #[inline]
  #[must_use]
  pub fn palette(&self) -> Option<&[RGBA8]> {
    match self {
      Self::Indexed { palette } => Some(palette),
      _ => None,
    }
  }
}

#[test]
fn test_color_type_checks() {
  assert_eq!(ColorType::RGBA.channels_per_pixel(), 4);
  assert_eq!(ColorType::Grayscale { transparent_shade: None }.png_header_code(), 0);
  assert!(ColorType::indexed(vec![]).is_err());
  assert!(ColorType::indexed(vec![RGBA8::default(); 257]).is_err());
  assert!(ColorType::indexed(vec![RGBA8::default(); 256]).is_ok());
  let rgb = ColorType::RGB { transparent_color: Some(RGB16::new(4, 5, 6)) };
  assert!(rgb.validate_with_depth(BitDepth::Eight).is_ok());
  assert!(rgb.validate_with_depth(BitDepth::Four).is_err());
  let gray = ColorType::Grayscale { transparent_shade: Some(3) };
  assert!(gray.validate_with_depth(BitDepth::Two).is_ok());
  assert!(gray.validate_with_depth(BitDepth::One).is_err());
}
