use std::collections::HashMap;

use crate::palette_bit_depth;

use super::*;

/// RGB(A) becomes gray(+alpha) when every pixel has equal red, green and
/// blue.
pub(crate) fn reduced_rgb_to_grayscale(image: &PngImage) -> Option<PngImage> {
  let color_type = match &image.ihdr.color_type {
    ColorType::RGB { transparent_color: None } => ColorType::Grayscale { transparent_shade: None },
    ColorType::RGB { transparent_color: Some(c) } if c.r == c.g && c.g == c.b => {
      ColorType::Grayscale { transparent_shade: Some(c.r) }
    }
    ColorType::RGBA => ColorType::GrayscaleAlpha,
    _ => return None,
  };
  let mut is_gray = true;
  scan_pixels(image, |s| is_gray &= s[0] == s[1] && s[1] == s[2]);
  if !is_gray {
    return None;
  }
  let has_alpha = image.ihdr.color_type.has_alpha();
  let ihdr = with_format(&image.ihdr, color_type, image.ihdr.bit_depth);
  Some(map_pixels(image, ihdr, |s, out| {
    out[0] = s[0];
    if has_alpha {
      out[1] = s[3];
    }
  }))
}

/// The pixel as an RGBA8 palette entry. Only valid at 8 bits.
#[inline]
fn entry_of(color_type: &ColorType, s: &[u16]) -> RGBA8 {
  let b = |i: usize| s[i] as u8;
  match color_type {
    ColorType::Grayscale { transparent_shade } => {
      let a = if *transparent_shade == Some(s[0]) { 0 } else { u8::MAX };
      RGBA8::new(b(0), b(0), b(0), a)
    }
    ColorType::RGB { transparent_color } => {
      let a = if *transparent_color == Some(RGB16::new(s[0], s[1], s[2])) { 0 } else { u8::MAX };
      RGBA8::new(b(0), b(1), b(2), a)
    }
    ColorType::GrayscaleAlpha => RGBA8::new(b(0), b(0), b(0), b(1)),
    _ => RGBA8::new(b(0), b(1), b(2), b(3)),
  }
}

/// Converts an 8 bit image with at most 256 colors to indexed color.
///
/// Colors get palette slots in order of first appearance. Truecolor and
/// gray+alpha images convert when the palette costs less than the bytes it
/// saves. Plain grayscale only converts when a palette could be packed into
/// fewer bits than the gray samples themselves, which needs `allow_packing`.
pub(crate) fn reduced_to_indexed(image: &PngImage, allow_packing: bool) -> Option<PngImage> {
  let ihdr = &image.ihdr;
  if ihdr.bit_depth != BitDepth::Eight || matches!(ihdr.color_type, ColorType::Indexed { .. }) {
    return None;
  }
  let mut slots: HashMap<RGBA8, u16> = HashMap::new();
  let mut palette: Vec<RGBA8> = Vec::new();
  let mut too_many = false;
  scan_pixels(image, |s| {
    if too_many {
      return;
    }
    let entry = entry_of(&ihdr.color_type, s);
    if !slots.contains_key(&entry) {
      if palette.len() == 256 {
        too_many = true;
        return;
      }
      slots.insert(entry, palette.len() as u16);
      palette.push(entry);
    }
  });
  if too_many || palette.is_empty() {
    return None;
  }

  let pixel_count = ihdr.width as usize * ihdr.height as usize;
  let worthwhile = match ihdr.color_type {
    ColorType::Grayscale { .. } => {
      allow_packing && palette_bit_depth(palette.len()) < minimum_gray_depth(image)
    }
    _ => {
      let bytes_per_pixel = usize::from(ihdr.color_type.channels_per_pixel());
      palette.len() * 4 + pixel_count < pixel_count * bytes_per_pixel
    }
  };
  if !worthwhile {
    return None;
  }

  let new_ihdr = with_format(ihdr, ColorType::Indexed { palette }, BitDepth::Eight);
  Some(map_pixels(image, new_ihdr, |s, out| {
    out[0] = slots.get(&entry_of(&ihdr.color_type, s)).copied().unwrap_or_default();
  }))
}
