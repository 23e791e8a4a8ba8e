use crate::{palette_bit_depth, reduce_sample, scale_16_to_8};

use super::*;

/// The same color type with any transparency key mapped through `f`.
fn map_key(color_type: &ColorType, mut f: impl FnMut(u16) -> u16) -> ColorType {
  match color_type {
    ColorType::Grayscale { transparent_shade } => {
      ColorType::Grayscale { transparent_shade: transparent_shade.map(&mut f) }
    }
    ColorType::RGB { transparent_color } => ColorType::RGB {
      transparent_color: transparent_color.map(|c| RGB16::new(f(c.r), f(c.g), f(c.b))),
    },
    other => other.clone(),
  }
}

/// The transparency key samples, if there is one.
fn key_samples(color_type: &ColorType) -> Vec<u16> {
  match color_type {
    ColorType::Grayscale { transparent_shade: Some(s) } => vec![*s],
    ColorType::RGB { transparent_color: Some(c) } => vec![c.r, c.g, c.b],
    _ => Vec::new(),
  }
}

/// 16 bit samples become 8 bit, when every sample has two equal bytes.
pub(crate) fn reduced_16_to_8(image: &PngImage) -> Option<PngImage> {
  if image.ihdr.bit_depth != BitDepth::Sixteen {
    return None;
  }
  let lossless = |v: u16| (v >> 8) == (v & 0xFF);
  if !image.data.chunks_exact(2).all(|b| b[0] == b[1]) {
    return None;
  }
  if !key_samples(&image.ihdr.color_type).into_iter().all(lossless) {
    return None;
  }
  let color_type = map_key(&image.ihdr.color_type, |v| v >> 8);
  let ihdr = with_format(&image.ihdr, color_type, BitDepth::Eight);
  let data = image.data.iter().step_by(2).copied().collect();
  Some(PngImage { ihdr, data })
}

/// Lossy: 16 bit samples become 8 bit, rounding to the nearest value.
pub(crate) fn scaled_16_to_8(image: &PngImage) -> PngImage {
  let color_type = map_key(&image.ihdr.color_type, |v| u16::from(scale_16_to_8(v)));
  let ihdr = with_format(&image.ihdr, color_type, BitDepth::Eight);
  let data = image.data.chunks_exact(2).map(|b| scale_16_to_8(u16::from_be_bytes([b[0], b[1]]))).collect();
  PngImage { ihdr, data }
}

/// The smallest depth every grayscale sample (and the key) survives at.
pub(crate) fn minimum_gray_depth(image: &PngImage) -> BitDepth {
  let from = image.ihdr.bit_depth;
  if from > BitDepth::Eight || !matches!(image.ihdr.color_type, ColorType::Grayscale { .. }) {
    return from;
  }
  let key = key_samples(&image.ihdr.color_type);
  for to in [BitDepth::One, BitDepth::Two, BitDepth::Four] {
    if to >= from {
      break;
    }
    let fits = |v: u16| reduce_sample(v, from.bits(), to.bits()).is_some();
    let mut all_fit = key.iter().copied().all(fits);
    if all_fit {
      scan_pixels(image, |s| all_fit &= fits(s[0]));
    }
    if all_fit {
      return to;
    }
  }
  from
}

/// Packs indexed and grayscale images into fewer bits per pixel.
pub(crate) fn packed_bit_depth(image: &PngImage) -> Option<PngImage> {
  let from = image.ihdr.bit_depth;
  let to = match &image.ihdr.color_type {
    ColorType::Indexed { palette } => palette_bit_depth(palette.len()),
    ColorType::Grayscale { .. } => minimum_gray_depth(image),
    _ => return None,
  };
  if to >= from {
    return None;
  }
  let (f, t) = (from.bits(), to.bits());
  let color_type = match &image.ihdr.color_type {
    ColorType::Indexed { .. } => image.ihdr.color_type.clone(),
    other => map_key(other, |v| v >> (f - t)),
  };
  let ihdr = with_format(&image.ihdr, color_type, to);
  let is_indexed = matches!(image.ihdr.color_type, ColorType::Indexed { .. });
  Some(map_pixels(image, ihdr, |s, out| {
    out[0] = if is_indexed { s[0] } else { s[0] >> (f - t) };
  }))
}
