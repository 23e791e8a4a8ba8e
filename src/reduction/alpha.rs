use super::*;

/// Sets the color of every fully transparent pixel to black.
///
/// This is lossy in that the stored values change, but the image looks the
/// same. Gives `None` when there are no such pixels to change.
pub(crate) fn cleaned_alpha_channel(image: &PngImage) -> Option<PngImage> {
  if !image.ihdr.color_type.has_alpha() {
    return None;
  }
  let alpha_index = usize::from(image.ihdr.color_type.channels_per_pixel()) - 1;
  let out = map_pixels(image, image.ihdr.clone(), |s, out| {
    if s[alpha_index] == 0 {
      out.fill(0);
    } else {
      out.copy_from_slice(s);
    }
  });
  if out == *image {
    None
  } else {
    Some(out)
  }
}

/// Removes an alpha channel that isn't needed.
///
/// If every pixel is opaque the channel is dropped. If the only other alpha
/// is fully transparent, and all of those pixels share one color that no
/// opaque pixel uses, the channel becomes a transparency key instead.
pub(crate) fn reduced_alpha_channel(image: &PngImage) -> Option<PngImage> {
  let ihdr = &image.ihdr;
  if !ihdr.color_type.has_alpha() {
    return None;
  }
  let channels = usize::from(ihdr.color_type.channels_per_pixel());
  let max = ihdr.bit_depth.max_value();

  let mut key: Option<RGB16> = None;
  let mut key_is_usable = true;
  scan_pixels(image, |s| {
    let alpha = s[channels - 1];
    let color = color_of(s, channels);
    if alpha == max {
      return;
    }
    if alpha != 0 {
      key_is_usable = false;
      return;
    }
    match key {
      None => key = Some(color),
      Some(k) if k != color => key_is_usable = false,
      _ => (),
    }
  });
  if !key_is_usable {
    return None;
  }
  if let Some(k) = key {
    // the key must not also match an opaque pixel
    let mut clash = false;
    scan_pixels(image, |s| clash |= s[channels - 1] == max && color_of(s, channels) == k);
    if clash {
      return None;
    }
  }

  let color_type = if channels == 2 {
    ColorType::Grayscale { transparent_shade: key.map(|k| k.r) }
  } else {
    ColorType::RGB { transparent_color: key }
  };
  let new_ihdr = with_format(ihdr, color_type, ihdr.bit_depth);
  Some(map_pixels(image, new_ihdr, |s, out| out.copy_from_slice(&s[..channels - 1])))
}

/// The color part of a pixel with alpha, as a gray shade in `r` or as RGB.
#[inline]
fn color_of(s: &[u16], channels: usize) -> RGB16 {
  if channels == 2 {
    RGB16::new(s[0], s[0], s[0])
  } else {
    RGB16::new(s[0], s[1], s[2])
  }
}

/// Visits the samples of every pixel.
pub(crate) fn scan_pixels<F: FnMut(&[u16])>(image: &PngImage, mut op: F) {
  image.for_each_pixel(|_, _, s| op(s));
}
