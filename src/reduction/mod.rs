//! Lossless (and explicitly requested lossy) changes to how pixels are stored.
//!
//! Every reduction takes an image and gives back `Some` smaller form of the
//! same pixels, or `None` when it doesn't apply. They run in a fixed order,
//! since each one can make the next one possible.

use log::debug;

use crate::{
  set_sample, BitDepth, ColorType, IhdrData, Options, PngImage, RGB16, RGBA8,
};

mod alpha;
pub(crate) use alpha::*;

mod bit_depth;
pub(crate) use bit_depth::*;

mod color;
pub(crate) use color::*;

mod palette;
pub(crate) use palette::*;

/// Builds a new image with the given header by mapping every pixel.
///
/// `op` gets the source samples and fills in the output samples, which are
/// written at the new header's bit depth.
pub(crate) fn map_pixels<F>(src: &PngImage, ihdr: IhdrData, mut op: F) -> PngImage
where
  F: FnMut(&[u16], &mut [u16]),
{
  let channels = usize::from(ihdr.color_type.channels_per_pixel());
  let bits = ihdr.bit_depth.bits();
  let stride = ihdr.stride();
  let mut data = vec![0_u8; ihdr.raw_data_len()];
  let mut out = [0_u16; 4];
  src.for_each_pixel(|x, y, s| {
    op(s, &mut out[..channels]);
    let row = &mut data[y as usize * stride..][..stride];
    for (c, v) in out[..channels].iter().enumerate() {
      set_sample(row, bits, x as usize * channels + c, *v);
    }
  });
  PngImage { ihdr, data }
}

/// A copy of the header with a different color type and bit depth.
#[inline]
#[must_use]
pub(crate) fn with_format(ihdr: &IhdrData, color_type: ColorType, bit_depth: BitDepth) -> IhdrData {
  IhdrData { color_type, bit_depth, ..ihdr.clone() }
}

/// Runs every enabled reduction in order, keeping each image one produced.
///
/// The last entry is the most reduced form, and the list is empty when no
/// reduction applied. With `keep_gray` set, a gray image is never turned
/// into an indexed one.
pub(crate) fn reduction_stages(original: &PngImage, opts: &Options, keep_gray: bool) -> Vec<PngImage> {
  let mut stages: Vec<PngImage> = Vec::new();
  let current = |stages: &[PngImage]| stages.last().unwrap_or(original).clone();

  if opts.optimize_alpha {
    if let Some(r) = cleaned_alpha_channel(&current(&stages)) {
      debug!("Cleaned the color of fully transparent pixels");
      stages.push(r);
    }
  }

  if current(&stages).ihdr.bit_depth == BitDepth::Sixteen {
    if opts.bit_depth_reduction {
      if let Some(r) = reduced_16_to_8(&current(&stages)) {
        debug!("Reducing 16 bit samples to 8 bit");
        stages.push(r);
      }
    }
    let image = current(&stages);
    if opts.scale_16 && image.ihdr.bit_depth == BitDepth::Sixteen {
      debug!("Scaling 16 bit samples to 8 bit");
      stages.push(scaled_16_to_8(&image));
    }
  }

  if opts.color_type_reduction {
    if let Some(r) = reduced_alpha_channel(&current(&stages)) {
      debug!("Reducing alpha channel: color type {}", r.ihdr.color_type.png_header_code());
      stages.push(r);
    }
  }
  if opts.grayscale_reduction {
    if let Some(r) = reduced_rgb_to_grayscale(&current(&stages)) {
      debug!("Reducing RGB to grayscale");
      stages.push(r);
    }
  }
  if opts.color_type_reduction {
    let image = current(&stages);
    if keep_gray && image.ihdr.color_type.is_gray() {
      debug!("Keeping a gray color type for the gray ICC profile");
    } else if let Some(r) = reduced_to_indexed(&image, opts.bit_depth_reduction) {
      debug!("Reducing to indexed color with {} entries", palette_len(&r));
      stages.push(r);
    }
  }

  if opts.palette_reduction {
    if let Some(r) = reduced_palette(&current(&stages)) {
      debug!("Reducing palette to {} entries", palette_len(&r));
      stages.push(r);
    }
  }

  if opts.bit_depth_reduction {
    if let Some(r) = packed_bit_depth(&current(&stages)) {
      debug!("Reducing bit depth to {}", r.ihdr.bit_depth.bits());
      stages.push(r);
    }
  }

  stages.retain(|s| s != original);
  stages.dedup();
  stages
}

fn palette_len(image: &PngImage) -> usize {
  image.ihdr.color_type.palette().map_or(0, <[RGBA8]>::len)
}
