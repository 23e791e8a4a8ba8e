//! Adam7 pass geometry, and moving pixels between passes and full images.
//!
//! ```txt
//! 1 6 4 6 2 6 4 6
//! 7 7 7 7 7 7 7 7
//! 5 6 5 6 5 6 5 6
//! 7 7 7 7 7 7 7 7
//! 3 6 4 6 3 6 4 6
//! 7 7 7 7 7 7 7 7
//! 5 6 5 6 5 6 5 6
//! 7 7 7 7 7 7 7 7
//! ```

use super::*;

/// `(x_start, y_start, x_step, y_step)` of each pass.
const ADAM7: [(u32, u32, u32, u32); 7] = [
  (0, 0, 8, 8),
  (4, 0, 8, 8),
  (0, 4, 4, 8),
  (2, 0, 4, 4),
  (0, 2, 2, 4),
  (1, 0, 2, 2),
  (0, 1, 1, 2),
];

#[inline]
const fn pass_extent(full: u32, start: u32, step: u32) -> u32 {
  if full > start {
    (full - start + step - 1) / step
  } else {
    0
  }
}

/// Width and height of each of the seven reduced images. Either may be 0.
#[must_use]
pub const fn pass_dimensions(full_width: u32, full_height: u32) -> [(u32, u32); 7] {
  let mut out = [(0, 0); 7];
  let mut i = 0;
  while i < 7 {
    let (x0, y0, dx, dy) = ADAM7[i];
    out[i] = (pass_extent(full_width, x0, dx), pass_extent(full_height, y0, dy));
    i += 1;
  }
  out
}

/// Converts a position within a reduced image into the full image position.
#[inline]
#[must_use]
pub const fn interlaced_pos_to_full_pos(pass: usize, reduced_x: u32, reduced_y: u32) -> (u32, u32) {
  let (x0, y0, dx, dy) = ADAM7[pass];
  (x0 + reduced_x * dx, y0 + reduced_y * dy)
}

/// One block of rows that gets filtered as a unit.
///
/// A non-interlaced image is a single pass covering the whole image.
#[derive(Debug, Clone)]
pub(crate) struct Pass<'a> {
  pub width: u32,
  pub data: Cow<'a, [u8]>,
}

/// Copies the pixel at `src_index` of `src` into `dst_index` of `dst`.
#[inline]
fn copy_pixel(bits_per_pixel: usize, src: &[u8], src_index: usize, dst: &mut [u8], dst_index: usize) {
  if bits_per_pixel >= 8 {
    let n = bits_per_pixel / 8;
    dst[dst_index * n..dst_index * n + n].copy_from_slice(&src[src_index * n..src_index * n + n]);
  } else {
    let bits = bits_per_pixel as u8;
    set_sample(dst, bits, dst_index, get_sample(src, bits, src_index));
  }
}

/// Splits an image into the passes its interlacing calls for. Empty passes
/// are skipped.
pub(crate) fn image_passes(image: &PngImage) -> Vec<Pass<'_>> {
  let ihdr = &image.ihdr;
  match ihdr.interlaced {
    Interlacing::None => {
      vec![Pass { width: ihdr.width, data: Cow::Borrowed(&image.data) }]
    }
    Interlacing::Adam7 => {
      let bpp = ihdr.bits_per_pixel();
      let stride = ihdr.stride();
      let mut out = Vec::with_capacity(7);
      for (pass, (w, h)) in pass_dimensions(ihdr.width, ihdr.height).into_iter().enumerate() {
        if w == 0 || h == 0 {
          continue;
        }
        let pass_stride = ihdr.row_bytes(w);
        let mut data = vec![0_u8; pass_stride * h as usize];
        for y in 0..h {
          let dst_row = &mut data[y as usize * pass_stride..][..pass_stride];
          for x in 0..w {
            let (fx, fy) = interlaced_pos_to_full_pos(pass, x, y);
            let src_row = &image.data[fy as usize * stride..][..stride];
            copy_pixel(bpp, src_row, fx as usize, dst_row, x as usize);
          }
        }
        out.push(Pass { width: w, data: Cow::Owned(data) });
      }
      out
    }
  }
}

/// Writes the pixels of one reduced image back into their full image spots.
pub(crate) fn scatter_pass(
  ihdr: &IhdrData, pass: usize, pass_width: u32, pass_data: &[u8], full: &mut [u8],
) {
  let bpp = ihdr.bits_per_pixel();
  let stride = ihdr.stride();
  let pass_stride = ihdr.row_bytes(pass_width);
  for (y, src_row) in pass_data.chunks_exact(pass_stride).enumerate() {
    for x in 0..pass_width {
      let (fx, fy) = interlaced_pos_to_full_pos(pass, x, y as u32);
      let dst_row = &mut full[fy as usize * stride..][..stride];
      copy_pixel(bpp, src_row, x as usize, dst_row, fx as usize);
    }
  }
}

#[test]
fn test_pass_dimensions() {
  assert_eq!(pass_dimensions(0, 0), [(0, 0); 7]);
  // one
  for (w, ex) in (1..=8).zip([1, 1, 1, 1, 1, 1, 1, 1]) {
    assert_eq!(pass_dimensions(w, 0)[0].0, ex, "failed w:{w}");
  }
  // two
  for (w, ex) in (1..=8).zip([0, 0, 0, 0, 1, 1, 1, 1]) {
    assert_eq!(pass_dimensions(w, 0)[1].0, ex, "failed w:{w}");
  }
  // three
  for (h, ex) in (1..=8).zip([0, 0, 0, 0, 1, 1, 1, 1]) {
    assert_eq!(pass_dimensions(0, h)[2].1, ex, "failed h:{h}");
  }
  // four
  for (w, ex) in (1..=8).zip([0, 0, 1, 1, 1, 1, 2, 2]) {
    assert_eq!(pass_dimensions(w, 0)[3].0, ex, "failed w:{w}");
  }
  // five
  for (h, ex) in (1..=8).zip([0, 0, 1, 1, 1, 1, 2, 2]) {
    assert_eq!(pass_dimensions(0, h)[4].1, ex, "failed h:{h}");
  }
  // six
  for (w, ex) in (1..=8).zip([0, 1, 1, 2, 2, 3, 3, 4]) {
    assert_eq!(pass_dimensions(w, 0)[5].0, ex, "failed w:{w}");
  }
  // seven
  for (h, ex) in (1..=8).zip([0, 1, 1, 2, 2, 3, 3, 4]) {
    assert_eq!(pass_dimensions(0, h)[6].1, ex, "failed h:{h}");
  }
  // every pixel lands in exactly one pass
  for (w, h) in [(1, 1), (7, 3), (8, 8), (13, 17)] {
    let total: u32 = pass_dimensions(w, h).iter().map(|(pw, ph)| pw * ph).sum();
    assert_eq!(total, w * h);
  }
}
