//! From the PNG spec:
//!
//! > Filters are applied to **bytes**, not to pixels, regardless of the bit
//! > depth or color type of the image.

use super::*;

#[inline]
#[must_use]
pub(crate) const fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // The order of these tests is fixed by the PNG spec, don't alter it.
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

#[inline]
#[must_use]
pub(crate) const fn average(a: u8, b: u8) -> u8 {
  ((a as u16 + b as u16) / 2) as u8
}

/// Reverses the filter on one line in place.
///
/// `prev` is the already unfiltered line above, or all zeroes for the first
/// line of a pass.
pub(crate) fn unfilter_line(
  filter_type: u8, unit: usize, line: &mut [u8], prev: &[u8],
) -> PngResult<()> {
  debug_assert_eq!(line.len(), prev.len());
  match filter_type {
    0 => (),
    1 => {
      for i in unit..line.len() {
        line[i] = line[i].wrapping_add(line[i - unit]);
      }
    }
    2 => {
      for (x, b) in line.iter_mut().zip(prev.iter()) {
        *x = x.wrapping_add(*b);
      }
    }
    3 => {
      for i in 0..line.len() {
        let a = if i >= unit { line[i - unit] } else { 0 };
        line[i] = line[i].wrapping_add(average(a, prev[i]));
      }
    }
    4 => {
      for i in 0..line.len() {
        let (a, c) = if i >= unit { (line[i - unit], prev[i - unit]) } else { (0, 0) };
        line[i] = line[i].wrapping_add(paeth_predictor(a, prev[i], c));
      }
    }
    other => return Err(PngError::invalid(format!("illegal filter type {other}"))),
  }
  Ok(())
}

/// Unfilters each row of one pass, giving back the packed rows.
fn unfilter_pass(unit: usize, row_bytes: usize, height: u32, filtered: &[u8]) -> PngResult<Vec<u8>> {
  let mut out = vec![0_u8; row_bytes * height as usize];
  let mut prev = vec![0_u8; row_bytes];
  for (filter_line, out_line) in filtered.chunks_exact(row_bytes + 1).zip(out.chunks_exact_mut(row_bytes)) {
    let (filter_type, data) = filter_line.split_at(1);
    out_line.copy_from_slice(data);
    unfilter_line(filter_type[0], unit, out_line, &prev)?;
    prev.copy_from_slice(out_line);
  }
  Ok(out)
}

/// Turns the complete filtered stream into de-interlaced, packed rows.
///
/// The stream must be exactly [`IhdrData::filtered_len`] bytes.
pub(crate) fn unfilter_image(ihdr: &IhdrData, filtered: &[u8]) -> PngResult<Vec<u8>> {
  if filtered.len() != ihdr.filtered_len() {
    return Err(PngError::TruncatedData);
  }
  let unit = ihdr.filter_unit();
  match ihdr.interlaced {
    Interlacing::None => unfilter_pass(unit, ihdr.stride(), ihdr.height, filtered),
    Interlacing::Adam7 => {
      let mut full = vec![0_u8; ihdr.raw_data_len()];
      let mut rest = filtered;
      for (pass, (w, h)) in pass_dimensions(ihdr.width, ihdr.height).into_iter().enumerate() {
        if w == 0 || h == 0 {
          continue;
        }
        let row_bytes = ihdr.row_bytes(w);
        let (this_pass, more) = rest.split_at((row_bytes + 1) * h as usize);
        rest = more;
        let pass_data = unfilter_pass(unit, row_bytes, h, this_pass)?;
        scatter_pass(ihdr, pass, w, &pass_data, &mut full);
      }
      Ok(full)
    }
  }
}

#[test]
fn test_paeth_predictor() {
  assert_eq!(paeth_predictor(10, 20, 10), 20);
  assert_eq!(paeth_predictor(20, 10, 10), 20);
  assert_eq!(paeth_predictor(5, 5, 5), 5);
  assert_eq!(paeth_predictor(0, 0, 255), 0);
}

#[test]
fn test_average_does_not_overflow() {
  assert_eq!(average(255, 255), 255);
  assert_eq!(average(255, 1), 128);
}

#[test]
fn test_unfilter_line_each_type() {
  let prev = [10_u8, 20, 30, 40];
  let mut sub = [1_u8, 2, 3, 4];
  unfilter_line(1, 2, &mut sub, &prev).unwrap();
  assert_eq!(sub, [1, 2, 4, 6]);
  let mut up = [1_u8, 2, 3, 4];
  unfilter_line(2, 2, &mut up, &prev).unwrap();
  assert_eq!(up, [11, 22, 33, 44]);
  let mut avg = [1_u8, 2, 3, 4];
  unfilter_line(3, 2, &mut avg, &prev).unwrap();
  assert_eq!(avg, [6, 12, 3 + (6 + 30) / 2, 4 + (12 + 40) / 2]);
  assert!(unfilter_line(5, 2, &mut [0; 4], &prev).is_err());
}
