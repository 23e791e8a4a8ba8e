//! Applying row filters, including the heuristics that pick a filter for
//! each row.

use super::*;

/// Rows of context the brute force heuristic compresses along with each
/// candidate row.
const BRUTE_WINDOW_LINES: usize = 4;

/// Filters one line with one of the five PNG filter types.
///
/// `out` must be the same length as `line`.
pub(crate) fn filter_line(filter_type: u8, unit: usize, line: &[u8], prev: &[u8], out: &mut [u8]) {
  debug_assert_eq!(line.len(), out.len());
  match filter_type {
    0 => out.copy_from_slice(line),
    1 => {
      for i in 0..line.len() {
        let a = if i >= unit { line[i - unit] } else { 0 };
        out[i] = line[i].wrapping_sub(a);
      }
    }
    2 => {
      for i in 0..line.len() {
        out[i] = line[i].wrapping_sub(prev[i]);
      }
    }
    3 => {
      for i in 0..line.len() {
        let a = if i >= unit { line[i - unit] } else { 0 };
        out[i] = line[i].wrapping_sub(average(a, prev[i]));
      }
    }
    _ => {
      for i in 0..line.len() {
        let (a, c) = if i >= unit { (line[i - unit], prev[i - unit]) } else { (0, 0) };
        out[i] = line[i].wrapping_sub(paeth_predictor(a, prev[i], c));
      }
    }
  }
}

/// Sum of each byte's distance from zero, treating bytes as signed.
fn min_sum_score(line: &[u8]) -> u64 {
  line.iter().map(|b| u64::from((*b as i8).unsigned_abs())).sum()
}

/// Shannon entropy of the given symbol counts, scaled by the total.
fn entropy_of(counts: impl Iterator<Item = u32>) -> f64 {
  let mut total = 0.0;
  let mut sum = 0.0;
  for c in counts.filter(|c| *c > 0) {
    let c = f64::from(c);
    total += c;
    sum += c * c.log2();
  }
  if total == 0.0 {
    0.0
  } else {
    total * total.log2() - sum
  }
}

fn entropy_score(filter_type: u8, line: &[u8]) -> f64 {
  let mut counts = [0_u32; 256];
  counts[usize::from(filter_type)] += 1;
  for b in line {
    counts[usize::from(*b)] += 1;
  }
  entropy_of(counts.into_iter())
}

/// Every adjacent byte pair in the line, starting with the filter byte.
fn bigrams(filter_type: u8, line: &[u8]) -> impl Iterator<Item = u16> + '_ {
  let mut prev = filter_type;
  line.iter().map(move |b| {
    let pair = u16::from_be_bytes([prev, *b]);
    prev = *b;
    pair
  })
}

/// Number of distinct byte pairs.
fn bigrams_score(filter_type: u8, line: &[u8], seen: &mut [u64; 1024]) -> u32 {
  seen.fill(0);
  let mut distinct = 0;
  for pair in bigrams(filter_type, line) {
    let (word, bit) = (usize::from(pair / 64), pair % 64);
    if seen[word] & (1 << bit) == 0 {
      seen[word] |= 1 << bit;
      distinct += 1;
    }
  }
  distinct
}

fn bigram_entropy_score(filter_type: u8, line: &[u8]) -> f64 {
  let mut pairs: Vec<u16> = bigrams(filter_type, line).collect();
  pairs.sort_unstable();
  let counts = pairs.chunk_by(|a, b| a == b).map(|run| run.len() as u32);
  entropy_of(counts)
}

fn brute_score(window: &[u8], filter_type: u8, line: &[u8], buf: &mut Vec<u8>) -> usize {
  buf.clear();
  buf.extend_from_slice(window);
  buf.push(filter_type);
  buf.extend_from_slice(line);
  miniz_oxide::deflate::compress_to_vec(buf, 1).len()
}

/// Index of the smallest score. Ties go to the earlier filter type.
fn pick_min<T: PartialOrd + Copy>(scores: [T; 5]) -> usize {
  let mut best = 0;
  for i in 1..5 {
    if scores[i] < scores[best] {
      best = i;
    }
  }
  best
}

/// Working space for filtering one pass.
struct LineFilterer {
  unit: usize,
  candidates: [Vec<u8>; 5],
  bigram_bits: Box<[u64; 1024]>,
  brute_window: Vec<u8>,
  brute_buf: Vec<u8>,
}
impl LineFilterer {
  fn new(unit: usize, row_bytes: usize) -> Self {
    Self {
      unit,
      candidates: core::array::from_fn(|_| vec![0; row_bytes]),
      bigram_bits: Box::new([0; 1024]),
      brute_window: Vec::new(),
      brute_buf: Vec::new(),
    }
  }

  /// Filters one line, appending the filter byte and filtered data to `out`.
  fn filter_into(&mut self, filter: RowFilter, line: &[u8], prev: &[u8], out: &mut Vec<u8>) {
    let chosen = if filter.is_heuristic() {
      for (t, candidate) in self.candidates.iter_mut().enumerate() {
        filter_line(t as u8, self.unit, line, prev, candidate);
      }
      let c = &self.candidates;
      match filter {
        RowFilter::MinSum => pick_min(core::array::from_fn(|t| min_sum_score(&c[t]))),
        RowFilter::Entropy => pick_min(core::array::from_fn(|t| entropy_score(t as u8, &c[t]))),
        RowFilter::Bigrams => {
          let bits = &mut self.bigram_bits;
          pick_min(core::array::from_fn(|t| bigrams_score(t as u8, &c[t], bits)))
        }
        RowFilter::BigEnt => {
          pick_min(core::array::from_fn(|t| bigram_entropy_score(t as u8, &c[t])))
        }
        _ => {
          let (window, buf) = (&self.brute_window, &mut self.brute_buf);
          pick_min(core::array::from_fn(|t| brute_score(window, t as u8, &c[t], buf)))
        }
      }
    } else {
      let t = filter as usize;
      filter_line(t as u8, self.unit, line, prev, &mut self.candidates[t]);
      t
    };
    out.push(chosen as u8);
    out.extend_from_slice(&self.candidates[chosen]);
    if filter == RowFilter::Brute {
      let line_len = line.len() + 1;
      if self.brute_window.len() >= line_len * BRUTE_WINDOW_LINES {
        self.brute_window.drain(..line_len);
      }
      self.brute_window.push(chosen as u8);
      self.brute_window.extend_from_slice(&self.candidates[chosen]);
    }
  }
}

/// Produces the complete filtered stream for the image, ready to compress.
///
/// Interlaced images are filtered pass by pass, and each pass starts over
/// with an all zero previous line.
#[must_use]
pub fn filter_image(image: &PngImage, filter: RowFilter) -> Vec<u8> {
  let ihdr = &image.ihdr;
  let unit = ihdr.filter_unit();
  let mut out = Vec::with_capacity(ihdr.filtered_len());
  for pass in image_passes(image) {
    let row_bytes = ihdr.row_bytes(pass.width);
    let mut filterer = LineFilterer::new(unit, row_bytes);
    let zeroes = vec![0_u8; row_bytes];
    let mut prev: &[u8] = &zeroes;
    for line in pass.data.chunks_exact(row_bytes) {
      filterer.filter_into(filter, line, prev, &mut out);
      prev = line;
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn gradient_image(interlaced: Interlacing) -> PngImage {
    let (width, height) = (11_u32, 7_u32);
    let mut data = Vec::new();
    for y in 0..height {
      for x in 0..width {
        data.extend_from_slice(&[(x * 20) as u8, (y * 30) as u8, (x * y) as u8]);
      }
    }
    PngImage {
      ihdr: IhdrData {
        width,
        height,
        color_type: ColorType::RGB { transparent_color: None },
        bit_depth: BitDepth::Eight,
        interlaced,
      },
      data,
    }
  }

  #[test]
  fn test_every_filter_reverses() {
    for interlaced in [Interlacing::None, Interlacing::Adam7] {
      let image = gradient_image(interlaced);
      for filter in RowFilter::ALL {
        let filtered = filter_image(&image, filter);
        assert_eq!(filtered.len(), image.ihdr.filtered_len(), "{filter:?}");
        let back = unfilter_image(&image.ihdr, &filtered).unwrap();
        assert_eq!(back, image.data, "{filter:?} {interlaced:?}");
      }
    }
  }

  #[test]
  fn test_single_filters_mark_every_row() {
    let image = gradient_image(Interlacing::None);
    let row = image.ihdr.stride() + 1;
    for (t, filter) in RowFilter::SINGLE_LINE.into_iter().enumerate() {
      let filtered = filter_image(&image, filter);
      assert!(filtered.chunks_exact(row).all(|r| r[0] == t as u8));
    }
  }

  #[test]
  fn test_pick_min_prefers_earlier() {
    assert_eq!(pick_min([3, 1, 1, 2, 1]), 1);
    assert_eq!(pick_min([0.5, 0.5, 0.5, 0.5, 0.5]), 0);
  }

  #[test]
  fn test_scores() {
    assert_eq!(min_sum_score(&[1, 255, 128]), 1 + 1 + 128);
    let mut bits = Box::new([0_u64; 1024]);
    assert_eq!(bigrams_score(0, &[0, 0, 0, 0], &mut bits), 1);
    assert_eq!(bigrams_score(1, &[2, 3, 2, 3], &mut bits), 3);
    assert!(entropy_score(0, &[0; 16]) < entropy_score(0, &[0, 1, 2, 3, 4, 5, 6, 7]));
  }
}
