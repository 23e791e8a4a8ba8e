//! Everything that configures an optimization run.

use core::num::NonZeroU8;
use core::time::Duration;
use std::collections::BTreeSet;

use crate::{AsciiArray, ChunkName, PngError, PngResult};

/// How each row of the image gets filtered before compression.
///
/// The first five are the PNG filter types themselves. The rest are
/// heuristics that pick one of those five separately for every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum RowFilter {
  NoOp = 0,
  Sub = 1,
  Up = 2,
  Average = 3,
  Paeth = 4,
  /// Smallest sum of absolute (signed) byte values.
  MinSum = 5,
  /// Lowest Shannon entropy of the row's bytes.
  Entropy = 6,
  /// Fewest distinct byte pairs.
  Bigrams = 7,
  /// Lowest Shannon entropy of the row's byte pairs.
  BigEnt = 8,
  /// Whichever deflates smallest together with the previous few rows.
  Brute = 9,
}
impl RowFilter {
  /// The five filters that can actually be written to a row.
  pub const SINGLE_LINE: [RowFilter; 5] =
    [RowFilter::NoOp, RowFilter::Sub, RowFilter::Up, RowFilter::Average, RowFilter::Paeth];

  /// Every filter and heuristic, in declaration order.
  pub const ALL: [RowFilter; 10] = [
    RowFilter::NoOp,
    RowFilter::Sub,
    RowFilter::Up,
    RowFilter::Average,
    RowFilter::Paeth,
    RowFilter::MinSum,
    RowFilter::Entropy,
    RowFilter::Bigrams,
    RowFilter::BigEnt,
    RowFilter::Brute,
  ];

  /// `true` for the heuristics.
  #[inline]
  #[must_use]
  pub const fn is_heuristic(self) -> bool {
    self as u8 > 4
  }
}
impl TryFrom<u8> for RowFilter {
  type Error = PngError;
  fn try_from(value: u8) -> PngResult<Self> {
    Self::ALL
      .get(usize::from(value))
      .copied()
      .ok_or_else(|| PngError::Value(format!("Invalid row filter {value}; must be 0 through 9")))
  }
}

/// Interlacing mode of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Interlacing {
  /// Scanlines stored top to bottom.
  None,
  /// The 7 pass Adam7 scheme.
  Adam7,
}

/// The compression backend for the image data, with its settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Deflaters {
  /// libdeflate, with a compression level in `0..=12`.
  Libdeflater { compression: u8 },
  /// Zopfli, iterating the given number of times. Slow but very thorough.
  Zopfli { iterations: NonZeroU8 },
  /// A zlib compatible deflater, trying every combination of the listed
  /// levels (`1..=9`) and strategies (`0..=3`, in zlib's numbering).
  Zlib { compression: Vec<u8>, strategies: Vec<u8>, window: u8 },
}
impl Default for Deflaters {
  #[inline]
  fn default() -> Self {
    Self::Libdeflater { compression: 11 }
  }
}
impl Deflaters {
  /// libdeflate at the given level.
  pub fn libdeflater(compression: u8) -> PngResult<Self> {
    let out = Self::Libdeflater { compression };
    out.validate()?;
    Ok(out)
  }

  /// Zopfli with the given iteration count, which must be in `1..=255`.
  pub fn zopfli(iterations: u8) -> PngResult<Self> {
    match NonZeroU8::new(iterations) {
      Some(iterations) => Ok(Self::Zopfli { iterations }),
      None => Err(PngError::Type(format!(
        "Invalid zopfli iterations {iterations}; must be in range [1, 255]"
      ))),
    }
  }

  /// Zlib with the default search: level 9, all four strategies, 32K window.
  #[must_use]
  pub fn zlib() -> Self {
    Self::Zlib { compression: vec![9], strategies: vec![0, 1, 2, 3], window: 15 }
  }

  /// Zlib with explicit level and strategy lists. Duplicates are ignored.
  pub fn zlib_with(compression: &[u8], strategies: &[u8], window: u8) -> PngResult<Self> {
    let out = Self::Zlib {
      compression: dedup_in_order(compression.iter().copied()),
      strategies: dedup_in_order(strategies.iter().copied()),
      window,
    };
    out.validate()?;
    Ok(out)
  }

  pub(crate) fn validate(&self) -> PngResult<()> {
    match self {
      Self::Libdeflater { compression } if *compression > 12 => Err(PngError::Value(format!(
        "Invalid libdeflater compression {compression}; must be in range [0, 12]"
      ))),
      Self::Zlib { compression, strategies, window } => {
        if compression.is_empty() || compression.iter().any(|c| !(1..=9).contains(c)) {
          return Err(PngError::Value("zlib compression levels must be in range [1, 9]".into()));
        }
        if strategies.is_empty() || strategies.iter().any(|s| *s > 3) {
          return Err(PngError::Value("zlib strategies must be in range [0, 3]".into()));
        }
        if !(8..=15).contains(window) {
          return Err(PngError::Value(format!(
            "Invalid zlib window {window}; must be in range [8, 15]"
          )));
        }
        Ok(())
      }
      _ => Ok(()),
    }
  }
}

/// Which ancillary chunks to remove from the output.
///
/// Critical chunks are never affected. The APNG animation chunks are always
/// kept, since removing only part of an animation would corrupt it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StripChunks {
  /// Keep everything.
  #[default]
  None,
  /// Remove the listed chunks.
  Strip(BTreeSet<ChunkName>),
  /// Remove every chunk that doesn't affect how the image is displayed.
  Safe,
  /// Remove everything except the listed chunks.
  Keep(BTreeSet<ChunkName>),
  /// Remove everything possible.
  All,
}

/// Chunks that `StripChunks::Safe` keeps.
pub const DISPLAY_CHUNKS: [ChunkName; 9] = [
  AsciiArray(*b"cICP"),
  AsciiArray(*b"iCCP"),
  AsciiArray(*b"sRGB"),
  AsciiArray(*b"gAMA"),
  AsciiArray(*b"cHRM"),
  AsciiArray(*b"sBIT"),
  AsciiArray(*b"mDCV"),
  AsciiArray(*b"cLLI"),
  AsciiArray(*b"pHYs"),
];

/// Animation chunks, never stripped.
pub const APNG_CHUNKS: [ChunkName; 3] = [
  AsciiArray(*b"acTL"),
  AsciiArray(*b"fcTL"),
  AsciiArray(*b"fdAT"),
];

impl StripChunks {
  /// Strip the named chunks. Names are validated, duplicates are fine.
  pub fn strip<I, B>(names: I) -> PngResult<Self>
  where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
  {
    Ok(Self::Strip(collect_names(names)?))
  }

  /// Keep only the named chunks. Names are validated, duplicates are fine.
  pub fn keep<I, B>(names: I) -> PngResult<Self>
  where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
  {
    Ok(Self::Keep(collect_names(names)?))
  }

  /// If a chunk with this name stays in the output.
  #[must_use]
  pub fn retains(&self, name: ChunkName) -> bool {
    if name.is_critical() || APNG_CHUNKS.contains(&name) {
      return true;
    }
    match self {
      Self::None => true,
      Self::Strip(names) => !names.contains(&name),
      Self::Safe => DISPLAY_CHUNKS.contains(&name),
      Self::Keep(names) => names.contains(&name),
      Self::All => false,
    }
  }
}

fn collect_names<I, B>(names: I) -> PngResult<BTreeSet<ChunkName>>
where
  I: IntoIterator<Item = B>,
  B: AsRef<[u8]>,
{
  names.into_iter().map(|n| ChunkName::try_new(n.as_ref())).collect()
}

fn dedup_in_order<T: PartialEq + Copy>(items: impl Iterator<Item = T>) -> Vec<T> {
  let mut out: Vec<T> = Vec::new();
  for item in items {
    if !out.contains(&item) {
      out.push(item);
    }
  }
  out
}

/// Options for an optimization run.
///
/// Build one with [`Options::from_preset`] (or `default()`, which is preset
/// 2) and then adjust fields as needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
  /// Attempt to repair recoverable errors (bad CRCs, a truncated ending).
  pub fix_errors: bool,
  /// Write the output even when it isn't smaller than the input.
  pub force: bool,
  /// Filters to try, in order. Earlier entries win ties.
  pub filter: Vec<RowFilter>,
  /// Interlacing of the output. `None` keeps the input's interlacing.
  pub interlace: Option<Interlacing>,
  /// Change the color of fully transparent pixels to whatever compresses
  /// best. The image looks the same, but the pixel data does change.
  pub optimize_alpha: bool,
  /// Reduce the bit depth when no sample needs the extra bits.
  pub bit_depth_reduction: bool,
  /// Drop unused alpha channels and convert to a palette when possible.
  pub color_type_reduction: bool,
  /// Drop unused and duplicate palette entries.
  pub palette_reduction: bool,
  /// Convert color images without any color into grayscale.
  pub grayscale_reduction: bool,
  /// Recompress the image data even when no reduction applied.
  pub idat_recoding: bool,
  /// Lossy: scale 16 bit images down to 8 bits.
  pub scale_16: bool,
  /// Which ancillary chunks to remove.
  pub strip: StripChunks,
  /// Which compression backend to use.
  pub deflate: Deflaters,
  /// Rank filters with a fast compressor first, then use the real backend
  /// only on the winner.
  pub fast_evaluation: bool,
  /// Stop starting new trials after this much time.
  ///
  /// The clock starts once the reductions are done, when the filter and
  /// compression search begins. The first trial always runs to completion.
  pub timeout: Option<Duration>,
  /// Do all the work but write nothing.
  pub pretend: bool,
  /// Copy the input to `<path>.bak` before overwriting it in place.
  pub backup: bool,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      fix_errors: false,
      force: false,
      filter: vec![RowFilter::NoOp, RowFilter::Sub, RowFilter::Entropy, RowFilter::Bigrams],
      interlace: Some(Interlacing::None),
      optimize_alpha: false,
      bit_depth_reduction: true,
      color_type_reduction: true,
      palette_reduction: true,
      grayscale_reduction: true,
      idat_recoding: true,
      scale_16: false,
      strip: StripChunks::None,
      deflate: Deflaters::default(),
      fast_evaluation: true,
      timeout: None,
      pretend: false,
      backup: false,
    }
  }
}

impl Options {
  /// Preset optimization levels, from 0 (fastest) to 6 (smallest).
  pub fn from_preset(level: u8) -> PngResult<Self> {
    let opts = Self::default();
    Ok(match level {
      0 => opts.apply_preset_0(),
      1 => opts.apply_preset_1(),
      2 => opts,
      3 => opts.apply_preset_3(),
      4 => opts.apply_preset_4(),
      5 => opts.apply_preset_5(),
      6 => opts.apply_preset_6(),
      _ => {
        return Err(PngError::Value(
          "Invalid optimization level; must be between 0 and 6 inclusive".into(),
        ))
      }
    })
  }

  /// The slowest, most thorough preset.
  #[must_use]
  pub fn max_compression() -> Self {
    Self::default().apply_preset_6()
  }

  fn apply_preset_0(mut self) -> Self {
    self.filter = vec![RowFilter::NoOp];
    self.fast_evaluation = false;
    self.deflate = Deflaters::Libdeflater { compression: 5 };
    self
  }

  fn apply_preset_1(mut self) -> Self {
    self.filter = vec![RowFilter::NoOp];
    self.fast_evaluation = false;
    self.deflate = Deflaters::Libdeflater { compression: 10 };
    self
  }

  fn apply_preset_3(mut self) -> Self {
    self.fast_evaluation = false;
    self.filter = vec![RowFilter::NoOp, RowFilter::Bigrams, RowFilter::BigEnt, RowFilter::Brute];
    self
  }

  fn apply_preset_4(mut self) -> Self {
    self.deflate = Deflaters::Libdeflater { compression: 12 };
    self.apply_preset_3()
  }

  fn apply_preset_5(mut self) -> Self {
    self.fast_evaluation = false;
    self.filter = vec![
      RowFilter::NoOp,
      RowFilter::Up,
      RowFilter::MinSum,
      RowFilter::Bigrams,
      RowFilter::BigEnt,
      RowFilter::Brute,
    ];
    self.deflate = Deflaters::Libdeflater { compression: 12 };
    self
  }

  fn apply_preset_6(mut self) -> Self {
    self = self.apply_preset_5();
    self.filter = RowFilter::ALL.to_vec();
    self
  }

  /// Sets the filter list, dropping repeats but keeping the order.
  pub fn set_filters(&mut self, filters: impl IntoIterator<Item = RowFilter>) {
    self.filter = dedup_in_order(filters.into_iter());
  }

  /// If any option that alters pixel values is enabled.
  #[inline]
  #[must_use]
  pub fn is_lossy(&self) -> bool {
    self.scale_16 || self.optimize_alpha
  }

  /// Checks every option up front, before any work starts.
  pub fn validate(&self) -> PngResult<()> {
    if self.filter.is_empty() {
      return Err(PngError::Value("At least one row filter is required".into()));
    }
    self.deflate.validate()
  }
}
