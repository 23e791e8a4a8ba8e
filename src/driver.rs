//! The entry points: parse, reduce, search, and write.

use std::borrow::Cow;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};

use crate::{
  evaluate::find_best,
  headers::{icc_profile_is_gray, postprocess_chunks},
  png::{has_apng_chunk, write_png, Chunk},
  reduction::reduction_stages,
  ChunkName, Deadline, Options, PngData, PngError, PngImage, PngResult,
};

/// Where the PNG to optimize comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InFile {
  Path(PathBuf),
  Memory(Vec<u8>),
}

/// Where the optimized PNG goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutFile {
  /// A file. `None` overwrites the input file.
  Path(Option<PathBuf>),
  /// Hand the bytes back to the caller.
  Memory,
}

/// Optimizes a PNG held in memory.
///
/// Without `force` (or a lossy option), the result is never bigger than the
/// input: when nothing smaller is found you get the input bytes back.
pub fn optimize_from_memory(data: &[u8], opts: &Options) -> PngResult<Vec<u8>> {
  opts.validate()?;
  Ok(optimize_bytes(data, opts)?.into_owned())
}

/// Optimizes a PNG from a file or memory, writing it as asked.
///
/// Gives back the output bytes when the output is [`OutFile::Memory`],
/// otherwise `None`. With `pretend` set, nothing is written anywhere.
pub fn optimize(input: &InFile, output: &OutFile, opts: &Options) -> PngResult<Option<Vec<u8>>> {
  opts.validate()?;
  let in_path = match (input, output) {
    (InFile::Memory(_), OutFile::Path(None)) => {
      return Err(PngError::Value("An input in memory has no file to overwrite".into()))
    }
    (InFile::Path(p), _) => Some(p.as_path()),
    (InFile::Memory(_), _) => None,
  };
  let original: Cow<'_, [u8]> = match input {
    InFile::Path(p) => Cow::Owned(fs::read(p)?),
    InFile::Memory(bytes) => Cow::Borrowed(bytes),
  };
  let optimized = optimize_bytes(&original, opts)?;
  let unchanged = optimized.as_ref() == original.as_ref();

  match output {
    OutFile::Memory => Ok(Some(optimized.into_owned())),
    _ if opts.pretend => {
      info!("Running in pretend mode, no output");
      Ok(None)
    }
    OutFile::Path(dest) => {
      let dest = match dest.as_deref().or(in_path) {
        Some(d) => d,
        None => return Err(PngError::Value("No output file given".into())),
      };
      let in_place = in_path == Some(dest);
      if in_place && unchanged {
        info!("{}: file already optimized", dest.display());
        return Ok(None);
      }
      if in_place && opts.backup {
        let backup = backup_path(dest);
        fs::copy(dest, &backup)?;
        debug!("Backed up the input to {}", backup.display());
      }
      write_atomically(dest, &optimized)?;
      info!("Output: {}", dest.display());
      Ok(None)
    }
  }
}

/// `<path>.bak`
fn backup_path(path: &Path) -> PathBuf {
  let mut name = path.as_os_str().to_owned();
  name.push(".bak");
  PathBuf::from(name)
}

/// Writes to a temporary file beside `dest`, then renames it over `dest`.
fn write_atomically(dest: &Path, data: &[u8]) -> PngResult<()> {
  let dir = match dest.parent() {
    Some(p) if !p.as_os_str().is_empty() => p,
    _ => Path::new("."),
  };
  let mut file = tempfile::NamedTempFile::new_in(dir)?;
  file.write_all(data)?;
  file.as_file().sync_all()?;
  if let Ok(meta) = fs::metadata(dest) {
    fs::set_permissions(file.path(), meta.permissions())?;
  }
  file.persist(dest).map_err(|e| e.error)?;
  Ok(())
}

/// The whole optimization of an encoded PNG, with the no regression check.
fn optimize_bytes<'a>(original: &'a [u8], opts: &Options) -> PngResult<Cow<'a, [u8]>> {
  let start = Instant::now();
  let png = PngData::from_slice(original, opts.fix_errors)?;
  let output = optimize_png(&png.raw, &png.aux_chunks, Some(&png.idat_data), opts)?;

  info!("    {} bytes in, {} bytes out ({:?})", original.len(), output.len(), start.elapsed());
  if output.len() >= original.len() && !opts.force && !opts.is_lossy() {
    info!("File already optimized");
    return Ok(Cow::Borrowed(original));
  }
  Ok(Cow::Owned(output))
}

/// Reduces, searches and encodes a decoded image.
///
/// `original_idat` is the image data as it was compressed in the input, if
/// there was an input file.
///
/// The image as given and each form the reductions produce are all encoded,
/// most reduced first, and the smallest file wins. On a tie the earlier
/// candidate stays.
pub(crate) fn optimize_png(
  image: &PngImage, aux_chunks: &[Chunk], original_idat: Option<&[u8]>, opts: &Options,
) -> PngResult<Vec<u8>> {
  let mut opts = Cow::Borrowed(opts);

  let iccp = ChunkName::from(*b"iCCP");
  let profile_is_gray = aux_chunks
    .iter()
    .find(|c| c.name == iccp && opts.strip.retains(iccp))
    .map(|c| icc_profile_is_gray(&c.data) == Some(true));
  if profile_is_gray == Some(false) && opts.grayscale_reduction {
    debug!("Keeping the color type, the ICC profile is not grayscale");
    opts.to_mut().grayscale_reduction = false;
  }

  let candidates = if has_apng_chunk(aux_chunks) {
    warn!("APNG detected, skipping reductions and interlace changes");
    vec![image.clone()]
  } else {
    let mut stages = reduction_stages(image, &opts, profile_is_gray == Some(true));
    stages.reverse();
    stages.push(image.clone());
    if let Some(interlace) = opts.interlace {
      if interlace != image.ihdr.interlaced {
        debug!("Changing interlacing to {interlace:?}");
      }
      for stage in &mut stages {
        stage.ihdr.interlaced = interlace;
      }
    }
    stages
  };

  let deadline = Deadline::new(opts.timeout);
  let mut best: Option<Vec<u8>> = None;
  for (i, candidate) in candidates.iter().enumerate() {
    if i > 0 && deadline.passed() {
      break;
    }
    let output = encode_candidate(image, candidate, aux_chunks, original_idat, &opts, &deadline)?;
    debug!(
      "  color type {} at {} bits: {} bytes",
      candidate.ihdr.color_type.png_header_code(),
      candidate.ihdr.bit_depth.bits(),
      output.len()
    );
    if best.as_ref().map_or(true, |b| output.len() < b.len()) {
      best = Some(output);
    }
  }
  best.ok_or_else(|| PngError::DeflateFailed("no candidate image was encoded".into()))
}

/// Searches and writes one candidate form of `original`.
fn encode_candidate(
  original: &PngImage, candidate: &PngImage, aux_chunks: &[Chunk], original_idat: Option<&[u8]>,
  opts: &Options, deadline: &Deadline,
) -> PngResult<Vec<u8>> {
  let chunks = postprocess_chunks(aux_chunks, &opts.strip, &original.ihdr, &candidate.ihdr);
  let original_idat = original_idat.filter(|_| candidate == original);

  let idat = match original_idat {
    Some(idat) if !opts.idat_recoding => {
      debug!("Keeping the original image data");
      idat.to_vec()
    }
    _ => {
      let best = find_best(candidate, opts, deadline, original_idat)?;
      if let (Some(filter), Some(effort)) = (best.filter, best.effort) {
        info!("    filter {filter:?}, {effort:?}: {} bytes of image data", best.idat.len());
      }
      best.idat
    }
  };
  Ok(write_png(&candidate.ihdr, &idat, &chunks))
}
