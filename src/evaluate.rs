//! The search over row filters and backend settings for the smallest image
//! data.

use log::{debug, trace, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
  deflate::fast_compressed_len, png::filter_image, Deadline, Effort, Options, PngError, PngImage,
  PngResult, RowFilter,
};

/// The winning compressed image data, and what produced it.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
  pub idat: Vec<u8>,
  /// `None` when the original image data won.
  pub filter: Option<RowFilter>,
  pub effort: Option<Effort>,
}

/// Maps `f` over the items, on the worker pool when that's enabled. The
/// output keeps the input order either way.
fn par_map<T, R, F>(items: &[T], f: F) -> Vec<R>
where
  T: Sync,
  R: Send,
  F: Fn(usize, &T) -> R + Sync + Send,
{
  #[cfg(feature = "parallel")]
  {
    items.par_iter().enumerate().map(|(i, t)| f(i, t)).collect()
  }
  #[cfg(not(feature = "parallel"))]
  {
    items.iter().enumerate().map(|(i, t)| f(i, t)).collect()
  }
}

/// Index of the smallest value, earliest first on ties.
fn smallest<I: Iterator<Item = (usize, usize)>>(sizes: I) -> Option<usize> {
  sizes.min_by_key(|(i, len)| (*len, *i)).map(|(i, _)| i)
}

/// Tries every filter with every backend effort and keeps the smallest.
///
/// The first candidate always runs. Once the deadline passes no other
/// candidate starts, and the best finished one wins. `original_idat` is the
/// input's own compressed data, given when the pixels didn't change; it also
/// competes, and wins ties.
pub(crate) fn find_best(
  image: &PngImage, opts: &Options, deadline: &Deadline, original_idat: Option<&[u8]>,
) -> PngResult<Candidate> {
  let efforts = opts.deflate.efforts();
  let mut filters = opts.filter.clone();
  if filters.is_empty() || efforts.is_empty() {
    return Err(PngError::Value("nothing to evaluate".into()));
  }

  if opts.fast_evaluation && filters.len() > 1 {
    let sizes = par_map(&filters, |i, filter| {
      if i > 0 && deadline.passed() {
        return None;
      }
      let len = fast_compressed_len(&filter_image(image, *filter));
      trace!("  fast {filter:?}: {len} bytes");
      Some((i, len))
    });
    if let Some(best) = smallest(sizes.into_iter().flatten()) {
      debug!("Fast evaluation picked the {:?} filter", filters[best]);
      filters = vec![filters[best]];
    }
  }

  let filtered = par_map(&filters, |i, filter| {
    if i > 0 && deadline.passed() {
      None
    } else {
      Some(filter_image(image, *filter))
    }
  });

  let pairs: Vec<(usize, usize)> = (0..filters.len())
    .filter(|f| filtered[*f].is_some())
    .flat_map(|f| (0..efforts.len()).map(move |e| (f, e)))
    .collect();
  let results = par_map(&pairs, |i, (f, e)| {
    if i > 0 && deadline.passed() {
      return None;
    }
    let data = filtered[*f].as_ref()?;
    let result = efforts[*e].deflate(data);
    if let Ok(idat) = &result {
      trace!("  {:?} {:?}: {} bytes", filters[*f], efforts[*e], idat.len());
    }
    Some(result)
  });

  let mut first_error: Option<PngError> = None;
  let mut best: Option<(usize, Vec<u8>)> = None;
  for (i, result) in results.into_iter().enumerate() {
    match result {
      None => (),
      Some(Err(e)) => {
        warn!("Compression failed: {e}");
        first_error.get_or_insert(e);
      }
      Some(Ok(idat)) => {
        if best.as_ref().map_or(true, |(_, b)| idat.len() < b.len()) {
          best = Some((i, idat));
        }
      }
    }
  }
  let (i, idat) = match best {
    Some(best) => best,
    None => return Err(first_error.unwrap_or(PngError::DeflateFailed("no result".into()))),
  };
  let (f, e) = pairs[i];

  match original_idat {
    Some(original) if original.len() <= idat.len() => {
      debug!("The original image data is already the smallest ({} bytes)", original.len());
      Ok(Candidate { idat: original.to_vec(), filter: None, effort: None })
    }
    _ => {
      debug!("Best: {:?} filter with {:?}, {} bytes", filters[f], efforts[e], idat.len());
      Ok(Candidate { idat, filter: Some(filters[f]), effort: Some(efforts[e]) })
    }
  }
}
