//! Which ancillary chunks make it into the output.

use log::{debug, trace};

use crate::{png::Chunk, IhdrData, StripChunks};

/// Chunks whose contents are tied to the color type, bit depth or palette.
const COLOR_DEPENDENT: [&[u8; 4]; 3] = [b"bKGD", b"sBIT", b"hIST"];

/// Applies the strip policy and drops chunks that no longer describe the
/// output image. The order of the kept chunks doesn't change.
pub(crate) fn postprocess_chunks(
  chunks: &[Chunk], strip: &StripChunks, before: &IhdrData, after: &IhdrData,
) -> Vec<Chunk> {
  let format_changed = before.color_type != after.color_type || before.bit_depth != after.bit_depth;
  chunks
    .iter()
    .filter(|chunk| {
      if !strip.retains(chunk.name) {
        trace!("Stripping {} chunk", chunk.name);
        return false;
      }
      if format_changed && COLOR_DEPENDENT.contains(&chunk.name.as_bytes()) {
        debug!("Dropping {} chunk, the image format changed", chunk.name);
        return false;
      }
      true
    })
    .cloned()
    .collect()
}

/// Whether an `iCCP` chunk holds a grayscale profile.
///
/// `None` when the chunk can't be read, which callers treat as "not gray".
pub(crate) fn icc_profile_is_gray(iccp: &[u8]) -> Option<bool> {
  // profile name, a zero byte, and the compression method (always 0)
  let name_end = iccp.iter().position(|b| *b == 0)?;
  let compressed = iccp.get(name_end + 2..)?;
  let profile = miniz_oxide::inflate::decompress_to_vec_zlib_with_limit(compressed, 1 << 24).ok()?;
  // the data color space signature sits at bytes 16..20 of the profile header
  Some(profile.get(16..20)? == b"GRAY")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{png::ChunkPosition, BitDepth, ChunkName, ColorType, Interlacing};

  fn chunk(name: &[u8; 4]) -> Chunk {
    Chunk { name: ChunkName::from(*name), data: vec![1, 2], position: ChunkPosition::BeforeIdat }
  }

  fn header(color_type: ColorType) -> IhdrData {
    IhdrData { width: 1, height: 1, color_type, bit_depth: BitDepth::Eight, interlaced: Interlacing::None }
  }

  #[test]
  fn test_policy_keeps_order() {
    let chunks = [chunk(b"tEXt"), chunk(b"sRGB"), chunk(b"tIME"), chunk(b"pHYs")];
    let h = header(ColorType::RGBA);
    let kept = postprocess_chunks(&chunks, &StripChunks::Safe, &h, &h);
    let names: Vec<_> = kept.iter().map(|c| c.name.to_string()).collect();
    assert_eq!(names, ["sRGB", "pHYs"]);
    assert_eq!(postprocess_chunks(&chunks, &StripChunks::None, &h, &h), chunks);
    assert!(postprocess_chunks(&chunks, &StripChunks::All, &h, &h).is_empty());
  }

  #[test]
  fn test_color_chunks_dropped_on_format_change() {
    let chunks = [chunk(b"bKGD"), chunk(b"gAMA"), chunk(b"sBIT")];
    let before = header(ColorType::RGBA);
    let after = header(ColorType::RGB { transparent_color: None });
    let kept = postprocess_chunks(&chunks, &StripChunks::None, &before, &after);
    assert_eq!(kept, [chunk(b"gAMA")]);
  }

  #[test]
  fn test_icc_color_space() {
    let mut profile = vec![0_u8; 128];
    profile[16..20].copy_from_slice(b"GRAY");
    let mut iccp = b"icc\0\0".to_vec();
    iccp.extend(miniz_oxide::deflate::compress_to_vec_zlib(&profile, 6));
    assert_eq!(icc_profile_is_gray(&iccp), Some(true));
    profile[16..20].copy_from_slice(b"RGB ");
    let mut iccp = b"icc\0\0".to_vec();
    iccp.extend(miniz_oxide::deflate::compress_to_vec_zlib(&profile, 6));
    assert_eq!(icc_profile_is_gray(&iccp), Some(false));
    assert_eq!(icc_profile_is_gray(b"no terminator"), None);
  }
}
