use log::{debug, warn};
use miniz_oxide::inflate::{decompress_slice_iter_to_slice, TINFLStatus};

use super::*;

/// Signature, `IHDR`, an empty `IDAT` and `IEND`.
const MIN_PNG_LEN: usize = 8 + (12 + 13) + 12 + 12;

impl PngData {
  /// Parses and decodes PNG bytes.
  ///
  /// With `fix_errors` set, some damage is repaired instead of failing:
  /// * Critical chunks with a bad CRC are kept, ancillary ones are dropped.
  /// * A truncated final chunk ends the file (once image data was seen).
  /// * A missing `IEND` is accepted.
  /// * The zlib checksum of the image data isn't verified.
  /// * Excess image data is discarded.
  pub fn from_slice(bytes: &[u8], fix_errors: bool) -> PngResult<Self> {
    if bytes.len() < 8 || bytes[..8] != PNG_SIGNATURE {
      return Err(PngError::NotPng);
    }
    if bytes.len() < MIN_PNG_LEN {
      return Err(PngError::TruncatedData);
    }

    let mut header: Option<HeaderFields> = None;
    let mut palette: Option<&[u8]> = None;
    let mut trns: Option<&[u8]> = None;
    let mut idat_slices: Vec<&[u8]> = Vec::new();
    let mut aux_chunks: Vec<Chunk> = Vec::new();
    let mut saw_iend = false;

    for item in RawChunkIter::new(bytes) {
      let chunk = match item {
        Ok(chunk) => chunk,
        Err(PngError::TruncatedData) if fix_errors && header.is_some() && !idat_slices.is_empty() => {
          warn!("Truncated chunk at the end of the file, ignoring it");
          break;
        }
        Err(e) => return Err(e),
      };
      if !chunk.crc_is_correct() {
        if !fix_errors {
          return Err(PngError::CrcMismatch(chunk.name));
        } else if chunk.name.is_critical() {
          warn!("CRC mismatch in {} chunk, keeping the data", chunk.name);
        } else {
          warn!("CRC mismatch in {} chunk, dropping it", chunk.name);
          continue;
        }
      }
      if header.is_none() && chunk.name.as_bytes() != b"IHDR" {
        return Err(PngError::ChunkMissing("IHDR"));
      }
      match chunk.name.as_bytes() {
        b"IHDR" => {
          if header.is_some() {
            return Err(PngError::invalid("more than one IHDR chunk"));
          }
          header = Some(HeaderFields::try_from(chunk.data)?);
        }
        b"PLTE" => {
          let entries = chunk.data.len() / 3;
          if chunk.data.len() % 3 != 0 || entries == 0 || entries > 256 {
            return Err(PngError::invalid(format!("PLTE length {}", chunk.data.len())));
          }
          palette = Some(chunk.data);
        }
        b"tRNS" => trns = Some(chunk.data),
        b"IDAT" => idat_slices.push(chunk.data),
        b"IEND" => {
          saw_iend = true;
          break;
        }
        _ if chunk.name.is_critical() => {
          return Err(PngError::invalid(format!("unknown critical chunk {}", chunk.name)));
        }
        _ => {
          let position = if !idat_slices.is_empty() {
            ChunkPosition::AfterIdat
          } else if palette.is_some() {
            ChunkPosition::BeforeIdat
          } else {
            ChunkPosition::BeforePlte
          };
          aux_chunks.push(Chunk { name: chunk.name, data: chunk.data.to_vec(), position });
        }
      }
    }

    let header = header.ok_or(PngError::ChunkMissing("IHDR"))?;
    if idat_slices.is_empty() {
      return Err(PngError::ChunkMissing("IDAT"));
    }
    if !saw_iend {
      if fix_errors {
        warn!("No IEND chunk, assuming the file simply ends");
      } else {
        return Err(PngError::ChunkMissing("IEND"));
      }
    }

    let color_type = build_color_type(&header, palette, trns)?;
    let ihdr = IhdrData {
      width: header.width,
      height: header.height,
      color_type,
      bit_depth: header.bit_depth,
      interlaced: header.interlaced,
    };
    ihdr.check_size()?;
    let filtered = inflate_image_data(&ihdr, &idat_slices, fix_errors)?;
    let data = unfilter_image(&ihdr, &filtered)?;
    let raw = PngImage { ihdr, data };
    check_palette_indices(&raw)?;

    let mut idat_data = Vec::new();
    idat_data.try_reserve_exact(idat_slices.iter().map(|s| s.len()).sum())?;
    idat_slices.iter().for_each(|s| idat_data.extend_from_slice(s));

    debug!(
      "Decoded {}x{} image, color type {}, bit depth {}, {} ancillary chunks",
      raw.ihdr.width,
      raw.ihdr.height,
      raw.ihdr.color_type.png_header_code(),
      raw.ihdr.bit_depth.bits(),
      aux_chunks.len()
    );
    Ok(Self { raw, idat_data, aux_chunks })
  }
}

/// Combines the header's color code with the palette and transparency.
fn build_color_type(
  header: &HeaderFields, palette: Option<&[u8]>, trns: Option<&[u8]>,
) -> PngResult<ColorType> {
  let max = header.bit_depth.max_value();
  let color_type = match header.color_code {
    0 => ColorType::Grayscale {
      transparent_shade: match trns {
        Some(&[y0, y1]) if u16_be([y0, y1]) <= max => Some(u16_be([y0, y1])),
        Some(_) => {
          warn!("Ignoring malformed tRNS chunk");
          None
        }
        None => None,
      },
    },
    2 => ColorType::RGB {
      transparent_color: match trns {
        Some(&[r0, r1, g0, g1, b0, b1]) => {
          let c = RGB16::new(u16_be([r0, r1]), u16_be([g0, g1]), u16_be([b0, b1]));
          if c.r <= max && c.g <= max && c.b <= max {
            Some(c)
          } else {
            warn!("Ignoring out of range tRNS chunk");
            None
          }
        }
        Some(_) => {
          warn!("Ignoring malformed tRNS chunk");
          None
        }
        None => None,
      },
    },
    3 => {
      let plte = palette.ok_or(PngError::ChunkMissing("PLTE"))?;
      let alphas = trns.unwrap_or(&[]);
      let entries = plte
        .chunks_exact(3)
        .enumerate()
        .map(|(i, rgb)| RGBA8::new(rgb[0], rgb[1], rgb[2], alphas.get(i).copied().unwrap_or(u8::MAX)))
        .collect();
      ColorType::Indexed { palette: entries }
    }
    4 => ColorType::GrayscaleAlpha,
    _ => ColorType::RGBA,
  };
  if palette.is_some() && !matches!(color_type, ColorType::Indexed { .. }) {
    debug!("Dropping suggested palette of a non-indexed image");
  }
  Ok(color_type)
}

/// Inflates the concatenated `IDAT` payloads into the filtered stream.
fn inflate_image_data(ihdr: &IhdrData, idat: &[&[u8]], fix_errors: bool) -> PngResult<Vec<u8>> {
  let expected = ihdr.filtered_len();
  let mut out = Vec::new();
  out.try_reserve_exact(expected)?;
  out.resize(expected, 0);
  match decompress_slice_iter_to_slice(&mut out, idat.iter().copied(), true, fix_errors) {
    Ok(n) if n == expected => Ok(out),
    Ok(_) => Err(PngError::TruncatedData),
    Err(TINFLStatus::HasMoreOutput) if fix_errors => {
      warn!("Discarding excess image data");
      Ok(out)
    }
    Err(TINFLStatus::HasMoreOutput) => Err(PngError::invalid("more image data than expected")),
    Err(TINFLStatus::FailedCannotMakeProgress) => Err(PngError::TruncatedData),
    Err(_) => Err(PngError::InflateFailed),
  }
}

/// Every index must point inside the palette.
fn check_palette_indices(image: &PngImage) -> PngResult<()> {
  if let ColorType::Indexed { palette } = &image.ihdr.color_type {
    let mut bad = false;
    image.for_each_pixel(|_, _, s| bad |= usize::from(s[0]) >= palette.len());
    if bad {
      return Err(PngError::invalid("palette index out of range"));
    }
  }
  Ok(())
}
