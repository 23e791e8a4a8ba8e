use super::*;

/// Largest payload written into a single `IDAT` chunk.
pub(crate) const IDAT_CHUNK_LEN: usize = 256 * 1024;

/// Chunks that PNG requires to come before `PLTE` when there is one.
const BEFORE_PLTE_ONLY: [&[u8; 4]; 8] =
  [b"cICP", b"cHRM", b"gAMA", b"iCCP", b"sBIT", b"sRGB", b"mDCV", b"cLLI"];

/// The `PLTE` and `tRNS` payloads for a color type, if it has them.
#[must_use]
pub(crate) fn palette_chunks(color_type: &ColorType) -> (Option<Vec<u8>>, Option<Vec<u8>>) {
  match color_type {
    ColorType::Indexed { palette } => {
      let plte = palette.iter().flat_map(|c| [c.r, c.g, c.b]).collect();
      let last_see_through = palette.iter().rposition(|c| c.a != u8::MAX);
      let trns = last_see_through.map(|last| palette[..=last].iter().map(|c| c.a).collect());
      (Some(plte), trns)
    }
    ColorType::Grayscale { transparent_shade: Some(shade) } => (None, Some(shade.to_be_bytes().to_vec())),
    ColorType::RGB { transparent_color: Some(c) } => {
      let trns = [c.r, c.g, c.b].iter().flat_map(|v| v.to_be_bytes()).collect();
      (None, Some(trns))
    }
    _ => (None, None),
  }
}

/// Assembles a complete PNG file.
///
/// `aux_chunks` are written in their given order within each position.
#[must_use]
pub(crate) fn write_png(ihdr: &IhdrData, idat: &[u8], aux_chunks: &[Chunk]) -> Vec<u8> {
  let aux_len: usize = aux_chunks.iter().map(|c| c.data.len() + 12).sum();
  let mut out = Vec::with_capacity(8 + 25 + aux_len + idat.len() + 12 * (idat.len() / IDAT_CHUNK_LEN + 2) + 1024);
  out.extend_from_slice(&PNG_SIGNATURE);
  write_chunk(&mut out, b"IHDR", &ihdr.to_bytes());

  let must_lead = |c: &&Chunk| {
    c.position == ChunkPosition::BeforePlte || BEFORE_PLTE_ONLY.contains(&c.name.as_bytes())
  };
  let (leading, trailing): (Vec<&Chunk>, Vec<&Chunk>) =
    aux_chunks.iter().filter(|c| c.position != ChunkPosition::AfterIdat).partition(must_lead);
  for chunk in leading {
    write_chunk(&mut out, chunk.name.as_bytes(), &chunk.data);
  }
  let (plte, trns) = palette_chunks(&ihdr.color_type);
  if let Some(plte) = plte {
    write_chunk(&mut out, b"PLTE", &plte);
  }
  if let Some(trns) = trns {
    write_chunk(&mut out, b"tRNS", &trns);
  }
  for chunk in trailing {
    write_chunk(&mut out, chunk.name.as_bytes(), &chunk.data);
  }

  for part in idat.chunks(IDAT_CHUNK_LEN) {
    write_chunk(&mut out, b"IDAT", part);
  }
  if idat.is_empty() {
    write_chunk(&mut out, b"IDAT", &[]);
  }

  for chunk in aux_chunks.iter().filter(|c| c.position == ChunkPosition::AfterIdat) {
    write_chunk(&mut out, chunk.name.as_bytes(), &chunk.data);
  }
  write_chunk(&mut out, b"IEND", &[]);
  out
}
