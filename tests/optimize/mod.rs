use std::fs;

use pngslim::{
  optimize, optimize_from_memory, ColorType, ErrorKind, InFile, Interlacing, Options, OutFile,
  StripChunks,
};

use super::{blocky_png, pixels, sample_png};

#[test]
fn test_pixels_survive_every_preset() {
  let input = sample_png();
  for level in 0..=6 {
    let output = optimize_from_memory(&input, &Options::from_preset(level).unwrap()).unwrap();
    assert!(output.len() <= input.len(), "level {level}");
    assert_eq!(pixels(&output), pixels(&input), "level {level}");
  }
}

#[test]
fn test_palette_wins_on_noise() {
  let input = sample_png();
  let output = optimize_from_memory(&input, &Options::default()).unwrap();
  assert!(output.len() < input.len());
  let decoded = pngslim::PngData::from_slice(&output, false).unwrap();
  assert!(matches!(decoded.raw.ihdr.color_type, ColorType::Indexed { .. }));
  assert_eq!(decoded.raw.to_rgba16(), pixels(&input));
}

#[test]
fn test_smaller_unreduced_encoding_wins() {
  let input = blocky_png();
  let opts = Options { force: true, ..Options::default() };
  let unreduced = optimize_from_memory(&input, &Options { force: true, ..super::untouched_default() }).unwrap();
  let output = optimize_from_memory(&input, &opts).unwrap();
  assert!(output.len() <= unreduced.len());
  let decoded = pngslim::PngData::from_slice(&output, false).unwrap();
  assert!(!matches!(decoded.raw.ihdr.color_type, ColorType::Indexed { .. }));
  assert_eq!(decoded.raw.to_rgba16(), pixels(&input));
}

#[test]
fn test_interlacing_both_ways() {
  let input = sample_png();
  let opts = Options { interlace: Some(Interlacing::Adam7), force: true, ..Options::default() };
  let interlaced = optimize_from_memory(&input, &opts).unwrap();
  let decoded = pngslim::PngData::from_slice(&interlaced, false).unwrap();
  assert_eq!(decoded.raw.ihdr.interlaced, Interlacing::Adam7);
  assert_eq!(decoded.raw.to_rgba16(), pixels(&input));

  let opts = Options { interlace: Some(Interlacing::None), ..Options::default() };
  let plain = optimize_from_memory(&interlaced, &opts).unwrap();
  assert_eq!(pixels(&plain), pixels(&input));
}

#[test]
fn test_invalid_bytes_are_format_errors() {
  let opts = Options::default();
  for bad in [&b""[..], &b"not a png at all"[..], &super::rand_bytes(200)[..]] {
    assert_eq!(optimize_from_memory(bad, &opts).unwrap_err().kind(), ErrorKind::Format);
  }
  let mut truncated = sample_png();
  truncated.truncate(truncated.len() / 2);
  assert_eq!(optimize_from_memory(&truncated, &opts).unwrap_err().kind(), ErrorKind::Format);
}

#[test]
fn test_fix_errors_repairs_missing_iend() {
  let mut input = sample_png();
  input.truncate(input.len() - 12);
  assert!(optimize_from_memory(&input, &Options::default()).is_err());
  let opts = Options { fix_errors: true, ..Options::default() };
  let output = optimize_from_memory(&input, &opts).unwrap();
  assert_eq!(pixels(&output), pixels(&sample_png()));
}

#[test]
fn test_deterministic() {
  let input = sample_png();
  let opts = Options::max_compression();
  assert_eq!(optimize_from_memory(&input, &opts).unwrap(), optimize_from_memory(&input, &opts).unwrap());
}

#[test]
fn test_force_keeps_pixels() {
  let best = optimize_from_memory(&sample_png(), &Options::max_compression()).unwrap();
  let opts = Options { force: true, ..Options::from_preset(0).unwrap() };
  let forced = optimize_from_memory(&best, &opts).unwrap();
  assert_eq!(pixels(&forced), pixels(&best));
  let unforced = optimize_from_memory(&best, &Options { force: false, ..opts }).unwrap();
  assert!(unforced.len() <= best.len());
}

#[test]
fn test_strip_all() {
  let mut raw = pngslim::RawImage::new(2, 1, pngslim::ColorType::RGBA, pngslim::BitDepth::Eight, vec![9; 8]).unwrap();
  raw.add_png_chunk(b"tEXt", b"Comment\0hello".to_vec()).unwrap();
  let input = raw.create_optimized_png(&super::untouched()).unwrap();
  assert_eq!(pngslim::PngData::from_slice(&input, false).unwrap().aux_chunks.len(), 1);
  let opts = Options { strip: StripChunks::All, ..Options::default() };
  let output = optimize_from_memory(&input, &opts).unwrap();
  assert!(pngslim::PngData::from_slice(&output, false).unwrap().aux_chunks.is_empty());
}

#[test]
fn test_pretend_touches_nothing() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("pretend.png");
  fs::write(&path, sample_png()).unwrap();
  let before = fs::metadata(&path).unwrap();
  let opts = Options { pretend: true, ..Options::default() };
  optimize(&InFile::Path(path.clone()), &OutFile::Path(None), &opts).unwrap();
  let after = fs::metadata(&path).unwrap();
  assert_eq!(before.len(), after.len());
  assert_eq!(before.modified().unwrap(), after.modified().unwrap());
}

#[test]
fn test_in_place_with_backup() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("backup.png");
  let input = sample_png();
  fs::write(&path, &input).unwrap();
  let opts = Options { backup: true, ..Options::default() };
  optimize(&InFile::Path(path.clone()), &OutFile::Path(None), &opts).unwrap();

  let backup = fs::read(dir.path().join("backup.png.bak")).unwrap();
  let output = fs::read(&path).unwrap();
  assert_eq!(backup, input);
  assert_ne!(backup.len(), output.len());
  assert_eq!(pixels(&output), pixels(&input));
}

#[test]
fn test_output_paths() {
  let dir = tempfile::tempdir().unwrap();
  let src = dir.path().join("in.png");
  let dst = dir.path().join("out.png");
  let input = sample_png();
  fs::write(&src, &input).unwrap();
  let opts = Options::default();

  optimize(&InFile::Path(src.clone()), &OutFile::Path(Some(dst.clone())), &opts).unwrap();
  assert_eq!(fs::read(&src).unwrap(), input);
  let written = fs::read(&dst).unwrap();
  assert!(written.len() < input.len());

  let in_memory = optimize(&InFile::Memory(input.clone()), &OutFile::Memory, &opts).unwrap().unwrap();
  assert_eq!(in_memory, written);

  let missing = dir.path().join("missing.png");
  let err = optimize(&InFile::Path(missing), &OutFile::Memory, &opts).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Io);
}
