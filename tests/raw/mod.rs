use pngslim::{
  optimize_from_memory, BitDepth, ColorType, ErrorKind, Interlacing, Options, PngData, RawImage, RGBA8,
};

#[test]
fn test_raw_rgb() {
  let data = vec![0, 0, 0, 255, 255, 255, 255, 0, 0, 0, 255, 0];
  let raw = RawImage::new(2, 2, ColorType::RGB { transparent_color: None }, BitDepth::Eight, data).unwrap();
  let png = raw.create_optimized_png(&Options::default()).unwrap();
  let decoded = PngData::from_slice(&png, false).unwrap();
  assert_eq!(
    decoded.raw.to_rgba16(),
    [[0, 0, 0, 65535], [65535, 65535, 65535, 65535], [65535, 0, 0, 65535], [0, 65535, 0, 65535]]
  );
}

#[test]
fn test_raw_with_chunks() {
  let data: Vec<u8> = (0..64_u32 * 64).flat_map(|i| [(i % 64) as u8, (i / 64) as u8, 7, 255]).collect();
  let mut raw = RawImage::new(64, 64, ColorType::RGBA, BitDepth::Eight, data).unwrap();
  raw.add_png_chunk(b"sRBG", vec![0]).unwrap();
  raw.add_icc_profile(b"Color LCD");
  let opts = Options { fix_errors: true, interlace: Some(Interlacing::Adam7), ..Options::from_preset(2).unwrap() };
  let png = raw.create_optimized_png(&opts).unwrap();

  let decoded = PngData::from_slice(&png, false).unwrap();
  assert_eq!(decoded.raw.ihdr.interlaced, Interlacing::Adam7);
  let names: Vec<String> = decoded.aux_chunks.iter().map(|c| c.name.to_string()).collect();
  assert_eq!(names, ["iCCP", "sRBG"]);
  assert_eq!(decoded.raw.to_rgba16(), raw.image().to_rgba16());
  // and it reads back through the optimizer
  assert!(optimize_from_memory(&png, &Options::default()).is_ok());
}

#[test]
fn test_gray_profile_keeps_gray() {
  let mut state = 0x1234_5678_u32;
  let data: Vec<u8> = (0..64 * 64)
    .map(|_| {
      state ^= state << 13;
      state ^= state >> 17;
      state ^= state << 5;
      (state % 3) as u8 * 100
    })
    .collect();
  let gray = ColorType::Grayscale { transparent_shade: None };
  let mut raw = RawImage::new(64, 64, gray, BitDepth::Eight, data).unwrap();
  let mut profile = vec![0_u8; 128];
  profile[16..20].copy_from_slice(b"GRAY");
  raw.add_icc_profile(&profile);

  let png = raw.create_optimized_png(&Options::default()).unwrap();
  let decoded = PngData::from_slice(&png, false).unwrap();
  assert!(matches!(decoded.raw.ihdr.color_type, ColorType::Grayscale { .. }));
  assert!(decoded.aux_chunks.iter().any(|c| c.name.as_bytes() == b"iCCP"));
  assert_eq!(decoded.raw.to_rgba16(), raw.image().to_rgba16());

  let again = optimize_from_memory(&png, &Options { force: true, ..Options::default() }).unwrap();
  let decoded = PngData::from_slice(&again, false).unwrap();
  assert!(matches!(decoded.raw.ihdr.color_type, ColorType::Grayscale { .. }));
}

#[test]
fn test_raw_indexed() {
  let palette = vec![RGBA8::new(255, 0, 0, 255), RGBA8::new(0, 0, 255, 128)];
  let raw = RawImage::new(8, 1, ColorType::Indexed { palette }, BitDepth::One, vec![0b1010_1010]).unwrap();
  let png = raw.create_optimized_png(&Options::max_compression()).unwrap();
  let px = PngData::from_slice(&png, false).unwrap().raw.to_rgba16();
  assert_eq!(px[0], [0, 0, 65535, 128 * 257]);
  assert_eq!(px[1], [65535, 0, 0, 65535]);
}

#[test]
fn test_raw_errors() {
  let rgb = || ColorType::RGB { transparent_color: None };
  assert_eq!(RawImage::new(2, 2, rgb(), BitDepth::Eight, vec![0; 5]).unwrap_err().kind(), ErrorKind::Value);
  assert_eq!(RawImage::new(0, 0, rgb(), BitDepth::Eight, vec![]).unwrap_err().kind(), ErrorKind::Value);
  assert_eq!(RawImage::new(1, 1, ColorType::RGBA, BitDepth::Two, vec![0]).unwrap_err().kind(), ErrorKind::Value);
  let mut raw = RawImage::new(1, 1, rgb(), BitDepth::Eight, vec![0; 3]).unwrap();
  assert_eq!(raw.add_png_chunk(b"RGB", vec![]).unwrap_err().kind(), ErrorKind::Value);
  assert_eq!(raw.add_png_chunk(b"PLTE", vec![]).unwrap_err().kind(), ErrorKind::Value);
}
