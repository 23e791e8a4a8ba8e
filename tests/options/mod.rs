use pngslim::{
  ColorType, Deflaters, ErrorKind, Interlacing, OptionValue, Options, RowFilter, StripChunks,
};

fn kind<T: std::fmt::Debug>(r: pngslim::PngResult<T>) -> ErrorKind {
  r.unwrap_err().kind()
}

#[test]
fn test_kwargs_round_trip_into_fields() {
  let opts = Options::from_kwargs([
    ("level", OptionValue::Int(3)),
    ("fix_errors", OptionValue::Bool(true)),
    ("optimize_alpha", OptionValue::Bool(true)),
    ("interlace", OptionValue::Interlace(Interlacing::Adam7)),
    ("filter", OptionValue::List(vec![OptionValue::Filter(RowFilter::Sub), OptionValue::Filter(RowFilter::Sub)])),
    ("deflate", OptionValue::Deflate(Deflaters::zlib())),
    ("strip", OptionValue::Strip(StripChunks::strip_values(&[OptionValue::Bytes(b"tEXt".to_vec())]).unwrap())),
    ("timeout", OptionValue::Int(2)),
  ])
  .unwrap();
  assert!(opts.fix_errors && opts.optimize_alpha);
  assert!(!opts.fast_evaluation);
  assert_eq!(opts.interlace, Some(Interlacing::Adam7));
  assert_eq!(opts.filter, [RowFilter::Sub]);
  assert_eq!(opts.deflate, Deflaters::zlib());
  assert!(!opts.strip.retains(pngslim::ChunkName::from(*b"tEXt")));
  assert_eq!(opts.timeout, Some(std::time::Duration::from_secs(2)));
}

#[test]
fn test_kwargs_errors() {
  let filter_map = OptionValue::List(vec![OptionValue::List(vec![OptionValue::Int(1), OptionValue::Int(2)])]);
  assert_eq!(kind(Options::from_kwargs([("filter", filter_map)])), ErrorKind::Type);
  assert_eq!(kind(Options::from_kwargs([("filter", OptionValue::Int(1))])), ErrorKind::Type);
  assert_eq!(kind(Options::from_kwargs([("level", OptionValue::Int(99))])), ErrorKind::Value);
  assert_eq!(kind(Options::from_kwargs([("interlace", OptionValue::Bool(true))])), ErrorKind::Type);
  assert_eq!(kind(Options::from_kwargs([("backup", OptionValue::Str("yes".into()))])), ErrorKind::Type);
  assert_eq!(kind(Options::from_kwargs([("compression", OptionValue::Int(9))])), ErrorKind::Type);
  let bad_zlib = Deflaters::Zlib { compression: vec![10], strategies: vec![0], window: 15 };
  assert_eq!(kind(Options::from_kwargs([("deflate", OptionValue::Deflate(bad_zlib))])), ErrorKind::Value);
}

#[test]
fn test_zopfli_iterations() {
  assert_eq!(kind(Deflaters::zopfli_value(0)), ErrorKind::Type);
  assert_eq!(kind(Deflaters::zopfli_value(256)), ErrorKind::Overflow);
  assert!(Deflaters::zopfli_value(1).is_ok());
  assert!(Deflaters::zopfli_value(255).is_ok());
  assert_eq!(kind(Deflaters::zopfli(0)), ErrorKind::Type);
}

#[test]
fn test_chunk_name_errors() {
  let b = |s: &[u8]| OptionValue::Bytes(s.to_vec());
  assert_eq!(kind(StripChunks::strip_values(&[b(b"sRGB"), OptionValue::Int(42)])), ErrorKind::Type);
  assert_eq!(kind(StripChunks::keep_values(&[b(b"RGB")])), ErrorKind::Value);
  assert_eq!(kind(StripChunks::strip_values(&[b(b"RGB123")])), ErrorKind::Value);
  assert_eq!(kind(StripChunks::keep(["sRGB", "RGB"])), ErrorKind::Value);
  // repeats don't matter
  assert_eq!(StripChunks::keep(["sRGB", "sRGB"]).unwrap(), StripChunks::keep(["sRGB"]).unwrap());
}

#[test]
fn test_color_type_values() {
  assert_eq!(kind(ColorType::grayscale_value(Some(1_000_000))), ErrorKind::Overflow);
  let rgb = [OptionValue::Int(0), OptionValue::Int(65536), OptionValue::Int(0)];
  assert_eq!(kind(ColorType::rgb_value(Some(&rgb[..]))), ErrorKind::Overflow);
  let entry = |c: &[i64]| OptionValue::List(c.iter().copied().map(OptionValue::Int).collect());
  assert_eq!(kind(ColorType::indexed_values(&[entry(&[0, 0, 0, 256])])), ErrorKind::Overflow);
  assert_eq!(kind(ColorType::indexed_values(&[entry(&[0, 0, 0])])), ErrorKind::Value);
}

#[test]
fn test_validation_happens_before_decoding() {
  let opts = Options { filter: vec![], ..Options::default() };
  // the input isn't a PNG, but the options are checked first
  assert_eq!(kind(pngslim::optimize_from_memory(b"junk", &opts)), ErrorKind::Value);
}
