//! Building options from loosely typed key/value pairs.
//!
//! This is the shape options take when they come from a scripting layer or a
//! config file: every value may be the wrong type, and each kind of mistake
//! gets its own [`ErrorKind`](crate::ErrorKind).

use core::time::Duration;

use crate::{
  ColorType, Deflaters, Interlacing, Options, PngError, PngResult, RowFilter, StripChunks, RGB16,
  RGBA8,
};

/// A dynamically typed option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
  None,
  Bool(bool),
  Int(i64),
  Float(f64),
  Bytes(Vec<u8>),
  Str(String),
  List(Vec<OptionValue>),
  Filter(RowFilter),
  Interlace(Interlacing),
  Strip(StripChunks),
  Deflate(Deflaters),
}

impl OptionValue {
  fn type_name(&self) -> &'static str {
    match self {
      Self::None => "None",
      Self::Bool(_) => "bool",
      Self::Int(_) => "int",
      Self::Float(_) => "float",
      Self::Bytes(_) => "bytes",
      Self::Str(_) => "str",
      Self::List(_) => "list",
      Self::Filter(_) => "RowFilter",
      Self::Interlace(_) => "Interlacing",
      Self::Strip(_) => "StripChunks",
      Self::Deflate(_) => "Deflaters",
    }
  }
}

fn wrong_type(key: &str, expected: &str, got: &OptionValue) -> PngError {
  PngError::Type(format!("{key}: expected {expected}, got {}", got.type_name()))
}

impl Options {
  /// Builds options from key/value pairs.
  ///
  /// `level` picks the preset and is applied before everything else, so
  /// the other keys override it no matter where they appear.
  ///
  /// ## Failure
  /// * `Type` for an unknown key or a value of the wrong type.
  /// * `Value` for a value of the right type that isn't allowed.
  pub fn from_kwargs<'k, I>(kwargs: I) -> PngResult<Self>
  where
    I: IntoIterator<Item = (&'k str, OptionValue)>,
  {
    let kwargs: Vec<(&str, OptionValue)> = kwargs.into_iter().collect();
    let mut opts = match kwargs.iter().rev().find(|(k, _)| *k == "level") {
      Some((_, OptionValue::Int(level))) => {
        let level = u8::try_from(*level)
          .map_err(|_| PngError::Value(format!("Invalid optimization level {level}; must be between 0 and 6")))?;
        Self::from_preset(level)?
      }
      Some((key, other)) => return Err(wrong_type(key, "int", other)),
      None => Self::default(),
    };

    for (key, value) in kwargs {
      match key {
        "level" => (),
        "fix_errors" => opts.fix_errors = parse_bool(key, &value)?,
        "force" => opts.force = parse_bool(key, &value)?,
        "optimize_alpha" => opts.optimize_alpha = parse_bool(key, &value)?,
        "bit_depth_reduction" => opts.bit_depth_reduction = parse_bool(key, &value)?,
        "color_type_reduction" => opts.color_type_reduction = parse_bool(key, &value)?,
        "palette_reduction" => opts.palette_reduction = parse_bool(key, &value)?,
        "grayscale_reduction" => opts.grayscale_reduction = parse_bool(key, &value)?,
        "idat_recoding" => opts.idat_recoding = parse_bool(key, &value)?,
        "scale_16" => opts.scale_16 = parse_bool(key, &value)?,
        "fast_evaluation" => opts.fast_evaluation = parse_bool(key, &value)?,
        "pretend" => opts.pretend = parse_bool(key, &value)?,
        "backup" => opts.backup = parse_bool(key, &value)?,
        "filter" => opts.set_filters(parse_filters(key, &value)?),
        "interlace" => {
          opts.interlace = match value {
            OptionValue::None => None,
            OptionValue::Interlace(i) => Some(i),
            other => return Err(wrong_type(key, "Interlacing or None", &other)),
          }
        }
        "strip" => {
          opts.strip = match value {
            OptionValue::Strip(s) => s,
            other => return Err(wrong_type(key, "StripChunks", &other)),
          }
        }
        "deflate" => {
          opts.deflate = match value {
            OptionValue::Deflate(d) => d,
            other => return Err(wrong_type(key, "Deflaters", &other)),
          }
        }
        "timeout" => opts.timeout = parse_timeout(key, &value)?,
        _ => return Err(PngError::Type(format!("Unsupported option '{key}'"))),
      }
    }
    if opts.filter.is_empty() {
      return Err(PngError::Value("filter: at least one row filter is required".into()));
    }
    opts.validate()?;
    Ok(opts)
  }
}

fn parse_bool(key: &str, value: &OptionValue) -> PngResult<bool> {
  match value {
    OptionValue::Bool(b) => Ok(*b),
    other => Err(wrong_type(key, "bool", other)),
  }
}

fn parse_filters(key: &str, value: &OptionValue) -> PngResult<Vec<RowFilter>> {
  let OptionValue::List(items) = value else {
    return Err(wrong_type(key, "a list of RowFilter", value));
  };
  items
    .iter()
    .map(|item| match item {
      OptionValue::Filter(f) => Ok(*f),
      other => Err(wrong_type(key, "RowFilter", other)),
    })
    .collect()
}

fn parse_timeout(key: &str, value: &OptionValue) -> PngResult<Option<Duration>> {
  let secs = match value {
    OptionValue::None => return Ok(None),
    OptionValue::Int(i) => *i as f64,
    OptionValue::Float(f) => *f,
    other => return Err(wrong_type(key, "seconds or None", other)),
  };
  Duration::try_from_secs_f64(secs)
    .map(Some)
    .map_err(|e| PngError::Value(format!("{key}: invalid timeout {secs}: {e}")))
}

/// The chunk names in a list of values. Every element has to be bytes.
fn chunk_names(values: &[OptionValue]) -> PngResult<Vec<&[u8]>> {
  values
    .iter()
    .map(|v| match v {
      OptionValue::Bytes(b) => Ok(b.as_slice()),
      other => Err(PngError::Type(format!("chunk names must be bytes, got {}", other.type_name()))),
    })
    .collect()
}

impl StripChunks {
  /// [`StripChunks::strip`] from dynamic values.
  pub fn strip_values(values: &[OptionValue]) -> PngResult<Self> {
    Self::strip(chunk_names(values)?)
  }

  /// [`StripChunks::keep`] from dynamic values.
  pub fn keep_values(values: &[OptionValue]) -> PngResult<Self> {
    Self::keep(chunk_names(values)?)
  }
}

impl Deflaters {
  /// [`Deflaters::zopfli`] from an unchecked integer.
  ///
  /// Zero or less is a `Type` error, more than 255 an `Overflow` error.
  pub fn zopfli_value(iterations: i64) -> PngResult<Self> {
    if iterations <= 0 {
      return Err(PngError::Type(format!(
        "Invalid zopfli iterations {iterations}; must be in range [1, 255]"
      )));
    }
    Self::zopfli(u8::try_from(iterations)?)
  }
}

fn component<T: TryFrom<i64>>(value: &OptionValue) -> PngResult<T> {
  match value {
    OptionValue::Int(i) => T::try_from(*i)
      .map_err(|_| PngError::Overflow(format!("color component {i} is out of range"))),
    other => Err(PngError::Type(format!("color components must be int, got {}", other.type_name()))),
  }
}

impl ColorType {
  /// Grayscale, with an optional transparent shade.
  pub fn grayscale_value(transparent_shade: Option<i64>) -> PngResult<Self> {
    let transparent_shade = transparent_shade.map(|s| component(&OptionValue::Int(s))).transpose()?;
    Ok(Self::Grayscale { transparent_shade })
  }

  /// RGB, with an optional transparent color given as `[r, g, b]`.
  pub fn rgb_value(transparent_color: Option<&[OptionValue]>) -> PngResult<Self> {
    let transparent_color = match transparent_color {
      None => None,
      Some([r, g, b]) => Some(RGB16::new(component(r)?, component(g)?, component(b)?)),
      Some(other) => {
        return Err(PngError::Value(format!("a color needs 3 components, got {}", other.len())))
      }
    };
    Ok(Self::RGB { transparent_color })
  }

  /// Indexed color from `[r, g, b, a]` entries.
  pub fn indexed_values(palette: &[OptionValue]) -> PngResult<Self> {
    let palette = palette
      .iter()
      .map(|entry| match entry {
        OptionValue::List(c) => match c.as_slice() {
          [r, g, b, a] => Ok(RGBA8::new(component(r)?, component(g)?, component(b)?, component(a)?)),
          [_, _, _] => Err(PngError::Value("palette entry is missing alpha".into())),
          other => Err(PngError::Value(format!("palette entry needs 4 components, got {}", other.len()))),
        },
        other => Err(PngError::Type(format!("palette entries must be lists, got {}", other.type_name()))),
      })
      .collect::<PngResult<Vec<_>>>()?;
    Self::indexed(palette)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ErrorKind;

  fn kind_of<T: core::fmt::Debug>(r: PngResult<T>) -> ErrorKind {
    r.unwrap_err().kind()
  }

  #[test]
  fn test_level_applies_first() {
    let opts = Options::from_kwargs([
      ("filter", OptionValue::List(vec![OptionValue::Filter(RowFilter::Paeth)])),
      ("level", OptionValue::Int(6)),
    ])
    .unwrap();
    assert_eq!(opts.filter, [RowFilter::Paeth]);
    assert_eq!(opts.deflate, Deflaters::Libdeflater { compression: 12 });
    assert_eq!(kind_of(Options::from_kwargs([("level", OptionValue::Int(7))])), ErrorKind::Value);
    assert_eq!(kind_of(Options::from_kwargs([("level", OptionValue::Int(-1))])), ErrorKind::Value);
    assert_eq!(kind_of(Options::from_kwargs([("level", OptionValue::Str("2".into()))])), ErrorKind::Type);
  }

  #[test]
  fn test_value_types() {
    assert_eq!(kind_of(Options::from_kwargs([("force", OptionValue::Int(1))])), ErrorKind::Type);
    assert_eq!(kind_of(Options::from_kwargs([("bogus", OptionValue::Bool(true))])), ErrorKind::Type);
    let mapping = OptionValue::List(vec![OptionValue::List(vec![OptionValue::Int(1), OptionValue::Int(2)])]);
    assert_eq!(kind_of(Options::from_kwargs([("filter", mapping)])), ErrorKind::Type);
    assert_eq!(kind_of(Options::from_kwargs([("filter", OptionValue::List(vec![]))])), ErrorKind::Value);
    assert_eq!(kind_of(Options::from_kwargs([("timeout", OptionValue::Float(-1.0))])), ErrorKind::Value);
    let opts = Options::from_kwargs([
      ("timeout", OptionValue::Float(1.5)),
      ("interlace", OptionValue::None),
      ("strip", OptionValue::Strip(StripChunks::Safe)),
    ])
    .unwrap();
    assert_eq!(opts.timeout, Some(Duration::from_millis(1500)));
    assert_eq!(opts.interlace, None);
    assert_eq!(opts.strip, StripChunks::Safe);
  }

  #[test]
  fn test_chunk_name_values() {
    let bytes = |b: &[u8]| OptionValue::Bytes(b.to_vec());
    assert!(StripChunks::strip_values(&[bytes(b"sRGB"), bytes(b"tEXt")]).is_ok());
    assert_eq!(kind_of(StripChunks::strip_values(&[bytes(b"sRGB"), OptionValue::Int(42)])), ErrorKind::Type);
    assert_eq!(kind_of(StripChunks::keep_values(&[OptionValue::Str("sRGB".into())])), ErrorKind::Type);
    assert_eq!(kind_of(StripChunks::strip_values(&[bytes(b"RGB")])), ErrorKind::Value);
    assert_eq!(kind_of(StripChunks::keep_values(&[bytes(b"RGB123")])), ErrorKind::Value);
  }

  #[test]
  fn test_zopfli_value() {
    assert_eq!(kind_of(Deflaters::zopfli_value(0)), ErrorKind::Type);
    assert_eq!(kind_of(Deflaters::zopfli_value(-3)), ErrorKind::Type);
    assert_eq!(kind_of(Deflaters::zopfli_value(256)), ErrorKind::Overflow);
    assert!(Deflaters::zopfli_value(1).is_ok());
    assert!(Deflaters::zopfli_value(255).is_ok());
  }

  #[test]
  fn test_color_type_values() {
    let int = OptionValue::Int;
    assert_eq!(kind_of(ColorType::grayscale_value(Some(1_000_000))), ErrorKind::Overflow);
    assert!(ColorType::grayscale_value(Some(255)).is_ok());
    assert_eq!(kind_of(ColorType::rgb_value(Some(&[int(0), int(65536), int(0)][..]))), ErrorKind::Overflow);
    assert!(ColorType::rgb_value(Some(&[int(0), int(65535), int(0)][..])).is_ok());
    let entry = |c: &[i64]| OptionValue::List(c.iter().map(|v| int(*v)).collect());
    assert_eq!(kind_of(ColorType::indexed_values(&[entry(&[0, 0, 0, 256])])), ErrorKind::Overflow);
    assert_eq!(kind_of(ColorType::indexed_values(&[entry(&[0, 0, 0])])), ErrorKind::Value);
    assert_eq!(kind_of(ColorType::indexed_values(&[])), ErrorKind::Value);
    assert_eq!(
      ColorType::indexed_values(&[entry(&[1, 2, 3, 4])]).unwrap(),
      ColorType::Indexed { palette: vec![RGBA8::new(1, 2, 3, 4)] }
    );
  }
}
